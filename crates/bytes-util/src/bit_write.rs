use std::io;

/// A writer that writes individual bits to a stream, most significant bit first.
///
/// Call [`BitWriter::finish`] to flush a trailing partial byte (padded with zeros).
#[derive(Debug)]
#[must_use]
pub struct BitWriter<W> {
    writer: W,
    current_byte: u8,
    /// Number of bits already placed into `current_byte`.
    filled: u8,
}

impl<W> BitWriter<W> {
    /// Creates a new BitWriter wrapping the given writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            current_byte: 0,
            filled: 0,
        }
    }

    /// Returns true if the writer is at a byte boundary.
    pub const fn is_aligned(&self) -> bool {
        self.filled == 0
    }

    /// Returns a reference to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: io::Write> BitWriter<W> {
    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.current_byte |= (bit as u8) << (7 - self.filled);
        self.filled += 1;

        if self.filled == 8 {
            self.writer.write_all(&[self.current_byte])?;
            self.current_byte = 0;
            self.filled = 0;
        }

        Ok(())
    }

    /// Writes the lowest `count` bits of `bits`.
    pub fn write_bits(&mut self, bits: u64, count: u8) -> io::Result<()> {
        if count > 64 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "cannot write more than 64 bits at once"));
        }

        for i in (0..count).rev() {
            self.write_bit((bits >> i) & 1 == 1)?;
        }

        Ok(())
    }

    /// Pads the current byte with zero bits.
    pub fn align(&mut self) -> io::Result<()> {
        while !self.is_aligned() {
            self.write_bit(false)?;
        }

        Ok(())
    }

    /// Aligns the writer and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.align()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> io::Write for BitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_aligned() {
            return self.writer.write(buf);
        }

        for &byte in buf {
            self.write_bits(byte as u64, 8)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
