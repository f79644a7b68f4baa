use std::io;

/// A reader that reads individual bits from a stream, most significant bit first.
///
/// Bytes are pulled from the inner reader lazily, one at a time.
#[derive(Debug)]
#[must_use]
pub struct BitReader<T> {
    data: T,
    current_byte: u8,
    /// Number of bits of `current_byte` that are still unread.
    remaining: u8,
    bits_read: u64,
}

impl<T> BitReader<T> {
    /// Create a new BitReader from a reader.
    pub const fn new(data: T) -> Self {
        Self {
            data,
            current_byte: 0,
            remaining: 0,
            bits_read: 0,
        }
    }
}

impl<T: AsRef<[u8]>> BitReader<io::Cursor<T>> {
    /// Create a new BitReader from a slice-like buffer.
    pub const fn new_from_slice(data: T) -> Self {
        Self::new(io::Cursor::new(data))
    }
}

impl<T: io::Read> BitReader<T> {
    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.remaining == 0 {
            let mut byte = [0; 1];
            self.data.read_exact(&mut byte)?;
            self.current_byte = byte[0];
            self.remaining = 8;
        }

        self.remaining -= 1;
        self.bits_read += 1;
        Ok((self.current_byte >> self.remaining) & 1 == 1)
    }

    /// Reads `count` bits (at most 64) and returns them right aligned.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u64> {
        if count > 64 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "cannot read more than 64 bits at once"));
        }

        let mut bits = 0;
        for _ in 0..count {
            bits = (bits << 1) | self.read_bit()? as u64;
        }

        Ok(bits)
    }

    /// Reads `count` bits as a two's complement signed integer.
    pub fn read_signed_bits(&mut self, count: u8) -> io::Result<i64> {
        let bits = self.read_bits(count)?;
        if count == 0 || count == 64 {
            return Ok(bits as i64);
        }

        let shift = 64 - count as u32;
        Ok(((bits << shift) as i64) >> shift)
    }

    /// Skips `count` bits.
    pub fn skip_bits(&mut self, count: u64) -> io::Result<()> {
        let mut count = count;
        while count > 0 && !self.is_aligned() {
            self.read_bit()?;
            count -= 1;
        }

        let bytes = count / 8;
        if bytes > 0 {
            let skipped = io::copy(&mut io::Read::take(&mut self.data, bytes), &mut io::sink())?;
            if skipped != bytes {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "skipped past the end of the stream"));
            }
            self.bits_read += bytes * 8;
        }

        for _ in 0..count % 8 {
            self.read_bit()?;
        }

        Ok(())
    }

    /// Discards the remaining bits of the current byte.
    pub const fn align(&mut self) {
        self.bits_read += self.remaining as u64;
        self.remaining = 0;
    }
}

impl<T> BitReader<T> {
    /// Returns true if the reader is at a byte boundary.
    pub const fn is_aligned(&self) -> bool {
        self.remaining == 0
    }

    /// Total number of bits consumed so far.
    pub const fn bit_pos(&self) -> u64 {
        self.bits_read
    }

    /// Returns a reference to the underlying reader.
    pub const fn get_ref(&self) -> &T {
        &self.data
    }

    /// Returns the underlying reader, discarding any partially read byte.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: io::Read> io::Read for BitReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_aligned() {
            let n = self.data.read(buf)?;
            self.bits_read += n as u64 * 8;
            return Ok(n);
        }

        for (idx, byte) in buf.iter_mut().enumerate() {
            match self.read_bits(8) {
                Ok(bits) => *byte = bits as u8,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof && idx > 0 => return Ok(idx),
                Err(err) => return Err(err),
            }
        }

        Ok(buf.len())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use byteorder::{BigEndian, ReadBytesExt};

    use super::*;

    #[test]
    fn test_bit_reader() {
        let mut reader = BitReader::new_from_slice([0b1010_1010, 0b0101_0101]);

        assert!(reader.read_bit().unwrap());
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.bit_pos(), 5);
        assert!(!reader.is_aligned());
        assert_eq!(reader.read_bits(11).unwrap(), 0b010_0101_0101);
        assert!(reader.is_aligned());
        assert_eq!(reader.read_bit().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_signed_bits() {
        let mut reader = BitReader::new_from_slice([0b1110_0011]);

        assert_eq!(reader.read_signed_bits(4).unwrap(), -2);
        assert_eq!(reader.read_signed_bits(4).unwrap(), 3);
    }

    #[test]
    fn test_skip_and_align() {
        let mut reader = BitReader::new_from_slice([0xff, 0x00, 0x12, 0x34, 0x80]);

        reader.skip_bits(3).unwrap();
        reader.align();
        assert_eq!(reader.bit_pos(), 8);
        reader.skip_bits(8).unwrap();
        assert_eq!(reader.read_u16::<BigEndian>().unwrap(), 0x1234);
        reader.skip_bits(1).unwrap();
        assert_eq!(reader.read_bits(7).unwrap(), 0);
        assert!(reader.skip_bits(9).is_err());
    }

    #[test]
    fn test_unaligned_byte_read() {
        let mut reader = BitReader::new_from_slice([0b0000_1111, 0b1111_0000]);

        reader.read_bits(4).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0xff);
        assert_eq!(reader.read_bits(4).unwrap(), 0);
    }
}
