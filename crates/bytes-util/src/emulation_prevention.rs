use std::io;

/// A wrapper around a [`std::io::Read`] or [`std::io::Write`] that removes or inserts
/// `emulation_prevention_three_byte`s, when reading or writing respectively.
///
/// NAL unit payloads in H.264, H.265 and H.266 never contain `00 00 0x` with
/// `x <= 3`; the encoder escapes them as `00 00 03 0x`.
///
/// The wrapper moves one byte at a time, so the inner io should be buffered or in memory.
#[derive(Debug)]
pub struct EmulationPreventionIo<I> {
    inner: I,
    zero_count: u8,
}

impl<I> EmulationPreventionIo<I> {
    /// Creates a new wrapper around the given reader or writer.
    pub const fn new(inner: I) -> Self {
        Self { inner, zero_count: 0 }
    }

    /// Returns the wrapped reader or writer.
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: io::Write> io::Write for EmulationPreventionIo<I> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if self.zero_count >= 2 && byte <= 0x03 {
                self.inner.write_all(&[0x03])?;
                self.zero_count = 0;
            }

            self.inner.write_all(&[byte])?;
            if byte == 0x00 {
                self.zero_count += 1;
            } else {
                self.zero_count = 0;
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<I: io::Read> io::Read for EmulationPreventionIo<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read_size = 0;
        let mut one_byte = [0; 1];
        while buf.len() > read_size {
            if self.inner.read(&mut one_byte)? == 0 {
                break;
            }

            let byte = one_byte[0];
            match byte {
                0x03 if self.zero_count >= 2 => {
                    self.zero_count = 0;
                    continue;
                }
                0x00 => self.zero_count += 1,
                _ => self.zero_count = 0,
            }

            buf[read_size] = byte;
            read_size += 1;
        }

        Ok(read_size)
    }
}

/// Returns a copy of `data` with every emulation prevention byte removed.
pub fn strip_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut zero_count = 0;
    for &byte in data {
        if byte == 0x03 && zero_count >= 2 {
            zero_count = 0;
            continue;
        }

        zero_count = if byte == 0x00 { zero_count + 1 } else { 0 };
        out.push(byte);
    }

    out
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn test_read_removes_escapes() {
        let escaped = [0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x00, 0x03, 0xff];
        let mut reader = EmulationPreventionIo::new(io::Cursor::new(escaped));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(out, vec![0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0xff]);
        assert_eq!(strip_emulation_prevention(&escaped), out);
    }

    #[test]
    fn test_write_inserts_escapes() {
        let mut writer = EmulationPreventionIo::new(Vec::new());
        writer.write_all(&[0x00, 0x00, 0x01, 0x00, 0x00, 0x04]).unwrap();

        assert_eq!(writer.into_inner(), vec![0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x04]);
    }
}
