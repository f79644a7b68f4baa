//! Unsigned leb128, AV1 flavour.
//!
//! AV1 - 4.10.5: at most 8 bytes are read and the decoded value must fit in 32 bits.

use std::io;

/// Maximum number of bytes a leb128 value may span in an AV1 bitstream.
pub const LEB128_MAX_SIZE: usize = 8;

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Reads one leb128 value from a reader.
///
/// Returns [`io::ErrorKind::InvalidData`] when the 8th byte still has its
/// continuation bit set or when the value does not fit in 32 bits.
pub fn read_leb128<R: io::Read>(reader: &mut R) -> io::Result<u64> {
    let mut value = 0u64;
    for i in 0..LEB128_MAX_SIZE {
        let mut byte = [0; 1];
        reader.read_exact(&mut byte)?;

        value |= ((byte[0] & 0x7f) as u64) << (i * 7);
        if byte[0] & 0x80 == 0 {
            if value > u32::MAX as u64 {
                return Err(invalid("leb128 value does not fit in 32 bits"));
            }

            return Ok(value);
        }
    }

    Err(invalid("leb128 continuation past the 8th byte"))
}

/// Decodes a leb128 value at the start of `data`.
///
/// Returns `Ok(None)` if `data` ends before the value is terminated,
/// otherwise the value and the number of bytes it occupied.
pub fn decode_leb128(data: &[u8]) -> io::Result<Option<(u64, usize)>> {
    let mut value = 0u64;
    for (i, &byte) in data.iter().take(LEB128_MAX_SIZE).enumerate() {
        value |= ((byte & 0x7f) as u64) << (i * 7);
        if byte & 0x80 == 0 {
            if value > u32::MAX as u64 {
                return Err(invalid("leb128 value does not fit in 32 bits"));
            }

            return Ok(Some((value, i + 1)));
        }
    }

    if data.len() >= LEB128_MAX_SIZE {
        return Err(invalid("leb128 continuation past the 8th byte"));
    }

    Ok(None)
}

/// Number of bytes needed to encode `value`.
pub const fn leb128_size(value: u64) -> usize {
    let mut value = value >> 7;
    let mut size = 1;
    while value != 0 {
        value >>= 7;
        size += 1;
    }

    size
}

/// Writes `value` with the minimal number of bytes and returns that number.
pub fn write_leb128<W: io::Write>(writer: &mut W, value: u64) -> io::Result<usize> {
    if value > u32::MAX as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "leb128 values are limited to 32 bits",
        ));
    }

    let size = leb128_size(value);
    let mut value = value;
    for i in 0..size {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if i + 1 < size {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
    }

    Ok(size)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        const CASES: [(u64, &[u8]); 7] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (123, &[0x7b]),
            (2468, &[0xa4, 0x13]),
            (987654, &[0x86, 0xa4, 0x3c]),
            (u32::MAX as u64 - 1, &[0xfe, 0xff, 0xff, 0xff, 0x0f]),
            (u32::MAX as u64, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
        ];

        for (value, encoding) in CASES {
            let mut out = Vec::new();
            assert_eq!(write_leb128(&mut out, value).unwrap(), encoding.len());
            assert_eq!(out, encoding);
            assert_eq!(read_leb128(&mut io::Cursor::new(encoding)).unwrap(), value);
            assert_eq!(decode_leb128(encoding).unwrap(), Some((value, encoding.len())));
        }
    }

    #[test]
    fn test_round_trip_never_exceeds_five_bytes() {
        let mut value = 0u64;
        while value <= u32::MAX as u64 {
            let mut out = Vec::new();
            let size = write_leb128(&mut out, value).unwrap();
            assert!(size <= 5);
            assert_eq!(size, leb128_size(value));
            assert_eq!(decode_leb128(&out).unwrap(), Some((value, size)));
            value = value * 3 + 1;
        }
    }

    #[test]
    fn test_non_minimal_encoding_is_accepted() {
        assert_eq!(decode_leb128(&[0x81, 0x80, 0x00]).unwrap(), Some((1, 3)));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(decode_leb128(&[]).unwrap(), None);
        assert_eq!(decode_leb128(&[0x80, 0x80]).unwrap(), None);
        assert_eq!(
            read_leb128(&mut io::Cursor::new([0x80])).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_ninth_continuation_byte() {
        let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00];

        assert_eq!(decode_leb128(&data).unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(
            read_leb128(&mut io::Cursor::new(data)).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_too_large() {
        let data = [0x80, 0x80, 0x80, 0x80, 0x10];

        assert_eq!(decode_leb128(&data).unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert!(write_leb128(&mut Vec::new(), 1 << 32).is_err());
    }
}
