//! Locating NAL units in byte-stream and length-prefixed buffers.

use std::io;
use std::sync::LazyLock;

use byteorder::{BigEndian, ReadBytesExt};
use memchr::memmem::Finder;

static START_CODE: LazyLock<Finder> = LazyLock::new(|| Finder::new(&[0, 0, 1]));

/// Where a NAL unit sits in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NalExtent {
    /// Start of the start code or length prefix.
    pub sc_offset: usize,
    /// Start of the NAL unit header.
    pub offset: usize,
    /// Size of the NAL unit.
    pub size: usize,
}

impl NalExtent {
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Outcome of looking for the next NAL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// A complete unit.
    Unit(NalExtent),
    /// No unit starts in the remaining bytes.
    NoUnit,
    /// A unit starts but its end is not in the buffer. For byte-stream input
    /// the size runs to the end of the buffer, for length-prefixed input it is
    /// the declared length.
    Unterminated(NalExtent),
}

/// Finds the unit starting at or after `from` in start code delimited data.
///
/// A start code preceded by a zero byte is taken as the four byte form. The
/// zero bytes in front of the next start code are not part of the unit.
pub(crate) fn scan_byte_stream(data: &[u8], from: usize) -> Scan {
    if data.len() < from + 4 {
        return Scan::NoUnit;
    }

    let Some(pos) = START_CODE.find(&data[from..]).map(|pos| pos + from) else {
        return Scan::NoUnit;
    };

    let offset = pos + 3;
    if offset >= data.len() {
        return Scan::NoUnit;
    }

    let sc_offset = if pos > from && data[pos - 1] == 0 { pos - 1 } else { pos };

    match START_CODE.find(&data[offset..]) {
        Some(next) => {
            let mut size = next;
            while size > 0 && data[offset + size - 1] == 0 {
                size -= 1;
            }

            Scan::Unit(NalExtent { sc_offset, offset, size })
        }
        None => Scan::Unterminated(NalExtent {
            sc_offset,
            offset,
            size: data.len() - offset,
        }),
    }
}

/// Reads the unit whose length prefix starts at `from`.
pub(crate) fn scan_length_prefixed(data: &[u8], from: usize, nal_length_size: u8) -> io::Result<Scan> {
    let prefix = nal_length_size as usize;
    if data.len() < from + prefix {
        return Ok(Scan::NoUnit);
    }

    let size = (&data[from..]).read_uint::<BigEndian>(prefix)? as usize;
    let extent = NalExtent {
        sc_offset: from,
        offset: from + prefix,
        size,
    };

    if extent.end() > data.len() {
        Ok(Scan::Unterminated(extent))
    } else {
        Ok(Scan::Unit(extent))
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_start_codes() {
        let data = [0, 0, 0, 1, 0x67, 0x42, 0, 0, 1, 0x68, 0xce, 0, 0, 0, 1, 0x65, 0x88];

        let Scan::Unit(first) = scan_byte_stream(&data, 0) else {
            panic!("expected a unit");
        };
        assert_eq!(first, NalExtent { sc_offset: 0, offset: 4, size: 2 });

        let Scan::Unit(second) = scan_byte_stream(&data, first.end()) else {
            panic!("expected a unit");
        };
        // the zero in front of the next start code is trimmed
        assert_eq!(second, NalExtent { sc_offset: 6, offset: 9, size: 2 });

        assert_eq!(
            scan_byte_stream(&data, second.end()),
            Scan::Unterminated(NalExtent {
                sc_offset: 11,
                offset: 15,
                size: 2
            })
        );
    }

    #[test]
    fn test_leading_garbage() {
        let data = [0xff, 0xee, 0, 0, 1, 0x09, 0xf0, 0, 0, 1, 0x41];
        assert_eq!(
            scan_byte_stream(&data, 0),
            Scan::Unit(NalExtent {
                sc_offset: 2,
                offset: 5,
                size: 2
            })
        );
    }

    #[test]
    fn test_no_unit() {
        assert_eq!(scan_byte_stream(&[0, 0, 1], 0), Scan::NoUnit);
        assert_eq!(scan_byte_stream(&[0x12, 0x34, 0x56, 0x78, 0x9a], 0), Scan::NoUnit);
        // start code at the very end, header not there yet
        assert_eq!(scan_byte_stream(&[0xaa, 0, 0, 1], 0), Scan::NoUnit);
    }

    #[test]
    fn test_length_prefixed() {
        let data = [0, 0, 0, 2, 0x09, 0xf0, 0, 0, 0, 4, 0x65, 0x88];

        assert_eq!(
            scan_length_prefixed(&data, 0, 4).unwrap(),
            Scan::Unit(NalExtent {
                sc_offset: 0,
                offset: 4,
                size: 2
            })
        );
        assert_eq!(
            scan_length_prefixed(&data, 6, 4).unwrap(),
            Scan::Unterminated(NalExtent {
                sc_offset: 6,
                offset: 10,
                size: 4
            })
        );
        assert_eq!(scan_length_prefixed(&data, 10, 4).unwrap(), Scan::NoUnit);

        let data = [3, 0x41, 0x9a, 0x02];
        assert_eq!(
            scan_length_prefixed(&data, 0, 1).unwrap(),
            Scan::Unit(NalExtent {
                sc_offset: 0,
                offset: 1,
                size: 3
            })
        );
    }
}
