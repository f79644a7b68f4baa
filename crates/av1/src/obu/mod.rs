use std::io;

use nutype_enum::nutype_enum;
use reframe_bytes_util::{BitReader, read_leb128};

pub(crate) mod frame_header;
pub(crate) mod reference;
pub mod seq;
pub(crate) mod tile_group;

nutype_enum! {
    /// OBU types as defined by AV1 - 6.2.2.
    pub enum ObuType(u8) {
        /// `OBU_SEQUENCE_HEADER`
        SequenceHeader = 1,
        /// `OBU_TEMPORAL_DELIMITER`
        TemporalDelimiter = 2,
        /// `OBU_FRAME_HEADER`
        FrameHeader = 3,
        /// `OBU_TILE_GROUP`
        TileGroup = 4,
        /// `OBU_METADATA`
        Metadata = 5,
        /// `OBU_FRAME`
        Frame = 6,
        /// `OBU_REDUNDANT_FRAME_HEADER`
        RedundantFrameHeader = 7,
        /// `OBU_TILE_LIST`
        TileList = 8,
        /// `OBU_PADDING`
        Padding = 15,
    }
}

impl ObuType {
    /// Returns true if the type is not reserved.
    pub const fn is_known(&self) -> bool {
        matches!(self.0, 1..=8 | 15)
    }
}

/// The optional second header byte carrying the scalability ids.
///
/// AV1 - 5.3.3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObuExtensionHeader {
    /// `temporal_id`, 3 bits.
    pub temporal_id: u8,
    /// `spatial_id`, 2 bits.
    pub spatial_id: u8,
}

/// OBU header, AV1 - 5.3.1 and 5.3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObuHeader {
    /// The type of the OBU.
    pub obu_type: ObuType,
    /// `obu_size` when `obu_has_size_field` is set.
    pub size: Option<u64>,
    /// Present when `obu_extension_flag` is set.
    pub extension_header: Option<ObuExtensionHeader>,
}

impl ObuHeader {
    /// Parses the header, the extension header and the size field.
    ///
    /// Fails with [`io::ErrorKind::InvalidData`] when the forbidden bit is set
    /// or the size field is not a valid leb128.
    pub fn parse(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);
        if bit_reader.read_bit()? {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "obu_forbidden_bit is set"));
        }

        let obu_type = ObuType::from(bit_reader.read_bits(4)? as u8);
        let extension_flag = bit_reader.read_bit()?;
        let has_size_field = bit_reader.read_bit()?;
        // obu_reserved_1bit
        bit_reader.read_bit()?;

        let extension_header = if extension_flag {
            let temporal_id = bit_reader.read_bits(3)? as u8;
            let spatial_id = bit_reader.read_bits(2)? as u8;
            // extension_header_reserved_3bits
            bit_reader.read_bits(3)?;

            Some(ObuExtensionHeader { temporal_id, spatial_id })
        } else {
            None
        };

        let size = if has_size_field {
            Some(read_leb128(&mut bit_reader)?)
        } else {
            None
        };

        Ok(Self {
            obu_type,
            size,
            extension_header,
        })
    }

    /// Length of the header in bytes, without the size field.
    pub const fn header_len(&self) -> usize {
        if self.extension_header.is_some() { 2 } else { 1 }
    }

    /// `temporal_id`, 0 without an extension header.
    pub fn temporal_id(&self) -> u8 {
        self.extension_header.map(|ext| ext.temporal_id).unwrap_or_default()
    }

    /// `spatial_id`, 0 without an extension header.
    pub fn spatial_id(&self) -> u8 {
        self.extension_header.map(|ext| ext.spatial_id).unwrap_or_default()
    }
}

/// `uvlc()`, AV1 - 4.10.3.
pub(crate) fn read_uvlc<R: io::Read>(reader: &mut BitReader<R>) -> io::Result<u32> {
    let mut leading_zeros = 0u8;
    while !reader.read_bit()? {
        leading_zeros += 1;
        if leading_zeros >= 32 {
            return Ok(u32::MAX);
        }
    }

    let value = reader.read_bits(leading_zeros)?;
    Ok((value + (1u64 << leading_zeros) - 1) as u32)
}

/// `ns(n)`, AV1 - 4.10.7.
pub(crate) fn read_ns<R: io::Read>(reader: &mut BitReader<R>, n: u32) -> io::Result<u32> {
    if n <= 1 {
        return Ok(0);
    }

    let w = (32 - n.leading_zeros()) as u8;
    let m = (1u32 << w) - n;
    let v = reader.read_bits(w - 1)? as u32;
    if v < m {
        return Ok(v);
    }

    let extra_bit = reader.read_bit()? as u32;
    Ok((v << 1) - m + extra_bit)
}

/// `tile_log2(blk_size, target)`, AV1 - 5.9.16.
pub(crate) const fn tile_log2(blk_size: u32, target: u32) -> u32 {
    let mut k = 0;
    while (blk_size << k) < target {
        k += 1;
    }

    k
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use reframe_bytes_util::BitWriter;

    use super::*;

    #[test]
    fn test_obu_header_parse() {
        // temporal delimiter, has_size, size 0
        let header = ObuHeader::parse(&mut io::Cursor::new([0x12, 0x00])).unwrap();
        insta::assert_debug_snapshot!(header, @r"
        ObuHeader {
            obu_type: ObuType::TemporalDelimiter,
            size: Some(
                0,
            ),
            extension_header: None,
        }
        ");
        assert_eq!(header.header_len(), 1);
    }

    #[test]
    fn test_obu_header_extension() {
        // frame, extension, has_size; temporal_id 2, spatial_id 1; size 300
        let header = ObuHeader::parse(&mut io::Cursor::new([0x36, 0b0100_1000, 0xac, 0x02])).unwrap();
        assert_eq!(header.obu_type, ObuType::Frame);
        assert_eq!(header.size, Some(300));
        assert_eq!(header.temporal_id(), 2);
        assert_eq!(header.spatial_id(), 1);
        assert_eq!(header.header_len(), 2);
    }

    #[test]
    fn test_obu_header_forbidden_bit() {
        let err = ObuHeader::parse(&mut io::Cursor::new([0x92, 0x00])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_obu_header_without_size() {
        let header = ObuHeader::parse(&mut io::Cursor::new([0x30])).unwrap();
        assert_eq!(header.obu_type, ObuType::Frame);
        assert_eq!(header.size, None);
        assert!(!ObuType::from(9).is_known());
    }

    #[test]
    fn test_uvlc_and_ns() {
        let mut writer = BitWriter::new(Vec::new());
        // uvlc 0, uvlc 4 (00101)
        writer.write_bits(0b1, 1).unwrap();
        writer.write_bits(0b00101, 5).unwrap();
        // ns(5): w = 3, m = 3; v = 2 -> 2; v = 3 with extra bit 1 -> 4
        writer.write_bits(0b10, 2).unwrap();
        writer.write_bits(0b111, 3).unwrap();
        let data = writer.finish().unwrap();

        let mut reader = BitReader::new_from_slice(data);
        assert_eq!(read_uvlc(&mut reader).unwrap(), 0);
        assert_eq!(read_uvlc(&mut reader).unwrap(), 4);
        assert_eq!(read_ns(&mut reader, 5).unwrap(), 2);
        assert_eq!(read_ns(&mut reader, 5).unwrap(), 4);
    }

    #[test]
    fn test_tile_log2() {
        assert_eq!(tile_log2(1, 1), 0);
        assert_eq!(tile_log2(1, 5), 3);
        assert_eq!(tile_log2(64, 30), 0);
        assert_eq!(tile_log2(16, 64), 2);
    }
}
