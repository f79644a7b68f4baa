use std::io;

use nutype_enum::nutype_enum;
use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{NALUnitHeader, Sps};

nutype_enum! {
    /// `slice_type` modulo 5, ISO/IEC-14496-10-2022 - 7.4.3 Table 7-6.
    pub enum SliceType(u8) {
        /// P slice
        P = 0,
        /// B slice
        B = 1,
        /// I slice
        I = 2,
        /// SP slice
        SP = 3,
        /// SI slice
        SI = 4,
    }
}

impl SliceType {
    /// I and SI slices only reference the current picture.
    pub const fn is_intra(&self) -> bool {
        matches!(self.0, 2 | 4)
    }
}

/// The leading fields of a slice header, up to the field flags.
/// ISO/IEC-14496-10-2022 - 7.3.3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeader {
    /// The NAL unit header of the slice.
    pub nal_unit_header: NALUnitHeader,
    /// `first_mb_in_slice`, 0 for the first slice of a picture.
    pub first_mb_in_slice: u64,
    /// `slice_type`, reduced to 0..=4.
    pub slice_type: SliceType,
    /// `slice_type` was 5 or more, all slices of the picture share the type.
    pub slice_type_fixed: bool,
    /// `pic_parameter_set_id`
    pub pic_parameter_set_id: u8,
    /// `colour_plane_id`, only present with `separate_colour_plane_flag`.
    pub colour_plane_id: Option<u8>,
    /// `frame_num`
    pub frame_num: u64,
    /// `field_pic_flag`
    pub field_pic_flag: bool,
    /// `bottom_field_flag`
    pub bottom_field_flag: bool,
}

impl SliceHeader {
    /// Parses a slice NAL unit whose payload still contains emulation prevention bytes.
    ///
    /// `active_sps` maps the `pic_parameter_set_id` of the slice to the SPS
    /// that PPS refers to.
    pub fn parse_with_emulation_prevention<'a>(
        reader: impl io::Read,
        active_sps: impl FnOnce(u8) -> Option<&'a Sps>,
    ) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader), active_sps)
    }

    /// Parses a slice NAL unit, header included, from its RBSP bytes.
    pub fn parse<'a>(reader: impl io::Read, active_sps: impl FnOnce(u8) -> Option<&'a Sps>) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if !nal_unit_header.nal_unit_type.is_slice() && nal_unit_header.extension.is_none() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit is not a coded slice"));
        }

        let first_mb_in_slice = bit_reader.read_exp_golomb()?;

        let slice_type = bit_reader.read_exp_golomb()?;
        if slice_type > 9 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "slice_type must be at most 9"));
        }

        let pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        if pic_parameter_set_id > 255 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "pic_parameter_set_id must be at most 255"));
        }

        let sps = active_sps(pic_parameter_set_id as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "slice refers to an unknown PPS or SPS"))?;

        let colour_plane_id = match &sps.ext {
            Some(ext) if ext.separate_colour_plane_flag => Some(bit_reader.read_bits(2)? as u8),
            _ => None,
        };

        let frame_num = bit_reader.read_bits(sps.log2_max_frame_num_minus4 + 4)?;

        let field_pic_flag = !sps.frame_mbs_only_flag && bit_reader.read_bit()?;
        let bottom_field_flag = field_pic_flag && bit_reader.read_bit()?;

        Ok(Self {
            nal_unit_header,
            first_mb_in_slice,
            slice_type: SliceType::from((slice_type % 5) as u8),
            slice_type_fixed: slice_type >= 5,
            pic_parameter_set_id: pic_parameter_set_id as u8,
            colour_plane_id,
            frame_num,
            field_pic_flag,
            bottom_field_flag,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn sps_1080p() -> Sps {
        let sps = [
            103, 100, 0, 42, 172, 178, 0, 240, 4, 79, 203, 128, 181, 1, 1, 1, 64, 0, 0, 3, 0, 64, 0, 0, 30, 35, 198, 12, 146,
        ];
        Sps::parse_with_emulation_prevention(io::Cursor::new(sps)).unwrap()
    }

    #[test]
    fn test_parse_idr_slice() {
        let sps = sps_1080p();
        // first_mb 0, slice_type 7 (I), pps 0, frame_num 0
        let slice = SliceHeader::parse_with_emulation_prevention(io::Cursor::new([0x65, 0x88, 0x84, 0x00]), |pps_id| {
            assert_eq!(pps_id, 0);
            Some(&sps)
        })
        .unwrap();

        assert_eq!(slice.first_mb_in_slice, 0);
        assert_eq!(slice.slice_type, SliceType::I);
        assert!(slice.slice_type.is_intra());
        assert!(slice.slice_type_fixed);
        assert_eq!(slice.pic_parameter_set_id, 0);
        assert_eq!(slice.frame_num, 0);
        assert!(!slice.field_pic_flag);
    }

    #[test]
    fn test_parse_p_slice() {
        let sps = sps_1080p();
        // first_mb 8 (0001001), slice_type 0 (1), pps 0 (1), frame_num 5 (0101)
        let slice = SliceHeader::parse(io::Cursor::new([0x41, 0b0001_0011, 0b1010_1000]), |_| Some(&sps)).unwrap();

        assert_eq!(slice.first_mb_in_slice, 8);
        assert_eq!(slice.slice_type, SliceType::P);
        assert!(!slice.slice_type_fixed);
        assert_eq!(slice.frame_num, 5);
    }

    #[test]
    fn test_parse_slice_unknown_pps() {
        let err = SliceHeader::parse(io::Cursor::new([0x65, 0x88, 0x84, 0x00]), |_| None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = SliceHeader::parse(io::Cursor::new([0x67, 0x88]), |_| None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
