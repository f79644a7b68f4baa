use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{NALUnitHeader, NALUnitType, check_max};

/// The leading fields of `picture_header_structure()`, ISO/IEC-23090-3-2022 - 7.3.2.8
///
/// The remaining fields depend on the referenced PPS and SPS and are not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    /// `ph_gdr_or_irap_pic_flag`
    pub ph_gdr_or_irap_pic_flag: bool,
    /// `ph_non_ref_pic_flag`
    pub ph_non_ref_pic_flag: bool,
    /// `ph_gdr_pic_flag`
    pub ph_gdr_pic_flag: bool,
    /// `ph_inter_slice_allowed_flag`
    pub ph_inter_slice_allowed_flag: bool,
    /// `ph_intra_slice_allowed_flag`, inferred set when inter slices are not allowed.
    pub ph_intra_slice_allowed_flag: bool,
    /// `ph_pic_parameter_set_id`, 0..=63.
    pub ph_pic_parameter_set_id: u8,
}

impl PictureHeader {
    /// Parses a PH NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses a PH NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if nal_unit_header.nal_unit_type != NALUnitType::PhNut {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nal_unit_type is not PH_NUT"));
        }

        Self::parse_structure(&mut bit_reader)
    }

    pub(crate) fn parse_structure<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let ph_gdr_or_irap_pic_flag = bit_reader.read_bit()?;
        let ph_non_ref_pic_flag = bit_reader.read_bit()?;
        let ph_gdr_pic_flag = ph_gdr_or_irap_pic_flag && bit_reader.read_bit()?;
        let ph_inter_slice_allowed_flag = bit_reader.read_bit()?;
        let ph_intra_slice_allowed_flag = !ph_inter_slice_allowed_flag || bit_reader.read_bit()?;

        let ph_pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        check_max("ph_pic_parameter_set_id", ph_pic_parameter_set_id, 63)?;

        Ok(Self {
            ph_gdr_or_irap_pic_flag,
            ph_non_ref_pic_flag,
            ph_gdr_pic_flag,
            ph_inter_slice_allowed_flag,
            ph_intra_slice_allowed_flag,
            ph_pic_parameter_set_id: ph_pic_parameter_set_id as u8,
        })
    }

    /// Every slice of the picture is an I slice.
    pub const fn is_intra_only(&self) -> bool {
        !self.ph_inter_slice_allowed_flag
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_irap_picture_header() {
        let ph = PictureHeader::parse(io::Cursor::new([0x00, 0x99, 0x8d, 0x50])).unwrap();
        insta::assert_debug_snapshot!(ph, @r"
        PictureHeader {
            ph_gdr_or_irap_pic_flag: true,
            ph_non_ref_pic_flag: false,
            ph_gdr_pic_flag: false,
            ph_inter_slice_allowed_flag: false,
            ph_intra_slice_allowed_flag: true,
            ph_pic_parameter_set_id: 0,
        }
        ");
        assert!(ph.is_intra_only());
    }

    #[test]
    fn test_inter_picture_header() {
        // non-reference, inter and intra slices, PPS 5
        let ph = PictureHeader::parse(io::Cursor::new([0x00, 0x99, 0x73, 0x55, 0x00])).unwrap();
        assert!(!ph.ph_gdr_or_irap_pic_flag);
        assert!(ph.ph_non_ref_pic_flag);
        assert!(ph.ph_intra_slice_allowed_flag);
        assert_eq!(ph.ph_pic_parameter_set_id, 5);
        assert!(!ph.is_intra_only());

        // GDR with inter slices only, PPS 1
        let ph = PictureHeader::parse(io::Cursor::new([0x00, 0x99, 0xb2, 0xaa])).unwrap();
        assert!(ph.ph_gdr_or_irap_pic_flag);
        assert!(ph.ph_gdr_pic_flag);
        assert!(!ph.ph_intra_slice_allowed_flag);
        assert_eq!(ph.ph_pic_parameter_set_id, 1);
    }

    #[test]
    fn test_not_picture_header() {
        let err = PictureHeader::parse(io::Cursor::new([0x00, 0x41, 0x8d])).unwrap_err();
        assert_eq!(err.to_string(), "nal_unit_type is not PH_NUT");
    }
}
