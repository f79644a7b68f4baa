use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{NALUnitHeader, NALUnitType};

/// The leading fields of a picture parameter set, ISO/IEC-23090-3-2022 - 7.3.2.5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pps {
    /// `pps_pic_parameter_set_id`, 0..=63.
    pub pps_pic_parameter_set_id: u8,
    /// `pps_seq_parameter_set_id`, 0..=15.
    pub pps_seq_parameter_set_id: u8,
    /// `pps_mixed_nalu_types_in_pic_flag`
    pub pps_mixed_nalu_types_in_pic_flag: bool,
    /// `pps_pic_width_in_luma_samples`
    pub pps_pic_width_in_luma_samples: u64,
    /// `pps_pic_height_in_luma_samples`
    pub pps_pic_height_in_luma_samples: u64,
}

impl Pps {
    /// Parses a PPS NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses a PPS NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if nal_unit_header.nal_unit_type != NALUnitType::PpsNut {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nal_unit_type is not PPS_NUT"));
        }

        let pps_pic_parameter_set_id = bit_reader.read_bits(6)? as u8;
        let pps_seq_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let pps_mixed_nalu_types_in_pic_flag = bit_reader.read_bit()?;
        let pps_pic_width_in_luma_samples = bit_reader.read_exp_golomb()?;
        let pps_pic_height_in_luma_samples = bit_reader.read_exp_golomb()?;
        if pps_pic_width_in_luma_samples == 0 || pps_pic_height_in_luma_samples == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "picture size must not be 0"));
        }

        Ok(Self {
            pps_pic_parameter_set_id,
            pps_seq_parameter_set_id,
            pps_mixed_nalu_types_in_pic_flag,
            pps_pic_width_in_luma_samples,
            pps_pic_height_in_luma_samples,
        })
    }
}
