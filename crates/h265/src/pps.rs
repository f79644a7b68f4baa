use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::range_check::range_check;
use crate::{NALUnitHeader, NALUnitType};

/// The leading fields of a picture parameter set, the ones slice segment
/// headers depend on. ISO/IEC-23008-2-2020 - 7.3.2.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pps {
    /// `pps_pic_parameter_set_id`, 0..=63.
    pub pps_pic_parameter_set_id: u8,
    /// `pps_seq_parameter_set_id`, 0..=15.
    pub pps_seq_parameter_set_id: u8,
    /// `dependent_slice_segments_enabled_flag`
    pub dependent_slice_segments_enabled_flag: bool,
    /// `output_flag_present_flag`
    pub output_flag_present_flag: bool,
    /// `num_extra_slice_header_bits`
    pub num_extra_slice_header_bits: u8,
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

        let pps_pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        range_check!(pps_pic_parameter_set_id, 0, 63)?;
        let pps_seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        range_check!(pps_seq_parameter_set_id, 0, 15)?;

        Ok(Self {
            pps_pic_parameter_set_id: pps_pic_parameter_set_id as u8,
            pps_seq_parameter_set_id: pps_seq_parameter_set_id as u8,
            dependent_slice_segments_enabled_flag: bit_reader.read_bit()?,
            output_flag_present_flag: bit_reader.read_bit()?,
            num_extra_slice_header_bits: bit_reader.read_bits(3)? as u8,
        })
    }
}
