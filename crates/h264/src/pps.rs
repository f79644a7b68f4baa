use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{NALUnitHeader, NALUnitType};

/// The leading fields of a Picture Parameter Set.
/// ISO/IEC-14496-10-2022 - 7.3.2.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pps {
    /// `pic_parameter_set_id`, 0 to 255.
    pub pic_parameter_set_id: u8,
    /// `seq_parameter_set_id` of the SPS this PPS refers to, 0 to 31.
    pub seq_parameter_set_id: u8,
    /// `entropy_coding_mode_flag`, CABAC when set.
    pub entropy_coding_mode_flag: bool,
    /// `bottom_field_pic_order_in_frame_present_flag`
    pub bottom_field_pic_order_in_frame_present_flag: bool,
}

impl Pps {
    /// Parses a PPS NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses a PPS NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let header = NALUnitHeader::parse(&mut bit_reader)?;
        if header.nal_unit_type != NALUnitType::PPS {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit type is not PPS"));
        }

        let pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        if pic_parameter_set_id > 255 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "pic_parameter_set_id must be at most 255"));
        }

        let seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        if seq_parameter_set_id > 31 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "seq_parameter_set_id must be at most 31"));
        }

        Ok(Self {
            pic_parameter_set_id: pic_parameter_set_id as u8,
            seq_parameter_set_id: seq_parameter_set_id as u8,
            entropy_coding_mode_flag: bit_reader.read_bit()?,
            bottom_field_pic_order_in_frame_present_flag: bit_reader.read_bit()?,
        })
    }
}
