use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};

use crate::{NALUnitHeader, NALUnitType, check_max};

/// The leading fields of a video parameter set, ISO/IEC-23090-3-2022 - 7.3.2.3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vps {
    /// `vps_video_parameter_set_id`, 1..=15.
    pub vps_video_parameter_set_id: u8,
    /// `vps_max_layers_minus1`
    pub vps_max_layers_minus1: u8,
    /// `vps_max_sublayers_minus1`, 0..=6.
    pub vps_max_sublayers_minus1: u8,
}

impl Vps {
    /// Parses a VPS NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses a VPS NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if nal_unit_header.nal_unit_type != NALUnitType::VpsNut {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nal_unit_type is not VPS_NUT"));
        }

        let vps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;
        if vps_video_parameter_set_id == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "vps_video_parameter_set_id 0 is reserved",
            ));
        }

        let vps_max_layers_minus1 = bit_reader.read_bits(6)? as u8;
        let vps_max_sublayers_minus1 = bit_reader.read_bits(3)? as u8;
        check_max("vps_max_sublayers_minus1", vps_max_sublayers_minus1 as u64, 6)?;

        Ok(Self {
            vps_video_parameter_set_id,
            vps_max_layers_minus1,
            vps_max_sublayers_minus1,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_vps_parse() {
        let vps = Vps::parse(io::Cursor::new([0x00, 0x71, 0x10, 0x00])).unwrap();
        insta::assert_debug_snapshot!(vps, @r"
        Vps {
            vps_video_parameter_set_id: 1,
            vps_max_layers_minus1: 0,
            vps_max_sublayers_minus1: 0,
        }
        ");

        // id 2, two layers, three sublayers
        let vps = Vps::parse(io::Cursor::new([0x00, 0x71, 0x20, 0x50])).unwrap();
        assert_eq!(vps.vps_video_parameter_set_id, 2);
        assert_eq!(vps.vps_max_layers_minus1, 1);
        assert_eq!(vps.vps_max_sublayers_minus1, 2);
    }

    #[test]
    fn test_vps_errors() {
        let err = Vps::parse(io::Cursor::new([0x00, 0x71, 0x00, 0x00])).unwrap_err();
        assert_eq!(err.to_string(), "vps_video_parameter_set_id 0 is reserved");

        let err = Vps::parse(io::Cursor::new([0x00, 0x79, 0x10, 0x00])).unwrap_err();
        assert_eq!(err.to_string(), "nal_unit_type is not VPS_NUT");
    }
}
