use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::range_check::range_check;
use crate::{NALUnitHeader, NALUnitType, ProfileTierLevel};

/// Video parameter set, up to the timing information.
///
/// ISO/IEC-23008-2-2020 - 7.3.2.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vps {
    /// `vps_video_parameter_set_id`, 0..=15.
    pub vps_video_parameter_set_id: u8,
    /// `vps_max_layers_minus1`
    pub vps_max_layers_minus1: u8,
    /// `vps_max_sub_layers_minus1`, 0..=6.
    pub vps_max_sub_layers_minus1: u8,
    /// `vps_temporal_id_nesting_flag`
    pub vps_temporal_id_nesting_flag: bool,
    /// `profile_tier_level(1, vps_max_sub_layers_minus1)`
    pub profile_tier_level: ProfileTierLevel,
    /// `(vps_num_units_in_tick, vps_time_scale)` when present.
    pub timing_info: Option<(u32, u32)>,
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
        bit_reader.read_bit()?; // vps_base_layer_internal_flag
        bit_reader.read_bit()?; // vps_base_layer_available_flag
        let vps_max_layers_minus1 = bit_reader.read_bits(6)? as u8;
        let vps_max_sub_layers_minus1 = bit_reader.read_bits(3)? as u8;
        range_check!(vps_max_sub_layers_minus1, 0, 6)?;
        let vps_temporal_id_nesting_flag = bit_reader.read_bit()?;

        if bit_reader.read_bits(16)? != 0xffff {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "vps_reserved_0xffff_16bits is not 0xffff"));
        }

        let profile_tier_level = ProfileTierLevel::parse(&mut bit_reader, vps_max_sub_layers_minus1)?;

        let vps_sub_layer_ordering_info_present_flag = bit_reader.read_bit()?;
        let first = if vps_sub_layer_ordering_info_present_flag {
            0
        } else {
            vps_max_sub_layers_minus1
        };
        for _ in first..=vps_max_sub_layers_minus1 {
            bit_reader.read_exp_golomb()?; // vps_max_dec_pic_buffering_minus1
            bit_reader.read_exp_golomb()?; // vps_max_num_reorder_pics
            bit_reader.read_exp_golomb()?; // vps_max_latency_increase_plus1
        }

        let vps_max_layer_id = bit_reader.read_bits(6)?;
        let vps_num_layer_sets_minus1 = bit_reader.read_exp_golomb()?;
        range_check!(vps_num_layer_sets_minus1, 0, 1023)?;
        // layer_id_included_flag[i][j]
        bit_reader.skip_bits(vps_num_layer_sets_minus1 * (vps_max_layer_id + 1))?;

        let timing_info = if bit_reader.read_bit()? {
            let vps_num_units_in_tick = bit_reader.read_bits(32)? as u32;
            let vps_time_scale = bit_reader.read_bits(32)? as u32;
            Some((vps_num_units_in_tick, vps_time_scale))
        } else {
            None
        };

        Ok(Self {
            vps_video_parameter_set_id,
            vps_max_layers_minus1,
            vps_max_sub_layers_minus1,
            vps_temporal_id_nesting_flag,
            profile_tier_level,
            timing_info,
        })
    }
}
