use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{NALUnitHeader, NALUnitType, ProfileTierLevel, check_max};

/// Sequence parameter set, ISO/IEC-23090-3-2022 - 7.3.2.4
///
/// Parsing stops after `sps_bitdepth_minus8`: that is all the stream
/// description needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// `sps_seq_parameter_set_id`, 0..=15.
    pub sps_seq_parameter_set_id: u8,
    /// `sps_video_parameter_set_id`, 0 when the SPS does not refer to a VPS.
    pub sps_video_parameter_set_id: u8,
    /// `sps_max_sublayers_minus1`, 0..=6.
    pub sps_max_sublayers_minus1: u8,
    /// `sps_chroma_format_idc`
    pub sps_chroma_format_idc: u8,
    /// `sps_log2_ctu_size_minus5`, 0..=2.
    pub sps_log2_ctu_size_minus5: u8,
    /// Present when `sps_ptl_dpb_hrd_params_present_flag` is set.
    pub profile_tier_level: Option<ProfileTierLevel>,
    /// `sps_gdr_enabled_flag`
    pub sps_gdr_enabled_flag: bool,
    /// `sps_ref_pic_resampling_enabled_flag`
    pub sps_ref_pic_resampling_enabled_flag: bool,
    /// `sps_res_change_in_clvs_allowed_flag`
    pub sps_res_change_in_clvs_allowed_flag: bool,
    /// `sps_pic_width_max_in_luma_samples`
    pub sps_pic_width_max_in_luma_samples: u64,
    /// `sps_pic_height_max_in_luma_samples`
    pub sps_pic_height_max_in_luma_samples: u64,
    /// The conformance cropping window, all zero when absent.
    pub conformance_window: ConformanceWindow,
    /// `sps_num_subpics_minus1`, 0 without subpicture info.
    pub sps_num_subpics_minus1: u64,
    /// `sps_bitdepth_minus8`, shared by luma and chroma.
    pub sps_bitdepth_minus8: u8,
}

/// `sps_conf_win_*_offset`, in chroma sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConformanceWindow {
    /// `sps_conf_win_left_offset`
    pub left_offset: u64,
    /// `sps_conf_win_right_offset`
    pub right_offset: u64,
    /// `sps_conf_win_top_offset`
    pub top_offset: u64,
    /// `sps_conf_win_bottom_offset`
    pub bottom_offset: u64,
}

const SUB_WIDTH_C: [u64; 4] = [1, 2, 2, 1];
const SUB_HEIGHT_C: [u64; 4] = [1, 2, 1, 1];

impl Sps {
    /// Parses an SPS NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses an SPS NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if nal_unit_header.nal_unit_type != NALUnitType::SpsNut {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nal_unit_type is not SPS_NUT"));
        }

        let sps_seq_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let sps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let sps_max_sublayers_minus1 = bit_reader.read_bits(3)? as u8;
        check_max("sps_max_sublayers_minus1", sps_max_sublayers_minus1 as u64, 6)?;
        let sps_chroma_format_idc = bit_reader.read_bits(2)? as u8;
        let sps_log2_ctu_size_minus5 = bit_reader.read_bits(2)? as u8;
        check_max("sps_log2_ctu_size_minus5", sps_log2_ctu_size_minus5 as u64, 2)?;

        let sps_ptl_dpb_hrd_params_present_flag = bit_reader.read_bit()?;
        if sps_video_parameter_set_id == 0 && !sps_ptl_dpb_hrd_params_present_flag {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "sps_ptl_dpb_hrd_params_present_flag must be 1 when sps_video_parameter_set_id is 0",
            ));
        }

        let profile_tier_level = if sps_ptl_dpb_hrd_params_present_flag {
            Some(ProfileTierLevel::parse(&mut bit_reader, sps_max_sublayers_minus1)?)
        } else {
            None
        };

        let sps_gdr_enabled_flag = bit_reader.read_bit()?;
        let sps_ref_pic_resampling_enabled_flag = bit_reader.read_bit()?;
        let sps_res_change_in_clvs_allowed_flag = sps_ref_pic_resampling_enabled_flag && bit_reader.read_bit()?;

        let sps_pic_width_max_in_luma_samples = bit_reader.read_exp_golomb()?;
        let sps_pic_height_max_in_luma_samples = bit_reader.read_exp_golomb()?;
        if sps_pic_width_max_in_luma_samples == 0 || sps_pic_height_max_in_luma_samples == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "picture size must not be 0"));
        }

        let sub_width_c = SUB_WIDTH_C[sps_chroma_format_idc as usize];
        let sub_height_c = SUB_HEIGHT_C[sps_chroma_format_idc as usize];

        // sps_conformance_window_flag
        let conformance_window = if bit_reader.read_bit()? {
            let window = ConformanceWindow {
                left_offset: bit_reader.read_exp_golomb()?,
                right_offset: bit_reader.read_exp_golomb()?,
                top_offset: bit_reader.read_exp_golomb()?,
                bottom_offset: bit_reader.read_exp_golomb()?,
            };

            let horizontal = window.left_offset.saturating_add(window.right_offset);
            let vertical = window.top_offset.saturating_add(window.bottom_offset);
            if horizontal.saturating_mul(sub_width_c) >= sps_pic_width_max_in_luma_samples
                || vertical.saturating_mul(sub_height_c) >= sps_pic_height_max_in_luma_samples
            {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "conformance window is larger than the picture",
                ));
            }

            window
        } else {
            ConformanceWindow::default()
        };

        let ctu_size = 1 << (sps_log2_ctu_size_minus5 + 5);
        // sps_subpic_info_present_flag
        let sps_num_subpics_minus1 = if bit_reader.read_bit()? {
            skip_subpic_info(
                &mut bit_reader,
                sps_pic_width_max_in_luma_samples,
                sps_pic_height_max_in_luma_samples,
                ctu_size,
            )?
        } else {
            0
        };

        let sps_bitdepth_minus8 = bit_reader.read_exp_golomb()?;
        check_max("sps_bitdepth_minus8", sps_bitdepth_minus8, 8)?;

        Ok(Self {
            sps_seq_parameter_set_id,
            sps_video_parameter_set_id,
            sps_max_sublayers_minus1,
            sps_chroma_format_idc,
            sps_log2_ctu_size_minus5,
            profile_tier_level,
            sps_gdr_enabled_flag,
            sps_ref_pic_resampling_enabled_flag,
            sps_res_change_in_clvs_allowed_flag,
            sps_pic_width_max_in_luma_samples,
            sps_pic_height_max_in_luma_samples,
            conformance_window,
            sps_num_subpics_minus1,
            sps_bitdepth_minus8: sps_bitdepth_minus8 as u8,
        })
    }

    /// `SubWidthC`, Table 2.
    pub const fn sub_width_c(&self) -> u64 {
        SUB_WIDTH_C[self.sps_chroma_format_idc as usize]
    }

    /// `SubHeightC`, Table 2.
    pub const fn sub_height_c(&self) -> u64 {
        SUB_HEIGHT_C[self.sps_chroma_format_idc as usize]
    }

    /// The width after the conformance window is applied.
    pub const fn width(&self) -> u64 {
        let window = &self.conformance_window;
        self.sps_pic_width_max_in_luma_samples
            .saturating_sub(self.sub_width_c() * (window.left_offset + window.right_offset))
    }

    /// The height after the conformance window is applied.
    pub const fn height(&self) -> u64 {
        let window = &self.conformance_window;
        self.sps_pic_height_max_in_luma_samples
            .saturating_sub(self.sub_height_c() * (window.top_offset + window.bottom_offset))
    }

    /// `BitDepth`
    pub const fn bit_depth(&self) -> u8 {
        self.sps_bitdepth_minus8 + 8
    }

    /// `CtbSizeY`
    pub const fn ctb_size_y(&self) -> u64 {
        1 << (self.sps_log2_ctu_size_minus5 + 5)
    }
}

/// `Ceil(Log2(value))`
const fn ceil_log2(value: u64) -> u8 {
    if value <= 1 {
        return 0;
    }

    (u64::BITS - (value - 1).leading_zeros()) as u8
}

/// Skips the subpicture layout and id mapping, returns `sps_num_subpics_minus1`.
fn skip_subpic_info<R: io::Read>(bit_reader: &mut BitReader<R>, width: u64, height: u64, ctu_size: u64) -> io::Result<u64> {
    let sps_num_subpics_minus1 = bit_reader.read_exp_golomb()?;
    check_max("sps_num_subpics_minus1", sps_num_subpics_minus1, 599)?;

    if sps_num_subpics_minus1 > 0 {
        let sps_independent_subpics_flag = bit_reader.read_bit()?;
        let sps_subpic_same_size_flag = bit_reader.read_bit()?;

        let x_bits = ceil_log2(width.div_ceil(ctu_size));
        let y_bits = ceil_log2(height.div_ceil(ctu_size));
        for i in 0..=sps_num_subpics_minus1 {
            if !sps_subpic_same_size_flag || i == 0 {
                if i > 0 && width > ctu_size {
                    bit_reader.skip_bits(x_bits as u64)?; // sps_subpic_ctu_top_left_x
                }
                if i > 0 && height > ctu_size {
                    bit_reader.skip_bits(y_bits as u64)?; // sps_subpic_ctu_top_left_y
                }
                if i < sps_num_subpics_minus1 && width > ctu_size {
                    bit_reader.skip_bits(x_bits as u64)?; // sps_subpic_width_minus1
                }
                if i < sps_num_subpics_minus1 && height > ctu_size {
                    bit_reader.skip_bits(y_bits as u64)?; // sps_subpic_height_minus1
                }
            }

            if !sps_independent_subpics_flag {
                bit_reader.read_bit()?; // sps_subpic_treated_as_pic_flag
                bit_reader.read_bit()?; // sps_loop_filter_across_subpic_enabled_flag
            }
        }
    }

    let sps_subpic_id_len_minus1 = bit_reader.read_exp_golomb()?;
    check_max("sps_subpic_id_len_minus1", sps_subpic_id_len_minus1, 15)?;

    // sps_subpic_id_mapping_explicitly_signalled_flag, sps_subpic_id_mapping_present_flag
    if bit_reader.read_bit()? && bit_reader.read_bit()? {
        // sps_subpic_id
        bit_reader.skip_bits((sps_num_subpics_minus1 + 1) * (sps_subpic_id_len_minus1 + 1))?;
    }

    Ok(sps_num_subpics_minus1)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_sps_parse() {
        let data = [
            0x00, 0x79, 0x00, 0x0d, 0x02, 0x53, 0x80, 0x00, 0x00, 0x0f, 0x02, 0x00, 0x43, 0x91, 0xc0,
        ];
        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();

        insta::assert_debug_snapshot!(sps, @r"
        Sps {
            sps_seq_parameter_set_id: 0,
            sps_video_parameter_set_id: 0,
            sps_max_sublayers_minus1: 0,
            sps_chroma_format_idc: 1,
            sps_log2_ctu_size_minus5: 2,
            profile_tier_level: Some(
                ProfileTierLevel {
                    general_profile_idc: 1,
                    general_tier_flag: false,
                    general_level_idc: 83,
                    ptl_frame_only_constraint_flag: true,
                    ptl_multilayer_enabled_flag: false,
                },
            ),
            sps_gdr_enabled_flag: false,
            sps_ref_pic_resampling_enabled_flag: false,
            sps_res_change_in_clvs_allowed_flag: false,
            sps_pic_width_max_in_luma_samples: 1920,
            sps_pic_height_max_in_luma_samples: 1080,
            conformance_window: ConformanceWindow {
                left_offset: 0,
                right_offset: 0,
                top_offset: 0,
                bottom_offset: 0,
            },
            sps_num_subpics_minus1: 0,
            sps_bitdepth_minus8: 2,
        }
        ");
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);
        assert_eq!(sps.bit_depth(), 10);
        assert_eq!(sps.ctb_size_y(), 128);
    }

    #[test]
    fn test_sps_conformance_window() {
        // 1920x1088 cropped by 4 chroma rows, 64x64 CTUs, GDR enabled, 8 bit, level 4.1
        let data = [
            0x00, 0x79, 0x00, 0x0b, 0x02, 0x43, 0x80, 0x00, 0x80, 0x0f, 0x02, 0x00, 0x44, 0x1f, 0x2b,
        ];
        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();

        assert!(sps.sps_gdr_enabled_flag);
        assert_eq!(sps.sps_pic_height_max_in_luma_samples, 1088);
        assert_eq!(sps.conformance_window.bottom_offset, 4);
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);
        assert_eq!(sps.bit_depth(), 8);
        assert_eq!(sps.ctb_size_y(), 64);
        assert_eq!(sps.profile_tier_level.map(|ptl| ptl.level()), Some((4, 1)));
    }

    #[test]
    fn test_sps_subpictures() {
        // two independent subpictures of 8 and 7 CTU columns
        let data = [
            0x00, 0x79, 0x00, 0x0d, 0x02, 0x53, 0x80, 0x00, 0x00, 0x0f, 0x02, 0x00, 0x43, 0x95, 0x4f, 0x10, 0x13, 0x80,
        ];
        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();

        assert_eq!(sps.sps_num_subpics_minus1, 1);
        assert_eq!(sps.bit_depth(), 10);
    }

    #[test]
    fn test_sps_sublayers_and_constraints() {
        // one extra sublayer without its own level
        let data = [
            0x00, 0x79, 0x00, 0x2d, 0x02, 0x43, 0x80, 0x00, 0x00, 0x00, 0x0f, 0x02, 0x00, 0x43, 0x91, 0xc0,
        ];
        let sps = Sps::parse(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.sps_max_sublayers_minus1, 1);
        assert_eq!(sps.sps_pic_width_max_in_luma_samples, 1920);
        assert_eq!(sps.bit_depth(), 10);

        // general constraints info present, all zero
        let data = [
            0x00, 0x79, 0x00, 0x0d, 0x02, 0x43, 0xa0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x0f, 0x02, 0x00, 0x43, 0x91, 0xc0,
        ];
        let sps = Sps::parse(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.sps_pic_height_max_in_luma_samples, 1080);
        assert_eq!(sps.bit_depth(), 10);
    }

    #[test]
    fn test_sps_errors() {
        let err = Sps::parse(io::Cursor::new([0x00, 0x79, 0x00, 0x0c, 0x00])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "sps_ptl_dpb_hrd_params_present_flag must be 1 when sps_video_parameter_set_id is 0"
        );

        let err = Sps::parse(io::Cursor::new([0x00, 0x81, 0x00])).unwrap_err();
        assert_eq!(err.to_string(), "nal_unit_type is not SPS_NUT");
    }
}
