use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::range_check::range_check;
use crate::{NALUnitHeader, NALUnitType, ProfileTierLevel};

mod st_ref_pic_set;
mod vui_parameters;

pub use st_ref_pic_set::ShortTermRefPicSets;
pub use vui_parameters::VuiParameters;

/// Sequence parameter set, ISO/IEC-23008-2-2020 - 7.3.2.2.1
///
/// Parsing stops after the VUI timing information, the range, multilayer,
/// 3D and SCC extensions are not read.
#[derive(Debug, Clone, PartialEq)]
pub struct Sps {
    /// `sps_video_parameter_set_id`
    pub sps_video_parameter_set_id: u8,
    /// `sps_max_sub_layers_minus1`, 0..=6.
    pub sps_max_sub_layers_minus1: u8,
    /// `sps_temporal_id_nesting_flag`
    pub sps_temporal_id_nesting_flag: bool,
    /// `profile_tier_level(1, sps_max_sub_layers_minus1)`
    pub profile_tier_level: ProfileTierLevel,
    /// `sps_seq_parameter_set_id`, 0..=15.
    pub sps_seq_parameter_set_id: u8,
    /// `chroma_format_idc`, 0..=3.
    pub chroma_format_idc: u8,
    /// `separate_colour_plane_flag`
    pub separate_colour_plane_flag: bool,
    /// `pic_width_in_luma_samples`
    pub pic_width_in_luma_samples: u64,
    /// `pic_height_in_luma_samples`
    pub pic_height_in_luma_samples: u64,
    /// The conformance cropping window, all zero when absent.
    pub conformance_window: ConformanceWindow,
    /// `bit_depth_luma_minus8`
    pub bit_depth_luma_minus8: u8,
    /// `bit_depth_chroma_minus8`
    pub bit_depth_chroma_minus8: u8,
    /// `log2_max_pic_order_cnt_lsb_minus4`
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    /// `log2_min_luma_coding_block_size_minus3`
    pub log2_min_luma_coding_block_size_minus3: u64,
    /// `log2_diff_max_min_luma_coding_block_size`
    pub log2_diff_max_min_luma_coding_block_size: u64,
    /// The short-term reference picture sets.
    pub short_term_ref_pic_sets: ShortTermRefPicSets,
    /// VUI parameters, `None` when absent or when they failed to parse.
    pub vui_parameters: Option<VuiParameters>,
}

/// `conf_win_*_offset`, in chroma sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConformanceWindow {
    /// `conf_win_left_offset`
    pub conf_win_left_offset: u64,
    /// `conf_win_right_offset`
    pub conf_win_right_offset: u64,
    /// `conf_win_top_offset`
    pub conf_win_top_offset: u64,
    /// `conf_win_bottom_offset`
    pub conf_win_bottom_offset: u64,
}

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

        let sps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let sps_max_sub_layers_minus1 = bit_reader.read_bits(3)? as u8;
        range_check!(sps_max_sub_layers_minus1, 0, 6)?;
        let sps_temporal_id_nesting_flag = bit_reader.read_bit()?;

        let profile_tier_level = ProfileTierLevel::parse(&mut bit_reader, sps_max_sub_layers_minus1)?;

        let sps_seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        range_check!(sps_seq_parameter_set_id, 0, 15)?;

        let chroma_format_idc = bit_reader.read_exp_golomb()?;
        range_check!(chroma_format_idc, 0, 3)?;
        let separate_colour_plane_flag = chroma_format_idc == 3 && bit_reader.read_bit()?;

        let pic_width_in_luma_samples = bit_reader.read_exp_golomb()?;
        let pic_height_in_luma_samples = bit_reader.read_exp_golomb()?;
        if pic_width_in_luma_samples == 0 || pic_height_in_luma_samples == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "picture size must not be 0"));
        }

        // conformance_window_flag
        let conformance_window = if bit_reader.read_bit()? {
            ConformanceWindow {
                conf_win_left_offset: bit_reader.read_exp_golomb()?,
                conf_win_right_offset: bit_reader.read_exp_golomb()?,
                conf_win_top_offset: bit_reader.read_exp_golomb()?,
                conf_win_bottom_offset: bit_reader.read_exp_golomb()?,
            }
        } else {
            ConformanceWindow::default()
        };

        let bit_depth_luma_minus8 = bit_reader.read_exp_golomb()?;
        range_check!(bit_depth_luma_minus8, 0, 8)?;
        let bit_depth_chroma_minus8 = bit_reader.read_exp_golomb()?;
        range_check!(bit_depth_chroma_minus8, 0, 8)?;

        let log2_max_pic_order_cnt_lsb_minus4 = bit_reader.read_exp_golomb()?;
        range_check!(log2_max_pic_order_cnt_lsb_minus4, 0, 12)?;

        let sps_sub_layer_ordering_info_present_flag = bit_reader.read_bit()?;
        let first = if sps_sub_layer_ordering_info_present_flag {
            0
        } else {
            sps_max_sub_layers_minus1
        };
        for _ in first..=sps_max_sub_layers_minus1 {
            bit_reader.read_exp_golomb()?; // sps_max_dec_pic_buffering_minus1
            bit_reader.read_exp_golomb()?; // sps_max_num_reorder_pics
            bit_reader.read_exp_golomb()?; // sps_max_latency_increase_plus1
        }

        let log2_min_luma_coding_block_size_minus3 = bit_reader.read_exp_golomb()?;
        range_check!(log2_min_luma_coding_block_size_minus3, 0, 3)?;
        let log2_diff_max_min_luma_coding_block_size = bit_reader.read_exp_golomb()?;
        range_check!(log2_diff_max_min_luma_coding_block_size, 0, 3)?;

        bit_reader.read_exp_golomb()?; // log2_min_luma_transform_block_size_minus2
        bit_reader.read_exp_golomb()?; // log2_diff_max_min_luma_transform_block_size
        bit_reader.read_exp_golomb()?; // max_transform_hierarchy_depth_inter
        bit_reader.read_exp_golomb()?; // max_transform_hierarchy_depth_intra

        // scaling_list_enabled_flag, sps_scaling_list_data_present_flag
        if bit_reader.read_bit()? && bit_reader.read_bit()? {
            skip_scaling_list_data(&mut bit_reader)?;
        }

        bit_reader.read_bit()?; // amp_enabled_flag
        bit_reader.read_bit()?; // sample_adaptive_offset_enabled_flag

        // pcm_enabled_flag
        if bit_reader.read_bit()? {
            bit_reader.read_bits(4)?; // pcm_sample_bit_depth_luma_minus1
            bit_reader.read_bits(4)?; // pcm_sample_bit_depth_chroma_minus1
            bit_reader.read_exp_golomb()?; // log2_min_pcm_luma_coding_block_size_minus3
            bit_reader.read_exp_golomb()?; // log2_diff_max_min_pcm_luma_coding_block_size
            bit_reader.read_bit()?; // pcm_loop_filter_disabled_flag
        }

        let num_short_term_ref_pic_sets = bit_reader.read_exp_golomb()?;
        range_check!(num_short_term_ref_pic_sets, 0, 64)?;
        let short_term_ref_pic_sets = ShortTermRefPicSets::parse(&mut bit_reader, num_short_term_ref_pic_sets as usize)?;

        // long_term_ref_pics_present_flag
        if bit_reader.read_bit()? {
            let num_long_term_ref_pics_sps = bit_reader.read_exp_golomb()?;
            range_check!(num_long_term_ref_pics_sps, 0, 32)?;
            for _ in 0..num_long_term_ref_pics_sps {
                bit_reader.read_bits(log2_max_pic_order_cnt_lsb_minus4 as u8 + 4)?; // lt_ref_pic_poc_lsb_sps
                bit_reader.read_bit()?; // used_by_curr_pic_lt_sps_flag
            }
        }

        bit_reader.read_bit()?; // sps_temporal_mvp_enabled_flag
        bit_reader.read_bit()?; // strong_intra_smoothing_enabled_flag

        // vui_parameters_present_flag, a broken VUI leaves the rest of the SPS usable
        let vui_parameters = if bit_reader.read_bit()? {
            VuiParameters::parse(&mut bit_reader).ok()
        } else {
            None
        };

        Ok(Self {
            sps_video_parameter_set_id,
            sps_max_sub_layers_minus1,
            sps_temporal_id_nesting_flag,
            profile_tier_level,
            sps_seq_parameter_set_id: sps_seq_parameter_set_id as u8,
            chroma_format_idc: chroma_format_idc as u8,
            separate_colour_plane_flag,
            pic_width_in_luma_samples,
            pic_height_in_luma_samples,
            conformance_window,
            bit_depth_luma_minus8: bit_depth_luma_minus8 as u8,
            bit_depth_chroma_minus8: bit_depth_chroma_minus8 as u8,
            log2_max_pic_order_cnt_lsb_minus4: log2_max_pic_order_cnt_lsb_minus4 as u8,
            log2_min_luma_coding_block_size_minus3,
            log2_diff_max_min_luma_coding_block_size,
            short_term_ref_pic_sets,
            vui_parameters,
        })
    }

    /// `SubWidthC`, Table 6-1.
    pub const fn sub_width_c(&self) -> u64 {
        match self.chroma_format_idc {
            1 | 2 if !self.separate_colour_plane_flag => 2,
            _ => 1,
        }
    }

    /// `SubHeightC`, Table 6-1.
    pub const fn sub_height_c(&self) -> u64 {
        match self.chroma_format_idc {
            1 if !self.separate_colour_plane_flag => 2,
            _ => 1,
        }
    }

    /// The width after the conformance window is applied.
    pub const fn width(&self) -> u64 {
        let window = &self.conformance_window;
        self.pic_width_in_luma_samples
            .saturating_sub(self.sub_width_c() * (window.conf_win_left_offset + window.conf_win_right_offset))
    }

    /// The height after the conformance window is applied.
    pub const fn height(&self) -> u64 {
        let window = &self.conformance_window;
        self.pic_height_in_luma_samples
            .saturating_sub(self.sub_height_c() * (window.conf_win_top_offset + window.conf_win_bottom_offset))
    }

    /// `BitDepthY`
    pub const fn bit_depth_luma(&self) -> u8 {
        self.bit_depth_luma_minus8 + 8
    }

    /// `BitDepthC`
    pub const fn bit_depth_chroma(&self) -> u8 {
        self.bit_depth_chroma_minus8 + 8
    }

    /// `CtbLog2SizeY`
    pub const fn ctb_log2_size_y(&self) -> u64 {
        self.log2_min_luma_coding_block_size_minus3 + 3 + self.log2_diff_max_min_luma_coding_block_size
    }

    /// `PicSizeInCtbsY`
    pub const fn pic_size_in_ctbs_y(&self) -> u64 {
        let ctb_size = 1 << self.ctb_log2_size_y();
        self.pic_width_in_luma_samples.div_ceil(ctb_size) * self.pic_height_in_luma_samples.div_ceil(ctb_size)
    }

    /// `(num_units_in_tick, time_scale)` from the VUI.
    pub fn timing_info(&self) -> Option<(u32, u32)> {
        self.vui_parameters.as_ref()?.timing_info
    }

    /// Pictures are coded as fields.
    pub fn field_seq(&self) -> bool {
        self.vui_parameters.as_ref().is_some_and(|vui| vui.field_seq_flag)
    }
}

/// Skips `scaling_list_data()`, ISO/IEC-23008-2-2020 - 7.3.4
fn skip_scaling_list_data<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<()> {
    for size_id in 0..4 {
        let step = if size_id == 3 { 3 } else { 1 };
        for _ in (0..6).step_by(step) {
            // scaling_list_pred_mode_flag
            if !bit_reader.read_bit()? {
                bit_reader.read_exp_golomb()?; // scaling_list_pred_matrix_id_delta
                continue;
            }

            let coef_num = 64.min(1 << (4 + (size_id << 1)));
            if size_id > 1 {
                bit_reader.read_signed_exp_golomb()?; // scaling_list_dc_coef_minus8
            }
            for _ in 0..coef_num {
                bit_reader.read_signed_exp_golomb()?; // scaling_list_delta_coef
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use crate::Sps;

    #[test]
    fn test_sps_parse() {
        let data = b"B\x01\x01\x01@\0\0\x03\0\x90\0\0\x03\0\0\x03\0\x99\xa0\x01@ \x05\xa1e\x95R\x90\x84d_\xf8\xc0Z\x80\x80\x80\x82\0\0\x03\0\x02\0\0\x03\x01 \xc0\x0b\xbc\xa2\0\x02bX\0\x011-\x08";

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.width(), 2560);
        assert_eq!(sps.height(), 1440);
        assert_eq!(sps.profile_tier_level.profile_name(), Some("main"));
        assert_eq!(sps.profile_tier_level.general_level_idc, 153);
        assert_eq!(sps.timing_info(), Some((1, 144)));
        assert_eq!(sps.short_term_ref_pic_sets.delta_pocs, vec![vec![-1, -2, -3, -4]]);
        insta::assert_debug_snapshot!(sps.vui_parameters, @r"
        Some(
            VuiParameters {
                aspect_ratio_info: Some(
                    AspectRatioInfo {
                        aspect_ratio_idc: AspectRatioIdc::Square,
                        sar_width: 1,
                        sar_height: 1,
                    },
                ),
                video_format: VideoFormat::Unspecified,
                color_config: Some(
                    ColorConfig {
                        full_range: false,
                        color_primaries: 1,
                        transfer_characteristics: 1,
                        matrix_coefficients: 1,
                    },
                ),
                field_seq_flag: false,
                frame_field_info_present_flag: false,
                timing_info: Some(
                    (
                        1,
                        144,
                    ),
                ),
            },
        )
        ");
    }

    #[test]
    fn test_sps_conformance_window() {
        // Recorded with OBS, 1920x1088 cropped by 4 chroma rows.
        let data = b"\x42\x01\x01\x01\x40\x00\x00\x03\x00\x90\x00\x00\x03\x00\x00\x03\x00\x78\xa0\x03\xc0\x80\x11\x07\xcb\x96\xb4\xa4\x25\x92\xe3\x01\x6a\x02\x02\x02\x08\x00\x00\x03\x00\x08\x00\x00\x03\x00\xf3\x00\x2e\xf2\x88\x00\x02\x62\x5a\x00\x00\x13\x12\xd0\x20";

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.pic_height_in_luma_samples, 1088);
        assert_eq!(sps.conformance_window.conf_win_bottom_offset, 4);
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);
        assert_eq!(sps.profile_tier_level.level(), (4, 0));
        assert_eq!(sps.timing_info(), Some((1, 30)));
    }

    #[test]
    fn test_sps_scaling_lists_and_predicted_sets() {
        // Main 10, 4K, scaling lists and inter predicted reference picture sets
        let data = b"\x42\x01\x01\x22\x20\x00\x00\x03\x00\x90\x00\x00\x03\x00\x00\x03\x00\x99\xA0\x01\xE0\x20\x02\x1C\x4D\x8D\x35\x92\x4F\x84\x14\x70\xF1\xC0\x90\x3B\x0E\x18\x36\x1A\x08\x42\xF0\x81\x21\x00\x88\x40\x10\x06\xE1\xA3\x06\xC3\x41\x08\x5C\xA0\xA0\x21\x04\x41\x70\xB0\x2A\x0A\xC2\x80\x35\x40\x70\x80\xE0\x07\xD0\x2B\x41\x80\xA8\x20\x0B\x85\x81\x50\x56\x14\x01\xAA\x03\x84\x07\x00\x3E\x81\x58\xA1\x0D\x35\xE9\xE8\x60\xD7\x43\x03\x41\xB1\xB8\xC0\xD0\x70\x3A\x1B\x1B\x18\x1A\x0E\x43\x21\x30\xC8\x60\x24\x18\x10\x1F\x1F\x1C\x1E\x30\x74\x26\x12\x0E\x0C\x04\x30\x40\x38\x10\x82\x00\x94\x0F\xF0\x86\x9A\xF2\x17\x20\x48\x26\x59\x02\x41\x20\x98\x4F\x09\x04\x83\x81\xD0\x98\x4E\x12\x09\x07\x21\x90\x98\x5C\x2C\x12\x0C\x08\x0F\x8F\x8E\x0F\x18\x3A\x13\x09\x07\x06\x02\x18\x20\x1C\x08\x41\x00\x4A\x07\xF2\x86\x89\x4D\x08\x2C\x83\x8E\x52\x18\x17\x02\xF2\xC8\x0B\x80\xDC\x06\xB0\x5F\x82\xE0\x35\x03\xA0\x66\x06\xB0\x63\x06\x00\x6A\x06\x40\xE0\x0B\x20\x73\x06\x60\xC8\x0E\x40\x58\x03\x90\x0A\xB0\x77\x07\x40\x2A\x81\xC7\xFF\xC1\x24\x34\x49\x8E\x61\x82\x62\x0C\x72\x90\xC0\xB8\x17\x96\x40\x5C\x06\xE0\x35\x82\xFC\x17\x01\xA8\x1D\x03\x30\x35\x83\x18\x30\x03\x50\x32\x07\x00\x59\x03\x98\x33\x06\x40\x72\x02\xC0\x1C\x80\x55\x83\xB8\x3A\x01\x54\x0E\x3F\xFE\x09\x0A\x10\xE9\xAF\x4F\x43\x06\xBA\x18\x1A\x0D\x8D\xC6\x06\x83\x81\xD0\xD8\xD8\xC0\xD0\x72\x19\x09\x86\x43\x01\x20\xC0\x80\xF8\xF8\xE0\xF1\x83\xA1\x30\x90\x70\x60\x21\x82\x01\xC0\x84\x10\x04\xA0\x7F\x84\x3A\x6B\xC8\x5C\x81\x20\x99\x64\x09\x04\x82\x61\x3C\x24\x12\x0E\x07\x42\x61\x38\x48\x24\x1C\x86\x42\x61\x70\xB0\x48\x30\x20\x3E\x3E\x38\x3C\x60\xE8\x4C\x24\x1C\x18\x08\x60\x80\x70\x21\x04\x01\x28\x1F\xCA\x1A\x92\x9A\x10\x59\x07\x1C\xA4\x30\x2E\x05\xE5\x90\x17\x01\xB8\x0D\x60\xBF\x05\xC0\x6A\x07\x40\xCC\x0D\x60\xC6\x0C\x00\xD4\x0C\x81\xC0\x16\x40\xE6\x0C\xC1\x90\x1C\x80\xB0\x07\x20\x15\x60\xEE\x0E\x80\x55\x03\x8F\xFF\x82\x48\x6A\x49\x8E\x61\x82\x62\x0C\x72\x90\xC0\xB8\x17\x96\x40\x5C\x06\xE0\x35\x82\xFC\x17\x01\xA8\x1D\x03\x30\x35\x83\x18\x30\x03\x50\x32\x07\x00\x59\x03\x98\x33\x06\x40\x72\x02\xC0\x1C\x80\x55\x83\xB8\x3A\x01\x54\x0E\x3F\xFE\x09\x0A\x10\xE9\xAF\x4F\x43\x06\xBA\x18\x1A\x0D\x8D\xC6\x06\x83\x81\xD0\xD8\xD8\xC0\xD0\x72\x19\x09\x86\x43\x01\x20\xC0\x80\xF8\xF8\xE0\xF1\x83\xA1\x30\x90\x70\x60\x21\x82\x01\xC0\x84\x10\x04\xA0\x7F\x86\xA4\x98\xE6\x18\x26\x20\xC7\x29\x0C\x0B\x81\x79\x64\x05\xC0\x6E\x03\x58\x2F\xC1\x70\x1A\x81\xD0\x33\x03\x58\x31\x83\x00\x35\x03\x20\x70\x05\x90\x39\x83\x30\x64\x07\x20\x2C\x01\xC8\x05\x58\x3B\x83\xA0\x15\x40\xE3\xFF\xE0\x91\x11\x5C\x96\xA5\xDE\x02\xD4\x24\x40\x26\xD9\x40\x00\x07\xD2\x00\x01\xD4\xC0\x3E\x46\x81\x8D\xC0\x00\x26\x25\xA0\x00\x13\x12\xD0\x00\x04\xC4\xB4\x00\x02\x62\x5A\x8B\x84\x02\x08\xA2\x00\x01\x00\x08\x44\x01\xC1\x72\x43\x8D\x62\x24\x00\x00\x00\x14";

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.width(), 3840);
        assert_eq!(sps.height(), 2160);
        assert_eq!(sps.bit_depth_luma(), 10);
        assert_eq!(sps.profile_tier_level.profile_name(), Some("main-10"));
        assert_eq!(sps.profile_tier_level.tier_name(), "high");
        assert_eq!(
            sps.short_term_ref_pic_sets.delta_pocs,
            vec![vec![-3], vec![-1, 2], vec![-1]]
        );
        assert_eq!(sps.timing_info(), Some((8008, 480000)));
        assert_eq!(
            sps.vui_parameters.as_ref().and_then(|vui| vui.color_config.as_ref()).map(|c| c.color_primaries),
            Some(9)
        );
    }

    #[test]
    fn test_sps_chroma_422() {
        let data = b"\x42\x01\x01\x24\x08\x00\x00\x03\x00\x9D\x08\x00\x00\x03\x00\x00\x99\xB0\x01\xE0\x20\x02\x1C\x4D\x94\xD6\xED\xBE\x41\x12\x64\xEB\x25\x11\x44\x1A\x6C\x9D\x64\xA2\x29\x09\x26\xBA\xF5\xFF\xEB\xFA\xFD\x7F\xEB\xF5\x44\x51\x04\x93\x5D\x7A\xFF\xF5\xFD\x7E\xBF\xF5\xFA\xC8\xA4\x92\x4D\x75\xEB\xFF\xD7\xF5\xFA\xFF\xD7\xEA\x88\xA2\x24\x93\x5D\x7A\xFF\xF5\xFD\x7E\xBF\xF5\xFA\xC8\x94\x08\x53\x49\x29\x24\x89\x55\x12\xA5\x2A\x94\xC1\x35\x01\x01\x01\x03\xB8\x40\x20\x80\xA2\x00\x01\x00\x07\x44\x01\xC0\x72\xB0\x3C\x90\x00\x00\x00\x13\x63\x6F\x6C\x72\x6E\x63\x6C\x78\x00\x01\x00\x01\x00\x01\x00\x00\x00\x00\x18";

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.chroma_format_idc, 2);
        assert_eq!(sps.sub_width_c(), 2);
        assert_eq!(sps.sub_height_c(), 1);
        assert_eq!(sps.width(), 3840);
        assert_eq!(sps.height(), 2160);
        assert_eq!(sps.short_term_ref_pic_sets.delta_pocs.len(), 7);
        assert_eq!(sps.timing_info(), None);
    }

    #[test]
    fn test_sps_zero_num_units_in_tick() {
        // the VUI timing information is broken, the SPS is kept without VUI
        let data = b"B\x01\x01\x01@\0\0\x03\0\x90\0\0\x03\0\0\x03\0\x99\xa0\x01@ \x05\xa1e\x95R\x90\x84d_\xf8\xc0Z\x80\0\x80\x82\0\0\x03\0\0\0\0\0\x01 \xc0\x0b\xbc\xa2\0\x02bX\0\x011-\x08";

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(data)).unwrap();
        assert_eq!(sps.width(), 2560);
        assert_eq!(sps.vui_parameters, None);
    }

    #[test]
    fn test_forbidden_zero_bit() {
        let err = Sps::parse_with_emulation_prevention(io::Cursor::new([0x80])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "forbidden_zero_bit is not zero");
    }

    #[test]
    fn test_invalid_nalu_type() {
        // VPS_NUT header
        let err = Sps::parse_with_emulation_prevention(io::Cursor::new([0x40, 0x01])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "nal_unit_type is not SPS_NUT");
    }
}
