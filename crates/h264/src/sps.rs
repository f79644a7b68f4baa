use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::{AspectRatioIdc, NALUnitHeader, NALUnitType, VideoFormat};

/// The Sequence Parameter Set.
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
#[derive(Debug, Clone, PartialEq)]
pub struct Sps {
    /// `profile_idc`
    pub profile_idc: u8,
    /// `constraint_set0_flag` to `constraint_set5_flag` followed by
    /// `reserved_zero_2bits`, most significant bit first.
    ///
    /// Their meaning depends on the profile, see A.2. For example
    /// `constraint_set3_flag` selects level 1b for Baseline, Main and Extended
    /// at `level_idc` 11 and the intra profiles for High 10, High 4:2:2 and
    /// High 4:4:4.
    pub constraint_set_flags: u8,
    /// `level_idc`
    pub level_idc: u8,
    /// `seq_parameter_set_id`, 0 to 31.
    pub seq_parameter_set_id: u8,
    /// Present for the high profiles. Refer to [`SpsExtended`].
    pub ext: Option<SpsExtended>,
    /// `log2_max_frame_num_minus4`
    pub log2_max_frame_num_minus4: u8,
    /// `pic_order_cnt_type`
    pub pic_order_cnt_type: u8,
    /// `max_num_ref_frames`
    pub max_num_ref_frames: u8,
    /// `pic_width_in_mbs_minus1`
    pub pic_width_in_mbs_minus1: u64,
    /// `pic_height_in_map_units_minus1`
    pub pic_height_in_map_units_minus1: u64,
    /// `frame_mbs_only_flag`, false if the stream may contain field pictures.
    pub frame_mbs_only_flag: bool,
    /// `mb_adaptive_frame_field_flag`
    pub mb_adaptive_frame_field_flag: bool,
    /// The cropping rectangle offsets when `frame_cropping_flag` is set.
    pub frame_crop_info: Option<FrameCropInfo>,
    /// The VUI parameters when `vui_parameters_present_flag` is set.
    pub vui_parameters: Option<VuiParameters>,
}

/// The Sequence Parameter Set extension for the high profiles.
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
#[derive(Debug, Clone, PartialEq)]
pub struct SpsExtended {
    /// The `chroma_format_idc` as a u64.
    pub chroma_format_idc: u64,
    /// `separate_colour_plane_flag`, only read for 4:4:4.
    pub separate_colour_plane_flag: bool,
    /// The `bit_depth_luma_minus8` as a u64.
    pub bit_depth_luma_minus8: u64,
    /// The `bit_depth_chroma_minus8` as a u64.
    pub bit_depth_chroma_minus8: u64,
}

/// `frame_crop_{left,right,top,bottom}_offset`, in crop units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCropInfo {
    /// `frame_crop_left_offset`
    pub frame_crop_left_offset: u64,
    /// `frame_crop_right_offset`
    pub frame_crop_right_offset: u64,
    /// `frame_crop_top_offset`
    pub frame_crop_top_offset: u64,
    /// `frame_crop_bottom_offset`
    pub frame_crop_bottom_offset: u64,
}

/// The VUI parameters, ISO/IEC-14496-10-2022 - E.1.1.
///
/// Parsing stops after `pic_struct_present_flag`, the bitstream restriction
/// fields are not read.
#[derive(Debug, Clone, PartialEq)]
pub struct VuiParameters {
    /// Present when `aspect_ratio_info_present_flag` is set.
    pub aspect_ratio_info: Option<AspectRatioInfo>,
    /// `overscan_appropriate_flag` when `overscan_info_present_flag` is set.
    pub overscan_appropriate_flag: Option<bool>,
    /// `video_format`
    pub video_format: VideoFormat,
    /// Present when `video_signal_type_present_flag` is set.
    pub color_config: Option<ColorConfig>,
    /// `chroma_sample_loc_type_top_field` and `chroma_sample_loc_type_bottom_field`.
    pub chroma_sample_loc_type: Option<(u64, u64)>,
    /// Present when `timing_info_present_flag` is set.
    pub timing_info: Option<TimingInfo>,
    /// `hrd_parameters()` when `nal_hrd_parameters_present_flag` is set.
    pub nal_hrd_parameters: Option<HrdParameters>,
    /// `hrd_parameters()` when `vcl_hrd_parameters_present_flag` is set.
    pub vcl_hrd_parameters: Option<HrdParameters>,
    /// `low_delay_hrd_flag`
    pub low_delay_hrd_flag: bool,
    /// `pic_struct_present_flag`, pic timing SEI messages carry `pic_struct`.
    pub pic_struct_present_flag: bool,
}

/// The sample aspect ratio signalled in the VUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatioInfo {
    /// `aspect_ratio_idc`
    pub aspect_ratio_idc: AspectRatioIdc,
    /// `sar_width` for [`AspectRatioIdc::ExtendedSar`], otherwise from Table E-1.
    pub sar_width: u16,
    /// `sar_height` for [`AspectRatioIdc::ExtendedSar`], otherwise from Table E-1.
    pub sar_height: u16,
}

/// The color config for SPS.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorConfig {
    /// The `video_full_range_flag` as a bool.
    pub full_range: bool,
    /// The `colour_primaries` bits as a u8.
    pub color_primaries: u8,
    /// The `transfer_characteristics` bits as a u8.
    pub transfer_characteristics: u8,
    /// The `matrix_coefficients` bits as a u8.
    pub matrix_coefficients: u8,
}

/// VUI timing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    /// `num_units_in_tick`, never 0.
    pub num_units_in_tick: u32,
    /// `time_scale`
    pub time_scale: u32,
    /// `fixed_frame_rate_flag`
    pub fixed_frame_rate_flag: bool,
}

impl TimingInfo {
    /// The frame rate, one frame being two ticks.
    pub fn frame_rate(&self) -> f64 {
        self.time_scale as f64 / (2.0 * self.num_units_in_tick as f64)
    }
}

/// The parts of `hrd_parameters()` that other syntax depends on, E.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrdParameters {
    /// `cpb_cnt_minus1`
    pub cpb_cnt_minus1: u8,
    /// `initial_cpb_removal_delay_length_minus1`
    pub initial_cpb_removal_delay_length_minus1: u8,
    /// `cpb_removal_delay_length_minus1`
    pub cpb_removal_delay_length_minus1: u8,
    /// `dpb_output_delay_length_minus1`
    pub dpb_output_delay_length_minus1: u8,
    /// `time_offset_length`
    pub time_offset_length: u8,
}

impl HrdParameters {
    fn parse<R: io::Read>(reader: &mut BitReader<R>) -> io::Result<Self> {
        let cpb_cnt_minus1 = reader.read_exp_golomb()?;
        if cpb_cnt_minus1 > 31 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "cpb_cnt_minus1 must be at most 31"));
        }

        reader.read_bits(4)?; // bit_rate_scale
        reader.read_bits(4)?; // cpb_size_scale
        for _ in 0..=cpb_cnt_minus1 {
            reader.read_exp_golomb()?; // bit_rate_value_minus1
            reader.read_exp_golomb()?; // cpb_size_value_minus1
            reader.read_bit()?; // cbr_flag
        }

        Ok(Self {
            cpb_cnt_minus1: cpb_cnt_minus1 as u8,
            initial_cpb_removal_delay_length_minus1: reader.read_bits(5)? as u8,
            cpb_removal_delay_length_minus1: reader.read_bits(5)? as u8,
            dpb_output_delay_length_minus1: reader.read_bits(5)? as u8,
            time_offset_length: reader.read_bits(5)? as u8,
        })
    }
}

impl Sps {
    /// Parses an SPS NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses an SPS NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let header = NALUnitHeader::parse(&mut bit_reader)?;
        if header.nal_unit_type != NALUnitType::SPS {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit type is not SPS"));
        }

        let profile_idc = bit_reader.read_u8()?;
        let constraint_set_flags = bit_reader.read_u8()?;
        let level_idc = bit_reader.read_u8()?;

        let seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        if seq_parameter_set_id > 31 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "seq_parameter_set_id must be at most 31"));
        }

        let ext = match profile_idc {
            100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135 => {
                Some(SpsExtended::parse(&mut bit_reader)?)
            }
            _ => None,
        };

        let log2_max_frame_num_minus4 = bit_reader.read_exp_golomb()?;
        if log2_max_frame_num_minus4 > 12 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "log2_max_frame_num_minus4 must be at most 12"));
        }

        let pic_order_cnt_type = bit_reader.read_exp_golomb()?;
        match pic_order_cnt_type {
            0 => {
                bit_reader.read_exp_golomb()?; // log2_max_pic_order_cnt_lsb_minus4
            }
            1 => {
                bit_reader.read_bit()?; // delta_pic_order_always_zero_flag
                bit_reader.read_signed_exp_golomb()?; // offset_for_non_ref_pic
                bit_reader.read_signed_exp_golomb()?; // offset_for_top_to_bottom_field
                let num_ref_frames_in_pic_order_cnt_cycle = bit_reader.read_exp_golomb()?;
                if num_ref_frames_in_pic_order_cnt_cycle > 255 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "num_ref_frames_in_pic_order_cnt_cycle must be at most 255",
                    ));
                }
                for _ in 0..num_ref_frames_in_pic_order_cnt_cycle {
                    bit_reader.read_signed_exp_golomb()?; // offset_for_ref_frame
                }
            }
            2 => {}
            _ => return Err(io::Error::new(io::ErrorKind::InvalidData, "pic_order_cnt_type must be at most 2")),
        }

        let max_num_ref_frames = bit_reader.read_exp_golomb()?;
        bit_reader.read_bit()?; // gaps_in_frame_num_value_allowed_flag
        let pic_width_in_mbs_minus1 = bit_reader.read_exp_golomb()?;
        let pic_height_in_map_units_minus1 = bit_reader.read_exp_golomb()?;

        let frame_mbs_only_flag = bit_reader.read_bit()?;
        let mb_adaptive_frame_field_flag = !frame_mbs_only_flag && bit_reader.read_bit()?;

        bit_reader.read_bit()?; // direct_8x8_inference_flag

        let frame_crop_info = if bit_reader.read_bit()? {
            Some(FrameCropInfo {
                frame_crop_left_offset: bit_reader.read_exp_golomb()?,
                frame_crop_right_offset: bit_reader.read_exp_golomb()?,
                frame_crop_top_offset: bit_reader.read_exp_golomb()?,
                frame_crop_bottom_offset: bit_reader.read_exp_golomb()?,
            })
        } else {
            None
        };

        let vui_parameters = if bit_reader.read_bit()? {
            Some(VuiParameters::parse(&mut bit_reader)?)
        } else {
            None
        };

        Ok(Sps {
            profile_idc,
            constraint_set_flags,
            level_idc,
            seq_parameter_set_id: seq_parameter_set_id as u8,
            ext,
            log2_max_frame_num_minus4: log2_max_frame_num_minus4 as u8,
            pic_order_cnt_type: pic_order_cnt_type as u8,
            max_num_ref_frames: max_num_ref_frames.min(u8::MAX as u64) as u8,
            pic_width_in_mbs_minus1,
            pic_height_in_map_units_minus1,
            frame_mbs_only_flag,
            mb_adaptive_frame_field_flag,
            frame_crop_info,
            vui_parameters,
        })
    }

    /// `chroma_format_idc`, 1 (4:2:0) when the SPS does not carry it.
    pub fn chroma_format_idc(&self) -> u64 {
        self.ext.as_ref().map(|ext| ext.chroma_format_idc).unwrap_or(1)
    }

    /// `BitDepthY`
    pub fn bit_depth_luma(&self) -> u64 {
        self.ext.as_ref().map(|ext| ext.bit_depth_luma_minus8).unwrap_or(0) + 8
    }

    /// `BitDepthC`
    pub fn bit_depth_chroma(&self) -> u64 {
        self.ext.as_ref().map(|ext| ext.bit_depth_chroma_minus8).unwrap_or(0) + 8
    }

    /// `ChromaArrayType`
    fn chroma_array_type(&self) -> u64 {
        match &self.ext {
            Some(ext) if ext.separate_colour_plane_flag => 0,
            _ => self.chroma_format_idc(),
        }
    }

    /// `(CropUnitX, CropUnitY)`, 7.4.2.1.1
    fn crop_units(&self) -> (u64, u64) {
        let field_factor = 2 - self.frame_mbs_only_flag as u64;
        let (sub_width_c, sub_height_c) = match self.chroma_array_type() {
            0 => return (1, field_factor),
            1 => (2, 2),
            2 => (2, 1),
            _ => (1, 1),
        };

        (sub_width_c, sub_height_c * field_factor)
    }

    /// The width of the decoded frame after cropping.
    pub fn width(&self) -> u64 {
        let width = (self.pic_width_in_mbs_minus1 + 1) * 16;
        match &self.frame_crop_info {
            Some(crop) => {
                let (crop_unit_x, _) = self.crop_units();
                width.saturating_sub(crop_unit_x * (crop.frame_crop_left_offset + crop.frame_crop_right_offset))
            }
            None => width,
        }
    }

    /// The height of the decoded frame after cropping.
    pub fn height(&self) -> u64 {
        let height = (2 - self.frame_mbs_only_flag as u64) * (self.pic_height_in_map_units_minus1 + 1) * 16;
        match &self.frame_crop_info {
            Some(crop) => {
                let (_, crop_unit_y) = self.crop_units();
                height.saturating_sub(crop_unit_y * (crop.frame_crop_top_offset + crop.frame_crop_bottom_offset))
            }
            None => height,
        }
    }

    /// The VUI timing information, if signalled.
    pub fn timing_info(&self) -> Option<&TimingInfo> {
        self.vui_parameters.as_ref()?.timing_info.as_ref()
    }

    /// The frame rate derived from the VUI timing information.
    pub fn frame_rate(&self) -> Option<f64> {
        self.timing_info().map(TimingInfo::frame_rate)
    }

    /// The colour description, if signalled.
    pub fn color_config(&self) -> Option<&ColorConfig> {
        self.vui_parameters.as_ref()?.color_config.as_ref()
    }

    /// The HRD parameters that size the pic timing SEI delays, `CpbDpbDelaysPresentFlag`.
    pub fn cpb_dpb_delays(&self) -> Option<&HrdParameters> {
        let vui = self.vui_parameters.as_ref()?;
        vui.nal_hrd_parameters.as_ref().or(vui.vcl_hrd_parameters.as_ref())
    }

    /// `pic_struct_present_flag`
    pub fn pic_struct_present(&self) -> bool {
        self.vui_parameters.as_ref().is_some_and(|vui| vui.pic_struct_present_flag)
    }
}

impl SpsExtended {
    /// Parses an extended SPS from a bitstream.
    /// Returns an `SpsExtended` struct.
    pub fn parse<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<Self> {
        let chroma_format_idc = reader.read_exp_golomb()?;
        if chroma_format_idc > 3 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "chroma_format_idc must be at most 3"));
        }

        let separate_colour_plane_flag = chroma_format_idc == 3 && reader.read_bit()?;

        let bit_depth_luma_minus8 = reader.read_exp_golomb()?;
        let bit_depth_chroma_minus8 = reader.read_exp_golomb()?;
        if bit_depth_luma_minus8 > 6 || bit_depth_chroma_minus8 > 6 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bit depth must be at most 14"));
        }

        reader.read_bit()?; // qpprime_y_zero_transform_bypass_flag

        if reader.read_bit()? {
            // seq_scaling_matrix_present_flag
            // The lists are only skipped.
            let count = if chroma_format_idc != 3 { 8 } else { 12 };
            for i in 0..count {
                if reader.read_bit()? {
                    let size = if i < 6 { 16 } else { 64 };
                    let mut next_scale = 8;
                    for _ in 0..size {
                        let delta_scale = reader.read_signed_exp_golomb()?;
                        next_scale = (next_scale + delta_scale + 256) % 256;
                        if next_scale == 0 {
                            break;
                        }
                    }
                }
            }
        }

        Ok(SpsExtended {
            chroma_format_idc,
            separate_colour_plane_flag,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
        })
    }
}

impl VuiParameters {
    fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        // aspect_ratio_info_present_flag
        let aspect_ratio_info = if bit_reader.read_bit()? {
            let aspect_ratio_idc = AspectRatioIdc::from(bit_reader.read_u8()?);
            let (sar_width, sar_height) = if aspect_ratio_idc == AspectRatioIdc::ExtendedSar {
                (bit_reader.read_u16::<BigEndian>()?, bit_reader.read_u16::<BigEndian>()?)
            } else {
                aspect_ratio_idc.sample_aspect_ratio().unwrap_or((0, 0))
            };

            Some(AspectRatioInfo {
                aspect_ratio_idc,
                sar_width,
                sar_height,
            })
        } else {
            None
        };

        // overscan_info_present_flag
        let overscan_appropriate_flag = if bit_reader.read_bit()? {
            Some(bit_reader.read_bit()?)
        } else {
            None
        };

        let mut video_format = VideoFormat::Unspecified;
        let mut color_config = None;

        // video_signal_type_present_flag
        if bit_reader.read_bit()? {
            video_format = VideoFormat::from(bit_reader.read_bits(3)? as u8);
            let full_range = bit_reader.read_bit()?;

            let (color_primaries, transfer_characteristics, matrix_coefficients) = if bit_reader.read_bit()? {
                // colour_description_present_flag
                (bit_reader.read_u8()?, bit_reader.read_u8()?, bit_reader.read_u8()?)
            } else {
                // unspecified
                (2, 2, 2)
            };

            color_config = Some(ColorConfig {
                full_range,
                color_primaries,
                transfer_characteristics,
                matrix_coefficients,
            });
        }

        // chroma_loc_info_present_flag
        let chroma_sample_loc_type = if bit_reader.read_bit()? {
            Some((bit_reader.read_exp_golomb()?, bit_reader.read_exp_golomb()?))
        } else {
            None
        };

        // timing_info_present_flag
        let timing_info = if bit_reader.read_bit()? {
            let num_units_in_tick = bit_reader.read_u32::<BigEndian>()?;
            let time_scale = bit_reader.read_u32::<BigEndian>()?;

            if num_units_in_tick == 0 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "num_units_in_tick cannot be zero"));
            }

            Some(TimingInfo {
                num_units_in_tick,
                time_scale,
                fixed_frame_rate_flag: bit_reader.read_bit()?,
            })
        } else {
            None
        };

        let nal_hrd_parameters = if bit_reader.read_bit()? {
            Some(HrdParameters::parse(bit_reader)?)
        } else {
            None
        };

        let vcl_hrd_parameters = if bit_reader.read_bit()? {
            Some(HrdParameters::parse(bit_reader)?)
        } else {
            None
        };

        let low_delay_hrd_flag = if nal_hrd_parameters.is_some() || vcl_hrd_parameters.is_some() {
            bit_reader.read_bit()?
        } else {
            false
        };

        let pic_struct_present_flag = bit_reader.read_bit()?;

        Ok(Self {
            aspect_ratio_info,
            overscan_appropriate_flag,
            video_format,
            color_config,
            chroma_sample_loc_type,
            timing_info,
            nal_hrd_parameters,
            vcl_hrd_parameters,
            low_delay_hrd_flag,
            pic_struct_present_flag,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use crate::sps::{ColorConfig, Sps, SpsExtended};

    #[test]
    fn test_parse_sps() {
        let sps = [
            103, 100, 0, 51, 172, 202, 80, 15, 0, 16, 251, 1, 16, 0, 0, 3, 0, 16, 0, 0, 7, 136, 241, 131, 25, 96,
        ];

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(sps)).unwrap();

        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.level_idc, 51);
        assert_eq!(sps.seq_parameter_set_id, 0);
        assert_eq!(
            sps.ext,
            Some(SpsExtended {
                chroma_format_idc: 1,
                separate_colour_plane_flag: false,
                bit_depth_luma_minus8: 0,
                bit_depth_chroma_minus8: 0,
            })
        );
        assert_eq!(sps.width(), 3840);
        assert_eq!(sps.height(), 2160);
        assert_eq!(sps.frame_rate(), Some(60.0));
        assert_eq!(sps.color_config(), None);
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
                overscan_appropriate_flag: None,
                video_format: VideoFormat::Unspecified,
                color_config: None,
                chroma_sample_loc_type: None,
                timing_info: Some(
                    TimingInfo {
                        num_units_in_tick: 1,
                        time_scale: 120,
                        fixed_frame_rate_flag: true,
                    },
                ),
                nal_hrd_parameters: None,
                vcl_hrd_parameters: None,
                low_delay_hrd_flag: false,
                pic_struct_present_flag: false,
            },
        )
        ");
    }

    #[test]
    fn test_parse_sps2() {
        let sps = [
            0x67, 0x42, 0xc0, 0x1f, 0x8c, 0x8d, 0x40, 0x50, 0x1e, 0x90, 0x0f, 0x08, 0x84, 0x6a,
        ];

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(sps)).unwrap();

        assert_eq!(sps.profile_idc, 66);
        assert_eq!(sps.constraint_set_flags, 0xc0);
        assert_eq!(sps.level_idc, 31);
        assert_eq!(sps.ext, None);
        assert_eq!(sps.chroma_format_idc(), 1);
        assert_eq!(sps.bit_depth_luma(), 8);
        assert_eq!(sps.width(), 640);
        assert_eq!(sps.height(), 480);
        assert_eq!(sps.frame_rate(), None);
        assert_eq!(sps.color_config(), None);
        assert!(!sps.pic_struct_present());
    }

    #[test]
    fn test_parse_sps3() {
        let sps = [
            103, 100, 0, 42, 172, 178, 0, 240, 4, 79, 203, 128, 181, 1, 1, 1, 64, 0, 0, 3, 0, 64, 0, 0, 30, 35, 198, 12, 146,
        ];

        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(sps)).unwrap();

        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.level_idc, 42);
        assert_eq!(sps.pic_order_cnt_type, 2);
        assert_eq!(sps.max_num_ref_frames, 3);
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);
        assert_eq!(sps.frame_rate(), Some(60.0));
        assert_eq!(
            sps.color_config(),
            Some(&ColorConfig {
                full_range: false,
                matrix_coefficients: 1,
                color_primaries: 1,
                transfer_characteristics: 1,
            })
        );
        assert_eq!(sps.frame_crop_info.map(|crop| crop.frame_crop_bottom_offset), Some(4));
    }

    #[test]
    fn test_parse_sps_wrong_nal_type() {
        // the PPS of the streams above
        let err = Sps::parse_with_emulation_prevention(io::Cursor::new([0x68, 0xce, 0x3c, 0x80])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
