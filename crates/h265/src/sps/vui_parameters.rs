use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use reframe_bytes_util::BitReader;
use reframe_expgolomb::BitReaderExpGolombExt;
use reframe_h264::{AspectRatioIdc, AspectRatioInfo, ColorConfig, VideoFormat};

/// VUI parameters up to the timing information, ISO/IEC-23008-2-2020 - E.2.1.
///
/// HRD parameters and bitstream restrictions that follow are not read.
#[derive(Debug, Clone, PartialEq)]
pub struct VuiParameters {
    /// Present when `aspect_ratio_info_present_flag` is set.
    pub aspect_ratio_info: Option<AspectRatioInfo>,
    /// `video_format`
    pub video_format: VideoFormat,
    /// Present when `video_signal_type_present_flag` is set.
    pub color_config: Option<ColorConfig>,
    /// `field_seq_flag`, pictures are fields.
    pub field_seq_flag: bool,
    /// `frame_field_info_present_flag`, pic timing SEI messages carry `pic_struct`.
    pub frame_field_info_present_flag: bool,
    /// `(vui_num_units_in_tick, vui_time_scale)`
    pub timing_info: Option<(u32, u32)>,
}

impl VuiParameters {
    pub(crate) fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
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
        if bit_reader.read_bit()? {
            bit_reader.read_bit()?; // overscan_appropriate_flag
        }

        let mut video_format = VideoFormat::Unspecified;
        let mut color_config = None;
        // video_signal_type_present_flag
        if bit_reader.read_bit()? {
            video_format = VideoFormat::from(bit_reader.read_bits(3)? as u8);
            let full_range = bit_reader.read_bit()?;
            let (color_primaries, transfer_characteristics, matrix_coefficients) = if bit_reader.read_bit()? {
                (bit_reader.read_u8()?, bit_reader.read_u8()?, bit_reader.read_u8()?)
            } else {
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
        if bit_reader.read_bit()? {
            bit_reader.read_exp_golomb()?; // chroma_sample_loc_type_top_field
            bit_reader.read_exp_golomb()?; // chroma_sample_loc_type_bottom_field
        }

        bit_reader.read_bit()?; // neutral_chroma_indication_flag
        let field_seq_flag = bit_reader.read_bit()?;
        let frame_field_info_present_flag = bit_reader.read_bit()?;

        // default_display_window_flag
        if bit_reader.read_bit()? {
            for _ in 0..4 {
                bit_reader.read_exp_golomb()?;
            }
        }

        // vui_timing_info_present_flag
        let timing_info = if bit_reader.read_bit()? {
            let vui_num_units_in_tick = bit_reader.read_u32::<BigEndian>()?;
            let vui_time_scale = bit_reader.read_u32::<BigEndian>()?;
            if vui_num_units_in_tick == 0 || vui_time_scale == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "vui_num_units_in_tick and vui_time_scale must not be zero",
                ));
            }

            Some((vui_num_units_in_tick, vui_time_scale))
        } else {
            None
        };

        Ok(Self {
            aspect_ratio_info,
            video_format,
            color_config,
            field_seq_flag,
            frame_field_info_present_flag,
            timing_info,
        })
    }
}
