//! Sequence header OBU, AV1 - 5.5.

use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use reframe_bytes_util::BitReader;

use super::{ObuHeader, ObuType, read_uvlc};

/// `seq_force_screen_content_tools` / `seq_force_integer_mv` value meaning the
/// frame header carries the flag.
pub const SELECT: u8 = 2;

/// Sequence Header OBU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeaderObu {
    /// The header of the OBU this sequence header was read from.
    pub header: ObuHeader,
    /// `seq_profile`, 0 to 2.
    pub seq_profile: u8,
    /// The sequence holds a single picture.
    pub still_picture: bool,
    /// Most header fields are omitted and inferred.
    pub reduced_still_picture_header: bool,
    /// Present when `timing_info_present_flag` is set.
    pub timing_info: Option<TimingInfo>,
    /// Present when `decoder_model_info_present_flag` is set.
    pub decoder_model_info: Option<DecoderModelInfo>,
    /// At least one entry, operating point 0 first.
    pub operating_points: Vec<OperatingPoint>,
    /// `frame_width_bits_minus_1 + 1`
    pub frame_width_bits: u8,
    /// `frame_height_bits_minus_1 + 1`
    pub frame_height_bits: u8,
    /// `max_frame_width_minus_1 + 1`
    pub max_frame_width: u64,
    /// `max_frame_height_minus_1 + 1`
    pub max_frame_height: u64,
    /// Present when `frame_id_numbers_present_flag` is set.
    pub frame_ids: Option<FrameIdLengths>,
    /// `use_128x128_superblock`
    pub use_128x128_superblock: bool,
    /// `enable_filter_intra`
    pub enable_filter_intra: bool,
    /// `enable_intra_edge_filter`
    pub enable_intra_edge_filter: bool,
    /// `enable_interintra_compound`
    pub enable_interintra_compound: bool,
    /// `enable_masked_compound`
    pub enable_masked_compound: bool,
    /// `enable_warped_motion`
    pub enable_warped_motion: bool,
    /// `enable_dual_filter`
    pub enable_dual_filter: bool,
    /// `enable_order_hint`
    pub enable_order_hint: bool,
    /// `enable_jnt_comp`
    pub enable_jnt_comp: bool,
    /// `enable_ref_frame_mvs`
    pub enable_ref_frame_mvs: bool,
    /// 0, 1 or [`SELECT`].
    pub seq_force_screen_content_tools: u8,
    /// 0, 1 or [`SELECT`].
    pub seq_force_integer_mv: u8,
    /// `OrderHintBits`, 0 when order hints are disabled.
    pub order_hint_bits: u8,
    /// `enable_superres`
    pub enable_superres: bool,
    /// `enable_cdef`
    pub enable_cdef: bool,
    /// `enable_restoration`
    pub enable_restoration: bool,
    /// Colour configuration.
    pub color_config: ColorConfig,
    /// `film_grain_params_present`
    pub film_grain_params_present: bool,
}

/// Frame id lengths of a sequence with `frame_id_numbers_present_flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIdLengths {
    /// `delta_frame_id_length_minus_2 + 2`
    pub delta_frame_id_length: u8,
    /// `additional_frame_id_length_minus_1 + 1`
    pub additional_frame_id_length: u8,
}

impl FrameIdLengths {
    /// `idLen`, the length of `current_frame_id`.
    pub const fn id_len(&self) -> u8 {
        self.additional_frame_id_length + self.delta_frame_id_length
    }
}

/// `timing_info()`, AV1 - 5.5.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    /// `num_units_in_display_tick`
    pub num_units_in_display_tick: u32,
    /// `time_scale`
    pub time_scale: u32,
    /// `num_ticks_per_picture_minus_1 + 1` when `equal_picture_interval` is set.
    pub num_ticks_per_picture: Option<u64>,
}

/// `decoder_model_info()`, AV1 - 5.5.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderModelInfo {
    /// `buffer_delay_length_minus_1`
    pub buffer_delay_length_minus_1: u8,
    /// `num_units_in_decoding_tick`
    pub num_units_in_decoding_tick: u32,
    /// `buffer_removal_time_length_minus_1`
    pub buffer_removal_time_length_minus_1: u8,
    /// `frame_presentation_time_length_minus_1`
    pub frame_presentation_time_length_minus_1: u8,
}

/// One operating point of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingPoint {
    /// `operating_point_idc`: bits 0..8 are the temporal layers, bits 8..12 the spatial layers.
    pub idc: u16,
    /// `seq_level_idx`
    pub seq_level_idx: u8,
    /// `seq_tier`
    pub seq_tier: bool,
    /// `decoder_model_present_for_this_op`
    pub decoder_model_present: bool,
    /// Present when `initial_display_delay_present_for_this_op` is set.
    pub initial_display_delay_minus_1: Option<u8>,
}

impl OperatingPoint {
    /// Returns true if the operating point contains the given layers.
    pub const fn contains(&self, temporal_id: u8, spatial_id: u8) -> bool {
        let in_temporal = (self.idc >> temporal_id) & 1 == 1;
        let in_spatial = (self.idc >> (spatial_id + 8)) & 1 == 1;
        in_temporal && in_spatial
    }
}

/// `color_config()`, AV1 - 5.5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    /// `BitDepth`: 8, 10 or 12.
    pub bit_depth: u8,
    /// `mono_chrome`
    pub mono_chrome: bool,
    /// `color_primaries`
    pub color_primaries: u8,
    /// `transfer_characteristics`
    pub transfer_characteristics: u8,
    /// `matrix_coefficients`
    pub matrix_coefficients: u8,
    /// `color_range`
    pub full_color_range: bool,
    /// `subsampling_x`
    pub subsampling_x: bool,
    /// `subsampling_y`
    pub subsampling_y: bool,
    /// `chroma_sample_position`
    pub chroma_sample_position: u8,
    /// `separate_uv_delta_q`
    pub separate_uv_delta_q: bool,
}

const CP_BT_709: u8 = 1;
const TC_SRGB: u8 = 13;
const MC_IDENTITY: u8 = 0;
const UNSPECIFIED: u8 = 2;

impl ColorConfig {
    fn parse<R: io::Read>(seq_profile: u8, bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let high_bitdepth = bit_reader.read_bit()?;
        let bit_depth = match (seq_profile, high_bitdepth) {
            (2, true) if bit_reader.read_bit()? => 12,
            (_, true) => 10,
            (_, false) => 8,
        };

        let mono_chrome = if seq_profile == 1 { false } else { bit_reader.read_bit()? };

        let (color_primaries, transfer_characteristics, matrix_coefficients) = if bit_reader.read_bit()? {
            (
                bit_reader.read_u8()?,
                bit_reader.read_u8()?,
                bit_reader.read_u8()?,
            )
        } else {
            (UNSPECIFIED, UNSPECIFIED, UNSPECIFIED)
        };

        let mut config = Self {
            bit_depth,
            mono_chrome,
            color_primaries,
            transfer_characteristics,
            matrix_coefficients,
            full_color_range: false,
            subsampling_x: true,
            subsampling_y: true,
            chroma_sample_position: 0,
            separate_uv_delta_q: false,
        };

        if mono_chrome {
            config.full_color_range = bit_reader.read_bit()?;
            return Ok(config);
        }

        if color_primaries == CP_BT_709 && transfer_characteristics == TC_SRGB && matrix_coefficients == MC_IDENTITY {
            config.full_color_range = true;
            config.subsampling_x = false;
            config.subsampling_y = false;
        } else {
            config.full_color_range = bit_reader.read_bit()?;
            (config.subsampling_x, config.subsampling_y) = match seq_profile {
                0 => (true, true),
                1 => (false, false),
                _ if bit_depth == 12 => {
                    let subsampling_x = bit_reader.read_bit()?;
                    let subsampling_y = if subsampling_x { bit_reader.read_bit()? } else { false };
                    (subsampling_x, subsampling_y)
                }
                _ => (true, false),
            };

            if config.subsampling_x && config.subsampling_y {
                config.chroma_sample_position = bit_reader.read_bits(2)? as u8;
            }
        }

        config.separate_uv_delta_q = bit_reader.read_bit()?;

        Ok(config)
    }
}

impl SequenceHeaderObu {
    /// Parses the payload of a sequence header OBU whose header was already read.
    pub fn parse(header: ObuHeader, reader: &mut impl io::Read) -> io::Result<Self> {
        if header.obu_type != ObuType::SequenceHeader {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "obu is not a sequence header"));
        }

        let mut bit_reader = BitReader::new(reader);

        let seq_profile = bit_reader.read_bits(3)? as u8;
        if seq_profile > 2 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "seq_profile is greater than 2"));
        }

        let still_picture = bit_reader.read_bit()?;
        let reduced_still_picture_header = bit_reader.read_bit()?;
        if reduced_still_picture_header && !still_picture {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "reduced_still_picture_header requires still_picture",
            ));
        }

        let mut timing_info = None;
        let mut decoder_model_info = None;
        let mut operating_points = Vec::new();

        if reduced_still_picture_header {
            operating_points.push(OperatingPoint {
                idc: 0,
                seq_level_idx: bit_reader.read_bits(5)? as u8,
                seq_tier: false,
                decoder_model_present: false,
                initial_display_delay_minus_1: None,
            });
        } else {
            if bit_reader.read_bit()? {
                let num_units_in_display_tick = bit_reader.read_u32::<BigEndian>()?;
                let time_scale = bit_reader.read_u32::<BigEndian>()?;
                let num_ticks_per_picture = if bit_reader.read_bit()? {
                    let minus_1 = read_uvlc(&mut bit_reader)?;
                    if minus_1 == u32::MAX {
                        return Err(io::Error::new(io::ErrorKind::InvalidData, "num_ticks_per_picture_minus_1 is too large"));
                    }
                    Some(minus_1 as u64 + 1)
                } else {
                    None
                };

                timing_info = Some(TimingInfo {
                    num_units_in_display_tick,
                    time_scale,
                    num_ticks_per_picture,
                });

                if bit_reader.read_bit()? {
                    decoder_model_info = Some(DecoderModelInfo {
                        buffer_delay_length_minus_1: bit_reader.read_bits(5)? as u8,
                        num_units_in_decoding_tick: bit_reader.read_u32::<BigEndian>()?,
                        buffer_removal_time_length_minus_1: bit_reader.read_bits(5)? as u8,
                        frame_presentation_time_length_minus_1: bit_reader.read_bits(5)? as u8,
                    });
                }
            }

            let initial_display_delay_present = bit_reader.read_bit()?;
            let operating_points_cnt = bit_reader.read_bits(5)? as usize + 1;
            for _ in 0..operating_points_cnt {
                let idc = bit_reader.read_bits(12)? as u16;
                let seq_level_idx = bit_reader.read_bits(5)? as u8;
                let seq_tier = seq_level_idx > 7 && bit_reader.read_bit()?;

                let decoder_model_present = match decoder_model_info {
                    Some(info) if bit_reader.read_bit()? => {
                        let n = info.buffer_delay_length_minus_1 + 1;
                        // decoder_buffer_delay, encoder_buffer_delay, low_delay_mode_flag
                        bit_reader.skip_bits(2 * n as u64 + 1)?;
                        true
                    }
                    _ => false,
                };

                let initial_display_delay_minus_1 = if initial_display_delay_present && bit_reader.read_bit()? {
                    Some(bit_reader.read_bits(4)? as u8)
                } else {
                    None
                };

                operating_points.push(OperatingPoint {
                    idc,
                    seq_level_idx,
                    seq_tier,
                    decoder_model_present,
                    initial_display_delay_minus_1,
                });
            }
        }

        let frame_width_bits = bit_reader.read_bits(4)? as u8 + 1;
        let frame_height_bits = bit_reader.read_bits(4)? as u8 + 1;
        let max_frame_width = bit_reader.read_bits(frame_width_bits)? + 1;
        let max_frame_height = bit_reader.read_bits(frame_height_bits)? + 1;

        let frame_ids = if !reduced_still_picture_header && bit_reader.read_bit()? {
            Some(FrameIdLengths {
                delta_frame_id_length: bit_reader.read_bits(4)? as u8 + 2,
                additional_frame_id_length: bit_reader.read_bits(3)? as u8 + 1,
            })
        } else {
            None
        };

        let use_128x128_superblock = bit_reader.read_bit()?;
        let enable_filter_intra = bit_reader.read_bit()?;
        let enable_intra_edge_filter = bit_reader.read_bit()?;

        let mut enable_interintra_compound = false;
        let mut enable_masked_compound = false;
        let mut enable_warped_motion = false;
        let mut enable_dual_filter = false;
        let mut enable_order_hint = false;
        let mut enable_jnt_comp = false;
        let mut enable_ref_frame_mvs = false;
        let mut seq_force_screen_content_tools = SELECT;
        let mut seq_force_integer_mv = SELECT;
        let mut order_hint_bits = 0;

        if !reduced_still_picture_header {
            enable_interintra_compound = bit_reader.read_bit()?;
            enable_masked_compound = bit_reader.read_bit()?;
            enable_warped_motion = bit_reader.read_bit()?;
            enable_dual_filter = bit_reader.read_bit()?;
            enable_order_hint = bit_reader.read_bit()?;
            if enable_order_hint {
                enable_jnt_comp = bit_reader.read_bit()?;
                enable_ref_frame_mvs = bit_reader.read_bit()?;
            }

            // seq_choose_screen_content_tools
            if !bit_reader.read_bit()? {
                seq_force_screen_content_tools = bit_reader.read_bit()? as u8;
            }

            if seq_force_screen_content_tools > 0 {
                // seq_choose_integer_mv
                if !bit_reader.read_bit()? {
                    seq_force_integer_mv = bit_reader.read_bit()? as u8;
                }
            }

            if enable_order_hint {
                order_hint_bits = bit_reader.read_bits(3)? as u8 + 1;
            }
        }

        let enable_superres = bit_reader.read_bit()?;
        let enable_cdef = bit_reader.read_bit()?;
        let enable_restoration = bit_reader.read_bit()?;
        let color_config = ColorConfig::parse(seq_profile, &mut bit_reader)?;
        let film_grain_params_present = bit_reader.read_bit()?;

        Ok(Self {
            header,
            seq_profile,
            still_picture,
            reduced_still_picture_header,
            timing_info,
            decoder_model_info,
            operating_points,
            frame_width_bits,
            frame_height_bits,
            max_frame_width,
            max_frame_height,
            frame_ids,
            use_128x128_superblock,
            enable_filter_intra,
            enable_intra_edge_filter,
            enable_interintra_compound,
            enable_masked_compound,
            enable_warped_motion,
            enable_dual_filter,
            enable_order_hint,
            enable_jnt_comp,
            enable_ref_frame_mvs,
            seq_force_screen_content_tools,
            seq_force_integer_mv,
            order_hint_bits,
            enable_superres,
            enable_cdef,
            enable_restoration,
            color_config,
            film_grain_params_present,
        })
    }

    /// `OperatingPointIdc` of the selected operating point 0.
    pub fn operating_point_idc(&self) -> u16 {
        self.operating_points.first().map(|op| op.idc).unwrap_or_default()
    }

    /// The frame rate signalled by `timing_info` with `equal_picture_interval`, as
    /// `(numerator, denominator)`.
    pub fn frame_rate(&self) -> Option<(u64, u64)> {
        let timing = self.timing_info?;
        let ticks = timing.num_ticks_per_picture?;
        if timing.time_scale == 0 || timing.num_units_in_display_tick == 0 {
            return None;
        }

        Some((timing.time_scale as u64, timing.num_units_in_display_tick as u64 * ticks))
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use reframe_bytes_util::BitWriter;

    use super::*;

    /// Writes a sequence header OBU payload for a 4:2:0 8 bit stream with
    /// order hints (7 bits) and optional timing info.
    pub(crate) fn sequence_header_payload(width: u64, height: u64, timing: Option<(u32, u32, u32)>) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0, 3).unwrap(); // seq_profile
        writer.write_bit(false).unwrap(); // still_picture
        writer.write_bit(false).unwrap(); // reduced_still_picture_header

        match timing {
            Some((num_units, time_scale, ticks_minus_1)) => {
                writer.write_bit(true).unwrap();
                writer.write_bits(num_units as u64, 32).unwrap();
                writer.write_bits(time_scale as u64, 32).unwrap();
                writer.write_bit(true).unwrap(); // equal_picture_interval
                let value = ticks_minus_1 as u64 + 1;
                let bits = 64 - value.leading_zeros() as u8;
                writer.write_bits(0, bits - 1).unwrap();
                writer.write_bits(value, bits).unwrap();
                writer.write_bit(false).unwrap(); // decoder_model_info_present_flag
            }
            None => writer.write_bit(false).unwrap(),
        }

        writer.write_bit(false).unwrap(); // initial_display_delay_present_flag
        writer.write_bits(0, 5).unwrap(); // operating_points_cnt_minus_1
        writer.write_bits(0, 12).unwrap(); // operating_point_idc
        writer.write_bits(8, 5).unwrap(); // seq_level_idx
        writer.write_bit(false).unwrap(); // seq_tier

        writer.write_bits(15, 4).unwrap(); // frame_width_bits_minus_1
        writer.write_bits(15, 4).unwrap(); // frame_height_bits_minus_1
        writer.write_bits(width - 1, 16).unwrap();
        writer.write_bits(height - 1, 16).unwrap();
        writer.write_bit(false).unwrap(); // frame_id_numbers_present_flag
        writer.write_bit(false).unwrap(); // use_128x128_superblock
        writer.write_bit(true).unwrap(); // enable_filter_intra
        writer.write_bit(true).unwrap(); // enable_intra_edge_filter
        writer.write_bits(0b1111, 4).unwrap(); // interintra, masked, warped, dual filter
        writer.write_bit(true).unwrap(); // enable_order_hint
        writer.write_bit(true).unwrap(); // enable_jnt_comp
        writer.write_bit(true).unwrap(); // enable_ref_frame_mvs
        writer.write_bit(true).unwrap(); // seq_choose_screen_content_tools
        writer.write_bit(true).unwrap(); // seq_choose_integer_mv
        writer.write_bits(6, 3).unwrap(); // order_hint_bits_minus_1
        writer.write_bit(false).unwrap(); // enable_superres
        writer.write_bit(true).unwrap(); // enable_cdef
        writer.write_bit(true).unwrap(); // enable_restoration

        writer.write_bit(false).unwrap(); // high_bitdepth
        writer.write_bit(false).unwrap(); // mono_chrome
        writer.write_bit(true).unwrap(); // color_description_present_flag
        writer.write_bits(1, 8).unwrap();
        writer.write_bits(1, 8).unwrap();
        writer.write_bits(1, 8).unwrap();
        writer.write_bit(false).unwrap(); // color_range
        writer.write_bits(0, 2).unwrap(); // chroma_sample_position
        writer.write_bit(false).unwrap(); // separate_uv_delta_q

        writer.write_bit(false).unwrap(); // film_grain_params_present
        writer.write_bit(true).unwrap(); // trailing one bit
        writer.finish().unwrap()
    }

    pub(crate) fn sequence_header(width: u64, height: u64) -> SequenceHeaderObu {
        let header = ObuHeader {
            obu_type: ObuType::SequenceHeader,
            size: None,
            extension_header: None,
        };
        let payload = sequence_header_payload(width, height, None);
        SequenceHeaderObu::parse(header, &mut io::Cursor::new(payload)).unwrap()
    }

    #[test]
    fn test_parse_sequence_header() {
        let seq = sequence_header(1920, 1080);

        assert_eq!(seq.max_frame_width, 1920);
        assert_eq!(seq.max_frame_height, 1080);
        assert_eq!(seq.order_hint_bits, 7);
        assert_eq!(seq.seq_force_screen_content_tools, SELECT);
        assert_eq!(seq.seq_force_integer_mv, SELECT);
        assert_eq!(seq.operating_point_idc(), 0);
        assert_eq!(seq.frame_rate(), None);
        insta::assert_debug_snapshot!(seq.color_config, @r"
        ColorConfig {
            bit_depth: 8,
            mono_chrome: false,
            color_primaries: 1,
            transfer_characteristics: 1,
            matrix_coefficients: 1,
            full_color_range: false,
            subsampling_x: true,
            subsampling_y: true,
            chroma_sample_position: 0,
            separate_uv_delta_q: false,
        }
        ");
        assert!(!seq.operating_points[0].seq_tier);
        assert_eq!(seq.operating_points[0].seq_level_idx, 8);
    }

    #[test]
    fn test_parse_timing_info() {
        let header = ObuHeader {
            obu_type: ObuType::SequenceHeader,
            size: None,
            extension_header: None,
        };
        let payload = sequence_header_payload(640, 480, Some((1001, 60000, 1)));
        let seq = SequenceHeaderObu::parse(header, &mut io::Cursor::new(payload)).unwrap();

        assert_eq!(seq.max_frame_width, 640);
        assert_eq!(seq.frame_rate(), Some((60000, 2002)));
    }

    #[test]
    fn test_wrong_obu_type() {
        let header = ObuHeader {
            obu_type: ObuType::Frame,
            size: None,
            extension_header: None,
        };
        let err = SequenceHeaderObu::parse(header, &mut io::Cursor::new([0u8; 16])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_operating_point_contains() {
        let op = OperatingPoint {
            idc: 0b0001_0000_0011,
            seq_level_idx: 0,
            seq_tier: false,
            decoder_model_present: false,
            initial_display_delay_minus_1: None,
        };

        assert!(op.contains(1, 0));
        assert!(!op.contains(2, 0));
        assert!(!op.contains(0, 1));
    }
}
