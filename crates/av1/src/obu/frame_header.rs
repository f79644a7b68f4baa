use std::io;

use nutype_enum::nutype_enum;
use reframe_bytes_util::BitReader;

use super::reference::{NUM_REF_FRAMES, REFS_PER_FRAME, ReferenceFrames};
use super::seq::{SELECT, SequenceHeaderObu};
use super::{read_ns, tile_log2};

nutype_enum! {
    /// `frame_type`, AV1 - 6.8.2.
    pub enum FrameType(u8) {
        /// `KEY_FRAME`
        Key = 0,
        /// `INTER_FRAME`
        Inter = 1,
        /// `INTRA_ONLY_FRAME`
        IntraOnly = 2,
        /// `SWITCH_FRAME`
        Switch = 3,
    }
}

/// `PRIMARY_REF_NONE`
pub const PRIMARY_REF_NONE: u8 = 7;

const ALL_FRAMES: u8 = 0xff;
const SUPERRES_NUM: u32 = 8;
const SUPERRES_DENOM_MIN: u32 = 9;
const MAX_TILE_WIDTH: u32 = 4096;
const MAX_TILE_AREA: u32 = 4096 * 2304;
const MAX_TILE_COLS: u32 = 64;
const MAX_TILE_ROWS: u32 = 64;

/// The tile layout of a frame, AV1 - 5.9.15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileInfo {
    /// `TileCols`
    pub tile_cols: u32,
    /// `TileRows`
    pub tile_rows: u32,
    /// `TileColsLog2`
    pub tile_cols_log2: u32,
    /// `TileRowsLog2`
    pub tile_rows_log2: u32,
    /// `context_update_tile_id`
    pub context_update_tile_id: u32,
    /// `TileSizeBytes`, 0 with a single tile.
    pub tile_size_bytes: u8,
}

impl TileInfo {
    /// `NumTiles`
    pub const fn num_tiles(&self) -> u32 {
        self.tile_cols * self.tile_rows
    }
}

/// Uncompressed frame header, AV1 - 5.9.2, read up to and including `tile_info()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// `show_existing_frame`
    pub show_existing_frame: bool,
    /// `frame_to_show_map_idx`, only meaningful with `show_existing_frame`.
    pub frame_to_show_map_idx: u8,
    /// `frame_type`, loaded from the shown slot for `show_existing_frame`.
    pub frame_type: FrameType,
    /// `show_frame`
    pub show_frame: bool,
    /// `showable_frame`
    pub showable_frame: bool,
    /// `error_resilient_mode`
    pub error_resilient_mode: bool,
    /// `disable_cdf_update`
    pub disable_cdf_update: bool,
    /// `allow_screen_content_tools`
    pub allow_screen_content_tools: bool,
    /// `force_integer_mv`
    pub force_integer_mv: bool,
    /// `current_frame_id`
    pub current_frame_id: u32,
    /// `frame_size_override_flag`
    pub frame_size_override_flag: bool,
    /// `order_hint`
    pub order_hint: u32,
    /// `primary_ref_frame`
    pub primary_ref_frame: u8,
    /// `refresh_frame_flags`
    pub refresh_frame_flags: u8,
    /// `ref_frame_idx`
    pub ref_frame_idx: [u8; REFS_PER_FRAME],
    /// `UpscaledWidth`
    pub upscaled_width: u32,
    /// `FrameWidth`
    pub frame_width: u32,
    /// `FrameHeight`
    pub frame_height: u32,
    /// `RenderWidth`
    pub render_width: u32,
    /// `RenderHeight`
    pub render_height: u32,
    /// `MiCols`
    pub mi_cols: u32,
    /// `MiRows`
    pub mi_rows: u32,
    /// `allow_intrabc`
    pub allow_intrabc: bool,
    /// `allow_high_precision_mv`
    pub allow_high_precision_mv: bool,
    /// `is_motion_mode_switchable`
    pub is_motion_mode_switchable: bool,
    /// `use_ref_frame_mvs`
    pub use_ref_frame_mvs: bool,
    /// `disable_frame_end_update_cdf`
    pub disable_frame_end_update_cdf: bool,
    /// Tile layout.
    pub tile_info: TileInfo,
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

impl FrameHeader {
    const fn empty() -> Self {
        Self {
            show_existing_frame: false,
            frame_to_show_map_idx: 0,
            frame_type: FrameType::Key,
            show_frame: true,
            showable_frame: false,
            error_resilient_mode: false,
            disable_cdf_update: false,
            allow_screen_content_tools: false,
            force_integer_mv: false,
            current_frame_id: 0,
            frame_size_override_flag: false,
            order_hint: 0,
            primary_ref_frame: PRIMARY_REF_NONE,
            refresh_frame_flags: 0,
            ref_frame_idx: [0; REFS_PER_FRAME],
            upscaled_width: 0,
            frame_width: 0,
            frame_height: 0,
            render_width: 0,
            render_height: 0,
            mi_cols: 0,
            mi_rows: 0,
            allow_intrabc: false,
            allow_high_precision_mv: false,
            is_motion_mode_switchable: false,
            use_ref_frame_mvs: false,
            disable_frame_end_update_cdf: true,
            tile_info: TileInfo {
                tile_cols: 0,
                tile_rows: 0,
                tile_cols_log2: 0,
                tile_rows_log2: 0,
                context_update_tile_id: 0,
                tile_size_bytes: 0,
            },
        }
    }

    /// `FrameIsIntra`
    pub fn is_intra(&self) -> bool {
        self.frame_type == FrameType::Key || self.frame_type == FrameType::IntraOnly
    }

    /// True if the frame will be displayed, either directly or as an existing frame.
    pub const fn is_shown(&self) -> bool {
        self.show_frame || self.show_existing_frame
    }

    /// Parses the uncompressed header of a frame header or frame OBU.
    ///
    /// `refs` is read for frame sizes and order hints, and slots are
    /// invalidated as the header dictates. The refresh itself is left to
    /// [`ReferenceFrames::update`].
    pub fn parse(
        reader: &mut impl io::Read,
        seq: &SequenceHeaderObu,
        refs: &mut ReferenceFrames,
        temporal_id: u8,
        spatial_id: u8,
    ) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);
        let mut fh = Self::empty();

        let temporal_point_info = seq.decoder_model_info.filter(|_| {
            seq.timing_info
                .is_some_and(|timing| timing.num_ticks_per_picture.is_none())
        });

        if seq.reduced_still_picture_header {
            fh.frame_type = FrameType::Key;
            fh.show_frame = true;
            fh.error_resilient_mode = true;
        } else {
            fh.show_existing_frame = bit_reader.read_bit()?;
            if fh.show_existing_frame {
                fh.frame_to_show_map_idx = bit_reader.read_bits(3)? as u8;
                let shown = *refs.get(fh.frame_to_show_map_idx as usize);
                if !shown.valid {
                    return Err(invalid("frame_to_show_map_idx points at an invalid reference"));
                }

                if let Some(info) = temporal_point_info {
                    bit_reader.skip_bits(info.frame_presentation_time_length_minus_1 as u64 + 1)?;
                }

                if let Some(ids) = seq.frame_ids {
                    // display_frame_id
                    bit_reader.skip_bits(ids.id_len() as u64)?;
                }

                fh.frame_type = shown.frame_type;
                fh.show_frame = true;
                fh.current_frame_id = shown.frame_id;
                fh.upscaled_width = shown.upscaled_width;
                fh.frame_width = shown.frame_width;
                fh.frame_height = shown.frame_height;
                fh.render_width = shown.render_width;
                fh.render_height = shown.render_height;
                fh.mi_cols = shown.mi_cols;
                fh.mi_rows = shown.mi_rows;
                fh.order_hint = shown.order_hint;
                fh.tile_info = shown.tile_info;
                fh.refresh_frame_flags = if fh.frame_type == FrameType::Key { ALL_FRAMES } else { 0 };

                return Ok(fh);
            }

            fh.frame_type = FrameType::from(bit_reader.read_bits(2)? as u8);
            fh.show_frame = bit_reader.read_bit()?;

            if fh.show_frame {
                if let Some(info) = temporal_point_info {
                    bit_reader.skip_bits(info.frame_presentation_time_length_minus_1 as u64 + 1)?;
                }
            }

            fh.showable_frame = if fh.show_frame {
                fh.frame_type != FrameType::Key
            } else {
                bit_reader.read_bit()?
            };

            fh.error_resilient_mode = if fh.frame_type == FrameType::Switch || (fh.frame_type == FrameType::Key && fh.show_frame) {
                true
            } else {
                bit_reader.read_bit()?
            };
        }

        if fh.frame_type == FrameType::Key && fh.show_frame {
            for i in 0..NUM_REF_FRAMES {
                let slot = refs.get_mut(i);
                slot.valid = false;
                slot.order_hint = 0;
            }
        }

        fh.disable_cdf_update = bit_reader.read_bit()?;

        fh.allow_screen_content_tools = if seq.seq_force_screen_content_tools == SELECT {
            bit_reader.read_bit()?
        } else {
            seq.seq_force_screen_content_tools == 1
        };

        fh.force_integer_mv = if !fh.allow_screen_content_tools {
            false
        } else if seq.seq_force_integer_mv == SELECT {
            bit_reader.read_bit()?
        } else {
            seq.seq_force_integer_mv == 1
        };

        if fh.is_intra() {
            fh.force_integer_mv = true;
        }

        if let Some(ids) = seq.frame_ids {
            fh.current_frame_id = bit_reader.read_bits(ids.id_len())? as u32;
            refs.mark(fh.current_frame_id, ids.id_len(), ids.delta_frame_id_length);
        }

        fh.frame_size_override_flag = if fh.frame_type == FrameType::Switch {
            true
        } else if seq.reduced_still_picture_header {
            false
        } else {
            bit_reader.read_bit()?
        };

        fh.order_hint = bit_reader.read_bits(seq.order_hint_bits)? as u32;

        fh.primary_ref_frame = if fh.is_intra() || fh.error_resilient_mode {
            PRIMARY_REF_NONE
        } else {
            bit_reader.read_bits(3)? as u8
        };

        if let Some(info) = seq.decoder_model_info {
            // buffer_removal_time_present_flag
            if bit_reader.read_bit()? {
                for op in seq.operating_points.iter().filter(|op| op.decoder_model_present) {
                    if op.idc == 0 || op.contains(temporal_id, spatial_id) {
                        bit_reader.skip_bits(info.buffer_removal_time_length_minus_1 as u64 + 1)?;
                    }
                }
            }
        }

        fh.refresh_frame_flags = if fh.frame_type == FrameType::Switch || (fh.frame_type == FrameType::Key && fh.show_frame) {
            ALL_FRAMES
        } else {
            bit_reader.read_bits(8)? as u8
        };

        if fh.frame_type == FrameType::IntraOnly && fh.refresh_frame_flags == ALL_FRAMES {
            return Err(invalid("intra only frames cannot refresh all reference frames"));
        }

        if (!fh.is_intra() || fh.refresh_frame_flags != ALL_FRAMES) && fh.error_resilient_mode && seq.enable_order_hint {
            for i in 0..NUM_REF_FRAMES {
                let ref_order_hint = bit_reader.read_bits(seq.order_hint_bits)? as u32;
                let slot = refs.get_mut(i);
                if slot.order_hint != ref_order_hint {
                    slot.valid = false;
                    slot.order_hint = ref_order_hint;
                }
            }
        }

        if fh.is_intra() {
            fh.parse_frame_size(&mut bit_reader, seq)?;
            fh.parse_render_size(&mut bit_reader)?;
            if fh.allow_screen_content_tools && fh.upscaled_width == fh.frame_width {
                fh.allow_intrabc = bit_reader.read_bit()?;
            }
        } else {
            let mut short_signaling = false;
            if seq.enable_order_hint {
                short_signaling = bit_reader.read_bit()?;
                if short_signaling {
                    let last_frame_idx = bit_reader.read_bits(3)? as u8;
                    let gold_frame_idx = bit_reader.read_bits(3)? as u8;
                    fh.ref_frame_idx = refs.set_frame_refs(seq, fh.order_hint, last_frame_idx, gold_frame_idx);
                }
            }

            for i in 0..REFS_PER_FRAME {
                if !short_signaling {
                    fh.ref_frame_idx[i] = bit_reader.read_bits(3)? as u8;
                }

                if let Some(ids) = seq.frame_ids {
                    let delta_frame_id = bit_reader.read_bits(ids.delta_frame_id_length)? as u32 + 1;
                    let modulo = 1u32 << ids.id_len();
                    let expected_frame_id = (fh.current_frame_id + modulo - delta_frame_id) % modulo;
                    if refs.get(fh.ref_frame_idx[i] as usize).frame_id != expected_frame_id {
                        return Err(invalid("reference frame id mismatch"));
                    }
                }
            }

            if fh.frame_size_override_flag && !fh.error_resilient_mode {
                fh.parse_frame_size_with_refs(&mut bit_reader, seq, refs)?;
            } else {
                fh.parse_frame_size(&mut bit_reader, seq)?;
                fh.parse_render_size(&mut bit_reader)?;
            }

            fh.allow_high_precision_mv = !fh.force_integer_mv && bit_reader.read_bit()?;

            // is_filter_switchable, interpolation_filter
            if !bit_reader.read_bit()? {
                bit_reader.read_bits(2)?;
            }

            fh.is_motion_mode_switchable = bit_reader.read_bit()?;
            fh.use_ref_frame_mvs = !fh.error_resilient_mode && seq.enable_ref_frame_mvs && bit_reader.read_bit()?;
        }

        fh.disable_frame_end_update_cdf = if seq.reduced_still_picture_header || fh.disable_cdf_update {
            true
        } else {
            bit_reader.read_bit()?
        };

        if fh.primary_ref_frame != PRIMARY_REF_NONE
            && !refs.get(fh.ref_frame_idx[fh.primary_ref_frame as usize] as usize).valid
        {
            return Err(invalid("primary_ref_frame points at an invalid reference"));
        }

        fh.tile_info = parse_tile_info(&mut bit_reader, seq, fh.mi_cols, fh.mi_rows)?;

        Ok(fh)
    }

    /// `frame_size()`, AV1 - 5.9.5.
    fn parse_frame_size<R: io::Read>(&mut self, bit_reader: &mut BitReader<R>, seq: &SequenceHeaderObu) -> io::Result<()> {
        if self.frame_size_override_flag {
            self.frame_width = bit_reader.read_bits(seq.frame_width_bits)? as u32 + 1;
            self.frame_height = bit_reader.read_bits(seq.frame_height_bits)? as u32 + 1;
        } else {
            self.frame_width = seq.max_frame_width as u32;
            self.frame_height = seq.max_frame_height as u32;
        }

        self.parse_superres(bit_reader, seq)?;
        self.compute_image_size();

        Ok(())
    }

    /// `superres_params()`, AV1 - 5.9.8.
    fn parse_superres<R: io::Read>(&mut self, bit_reader: &mut BitReader<R>, seq: &SequenceHeaderObu) -> io::Result<()> {
        let denom = if seq.enable_superres && bit_reader.read_bit()? {
            bit_reader.read_bits(3)? as u32 + SUPERRES_DENOM_MIN
        } else {
            SUPERRES_NUM
        };

        self.upscaled_width = self.frame_width;
        self.frame_width = (self.upscaled_width * SUPERRES_NUM + denom / 2) / denom;

        Ok(())
    }

    /// `compute_image_size()`, AV1 - 5.9.9.
    const fn compute_image_size(&mut self) {
        self.mi_cols = 2 * ((self.frame_width + 7) >> 3);
        self.mi_rows = 2 * ((self.frame_height + 7) >> 3);
    }

    /// `render_size()`, AV1 - 5.9.6.
    fn parse_render_size<R: io::Read>(&mut self, bit_reader: &mut BitReader<R>) -> io::Result<()> {
        if bit_reader.read_bit()? {
            self.render_width = bit_reader.read_bits(16)? as u32 + 1;
            self.render_height = bit_reader.read_bits(16)? as u32 + 1;
        } else {
            self.render_width = self.upscaled_width;
            self.render_height = self.frame_height;
        }

        Ok(())
    }

    /// `frame_size_with_refs()`, AV1 - 5.9.7.
    fn parse_frame_size_with_refs<R: io::Read>(
        &mut self,
        bit_reader: &mut BitReader<R>,
        seq: &SequenceHeaderObu,
        refs: &ReferenceFrames,
    ) -> io::Result<()> {
        for i in 0..REFS_PER_FRAME {
            // found_ref
            if bit_reader.read_bit()? {
                let found = refs.get(self.ref_frame_idx[i] as usize);
                self.upscaled_width = found.upscaled_width;
                self.frame_width = found.upscaled_width;
                self.frame_height = found.frame_height;
                self.render_width = found.render_width;
                self.render_height = found.render_height;

                self.parse_superres(bit_reader, seq)?;
                self.compute_image_size();
                return Ok(());
            }
        }

        self.parse_frame_size(bit_reader, seq)?;
        self.parse_render_size(bit_reader)
    }
}

/// `tile_info()`, AV1 - 5.9.15.
fn parse_tile_info<R: io::Read>(
    bit_reader: &mut BitReader<R>,
    seq: &SequenceHeaderObu,
    mi_cols: u32,
    mi_rows: u32,
) -> io::Result<TileInfo> {
    let (sb_cols, sb_rows, sb_shift) = if seq.use_128x128_superblock {
        ((mi_cols + 31) >> 5, (mi_rows + 31) >> 5, 5)
    } else {
        ((mi_cols + 15) >> 4, (mi_rows + 15) >> 4, 4)
    };
    let sb_size = sb_shift + 2;
    let max_tile_width_sb = MAX_TILE_WIDTH >> sb_size;
    let mut max_tile_area_sb = MAX_TILE_AREA >> (2 * sb_size);
    let min_log2_tile_cols = tile_log2(max_tile_width_sb, sb_cols);
    let max_log2_tile_cols = tile_log2(1, sb_cols.min(MAX_TILE_COLS));
    let max_log2_tile_rows = tile_log2(1, sb_rows.min(MAX_TILE_ROWS));
    let min_log2_tiles = min_log2_tile_cols.max(tile_log2(max_tile_area_sb, sb_rows * sb_cols));

    let mut info = TileInfo::default();

    // uniform_tile_spacing_flag
    if bit_reader.read_bit()? {
        info.tile_cols_log2 = min_log2_tile_cols;
        while info.tile_cols_log2 < max_log2_tile_cols && bit_reader.read_bit()? {
            info.tile_cols_log2 += 1;
        }

        let tile_width_sb = (sb_cols + (1 << info.tile_cols_log2) - 1) >> info.tile_cols_log2;
        info.tile_cols = sb_cols.div_ceil(tile_width_sb.max(1));

        info.tile_rows_log2 = min_log2_tiles.saturating_sub(info.tile_cols_log2);
        while info.tile_rows_log2 < max_log2_tile_rows && bit_reader.read_bit()? {
            info.tile_rows_log2 += 1;
        }

        let tile_height_sb = (sb_rows + (1 << info.tile_rows_log2) - 1) >> info.tile_rows_log2;
        info.tile_rows = sb_rows.div_ceil(tile_height_sb.max(1));
    } else {
        let mut widest_tile_sb = 0;
        let mut start_sb = 0;
        while start_sb < sb_cols {
            let max_width = (sb_cols - start_sb).min(max_tile_width_sb);
            let size_sb = read_ns(bit_reader, max_width)? + 1;
            widest_tile_sb = widest_tile_sb.max(size_sb);
            start_sb += size_sb;
            info.tile_cols += 1;
        }
        info.tile_cols_log2 = tile_log2(1, info.tile_cols);

        max_tile_area_sb = if min_log2_tiles > 0 {
            (sb_rows * sb_cols) >> (min_log2_tiles + 1)
        } else {
            sb_rows * sb_cols
        };
        let max_tile_height_sb = (max_tile_area_sb / widest_tile_sb.max(1)).max(1);

        let mut start_sb = 0;
        while start_sb < sb_rows {
            let max_height = (sb_rows - start_sb).min(max_tile_height_sb);
            start_sb += read_ns(bit_reader, max_height)? + 1;
            info.tile_rows += 1;
        }
        info.tile_rows_log2 = tile_log2(1, info.tile_rows);
    }

    if info.tile_cols > MAX_TILE_COLS || info.tile_rows > MAX_TILE_ROWS {
        return Err(invalid("too many tiles"));
    }

    if info.tile_cols_log2 > 0 || info.tile_rows_log2 > 0 {
        info.context_update_tile_id = bit_reader.read_bits((info.tile_cols_log2 + info.tile_rows_log2) as u8)? as u32;
        info.tile_size_bytes = bit_reader.read_bits(2)? as u8 + 1;
    }

    Ok(info)
}

#[cfg(test)]
impl FrameHeader {
    pub(crate) fn key_frame_for_tests(width: u32, height: u32) -> Self {
        let mut fh = Self::empty();
        fh.frame_width = width;
        fh.upscaled_width = width;
        fh.frame_height = height;
        fh.render_width = width;
        fh.render_height = height;
        fh.compute_image_size();
        fh.refresh_frame_flags = ALL_FRAMES;
        fh.tile_info.tile_cols = 1;
        fh.tile_info.tile_rows = 1;
        fh
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use reframe_bytes_util::BitWriter;

    use super::*;
    use crate::obu::seq::tests::sequence_header;

    /// A shown key frame header for the 7 bit order hint sequence from the seq tests.
    pub(crate) fn key_frame_payload() -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(false).unwrap(); // show_existing_frame
        writer.write_bits(0, 2).unwrap(); // frame_type KEY
        writer.write_bit(true).unwrap(); // show_frame
        writer.write_bit(false).unwrap(); // disable_cdf_update
        writer.write_bit(false).unwrap(); // allow_screen_content_tools
        writer.write_bit(false).unwrap(); // frame_size_override_flag
        writer.write_bits(0, 7).unwrap(); // order_hint
        writer.write_bit(false).unwrap(); // render_and_frame_size_different
        writer.write_bit(false).unwrap(); // disable_frame_end_update_cdf
        writer.write_bit(true).unwrap(); // uniform_tile_spacing_flag
        writer.write_bit(false).unwrap(); // increment_tile_cols_log2
        writer.write_bit(false).unwrap(); // increment_tile_rows_log2
        writer.finish().unwrap()
    }

    /// A shown inter frame referencing slot 0 everywhere.
    pub(crate) fn inter_frame_payload(order_hint: u64) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(false).unwrap(); // show_existing_frame
        writer.write_bits(1, 2).unwrap(); // frame_type INTER
        writer.write_bit(true).unwrap(); // show_frame
        writer.write_bit(false).unwrap(); // error_resilient_mode
        writer.write_bit(false).unwrap(); // disable_cdf_update
        writer.write_bit(false).unwrap(); // allow_screen_content_tools
        writer.write_bit(false).unwrap(); // frame_size_override_flag
        writer.write_bits(order_hint, 7).unwrap(); // order_hint
        writer.write_bits(0, 3).unwrap(); // primary_ref_frame
        writer.write_bits(0b0000_0010, 8).unwrap(); // refresh_frame_flags
        writer.write_bit(false).unwrap(); // frame_refs_short_signaling
        for _ in 0..7 {
            writer.write_bits(0, 3).unwrap(); // ref_frame_idx
        }
        writer.write_bit(false).unwrap(); // render_and_frame_size_different
        writer.write_bit(true).unwrap(); // allow_high_precision_mv
        writer.write_bit(true).unwrap(); // is_filter_switchable
        writer.write_bit(false).unwrap(); // is_motion_mode_switchable
        writer.write_bit(true).unwrap(); // use_ref_frame_mvs
        writer.write_bit(false).unwrap(); // disable_frame_end_update_cdf
        writer.write_bit(true).unwrap(); // uniform_tile_spacing_flag
        writer.write_bit(false).unwrap(); // increment_tile_cols_log2
        writer.write_bit(false).unwrap(); // increment_tile_rows_log2
        writer.finish().unwrap()
    }

    #[test]
    fn test_key_frame() {
        let seq = sequence_header(1920, 1080);
        let mut refs = ReferenceFrames::new();

        let fh = FrameHeader::parse(&mut io::Cursor::new(key_frame_payload()), &seq, &mut refs, 0, 0).unwrap();
        assert_eq!(fh.frame_type, FrameType::Key);
        assert!(fh.show_frame);
        assert!(fh.error_resilient_mode);
        assert_eq!(fh.refresh_frame_flags, 0xff);
        assert_eq!(fh.frame_width, 1920);
        assert_eq!(fh.frame_height, 1080);
        assert_eq!(fh.mi_cols, 480);
        assert_eq!(fh.mi_rows, 270);
        insta::assert_debug_snapshot!(fh.tile_info, @r"
        TileInfo {
            tile_cols: 1,
            tile_rows: 1,
            tile_cols_log2: 0,
            tile_rows_log2: 0,
            context_update_tile_id: 0,
            tile_size_bytes: 0,
        }
        ");

        refs.update(&fh).unwrap();
        assert!((0..8).all(|i| refs.get(i).valid));
    }

    #[test]
    fn test_inter_frame_needs_valid_primary_ref() {
        let seq = sequence_header(1920, 1080);
        let mut refs = ReferenceFrames::new();

        let err = FrameHeader::parse(&mut io::Cursor::new(inter_frame_payload(1)), &seq, &mut refs, 0, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let key = FrameHeader::parse(&mut io::Cursor::new(key_frame_payload()), &seq, &mut refs, 0, 0).unwrap();
        refs.update(&key).unwrap();

        let inter = FrameHeader::parse(&mut io::Cursor::new(inter_frame_payload(1)), &seq, &mut refs, 0, 0).unwrap();
        assert_eq!(inter.frame_type, FrameType::Inter);
        assert_eq!(inter.order_hint, 1);
        assert_eq!(inter.refresh_frame_flags, 0b10);
        assert_eq!(inter.frame_width, 1920);
        assert!(inter.allow_high_precision_mv);
        assert!(inter.use_ref_frame_mvs);
    }

    #[test]
    fn test_show_existing_frame() {
        let seq = sequence_header(1920, 1080);
        let mut refs = ReferenceFrames::new();

        // show_existing_frame = 1, frame_to_show_map_idx = 3
        let payload = [0b1011_0000];
        assert!(FrameHeader::parse(&mut io::Cursor::new(payload), &seq, &mut refs, 0, 0).is_err());

        let key = FrameHeader::parse(&mut io::Cursor::new(key_frame_payload()), &seq, &mut refs, 0, 0).unwrap();
        refs.update(&key).unwrap();

        let fh = FrameHeader::parse(&mut io::Cursor::new(payload), &seq, &mut refs, 0, 0).unwrap();
        assert!(fh.show_existing_frame);
        assert!(fh.is_shown());
        assert_eq!(fh.frame_to_show_map_idx, 3);
        assert_eq!(fh.frame_type, FrameType::Key);
        assert_eq!(fh.refresh_frame_flags, 0xff);
        assert_eq!(fh.frame_width, 1920);
    }

    #[test]
    fn test_uniform_tiles() {
        let seq = sequence_header(1920, 1080);
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap(); // uniform_tile_spacing_flag
        writer.write_bit(true).unwrap(); // increment_tile_cols_log2
        writer.write_bit(false).unwrap();
        writer.write_bit(true).unwrap(); // increment_tile_rows_log2
        writer.write_bit(false).unwrap();
        writer.write_bits(0b10, 2).unwrap(); // context_update_tile_id
        writer.write_bits(3, 2).unwrap(); // tile_size_bytes_minus_1
        let data = writer.finish().unwrap();

        let mut reader = BitReader::new_from_slice(data);
        let info = parse_tile_info(&mut reader, &seq, 480, 270).unwrap();
        assert_eq!(info.tile_cols, 2);
        assert_eq!(info.tile_rows, 2);
        assert_eq!(info.num_tiles(), 4);
        assert_eq!(info.context_update_tile_id, 2);
        assert_eq!(info.tile_size_bytes, 4);
    }
}
