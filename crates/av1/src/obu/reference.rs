use std::io;

use super::frame_header::{FrameHeader, FrameType, TileInfo};
use super::seq::SequenceHeaderObu;

/// `NUM_REF_FRAMES`
pub(crate) const NUM_REF_FRAMES: usize = 8;
/// `REFS_PER_FRAME`
pub(crate) const REFS_PER_FRAME: usize = 7;

/// The saved state of one reference frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefFrame {
    /// `RefValid`
    pub valid: bool,
    /// `RefFrameId`
    pub frame_id: u32,
    /// `RefFrameType`
    pub frame_type: FrameType,
    /// `RefUpscaledWidth`
    pub upscaled_width: u32,
    /// `RefFrameWidth`
    pub frame_width: u32,
    /// `RefFrameHeight`
    pub frame_height: u32,
    /// `RefRenderWidth`
    pub render_width: u32,
    /// `RefRenderHeight`
    pub render_height: u32,
    /// `RefMiCols`
    pub mi_cols: u32,
    /// `RefMiRows`
    pub mi_rows: u32,
    /// `RefOrderHint`
    pub order_hint: u32,
    /// Tile layout of the frame stored in the slot.
    pub tile_info: TileInfo,
}

impl Default for RefFrame {
    fn default() -> Self {
        Self {
            valid: false,
            frame_id: 0,
            frame_type: FrameType::Key,
            upscaled_width: 0,
            frame_width: 0,
            frame_height: 0,
            render_width: 0,
            render_height: 0,
            mi_cols: 0,
            mi_rows: 0,
            order_hint: 0,
            tile_info: TileInfo::default(),
        }
    }
}

/// The eight reference frame slots of a decoder, as far as header parsing needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFrames {
    frames: [RefFrame; NUM_REF_FRAMES],
}

impl ReferenceFrames {
    /// Creates a set of invalid slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot at `idx`, which must be below 8.
    pub const fn get(&self, idx: usize) -> &RefFrame {
        &self.frames[idx]
    }

    pub(crate) const fn get_mut(&mut self, idx: usize) -> &mut RefFrame {
        &mut self.frames[idx]
    }

    /// Invalidates every slot.
    pub fn reset(&mut self) {
        self.frames = Default::default();
    }

    /// Reference frame update process, AV1 - 7.20.
    ///
    /// Every slot selected by `refresh_frame_flags` takes the state of the frame.
    pub fn update(&mut self, frame_header: &FrameHeader) -> io::Result<()> {
        if frame_header.frame_type == FrameType::IntraOnly && frame_header.refresh_frame_flags == 0xff {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "intra only frames cannot refresh all reference frames",
            ));
        }

        for (i, slot) in self.frames.iter_mut().enumerate() {
            if (frame_header.refresh_frame_flags >> i) & 1 == 1 {
                *slot = RefFrame {
                    valid: true,
                    frame_id: frame_header.current_frame_id,
                    frame_type: frame_header.frame_type,
                    upscaled_width: frame_header.upscaled_width,
                    frame_width: frame_header.frame_width,
                    frame_height: frame_header.frame_height,
                    render_width: frame_header.render_width,
                    render_height: frame_header.render_height,
                    mi_cols: frame_header.mi_cols,
                    mi_rows: frame_header.mi_rows,
                    order_hint: frame_header.order_hint,
                    tile_info: frame_header.tile_info,
                };
            }
        }

        Ok(())
    }

    /// Reference frame marking, AV1 - 5.9.4.
    pub(crate) fn mark(&mut self, current_frame_id: u32, id_len: u8, delta_frame_id_length: u8) {
        let diff = 1u32 << delta_frame_id_length;
        for slot in &mut self.frames {
            let stale = if current_frame_id > diff {
                slot.frame_id > current_frame_id || slot.frame_id < current_frame_id - diff
            } else {
                slot.frame_id > current_frame_id && slot.frame_id < (1u32 << id_len) + current_frame_id - diff
            };

            if stale {
                slot.valid = false;
            }
        }
    }

    /// Set frame refs process, AV1 - 7.8.
    ///
    /// Fills the reference indices of a frame using `frame_refs_short_signaling`.
    pub(crate) fn set_frame_refs(
        &self,
        seq: &SequenceHeaderObu,
        order_hint: u32,
        last_frame_idx: u8,
        gold_frame_idx: u8,
    ) -> [u8; REFS_PER_FRAME] {
        // LAST, LAST2, LAST3, GOLDEN, BWDREF, ALTREF2, ALTREF
        const LAST: usize = 0;
        const GOLDEN: usize = 3;
        const BWDREF: usize = 4;
        const ALTREF2: usize = 5;
        const ALTREF: usize = 6;
        const FORWARD_ORDER: [usize; 5] = [1, 2, BWDREF, ALTREF2, ALTREF];

        let mut ref_frame_idx: [Option<usize>; REFS_PER_FRAME] = [None; REFS_PER_FRAME];
        ref_frame_idx[LAST] = Some(last_frame_idx as usize);
        ref_frame_idx[GOLDEN] = Some(gold_frame_idx as usize);

        let mut used_frame = [false; NUM_REF_FRAMES];
        used_frame[last_frame_idx as usize] = true;
        used_frame[gold_frame_idx as usize] = true;

        let cur_frame_hint = 1i32 << (seq.order_hint_bits.max(1) - 1);
        let shifted_order_hints: [i32; NUM_REF_FRAMES] = std::array::from_fn(|i| {
            cur_frame_hint + relative_dist(seq, self.frames[i].order_hint, order_hint)
        });

        let mut last_order_hint = shifted_order_hints[last_frame_idx as usize];
        let mut earliest_order_hint = shifted_order_hints[gold_frame_idx as usize];

        // highest backward reference
        let mut found = None;
        for (i, &hint) in shifted_order_hints.iter().enumerate() {
            if !used_frame[i] && hint >= cur_frame_hint && (found.is_none() || hint >= last_order_hint) {
                found = Some(i);
                last_order_hint = hint;
            }
        }
        if let Some(i) = found {
            ref_frame_idx[ALTREF] = Some(i);
            used_frame[i] = true;
        }

        // closest and next closest backward references
        for slot in [BWDREF, ALTREF2] {
            let mut found = None;
            for (i, &hint) in shifted_order_hints.iter().enumerate() {
                if !used_frame[i] && hint >= cur_frame_hint && (found.is_none() || hint < earliest_order_hint) {
                    found = Some(i);
                    earliest_order_hint = hint;
                }
            }
            if let Some(i) = found {
                ref_frame_idx[slot] = Some(i);
                used_frame[i] = true;
            }
        }

        // forward references, anti-chronological
        for slot in FORWARD_ORDER {
            if ref_frame_idx[slot].is_some() {
                continue;
            }

            let mut found = None;
            for (i, &hint) in shifted_order_hints.iter().enumerate() {
                if !used_frame[i] && hint < cur_frame_hint && (found.is_none() || hint >= last_order_hint) {
                    found = Some(i);
                    last_order_hint = hint;
                }
            }
            if let Some(i) = found {
                ref_frame_idx[slot] = Some(i);
                used_frame[i] = true;
            }
        }

        // everything else points at the earliest frame
        let mut earliest = 0;
        for (i, &hint) in shifted_order_hints.iter().enumerate() {
            if i == 0 || hint < earliest_order_hint {
                earliest = i;
                earliest_order_hint = hint;
            }
        }

        ref_frame_idx.map(|idx| idx.unwrap_or(earliest) as u8)
    }
}

/// `get_relative_dist(a, b)`, AV1 - 7.12.3.
pub(crate) fn relative_dist(seq: &SequenceHeaderObu, a: u32, b: u32) -> i32 {
    if !seq.enable_order_hint || seq.order_hint_bits == 0 {
        return 0;
    }

    let diff = a as i32 - b as i32;
    let m = 1i32 << (seq.order_hint_bits - 1);
    (diff & (m - 1)) - (diff & m)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::obu::seq::tests::sequence_header;

    #[test]
    fn test_relative_dist_wraps() {
        let seq = sequence_header(64, 64);
        // 7 order hint bits
        assert_eq!(relative_dist(&seq, 5, 3), 2);
        assert_eq!(relative_dist(&seq, 3, 5), -2);
        assert_eq!(relative_dist(&seq, 1, 127), 2);
    }

    #[test]
    fn test_set_frame_refs() {
        let seq = sequence_header(64, 64);
        let mut refs = ReferenceFrames::new();
        for (i, hint) in [10u32, 8, 6, 4, 12, 14, 2, 0].into_iter().enumerate() {
            refs.get_mut(i).order_hint = hint;
            refs.get_mut(i).valid = true;
        }

        // current frame 11: backward refs are 12 (slot 4) and 14 (slot 5)
        let idx = refs.set_frame_refs(&seq, 11, 0, 3);
        assert_eq!(idx[0], 0);
        assert_eq!(idx[3], 3);
        assert_eq!(idx[6], 5);
        assert_eq!(idx[4], 4);
        // no backward frame left for ALTREF2, forward refs in decreasing order: 8, 6
        assert_eq!(idx[1], 1);
        assert_eq!(idx[2], 2);
        assert_eq!(idx[5], 6);
    }

    #[test]
    fn test_update_and_reset() {
        let mut refs = ReferenceFrames::new();
        let mut header = FrameHeader::key_frame_for_tests(320, 240);
        header.refresh_frame_flags = 0b0000_0101;
        header.order_hint = 9;
        refs.update(&header).unwrap();

        assert!(refs.get(0).valid);
        assert!(!refs.get(1).valid);
        assert!(refs.get(2).valid);
        assert_eq!(refs.get(2).order_hint, 9);
        assert_eq!(refs.get(2).frame_width, 320);

        header.frame_type = FrameType::IntraOnly;
        header.refresh_frame_flags = 0xff;
        assert!(refs.update(&header).is_err());

        refs.reset();
        assert!(!refs.get(0).valid);
    }
}
