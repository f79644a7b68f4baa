//! Per-stream and per-access-unit bookkeeping shared by the parsers.

use reframe_h264::sei::{ContentLightLevelInfo, MasteringDisplayColourVolume, PicStruct};

use crate::cache::StreamInfo;

bitflags::bitflags! {
    /// Which headers have been seen since the last sequence change.
    ///
    /// Used both as the accumulated state and as the precondition a unit
    /// requires before it is accepted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameState: u8 {
        /// A sequence parameter set was parsed.
        const GOT_SPS = 1 << 0;
        /// A picture parameter set was parsed.
        const GOT_PPS = 1 << 1;
        /// A slice header was parsed.
        const GOT_SLICE = 1 << 2;
        /// Slices can be decoded.
        const VALID_PICTURE_HEADERS = Self::GOT_SPS.bits() | Self::GOT_PPS.bits();
        /// A complete picture was seen.
        const VALID_PICTURE = Self::VALID_PICTURE_HEADERS.bits() | Self::GOT_SLICE.bits();
    }
}

impl FrameState {
    /// All of `required` has been seen.
    pub const fn is_valid(&self, required: Self) -> bool {
        self.contains(required)
    }
}

/// Lifetime of display metadata carried in SEI messages.
///
/// A message becomes [`SeiFreshness::Parsed`] when received, is promoted to
/// [`SeiFreshness::Active`] by the next IRAP picture and expires at the IRAP
/// after that unless it was repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeiFreshness {
    /// No value applies.
    #[default]
    Expired,
    /// Received for the upcoming coded video sequence.
    Parsed,
    /// Applies to the current coded video sequence.
    Active,
}

impl SeiFreshness {
    /// The state after an IRAP picture.
    pub const fn step_on_irap(self) -> Self {
        match self {
            Self::Parsed => Self::Active,
            Self::Active | Self::Expired => Self::Expired,
        }
    }
}

/// A metadata value and its freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeiValue<T> {
    freshness: SeiFreshness,
    value: Option<T>,
}

impl<T> Default for SeiValue<T> {
    fn default() -> Self {
        Self {
            freshness: SeiFreshness::Expired,
            value: None,
        }
    }
}

impl<T: PartialEq> SeiValue<T> {
    /// Stores a freshly parsed value, returns true if the published value changes.
    pub fn update(&mut self, value: T) -> bool {
        let changed = self.freshness == SeiFreshness::Expired || self.value.as_ref() != Some(&value);
        self.value = Some(value);
        self.freshness = SeiFreshness::Parsed;
        changed
    }

    /// Advances the freshness at an IRAP picture, returns true if the value expired.
    pub fn step_on_irap(&mut self) -> bool {
        let before = self.freshness;
        self.freshness = before.step_on_irap();
        before != SeiFreshness::Expired && self.freshness == SeiFreshness::Expired
    }

    /// The value, unless it expired.
    pub fn current(&self) -> Option<&T> {
        match self.freshness {
            SeiFreshness::Expired => None,
            _ => self.value.as_ref(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn freshness(&self) -> SeiFreshness {
        self.freshness
    }
}

/// HDR metadata tracked across access units.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeiState {
    /// Mastering display colour volume.
    pub mastering_display: SeiValue<MasteringDisplayColourVolume>,
    /// Content light level.
    pub content_light_level: SeiValue<ContentLightLevelInfo>,
}

impl SeiState {
    /// Steps both values at the first slice of an IRAP picture.
    pub fn step_on_irap(&mut self) {
        self.mastering_display.step_on_irap();
        self.content_light_level.step_on_irap();
    }

    /// Publishes the live values into `info`.
    pub fn apply(&self, info: &mut StreamInfo) {
        info.mastering_display = self.mastering_display.current().copied();
        info.content_light_level = self.content_light_level.current().copied();
    }
}

/// A two-slot lookahead for boundary decisions.
///
/// `pending` holds a unit that was classified but belongs to the next
/// output unit, it is replayed without a second boundary check. `confirmed`
/// holds the last unit whose output unit is known.
#[derive(Debug, Clone)]
pub struct Lookahead<P, C> {
    pending: Option<P>,
    confirmed: Option<C>,
}

impl<P, C> Default for Lookahead<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C> Lookahead<P, C> {
    /// Both slots empty.
    pub const fn new() -> Self {
        Self {
            pending: None,
            confirmed: None,
        }
    }

    /// Parks a unit for the next output unit.
    pub fn defer(&mut self, unit: P) {
        self.pending = Some(unit);
    }

    /// Takes the parked unit.
    pub fn take_pending(&mut self) -> Option<P> {
        self.pending.take()
    }

    /// Records the last unit of known membership.
    pub fn confirm(&mut self, unit: C) {
        self.confirmed = Some(unit);
    }

    /// The last unit of known membership.
    pub const fn confirmed(&self) -> Option<&C> {
        self.confirmed.as_ref()
    }

    /// Empties both slots.
    pub fn clear(&mut self) {
        self.pending = None;
        self.confirmed = None;
    }
}

/// Flags collected while one output unit is assembled.
#[derive(Debug, Clone, Default)]
pub(crate) struct AccessUnitState {
    /// A slice was seen since the last access unit boundary. Survives frame resets.
    pub picture_start: bool,
    pub frame_start: bool,
    pub keyframe: bool,
    pub predicted: bool,
    pub bidirectional: bool,
    pub header: bool,
    pub have_aud: bool,
    pub have_vps: bool,
    pub have_sps: bool,
    pub have_pps: bool,
    /// Where parameter sets go if they are injected.
    pub idr_pos: Option<usize>,
    /// The first SEI of the unit.
    pub sei_pos: Option<usize>,
    pub pic_struct: Option<PicStruct>,
    pub field_pic: bool,
}

impl AccessUnitState {
    /// Clears everything but `picture_start`.
    pub fn reset_frame(&mut self) {
        *self = Self {
            picture_start: self.picture_start,
            ..Self::default()
        };
    }

    pub fn mark_sei(&mut self, pos: usize) {
        if self.sei_pos.is_none() {
            self.sei_pos = Some(pos);
        }
    }

    /// Records the injection point, moved back to a preceding SEI.
    pub fn mark_idr(&mut self, pos: usize) {
        let idr = *self.idr_pos.get_or_insert(pos);
        if let Some(sei) = self.sei_pos
            && sei < idr
        {
            self.idr_pos = Some(sei);
        }
    }
}

/// Parameter set kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParameterSetKind {
    Vps,
    Sps,
    Pps,
}

/// A pending request to re-send the parameter sets with the next keyframe.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CodecPush {
    pub requested: bool,
    have_vps: bool,
    have_sps: bool,
    have_pps: bool,
}

impl CodecPush {
    pub fn request(&mut self) {
        self.requested = true;
    }

    /// Notes an in-band parameter set. The request is dropped once the stream
    /// supplied SPS and PPS itself.
    pub fn saw(&mut self, kind: ParameterSetKind) {
        match kind {
            ParameterSetKind::Vps => self.have_vps = true,
            ParameterSetKind::Sps => self.have_sps = true,
            ParameterSetKind::Pps => self.have_pps = true,
        }

        if self.requested && self.have_sps && self.have_pps {
            tracing::debug!("parameter sets found in stream, no need to push them");
            self.done();
        }
    }

    /// The parameter sets went out.
    pub fn done(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_frame_state() {
        let mut state = FrameState::GOT_SPS;
        assert!(!state.is_valid(FrameState::VALID_PICTURE_HEADERS));

        state |= FrameState::GOT_PPS;
        assert!(state.is_valid(FrameState::VALID_PICTURE_HEADERS));
        assert!(!state.is_valid(FrameState::VALID_PICTURE));

        state &= FrameState::GOT_PPS;
        assert_eq!(state, FrameState::GOT_PPS);
    }

    #[test]
    fn test_freshness_cycle() {
        let mut value = SeiValue::default();
        assert_eq!(value.current(), None::<&u32>);

        assert!(value.update(7u32));
        assert_eq!(value.freshness(), SeiFreshness::Parsed);
        assert_eq!(value.current(), Some(&7));

        // unchanged repeat
        assert!(!value.update(7));
        assert!(value.update(8));

        assert!(!value.step_on_irap());
        assert_eq!(value.freshness(), SeiFreshness::Active);
        assert_eq!(value.current(), Some(&8));

        assert!(value.step_on_irap());
        assert_eq!(value.freshness(), SeiFreshness::Expired);
        assert_eq!(value.current(), None);

        // an expired value is republished even if equal
        assert!(value.update(8));
    }

    #[test]
    fn test_idr_moves_to_sei() {
        let mut au = AccessUnitState::default();
        au.mark_sei(12);
        au.mark_sei(40);
        au.mark_idr(30);
        assert_eq!(au.idr_pos, Some(12));

        let mut au = AccessUnitState::default();
        au.mark_idr(8);
        au.mark_idr(20);
        assert_eq!(au.idr_pos, Some(8));
    }

    #[test]
    fn test_reset_keeps_picture_start() {
        let mut au = AccessUnitState {
            picture_start: true,
            keyframe: true,
            idr_pos: Some(3),
            ..Default::default()
        };
        au.reset_frame();
        assert!(au.picture_start);
        assert!(!au.keyframe);
        assert_eq!(au.idr_pos, None);
    }

    #[test]
    fn test_lookahead() {
        let mut lookahead = Lookahead::<u8, u16>::new();
        lookahead.defer(1);
        lookahead.defer(2);
        lookahead.confirm(10);
        assert_eq!(lookahead.take_pending(), Some(2));
        assert_eq!(lookahead.take_pending(), None);
        assert_eq!(lookahead.confirmed(), Some(&10));

        lookahead.defer(3);
        lookahead.clear();
        assert_eq!(lookahead.take_pending(), None);
        assert_eq!(lookahead.confirmed(), None);
    }

    #[test]
    fn test_codec_push() {
        let mut push = CodecPush::default();
        push.saw(ParameterSetKind::Sps);
        push.request();
        assert!(push.requested);

        push.saw(ParameterSetKind::Pps);
        assert!(!push.requested);

        push.request();
        push.saw(ParameterSetKind::Vps);
        assert!(push.requested);
    }
}
