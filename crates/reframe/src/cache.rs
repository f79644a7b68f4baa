//! Parameter set storage and the stream description derived from it.

use std::fmt;

use bytes::Bytes;
use reframe_h264::sei::{
    ContentLightLevelInfo, FramePacking, FramePackingType, MasteringDisplayColourVolume, StereoVideoInfo,
};

use crate::error::ParseError;

/// A parameter set as received, with its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSet<T> {
    /// The NAL unit, header included, without delimiter.
    pub nal: Bytes,
    /// The parsed fields.
    pub parsed: T,
}

/// Parameter sets indexed by id.
///
/// A set stored under an id that is already present replaces the old one, the
/// fields of the two are never merged.
#[derive(Debug, Clone)]
pub struct ParameterSetStore<T, const N: usize> {
    slots: Box<[Option<StoredSet<T>>]>,
}

impl<T, const N: usize> Default for ParameterSetStore<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> ParameterSetStore<T, N> {
    /// An empty store with `N` slots.
    pub fn new() -> Self {
        Self {
            slots: (0..N).map(|_| None).collect(),
        }
    }

    /// Stores `parsed` under `id`.
    pub fn insert(&mut self, id: usize, nal: Bytes, parsed: T) -> Result<(), ParseError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| ParseError::bitstream(format!("parameter set id {id} is outside 0..{N}")))?;

        *slot = Some(StoredSet { nal, parsed });
        Ok(())
    }

    /// The set stored under `id`.
    pub fn get(&self, id: usize) -> Option<&StoredSet<T>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// The parsed fields stored under `id`.
    pub fn parsed(&self, id: usize) -> Option<&T> {
        self.get(id).map(|set| &set.parsed)
    }

    /// Stored NAL units in id order.
    pub fn nals(&self) -> impl Iterator<Item = &Bytes> {
        self.slots.iter().flatten().map(|set| &set.nal)
    }
}

/// Chroma subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaFormat {
    /// Luma only.
    Monochrome,
    /// 4:2:0
    Yuv420,
    /// 4:2:2
    Yuv422,
    /// 4:4:4
    Yuv444,
}

impl ChromaFormat {
    /// From `chroma_format_idc`.
    pub const fn from_idc(idc: u64) -> Option<Self> {
        match idc {
            0 => Some(Self::Monochrome),
            1 => Some(Self::Yuv420),
            2 => Some(Self::Yuv422),
            3 => Some(Self::Yuv444),
            _ => None,
        }
    }

    /// From the AV1 colour config.
    pub const fn from_subsampling(mono_chrome: bool, subsampling_x: bool, subsampling_y: bool) -> Self {
        match (mono_chrome, subsampling_x, subsampling_y) {
            (true, _, _) => Self::Monochrome,
            (false, true, true) => Self::Yuv420,
            (false, true, false) => Self::Yuv422,
            (false, false, _) => Self::Yuv444,
        }
    }

    /// Caps name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monochrome => "4:0:0",
            Self::Yuv420 => "4:2:0",
            Self::Yuv422 => "4:2:2",
            Self::Yuv444 => "4:4:4",
        }
    }
}

impl fmt::Display for ChromaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour description, values as in ITU-T H.273.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colorimetry {
    /// `colour_primaries`
    pub primaries: u8,
    /// `transfer_characteristics`
    pub transfer: u8,
    /// `matrix_coefficients`
    pub matrix: u8,
    /// Full range samples.
    pub full_range: bool,
}

impl fmt::Display for Colorimetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = if self.full_range { 1 } else { 2 };
        write!(f, "{range}:{}:{}:{}", self.matrix, self.transfer, self.primaries)
    }
}

/// A positive ratio, kept in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    /// Numerator.
    pub num: u64,
    /// Denominator.
    pub den: u64,
}

impl Fraction {
    /// Reduces `num / den`, `None` if either side is zero.
    pub const fn new(num: u64, den: u64) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }

        let divisor = gcd(num, den);
        Some(Self {
            num: num / divisor,
            den: den / divisor,
        })
    }

    /// Nanoseconds covered by `ticks` periods of `1 / self`.
    pub const fn period_ns(&self, ticks: u64) -> u64 {
        (1_000_000_000u128 * self.den as u128 * ticks as u128 / self.num as u128) as u64
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Field structure of the pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterlaceMode {
    /// Frames only.
    #[default]
    Progressive,
    /// Frames and field pairs may alternate.
    Mixed,
    /// Every picture is one field.
    Alternate,
}

/// Stereo packing of the pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiviewMode {
    /// A single view.
    #[default]
    Mono,
    /// Views side by side.
    SideBySide,
    /// Views side by side, quincunx sampled.
    SideBySideQuincunx,
    /// Alternating columns.
    ColumnInterleaved,
    /// Alternating rows.
    RowInterleaved,
    /// One view above the other.
    TopBottom,
    /// Checkerboard.
    Checkerboard,
    /// Alternating frames.
    FrameByFrame,
}

bitflags::bitflags! {
    /// Modifiers of a [`MultiviewMode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MultiviewFlags: u8 {
        /// The right view comes first.
        const RIGHT_VIEW_FIRST = 1 << 0;
        /// The left view is mirrored horizontally.
        const LEFT_FLIPPED = 1 << 1;
        /// The left view is mirrored vertically.
        const LEFT_FLOPPED = 1 << 2;
        /// The right view is mirrored horizontally.
        const RIGHT_FLIPPED = 1 << 3;
        /// The right view is mirrored vertically.
        const RIGHT_FLOPPED = 1 << 4;
    }
}

/// Derives the stereo layout from a frame packing SEI.
pub fn multiview_from_frame_packing(packing: &FramePacking) -> (MultiviewMode, MultiviewFlags) {
    let Some(arrangement) = packing.arrangement else {
        return (MultiviewMode::Mono, MultiviewFlags::empty());
    };

    let mode = match arrangement.arrangement_type {
        FramePackingType::Checkerboard => MultiviewMode::Checkerboard,
        FramePackingType::ColumnInterleaved => MultiviewMode::ColumnInterleaved,
        FramePackingType::RowInterleaved => MultiviewMode::RowInterleaved,
        FramePackingType::SideBySide if arrangement.quincunx_sampling_flag => MultiviewMode::SideBySideQuincunx,
        FramePackingType::SideBySide => MultiviewMode::SideBySide,
        FramePackingType::TopBottom => MultiviewMode::TopBottom,
        FramePackingType::FrameAlternation => MultiviewMode::FrameByFrame,
        _ => return (MultiviewMode::Mono, MultiviewFlags::empty()),
    };

    let mut flags = MultiviewFlags::empty();
    let right_first = arrangement.content_interpretation_type == 2;
    if right_first {
        flags |= MultiviewFlags::RIGHT_VIEW_FIRST;
    }

    if arrangement.spatial_flipping_flag {
        // frame 0 is the left view unless the right one comes first
        let left_flipped = arrangement.frame0_flipped_flag != right_first;
        flags |= match (mode, left_flipped) {
            (MultiviewMode::TopBottom, true) => MultiviewFlags::LEFT_FLOPPED,
            (MultiviewMode::TopBottom, false) => MultiviewFlags::RIGHT_FLOPPED,
            (_, true) => MultiviewFlags::LEFT_FLIPPED,
            (_, false) => MultiviewFlags::RIGHT_FLIPPED,
        };
    }

    (mode, flags)
}

/// Derives the stereo layout from an H.264 stereo video info SEI.
pub fn multiview_from_stereo_info(info: &StereoVideoInfo) -> (MultiviewMode, MultiviewFlags) {
    if info.field_views_flag {
        let flags = if info.top_field_is_left_view_flag {
            MultiviewFlags::empty()
        } else {
            MultiviewFlags::RIGHT_VIEW_FIRST
        };
        return (MultiviewMode::RowInterleaved, flags);
    }

    if !info.next_frame_is_second_view_flag {
        return (MultiviewMode::Mono, MultiviewFlags::empty());
    }

    let flags = if info.current_frame_is_left_view_flag {
        MultiviewFlags::empty()
    } else {
        MultiviewFlags::RIGHT_VIEW_FIRST
    };
    (MultiviewMode::FrameByFrame, flags)
}

/// Formats a `major.minor` level, dropping a zero minor.
pub(crate) fn level_name(major: u8, minor: u8) -> String {
    if minor == 0 {
        major.to_string()
    } else {
        format!("{major}.{minor}")
    }
}

/// Everything downstream learns about the stream from its headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamInfo {
    /// Display width.
    pub width: u64,
    /// Display height.
    pub height: u64,
    /// Chroma subsampling.
    pub chroma_format: Option<ChromaFormat>,
    /// Luma bit depth.
    pub bit_depth_luma: u8,
    /// Chroma bit depth.
    pub bit_depth_chroma: u8,
    /// Colour description, when signalled.
    pub colorimetry: Option<Colorimetry>,
    /// Profile name.
    pub profile: Option<&'static str>,
    /// Tier name, H.265, H.266 and AV1.
    pub tier: Option<&'static str>,
    /// Level name.
    pub level: Option<String>,
    /// Frames per second.
    pub framerate: Option<Fraction>,
    /// Sample aspect ratio.
    pub pixel_aspect_ratio: Option<Fraction>,
    /// Field structure.
    pub interlace_mode: InterlaceMode,
    /// Stereo packing.
    pub multiview_mode: MultiviewMode,
    /// Stereo packing modifiers.
    pub multiview_flags: MultiviewFlags,
    /// Live mastering display metadata.
    pub mastering_display: Option<MasteringDisplayColourVolume>,
    /// Live content light level.
    pub content_light_level: Option<ContentLightLevelInfo>,
}

impl StreamInfo {
    /// Width and height are known.
    pub const fn has_geometry(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
