//! Per-codec rules for classifying NAL units.
//!
//! The shared [`NalParser`](crate::nal::NalParser) owns the scanning and the
//! output bookkeeping; a [`NalCodecPolicy`] decides what a unit means for the
//! access unit being assembled.

use std::fmt;
use std::io;

use bytes::Bytes;
use reframe_bytes_util::strip_emulation_prevention;
use reframe_h264::sei::{
    ContentLightLevelInfo, FramePacking, MasteringDisplayColourVolume, SeiMessage, SeiMessages, SeiPayloadType,
};

use crate::cache::{StreamInfo, multiview_from_frame_packing};
use crate::error::ParseError;
use crate::format::Codec;
use crate::state::{AccessUnitState, CodecPush, FrameState, SeiState};
use crate::unit::SyntaxUnit;

pub(crate) mod h264;
pub(crate) mod h265;
pub(crate) mod h266;

pub(crate) use h264::H264Policy;
pub(crate) use h265::H265Policy;
pub(crate) use h266::H266Policy;

/// The state a policy mutates while classifying units.
#[derive(Debug, Default)]
pub(crate) struct NalContext {
    pub au: AccessUnitState,
    pub state: FrameState,
    pub info: StreamInfo,
    pub sei: SeiState,
    pub push: CodecPush,
    /// Position of the current unit's delimiter in the output unit.
    pub out_pos: usize,
}

impl NalContext {
    /// Fails with [`ParseError::MissingPrecondition`] unless `required` was seen.
    pub fn require(&self, required: FrameState, what: &'static str) -> Result<(), ParseError> {
        if self.state.is_valid(required) {
            Ok(())
        } else {
            Err(ParseError::MissingPrecondition(what))
        }
    }
}

pub(crate) trait NalCodecPolicy: Default + fmt::Debug {
    const CODEC: Codec;

    /// Smallest NAL unit header.
    const HEADER_LEN: usize;

    /// Reads the NAL unit header. Positions in the returned unit are relative
    /// to `nal`, the caller moves them into its buffer.
    fn parse_unit(&self, nal: &[u8]) -> io::Result<SyntaxUnit>;

    /// Whether `unit` cannot belong to the access unit that already has a picture.
    ///
    /// Only asked while a picture is open.
    fn starts_new_access_unit(&self, unit: &SyntaxUnit, nal: &[u8]) -> bool;

    /// Applies `unit` to the stream state. An error drops the unit.
    fn process(&mut self, ctx: &mut NalContext, unit: &SyntaxUnit, nal: &[u8]) -> Result<(), ParseError>;

    /// Whether the access unit ends right after `unit`.
    fn closes_access_unit(&self, _unit: &SyntaxUnit) -> bool {
        false
    }

    /// The cached parameter sets in decoding order, without delimiters.
    fn parameter_sets(&self) -> Vec<Bytes>;

    /// Duration of the picture in nanoseconds from the stream timing.
    fn frame_duration(&self, au: &AccessUnitState) -> Option<u64>;
}

/// `ticks` periods of `num_units_in_tick / time_scale` seconds in nanoseconds.
pub(crate) fn ticks_to_ns(ticks: u64, num_units_in_tick: u32, time_scale: u32) -> Option<u64> {
    if time_scale == 0 {
        return None;
    }

    let ns = ticks as u128 * num_units_in_tick as u128 * 1_000_000_000 / time_scale as u128;
    u64::try_from(ns).ok()
}

/// Applies the SEI messages of `nal` every codec understands the same way.
///
/// `other` receives the remaining payload types. A message that fails to
/// parse ends processing of the NAL unit, the messages before it stay applied.
pub(crate) fn apply_sei<F>(ctx: &mut NalContext, nal: &[u8], header_len: usize, mut other: F)
where
    F: FnMut(&mut NalContext, &SeiMessage<'_>) -> io::Result<()>,
{
    let rbsp = strip_emulation_prevention(nal.get(header_len..).unwrap_or_default());

    for message in SeiMessages::new(&rbsp) {
        let result = message.and_then(|message| apply_sei_message(ctx, &message, &mut other));
        if let Err(err) = result {
            let err = ParseError::RecoverableParse(err.to_string());
            tracing::warn!(%err, "dropping remaining sei messages");
            break;
        }
    }
}

fn apply_sei_message<F>(ctx: &mut NalContext, message: &SeiMessage<'_>, other: &mut F) -> io::Result<()>
where
    F: FnMut(&mut NalContext, &SeiMessage<'_>) -> io::Result<()>,
{
    match message.payload_type {
        SeiPayloadType::MasteringDisplayColourVolume => {
            let mdcv = MasteringDisplayColourVolume::parse(message.payload)?;
            if ctx.sei.mastering_display.update(mdcv) {
                tracing::debug!(?mdcv, "mastering display colour volume changed");
            }
        }
        SeiPayloadType::ContentLightLevelInfo => {
            let cll = ContentLightLevelInfo::parse(message.payload)?;
            if ctx.sei.content_light_level.update(cll) {
                tracing::debug!(?cll, "content light level changed");
            }
        }
        SeiPayloadType::FramePackingArrangement => {
            let packing = FramePacking::parse(message.payload)?;
            let (mode, flags) = multiview_from_frame_packing(&packing);
            ctx.info.multiview_mode = mode;
            ctx.info.multiview_flags = flags;
        }
        _ => other(ctx, message)?,
    }

    Ok(())
}
