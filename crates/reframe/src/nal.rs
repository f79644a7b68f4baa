//! The frame loop shared by the NAL unit codecs.
//!
//! Units are located in the input, classified by the codec policy and copied
//! into the output unit in the negotiated delimiting. The loop stops when the
//! output unit is complete, when it needs more input or when it has to skip
//! bytes to resynchronize.

use bytes::Bytes;

use crate::cache::StreamInfo;
use crate::codec::{NalCodecPolicy, NalContext};
use crate::convert::{AU_DELIMITER, splice, write_nal};
use crate::emit::{Emitter, OutputFlags, OutputUnit, Timestamps};
use crate::error::ParseError;
use crate::format::{Alignment, Codec, FormatDescriptor, StreamFormat};
use crate::reassembler::{Delivery, ElementaryParser, FrameContext};
use crate::scanner::{NalExtent, Scan, scan_byte_stream, scan_length_prefixed};
use crate::settings::ParserSettings;
use crate::unit::SyntaxUnit;

/// How the frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The output unit ends at this input offset.
    End(usize),
    /// Nothing can be decided on the available input.
    More,
    /// Drop this many input bytes.
    Skip(usize),
}

/// Outcome of handing one located unit to the policy.
enum Consumed {
    /// The unit opens the next access unit, the current one ends in front of it.
    Boundary,
    /// The unit was applied and appended.
    Appended { closes: bool },
    /// The loop has to stop.
    Stop(Step),
}

/// Bytes in front of the last four that cannot begin a start code.
fn keep_start_code_prefix(data: &[u8]) -> usize {
    let mut skip = data.len().saturating_sub(3);
    if skip > 0 && data[skip - 1] == 0 {
        skip -= 1;
    }
    skip
}

/// Reassembles H.264, H.265 and H.266 elementary streams.
#[derive(Debug)]
pub(crate) struct NalParser<P> {
    policy: P,
    input: FormatDescriptor,
    output: FormatDescriptor,
    settings: ParserSettings,
    ctx: NalContext,
    emitter: Emitter,
    /// The output unit being assembled, already in the output delimiting.
    frame_out: Vec<u8>,
    /// Input bytes moved into `frame_out` when delimiters pass through unchanged.
    copied: usize,
    /// Where scanning resumes, `None` until the frame start was located.
    current_off: Option<usize>,
    /// The output unit closes an access unit.
    marker: bool,
    /// Output time of the last parameter-set insertion.
    last_report: Option<u64>,
    /// An access unit delimiter goes in front of the next unit.
    aud_insert: bool,
    au_has_sps: bool,
    au_has_pps: bool,
}

impl<P: NalCodecPolicy> NalParser<P> {
    pub fn new(input: FormatDescriptor, output: FormatDescriptor, settings: ParserSettings) -> Self {
        tracing::debug!(codec = %P::CODEC, %input, %output, "creating nal parser");

        Self {
            policy: P::default(),
            input,
            output,
            settings,
            ctx: NalContext::default(),
            emitter: Emitter::default(),
            frame_out: Vec::new(),
            copied: 0,
            current_off: None,
            marker: false,
            last_report: None,
            aud_insert: true,
            au_has_sps: false,
            au_has_pps: false,
        }
    }

    fn input_format(&self) -> StreamFormat {
        self.input.stream_format_or_default()
    }

    fn output_format_kind(&self) -> StreamFormat {
        self.output.stream_format_or_default()
    }

    fn output_alignment(&self) -> Alignment {
        self.output.alignment_or(Alignment::AccessUnit)
    }

    /// Input buffers hold whole units, a unit cut at the buffer end is corrupt.
    fn aligned_input(&self) -> bool {
        matches!(self.input.alignment, Some(Alignment::Unit | Alignment::AccessUnit))
    }

    /// Input delimiters are copied as they are.
    fn passthrough(&self) -> bool {
        let format = self.input_format();
        format == self.output_format_kind()
            && (!format.is_packetized() || self.input.nal_length_size == self.output.nal_length_size)
    }

    fn reset_frame(&mut self) {
        self.ctx.au.reset_frame();
        self.frame_out.clear();
        self.copied = 0;
        self.current_off = None;
        self.marker = false;
    }

    fn more(&mut self, current_off: usize) -> Step {
        if current_off > 0 {
            self.current_off = Some(current_off);
        }
        Step::More
    }

    /// A broken unit at the frame start is skipped, later ones end the frame
    /// and are dealt with in the next round.
    fn broken(&self, data_len: usize, current_off: usize, extent: Option<NalExtent>) -> Step {
        tracing::warn!(current_off, "broken bit stream");
        if current_off == 0 {
            Step::Skip(extent.map_or(data_len, |extent| extent.end()))
        } else {
            Step::End(extent.map_or(current_off, |extent| extent.sc_offset))
        }
    }

    /// Whether the unit starts a new access unit while a picture is open.
    fn collect(&mut self, unit: &SyntaxUnit, nal: &[u8]) -> bool {
        let complete = self.ctx.au.picture_start && self.policy.starts_new_access_unit(unit, nal);
        tracing::trace!(kind = %unit.kind, picture_start = self.ctx.au.picture_start, complete, "collecting unit");

        if complete {
            self.ctx.au.picture_start = false;
        }
        complete
    }

    fn append(&mut self, data: &[u8], extent: NalExtent) -> Result<(), ParseError> {
        if self.passthrough() {
            self.frame_out.extend_from_slice(&data[self.copied..extent.end()]);
            self.copied = extent.end();
            Ok(())
        } else {
            let format = self.output_format_kind();
            write_nal(&mut self.frame_out, &data[extent.offset..extent.end()], format, self.output.nal_length_size)
        }
    }

    fn consume_unit(&mut self, data: &[u8], extent: NalExtent, current_off: usize) -> Result<Consumed, ParseError> {
        let nal = &data[extent.offset..extent.end()];
        let unit = match self.policy.parse_unit(nal) {
            Ok(unit) => unit,
            Err(err) => {
                tracing::warn!(%err, offset = extent.offset, size = extent.size, "invalid nal unit header");
                return Ok(Consumed::Stop(self.broken(data.len(), current_off, Some(extent))));
            }
        };

        let starts_access_unit = self.collect(&unit, nal);
        if starts_access_unit && current_off > 0 {
            self.marker = true;
            return Ok(Consumed::Boundary);
        }

        self.ctx.out_pos = self.frame_out.len();
        if let Err(err) = self.policy.process(&mut self.ctx, &unit, nal) {
            if !err.is_recoverable() {
                return Err(err);
            }

            tracing::warn!(%err, kind = %unit.kind, size = extent.size, "dropping nal unit");
            return Ok(Consumed::Stop(Step::Skip(extent.end())));
        }

        if starts_access_unit {
            self.aud_insert = true;
            self.au_has_sps = false;
            self.au_has_pps = false;
        }

        self.append(data, extent)?;

        Ok(Consumed::Appended {
            closes: self.policy.closes_access_unit(&unit),
        })
    }

    /// Decides how the loop goes on after a unit ending at `end` was appended.
    fn after_unit(
        &mut self,
        end: usize,
        closes: bool,
        nonext: bool,
        drain: bool,
        frame: &FrameContext,
    ) -> Option<Step> {
        if closes {
            self.marker = true;
            return Some(Step::End(end));
        }

        if nonext {
            if frame.flags.marker || self.input.alignment == Some(Alignment::AccessUnit) {
                self.marker = true;
                return Some(Step::End(end));
            }

            if drain || self.output_alignment() == Alignment::Unit {
                return Some(Step::End(end));
            }

            return Some(self.more(end));
        }

        if self.output_alignment() == Alignment::Unit {
            return Some(Step::End(end));
        }

        None
    }

    fn frame_byte_stream(&mut self, data: &[u8], frame: &FrameContext) -> Result<Step, ParseError> {
        if data.len() < 4 {
            return Ok(Step::Skip(1));
        }

        let aligned = self.aligned_input();
        let drain = frame.flags.draining || self.input.alignment == Some(Alignment::AccessUnit);

        let mut current_off = match self.current_off {
            Some(current_off) => current_off,
            None => match scan_byte_stream(data, 0) {
                Scan::Unit(extent) | Scan::Unterminated(extent) if extent.sc_offset > 0 => {
                    return Ok(Step::Skip(extent.sc_offset));
                }
                Scan::Unit(_) | Scan::Unterminated(_) => 0,
                Scan::NoUnit if aligned => return Ok(Step::Skip(data.len())),
                // a start code cut at the end, with its leading zero, is kept
                Scan::NoUnit => match keep_start_code_prefix(data) {
                    0 => return Ok(Step::More),
                    skip => return Ok(Step::Skip(skip)),
                },
            },
        };

        if drain && current_off == data.len() {
            tracing::debug!("draining with no new data");
            return Ok(Step::End(current_off));
        }

        loop {
            let mut nonext = false;
            let extent = match scan_byte_stream(data, current_off) {
                Scan::Unit(extent) => extent,
                Scan::NoUnit if aligned => return Ok(self.broken(data.len(), current_off, None)),
                Scan::NoUnit => return Ok(self.more(current_off)),
                Scan::Unterminated(extent) if aligned => {
                    nonext = true;
                    extent
                }
                Scan::Unterminated(extent) if drain => {
                    tracing::debug!(size = extent.size, "draining, accepting unterminated nal unit");
                    if extent.size < 2 {
                        return Ok(self.broken(data.len(), current_off, Some(extent)));
                    }
                    nonext = true;
                    extent
                }
                Scan::Unterminated(extent) => {
                    tracing::trace!(offset = extent.offset, "nal unit not terminated yet");
                    return Ok(self.more(current_off));
                }
            };

            let closes = match self.consume_unit(data, extent, current_off)? {
                Consumed::Boundary => return Ok(Step::End(extent.sc_offset)),
                Consumed::Stop(step) => return Ok(step),
                Consumed::Appended { closes } => closes,
            };

            if let Some(step) = self.after_unit(extent.end(), closes, nonext, drain, frame) {
                return Ok(step);
            }

            current_off = extent.end();
            if data.len() - current_off < 4 {
                if drain {
                    return Ok(Step::End(current_off));
                }
                return Ok(self.more(current_off));
            }
        }
    }

    fn frame_packetized(&mut self, data: &[u8], frame: &FrameContext) -> Result<Step, ParseError> {
        let aligned = self.aligned_input();
        let drain = frame.flags.draining || self.input.alignment == Some(Alignment::AccessUnit);
        let nal_length_size = self.input.nal_length_size;
        let mut current_off = self.current_off.unwrap_or(0);

        loop {
            if current_off == data.len() {
                if drain && current_off > 0 {
                    return Ok(Step::End(current_off));
                }
                return Ok(self.more(current_off));
            }

            let scan = match scan_length_prefixed(data, current_off, nal_length_size) {
                Ok(scan) => scan,
                Err(err) => {
                    tracing::warn!(%err, "unreadable nal length");
                    return Ok(self.broken(data.len(), current_off, None));
                }
            };

            let extent = match scan {
                Scan::Unit(extent) => extent,
                Scan::Unterminated(extent) if aligned || drain => {
                    tracing::warn!(
                        declared = extent.size,
                        available = data.len() - extent.offset,
                        "nal unit length exceeds the input"
                    );
                    return Ok(self.broken(data.len(), current_off, None));
                }
                Scan::NoUnit if aligned || drain => return Ok(self.broken(data.len(), current_off, None)),
                Scan::Unterminated(_) | Scan::NoUnit => return Ok(self.more(current_off)),
            };

            let nonext = extent.end() == data.len();
            let closes = match self.consume_unit(data, extent, current_off)? {
                Consumed::Boundary => return Ok(Step::End(extent.sc_offset)),
                Consumed::Stop(step) => return Ok(step),
                Consumed::Appended { closes } => closes,
            };

            if let Some(step) = self.after_unit(extent.end(), closes, nonext, drain, frame) {
                return Ok(step);
            }

            current_off = extent.end();
        }
    }

    /// Whether parameter sets are due on the keyframe at `now`.
    fn wants_parameter_sets(&self, now: Option<u64>) -> bool {
        if self.ctx.push.requested || self.settings.every_keyframe() {
            return true;
        }

        let Some(interval) = self.settings.interval_ns() else {
            return false;
        };

        match (self.last_report, now) {
            (None, _) => true,
            (Some(last), Some(now)) => now.saturating_sub(last) >= interval,
            (Some(_), None) => false,
        }
    }

    fn parameter_set_units(&self) -> Result<Vec<Vec<u8>>, ParseError> {
        let format = self.output_format_kind();
        self.policy
            .parameter_sets()
            .iter()
            .map(|set| {
                let mut nal = Vec::with_capacity(set.len() + 4);
                write_nal(&mut nal, set, format, self.output.nal_length_size)?;
                Ok(nal)
            })
            .collect()
    }

    fn finish_frame(
        &mut self,
        data: &[u8],
        framesize: usize,
        frame: &FrameContext,
    ) -> Result<Vec<OutputUnit>, ParseError> {
        if self.passthrough() && framesize > self.copied {
            self.frame_out.extend_from_slice(&data[self.copied..framesize]);
        }

        let mut payload = std::mem::take(&mut self.frame_out);
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let au_output = self.output_alignment() == Alignment::AccessUnit;
        let format = self.output_format_kind();
        let au = &self.ctx.au;
        let keyframe = au.keyframe;

        self.au_has_sps |= au.have_sps;
        self.au_has_pps |= au.have_pps;

        let mut timestamps = frame.timestamps;
        if timestamps.duration.is_none() && (au_output || au.frame_start) {
            timestamps.duration = self
                .policy
                .frame_duration(au)
                .or_else(|| self.ctx.info.framerate.map(|rate| rate.period_ns(1)));
        }

        let mut flags = OutputFlags::empty();
        if !keyframe {
            flags |= OutputFlags::DELTA_UNIT;
        }
        if au.header {
            flags |= OutputFlags::HEADER;
        }
        if self.marker || au_output {
            flags |= OutputFlags::MARKER;
        }
        if au.field_pic {
            flags |= OutputFlags::INTERLACED;
        }

        let mut idr_pos = au.idr_pos;
        let have_aud = au.have_aud;

        self.ctx.sei.apply(&mut self.ctx.info);

        let mut units = Vec::new();

        let aud_due = std::mem::take(&mut self.aud_insert);
        if P::CODEC == Codec::H264 && self.settings.insert_aud && format == StreamFormat::ByteStream && !have_aud {
            if au_output {
                payload = splice(&payload, 0, &AU_DELIMITER);
                idr_pos = idr_pos.map(|pos| pos + AU_DELIMITER.len());
            } else if aud_due {
                tracing::trace!("inserting access unit delimiter");
                units.push(self.emitter.emit(
                    Bytes::from_static(&AU_DELIMITER),
                    Timestamps { duration: None, ..timestamps },
                    OutputFlags::DELTA_UNIT,
                    &self.output,
                    &self.ctx.info,
                ));
            }
        }

        let now = timestamps.pts.or(timestamps.dts);
        if keyframe && format.parameter_sets_in_band() && self.wants_parameter_sets(now) {
            if self.au_has_sps && self.au_has_pps {
                tracing::trace!("access unit carries its own parameter sets");
            } else {
                let sets = self.parameter_set_units()?;
                tracing::debug!(count = sets.len(), pts = ?timestamps.pts, "inserting parameter sets");

                if au_output {
                    let at = idr_pos.unwrap_or(0);
                    payload = splice(&payload, at, &sets.concat());
                    flags |= OutputFlags::HEADER;
                } else {
                    for set in sets {
                        units.push(self.emitter.emit(
                            Bytes::from(set),
                            Timestamps { duration: None, ..timestamps },
                            OutputFlags::HEADER,
                            &self.output,
                            &self.ctx.info,
                        ));
                    }
                }
            }

            self.last_report = Some(now.unwrap_or(0));
            self.ctx.push.done();
        }

        tracing::trace!(size = payload.len(), keyframe, marker = self.marker, "finished frame");
        units.push(self.emitter.emit(Bytes::from(payload), timestamps, flags, &self.output, &self.ctx.info));

        if au_output || self.marker {
            self.au_has_sps = false;
            self.au_has_pps = false;
        }

        Ok(units)
    }
}

impl<P: NalCodecPolicy> ElementaryParser for NalParser<P> {
    fn handle_frame(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        if frame.flags.discont {
            self.emitter.mark_discont();
        }

        if frame.flags.new_frame {
            self.reset_frame();
        }

        let step = if self.input_format().is_packetized() {
            self.frame_packetized(data, frame)?
        } else {
            self.frame_byte_stream(data, frame)?
        };

        match step {
            Step::More => Ok(Delivery::need_more()),
            Step::Skip(skip) => {
                tracing::debug!(skip, "skipping input");
                self.reset_frame();
                Ok(Delivery::skip(skip))
            }
            Step::End(framesize) => {
                let units = self.finish_frame(data, framesize, frame)?;
                self.reset_frame();
                Ok(Delivery::flush(framesize, units))
            }
        }
    }

    fn min_unit_size(&self) -> usize {
        if self.input_format().is_packetized() {
            self.input.nal_length_size as usize + P::HEADER_LEN
        } else {
            3 + P::HEADER_LEN
        }
    }

    fn output_format(&self) -> &FormatDescriptor {
        &self.output
    }

    fn set_output_format(&mut self, output: FormatDescriptor) {
        if self.output != output {
            tracing::debug!(from = %self.output, to = %output, "output format changed");
            self.output = output;
            self.emitter.invalidate_caps();
        }
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.ctx.info
    }

    fn request_key_unit(&mut self) {
        tracing::debug!("key unit requested, parameter sets go out with the next keyframe");
        self.ctx.push.request();
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::codec::H264Policy;
    use crate::reassembler::{Action, DeliverFlags};

    const SPS: [u8; 14] = [
        0x67, 0x42, 0xc0, 0x1f, 0x8c, 0x8d, 0x40, 0x50, 0x1e, 0x90, 0x0f, 0x08, 0x84, 0x6a,
    ];
    const PPS: [u8; 4] = [0x68, 0xce, 0x3c, 0x80];
    const IDR: [u8; 4] = [0x65, 0x88, 0x84, 0x21];
    /// P slice with `first_mb_in_slice` 0.
    const P_SLICE: [u8; 4] = [0x41, 0x9a, 0x00, 0x06];

    fn annexb(nals: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for nal in nals {
            out.extend_from_slice(&[0, 0, 0, 1]);
            out.extend_from_slice(nal);
        }
        out
    }

    fn parser(input: FormatDescriptor, output: FormatDescriptor, settings: ParserSettings) -> NalParser<H264Policy> {
        NalParser::new(input, output, settings)
    }

    fn byte_stream(alignment: Option<Alignment>) -> FormatDescriptor {
        let format = FormatDescriptor::new(Codec::H264).with_stream_format(StreamFormat::ByteStream);
        match alignment {
            Some(alignment) => format.with_alignment(alignment),
            None => format,
        }
    }

    fn frame(new_frame: bool, draining: bool) -> FrameContext {
        FrameContext {
            timestamps: Timestamps::NONE,
            flags: DeliverFlags {
                new_frame,
                draining,
                ..Default::default()
            },
        }
    }

    /// Feeds `data` until the parser asks for more.
    fn drive(parser: &mut NalParser<H264Policy>, mut data: &[u8], draining: bool) -> (Vec<OutputUnit>, usize) {
        let mut units = Vec::new();
        let mut consumed = 0;
        while !data.is_empty() {
            let delivery = parser.handle_frame(data, &frame(true, draining)).unwrap();
            match delivery.action {
                Action::Flush(out) => units.extend(out),
                Action::Skip(_) => {}
                Action::NeedMore => break,
            }
            data = &data[delivery.consumed..];
            consumed += delivery.consumed;
        }
        (units, consumed)
    }

    #[test]
    fn test_parameter_sets_and_idr_one_unit() {
        let input = annexb(&[&SPS, &PPS, &IDR]);
        let mut parser = parser(
            byte_stream(Some(Alignment::AccessUnit)),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings::default(),
        );

        let (units, consumed) = drive(&mut parser, &input, false);
        assert_eq!(consumed, input.len());
        assert_eq!(units.len(), 1);

        let unit = &units[0];
        assert_eq!(unit.data, Bytes::from(input));
        assert!(unit.is_keyframe());
        assert_eq!(
            unit.flags,
            OutputFlags::DISCONT | OutputFlags::HEADER | OutputFlags::MARKER
        );

        let caps = unit.caps.as_ref().unwrap();
        assert_eq!((caps.info.width, caps.info.height), (640, 480));
        assert_eq!(caps.format.alignment, Some(Alignment::AccessUnit));
    }

    #[test]
    fn test_access_unit_boundary() {
        let input = annexb(&[&SPS, &PPS, &IDR, &P_SLICE]);
        let mut parser = parser(
            byte_stream(None),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings::default(),
        );

        // the P slice is not terminated, nothing can be decided
        let (units, consumed) = drive(&mut parser, &input, false);
        assert!(units.is_empty());
        assert_eq!(consumed, 0);

        let (units, consumed) = drive(&mut parser, &input, true);
        assert_eq!(consumed, input.len());
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].data.as_ref(), annexb(&[&SPS, &PPS, &IDR]).as_slice());
        assert!(units[0].is_keyframe());
        assert!(units[0].flags.contains(OutputFlags::MARKER));

        assert_eq!(units[1].data.as_ref(), annexb(&[&P_SLICE]).as_slice());
        assert!(!units[1].is_keyframe());
        assert!(!units[1].flags.contains(OutputFlags::HEADER));
        assert_eq!(units[1].caps, None);
    }

    #[test]
    fn test_convert_to_avc() {
        let input = annexb(&[&SPS, &PPS, &IDR]);
        let mut parser = parser(
            byte_stream(Some(Alignment::AccessUnit)),
            FormatDescriptor::new(Codec::H264)
                .with_stream_format(StreamFormat::Avc3)
                .with_alignment(Alignment::AccessUnit)
                .with_nal_length_size(2),
            ParserSettings::default(),
        );

        let (units, _) = drive(&mut parser, &input, false);
        assert_eq!(units.len(), 1);

        let mut expected = vec![0, 14];
        expected.extend_from_slice(&SPS);
        expected.extend_from_slice(&[0, 4]);
        expected.extend_from_slice(&PPS);
        expected.extend_from_slice(&[0, 4]);
        expected.extend_from_slice(&IDR);
        assert_eq!(units[0].data.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_unit_output_with_aud() {
        let input = annexb(&[&SPS, &PPS, &IDR]);
        let mut parser = parser(
            byte_stream(Some(Alignment::AccessUnit)),
            byte_stream(Some(Alignment::Unit)),
            ParserSettings {
                insert_aud: true,
                ..Default::default()
            },
        );

        let (units, consumed) = drive(&mut parser, &input, false);
        assert_eq!(consumed, input.len());

        let data: Vec<&[u8]> = units.iter().map(|unit| unit.data.as_ref()).collect();
        let expected = [
            AU_DELIMITER.to_vec(),
            annexb(&[&SPS]),
            annexb(&[&PPS]),
            annexb(&[&IDR]),
        ];
        assert_eq!(data, expected.iter().map(Vec::as_slice).collect::<Vec<_>>());

        assert!(units[1].flags.contains(OutputFlags::HEADER));
        assert!(!units[1].is_keyframe());
        assert!(units[3].is_keyframe());
        assert!(units[3].flags.contains(OutputFlags::MARKER));
    }

    #[test]
    fn test_parameter_sets_before_every_keyframe() {
        let mut parser = parser(
            byte_stream(Some(Alignment::AccessUnit)),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings {
                config_interval: -1,
                ..Default::default()
            },
        );

        let first = annexb(&[&SPS, &PPS, &IDR]);
        let (units, _) = drive(&mut parser, &first, false);
        assert_eq!(units[0].data.as_ref(), first.as_slice());

        let second = annexb(&[&IDR]);
        let (units, _) = drive(&mut parser, &second, false);
        assert_eq!(units[0].data.as_ref(), first.as_slice());
        assert!(units[0].flags.contains(OutputFlags::HEADER));

        // no insertion in front of delta units
        let third = annexb(&[&P_SLICE]);
        let (units, _) = drive(&mut parser, &third, false);
        assert_eq!(units[0].data.as_ref(), third.as_slice());
    }

    #[test]
    fn test_key_unit_request() {
        let mut parser = parser(
            byte_stream(Some(Alignment::AccessUnit)),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings::default(),
        );

        drive(&mut parser, &annexb(&[&SPS, &PPS, &IDR]), false);

        let idr = annexb(&[&IDR]);
        let (units, _) = drive(&mut parser, &idr, false);
        assert_eq!(units[0].data.as_ref(), idr.as_slice());

        parser.request_key_unit();
        let (units, _) = drive(&mut parser, &idr, false);
        assert_eq!(units[0].data.as_ref(), annexb(&[&SPS, &PPS, &IDR]).as_slice());

        // served once
        let (units, _) = drive(&mut parser, &idr, false);
        assert_eq!(units[0].data.as_ref(), idr.as_slice());
    }

    #[test]
    fn test_truncated_length_prefixed() {
        let mut parser = parser(
            FormatDescriptor::new(Codec::H264).with_stream_format(StreamFormat::Avc3),
            byte_stream(Some(Alignment::Unit)),
            ParserSettings::default(),
        );

        let mut input = vec![0, 0, 0, 14];
        input.extend_from_slice(&SPS);

        let delivery = parser.handle_frame(&input[..10], &frame(true, false)).unwrap();
        assert_eq!(delivery.consumed, 0);
        assert!(matches!(delivery.action, Action::NeedMore));

        let delivery = parser.handle_frame(&input, &frame(false, false)).unwrap();
        assert_eq!(delivery.consumed, input.len());
        let Action::Flush(units) = delivery.action else {
            panic!("expected a flush");
        };
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].data.as_ref(), annexb(&[&SPS]).as_slice());
    }

    #[test]
    fn test_slice_before_parameter_sets_is_skipped() {
        let input = annexb(&[&IDR, &SPS]);
        let mut parser = parser(
            byte_stream(None),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings::default(),
        );

        let delivery = parser.handle_frame(&input, &frame(true, false)).unwrap();
        assert_eq!(delivery.consumed, 8);
        assert!(matches!(delivery.action, Action::Skip(8)));

        let delivery = parser.handle_frame(&input[8..], &frame(true, false)).unwrap();
        assert!(matches!(delivery.action, Action::NeedMore));
    }

    #[test]
    fn test_leading_garbage() {
        let mut input = vec![0xde, 0xad];
        input.extend_from_slice(&annexb(&[&SPS]));
        let mut parser = parser(
            byte_stream(None),
            byte_stream(Some(Alignment::AccessUnit)),
            ParserSettings::default(),
        );

        let delivery = parser.handle_frame(&input, &frame(true, false)).unwrap();
        assert!(matches!(delivery.action, Action::Skip(2)));
    }
}
