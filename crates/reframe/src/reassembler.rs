//! The host side of the state machine: buffering input, handing it to the
//! codec parser one delivery at a time and applying what the parser decided.

use std::collections::VecDeque;
use std::fmt;

use bitflags::bitflags;
use bytes::{Buf, BytesMut};

use crate::av1::Av1Parser;
use crate::cache::StreamInfo;
use crate::codec::{H264Policy, H265Policy, H266Policy};
use crate::emit::{OutputUnit, Timestamps};
use crate::error::ParseError;
use crate::format::{Codec, FormatDescriptor, StreamFormat};
use crate::nal::NalParser;
use crate::negotiate::negotiate;
use crate::settings::ParserSettings;

bitflags! {
    /// Flags of a pushed input chunk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u8 {
        /// The chunk does not continue the previous one.
        const DISCONT = 1 << 0;
        /// An access unit ends with the chunk.
        const MARKER = 1 << 1;
    }
}

/// Metadata of a pushed input chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputMeta {
    /// Timestamps of the first unit starting in the chunk.
    pub timestamps: Timestamps,
    /// Chunk flags.
    pub flags: InputFlags,
}

impl InputMeta {
    /// Metadata with only timestamps.
    pub const fn new(timestamps: Timestamps) -> Self {
        Self {
            timestamps,
            flags: InputFlags::empty(),
        }
    }

    /// Adds flags.
    pub const fn with_flags(mut self, flags: InputFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }
}

/// Flags of a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliverFlags {
    /// The data starts a new output unit, anything collected earlier is dropped.
    ///
    /// Cleared when the previous delivery asked for more data, the data then
    /// starts with the same bytes as before.
    pub new_frame: bool,
    /// The data follows a discontinuity.
    pub discont: bool,
    /// The stream ends, the end of the data closes the output unit.
    pub draining: bool,
    /// An access unit ends with the data.
    pub marker: bool,
}

/// What the parser gets along with the data of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    /// Timestamps for the output unit starting at the front of the data.
    pub timestamps: Timestamps,
    /// Delivery flags.
    pub flags: DeliverFlags,
}

/// What the caller has to do after a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The consumed bytes were turned into these units, possibly none.
    Flush(Vec<OutputUnit>),
    /// Deliver the same bytes again once more data arrived.
    NeedMore,
    /// Drop this many bytes from the front of the data.
    Skip(usize),
}

/// Result of a single delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Bytes to drop from the front of the data.
    pub consumed: usize,
    /// The decision.
    pub action: Action,
}

impl Delivery {
    pub(crate) const fn need_more() -> Self {
        Self {
            consumed: 0,
            action: Action::NeedMore,
        }
    }

    pub(crate) const fn skip(skip: usize) -> Self {
        Self {
            consumed: skip,
            action: Action::Skip(skip),
        }
    }

    pub(crate) const fn flush(consumed: usize, units: Vec<OutputUnit>) -> Self {
        Self {
            consumed,
            action: Action::Flush(units),
        }
    }
}

/// A codec state machine behind the [`Reassembler`].
pub(crate) trait ElementaryParser: fmt::Debug {
    /// Looks at `data` from its first byte and decides what to do with it.
    fn handle_frame(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError>;

    /// The parser is not asked before this many bytes are buffered.
    fn min_unit_size(&self) -> usize;

    fn output_format(&self) -> &FormatDescriptor;

    fn set_output_format(&mut self, output: FormatDescriptor);

    fn stream_info(&self) -> &StreamInfo;

    fn request_key_unit(&mut self);
}

/// A pushed chunk still referenced by buffered bytes.
#[derive(Debug, Clone, Copy)]
struct PendingInput {
    /// Stream offset of the first byte.
    offset: u64,
    timestamps: Timestamps,
    marker: bool,
    /// The timestamps went to an output unit.
    used: bool,
}

/// Builds a [`Reassembler`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ReassemblerBuilder {
    codec: Codec,
    input: Option<FormatDescriptor>,
    downstream: Vec<FormatDescriptor>,
    settings: ParserSettings,
}

impl ReassemblerBuilder {
    /// The format of the pushed data. Defaults to the codec with nothing else known.
    pub const fn input_format(mut self, input: FormatDescriptor) -> Self {
        self.input = Some(input);
        self
    }

    /// The formats downstream accepts, in order of preference.
    pub fn downstream(mut self, downstream: impl IntoIterator<Item = FormatDescriptor>) -> Self {
        self.downstream = downstream.into_iter().collect();
        self
    }

    /// Parser settings.
    pub const fn settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates the input format and negotiates the output format.
    pub fn build(self) -> Result<Reassembler, ParseError> {
        let mut input = self.input.unwrap_or(FormatDescriptor::new(self.codec));
        if input.codec != self.codec {
            return Err(ParseError::conflict(format!(
                "input format {input} does not match codec {}",
                self.codec
            )));
        }

        // without a declaration NAL input is searched for start codes, AV1 input is sniffed
        if input.codec.is_nal() && input.stream_format.is_none() {
            input.stream_format = Some(StreamFormat::ByteStream);
        }

        let output = negotiate(&input, &self.downstream)?;
        let settings = self.settings;

        let parser: Box<dyn ElementaryParser + Send> = match self.codec {
            Codec::H264 => Box::new(NalParser::<H264Policy>::new(input, output, settings)),
            Codec::H265 => Box::new(NalParser::<H265Policy>::new(input, output, settings)),
            Codec::H266 => Box::new(NalParser::<H266Policy>::new(input, output, settings)),
            Codec::Av1 => Box::new(Av1Parser::new(input, output)),
        };

        Ok(Reassembler {
            input,
            parser,
            adapter: BytesMut::new(),
            base: 0,
            pending: VecDeque::new(),
            new_frame: true,
            discont: false,
        })
    }
}

/// Reassembles one elementary stream into output units of the negotiated format.
///
/// ```
/// use reframe::{Codec, InputMeta, Reassembler, Timestamps};
///
/// let mut reassembler = Reassembler::builder(Codec::H264).build()?;
/// let mut units = reassembler.push(&[0, 0, 0, 1, 0x09, 0xf0], InputMeta::new(Timestamps::at(0)))?;
/// units.extend(reassembler.finish()?);
/// # Ok::<(), reframe::ParseError>(())
/// ```
#[derive(Debug)]
pub struct Reassembler {
    input: FormatDescriptor,
    parser: Box<dyn ElementaryParser + Send>,
    adapter: BytesMut,
    /// Stream offset of the first buffered byte.
    base: u64,
    pending: VecDeque<PendingInput>,
    new_frame: bool,
    discont: bool,
}

impl Reassembler {
    /// Starts building a reassembler for `codec`.
    pub fn builder(codec: Codec) -> ReassemblerBuilder {
        ReassemblerBuilder {
            codec,
            input: None,
            downstream: Vec::new(),
            settings: ParserSettings::default(),
        }
    }

    /// The declared input format.
    pub const fn input_format(&self) -> &FormatDescriptor {
        &self.input
    }

    /// The negotiated output format.
    pub fn output_format(&self) -> &FormatDescriptor {
        self.parser.output_format()
    }

    /// What is known about the stream so far.
    pub fn stream_info(&self) -> &StreamInfo {
        self.parser.stream_info()
    }

    /// The next keyframe goes out with the parameter sets in front of it.
    pub fn request_key_unit(&mut self) {
        self.parser.request_key_unit();
    }

    /// Negotiates again against a changed downstream.
    pub fn renegotiate(&mut self, downstream: &[FormatDescriptor]) -> Result<FormatDescriptor, ParseError> {
        let output = negotiate(&self.input, downstream)?;
        self.parser.set_output_format(output);
        Ok(output)
    }

    /// A single step on caller-owned data, without any buffering.
    pub fn deliver(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        self.parser.handle_frame(data, frame)
    }

    /// Buffers `data` and returns the output units it completed.
    pub fn push(&mut self, data: &[u8], meta: InputMeta) -> Result<Vec<OutputUnit>, ParseError> {
        let mut units = Vec::new();

        if meta.flags.contains(InputFlags::DISCONT) {
            if !self.adapter.is_empty() {
                tracing::debug!(buffered = self.adapter.len(), "discontinuity, draining");
                self.process(&mut units, true)?;
            }
            self.discont = true;
        }

        self.pending.push_back(PendingInput {
            offset: self.base + self.adapter.len() as u64,
            timestamps: meta.timestamps,
            marker: meta.flags.contains(InputFlags::MARKER),
            used: false,
        });
        self.adapter.extend_from_slice(data);

        self.process(&mut units, false)?;
        Ok(units)
    }

    /// Flushes whatever is buffered as the end of the stream.
    pub fn finish(&mut self) -> Result<Vec<OutputUnit>, ParseError> {
        let mut units = Vec::new();
        self.process(&mut units, true)?;
        Ok(units)
    }

    fn process(&mut self, units: &mut Vec<OutputUnit>, draining: bool) -> Result<(), ParseError> {
        let min_unit_size = self.parser.min_unit_size();

        while !self.adapter.is_empty() && (draining || self.adapter.len() >= min_unit_size) {
            let (timestamps, marker) = self.frame_input();
            let frame = FrameContext {
                timestamps,
                flags: DeliverFlags {
                    new_frame: self.new_frame,
                    discont: self.discont,
                    draining,
                    marker,
                },
            };

            let delivery = self.parser.handle_frame(&self.adapter, &frame)?;
            self.discont = false;
            let stalled = delivery.consumed == 0 && !matches!(delivery.action, Action::NeedMore);

            match delivery.action {
                Action::NeedMore if draining => {
                    tracing::warn!(dropped = self.adapter.len(), "stream ended inside a unit");
                    let len = self.adapter.len();
                    self.advance(len);
                    self.new_frame = true;
                }
                Action::NeedMore => {
                    self.new_frame = false;
                    break;
                }
                Action::Skip(skip) => {
                    self.advance(skip);
                    self.new_frame = true;
                }
                Action::Flush(flushed) => {
                    if delivery.consumed > 0
                        && let Some(input) = self.pending.iter_mut().rev().find(|input| input.offset <= self.base)
                    {
                        input.used = true;
                    }
                    units.extend(flushed);
                    self.advance(delivery.consumed);
                    self.new_frame = true;
                }
            }

            if stalled {
                tracing::warn!("parser made no progress, dropping buffered input");
                let len = self.adapter.len();
                self.advance(len);
            }
        }

        Ok(())
    }

    /// Timestamps for a unit starting at the front of the buffer, taken once
    /// per pushed chunk, and whether the buffered data ends an access unit.
    fn frame_input(&self) -> (Timestamps, bool) {
        let timestamps = self
            .pending
            .iter()
            .rev()
            .find(|input| input.offset <= self.base)
            .filter(|input| !input.used)
            .map_or(Timestamps::NONE, |input| input.timestamps);
        let marker = self.pending.back().is_some_and(|input| input.marker);
        (timestamps, marker)
    }

    fn advance(&mut self, n: usize) {
        let n = n.min(self.adapter.len());
        self.adapter.advance(n);
        self.base += n as u64;

        while self.pending.len() > 1 && self.pending[1].offset <= self.base {
            self.pending.pop_front();
        }
        if self.adapter.is_empty() {
            self.pending.clear();
        }
    }
}
