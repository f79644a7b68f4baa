//! The AV1 state machine.
//!
//! OBUs are located in the low overhead bitstream format or in annex B,
//! classified against the sequence header and the reference frame state and
//! collected into OBU, frame or temporal unit sized output units.

use std::io;

use bytes::Bytes;
use reframe_av1::{
    FrameHeader, FrameType, ObuHeader, ObuType, ReferenceFrames, SequenceHeaderObu, TileGroup, TileInfo,
};
use reframe_bytes_util::decode_leb128;

use crate::cache::{ChromaFormat, Colorimetry, Fraction, StreamInfo};
use crate::convert::{obu_from_annexb, obu_to_annexb, wrap_leb128};
use crate::emit::{Emitter, OutputFlags, OutputUnit};
use crate::error::ParseError;
use crate::format::{Alignment, FormatDescriptor, StreamFormat};
use crate::reassembler::{Delivery, ElementaryParser, FrameContext};
use crate::state::Lookahead;
use crate::unit::{SyntaxUnit, UnitKind};

/// `color_primaries`, `transfer_characteristics` and `matrix_coefficients` when not signalled.
const COLOR_UNSPECIFIED: u8 = 2;

/// `seq_level_idx` of operating points without level constraints.
const LEVEL_MAX_PARAMETERS: u8 = 31;

/// A located OBU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Obu {
    /// `offset` is the annex B `obu_length` or the header, `end()` the end of the payload.
    pub unit: SyntaxUnit,
    pub header: ObuHeader,
    /// Start of the payload.
    pub payload: usize,
}

impl Obu {
    const fn rebased(mut self, by: usize) -> Self {
        self.unit = self.unit.rebased(by);
        self.payload -= by;
        self
    }
}

/// What the locator found at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Identified {
    Obu(Obu),
    /// The OBU continues past the data.
    NeedMore,
    /// The OBU is outside the selected operating point, it ends at this offset.
    Drop(usize),
}

/// Bounds of one OBU inside an annex B temporal unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnnexbObu {
    /// Start of `obu_length`.
    offset: usize,
    header_offset: usize,
    end: usize,
}

/// The syntax carried by a classified OBU.
#[derive(Debug, Clone)]
enum ParsedObu {
    TemporalDelimiter,
    SequenceHeader,
    Frame { header: Box<FrameHeader>, redundant: bool },
    TileGroup(TileGroup),
    /// Nothing to track.
    Skipped,
}

#[derive(Debug, Clone)]
struct Classified {
    parsed: ParsedObu,
    /// The OBU opens a temporal unit.
    new_temporal_unit: bool,
}

/// An OBU whose temporal unit starts after the one being assembled.
#[derive(Debug, Clone)]
struct DeferredObu {
    obu: Obu,
    parsed: ParsedObu,
}

/// Layer ids of the last shown frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShownFrame {
    temporal_id: u8,
    spatial_id: u8,
}

/// Decides where temporal units start.
///
/// A temporal delimiter always opens one. Without delimiters a shown frame
/// opens one when its temporal id differs from the last shown frame, when it
/// is the second shown frame and the stream has no scalability, or when it
/// repeats the layer ids of the last shown frame outside of a frame.
#[derive(Debug, Default)]
struct TemporalUnitPolicy {
    lookahead: Lookahead<DeferredObu, ShownFrame>,
    /// Frame header seen, last tile group not yet.
    within_one_frame: bool,
}

impl TemporalUnitPolicy {
    fn reset(&mut self) {
        self.lookahead.clear();
        self.within_one_frame = false;
    }

    fn starts_new_temporal_unit(&mut self, temporal_id: u8, spatial_id: u8, operating_point_idc: u16) -> bool {
        let new_temporal_unit = self.lookahead.confirmed().is_some_and(|last| {
            last.temporal_id != temporal_id
                || (!self.within_one_frame && (operating_point_idc == 0 || last.spatial_id == spatial_id))
        });

        if new_temporal_unit {
            if self.within_one_frame {
                tracing::warn!(temporal_id, spatial_id, "temporal unit starts inside an incomplete frame");
            }
            self.reset();
        }

        new_temporal_unit
    }

    fn shown(&mut self, temporal_id: u8, spatial_id: u8) {
        self.lookahead.confirm(ShownFrame {
            temporal_id,
            spatial_id,
        });
    }
}

/// Maps an alignment to its aggregation level, annex B is always a temporal unit.
fn level(format: Option<StreamFormat>, alignment: Option<Alignment>) -> Alignment {
    if format == Some(StreamFormat::AnnexB) {
        Alignment::TemporalUnit
    } else {
        alignment.unwrap_or(Alignment::Byte)
    }
}

fn read_size(data: &[u8], pos: usize, limit: usize, what: &str) -> Result<(usize, usize), ParseError> {
    match decode_leb128(&data[pos..limit]) {
        Ok(Some((value, len))) => Ok((value as usize, len)),
        Ok(None) => Err(ParseError::bitstream(format!("truncated {what}"))),
        Err(err) => Err(ParseError::bitstream(format!("{what}: {err}"))),
    }
}

/// Walks the `temporal_unit_size`, `frame_unit_size` and `obu_length` fields of annex B data.
fn split_annexb(data: &[u8]) -> Result<Vec<AnnexbObu>, ParseError> {
    let mut obus = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let (tu_size, len) = read_size(data, pos, data.len(), "temporal_unit_size")?;
        pos += len;
        let tu_end = pos + tu_size;
        if tu_end > data.len() {
            return Err(ParseError::bitstream(format!(
                "temporal unit of {tu_size} bytes exceeds the buffer"
            )));
        }

        while pos < tu_end {
            let (fu_size, len) = read_size(data, pos, tu_end, "frame_unit_size")?;
            pos += len;
            let fu_end = pos + fu_size;
            if fu_end > tu_end {
                return Err(ParseError::bitstream(format!(
                    "frame unit of {fu_size} bytes exceeds its temporal unit"
                )));
            }

            while pos < fu_end {
                let (obu_length, len) = read_size(data, pos, fu_end, "obu_length")?;
                let header_offset = pos + len;
                let end = header_offset + obu_length;
                if end > fu_end {
                    return Err(ParseError::bitstream(format!(
                        "obu of {obu_length} bytes exceeds its frame unit"
                    )));
                }

                if obu_length > 0 {
                    obus.push(AnnexbObu {
                        offset: pos,
                        header_offset,
                        end,
                    });
                }
                pos = end;
            }
        }
    }

    Ok(obus)
}

/// Guesses the stream format of temporal unit aligned input.
///
/// A sequence header or a frame found by walking OBU headers means the low
/// overhead format, a leading leb128 covering exactly the rest of the data
/// means annex B.
fn sniff(data: &[u8]) -> Option<StreamFormat> {
    let mut offset = 0;
    while offset < data.len() {
        let mut cursor = io::Cursor::new(&data[offset..]);
        let Ok(header) = ObuHeader::parse(&mut cursor) else {
            break;
        };
        let Some(size) = header.size else {
            break;
        };

        let payload = offset + cursor.position() as usize;
        let end = payload + size as usize;
        if end > data.len() {
            break;
        }

        match header.obu_type {
            ObuType::SequenceHeader => {
                if SequenceHeaderObu::parse(header, &mut io::Cursor::new(&data[payload..end])).is_ok() {
                    return Some(StreamFormat::Obu);
                }
                break;
            }
            ObuType::FrameHeader | ObuType::Frame | ObuType::RedundantFrameHeader => return Some(StreamFormat::Obu),
            _ => {}
        }

        offset = end;
    }

    if data.len() >= 8
        && let Ok(Some((tu_size, len))) = decode_leb128(data)
        && tu_size > 0
        && tu_size + len as u64 == data.len() as u64
    {
        return Some(StreamFormat::AnnexB);
    }

    None
}

/// Reassembles AV1 streams.
#[derive(Debug)]
pub(crate) struct Av1Parser {
    input: FormatDescriptor,
    output: FormatDescriptor,
    /// The input stream format, `None` until sniffed.
    in_format: Option<StreamFormat>,
    seq: Option<SequenceHeaderObu>,
    refs: ReferenceFrames,
    /// Tile layout of the current frame.
    tile_info: Option<TileInfo>,
    tu: TemporalUnitPolicy,
    highest_spatial_id: u8,
    info: StreamInfo,
    emitter: Emitter,
    /// The output unit being assembled.
    data: Vec<u8>,
    /// The annex B frame unit being assembled.
    frame_unit: Vec<u8>,
    header: bool,
    keyframe: bool,
    show_frame: bool,
    /// Where the OBU walk resumes when more data arrived.
    last_parsed_offset: usize,
}

impl Av1Parser {
    pub fn new(input: FormatDescriptor, output: FormatDescriptor) -> Self {
        let in_format = match (input.stream_format, input.alignment) {
            (Some(format), _) => Some(format),
            (None, Some(Alignment::TemporalUnit)) => None,
            (None, _) => Some(StreamFormat::Obu),
        };
        tracing::debug!(%input, %output, ?in_format, "creating av1 parser");

        Self {
            input,
            output,
            in_format,
            seq: None,
            refs: ReferenceFrames::new(),
            tile_info: None,
            tu: TemporalUnitPolicy::default(),
            highest_spatial_id: 0,
            info: StreamInfo::default(),
            emitter: Emitter::default(),
            data: Vec::new(),
            frame_unit: Vec::new(),
            header: false,
            keyframe: false,
            show_frame: false,
            last_parsed_offset: 0,
        }
    }

    fn input_level(&self) -> Alignment {
        level(self.in_format, self.input.alignment)
    }

    fn output_level(&self) -> Alignment {
        level(self.output.stream_format, Some(self.output.alignment_or(Alignment::TemporalUnit)))
    }

    fn annexb_output(&self) -> bool {
        self.output.stream_format == Some(StreamFormat::AnnexB)
    }

    fn operating_point_idc(&self) -> u16 {
        self.seq.as_ref().map(SequenceHeaderObu::operating_point_idc).unwrap_or_default()
    }

    fn cache_empty(&self) -> bool {
        self.data.is_empty() && self.frame_unit.is_empty()
    }

    fn reset_output(&mut self) {
        self.data.clear();
        self.frame_unit.clear();
        self.last_parsed_offset = 0;
        self.header = false;
        self.keyframe = false;
        self.show_frame = false;
    }

    /// Drops `skip` bytes after a recoverable error.
    fn recover(&mut self, err: ParseError, skip: usize) -> Result<Delivery, ParseError> {
        if !err.is_recoverable() {
            return Err(err);
        }

        tracing::warn!(%err, skip, "dropping av1 data");
        self.tu.reset();
        Ok(Delivery::skip(skip))
    }

    /// Builds the located OBU, or drops it when it is outside the operating point.
    fn locate(&self, header: ObuHeader, offset: usize, header_offset: usize, payload: usize, end: usize) -> Identified {
        let operating_point_idc = self.operating_point_idc();
        if !matches!(header.obu_type, ObuType::SequenceHeader | ObuType::TemporalDelimiter)
            && operating_point_idc != 0
            && let Some(ext) = header.extension_header
        {
            let in_temporal_layer = (operating_point_idc >> ext.temporal_id) & 1 == 1;
            let in_spatial_layer = (operating_point_idc >> (ext.spatial_id + 8)) & 1 == 1;
            if !in_temporal_layer || !in_spatial_layer {
                tracing::trace!(
                    temporal_id = ext.temporal_id,
                    spatial_id = ext.spatial_id,
                    "obu outside the operating point"
                );
                return Identified::Drop(end);
            }
        }

        Identified::Obu(Obu {
            unit: SyntaxUnit {
                kind: UnitKind::Obu(header.obu_type),
                offset,
                header_offset,
                size: end - header_offset,
                temporal_id: header.temporal_id(),
                spatial_id: header.spatial_id(),
                layer_id: 0,
            },
            header,
            payload,
        })
    }

    /// Locates the OBU at `from` in the low overhead bitstream format.
    pub(crate) fn identify(&self, data: &[u8], from: usize) -> Result<Identified, ParseError> {
        let mut cursor = io::Cursor::new(&data[from..]);
        let header = match ObuHeader::parse(&mut cursor) {
            Ok(header) => header,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(Identified::NeedMore),
            Err(err) => return Err(ParseError::bitstream(format!("obu header: {err}"))),
        };

        let Some(size) = header.size else {
            return Err(ParseError::bitstream("obu without obu_size in a low overhead stream"));
        };

        let payload = from + cursor.position() as usize;
        let end = payload + size as usize;
        if end > data.len() {
            return Ok(Identified::NeedMore);
        }

        Ok(self.locate(header, from, from, payload, end))
    }

    fn identify_annexb(&self, data: &[u8], bounds: AnnexbObu) -> Result<Identified, ParseError> {
        let mut cursor = io::Cursor::new(&data[bounds.header_offset..bounds.end]);
        let header =
            ObuHeader::parse(&mut cursor).map_err(|err| ParseError::bitstream(format!("annex b obu header: {err}")))?;

        let payload = bounds.header_offset + cursor.position() as usize;
        if let Some(size) = header.size
            && payload as u64 + size != bounds.end as u64
        {
            return Err(ParseError::bitstream("obu_size and obu_length disagree"));
        }

        Ok(self.locate(header, bounds.offset, bounds.header_offset, payload, bounds.end))
    }

    /// Publishes what the sequence header tells about the stream.
    fn describe(&mut self, seq: &SequenceHeaderObu) {
        let color = &seq.color_config;
        let info = &mut self.info;

        info.width = seq.max_frame_width;
        info.height = seq.max_frame_height;
        info.chroma_format = Some(ChromaFormat::from_subsampling(
            color.mono_chrome,
            color.subsampling_x,
            color.subsampling_y,
        ));
        info.bit_depth_luma = color.bit_depth;
        info.bit_depth_chroma = color.bit_depth;

        let unspecified = color.color_primaries == COLOR_UNSPECIFIED
            && color.transfer_characteristics == COLOR_UNSPECIFIED
            && color.matrix_coefficients == COLOR_UNSPECIFIED;
        info.colorimetry = (!unspecified).then_some(Colorimetry {
            primaries: color.color_primaries,
            transfer: color.transfer_characteristics,
            matrix: color.matrix_coefficients,
            full_range: color.full_color_range,
        });

        info.profile = Some(match seq.seq_profile {
            0 => "main",
            1 => "high",
            _ => "professional",
        });

        let highest = seq
            .operating_points
            .iter()
            .reduce(|best, op| if op.seq_level_idx > best.seq_level_idx { op } else { best });
        info.level = highest
            .filter(|op| op.seq_level_idx != LEVEL_MAX_PARAMETERS)
            .map(|op| format!("{}.{}", 2 + (op.seq_level_idx >> 2), op.seq_level_idx & 3));
        info.tier = highest.map(|op| if op.seq_tier { "high" } else { "main" });

        info.framerate = seq.frame_rate().and_then(|(num, den)| Fraction::new(num, den));
    }

    /// Parses the OBU and decides whether it opens a temporal unit.
    ///
    /// Nothing of the output unit is touched, that is left to [`Self::apply`].
    fn classify(&mut self, obu: &Obu, data: &[u8]) -> Result<Classified, ParseError> {
        let payload = &data[obu.payload..obu.unit.end()];
        let temporal_id = obu.unit.temporal_id;
        let spatial_id = obu.unit.spatial_id;

        let parsed = match obu.header.obu_type {
            ObuType::TemporalDelimiter => ParsedObu::TemporalDelimiter,
            ObuType::SequenceHeader => {
                let seq = SequenceHeaderObu::parse(obu.header, &mut io::Cursor::new(payload))?;
                self.describe(&seq);

                let spatial_layers = (seq.operating_point_idc() >> 8) & 0xf;
                if spatial_layers != 0 {
                    self.highest_spatial_id = (u16::BITS - 1 - spatial_layers.leading_zeros()) as u8;
                }

                tracing::debug!(
                    width = seq.max_frame_width,
                    height = seq.max_frame_height,
                    profile = seq.seq_profile,
                    highest_spatial_id = self.highest_spatial_id,
                    "sequence header"
                );
                self.seq = Some(seq);
                ParsedObu::SequenceHeader
            }
            ObuType::RedundantFrameHeader if self.tu.within_one_frame => ParsedObu::Skipped,
            obu_type @ (ObuType::FrameHeader | ObuType::Frame | ObuType::RedundantFrameHeader) => {
                let redundant = obu_type == ObuType::RedundantFrameHeader;
                let header = match &self.seq {
                    Some(seq) => FrameHeader::parse(
                        &mut io::Cursor::new(payload),
                        seq,
                        &mut self.refs,
                        temporal_id,
                        spatial_id,
                    )
                    .map_err(ParseError::from),
                    None => Err(ParseError::MissingPrecondition("sequence header")),
                };

                match header {
                    Ok(header) => ParsedObu::Frame {
                        header: Box::new(header),
                        redundant,
                    },
                    Err(err) if redundant => {
                        tracing::warn!(%err, "ignoring broken redundant frame header");
                        self.tu.reset();
                        ParsedObu::Skipped
                    }
                    Err(err) => return Err(err),
                }
            }
            ObuType::TileGroup => {
                let tile_info = self.tile_info.ok_or(ParseError::MissingPrecondition("frame header"))?;
                ParsedObu::TileGroup(TileGroup::parse(&mut io::Cursor::new(payload), &tile_info)?)
            }
            ObuType::Metadata | ObuType::TileList | ObuType::Padding => ParsedObu::Skipped,
            obu_type => {
                return Err(ParseError::bitstream(format!("unknown obu type {}", obu_type.0)));
            }
        };

        if spatial_id > self.highest_spatial_id {
            return Err(ParseError::bitstream(format!(
                "spatial_id {spatial_id} above the highest spatial layer {}",
                self.highest_spatial_id
            )));
        }

        let new_temporal_unit = match &parsed {
            ParsedObu::TemporalDelimiter => {
                self.tu.reset();
                true
            }
            ParsedObu::Frame {
                header,
                redundant: false,
            } if header.is_shown() => {
                self.tu
                    .starts_new_temporal_unit(temporal_id, spatial_id, self.operating_point_idc())
            }
            _ => false,
        };

        tracing::trace!(kind = %obu.unit.kind, size = obu.unit.size, new_temporal_unit, "classified obu");

        Ok(Classified {
            parsed,
            new_temporal_unit,
        })
    }

    /// Records a classified OBU as part of the current output unit, returns
    /// true if it completes a frame.
    fn apply(&mut self, obu: &Obu, parsed: ParsedObu) -> bool {
        match parsed {
            ParsedObu::SequenceHeader => {
                self.header = true;
                false
            }
            ParsedObu::Frame { header, .. } => {
                self.show_frame = header.is_shown();
                if self.show_frame {
                    self.tu.shown(obu.unit.temporal_id, obu.unit.spatial_id);
                }
                self.tu.within_one_frame = true;

                if !header.show_existing_frame {
                    self.tile_info = Some(header.tile_info);
                }

                if (!header.show_existing_frame || header.frame_type == FrameType::Key)
                    && let Err(err) = self.refs.update(&header)
                {
                    tracing::warn!(%err, "reference frame update failed");
                }

                if header.frame_type == FrameType::Key {
                    self.keyframe = true;
                }

                // the tile groups of a frame obu are taken to cover the whole frame
                let complete = header.show_existing_frame || obu.header.obu_type == ObuType::Frame;
                if complete {
                    self.tu.within_one_frame = false;
                }
                complete
            }
            ParsedObu::TileGroup(group) => {
                self.tu.within_one_frame = !group.is_last();
                group.is_last()
            }
            ParsedObu::TemporalDelimiter | ParsedObu::Skipped => false,
        }
    }

    /// Appends the OBU to the output unit in the output format.
    fn cache_one_obu(&mut self, obu: &Obu, data: &[u8], frame_complete: bool) -> Result<(), ParseError> {
        let payload = &data[obu.payload..obu.unit.end()];

        if self.annexb_output() {
            obu_to_annexb(&mut self.frame_unit, &obu.header, payload)?;
            if frame_complete {
                let frame_unit = std::mem::take(&mut self.frame_unit);
                wrap_leb128(&mut self.data, &frame_unit)?;
            }
        } else if self.in_format == Some(StreamFormat::AnnexB) {
            obu_from_annexb(&mut self.data, &obu.header, payload)?;
        } else {
            self.data.extend_from_slice(&data[obu.unit.offset..obu.unit.end()]);
        }

        Ok(())
    }

    /// Turns the collected data into an output unit.
    fn push_data(&mut self, frame: &FrameContext, finished: bool) -> Result<Option<OutputUnit>, ParseError> {
        if self.annexb_output() {
            if !self.frame_unit.is_empty() {
                let frame_unit = std::mem::take(&mut self.frame_unit);
                wrap_leb128(&mut self.data, &frame_unit)?;
            }
            if !self.data.is_empty() {
                let temporal_unit = std::mem::take(&mut self.data);
                wrap_leb128(&mut self.data, &temporal_unit)?;
            }
        }

        if self.data.is_empty() {
            return Ok(None);
        }

        let mut flags = OutputFlags::empty();
        if std::mem::take(&mut self.header) {
            flags |= OutputFlags::HEADER;
        }
        if !std::mem::take(&mut self.keyframe) {
            flags |= OutputFlags::DELTA_UNIT;
        }

        let mut timestamps = frame.timestamps;
        match self.output_level() {
            Alignment::TemporalUnit => {
                if finished {
                    flags |= OutputFlags::MARKER;
                }
            }
            output_level => {
                if !self.show_frame {
                    flags |= OutputFlags::DECODE_ONLY;
                } else if finished {
                    flags |= OutputFlags::MARKER;
                }

                if output_level == Alignment::Frame && !self.show_frame {
                    timestamps.pts = None;
                    timestamps.duration = None;
                }
                if output_level == Alignment::Unit && self.input_level() >= Alignment::Frame {
                    timestamps.duration = None;
                }
            }
        }

        let data = Bytes::from(std::mem::take(&mut self.data));
        Ok(Some(self.emitter.emit(data, timestamps, flags, &self.output, &self.info)))
    }

    /// OBU stream in, one OBU per output unit.
    fn obu_to_obu(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        let obu = match self.identify(data, 0) {
            Ok(Identified::Obu(obu)) => obu,
            Ok(Identified::NeedMore) if self.input.alignment == Some(Alignment::Unit) => {
                tracing::warn!(size = data.len(), "obu aligned buffer holds a partial obu");
                self.tu.reset();
                return Ok(Delivery::skip(data.len()));
            }
            Ok(Identified::NeedMore) => return Ok(Delivery::need_more()),
            Ok(Identified::Drop(end)) => {
                self.tu.reset();
                return Ok(Delivery::skip(end));
            }
            Err(err) => return self.recover(err, data.len()),
        };

        let end = obu.unit.end();
        let frame_complete = match self.classify(&obu, data) {
            Ok(classified) => self.apply(&obu, classified.parsed),
            Err(err) => return self.recover(err, end),
        };

        let mut flags = OutputFlags::empty();
        if std::mem::take(&mut self.header) {
            flags |= OutputFlags::HEADER;
        } else if !self.keyframe {
            flags |= OutputFlags::DELTA_UNIT;
        }
        if frame_complete {
            flags |= OutputFlags::MARKER;
            self.keyframe = false;
        }

        let unit = self.emitter.emit(
            Bytes::copy_from_slice(&data[..end]),
            frame.timestamps,
            flags,
            &self.output,
            &self.info,
        );
        Ok(Delivery::flush(end, vec![unit]))
    }

    /// Collects OBUs across deliveries until a frame or temporal unit is complete.
    fn to_big(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        let output_level = self.output_level();

        if frame.flags.new_frame
            && let Some(deferred) = self.tu.lookahead.take_pending()
        {
            if deferred.obu.unit.end() <= data.len() {
                let frame_complete = self.apply(&deferred.obu, deferred.parsed);
                self.cache_one_obu(&deferred.obu, data, frame_complete)?;
                self.last_parsed_offset = deferred.obu.unit.end();
            } else {
                tracing::warn!(kind = %deferred.obu.unit.kind, "deferred obu no longer in the data");
            }
        }

        let mut complete = false;
        let mut truncated = false;
        while self.last_parsed_offset < data.len() {
            let obu = match self.identify(data, self.last_parsed_offset) {
                Ok(Identified::Obu(obu)) => obu,
                Ok(Identified::NeedMore) => {
                    truncated = true;
                    break;
                }
                Ok(Identified::Drop(end)) => {
                    self.last_parsed_offset = end;
                    self.tu.reset();
                    continue;
                }
                Err(err) => return self.recover(err, data.len()),
            };

            let classified = match self.classify(&obu, data) {
                Ok(classified) => classified,
                Err(err) => return self.recover(err, data.len()),
            };

            if output_level == Alignment::TemporalUnit && classified.new_temporal_unit && !self.cache_empty() {
                tracing::trace!(offset = obu.unit.offset, "temporal unit boundary");
                self.tu.lookahead.defer(DeferredObu {
                    obu: obu.rebased(obu.unit.offset),
                    parsed: classified.parsed,
                });
                complete = true;
                break;
            }

            let frame_complete = self.apply(&obu, classified.parsed);
            self.cache_one_obu(&obu, data, frame_complete)?;
            self.last_parsed_offset = obu.unit.end();

            if output_level == Alignment::Frame && frame_complete {
                complete = true;
                break;
            }
        }

        if complete || frame.flags.draining {
            if !complete && truncated {
                tracing::warn!(
                    dropped = data.len() - self.last_parsed_offset,
                    "stream ended inside an obu"
                );
            }

            let consumed = std::mem::take(&mut self.last_parsed_offset);
            if consumed == 0 {
                return Ok(Delivery::skip(data.len()));
            }

            let units = self.push_data(frame, true)?.into_iter().collect();
            return Ok(Delivery::flush(consumed, units));
        }

        if truncated && self.input_level() >= Alignment::Unit {
            tracing::warn!(size = data.len(), "aligned buffer ends inside an obu");
            self.tu.reset();
            return Ok(Delivery::skip(data.len()));
        }

        Ok(Delivery::need_more())
    }

    /// Splits one aligned buffer into output units of the same or a finer alignment.
    fn small_and_equal(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        let output_level = self.output_level();
        let annexb = match self.in_format {
            Some(StreamFormat::AnnexB) => match split_annexb(data) {
                Ok(obus) => Some(obus),
                Err(err) => return self.recover(err, data.len()),
            },
            _ => None,
        };

        let mut units = Vec::new();
        let mut offset = 0;
        let mut next = 0;
        loop {
            let identified = match &annexb {
                Some(obus) => match obus.get(next) {
                    Some(bounds) => {
                        next += 1;
                        self.identify_annexb(data, *bounds)
                    }
                    None => break,
                },
                None if offset < data.len() => self.identify(data, offset),
                None => break,
            };

            let obu = match identified {
                Ok(Identified::Obu(obu)) => obu,
                Ok(Identified::Drop(end)) => {
                    offset = end;
                    self.tu.reset();
                    continue;
                }
                Ok(Identified::NeedMore) => {
                    tracing::warn!(size = data.len(), "aligned buffer ends inside an obu");
                    return self.abandon(data.len(), units);
                }
                Err(err) => {
                    if !err.is_recoverable() {
                        return Err(err);
                    }
                    tracing::warn!(%err, "dropping the rest of the buffer");
                    return self.abandon(data.len(), units);
                }
            };
            offset = obu.unit.end();

            let classified = match self.classify(&obu, data) {
                Ok(classified) => classified,
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(%err, kind = %obu.unit.kind, "dropping the rest of the buffer");
                    return self.abandon(data.len(), units);
                }
                Err(err) => return Err(err),
            };

            if obu.header.obu_type == ObuType::TemporalDelimiter && !self.cache_empty() {
                tracing::debug!(offset = obu.unit.offset, "temporal delimiter inside an aligned buffer");
                units.extend(self.push_data(frame, true)?);
            }

            let frame_complete = self.apply(&obu, classified.parsed);
            self.cache_one_obu(&obu, data, frame_complete)?;

            if output_level == Alignment::Unit || (output_level == Alignment::Frame && frame_complete) {
                units.extend(self.push_data(frame, frame_complete)?);
            }
        }

        if output_level == Alignment::Frame && !self.cache_empty() {
            tracing::warn!("buffer ends inside a frame, closing it");
        }
        units.extend(self.push_data(frame, true)?);

        Ok(Delivery::flush(data.len(), units))
    }

    /// Gives up on the rest of a buffer, keeping the units already finished.
    fn abandon(&mut self, len: usize, units: Vec<OutputUnit>) -> Result<Delivery, ParseError> {
        self.tu.reset();
        self.data.clear();
        self.frame_unit.clear();

        if units.is_empty() {
            Ok(Delivery::skip(len))
        } else {
            Ok(Delivery::flush(len, units))
        }
    }
}

impl ElementaryParser for Av1Parser {
    fn handle_frame(&mut self, data: &[u8], frame: &FrameContext) -> Result<Delivery, ParseError> {
        let flags = frame.flags;
        if flags.discont {
            self.emitter.mark_discont();
            if flags.new_frame {
                self.tu.reset();
            }
        }

        if flags.new_frame {
            self.reset_output();
        }

        if self.in_format.is_none() {
            match sniff(data) {
                Some(format) => {
                    tracing::info!(%format, "detected av1 stream format");
                    self.in_format = Some(format);
                }
                None if flags.draining => {
                    tracing::warn!(size = data.len(), "cannot tell the av1 stream format, dropping");
                    return Ok(Delivery::skip(data.len()));
                }
                None => return Ok(Delivery::need_more()),
            }
        }

        let input_level = self.input_level();
        let output_level = self.output_level();

        if input_level <= Alignment::Unit && output_level == Alignment::Unit {
            self.obu_to_obu(data, frame)
        } else if input_level < output_level {
            self.to_big(data, frame)
        } else {
            self.small_and_equal(data, frame)
        }
    }

    fn min_unit_size(&self) -> usize {
        2
    }

    fn output_format(&self) -> &FormatDescriptor {
        &self.output
    }

    fn set_output_format(&mut self, output: FormatDescriptor) {
        tracing::debug!(%output, "av1 output format changed");
        self.output = output;
        self.emitter.invalidate_caps();
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    fn request_key_unit(&mut self) {
        // sequence headers are never cached for reinsertion, only the caps go out again
        self.emitter.invalidate_caps();
    }
}
