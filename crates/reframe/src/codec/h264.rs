use std::io;

use bytes::Bytes;
use reframe_h264::sei::{PicTiming, SeiPayloadType, StereoVideoInfo};
use reframe_h264::{NALUnitHeader, NALUnitType, Pps, SliceHeader, SliceType, Sps};

use super::{NalCodecPolicy, NalContext, apply_sei, ticks_to_ns};
use crate::cache::{
    ChromaFormat, Colorimetry, Fraction, InterlaceMode, ParameterSetStore, StreamInfo, level_name,
    multiview_from_stereo_info,
};
use crate::error::ParseError;
use crate::format::Codec;
use crate::state::{AccessUnitState, FrameState, ParameterSetKind};
use crate::unit::{SyntaxUnit, UnitKind};

/// H.264 classification, ISO/IEC-14496-10.
#[derive(Debug, Default)]
pub(crate) struct H264Policy {
    sps: ParameterSetStore<Sps, 32>,
    pps: ParameterSetStore<Pps, 256>,
    /// The SPS the last slice referred to.
    active_sps: Option<usize>,
}

const fn profile_name(profile_idc: u8, constraint_set_flags: u8) -> Option<&'static str> {
    let constraint_set1 = constraint_set_flags & 0x40 != 0;
    let constraint_set3 = constraint_set_flags & 0x10 != 0;

    Some(match profile_idc {
        66 if constraint_set1 => "constrained-baseline",
        66 => "baseline",
        77 => "main",
        88 => "extended",
        100 => "high",
        110 if constraint_set3 => "high-10-intra",
        110 => "high-10",
        122 if constraint_set3 => "high-4:2:2-intra",
        122 => "high-4:2:2",
        244 if constraint_set3 => "high-4:4:4-intra",
        244 => "high-4:4:4",
        44 => "cavlc-4:4:4-intra",
        118 => "multiview-high",
        128 => "stereo-high",
        _ => return None,
    })
}

fn level(sps: &Sps) -> String {
    let constraint_set3 = sps.constraint_set_flags & 0x10 != 0;
    match sps.level_idc {
        9 => "1b".to_string(),
        11 if constraint_set3 && matches!(sps.profile_idc, 66 | 77 | 88) => "1b".to_string(),
        idc => level_name(idc / 10, idc % 10),
    }
}

fn describe(sps: &Sps, info: &mut StreamInfo) {
    info.width = sps.width();
    info.height = sps.height();
    info.chroma_format = ChromaFormat::from_idc(sps.chroma_format_idc());
    info.bit_depth_luma = sps.bit_depth_luma() as u8;
    info.bit_depth_chroma = sps.bit_depth_chroma() as u8;
    info.colorimetry = sps.color_config().map(|color| Colorimetry {
        primaries: color.color_primaries,
        transfer: color.transfer_characteristics,
        matrix: color.matrix_coefficients,
        full_range: color.full_range,
    });
    info.profile = profile_name(sps.profile_idc, sps.constraint_set_flags);
    info.level = Some(level(sps));
    info.framerate = sps
        .timing_info()
        .and_then(|timing| Fraction::new(timing.time_scale as u64, 2 * timing.num_units_in_tick as u64));
    info.pixel_aspect_ratio = sps
        .vui_parameters
        .as_ref()
        .and_then(|vui| vui.aspect_ratio_info.as_ref())
        .and_then(|sar| Fraction::new(sar.sar_width as u64, sar.sar_height as u64));
    info.interlace_mode = if sps.frame_mbs_only_flag {
        InterlaceMode::Progressive
    } else {
        InterlaceMode::Mixed
    };
}

impl H264Policy {
    fn active(&self) -> Option<&Sps> {
        self.sps.parsed(self.active_sps?)
    }

    fn process_sps(&mut self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        ctx.state &= FrameState::GOT_PPS;

        let sps = match Sps::parse_with_emulation_prevention(nal) {
            Ok(sps) => sps,
            Err(err) => {
                // later units may still decode with the cached set
                ctx.state |= FrameState::GOT_SPS;
                ctx.au.header = true;
                return Err(ParseError::bitstream(format!("invalid sps: {err}")));
            }
        };

        let id = sps.seq_parameter_set_id as usize;
        tracing::debug!(id, width = sps.width(), height = sps.height(), "parsed sps");

        describe(&sps, &mut ctx.info);
        self.sps.insert(id, Bytes::copy_from_slice(nal), sps)?;
        self.active_sps = Some(id);

        ctx.au.have_sps = true;
        ctx.push.saw(ParameterSetKind::Sps);
        ctx.state |= FrameState::GOT_SPS;
        ctx.au.header = true;
        Ok(())
    }

    fn process_pps(&mut self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        ctx.state &= FrameState::GOT_SPS;
        ctx.require(FrameState::GOT_SPS, "pps before any sps")?;

        let pps = Pps::parse_with_emulation_prevention(nal)
            .map_err(|err| ParseError::bitstream(format!("invalid pps: {err}")))?;
        let id = pps.pic_parameter_set_id as usize;
        tracing::debug!(id, sps = pps.seq_parameter_set_id, "parsed pps");
        self.pps.insert(id, Bytes::copy_from_slice(nal), pps)?;

        ctx.au.have_pps = true;
        ctx.push.saw(ParameterSetKind::Pps);
        ctx.state |= FrameState::GOT_PPS;
        ctx.au.header = true;
        Ok(())
    }

    fn process_sei(&self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        ctx.require(FrameState::GOT_SPS, "sei before any sps")?;
        ctx.au.header = true;

        let sps = self.active();
        apply_sei(ctx, nal, 1, |ctx, message| {
            match message.payload_type {
                SeiPayloadType::RecoveryPoint => {
                    tracing::trace!("recovery point, treating as keyframe");
                    ctx.au.keyframe = true;
                }
                SeiPayloadType::PicTiming => {
                    if let Some(sps) = sps.filter(|sps| sps.pic_struct_present()) {
                        let timing = PicTiming::parse(message.payload, sps)?;
                        ctx.au.pic_struct = timing.pic_struct;
                    }
                }
                SeiPayloadType::StereoVideoInfo => {
                    let stereo = StereoVideoInfo::parse(message.payload)?;
                    let (mode, flags) = multiview_from_stereo_info(&stereo);
                    ctx.info.multiview_mode = mode;
                    ctx.info.multiview_flags = flags;
                }
                _ => {}
            }
            Ok(())
        });

        ctx.au.mark_sei(ctx.out_pos);
        Ok(())
    }

    fn process_slice(&mut self, ctx: &mut NalContext, nal_type: NALUnitType, nal: &[u8]) -> Result<(), ParseError> {
        ctx.state &= FrameState::VALID_PICTURE_HEADERS;
        ctx.require(FrameState::VALID_PICTURE_HEADERS, "slice before sps and pps")?;

        ctx.au.picture_start = true;

        let header = NALUnitHeader::parse(&mut &nal[..])?;
        let first_mb = nal.get(header.header_len()).is_some_and(|byte| byte & 0x80 != 0);
        if first_mb {
            ctx.au.frame_start = true;
        }

        // extension slices only mark the picture
        if nal_type.is_slice() {
            let slice = SliceHeader::parse_with_emulation_prevention(nal, |pps_id| {
                let pps = self.pps.parsed(pps_id as usize)?;
                self.sps.parsed(pps.seq_parameter_set_id as usize)
            })
            .map_err(|err| ParseError::bitstream(format!("invalid slice header: {err}")))?;

            match slice.slice_type {
                SliceType::I | SliceType::SI => ctx.au.keyframe = true,
                SliceType::P | SliceType::SP => ctx.au.predicted = true,
                SliceType::B => ctx.au.bidirectional = true,
                _ => {}
            }
            ctx.au.field_pic |= slice.field_pic_flag;

            if let Some(pps) = self.pps.parsed(slice.pic_parameter_set_id as usize) {
                let sps_id = pps.seq_parameter_set_id as usize;
                if self.active_sps != Some(sps_id)
                    && let Some(sps) = self.sps.parsed(sps_id)
                {
                    describe(sps, &mut ctx.info);
                    self.active_sps = Some(sps_id);
                }
            }
        }

        ctx.state |= FrameState::GOT_SLICE;

        let idr = nal_type == NALUnitType::IDRSliceLayerWithoutPartitioning;
        if idr || ctx.push.requested {
            ctx.au.mark_idr(ctx.out_pos);
        }

        if idr && first_mb {
            ctx.sei.step_on_irap();
        }

        Ok(())
    }
}

impl NalCodecPolicy for H264Policy {
    const CODEC: Codec = Codec::H264;
    const HEADER_LEN: usize = 1;

    fn parse_unit(&self, nal: &[u8]) -> io::Result<SyntaxUnit> {
        let header = NALUnitHeader::parse(&mut &nal[..])?;
        Ok(SyntaxUnit {
            kind: UnitKind::Nal(header.nal_unit_type.0),
            offset: 0,
            header_offset: 0,
            size: nal.len(),
            temporal_id: 0,
            spatial_id: 0,
            layer_id: 0,
        })
    }

    fn starts_new_access_unit(&self, unit: &SyntaxUnit, nal: &[u8]) -> bool {
        let UnitKind::Nal(nal_type) = unit.kind else {
            return false;
        };

        match nal_type {
            6..=9 | 14..=18 => true,
            1 | 2 | 5 => nal.get(1).is_some_and(|byte| byte & 0x80 != 0),
            _ => false,
        }
    }

    fn process(&mut self, ctx: &mut NalContext, unit: &SyntaxUnit, nal: &[u8]) -> Result<(), ParseError> {
        let UnitKind::Nal(nal_type) = unit.kind else {
            return Ok(());
        };

        if nal.len() < 2 {
            tracing::trace!(nal_type, "nal unit too short to classify");
            return Ok(());
        }

        let nal_type = NALUnitType::from(nal_type);
        match nal_type {
            NALUnitType::SPS => self.process_sps(ctx, nal),
            NALUnitType::SubsetSPS => {
                ctx.require(FrameState::GOT_SPS, "subset sps before any sps")?;
                ctx.au.header = true;
                Ok(())
            }
            NALUnitType::PPS => self.process_pps(ctx, nal),
            NALUnitType::SEI => self.process_sei(ctx, nal),
            NALUnitType::AccessUnitDelimiter => {
                ctx.au.have_aud = true;
                Ok(())
            }
            _ if nal_type.is_slice() || nal_type == NALUnitType::SliceLayerExtension => {
                self.process_slice(ctx, nal_type, nal)
            }
            _ => ctx.require(FrameState::GOT_SPS, "nal unit before any sps"),
        }
    }

    fn parameter_sets(&self) -> Vec<Bytes> {
        self.sps.nals().chain(self.pps.nals()).cloned().collect()
    }

    fn frame_duration(&self, au: &AccessUnitState) -> Option<u64> {
        let sps = self.active()?;
        let timing = sps.timing_info()?;

        let ticks = au
            .pic_struct
            .filter(|_| sps.pic_struct_present())
            .and_then(|pic_struct| pic_struct.ticks())
            .map(u64::from)
            .unwrap_or(if au.field_pic { 1 } else { 2 });

        ticks_to_ns(ticks, timing.num_units_in_tick, timing.time_scale)
    }
}
