use std::io;

use bytes::Bytes;
use reframe_bytes_util::BitReader;
use reframe_h265::sei::SeiPayloadType;
use reframe_h265::{NALUnitHeader, NALUnitType, Pps, SliceSegmentHeader, SliceType, Sps, Vps};

use super::{NalCodecPolicy, NalContext, apply_sei, ticks_to_ns};
use crate::cache::{ChromaFormat, Colorimetry, Fraction, InterlaceMode, ParameterSetStore, StreamInfo, level_name};
use crate::error::ParseError;
use crate::format::Codec;
use crate::state::{AccessUnitState, FrameState, ParameterSetKind};
use crate::unit::{SyntaxUnit, UnitKind};

/// H.265 classification, ISO/IEC-23008-2.
#[derive(Debug, Default)]
pub(crate) struct H265Policy {
    vps: ParameterSetStore<Vps, 16>,
    sps: ParameterSetStore<Sps, 16>,
    pps: ParameterSetStore<Pps, 64>,
    active_sps: Option<usize>,
}

fn describe(sps: &Sps, info: &mut StreamInfo) {
    let ptl = &sps.profile_tier_level;
    let (major, minor) = ptl.level();

    info.width = sps.width();
    info.height = sps.height();
    info.chroma_format = ChromaFormat::from_idc(sps.chroma_format_idc as u64);
    info.bit_depth_luma = sps.bit_depth_luma();
    info.bit_depth_chroma = sps.bit_depth_chroma();
    info.profile = ptl.profile_name();
    info.tier = Some(ptl.tier_name());
    info.level = Some(level_name(major, minor));

    let vui = sps.vui_parameters.as_ref();
    info.colorimetry = vui.and_then(|vui| vui.color_config.as_ref()).map(|color| Colorimetry {
        primaries: color.color_primaries,
        transfer: color.transfer_characteristics,
        matrix: color.matrix_coefficients,
        full_range: color.full_range,
    });
    info.pixel_aspect_ratio = vui
        .and_then(|vui| vui.aspect_ratio_info.as_ref())
        .and_then(|sar| Fraction::new(sar.sar_width as u64, sar.sar_height as u64));
    info.framerate = sps
        .timing_info()
        .and_then(|(num_units_in_tick, time_scale)| Fraction::new(time_scale as u64, num_units_in_tick as u64));
    info.interlace_mode = if sps.field_seq() {
        InterlaceMode::Alternate
    } else {
        InterlaceMode::Progressive
    };
}

impl H265Policy {
    fn active(&self) -> Option<&Sps> {
        self.sps.parsed(self.active_sps?)
    }

    fn process_vps(&mut self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        let vps = Vps::parse_with_emulation_prevention(nal)
            .map_err(|err| ParseError::bitstream(format!("invalid vps: {err}")))?;
        let id = vps.vps_video_parameter_set_id as usize;
        tracing::debug!(id, "parsed vps");
        self.vps.insert(id, Bytes::copy_from_slice(nal), vps)?;

        ctx.au.have_vps = true;
        ctx.push.saw(ParameterSetKind::Vps);
        ctx.au.header = true;
        Ok(())
    }

    fn process_sps(&mut self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        ctx.state &= FrameState::GOT_PPS;

        let sps = match Sps::parse_with_emulation_prevention(nal) {
            Ok(sps) => sps,
            Err(err) => {
                ctx.state |= FrameState::GOT_SPS;
                ctx.au.header = true;
                return Err(ParseError::bitstream(format!("invalid sps: {err}")));
            }
        };

        let id = sps.sps_seq_parameter_set_id as usize;
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
        let id = pps.pps_pic_parameter_set_id as usize;
        tracing::debug!(id, sps = pps.pps_seq_parameter_set_id, "parsed pps");
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

        apply_sei(ctx, nal, NALUnitHeader::LEN, |ctx, message| {
            if message.payload_type == SeiPayloadType::RecoveryPoint {
                let recovery = reframe_h265::sei::RecoveryPoint::parse(message.payload)?;
                tracing::trace!(poc = recovery.recovery_poc_cnt, "recovery point, treating as keyframe");
                ctx.au.keyframe = true;
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

        let slice = SliceSegmentHeader::parse_with_emulation_prevention(nal, |pps_id| {
            let pps = self.pps.parsed(pps_id as usize)?;
            let sps = self.sps.parsed(pps.pps_seq_parameter_set_id as usize)?;
            Some((pps, sps))
        })
        .map_err(|err| ParseError::bitstream(format!("invalid slice segment header: {err}")))?;

        if slice.first_slice_segment_in_pic_flag {
            ctx.au.frame_start = true;
        }

        match slice.slice_type {
            Some(SliceType::I) => ctx.au.keyframe = true,
            Some(SliceType::P) => ctx.au.predicted = true,
            Some(SliceType::B) => ctx.au.bidirectional = true,
            _ => {}
        }

        let irap = nal_type.is_irap();
        ctx.au.keyframe |= irap;

        if let Some(pps) = self.pps.parsed(slice.slice_pic_parameter_set_id as usize) {
            let sps_id = pps.pps_seq_parameter_set_id as usize;
            if self.active_sps != Some(sps_id)
                && let Some(sps) = self.sps.parsed(sps_id)
            {
                describe(sps, &mut ctx.info);
                self.active_sps = Some(sps_id);
            }
        }
        ctx.au.field_pic = self.active().is_some_and(Sps::field_seq);

        ctx.state |= FrameState::GOT_SLICE;

        if irap || ctx.push.requested {
            ctx.au.mark_idr(ctx.out_pos);
        }

        if irap && slice.first_slice_segment_in_pic_flag {
            ctx.sei.step_on_irap();
        }

        Ok(())
    }
}

const fn is_vcl_type(nal_type: u8) -> bool {
    matches!(nal_type, 0..=9 | 16..=23)
}

impl NalCodecPolicy for H265Policy {
    const CODEC: Codec = Codec::H265;
    const HEADER_LEN: usize = NALUnitHeader::LEN;

    fn parse_unit(&self, nal: &[u8]) -> io::Result<SyntaxUnit> {
        let header = NALUnitHeader::parse(&mut BitReader::new_from_slice(nal))?;
        Ok(SyntaxUnit {
            kind: UnitKind::Nal(header.nal_unit_type.0),
            offset: 0,
            header_offset: 0,
            size: nal.len(),
            temporal_id: header.temporal_id(),
            spatial_id: 0,
            layer_id: header.nuh_layer_id,
        })
    }

    fn starts_new_access_unit(&self, unit: &SyntaxUnit, nal: &[u8]) -> bool {
        let UnitKind::Nal(nal_type) = unit.kind else {
            return false;
        };

        match nal_type {
            32..=35 | 39 | 41..=44 | 48..=55 => true,
            nal_type if is_vcl_type(nal_type) => nal.get(NALUnitHeader::LEN).is_some_and(|byte| byte & 0x80 != 0),
            _ => false,
        }
    }

    fn process(&mut self, ctx: &mut NalContext, unit: &SyntaxUnit, nal: &[u8]) -> Result<(), ParseError> {
        let UnitKind::Nal(nal_type) = unit.kind else {
            return Ok(());
        };

        let nal_type = NALUnitType::from(nal_type);
        match nal_type {
            NALUnitType::VpsNut => self.process_vps(ctx, nal),
            NALUnitType::SpsNut => self.process_sps(ctx, nal),
            NALUnitType::PpsNut => self.process_pps(ctx, nal),
            NALUnitType::PrefixSeiNut | NALUnitType::SuffixSeiNut => self.process_sei(ctx, nal),
            NALUnitType::AudNut => {
                ctx.au.have_aud = true;
                Ok(())
            }
            _ if is_vcl_type(nal_type.0) => self.process_slice(ctx, nal_type, nal),
            _ => ctx.require(FrameState::GOT_SPS, "nal unit before any sps"),
        }
    }

    fn parameter_sets(&self) -> Vec<Bytes> {
        self.vps
            .nals()
            .chain(self.sps.nals())
            .chain(self.pps.nals())
            .cloned()
            .collect()
    }

    fn frame_duration(&self, _au: &AccessUnitState) -> Option<u64> {
        let (num_units_in_tick, time_scale) = self.active()?.timing_info()?;
        ticks_to_ns(1, num_units_in_tick, time_scale)
    }
}
