use std::io;

use bytes::Bytes;
use reframe_bytes_util::BitReader;
use reframe_h266::sei::SeiPayloadType;
use reframe_h266::{NALUnitHeader, NALUnitType, PictureHeader, Pps, SliceHeader, Sps, Vps};

use super::{NalCodecPolicy, NalContext, apply_sei};
use crate::cache::{ChromaFormat, ParameterSetStore, StreamInfo, level_name};
use crate::error::ParseError;
use crate::format::Codec;
use crate::state::{AccessUnitState, FrameState, ParameterSetKind};
use crate::unit::{SyntaxUnit, UnitKind};

/// H.266 classification, ISO/IEC-23090-3.
///
/// Pictures are delimited by picture headers, either in a PH NAL unit or
/// embedded in the first slice.
#[derive(Debug, Default)]
pub(crate) struct H266Policy {
    vps: ParameterSetStore<Vps, 16>,
    sps: ParameterSetStore<Sps, 16>,
    pps: ParameterSetStore<Pps, 64>,
    active_sps: Option<usize>,
    /// `nuh_layer_id` of the last slice, a picture of a higher layer belongs
    /// to the same access unit.
    last_layer_id: Option<u8>,
}

fn describe(sps: &Sps, info: &mut StreamInfo) {
    info.width = sps.width();
    info.height = sps.height();
    info.chroma_format = ChromaFormat::from_idc(sps.sps_chroma_format_idc as u64);
    info.bit_depth_luma = sps.bit_depth();
    info.bit_depth_chroma = sps.bit_depth();

    match &sps.profile_tier_level {
        Some(ptl) => {
            let (major, minor) = ptl.level();
            info.profile = ptl.profile_name();
            info.tier = Some(ptl.tier_name());
            info.level = Some(level_name(major, minor));
        }
        None => {
            info.profile = None;
            info.tier = None;
            info.level = None;
        }
    }
}

fn apply_picture_header(ctx: &mut NalContext, ph: &PictureHeader) {
    ctx.au.frame_start = true;
    if ph.ph_gdr_or_irap_pic_flag {
        ctx.au.keyframe = true;
    }
    if ph.ph_inter_slice_allowed_flag {
        ctx.au.predicted = true;
    }
}

impl H266Policy {
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
                tracing::trace!("recovery point, treating as keyframe");
                ctx.au.keyframe = true;
            }
            Ok(())
        });

        ctx.au.mark_sei(ctx.out_pos);
        Ok(())
    }

    /// Activates the SPS behind `pps_id` if another one is active.
    fn activate(&mut self, ctx: &mut NalContext, pps_id: u8) {
        let Some(pps) = self.pps.parsed(pps_id as usize) else {
            return;
        };

        let sps_id = pps.pps_seq_parameter_set_id as usize;
        if self.active_sps != Some(sps_id)
            && let Some(sps) = self.sps.parsed(sps_id)
        {
            describe(sps, &mut ctx.info);
            self.active_sps = Some(sps_id);
        }
    }

    fn process_picture_header(&mut self, ctx: &mut NalContext, nal: &[u8]) -> Result<(), ParseError> {
        ctx.require(FrameState::VALID_PICTURE_HEADERS, "picture header before sps and pps")?;

        let ph = PictureHeader::parse_with_emulation_prevention(nal)
            .map_err(|err| ParseError::bitstream(format!("invalid picture header: {err}")))?;

        ctx.au.picture_start = true;
        apply_picture_header(ctx, &ph);
        self.activate(ctx, ph.ph_pic_parameter_set_id);

        if ph.ph_gdr_or_irap_pic_flag && !ph.ph_gdr_pic_flag {
            ctx.sei.step_on_irap();
        }

        Ok(())
    }

    fn process_slice(
        &mut self,
        ctx: &mut NalContext,
        unit: &SyntaxUnit,
        nal_type: NALUnitType,
        nal: &[u8],
    ) -> Result<(), ParseError> {
        ctx.state &= FrameState::VALID_PICTURE_HEADERS;
        ctx.require(FrameState::VALID_PICTURE_HEADERS, "slice before sps and pps")?;

        ctx.au.picture_start = true;

        let slice = SliceHeader::parse_with_emulation_prevention(nal)
            .map_err(|err| ParseError::bitstream(format!("invalid slice header: {err}")))?;

        if let Some(ph) = &slice.picture_header {
            apply_picture_header(ctx, ph);
            self.activate(ctx, ph.ph_pic_parameter_set_id);
        }

        let irap_or_gdr = nal_type.is_irap_or_gdr();
        ctx.au.keyframe |= irap_or_gdr;
        self.last_layer_id = Some(unit.layer_id);

        ctx.state |= FrameState::GOT_SLICE;

        if irap_or_gdr || ctx.push.requested {
            ctx.au.mark_idr(ctx.out_pos);
        }

        if nal_type.is_irap() && slice.sh_picture_header_in_slice_header_flag {
            ctx.sei.step_on_irap();
        }

        Ok(())
    }
}

impl NalCodecPolicy for H266Policy {
    const CODEC: Codec = Codec::H266;
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
            // OPI, DCI, VPS, SPS, PPS, prefix APS, PH, AUD, prefix SEI and the reserved prefix types
            12..=17 | 19 | 20 | 23 | 26 | 28 | 29 => true,
            // TRAIL to GDR, reserved IRAP types do not open a picture
            nal_type if (NALUnitType::TrailNut.0..=NALUnitType::GdrNut.0).contains(&nal_type) => {
                self.last_layer_id.is_none_or(|last| unit.layer_id <= last)
                    && nal.get(NALUnitHeader::LEN).is_some_and(|byte| byte & 0x80 != 0)
            }
            _ => false,
        }
    }

    fn process(&mut self, ctx: &mut NalContext, unit: &SyntaxUnit, nal: &[u8]) -> Result<(), ParseError> {
        let UnitKind::Nal(nal_type) = unit.kind else {
            return Ok(());
        };

        let nal_type = NALUnitType::from(nal_type);
        match nal_type {
            NALUnitType::OpiNut | NALUnitType::DciNut => {
                ctx.au.header = true;
                Ok(())
            }
            NALUnitType::VpsNut => self.process_vps(ctx, nal),
            NALUnitType::SpsNut => self.process_sps(ctx, nal),
            NALUnitType::PpsNut => self.process_pps(ctx, nal),
            NALUnitType::PrefixApsNut | NALUnitType::SuffixApsNut => {
                ctx.require(FrameState::VALID_PICTURE_HEADERS, "aps before sps and pps")
            }
            NALUnitType::PhNut => self.process_picture_header(ctx, nal),
            NALUnitType::PrefixSeiNut | NALUnitType::SuffixSeiNut => self.process_sei(ctx, nal),
            NALUnitType::AudNut => {
                ctx.au.have_aud = true;
                Ok(())
            }
            _ if nal_type.is_slice() => self.process_slice(ctx, unit, nal_type, nal),
            _ => ctx.require(FrameState::GOT_SPS, "nal unit before any sps"),
        }
    }

    fn closes_access_unit(&self, unit: &SyntaxUnit) -> bool {
        matches!(unit.kind, UnitKind::Nal(nal_type) if matches!(
            NALUnitType::from(nal_type),
            NALUnitType::EosNut | NALUnitType::EobNut
        ))
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
        // timing lives in the VPS/SPS general_timing_hrd_parameters, which are not decoded
        None
    }
}
