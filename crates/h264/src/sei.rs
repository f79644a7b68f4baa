//! Supplemental enhancement information.
//!
//! [`SeiMessages`] walks the `sei_message()` list of an SEI RBSP. The framing is
//! the same in H.264, H.265 and H.266, so the other codec crates reuse it.
//! The payload types that change stream metadata are decoded by the structs in
//! this module.

use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use nutype_enum::nutype_enum;
use reframe_bytes_util::BitReader;
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::Sps;

nutype_enum! {
    /// `payloadType` values handled by stream parsers, ISO/IEC-14496-10-2022 - D.1.1.
    pub enum SeiPayloadType(u32) {
        /// `buffering_period()`
        BufferingPeriod = 0,
        /// `pic_timing()`
        PicTiming = 1,
        /// `user_data_registered_itu_t_t35()`
        UserDataRegistered = 4,
        /// `user_data_unregistered()`
        UserDataUnregistered = 5,
        /// `recovery_point()`
        RecoveryPoint = 6,
        /// `stereo_video_info()`
        StereoVideoInfo = 21,
        /// `frame_packing_arrangement()`
        FramePackingArrangement = 45,
        /// `mastering_display_colour_volume()`
        MasteringDisplayColourVolume = 137,
        /// `content_light_level_info()`
        ContentLightLevelInfo = 144,
    }
}

/// One `sei_message()`, the payload is borrowed from the RBSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeiMessage<'a> {
    /// `payloadType`
    pub payload_type: SeiPayloadType,
    /// `payloadSize` bytes of `sei_payload()`.
    pub payload: &'a [u8],
}

/// An iterator over the messages of an SEI RBSP.
///
/// The input starts after the NAL unit header and must not contain emulation
/// prevention bytes. Iteration ends at `rbsp_trailing_bits()`. A truncated
/// message yields one error and ends the iteration, so every message before
/// it is still returned.
#[derive(Debug, Clone)]
pub struct SeiMessages<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> SeiMessages<'a> {
    /// Creates an iterator over the messages in `rbsp`.
    pub const fn new(rbsp: &'a [u8]) -> Self {
        Self { data: rbsp, failed: false }
    }

    fn more_rbsp_data(&self) -> bool {
        match self.data.split_first() {
            None => false,
            Some((&0x80, rest)) => rest.iter().any(|&b| b != 0),
            Some(_) => true,
        }
    }

    fn read_ff_coded(&mut self) -> io::Result<u32> {
        let mut value = 0u32;
        loop {
            let (&byte, rest) = self
                .data
                .split_first()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "sei message header is truncated"))?;
            self.data = rest;
            value = value.saturating_add(byte as u32);
            if byte != 0xff {
                return Ok(value);
            }
        }
    }

    fn next_message(&mut self) -> io::Result<SeiMessage<'a>> {
        let payload_type = self.read_ff_coded()?;
        let payload_size = self.read_ff_coded()? as usize;
        if payload_size > self.data.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "sei payload is truncated"));
        }

        let (payload, rest) = self.data.split_at(payload_size);
        self.data = rest;

        Ok(SeiMessage {
            payload_type: SeiPayloadType::from(payload_type),
            payload,
        })
    }
}

impl<'a> Iterator for SeiMessages<'a> {
    type Item = io::Result<SeiMessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.more_rbsp_data() {
            return None;
        }

        let message = self.next_message();
        self.failed = message.is_err();
        Some(message)
    }
}

/// `recovery_point()`, D.1.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPoint {
    /// `recovery_frame_cnt`
    pub recovery_frame_cnt: u64,
    /// `exact_match_flag`
    pub exact_match_flag: bool,
    /// `broken_link_flag`
    pub broken_link_flag: bool,
}

impl RecoveryPoint {
    /// Parses the payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new_from_slice(payload);
        Ok(Self {
            recovery_frame_cnt: reader.read_exp_golomb()?,
            exact_match_flag: reader.read_bit()?,
            broken_link_flag: reader.read_bit()?,
        })
    }
}

nutype_enum! {
    /// `pic_struct`, D.2.3 Table D-1.
    pub enum PicStruct(u8) {
        /// progressive frame
        Frame = 0,
        /// top field
        TopField = 1,
        /// bottom field
        BottomField = 2,
        /// top field, bottom field, in that order
        TopBottom = 3,
        /// bottom field, top field, in that order
        BottomTop = 4,
        /// top field, bottom field, top field repeated
        TopBottomTop = 5,
        /// bottom field, top field, bottom field repeated
        BottomTopBottom = 6,
        /// frame doubling
        FrameDoubling = 7,
        /// frame tripling
        FrameTripling = 8,
    }
}

impl PicStruct {
    /// The display duration in field periods (ticks), `None` for reserved values.
    pub const fn ticks(&self) -> Option<u32> {
        match self.0 {
            1 | 2 => Some(1),
            0 | 3 | 4 => Some(2),
            5 | 6 => Some(3),
            7 => Some(4),
            8 => Some(6),
            _ => None,
        }
    }

    /// Single field pictures and field pairs.
    pub const fn is_interlaced(&self) -> bool {
        matches!(self.0, 1..=6)
    }
}

/// The leading fields of `pic_timing()`, D.1.3.
///
/// The clock timestamps that follow `pic_struct` are not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicTiming {
    /// `cpb_removal_delay`, present with `CpbDpbDelaysPresentFlag`.
    pub cpb_removal_delay: Option<u32>,
    /// `dpb_output_delay`, present with `CpbDpbDelaysPresentFlag`.
    pub dpb_output_delay: Option<u32>,
    /// `pic_struct`, present with `pic_struct_present_flag`.
    pub pic_struct: Option<PicStruct>,
}

impl PicTiming {
    /// Parses the payload using the active SPS.
    pub fn parse(payload: &[u8], sps: &Sps) -> io::Result<Self> {
        let mut reader = BitReader::new_from_slice(payload);

        let (cpb_removal_delay, dpb_output_delay) = match sps.cpb_dpb_delays() {
            Some(hrd) => (
                Some(reader.read_bits(hrd.cpb_removal_delay_length_minus1 + 1)? as u32),
                Some(reader.read_bits(hrd.dpb_output_delay_length_minus1 + 1)? as u32),
            ),
            None => (None, None),
        };

        let pic_struct = if sps.pic_struct_present() {
            Some(PicStruct::from(reader.read_bits(4)? as u8))
        } else {
            None
        };

        Ok(Self {
            cpb_removal_delay,
            dpb_output_delay,
            pic_struct,
        })
    }
}

/// `stereo_video_info()`, D.1.22.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoVideoInfo {
    /// `field_views_flag`, both views are fields of one frame.
    pub field_views_flag: bool,
    /// `top_field_is_left_view_flag`
    pub top_field_is_left_view_flag: bool,
    /// `current_frame_is_left_view_flag`
    pub current_frame_is_left_view_flag: bool,
    /// `next_frame_is_second_view_flag`
    pub next_frame_is_second_view_flag: bool,
    /// `left_view_self_contained_flag`
    pub left_view_self_contained_flag: bool,
    /// `right_view_self_contained_flag`
    pub right_view_self_contained_flag: bool,
}

impl StereoVideoInfo {
    /// Parses the payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new_from_slice(payload);

        let field_views_flag = reader.read_bit()?;
        let mut info = Self {
            field_views_flag,
            top_field_is_left_view_flag: false,
            current_frame_is_left_view_flag: false,
            next_frame_is_second_view_flag: false,
            left_view_self_contained_flag: false,
            right_view_self_contained_flag: false,
        };

        if field_views_flag {
            info.top_field_is_left_view_flag = reader.read_bit()?;
        } else {
            info.current_frame_is_left_view_flag = reader.read_bit()?;
            info.next_frame_is_second_view_flag = reader.read_bit()?;
        }

        info.left_view_self_contained_flag = reader.read_bit()?;
        info.right_view_self_contained_flag = reader.read_bit()?;

        Ok(info)
    }
}

nutype_enum! {
    /// `frame_packing_arrangement_type`, D.2.26 Table D-8.
    pub enum FramePackingType(u8) {
        /// checkerboard interleaving
        Checkerboard = 0,
        /// column interleaving
        ColumnInterleaved = 1,
        /// row interleaving
        RowInterleaved = 2,
        /// side by side
        SideBySide = 3,
        /// top and bottom
        TopBottom = 4,
        /// temporal interleaving of whole frames
        FrameAlternation = 5,
        /// 2D, no packing (H.265 only)
        Mono = 6,
    }
}

/// The arrangement carried by a frame packing SEI that is not a cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePackingArrangement {
    /// `frame_packing_arrangement_type`
    pub arrangement_type: FramePackingType,
    /// `quincunx_sampling_flag`
    pub quincunx_sampling_flag: bool,
    /// `content_interpretation_type`, 1: frame 0 is left, 2: frame 0 is right.
    pub content_interpretation_type: u8,
    /// `spatial_flipping_flag`
    pub spatial_flipping_flag: bool,
    /// `frame0_flipped_flag`
    pub frame0_flipped_flag: bool,
    /// `field_views_flag`
    pub field_views_flag: bool,
    /// `current_frame_is_frame0_flag`
    pub current_frame_is_frame0_flag: bool,
}

/// `frame_packing_arrangement()`, the part shared by H.264 D.1.26 and H.265 D.2.16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePacking {
    /// `frame_packing_arrangement_id`
    pub id: u32,
    /// `None` when `frame_packing_arrangement_cancel_flag` is set.
    pub arrangement: Option<FramePackingArrangement>,
}

impl FramePacking {
    /// Parses the payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new_from_slice(payload);

        let id = reader.read_exp_golomb()?;
        if id > u32::MAX as u64 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "frame_packing_arrangement_id is too large"));
        }

        let cancel = reader.read_bit()?;
        let arrangement = if cancel {
            None
        } else {
            Some(FramePackingArrangement {
                arrangement_type: FramePackingType::from(reader.read_bits(7)? as u8),
                quincunx_sampling_flag: reader.read_bit()?,
                content_interpretation_type: reader.read_bits(6)? as u8,
                spatial_flipping_flag: reader.read_bit()?,
                frame0_flipped_flag: reader.read_bit()?,
                field_views_flag: reader.read_bit()?,
                current_frame_is_frame0_flag: reader.read_bit()?,
            })
        };

        Ok(Self { id: id as u32, arrangement })
    }
}

/// `mastering_display_colour_volume()`, D.1.29.
///
/// The primaries are kept in bitstream order (green, blue, red).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasteringDisplayColourVolume {
    /// `display_primaries_x` and `display_primaries_y`, in 0.00002 units.
    pub display_primaries: [(u16, u16); 3],
    /// `white_point_x` and `white_point_y`, in 0.00002 units.
    pub white_point: (u16, u16),
    /// `max_display_mastering_luminance`, in 0.0001 cd/m2.
    pub max_display_mastering_luminance: u32,
    /// `min_display_mastering_luminance`, in 0.0001 cd/m2.
    pub min_display_mastering_luminance: u32,
}

impl MasteringDisplayColourVolume {
    /// Parses the payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let mut reader = io::Cursor::new(payload);

        let mut display_primaries = [(0, 0); 3];
        for primary in &mut display_primaries {
            *primary = (reader.read_u16::<BigEndian>()?, reader.read_u16::<BigEndian>()?);
        }

        Ok(Self {
            display_primaries,
            white_point: (reader.read_u16::<BigEndian>()?, reader.read_u16::<BigEndian>()?),
            max_display_mastering_luminance: reader.read_u32::<BigEndian>()?,
            min_display_mastering_luminance: reader.read_u32::<BigEndian>()?,
        })
    }

    /// The primaries reordered to red, green, blue.
    pub const fn primaries_rgb(&self) -> [(u16, u16); 3] {
        [self.display_primaries[2], self.display_primaries[0], self.display_primaries[1]]
    }
}

/// `content_light_level_info()`, D.1.31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLightLevelInfo {
    /// `max_content_light_level`, in cd/m2.
    pub max_content_light_level: u16,
    /// `max_pic_average_light_level`, in cd/m2.
    pub max_pic_average_light_level: u16,
}

impl ContentLightLevelInfo {
    /// Parses the payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let mut reader = io::Cursor::new(payload);
        Ok(Self {
            max_content_light_level: reader.read_u16::<BigEndian>()?,
            max_pic_average_light_level: reader.read_u16::<BigEndian>()?,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_sei_messages() {
        let rbsp = [
            // recovery point, 1 byte
            0x06, 0x01, 0b1100_0000, //
            // content light level, 4 bytes
            0x90, 0x04, 0x03, 0xe8, 0x01, 0x90, //
            // trailing bits
            0x80,
        ];

        let messages: Vec<_> = SeiMessages::new(&rbsp).collect::<io::Result<_>>().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload_type, SeiPayloadType::RecoveryPoint);
        assert_eq!(messages[1].payload_type, SeiPayloadType::ContentLightLevelInfo);

        let recovery = RecoveryPoint::parse(messages[0].payload).unwrap();
        assert_eq!(recovery.recovery_frame_cnt, 0);
        assert!(recovery.exact_match_flag);

        let cll = ContentLightLevelInfo::parse(messages[1].payload).unwrap();
        insta::assert_debug_snapshot!(cll, @r"
        ContentLightLevelInfo {
            max_content_light_level: 1000,
            max_pic_average_light_level: 400,
        }
        ");
    }

    #[test]
    fn test_sei_extended_payload_type() {
        // 0xff + 0x05 = 260
        let rbsp = [0xff, 0x05, 0x00, 0x80];
        let messages: Vec<_> = SeiMessages::new(&rbsp).collect::<io::Result<_>>().unwrap();
        assert_eq!(messages[0].payload_type, SeiPayloadType::from(260));
        assert!(messages[0].payload.is_empty());
    }

    #[test]
    fn test_sei_partial_success() {
        let rbsp = [0x06, 0x01, 0b1100_0000, 0x05, 0x10, 0x00];
        let mut messages = SeiMessages::new(&rbsp);

        assert!(messages.next().unwrap().is_ok());
        assert_eq!(messages.next().unwrap().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        assert!(messages.next().is_none());
    }

    #[test]
    fn test_mastering_display_colour_volume() {
        let payload = [
            0x21, 0x34, 0x9d, 0x08, // green
            0x1a, 0x0a, 0x08, 0x34, // blue
            0x84, 0xd0, 0x3e, 0x80, // red
            0x3d, 0x13, 0x40, 0x42, // white point
            0x00, 0x98, 0x96, 0x80, // 1000 cd/m2
            0x00, 0x00, 0x00, 0x32, // 0.005 cd/m2
        ];

        let mdcv = MasteringDisplayColourVolume::parse(&payload).unwrap();
        assert_eq!(mdcv.display_primaries[0], (8500, 40200));
        assert_eq!(mdcv.primaries_rgb()[0], (34000, 16000));
        assert_eq!(mdcv.white_point, (15635, 16450));
        assert_eq!(mdcv.max_display_mastering_luminance, 10_000_000);
        assert_eq!(mdcv.min_display_mastering_luminance, 50);

        assert!(MasteringDisplayColourVolume::parse(&payload[..20]).is_err());
    }

    #[test]
    fn test_frame_packing() {
        // id 0, not cancelled, side by side, content interpretation 1, rest unset
        let packing = FramePacking::parse(&[0b1000_0001, 0b1000_0001, 0b0000_0000]).unwrap();
        insta::assert_debug_snapshot!(packing, @r"
        FramePacking {
            id: 0,
            arrangement: Some(
                FramePackingArrangement {
                    arrangement_type: FramePackingType::SideBySide,
                    quincunx_sampling_flag: false,
                    content_interpretation_type: 1,
                    spatial_flipping_flag: false,
                    frame0_flipped_flag: false,
                    field_views_flag: false,
                    current_frame_is_frame0_flag: false,
                },
            ),
        }
        ");

        // id 0, cancelled
        let cancel = FramePacking::parse(&[0b1100_0000]).unwrap();
        assert_eq!(cancel.arrangement, None);
    }

    #[test]
    fn test_stereo_video_info() {
        let frames = StereoVideoInfo::parse(&[0b0111_0000]).unwrap();
        assert!(!frames.field_views_flag);
        assert!(frames.current_frame_is_left_view_flag);
        assert!(frames.next_frame_is_second_view_flag);
        assert!(frames.left_view_self_contained_flag);

        let fields = StereoVideoInfo::parse(&[0b1000_0000]).unwrap();
        assert!(fields.field_views_flag);
        assert!(!fields.top_field_is_left_view_flag);
    }

    #[test]
    fn test_pic_struct() {
        assert_eq!(PicStruct::TopField.ticks(), Some(1));
        assert_eq!(PicStruct::Frame.ticks(), Some(2));
        assert_eq!(PicStruct::FrameTripling.ticks(), Some(6));
        assert_eq!(PicStruct::from(9).ticks(), None);
        assert!(PicStruct::BottomTop.is_interlaced());
        assert!(!PicStruct::FrameDoubling.is_interlaced());
    }
}
