//! Supplemental enhancement information.
//!
//! H.265 shares the `sei_message()` framing and most payload layouts with
//! H.264, those are re-exported from [`reframe_h264::sei`]. The recovery point
//! payload counts pictures in POC units and has its own type.

use std::io;

use reframe_bytes_util::BitReader;
use reframe_expgolomb::BitReaderExpGolombExt;
pub use reframe_h264::sei::{
    ContentLightLevelInfo, FramePacking, FramePackingArrangement, FramePackingType, MasteringDisplayColourVolume,
    SeiMessage, SeiMessages, SeiPayloadType,
};

/// `recovery_point()`, ISO/IEC-23008-2-2020 - D.2.8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPoint {
    /// `recovery_poc_cnt`, may be negative.
    pub recovery_poc_cnt: i64,
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
            recovery_poc_cnt: reader.read_signed_exp_golomb()?,
            exact_match_flag: reader.read_bit()?,
            broken_link_flag: reader.read_bit()?,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_point() {
        // recovery_poc_cnt -1 (011), exact match, no broken link
        let recovery = RecoveryPoint::parse(&[0b0111_0000]).unwrap();
        assert_eq!(recovery.recovery_poc_cnt, -1);
        assert!(recovery.exact_match_flag);
        assert!(!recovery.broken_link_flag);
    }

    #[test]
    fn test_prefix_sei_messages() {
        // prefix SEI RBSP after the two byte header: recovery point then trailing bits
        let rbsp = [0x06, 0x01, 0b1100_0000, 0x80];
        let messages: Vec<_> = SeiMessages::new(&rbsp).collect::<io::Result<_>>().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload_type, SeiPayloadType::RecoveryPoint);

        let recovery = RecoveryPoint::parse(messages[0].payload).unwrap();
        assert_eq!(recovery.recovery_poc_cnt, 0);
        assert!(recovery.exact_match_flag);
    }
}
