//! H.266/VVC (ISO/IEC-23090-3) header decoding for stream parsers.
//!
//! Only the leading syntax elements are read: enough to tell access units
//! apart, to find random access points and to describe the picture format.
//!
//! - [`NALUnitHeader`] and [`NALUnitType`].
//! - [`Vps`], [`Sps`] and [`Pps`] ids, the SPS picture geometry, chroma
//!   format, bit depth and [`ProfileTierLevel`].
//! - [`PictureHeader`], either in its own NAL unit or embedded in a
//!   [`SliceHeader`].
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(feature = "docs", doc = "## Feature flags")]
#![cfg_attr(feature = "docs", doc = document_features::document_features!())]
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::missing_const_for_fn)]

use std::io;

mod enums;
mod nal_unit_header;
mod picture_header;
mod pps;
mod profile_tier_level;
mod slice;
mod sps;
mod vps;

pub use enums::*;
pub use nal_unit_header::NALUnitHeader;
pub use picture_header::PictureHeader;
pub use pps::Pps;
pub use profile_tier_level::ProfileTierLevel;
pub use slice::SliceHeader;
pub use sps::{ConformanceWindow, Sps};
pub use vps::Vps;

/// Supplemental enhancement information.
///
/// VVC SEI messages (ITU-T H.274) use the same `sei_message()` framing and
/// payload numbering as H.264.
pub mod sei {
    pub use reframe_h264::sei::{
        ContentLightLevelInfo, FramePacking, FramePackingArrangement, FramePackingType, MasteringDisplayColourVolume,
        SeiMessage, SeiMessages, SeiPayloadType,
    };
}

fn check_max(name: &str, value: u64, max: u64) -> io::Result<()> {
    if value > max {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{name} is out of range [0, {max}]: {value}"),
        ));
    }

    Ok(())
}
