//! H.265 (ISO/IEC-23008-2) header decoding for stream parsers.
//!
//! Covers what is needed to split an H.265 stream into access units and to
//! describe it:
//!
//! - [`NALUnitHeader`] with the layer and temporal id.
//! - [`Vps`], [`Sps`] and [`Pps`], up to the fields slice segment headers
//!   and stream properties depend on.
//! - [`SliceSegmentHeader`], the leading fields of a slice segment header.
//! - [`sei`], the recovery point payload and the payloads shared with H.264.
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

mod enums;
mod nal_unit_header;
mod pps;
mod profile_tier_level;
mod range_check;
pub mod sei;
mod slice;
mod sps;
mod vps;

pub use enums::*;
pub use nal_unit_header::NALUnitHeader;
pub use pps::Pps;
pub use profile_tier_level::ProfileTierLevel;
pub use slice::{SliceSegmentHeader, SliceType};
pub use sps::{ConformanceWindow, ShortTermRefPicSets, Sps, VuiParameters};
pub use vps::Vps;
