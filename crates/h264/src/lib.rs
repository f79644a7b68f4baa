//! H.264 (ISO/IEC-14496-10) header decoding for stream parsers.
//!
//! The crate reads the syntax a stream parser needs to find access unit
//! boundaries and derive stream properties:
//!
//! - [`NALUnitHeader`] including the SVC/MVC/3D-AVC extension length.
//! - [`Sps`] with VUI timing, colour description, HRD delay lengths and
//!   the picture geometry.
//! - [`Pps`] ids.
//! - [`SliceHeader`], the leading fields of a slice header.
//! - [`sei`], the `sei_message()` framing shared with H.265 and H.266 and the
//!   payloads that affect stream metadata.
//!
//! Everything is parsed from NAL unit bytes, the `parse_with_emulation_prevention`
//! constructors take the escaped bytes as found in the stream.
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
pub mod sei;
mod slice;
mod sps;

pub use enums::*;
pub use nal_unit_header::{NALUnitHeader, NALUnitHeaderExtension};
pub use pps::Pps;
pub use slice::{SliceHeader, SliceType};
pub use sps::{AspectRatioInfo, ColorConfig, FrameCropInfo, HrdParameters, Sps, SpsExtended, TimingInfo, VuiParameters};
