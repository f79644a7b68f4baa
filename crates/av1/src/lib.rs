//! AV1 Open Bitstream Unit (OBU) decoding.
//!
//! This crate decodes the parts of an AV1 bitstream that a stream parser needs
//! to find frame and temporal unit boundaries:
//!
//! - [`ObuHeader`] including the optional extension header and size field.
//! - [`SequenceHeaderObu`] (AV1 - 5.5).
//! - [`FrameHeader`], the uncompressed header up to and including the tile
//!   info (AV1 - 5.9), with [`ReferenceFrames`] bookkeeping.
//! - [`TileGroup`] bounds (AV1 - 5.11.1).
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

mod obu;

pub use obu::frame_header::{FrameHeader, FrameType, TileInfo};
pub use obu::reference::{RefFrame, ReferenceFrames};
pub use obu::tile_group::TileGroup;
pub use obu::{ObuExtensionHeader, ObuHeader, ObuType, seq};

/// The sequence header, also reachable as [`seq::SequenceHeaderObu`].
pub use obu::seq::SequenceHeaderObu;
