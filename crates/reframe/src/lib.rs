//! Access unit reassembly and alignment conversion for video elementary streams.
//!
//! A [`Reassembler`] takes an H.264, H.265, H.266 or AV1 elementary stream in
//! arbitrary chunks and produces complete units in the negotiated output
//! format:
//!
//! - NAL codecs: one NAL unit or one access unit per output unit, as start
//!   code delimited byte-stream or length prefixed packetized NAL units.
//! - AV1: one OBU, one frame or one temporal unit per output unit, in the low
//!   overhead bitstream format or in annex B.
//!
//! Output units carry keyframe, header, discontinuity and marker flags and
//! the stream description ([`StreamInfo`]) whenever it changes.
//!
//! ```
//! use reframe::{Alignment, Codec, FormatDescriptor, InputMeta, Reassembler, StreamFormat, Timestamps};
//!
//! let mut reassembler = Reassembler::builder(Codec::Av1)
//!     .input_format(FormatDescriptor::new(Codec::Av1).with_stream_format(StreamFormat::Obu))
//!     .downstream([FormatDescriptor::new(Codec::Av1).with_alignment(Alignment::TemporalUnit)])
//!     .build()?;
//!
//! // a temporal delimiter
//! let mut units = reassembler.push(&[0x12, 0x00], InputMeta::new(Timestamps::at(0)))?;
//! units.extend(reassembler.finish()?);
//! assert_eq!(units.len(), 1);
//! # Ok::<(), reframe::ParseError>(())
//! ```
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

mod av1;
mod cache;
mod codec;
mod convert;
mod emit;
mod error;
mod format;
mod nal;
mod negotiate;
mod reassembler;
mod scanner;
mod settings;
mod state;
mod unit;

pub use cache::{ChromaFormat, Colorimetry, Fraction, InterlaceMode, MultiviewFlags, MultiviewMode, StreamInfo};
pub use emit::{Caps, OutputFlags, OutputUnit, Timestamps};
pub use error::ParseError;
pub use format::{Alignment, Codec, FormatDescriptor, StreamFormat};
pub use negotiate::negotiate;
pub use reassembler::{Action, DeliverFlags, Delivery, FrameContext, InputFlags, InputMeta, Reassembler, ReassemblerBuilder};
pub use settings::ParserSettings;
pub use unit::{SyntaxUnit, UnitKind};
