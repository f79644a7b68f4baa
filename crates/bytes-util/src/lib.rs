//! A utility crate for working with bits and bytes while parsing codec bitstreams.
//!
//! It provides:
//!
//! - [`BitReader`] and [`BitWriter`], MSB-first bit level adapters over
//!   [`std::io::Read`] and [`std::io::Write`].
//! - leb128 helpers ([`read_leb128`], [`decode_leb128`], [`write_leb128`],
//!   [`leb128_size`]) as used by AV1.
//! - [`BytesCursorExt`] to pull zero-copy [`bytes::Bytes`] out of a cursor.
//! - [`EmulationPreventionIo`] for NAL unit payloads.
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

mod bit_read;
mod bit_write;
mod bytes_cursor;
mod emulation_prevention;
mod leb128;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use bytes_cursor::BytesCursorExt;
pub use emulation_prevention::{EmulationPreventionIo, strip_emulation_prevention};
pub use leb128::{LEB128_MAX_SIZE, decode_leb128, leb128_size, read_leb128, write_leb128};
