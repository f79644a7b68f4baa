//! Exponential-Golomb coding for [`BitReader`] and [`BitWriter`].
//!
//! `ue(v)` and `se(v)` as defined by ISO/IEC-14496-10 - 9.1 and reused
//! unchanged by H.265 and H.266.
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

use reframe_bytes_util::{BitReader, BitWriter};

/// Extension trait for reading Exp-Golomb encoded numbers from a bit reader.
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned `ue(v)` number.
    fn read_exp_golomb(&mut self) -> io::Result<u64>;

    /// Reads a signed `se(v)` number.
    fn read_signed_exp_golomb(&mut self) -> io::Result<i64> {
        let code = self.read_exp_golomb()?;

        if code % 2 == 0 {
            Ok(-((code / 2) as i64))
        } else {
            Ok(code.div_ceil(2) as i64)
        }
    }
}

impl<R: io::Read> BitReaderExpGolombExt for BitReader<R> {
    fn read_exp_golomb(&mut self) -> io::Result<u64> {
        let mut leading_zeros = 0;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 63 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "exp-golomb code is too long"));
            }
        }

        let suffix = self.read_bits(leading_zeros)?;
        Ok((1u64 << leading_zeros) - 1 + suffix)
    }
}

/// Extension trait for writing Exp-Golomb encoded numbers to a bit writer.
pub trait BitWriterExpGolombExt {
    /// Writes an unsigned `ue(v)` number.
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()>;

    /// Writes a signed `se(v)` number.
    fn write_signed_exp_golomb(&mut self, number: i64) -> io::Result<()> {
        let code = if number <= 0 {
            number.unsigned_abs() * 2
        } else {
            number as u64 * 2 - 1
        };

        self.write_exp_golomb(code)
    }
}

impl<W: io::Write> BitWriterExpGolombExt for BitWriter<W> {
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()> {
        let value = input
            .checked_add(1)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "exp-golomb value is too large"))?;
        let bits = 64 - value.leading_zeros() as u8;

        self.write_bits(0, bits - 1)?;
        self.write_bits(value, bits)
    }
}
