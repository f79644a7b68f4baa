use std::io;
use std::num::NonZero;

use reframe_bytes_util::BitReader;

use crate::{NALUnitType, check_max};

/// NAL unit header, ISO/IEC-23090-3-2022 - 7.3.1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NALUnitHeader {
    /// `nuh_layer_id`, 0..=55.
    pub nuh_layer_id: u8,
    /// `nal_unit_type`
    pub nal_unit_type: NALUnitType,
    /// `TemporalId + 1`, never 0.
    pub nuh_temporal_id_plus1: NonZero<u8>,
}

impl NALUnitHeader {
    /// Size of the header in bytes.
    pub const LEN: usize = 2;

    /// Parses the two header bytes.
    ///
    /// NAL units with `nuh_reserved_zero_bit` set are rejected, decoders are
    /// required to discard them.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        if bit_reader.read_bit()? {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "forbidden_zero_bit is not zero"));
        }

        if bit_reader.read_bit()? {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nuh_reserved_zero_bit is not zero"));
        }

        let nuh_layer_id = bit_reader.read_bits(6)? as u8;
        check_max("nuh_layer_id", nuh_layer_id as u64, 55)?;

        let nal_unit_type = NALUnitType::from(bit_reader.read_bits(5)? as u8);
        let nuh_temporal_id_plus1 = NonZero::new(bit_reader.read_bits(3)? as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "nuh_temporal_id_plus1 cannot be 0"))?;
        let temporal_id = nuh_temporal_id_plus1.get() - 1;

        // IDR_W_RADL..=RSV_IRAP_11 and the sequence level non-VCL types
        let zero_temporal_id = matches!(nal_unit_type.0, 7..=11)
            || matches!(
                nal_unit_type,
                NALUnitType::OpiNut
                    | NALUnitType::DciNut
                    | NALUnitType::VpsNut
                    | NALUnitType::SpsNut
                    | NALUnitType::EosNut
                    | NALUnitType::EobNut
            );
        if zero_temporal_id && temporal_id != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("TemporalId must be 0 for nal_unit_type {nal_unit_type:?}"),
            ));
        }

        if nuh_layer_id == 0 && nal_unit_type == NALUnitType::StsaNut && temporal_id == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "TemporalId must not be 0 for STSA_NUT in the base layer",
            ));
        }

        Ok(Self {
            nuh_layer_id,
            nal_unit_type,
            nuh_temporal_id_plus1,
        })
    }

    /// `TemporalId`
    pub const fn temporal_id(&self) -> u8 {
        self.nuh_temporal_id_plus1.get() - 1
    }
}
