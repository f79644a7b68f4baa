use std::io;
use std::num::NonZero;

use reframe_bytes_util::BitReader;

use crate::NALUnitType;
use crate::range_check::range_check;

/// NAL unit header, ISO/IEC-23008-2-2020 - 7.3.1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NALUnitHeader {
    /// `nal_unit_type`
    pub nal_unit_type: NALUnitType,

    /// Identifier of the layer a VCL NAL unit belongs to, or the layer a
    /// non-VCL NAL unit applies to.
    ///
    /// Ranges from \[0, 63\], 63 is reserved.
    pub nuh_layer_id: u8,

    /// `TemporalId + 1`, never 0.
    pub nuh_temporal_id_plus1: NonZero<u8>,
}

impl NALUnitHeader {
    /// Size of the header in bytes.
    pub const LEN: usize = 2;

    /// Parses the two header bytes and checks the layer and temporal id constraints.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let forbidden_zero_bit = bit_reader.read_bit()?;
        if forbidden_zero_bit {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "forbidden_zero_bit is not zero"));
        }

        let nal_unit_type = NALUnitType::from(bit_reader.read_bits(6)? as u8);
        let nuh_layer_id = bit_reader.read_bits(6)? as u8;
        range_check!(nuh_layer_id, 0, 63)?;

        if nal_unit_type == NALUnitType::EobNut && nuh_layer_id != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "nuh_layer_id must be 0 when nal_unit_type is EOB_NUT",
            ));
        }

        let nuh_temporal_id_plus1 = NonZero::new(bit_reader.read_bits(3)? as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "nuh_temporal_id_plus1 cannot be 0"))?;
        let temporal_id = nuh_temporal_id_plus1.get() - 1;

        let zero_temporal_id = nal_unit_type.is_irap()
            || matches!(
                nal_unit_type,
                NALUnitType::VpsNut | NALUnitType::SpsNut | NALUnitType::EosNut | NALUnitType::EobNut
            );
        if zero_temporal_id && temporal_id != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("TemporalId must be 0 for nal_unit_type {nal_unit_type:?}"),
            ));
        }

        let sub_layer_switch = matches!(nal_unit_type, NALUnitType::TsaN | NALUnitType::TsaR)
            || (nuh_layer_id == 0 && matches!(nal_unit_type, NALUnitType::StsaN | NALUnitType::StsaR));
        if sub_layer_switch && temporal_id == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("TemporalId must not be 0 for nal_unit_type {nal_unit_type:?}"),
            ));
        }

        Ok(Self {
            nal_unit_type,
            nuh_layer_id,
            nuh_temporal_id_plus1,
        })
    }

    /// `TemporalId` (7-1)
    pub const fn temporal_id(&self) -> u8 {
        self.nuh_temporal_id_plus1.get() - 1
    }
}
