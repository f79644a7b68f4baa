use std::io;

use reframe_bytes_util::{BitReader, EmulationPreventionIo};

use crate::{NALUnitHeader, PictureHeader};

/// The leading fields of a slice header, ISO/IEC-23090-3-2022 - 7.3.7.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeader {
    /// The NAL unit header of the slice.
    pub nal_unit_header: NALUnitHeader,
    /// `sh_picture_header_in_slice_header_flag`, the picture has this single slice.
    pub sh_picture_header_in_slice_header_flag: bool,
    /// The embedded picture header, when `sh_picture_header_in_slice_header_flag` is set.
    pub picture_header: Option<PictureHeader>,
}

impl SliceHeader {
    /// Parses a slice NAL unit whose payload still contains emulation prevention bytes.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Parses a slice NAL unit, header included, from its RBSP bytes.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if !nal_unit_header.nal_unit_type.is_vcl() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit is not a slice"));
        }

        let sh_picture_header_in_slice_header_flag = bit_reader.read_bit()?;
        let picture_header = if sh_picture_header_in_slice_header_flag {
            Some(PictureHeader::parse_structure(&mut bit_reader)?)
        } else {
            None
        };

        Ok(Self {
            nal_unit_header,
            sh_picture_header_in_slice_header_flag,
            picture_header,
        })
    }
}
