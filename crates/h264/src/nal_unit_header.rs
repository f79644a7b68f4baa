use std::io;

use byteorder::ReadBytesExt;

use crate::NALUnitType;

/// The extension that follows the header byte of NAL unit types 14, 20 and 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitHeaderExtension {
    /// `nal_unit_header_svc_extension()`, G.7.3.1.1
    Svc,
    /// `nal_unit_header_mvc_extension()`, H.7.3.1.1
    Mvc,
    /// `nal_unit_header_3davc_extension()`, J.7.3.1.1
    Avc3d,
}

/// NAL unit header, ISO/IEC-14496-10-2022 - 7.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NALUnitHeader {
    /// `nal_ref_idc`, 0 for non-reference pictures.
    pub nal_ref_idc: u8,
    /// `nal_unit_type`
    pub nal_unit_type: NALUnitType,
    /// The header extension of prefix and extension NAL units.
    pub extension: Option<NALUnitHeaderExtension>,
}

impl NALUnitHeader {
    /// Parses the header byte and, for types 14, 20 and 21, the extension.
    pub fn parse(reader: &mut impl io::Read) -> io::Result<Self> {
        let byte = reader.read_u8()?;
        if byte & 0x80 != 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "forbidden_zero_bit is set"));
        }

        let nal_ref_idc = (byte >> 5) & 0b11;
        let nal_unit_type = NALUnitType::from(byte & 0b1_1111);

        let extension = if nal_unit_type.has_header_extension() {
            let first = reader.read_u8()?;
            let flag = first & 0x80 != 0;
            // svc_extension_flag, or avc_3d_extension_flag for type 21
            let extension = match nal_unit_type {
                NALUnitType::SliceLayerExtension2 if flag => NALUnitHeaderExtension::Avc3d,
                _ if flag => NALUnitHeaderExtension::Svc,
                _ => NALUnitHeaderExtension::Mvc,
            };

            // the remainder of the extension
            let rest = if extension == NALUnitHeaderExtension::Avc3d { 1 } else { 2 };
            for _ in 0..rest {
                reader.read_u8()?;
            }

            Some(extension)
        } else {
            None
        };

        Ok(Self {
            nal_ref_idc,
            nal_unit_type,
            extension,
        })
    }

    /// Number of bytes the header occupies, extension included.
    pub const fn header_len(&self) -> usize {
        match self.extension {
            None => 1,
            Some(NALUnitHeaderExtension::Avc3d) => 3,
            Some(_) => 4,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_nal_unit_header() {
        let header = NALUnitHeader::parse(&mut io::Cursor::new([0x65])).unwrap();
        insta::assert_debug_snapshot!(header, @r"
        NALUnitHeader {
            nal_ref_idc: 3,
            nal_unit_type: NALUnitType::IDRSliceLayerWithoutPartitioning,
            extension: None,
        }
        ");
        assert_eq!(header.header_len(), 1);
    }

    #[test]
    fn test_nal_unit_header_extension() {
        // coded slice extension, mvc
        let header = NALUnitHeader::parse(&mut io::Cursor::new([0x74, 0x00, 0x01, 0x02, 0xff])).unwrap();
        assert_eq!(header.nal_unit_type, NALUnitType::SliceLayerExtension);
        assert_eq!(header.extension, Some(NALUnitHeaderExtension::Mvc));
        assert_eq!(header.header_len(), 4);

        // prefix nal, svc
        let header = NALUnitHeader::parse(&mut io::Cursor::new([0x6e, 0x80, 0x01, 0x02])).unwrap();
        assert_eq!(header.extension, Some(NALUnitHeaderExtension::Svc));

        // 3d-avc slice extension
        let header = NALUnitHeader::parse(&mut io::Cursor::new([0x75, 0x80, 0x01])).unwrap();
        assert_eq!(header.extension, Some(NALUnitHeaderExtension::Avc3d));
        assert_eq!(header.header_len(), 3);
    }

    #[test]
    fn test_nal_unit_header_forbidden_bit() {
        let err = NALUnitHeader::parse(&mut io::Cursor::new([0xe5])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = NALUnitHeader::parse(&mut io::Cursor::new([0x74, 0x00])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
