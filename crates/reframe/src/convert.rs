//! Rewriting unit delimiters between stream formats.

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use reframe_av1::ObuHeader;
use reframe_bytes_util::write_leb128;

use crate::error::ParseError;
use crate::format::StreamFormat;

/// H.264 access unit delimiter allowing any slice type, with a four byte start code.
pub(crate) const AU_DELIMITER: [u8; 6] = [0x00, 0x00, 0x00, 0x01, 0x09, 0xf0];

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

fn write_error(err: io::Error) -> ParseError {
    ParseError::AllocationOrWrite(err)
}

/// Appends `nal` delimited for `format`.
pub(crate) fn write_nal(
    out: &mut Vec<u8>,
    nal: &[u8],
    format: StreamFormat,
    nal_length_size: u8,
) -> Result<(), ParseError> {
    if format.is_packetized() {
        let max = (1u64 << (8 * nal_length_size as u32)) - 1;
        if nal.len() as u64 > max {
            return Err(write_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("nal unit of {} bytes does not fit a {nal_length_size} byte length", nal.len()),
            )));
        }

        out.write_uint::<BigEndian>(nal.len() as u64, nal_length_size as usize)
            .map_err(write_error)?;
    } else {
        out.extend_from_slice(&START_CODE);
    }

    out.extend_from_slice(nal);
    Ok(())
}

/// `payload` with `insert` placed at byte `at`.
pub(crate) fn splice(payload: &[u8], at: usize, insert: &[u8]) -> Vec<u8> {
    let at = at.min(payload.len());
    let mut out = Vec::with_capacity(payload.len() + insert.len());
    out.extend_from_slice(&payload[..at]);
    out.extend_from_slice(insert);
    out.extend_from_slice(&payload[at..]);
    out
}

fn write_obu_header(out: &mut Vec<u8>, header: &ObuHeader, has_size: bool) {
    let ext = header.extension_header.is_some();
    out.push((header.obu_type.0 & 0xf) << 3 | (ext as u8) << 2 | (has_size as u8) << 1);
    if let Some(ext) = header.extension_header {
        out.push((ext.temporal_id & 0x7) << 5 | (ext.spatial_id & 0x3) << 3);
    }
}

/// Appends an OBU in annex B form: `obu_length`, the header without size field, the payload.
pub(crate) fn obu_to_annexb(out: &mut Vec<u8>, header: &ObuHeader, payload: &[u8]) -> Result<(), ParseError> {
    let obu_length = header.header_len() + payload.len();
    write_leb128(out, obu_length as u64).map_err(write_error)?;
    write_obu_header(out, header, false);
    out.extend_from_slice(payload);
    Ok(())
}

/// Appends an OBU in low overhead form: the header with size field, `obu_size`, the payload.
pub(crate) fn obu_from_annexb(out: &mut Vec<u8>, header: &ObuHeader, payload: &[u8]) -> Result<(), ParseError> {
    write_obu_header(out, header, true);
    write_leb128(out, payload.len() as u64).map_err(write_error)?;
    out.extend_from_slice(payload);
    Ok(())
}

/// Appends `inner` prefixed with its leb128 length.
pub(crate) fn wrap_leb128(out: &mut Vec<u8>, inner: &[u8]) -> Result<(), ParseError> {
    write_leb128(out, inner.len() as u64).map_err(write_error)?;
    out.write_all(inner).map_err(write_error)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use reframe_av1::{ObuExtensionHeader, ObuType};

    use super::*;

    #[test]
    fn test_write_nal() {
        let mut out = Vec::new();
        write_nal(&mut out, &[0x65, 0x88], StreamFormat::ByteStream, 4).unwrap();
        write_nal(&mut out, &[0x41, 0x9a], StreamFormat::Avc, 4).unwrap();
        write_nal(&mut out, &[0x41], StreamFormat::Avc3, 2).unwrap();
        assert_eq!(
            out,
            [0, 0, 0, 1, 0x65, 0x88, 0, 0, 0, 2, 0x41, 0x9a, 0, 1, 0x41]
        );

        let err = write_nal(&mut out, &[0; 256], StreamFormat::Hvc1, 1).unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "allocation or write failure: nal unit of 256 bytes does not fit a 1 byte length"
        );
    }

    #[test]
    fn test_splice() {
        assert_eq!(splice(&[1, 2, 3], 1, &[9, 9]), [1, 9, 9, 2, 3]);
        assert_eq!(splice(&[1, 2], 5, &[7]), [1, 2, 7]);
    }

    #[test]
    fn test_obu_annexb() {
        let header = ObuHeader {
            obu_type: ObuType::Frame,
            size: Some(3),
            extension_header: Some(ObuExtensionHeader {
                temporal_id: 1,
                spatial_id: 2,
            }),
        };

        let mut annexb = Vec::new();
        obu_to_annexb(&mut annexb, &header, &[0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(annexb, [0x05, 0x34, 0x30, 0xaa, 0xbb, 0xcc]);

        let mut obu = Vec::new();
        obu_from_annexb(&mut obu, &header, &[0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(obu, [0x36, 0x30, 0x03, 0xaa, 0xbb, 0xcc]);

        let mut wrapped = Vec::new();
        wrap_leb128(&mut wrapped, &annexb).unwrap();
        assert_eq!(wrapped[0], 6);
        assert_eq!(&wrapped[1..], annexb.as_slice());
    }
}
