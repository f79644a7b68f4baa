//! Picking the output format from the input format and what downstream accepts.

use crate::error::ParseError;
use crate::format::{Alignment, FormatDescriptor, StreamFormat};

/// Fixes the output format.
///
/// `downstream` lists the accepted formats in order of preference, an empty
/// list accepts anything. The alignment is chosen in this order:
///
/// 1. the richest alignment of the codec, if an entry accepts it
/// 2. the input alignment, if an entry accepts it
/// 3. the first concrete output alignment advertised
/// 4. the richest alignment of the codec
///
/// The result only depends on the arguments.
pub fn negotiate(input: &FormatDescriptor, downstream: &[FormatDescriptor]) -> Result<FormatDescriptor, ParseError> {
    input.validate()?;

    let codec = input.codec;
    let candidates: Vec<&FormatDescriptor> = downstream.iter().filter(|entry| entry.codec == codec).collect();
    for entry in &candidates {
        entry.validate()?;
    }

    if !downstream.is_empty() && candidates.is_empty() {
        tracing::warn!(%codec, "downstream accepts no format of this codec, using defaults");
    }

    let richest = codec.richest_alignment();
    let pick = candidates
        .iter()
        .find(|entry| entry.accepts_alignment(richest))
        .map(|entry| (Some(**entry), richest))
        .or_else(|| {
            let alignment = input.alignment.filter(|a| a.is_output(codec))?;
            candidates
                .iter()
                .find(|entry| entry.accepts_alignment(alignment))
                .map(|entry| (Some(**entry), alignment))
        })
        .or_else(|| {
            candidates.iter().find_map(|entry| {
                let alignment = entry.alignment.filter(|a| a.is_output(codec))?;
                Some((Some(**entry), alignment))
            })
        });

    let (entry, alignment) = pick.unwrap_or((None, richest));

    let annexb_allowed = |format: &StreamFormat| *format != StreamFormat::AnnexB || alignment == Alignment::TemporalUnit;

    let output = match entry.and_then(|entry| entry.stream_format.filter(annexb_allowed).map(|f| (f, entry))) {
        Some((format, entry)) => FormatDescriptor::new(codec)
            .with_stream_format(format)
            .with_nal_length_size(entry.nal_length_size),
        None => match input.stream_format.filter(annexb_allowed) {
            Some(format) => FormatDescriptor::new(codec)
                .with_stream_format(format)
                .with_nal_length_size(input.nal_length_size),
            None => FormatDescriptor::new(codec).with_stream_format(codec.default_stream_format()),
        },
    }
    .with_alignment(alignment);

    output.validate()?;
    tracing::debug!(%input, %output, "negotiated output format");

    Ok(output)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::format::Codec;

    fn h264(format: StreamFormat, alignment: Alignment) -> FormatDescriptor {
        FormatDescriptor::new(Codec::H264)
            .with_stream_format(format)
            .with_alignment(alignment)
    }

    #[test]
    fn test_prefers_richest() {
        let input = h264(StreamFormat::ByteStream, Alignment::Unit);
        let downstream = [
            h264(StreamFormat::Avc, Alignment::Unit),
            FormatDescriptor::new(Codec::H264).with_stream_format(StreamFormat::Avc3),
        ];

        let output = negotiate(&input, &downstream).unwrap();
        assert_eq!(output, h264(StreamFormat::Avc3, Alignment::AccessUnit));
    }

    #[test]
    fn test_falls_back_to_input_alignment() {
        let input = h264(StreamFormat::ByteStream, Alignment::Unit);
        let downstream = [
            h264(StreamFormat::ByteStream, Alignment::Byte),
            h264(StreamFormat::Avc, Alignment::Unit),
        ];

        let output = negotiate(&input, &downstream).unwrap();
        assert_eq!(output, h264(StreamFormat::Avc, Alignment::Unit));
    }

    #[test]
    fn test_first_concrete_entry() {
        let input = FormatDescriptor::new(Codec::Av1).with_stream_format(StreamFormat::Obu);
        let downstream = [FormatDescriptor::new(Codec::Av1)
            .with_stream_format(StreamFormat::Obu)
            .with_alignment(Alignment::Frame)];

        let output = negotiate(&input, &downstream).unwrap();
        assert_eq!(output.alignment, Some(Alignment::Frame));
        assert_eq!(output.stream_format, Some(StreamFormat::Obu));
    }

    #[test]
    fn test_defaults() {
        let input = FormatDescriptor::new(Codec::H265);
        let output = negotiate(&input, &[]).unwrap();
        assert_eq!(output.to_string(), "video/h265, stream-format=byte-stream, alignment=au");

        // annexb input cannot be kept for frame output
        let input = FormatDescriptor::new(Codec::Av1)
            .with_stream_format(StreamFormat::AnnexB)
            .with_alignment(Alignment::TemporalUnit);
        let downstream = [FormatDescriptor::new(Codec::Av1).with_alignment(Alignment::Frame)];
        let output = negotiate(&input, &downstream).unwrap();
        assert_eq!(output.to_string(), "video/av1, stream-format=obu-stream, alignment=frame");
    }

    #[test]
    fn test_deterministic() {
        let input = h264(StreamFormat::Avc, Alignment::AccessUnit);
        let downstream = [
            h264(StreamFormat::ByteStream, Alignment::Unit),
            FormatDescriptor::new(Codec::H264)
                .with_stream_format(StreamFormat::Avc)
                .with_nal_length_size(2),
        ];

        let first = negotiate(&input, &downstream).unwrap();
        for _ in 0..4 {
            assert_eq!(negotiate(&input, &downstream).unwrap(), first);
        }
        assert_eq!(first.nal_length_size, 2);
        assert_eq!(first.alignment, Some(Alignment::AccessUnit));
    }

    #[test]
    fn test_conflict() {
        let input = FormatDescriptor::new(Codec::Av1)
            .with_stream_format(StreamFormat::AnnexB)
            .with_alignment(Alignment::Unit);
        let err = negotiate(&input, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "negotiation conflict: stream-format annexb requires tu alignment, not unit"
        );

        let input = FormatDescriptor::new(Codec::H264);
        let downstream = [FormatDescriptor::new(Codec::H264).with_stream_format(StreamFormat::Hvc1)];
        assert!(matches!(
            negotiate(&input, &downstream),
            Err(ParseError::NegotiationConflict(_))
        ));
    }
}
