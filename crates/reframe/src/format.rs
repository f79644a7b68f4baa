use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::error::ParseError;

/// The codec carried by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    /// H.266 / VVC
    H266,
    /// AV1
    Av1,
}

impl Codec {
    /// True for the NAL unit based codecs.
    pub const fn is_nal(&self) -> bool {
        !matches!(self, Self::Av1)
    }

    /// The stream format picked when nothing else decides.
    pub const fn default_stream_format(&self) -> StreamFormat {
        match self {
            Self::Av1 => StreamFormat::Obu,
            _ => StreamFormat::ByteStream,
        }
    }

    /// The most aggregated alignment the codec supports, also the default.
    pub const fn richest_alignment(&self) -> Alignment {
        match self {
            Self::Av1 => Alignment::TemporalUnit,
            _ => Alignment::AccessUnit,
        }
    }

    /// Name used in logs and caps.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
            Self::H266 => "h266",
            Self::Av1 => "av1",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How syntax units are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamFormat {
    /// Start code delimited NAL units (Annex B of the NAL codecs).
    ByteStream,
    /// Length prefixed H.264, parameter sets out of band.
    Avc,
    /// Length prefixed H.264, parameter sets in band.
    Avc3,
    /// Length prefixed H.265, parameter sets out of band.
    Hvc1,
    /// Length prefixed H.265, parameter sets in band.
    Hev1,
    /// Length prefixed H.266, parameter sets out of band.
    Vvc1,
    /// Length prefixed H.266, parameter sets in band.
    Vvi1,
    /// AV1 low overhead bitstream format, every OBU carries its size.
    #[serde(rename = "obu-stream")]
    Obu,
    /// AV1 Annex B, temporal and frame units prefixed with their leb128 size.
    #[serde(rename = "annexb")]
    AnnexB,
}

impl StreamFormat {
    /// NAL units are prefixed with a big endian length.
    pub const fn is_packetized(&self) -> bool {
        matches!(
            self,
            Self::Avc | Self::Avc3 | Self::Hvc1 | Self::Hev1 | Self::Vvc1 | Self::Vvi1
        )
    }

    /// Whether the format can carry `codec`.
    pub const fn supports(&self, codec: Codec) -> bool {
        match self {
            Self::ByteStream => codec.is_nal(),
            Self::Avc | Self::Avc3 => matches!(codec, Codec::H264),
            Self::Hvc1 | Self::Hev1 => matches!(codec, Codec::H265),
            Self::Vvc1 | Self::Vvi1 => matches!(codec, Codec::H266),
            Self::Obu | Self::AnnexB => matches!(codec, Codec::Av1),
        }
    }

    /// Parameter sets travel inside the stream.
    pub const fn parameter_sets_in_band(&self) -> bool {
        !matches!(self, Self::Avc | Self::Hvc1 | Self::Vvc1)
    }

    /// Name used in logs and caps.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ByteStream => "byte-stream",
            Self::Avc => "avc",
            Self::Avc3 => "avc3",
            Self::Hvc1 => "hvc1",
            Self::Hev1 => "hev1",
            Self::Vvc1 => "vvc1",
            Self::Vvi1 => "vvi1",
            Self::Obu => "obu-stream",
            Self::AnnexB => "annexb",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The grouping of syntax units into buffers, ordered by aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Arbitrary chunks.
    Byte,
    /// One NAL unit or OBU per buffer.
    Unit,
    /// One AV1 frame per buffer.
    Frame,
    /// One access unit per buffer.
    AccessUnit,
    /// One AV1 temporal unit per buffer.
    TemporalUnit,
}

impl Alignment {
    /// Whether `codec` input can be declared with this alignment.
    pub const fn supported_by(&self, codec: Codec) -> bool {
        match self {
            Self::Byte | Self::Unit => true,
            Self::Frame | Self::TemporalUnit => !codec.is_nal(),
            Self::AccessUnit => codec.is_nal(),
        }
    }

    /// Whether the parser can produce `codec` output with this alignment.
    pub const fn is_output(&self, codec: Codec) -> bool {
        !matches!(self, Self::Byte) && self.supported_by(codec)
    }

    /// Name used in logs and caps.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Unit => "unit",
            Self::Frame => "frame",
            Self::AccessUnit => "au",
            Self::TemporalUnit => "tu",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn default_nal_length_size() -> u8 {
    FormatDescriptor::DEFAULT_NAL_LENGTH_SIZE
}

/// A format contract, possibly partial.
///
/// Unset fields mean "any" when the descriptor comes from downstream and
/// "unknown" when it describes the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// The codec.
    pub codec: Codec,
    /// How units are delimited.
    #[serde(default)]
    pub stream_format: Option<StreamFormat>,
    /// How units are grouped.
    #[serde(default)]
    pub alignment: Option<Alignment>,
    /// Width of the NAL length prefix of packetized formats, 1 to 4.
    #[serde(default = "default_nal_length_size")]
    pub nal_length_size: u8,
}

impl FormatDescriptor {
    /// The NAL length prefix width when none is declared.
    pub const DEFAULT_NAL_LENGTH_SIZE: u8 = 4;

    /// A descriptor with only the codec set.
    pub const fn new(codec: Codec) -> Self {
        Self {
            codec,
            stream_format: None,
            alignment: None,
            nal_length_size: Self::DEFAULT_NAL_LENGTH_SIZE,
        }
    }

    /// Sets the stream format.
    pub const fn with_stream_format(mut self, stream_format: StreamFormat) -> Self {
        self.stream_format = Some(stream_format);
        self
    }

    /// Sets the alignment.
    pub const fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Sets the NAL length prefix width.
    pub const fn with_nal_length_size(mut self, nal_length_size: u8) -> Self {
        self.nal_length_size = nal_length_size;
        self
    }

    /// Both the stream format and the alignment are known.
    pub const fn is_fixed(&self) -> bool {
        self.stream_format.is_some() && self.alignment.is_some()
    }

    /// Whether this descriptor, read as a downstream capability, admits `alignment`.
    pub fn accepts_alignment(&self, alignment: Alignment) -> bool {
        self.alignment.is_none_or(|own| own == alignment)
    }

    /// Rejects descriptors whose fields contradict each other.
    pub fn validate(&self) -> Result<(), ParseError> {
        if let Some(format) = self.stream_format {
            if !format.supports(self.codec) {
                return Err(ParseError::conflict(format!(
                    "stream-format {format} cannot carry {}",
                    self.codec
                )));
            }

            if format.is_packetized() && !(1..=4).contains(&self.nal_length_size) {
                return Err(ParseError::conflict(format!(
                    "nal length size {} is outside 1..=4",
                    self.nal_length_size
                )));
            }
        }

        if let Some(alignment) = self.alignment {
            if !alignment.supported_by(self.codec) {
                return Err(ParseError::conflict(format!(
                    "alignment {alignment} is not defined for {}",
                    self.codec
                )));
            }

            if self.stream_format == Some(StreamFormat::AnnexB) && alignment != Alignment::TemporalUnit {
                return Err(ParseError::conflict(format!(
                    "stream-format annexb requires tu alignment, not {alignment}"
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn stream_format_or_default(&self) -> StreamFormat {
        self.stream_format.unwrap_or(self.codec.default_stream_format())
    }

    pub(crate) fn alignment_or(&self, alignment: Alignment) -> Alignment {
        self.alignment.unwrap_or(alignment)
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video/{}", self.codec)?;
        if let Some(format) = self.stream_format {
            write!(f, ", stream-format={format}")?;
        }
        if let Some(alignment) = self.alignment {
            write!(f, ", alignment={alignment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_order() {
        assert!(Alignment::Byte < Alignment::Unit);
        assert!(Alignment::Unit < Alignment::Frame);
        assert!(Alignment::Frame < Alignment::AccessUnit);
        assert!(Alignment::AccessUnit < Alignment::TemporalUnit);
    }

    #[test]
    fn test_alignment_support() {
        assert!(Alignment::AccessUnit.is_output(Codec::H264));
        assert!(!Alignment::Frame.is_output(Codec::H265));
        assert!(!Alignment::Byte.is_output(Codec::Av1));
        assert!(Alignment::Byte.supported_by(Codec::Av1));
        assert!(Alignment::TemporalUnit.is_output(Codec::Av1));
        assert!(!Alignment::AccessUnit.supported_by(Codec::Av1));
    }

    #[test]
    fn test_validate() {
        let ok = FormatDescriptor::new(Codec::H264)
            .with_stream_format(StreamFormat::Avc)
            .with_alignment(Alignment::AccessUnit);
        assert!(ok.validate().is_ok());
        assert!(ok.is_fixed());

        let err = FormatDescriptor::new(Codec::H265)
            .with_stream_format(StreamFormat::Avc)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "negotiation conflict: stream-format avc cannot carry h265");

        let err = FormatDescriptor::new(Codec::Av1)
            .with_stream_format(StreamFormat::AnnexB)
            .with_alignment(Alignment::Frame)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "negotiation conflict: stream-format annexb requires tu alignment, not frame"
        );

        let err = FormatDescriptor::new(Codec::H264)
            .with_stream_format(StreamFormat::Avc3)
            .with_nal_length_size(5)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "negotiation conflict: nal length size 5 is outside 1..=4");

        let err = FormatDescriptor::new(Codec::Av1)
            .with_alignment(Alignment::AccessUnit)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "negotiation conflict: alignment au is not defined for av1");
    }

    #[test]
    fn test_stream_format() {
        assert!(StreamFormat::Hev1.is_packetized());
        assert!(!StreamFormat::ByteStream.is_packetized());
        assert!(StreamFormat::Hev1.parameter_sets_in_band());
        assert!(!StreamFormat::Vvc1.parameter_sets_in_band());
        assert!(StreamFormat::ByteStream.supports(Codec::H266));
        assert!(!StreamFormat::ByteStream.supports(Codec::Av1));
    }

    #[test]
    fn test_serde() {
        let format: FormatDescriptor =
            serde_json::from_str(r#"{"codec": "av1", "stream_format": "annexb", "alignment": "temporal-unit"}"#).unwrap();
        assert_eq!(
            format,
            FormatDescriptor::new(Codec::Av1)
                .with_stream_format(StreamFormat::AnnexB)
                .with_alignment(Alignment::TemporalUnit)
        );
        assert_eq!(format.to_string(), "video/av1, stream-format=annexb, alignment=tu");

        let format: FormatDescriptor = serde_json::from_str(r#"{"codec": "h264", "stream_format": "avc"}"#).unwrap();
        assert_eq!(format.nal_length_size, 4);
        assert_eq!(format.alignment, None);
    }
}
