use std::fmt;

use reframe_av1::ObuType;

/// The type of a syntax unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A NAL unit and its `nal_unit_type`.
    Nal(u8),
    /// An OBU and its `obu_type`.
    Obu(ObuType),
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nal(nal_type) => write!(f, "nal {nal_type}"),
            Self::Obu(obu_type) => write!(f, "obu {}", obu_type.0),
        }
    }
}

/// One scanned syntax unit, positioned inside the buffer it was found in.
///
/// `offset` is where the unit's delimiter starts (start code, length prefix
/// or annex B `obu_length`), `header_offset` where the unit itself starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxUnit {
    /// The unit type.
    pub kind: UnitKind,
    /// Start of the delimiter.
    pub offset: usize,
    /// Start of the unit header.
    pub header_offset: usize,
    /// Size of the unit, header included, delimiter excluded.
    pub size: usize,
    /// Temporal layer.
    pub temporal_id: u8,
    /// Spatial layer, AV1 only.
    pub spatial_id: u8,
    /// `nuh_layer_id`, H.265 and H.266 only.
    pub layer_id: u8,
}

impl SyntaxUnit {
    /// One past the last byte of the unit.
    pub const fn end(&self) -> usize {
        self.header_offset + self.size
    }

    /// The unit with its delimiter.
    pub const fn delimited_len(&self) -> usize {
        self.end() - self.offset
    }

    /// Moves the unit `by` bytes towards the start of the buffer.
    pub(crate) const fn rebased(mut self, by: usize) -> Self {
        self.offset -= by;
        self.header_offset -= by;
        self
    }

    /// The bytes of the unit, delimiter excluded.
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.header_offset..self.end()]
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_extent() {
        let unit = SyntaxUnit {
            kind: UnitKind::Nal(7),
            offset: 10,
            header_offset: 14,
            size: 6,
            temporal_id: 0,
            spatial_id: 0,
            layer_id: 0,
        };

        assert_eq!(unit.end(), 20);
        assert_eq!(unit.delimited_len(), 10);

        let data: Vec<u8> = (0..24).collect();
        assert_eq!(unit.payload(&data), &[14, 15, 16, 17, 18, 19]);

        let moved = unit.rebased(10);
        assert_eq!(moved.offset, 0);
        assert_eq!(moved.end(), 10);
    }

    #[test]
    fn test_display() {
        assert_eq!(UnitKind::Nal(5).to_string(), "nal 5");
        assert_eq!(UnitKind::Obu(ObuType::Frame).to_string(), "obu 6");
    }
}
