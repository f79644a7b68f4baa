use nutype_enum::nutype_enum;

nutype_enum! {
    /// NAL unit types, ISO/IEC-23008-2-2020 - 7.4.2.2 Table 7-1.
    ///
    /// Values 0..=31 are VCL NAL units, 16..=23 are IRAP pictures.
    /// Reserved and unspecified values are kept as is.
    pub enum NALUnitType(u8) {
        /// Trailing picture, non-reference
        TrailN = 0,
        /// Trailing picture, reference
        TrailR = 1,
        /// Temporal sub-layer access, non-reference
        TsaN = 2,
        /// Temporal sub-layer access, reference
        TsaR = 3,
        /// Step-wise temporal sub-layer access, non-reference
        StsaN = 4,
        /// Step-wise temporal sub-layer access, reference
        StsaR = 5,
        /// Random access decodable leading, non-reference
        RadlN = 6,
        /// Random access decodable leading, reference
        RadlR = 7,
        /// Random access skipped leading, non-reference
        RaslN = 8,
        /// Random access skipped leading, reference
        RaslR = 9,
        /// Broken link access with leading pictures
        BlaWLp = 16,
        /// Broken link access with RADL pictures
        BlaWRadl = 17,
        /// Broken link access without leading pictures
        BlaNLp = 18,
        /// Instantaneous decoding refresh with RADL pictures
        IdrWRadl = 19,
        /// Instantaneous decoding refresh without leading pictures
        IdrNLp = 20,
        /// Clean random access
        CraNut = 21,
        /// Reserved IRAP
        RsvIrapVcl22 = 22,
        /// Reserved IRAP
        RsvIrapVcl23 = 23,
        /// Video parameter set
        VpsNut = 32,
        /// Sequence parameter set
        SpsNut = 33,
        /// Picture parameter set
        PpsNut = 34,
        /// Access unit delimiter
        AudNut = 35,
        /// End of sequence
        EosNut = 36,
        /// End of bitstream
        EobNut = 37,
        /// Filler data
        FdNut = 38,
        /// Prefix SEI
        PrefixSeiNut = 39,
        /// Suffix SEI
        SuffixSeiNut = 40,
    }
}

impl NALUnitType {
    /// Coded slice segment NAL units, reserved VCL types included.
    pub const fn is_vcl(&self) -> bool {
        self.0 <= 31
    }

    /// Slice segments of the types a decoder handles: 0..=9 and 16..=21.
    pub const fn is_slice(&self) -> bool {
        self.0 <= 9 || (self.0 >= 16 && self.0 <= 21)
    }

    /// Intra random access point pictures (16..=23).
    pub const fn is_irap(&self) -> bool {
        self.0 >= 16 && self.0 <= 23
    }

    /// IDR pictures.
    pub const fn is_idr(&self) -> bool {
        matches!(self.0, 19 | 20)
    }

    /// BLA pictures.
    pub const fn is_bla(&self) -> bool {
        matches!(self.0, 16..=18)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_nal_unit_type_classes() {
        assert!(NALUnitType::TrailR.is_vcl());
        assert!(NALUnitType::TrailR.is_slice());
        assert!(!NALUnitType::TrailR.is_irap());

        assert!(NALUnitType::CraNut.is_irap());
        assert!(!NALUnitType::CraNut.is_idr());
        assert!(NALUnitType::IdrNLp.is_idr());
        assert!(NALUnitType::BlaNLp.is_bla());

        assert!(NALUnitType::RsvIrapVcl22.is_irap());
        assert!(!NALUnitType::RsvIrapVcl22.is_slice());
        assert!(NALUnitType::from(12).is_vcl());
        assert!(!NALUnitType::from(12).is_slice());

        assert!(!NALUnitType::SpsNut.is_vcl());
        assert_eq!(format!("{:?}", NALUnitType::from(45)), "NALUnitType(45)");
    }
}
