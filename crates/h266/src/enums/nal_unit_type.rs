use nutype_enum::nutype_enum;

nutype_enum! {
    /// NAL unit types, ISO/IEC-23090-3-2022 - 7.4.2.2 Table 5.
    ///
    /// Values 0..=11 are VCL NAL units, 7..=11 are IRAP or GDR pictures.
    pub enum NALUnitType(u8) {
        /// Trailing picture
        TrailNut = 0,
        /// Step-wise temporal sublayer access
        StsaNut = 1,
        /// Random access decodable leading
        RadlNut = 2,
        /// Random access skipped leading
        RaslNut = 3,
        /// Instantaneous decoding refresh with RADL pictures
        IdrWRadl = 7,
        /// Instantaneous decoding refresh without leading pictures
        IdrNLp = 8,
        /// Clean random access
        CraNut = 9,
        /// Gradual decoding refresh
        GdrNut = 10,
        /// Operating point information
        OpiNut = 12,
        /// Decoding capability information
        DciNut = 13,
        /// Video parameter set
        VpsNut = 14,
        /// Sequence parameter set
        SpsNut = 15,
        /// Picture parameter set
        PpsNut = 16,
        /// Prefix adaptation parameter set
        PrefixApsNut = 17,
        /// Suffix adaptation parameter set
        SuffixApsNut = 18,
        /// Picture header
        PhNut = 19,
        /// Access unit delimiter
        AudNut = 20,
        /// End of sequence
        EosNut = 21,
        /// End of bitstream
        EobNut = 22,
        /// Prefix SEI
        PrefixSeiNut = 23,
        /// Suffix SEI
        SuffixSeiNut = 24,
        /// Filler data
        FdNut = 25,
    }
}

impl NALUnitType {
    /// Coded slice NAL units, reserved VCL types included.
    pub const fn is_vcl(&self) -> bool {
        self.0 <= 11
    }

    /// Slices of the types a decoder handles: TRAIL to GDR without the reserved ones.
    pub const fn is_slice(&self) -> bool {
        self.0 <= 3 || (self.0 >= 7 && self.0 <= 10)
    }

    /// IDR and CRA pictures.
    pub const fn is_irap(&self) -> bool {
        matches!(self.0, 7..=9)
    }

    /// IDR pictures.
    pub const fn is_idr(&self) -> bool {
        matches!(self.0, 7 | 8)
    }

    /// Pictures that start a coded video sequence: IRAP or GDR.
    pub const fn is_irap_or_gdr(&self) -> bool {
        matches!(self.0, 7..=10)
    }
}
