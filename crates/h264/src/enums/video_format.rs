use nutype_enum::nutype_enum;

nutype_enum! {
    /// `video_format`, ISO/IEC-14496-10-2022 - E.2.1 Table E-2.
    ///
    /// Inferred as [`VideoFormat::Unspecified`] when the VUI carries no video signal type.
    pub enum VideoFormat(u8) {
        /// Component
        Component = 0,
        /// PAL
        PAL = 1,
        /// NTSC
        NTSC = 2,
        /// SECAM
        SECAM = 3,
        /// MAC
        MAC = 4,
        /// Unspecified video format.
        Unspecified = 5,
        /// Reserved
        Reserved1 = 6,
        /// Reserved
        Reserved2 = 7,
    }
}
