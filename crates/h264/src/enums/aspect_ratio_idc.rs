use nutype_enum::nutype_enum;

nutype_enum! {
    /// `aspect_ratio_idc`, ISO/IEC-14496-10-2022 - E.2.1 Table E-1.
    ///
    /// 17..=254 are reserved, 255 signals explicit `sar_width` and `sar_height`.
    pub enum AspectRatioIdc(u8) {
        /// 0: Unspecified (not used in decoding)
        Unspecified = 0,
        /// 1: 1:1 (square)
        Square = 1,
        /// 2: 12:11
        Aspect12_11 = 2,
        /// 3: 10:11
        Aspect10_11 = 3,
        /// 4: 16:11
        Aspect16_11 = 4,
        /// 5: 40:33
        Aspect40_33 = 5,
        /// 6: 24:11
        Aspect24_11 = 6,
        /// 7: 20:11
        Aspect20_11 = 7,
        /// 8: 32:11
        Aspect32_11 = 8,
        /// 9: 80:33
        Aspect80_33 = 9,
        /// 10: 18:11
        Aspect18_11 = 10,
        /// 11: 15:11
        Aspect15_11 = 11,
        /// 12: 64:33
        Aspect64_33 = 12,
        /// 13: 160:99
        Aspect160_99 = 13,
        /// 14: 4:3
        Aspect4_3 = 14,
        /// 15: 3:2
        Aspect3_2 = 15,
        /// 16: 2:1
        Aspect2_1 = 16,
        /// 17..=254: Reserved (should be ignored)
        Reserved = 17,
        /// 255: Extended SAR (use `sar_width` & `sar_height` from bitstream)
        ExtendedSar = 255
    }
}

impl AspectRatioIdc {
    /// The sample aspect ratio of the predefined values, Table E-1.
    ///
    /// Returns `None` for unspecified, reserved and extended values.
    pub const fn sample_aspect_ratio(&self) -> Option<(u16, u16)> {
        const TABLE: [(u16, u16); 16] = [
            (1, 1),
            (12, 11),
            (10, 11),
            (16, 11),
            (40, 33),
            (24, 11),
            (20, 11),
            (32, 11),
            (80, 33),
            (18, 11),
            (15, 11),
            (64, 33),
            (160, 99),
            (4, 3),
            (3, 2),
            (2, 1),
        ];

        match self.0 {
            1..=16 => Some(TABLE[self.0 as usize - 1]),
            _ => None,
        }
    }
}
