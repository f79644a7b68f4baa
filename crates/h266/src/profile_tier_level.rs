use std::io;

use reframe_bytes_util::BitReader;

/// `profile_tier_level(1, MaxNumSubLayersMinus1)`, ISO/IEC-23090-3-2022 - 7.3.3.1
///
/// The general constraints and sub-profiles are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileTierLevel {
    /// `general_profile_idc`
    pub general_profile_idc: u8,
    /// `general_tier_flag`, the high tier when set.
    pub general_tier_flag: bool,
    /// `general_level_idc`, `major * 16 + minor * 3`.
    pub general_level_idc: u8,
    /// `ptl_frame_only_constraint_flag`
    pub ptl_frame_only_constraint_flag: bool,
    /// `ptl_multilayer_enabled_flag`
    pub ptl_multilayer_enabled_flag: bool,
}

impl ProfileTierLevel {
    /// Parses the structure with `profileTierPresentFlag` set.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, max_sub_layers_minus1: u8) -> io::Result<Self> {
        let general_profile_idc = bit_reader.read_bits(7)? as u8;
        let general_tier_flag = bit_reader.read_bit()?;
        let general_level_idc = bit_reader.read_bits(8)? as u8;
        if general_profile_idc != 0 && general_tier_flag && general_level_idc < 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "high tier is not defined for levels below 4",
            ));
        }

        let ptl_frame_only_constraint_flag = bit_reader.read_bit()?;
        let ptl_multilayer_enabled_flag = bit_reader.read_bit()?;

        skip_general_constraints_info(bit_reader)?;

        let mut sublayer_level_present = 0;
        for _ in 0..max_sub_layers_minus1 {
            sublayer_level_present += bit_reader.read_bit()? as u64;
        }
        // ptl_reserved_zero_bit
        bit_reader.align();
        bit_reader.skip_bits(sublayer_level_present * 8)?; // sublayer_level_idc

        let ptl_num_sub_profiles = bit_reader.read_bits(8)?;
        bit_reader.skip_bits(ptl_num_sub_profiles * 32)?; // general_sub_profile_idc

        Ok(Self {
            general_profile_idc,
            general_tier_flag,
            general_level_idc,
            ptl_frame_only_constraint_flag,
            ptl_multilayer_enabled_flag,
        })
    }

    /// Profile name, Annex A.3.
    pub const fn profile_name(&self) -> Option<&'static str> {
        match self.general_profile_idc {
            1 => Some("main-10"),
            2 => Some("main-12"),
            10 => Some("main-12-intra"),
            17 => Some("multilayer-main-10"),
            33 => Some("main-10-444"),
            34 => Some("main-12-444"),
            35 => Some("main-16-444"),
            42 => Some("main-12-444-intra"),
            43 => Some("main-16-444-intra"),
            49 => Some("multilayer-main-10-444"),
            64 => Some("still-picture"),
            65 => Some("main-10-still-picture"),
            66 => Some("main-12-still-picture"),
            81 => Some("multilayer-main-10-still-picture"),
            97 => Some("main-10-444-still-picture"),
            98 => Some("main-12-444-still-picture"),
            99 => Some("main-16-444-still-picture"),
            113 => Some("multilayer-main-10-444-still-picture"),
            _ => None,
        }
    }

    /// `"main"` or `"high"`.
    pub const fn tier_name(&self) -> &'static str {
        if self.general_tier_flag { "high" } else { "main" }
    }

    /// The level as major and minor number, level 5.1 is `general_level_idc` 83.
    pub const fn level(&self) -> (u8, u8) {
        (self.general_level_idc / 16, (self.general_level_idc % 16) / 3)
    }
}

/// `general_constraints_info()`, 7.3.3.2
fn skip_general_constraints_info<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<()> {
    // gci_present_flag
    if bit_reader.read_bit()? {
        bit_reader.skip_bits(71)?;
        let gci_num_additional_bits = bit_reader.read_bits(8)?;
        if (1..=5).contains(&gci_num_additional_bits) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "gci_num_additional_bits must be 0 or at least 6",
            ));
        }
        bit_reader.skip_bits(gci_num_additional_bits)?;
    }

    // gci_alignment_zero_bit
    bit_reader.align();
    Ok(())
}
