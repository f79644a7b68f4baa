use std::io;

use reframe_bytes_util::BitReader;

/// The general profile, tier and level of a bitstream.
///
/// ISO/IEC-23008-2-2020 - 7.3.3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileTierLevel {
    /// `general_profile_space`
    pub general_profile_space: u8,
    /// `general_tier_flag`, the high tier when set.
    pub general_tier_flag: bool,
    /// `general_profile_idc`
    pub general_profile_idc: u8,
    /// `general_profile_compatibility_flag[32]`, flag `j` in bit `31 - j`.
    pub general_profile_compatibility_flags: u32,
    /// `general_progressive_source_flag`
    pub general_progressive_source_flag: bool,
    /// `general_interlaced_source_flag`
    pub general_interlaced_source_flag: bool,
    /// `general_frame_only_constraint_flag`
    pub general_frame_only_constraint_flag: bool,
    /// `general_level_idc`, 30 times the level number.
    pub general_level_idc: u8,
}

impl ProfileTierLevel {
    /// Parses `profile_tier_level(1, max_sub_layers_minus1)`, skipping the sub-layer entries.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, max_sub_layers_minus1: u8) -> io::Result<Self> {
        let general_profile_space = bit_reader.read_bits(2)? as u8;
        let general_tier_flag = bit_reader.read_bit()?;
        let general_profile_idc = bit_reader.read_bits(5)? as u8;
        let general_profile_compatibility_flags = bit_reader.read_bits(32)? as u32;
        let general_progressive_source_flag = bit_reader.read_bit()?;
        let general_interlaced_source_flag = bit_reader.read_bit()?;
        bit_reader.read_bit()?; // general_non_packed_constraint_flag
        let general_frame_only_constraint_flag = bit_reader.read_bit()?;
        // constraint flags and general_inbld_flag
        bit_reader.skip_bits(43 + 1)?;
        let general_level_idc = bit_reader.read_bits(8)? as u8;

        let mut sub_layer_flags = [(false, false); 7];
        for flags in sub_layer_flags.iter_mut().take(max_sub_layers_minus1 as usize) {
            *flags = (bit_reader.read_bit()?, bit_reader.read_bit()?);
        }

        if max_sub_layers_minus1 > 0 {
            // reserved_zero_2bits
            bit_reader.skip_bits(2 * (8 - max_sub_layers_minus1 as u64))?;
        }

        for (profile_present, level_present) in sub_layer_flags.into_iter().take(max_sub_layers_minus1 as usize) {
            if profile_present {
                bit_reader.skip_bits(88)?;
            }
            if level_present {
                bit_reader.skip_bits(8)?; // sub_layer_level_idc
            }
        }

        Ok(Self {
            general_profile_space,
            general_tier_flag,
            general_profile_idc,
            general_profile_compatibility_flags,
            general_progressive_source_flag,
            general_interlaced_source_flag,
            general_frame_only_constraint_flag,
            general_level_idc,
        })
    }

    /// The profile, falling back to the lowest compatible profile when
    /// `general_profile_idc` is 0.
    pub const fn profile_idc(&self) -> u8 {
        if self.general_profile_idc != 0 {
            return self.general_profile_idc;
        }

        let mut j = 1;
        while j < 32 {
            if self.general_profile_compatibility_flags & (1 << (31 - j)) != 0 {
                return j as u8;
            }
            j += 1;
        }

        0
    }

    /// Profile name for the profiles of Annex A.3.
    pub const fn profile_name(&self) -> Option<&'static str> {
        match self.profile_idc() {
            1 => Some("main"),
            2 => Some("main-10"),
            3 => Some("main-still-picture"),
            4 => Some("range-extensions"),
            5 => Some("high-throughput"),
            9 => Some("screen-extended"),
            _ => None,
        }
    }

    /// `"main"` or `"high"`.
    pub const fn tier_name(&self) -> &'static str {
        if self.general_tier_flag { "high" } else { "main" }
    }

    /// The level as major and minor number, level 5.1 is `general_level_idc` 153.
    pub const fn level(&self) -> (u8, u8) {
        let major = self.general_level_idc / 30;
        (major, (self.general_level_idc - major * 30) / 3)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_profile_tier_level() {
        // Main profile, main tier, level 5.1, no sub-layers
        let data = [0x01, 0x40, 0x00, 0x00, 0x00, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x99];
        let ptl = ProfileTierLevel::parse(&mut BitReader::new_from_slice(data), 0).unwrap();

        insta::assert_debug_snapshot!(ptl, @r"
        ProfileTierLevel {
            general_profile_space: 0,
            general_tier_flag: false,
            general_profile_idc: 1,
            general_profile_compatibility_flags: 1073741824,
            general_progressive_source_flag: true,
            general_interlaced_source_flag: false,
            general_frame_only_constraint_flag: true,
            general_level_idc: 153,
        }
        ");
        assert_eq!(ptl.profile_name(), Some("main"));
        assert_eq!(ptl.tier_name(), "main");
        assert_eq!(ptl.level(), (5, 1));
    }

    #[test]
    fn test_profile_from_compatibility_flags() {
        let ptl = ProfileTierLevel {
            general_profile_compatibility_flags: 1 << 29,
            general_tier_flag: true,
            general_level_idc: 120,
            ..Default::default()
        };

        assert_eq!(ptl.profile_idc(), 2);
        assert_eq!(ptl.profile_name(), Some("main-10"));
        assert_eq!(ptl.tier_name(), "high");
        assert_eq!(ptl.level(), (4, 0));
    }

    #[test]
    fn test_sub_layers() {
        let mut data = vec![0x01, 0x40, 0x00, 0x00, 0x00, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x5a];
        // one sub-layer with level only (01), 14 reserved bits, then the level byte
        data.extend([0b0100_0000, 0x00, 0x3c, 0xff]);
        let mut reader = BitReader::new_from_slice(data);
        let ptl = ProfileTierLevel::parse(&mut reader, 1).unwrap();

        assert_eq!(ptl.general_level_idc, 90);
        assert_eq!(reader.bit_pos(), 12 * 8 + 16 + 8);
    }
}
