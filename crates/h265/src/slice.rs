use std::io;

use nutype_enum::nutype_enum;
use reframe_bytes_util::{BitReader, EmulationPreventionIo};
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::range_check::range_check;
use crate::{NALUnitHeader, Pps, Sps};

nutype_enum! {
    /// `slice_type`, ISO/IEC-23008-2-2020 - 7.4.7.1 Table 7-7.
    pub enum SliceType(u8) {
        /// B slice
        B = 0,
        /// P slice
        P = 1,
        /// I slice
        I = 2,
    }
}

/// The leading fields of a slice segment header, ISO/IEC-23008-2-2020 - 7.3.6.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSegmentHeader {
    /// The NAL unit header of the slice segment.
    pub nal_unit_header: NALUnitHeader,
    /// `first_slice_segment_in_pic_flag`
    pub first_slice_segment_in_pic_flag: bool,
    /// `no_output_of_prior_pics_flag`, only coded for IRAP pictures.
    pub no_output_of_prior_pics_flag: bool,
    /// `slice_pic_parameter_set_id`
    pub slice_pic_parameter_set_id: u8,
    /// `dependent_slice_segment_flag`
    pub dependent_slice_segment_flag: bool,
    /// `slice_segment_address`
    pub slice_segment_address: u64,
    /// `slice_type`, `None` for dependent slice segments which inherit it.
    pub slice_type: Option<SliceType>,
}

impl SliceSegmentHeader {
    /// Parses a slice segment NAL unit whose payload still contains emulation prevention bytes.
    ///
    /// `parameter_sets` maps the `slice_pic_parameter_set_id` to the PPS and the SPS it refers to.
    pub fn parse_with_emulation_prevention<'a>(
        reader: impl io::Read,
        parameter_sets: impl FnOnce(u8) -> Option<(&'a Pps, &'a Sps)>,
    ) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader), parameter_sets)
    }

    /// Parses a slice segment NAL unit, header included, from its RBSP bytes.
    pub fn parse<'a>(
        reader: impl io::Read,
        parameter_sets: impl FnOnce(u8) -> Option<(&'a Pps, &'a Sps)>,
    ) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NALUnitHeader::parse(&mut bit_reader)?;
        if !nal_unit_header.nal_unit_type.is_vcl() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit is not a slice segment"));
        }

        let first_slice_segment_in_pic_flag = bit_reader.read_bit()?;
        let no_output_of_prior_pics_flag = nal_unit_header.nal_unit_type.is_irap() && bit_reader.read_bit()?;

        let slice_pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        range_check!(slice_pic_parameter_set_id, 0, 63)?;

        let (pps, sps) = parameter_sets(slice_pic_parameter_set_id as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "slice refers to an unknown PPS or SPS"))?;

        let mut dependent_slice_segment_flag = false;
        let mut slice_segment_address = 0;
        if !first_slice_segment_in_pic_flag {
            if pps.dependent_slice_segments_enabled_flag {
                dependent_slice_segment_flag = bit_reader.read_bit()?;
            }

            let pic_size_in_ctbs_y = sps.pic_size_in_ctbs_y();
            // Ceil(Log2(PicSizeInCtbsY))
            let address_bits = (u64::BITS - pic_size_in_ctbs_y.saturating_sub(1).leading_zeros()) as u8;
            slice_segment_address = bit_reader.read_bits(address_bits)?;
            if slice_segment_address >= pic_size_in_ctbs_y {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "slice_segment_address out of range"));
            }
        }

        let slice_type = if dependent_slice_segment_flag {
            None
        } else {
            // slice_reserved_flag[i]
            bit_reader.skip_bits(pps.num_extra_slice_header_bits as u64)?;

            let slice_type = bit_reader.read_exp_golomb()?;
            range_check!(slice_type, 0, 2)?;
            Some(SliceType::from(slice_type as u8))
        };

        Ok(Self {
            nal_unit_header,
            first_slice_segment_in_pic_flag,
            no_output_of_prior_pics_flag,
            slice_pic_parameter_set_id: slice_pic_parameter_set_id as u8,
            dependent_slice_segment_flag,
            slice_segment_address,
            slice_type,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn parameter_sets() -> (Pps, Sps) {
        let sps = b"\x42\x01\x01\x01\x40\x00\x00\x03\x00\x90\x00\x00\x03\x00\x00\x03\x00\x78\xa0\x03\xc0\x80\x11\x07\xcb\x96\xb4\xa4\x25\x92\xe3\x01\x6a\x02\x02\x02\x08\x00\x00\x03\x00\x08\x00\x00\x03\x00\xf3\x00\x2e\xf2\x88\x00\x02\x62\x5a\x00\x00\x13\x12\xd0\x20";
        let sps = Sps::parse_with_emulation_prevention(io::Cursor::new(sps)).unwrap();
        let pps = Pps {
            pps_pic_parameter_set_id: 0,
            pps_seq_parameter_set_id: 0,
            dependent_slice_segments_enabled_flag: true,
            output_flag_present_flag: false,
            num_extra_slice_header_bits: 0,
        };
        (pps, sps)
    }

    #[test]
    fn test_idr_slice() {
        let (pps, sps) = parameter_sets();
        // IDR_W_RADL: first 1, no_output 0, pps 0 (1), slice_type I (011)
        let slice = SliceSegmentHeader::parse(io::Cursor::new([0x26, 0x01, 0b1010_1100]), |id| {
            assert_eq!(id, 0);
            Some((&pps, &sps))
        })
        .unwrap();

        assert!(slice.first_slice_segment_in_pic_flag);
        assert!(!slice.no_output_of_prior_pics_flag);
        assert_eq!(slice.slice_type, Some(SliceType::I));
        assert_eq!(slice.slice_segment_address, 0);
    }

    #[test]
    fn test_dependent_slice_segment() {
        let (pps, sps) = parameter_sets();
        // 1920x1088 with 32x32 CTBs is 2040 CTBs, 11 address bits
        assert_eq!(sps.pic_size_in_ctbs_y(), 2040);

        // TRAIL_R: first 0, pps 0 (1), dependent 1, address 120 (00001111000)
        let slice = SliceSegmentHeader::parse(
            io::Cursor::new([0x02, 0x01, 0b0110_0001, 0b1110_0000]),
            |_| Some((&pps, &sps)),
        )
        .unwrap();

        assert!(slice.dependent_slice_segment_flag);
        assert_eq!(slice.slice_segment_address, 120);
        assert_eq!(slice.slice_type, None);
    }

    #[test]
    fn test_slice_errors() {
        let (pps, sps) = parameter_sets();
        let err = SliceSegmentHeader::parse(io::Cursor::new([0x26, 0x01, 0b1010_1100]), |_| None).unwrap_err();
        assert_eq!(err.to_string(), "slice refers to an unknown PPS or SPS");

        // SPS_NUT
        let err = SliceSegmentHeader::parse(io::Cursor::new([0x42, 0x01, 0x80]), |_| Some((&pps, &sps))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
