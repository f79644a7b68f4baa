use std::io;

use reframe_bytes_util::BitReader;
use reframe_expgolomb::BitReaderExpGolombExt;

use crate::range_check::range_check;

/// The `st_ref_pic_set(stRpsIdx)` structures of an SPS, ISO/IEC-23008-2-2020 - 7.3.7.
///
/// Only the delta POC lists are kept, they are what later sets predict from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortTermRefPicSets {
    /// Per set, `DeltaPocS0` (closest first) followed by `DeltaPocS1` (closest first).
    pub delta_pocs: Vec<Vec<i64>>,
}

impl ShortTermRefPicSets {
    /// Parses `num_short_term_ref_pic_sets` sets as they appear in the SPS.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, num_short_term_ref_pic_sets: usize) -> io::Result<Self> {
        let mut delta_pocs: Vec<Vec<i64>> = Vec::with_capacity(num_short_term_ref_pic_sets);

        for st_rps_idx in 0..num_short_term_ref_pic_sets {
            let inter_ref_pic_set_prediction_flag = st_rps_idx != 0 && bit_reader.read_bit()?;

            let set = if inter_ref_pic_set_prediction_flag {
                // delta_idx_minus1 is only coded in slice headers, in the SPS the
                // reference is always the previous set
                let reference = &delta_pocs[st_rps_idx - 1];

                let delta_rps_sign = bit_reader.read_bit()?;
                let abs_delta_rps_minus1 = bit_reader.read_exp_golomb()?;
                range_check!(abs_delta_rps_minus1, 0, (1 << 15) - 1)?;
                let delta_rps = (1 - 2 * delta_rps_sign as i64) * (abs_delta_rps_minus1 as i64 + 1);

                let mut set = Vec::with_capacity(reference.len() + 1);
                for j in 0..=reference.len() {
                    let used_by_curr_pic_flag = bit_reader.read_bit()?;
                    let use_delta_flag = used_by_curr_pic_flag || bit_reader.read_bit()?;
                    if !use_delta_flag {
                        continue;
                    }

                    let d_poc = reference.get(j).map_or(delta_rps, |delta| delta + delta_rps);
                    if d_poc != 0 {
                        set.push(d_poc);
                    }
                }

                let (mut negative, mut positive): (Vec<_>, Vec<_>) = set.into_iter().partition(|d| *d < 0);
                negative.sort_unstable_by(|a, b| b.cmp(a));
                positive.sort_unstable();
                negative.extend(positive);
                negative
            } else {
                let num_negative_pics = bit_reader.read_exp_golomb()?;
                range_check!(num_negative_pics, 0, 16)?;
                let num_positive_pics = bit_reader.read_exp_golomb()?;
                range_check!(num_positive_pics, 0, 16)?;

                let mut set = Vec::with_capacity((num_negative_pics + num_positive_pics) as usize);
                let mut poc = 0;
                for _ in 0..num_negative_pics {
                    poc -= bit_reader.read_exp_golomb()? as i64 + 1; // delta_poc_s0_minus1
                    bit_reader.read_bit()?; // used_by_curr_pic_s0_flag
                    set.push(poc);
                }

                poc = 0;
                for _ in 0..num_positive_pics {
                    poc += bit_reader.read_exp_golomb()? as i64 + 1; // delta_poc_s1_minus1
                    bit_reader.read_bit()?; // used_by_curr_pic_s1_flag
                    set.push(poc);
                }

                set
            };

            delta_pocs.push(set);
        }

        Ok(Self { delta_pocs })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_sets() {
        // set 0: 2 negative (-1, -3), 1 positive (+2)
        // 011 010 | 1 1 | 010 0 | 010 1
        let data = [0b0110_1011, 0b0100_0101, 0b0000_0000];
        let sets = ShortTermRefPicSets::parse(&mut BitReader::new_from_slice(data), 1).unwrap();
        assert_eq!(sets.delta_pocs, vec![vec![-1, -3, 2]]);
    }

    #[test]
    fn test_predicted_set() {
        // set 0: one negative picture at -1
        // 010 1 1 1
        // set 1: predicted, delta_rps = -1, both entries used
        // 1 | 1 | 1 | 1 1
        let data = [0b0101_1111, 0b1110_0000];
        let sets = ShortTermRefPicSets::parse(&mut BitReader::new_from_slice(data), 2).unwrap();
        assert_eq!(sets.delta_pocs, vec![vec![-1], vec![-1, -2]]);
    }
}
