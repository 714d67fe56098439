// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unsigned ZigZag mapping and the adaptive per-context symbol model that
//! drives Rice parameter estimation.

/// Maps a signed value onto the non-negative integers:
/// `0, -1, +1, -2, +2, … -> 0, 1, 2, 3, 4, …`.
pub fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Buckets an average absolute residual magnitude into one of four
/// activity classes.
pub fn activity_bucket(average: u32) -> u32 {
    match average {
        0..=3 => 0,
        4..=15 => 1,
        16..=255 => 2,
        _ => 3,
    }
}

/// Number of contexts produced by [`residual_context`]: four activity
/// buckets crossed with an orientation bit.
pub const NUM_RESIDUAL_CONTEXTS: usize = 8;

/// Selects an entropy context from the causal residual neighbourhood: the
/// average absolute residual picks the activity bucket, and the dominant
/// direction (`|res_n| > |res_w|`) contributes an orientation bit.
pub fn residual_context(res_n: i32, res_w: i32, res_nw: i32) -> u32 {
    let sum = res_n.unsigned_abs() as u64 + res_w.unsigned_abs() as u64
        + res_nw.unsigned_abs() as u64;
    let average = (sum / 3).min(u32::MAX as u64) as u32;
    let orientation = (res_n.unsigned_abs() > res_w.unsigned_abs()) as u32;
    activity_bucket(average) | (orientation << 2)
}

/// Per-context running statistics. The Rice parameter for a context is
/// derived from the mean of the symbols recorded in it so far.
#[derive(Debug, Clone)]
pub struct ContextModel {
    counts: Vec<u64>,
    sums: Vec<u64>,
}

impl ContextModel {
    pub fn new(num_contexts: usize) -> ContextModel {
        ContextModel {
            counts: vec![0; num_contexts],
            sums: vec![0; num_contexts],
        }
    }

    pub fn num_contexts(&self) -> usize {
        self.counts.len()
    }

    /// `max(0, floor(log2(1 + mean)) - 1)`, with an empty context treated
    /// as mean 0.
    pub fn rice_parameter(&self, ctx: usize) -> u32 {
        let mean = self.sums[ctx] / self.counts[ctx].max(1);
        let log2 = 63 - (1 + mean).leading_zeros();
        log2.saturating_sub(1)
    }

    /// Records one emitted symbol in its context.
    pub fn record(&mut self, ctx: usize, symbol: u32) {
        self.counts[ctx] += 1;
        self.sums[ctx] += symbol as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_mapping() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(2), 4);
        for v in [-100000, -3, -1, 0, 1, 7, 100000, i32::MIN, i32::MAX] {
            if v < 0 {
                assert_eq!(zigzag_encode(v) as u64, 2 * (v as i64).unsigned_abs() - 1);
            } else {
                assert_eq!(zigzag_encode(v) as u64, 2 * v as u64);
            }
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn test_rice_parameter_of_empty_context_is_zero() {
        let model = ContextModel::new(4);
        for ctx in 0..4 {
            assert_eq!(model.rice_parameter(ctx), 0);
        }
    }

    #[test]
    fn test_rice_parameter_monotone_in_mean() {
        let mut previous = 0;
        for mean in 0..4096u32 {
            let mut model = ContextModel::new(1);
            model.record(0, mean);
            let k = model.rice_parameter(0);
            assert!(k >= previous, "k regressed at mean {mean}");
            previous = k;
        }
    }

    #[test]
    fn test_rice_parameter_formula() {
        // mean 0 -> k 0; mean 3 -> floor(log2(4)) - 1 = 1; mean 31 -> 4.
        let mut model = ContextModel::new(3);
        model.record(1, 3);
        model.record(2, 31);
        assert_eq!(model.rice_parameter(0), 0);
        assert_eq!(model.rice_parameter(1), 1);
        assert_eq!(model.rice_parameter(2), 4);
    }

    #[test]
    fn test_residual_context_buckets() {
        assert_eq!(residual_context(0, 0, 0), 0);
        assert_eq!(residual_context(5, 5, 5), 1);
        assert_eq!(residual_context(20, 20, 20), 2);
        assert_eq!(residual_context(1000, 1000, 1000), 3);
        // Orientation bit: north residual dominates.
        assert_eq!(residual_context(30, 0, 0), 4 | 1);
        assert_eq!(residual_context(0, 30, 0), 1);
    }
}
