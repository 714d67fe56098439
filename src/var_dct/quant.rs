// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Distance-driven quantisation matrices and the (de)quantisation kernels.

use crate::{BLOCK_DIM, BLOCK_SIZE};

/// Smallest distance the lossy path will quantise at.
pub const MIN_LOSSY_DISTANCE: f32 = 0.1;

/// Maps a 0..=100 quality to a distance: `(100 - q) / 10`, clamped to at
/// least [`MIN_LOSSY_DISTANCE`].
pub fn distance_for_quality(quality: u32) -> f32 {
    ((100 - quality.min(100)) as f32 / 10.0).max(MIN_LOSSY_DISTANCE)
}

/// Per-plane quantisation steps. The DC step is `max(1, 8d)`; AC steps
/// grow linearly with the coefficient frequency, doubled on chroma.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantMatrix {
    steps: [f32; BLOCK_SIZE],
}

impl QuantMatrix {
    pub fn new(distance: f32, chroma: bool) -> QuantMatrix {
        let base = (distance * 8.0).max(1.0);
        let chroma_scale = if chroma { 2.0 } else { 1.0 };
        let steps = array_init::array_init(|index| {
            let (i, j) = (index / BLOCK_DIM, index % BLOCK_DIM);
            if index == 0 {
                base
            } else {
                base * (1.0 + 0.2 * i as f32 + 0.2 * j as f32) * chroma_scale
            }
        });
        QuantMatrix { steps }
    }

    pub fn step(&self, index: usize) -> f32 {
        self.steps[index]
    }

    pub fn quantize(&self, coeffs: &[f32; BLOCK_SIZE]) -> [i16; BLOCK_SIZE] {
        let mut out = [0i16; BLOCK_SIZE];
        for (index, (&coeff, &step)) in coeffs.iter().zip(self.steps.iter()).enumerate() {
            out[index] = (coeff / step)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
        out
    }

    pub fn dequantize(&self, quantized: &[i16; BLOCK_SIZE]) -> [f32; BLOCK_SIZE] {
        let mut out = [0.0f32; BLOCK_SIZE];
        for (index, (&q, &step)) in quantized.iter().zip(self.steps.iter()).enumerate() {
            out[index] = q as f32 * step;
        }
        out
    }
}
