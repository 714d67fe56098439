// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Scalar 8x8 DCT-II and its inverse, orthonormal with the 1/sqrt(2) DC
//! scaling. Basis tables are built once per codec instance.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::{BLOCK_DIM, BLOCK_SIZE};

fn alpha(u: usize) -> f64 {
    if u == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}

/// Precomputed orthonormal basis: `basis[u][n] = alpha(u) * sqrt(2/8) *
/// cos((n + 1/2) * u * pi / 8)`.
#[derive(Debug, Clone)]
pub struct Dct8 {
    basis: [[f32; BLOCK_DIM]; BLOCK_DIM],
}

impl Default for Dct8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Dct8 {
    pub fn new() -> Dct8 {
        let scale = (2.0 / BLOCK_DIM as f64).sqrt();
        let basis = array_init::array_init(|u| {
            array_init::array_init(|n| {
                (alpha(u) * scale * ((n as f64 + 0.5) * u as f64 * PI / BLOCK_DIM as f64).cos())
                    as f32
            })
        });
        Dct8 { basis }
    }

    fn transform_rows(&self, input: &[f32; BLOCK_SIZE], forward: bool) -> [f32; BLOCK_SIZE] {
        let mut out = [0.0f32; BLOCK_SIZE];
        for row in 0..BLOCK_DIM {
            for u in 0..BLOCK_DIM {
                let mut sum = 0.0f64;
                for n in 0..BLOCK_DIM {
                    let weight = if forward {
                        self.basis[u][n]
                    } else {
                        self.basis[n][u]
                    };
                    sum += weight as f64 * input[row * BLOCK_DIM + n] as f64;
                }
                out[row * BLOCK_DIM + u] = sum as f32;
            }
        }
        out
    }

    fn transpose(input: &[f32; BLOCK_SIZE]) -> [f32; BLOCK_SIZE] {
        let mut out = [0.0f32; BLOCK_SIZE];
        for y in 0..BLOCK_DIM {
            for x in 0..BLOCK_DIM {
                out[x * BLOCK_DIM + y] = input[y * BLOCK_DIM + x];
            }
        }
        out
    }

    /// Forward 2-D DCT-II of a row-major block.
    pub fn forward(&self, block: &[f32; BLOCK_SIZE]) -> [f32; BLOCK_SIZE] {
        let rows = self.transform_rows(block, true);
        let transposed = Self::transpose(&rows);
        let cols = self.transform_rows(&transposed, true);
        Self::transpose(&cols)
    }

    /// Exact inverse of [`Dct8::forward`].
    pub fn inverse(&self, block: &[f32; BLOCK_SIZE]) -> [f32; BLOCK_SIZE] {
        let rows = self.transform_rows(block, false);
        let transposed = Self::transpose(&rows);
        let cols = self.transform_rows(&transposed, false);
        Self::transpose(&cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test::assert_all_almost_eq;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    #[test]
    fn test_constant_block_energy_in_dc() {
        let dct = Dct8::new();
        let block = [128.0f32; BLOCK_SIZE];
        let coeffs = dct.forward(&block);
        assert!(coeffs[0].abs() > 1.0);
        for (index, &coeff) in coeffs.iter().enumerate().skip(1) {
            assert!(
                coeff.abs() <= 1e-4,
                "AC coefficient {index} is {coeff}"
            );
        }
        // Orthonormal DC gain over 64 samples is exactly 8.
        assert_all_almost_eq!([coeffs[0]], [1024.0], 1e-2);
    }

    #[test]
    fn test_roundtrip() {
        let dct = Dct8::new();
        let mut rng = XorShiftRng::seed_from_u64(3);
        for _ in 0..50 {
            let mut block = [0.0f32; BLOCK_SIZE];
            for value in block.iter_mut() {
                *value = rng.random_range(-128.0..128.0);
            }
            let recon = dct.inverse(&dct.forward(&block));
            assert_all_almost_eq!(block, recon, 1e-3);
        }
    }

    #[test]
    fn test_horizontal_cosine_hits_single_coefficient() {
        let dct = Dct8::new();
        let mut block = [0.0f32; BLOCK_SIZE];
        for y in 0..BLOCK_DIM {
            for x in 0..BLOCK_DIM {
                block[y * BLOCK_DIM + x] =
                    ((x as f64 + 0.5) * 2.0 * PI / 8.0).cos() as f32;
            }
        }
        let coeffs = dct.forward(&block);
        // Energy lands on (u, v) = (2, 0) in row-major order.
        for (index, &coeff) in coeffs.iter().enumerate() {
            if index == 2 {
                assert!(coeff.abs() > 1.0);
            } else {
                assert!(coeff.abs() < 1e-3, "coefficient {index} is {coeff}");
            }
        }
    }

    #[test]
    fn test_parseval_energy_preserved() {
        let dct = Dct8::new();
        let mut rng = XorShiftRng::seed_from_u64(4);
        let mut block = [0.0f32; BLOCK_SIZE];
        for value in block.iter_mut() {
            *value = rng.random_range(-100.0..100.0);
        }
        let coeffs = dct.forward(&block);
        let spatial: f64 = block.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let frequency: f64 = coeffs.iter().map(|&v| (v as f64) * (v as f64)).sum();
        assert!((spatial - frequency).abs() / spatial < 1e-5);
    }
}
