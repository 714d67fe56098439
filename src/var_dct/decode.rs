// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::entropy_coding::ans::AnsSectionDecoder;
use crate::entropy_coding::context::zigzag_decode;
use crate::entropy_coding::rice::RiceCoder;
use crate::error::{Error, Result};
use crate::image::Plane;
use crate::var_dct::coeff_order::ZIGZAG_ORDER;
use crate::var_dct::dct::Dct8;
use crate::var_dct::encode::{ac_context, dc_context, plane_geometries, predict_dc};
use crate::var_dct::quant::QuantMatrix;
use crate::var_dct::{Geometry, PassState, NUM_COEFF_CONTEXTS, PASS_SPLITS};
use crate::{BLOCK_DIM, BLOCK_SIZE};

enum SectionSource<'a> {
    Rice(RiceCoder, BitReader<'a>),
    Ans(Box<AnsSectionDecoder>),
}

impl SectionSource<'_> {
    fn new(section: &[u8], use_ans: bool) -> Result<SectionSource> {
        if use_ans {
            let mut br = BitReader::new(section);
            let decoder = AnsSectionDecoder::new(&mut br, NUM_COEFF_CONTEXTS)?;
            Ok(SectionSource::Ans(Box::new(decoder)))
        } else {
            Ok(SectionSource::Rice(
                RiceCoder::new(NUM_COEFF_CONTEXTS),
                BitReader::new(section),
            ))
        }
    }

    fn decode_symbol(&mut self, ctx: usize) -> Result<u32> {
        match self {
            SectionSource::Rice(coder, br) => coder.decode(br, ctx),
            SectionSource::Ans(decoder) => decoder.decode_symbol(ctx),
        }
    }
}

/// Pass-by-pass VarDCT frame decoder; the mirror of
/// [`encode_body`](crate::var_dct::encode_body).
pub struct VarDctDecoder {
    geometries: Vec<Geometry>,
    matrices: Vec<QuantMatrix>,
    dct: Dct8,
    coeffs: Vec<Vec<[i16; BLOCK_SIZE]>>,
    num_passes: u32,
    next_pass: u32,
    pass_state: PassState,
    use_ans: bool,
    dc_only: bool,
}

impl VarDctDecoder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: usize,
        height: usize,
        is_chroma: &[bool],
        subsampled: &[bool],
        distance: f32,
        num_passes: u32,
        use_ans: bool,
        dc_only: bool,
    ) -> Result<VarDctDecoder> {
        let valid_passes = if dc_only {
            num_passes == 1
        } else {
            num_passes == 1 || num_passes == PASS_SPLITS.len() as u32
        };
        if !valid_passes {
            return Err(Error::InvalidFrameHeader(format!(
                "vardct frame with {num_passes} passes"
            )));
        }
        let geometries = plane_geometries(width, height, subsampled);
        let matrices = is_chroma
            .iter()
            .map(|&chroma| QuantMatrix::new(distance, chroma))
            .collect();
        let coeffs = geometries
            .iter()
            .map(|geometry| vec![[0i16; BLOCK_SIZE]; geometry.num_blocks()])
            .collect();
        Ok(VarDctDecoder {
            geometries,
            matrices,
            dct: Dct8::new(),
            coeffs,
            num_passes,
            next_pass: 0,
            pass_state: PassState::Idle,
            use_ans,
            dc_only,
        })
    }

    pub fn num_groups(&self) -> usize {
        self.geometries[0].num_groups()
    }

    pub fn num_passes(&self) -> u32 {
        self.num_passes
    }

    pub fn pass_state(&self) -> PassState {
        self.pass_state
    }

    pub fn is_done(&self) -> bool {
        self.next_pass == self.num_passes
    }

    /// Decodes the next pass from its per-group sections, in group order.
    pub fn decode_pass(&mut self, sections: &[&[u8]]) -> Result<()> {
        if self.is_done() {
            return Err(Error::DecodingFailed("all passes already decoded".into()));
        }
        if sections.len() != self.num_groups() {
            return Err(Error::DecodingFailed(format!(
                "pass {} has {} sections, expected {}",
                self.next_pass,
                sections.len(),
                self.num_groups()
            )));
        }
        let range = if self.dc_only {
            0..1
        } else if self.num_passes == 1 {
            0..BLOCK_SIZE
        } else {
            PASS_SPLITS[self.next_pass as usize].clone()
        };
        for (group, section) in sections.iter().enumerate() {
            self.decode_section(section, group, &range).map_err(|_| {
                Error::DecodingFailed(format!("vardct pass {} group {group}", self.next_pass))
            })?;
        }
        self.next_pass += 1;
        self.pass_state = self.pass_state.advance(self.num_passes);
        Ok(())
    }

    fn decode_section(
        &mut self,
        section: &[u8],
        group: usize,
        range: &std::ops::Range<usize>,
    ) -> Result<()> {
        let mut source = SectionSource::new(section, self.use_ans)?;
        for (plane_coeffs, geometry) in self.coeffs.iter_mut().zip(self.geometries.iter()) {
            let (bx_range, by_range) = geometry.group_blocks(group);
            for by in by_range.clone() {
                for bx in bx_range.clone() {
                    let block_index = by * geometry.blocks_x + bx;
                    if range.start == 0 {
                        let left = (bx > bx_range.start)
                            .then(|| plane_coeffs[by * geometry.blocks_x + bx - 1][0] as i32);
                        let top = (by > by_range.start)
                            .then(|| plane_coeffs[(by - 1) * geometry.blocks_x + bx][0] as i32);
                        let symbol = source.decode_symbol(dc_context(left, top))?;
                        let dc = predict_dc(left, top) + zigzag_decode(symbol);
                        plane_coeffs[block_index][0] = i16::try_from(dc)
                            .map_err(|_| Error::DecodingFailed("dc out of range".into()))?;
                    }
                    let mut sum_abs = 0u64;
                    let mut count = 0u32;
                    for scan_pos in range.start.max(1)..range.end {
                        let symbol = source.decode_symbol(ac_context(sum_abs, count))?;
                        let value = zigzag_decode(symbol);
                        plane_coeffs[block_index][ZIGZAG_ORDER[scan_pos]] = i16::try_from(value)
                            .map_err(|_| {
                                Error::DecodingFailed("coefficient out of range".into())
                            })?;
                        sum_abs += value.unsigned_abs() as u64;
                        count += 1;
                    }
                }
            }
        }
        if let SectionSource::Ans(decoder) = &source {
            decoder.check_final_state()?;
        }
        Ok(())
    }

    /// Dequantises and inverse-transforms the coefficients decoded so far
    /// into centred f32 planes at each plane's coded resolution.
    pub fn reconstruct(&self) -> Result<Vec<Plane<f32>>> {
        let mut planes = Vec::with_capacity(self.coeffs.len());
        for ((plane_coeffs, matrix), geometry) in self
            .coeffs
            .iter()
            .zip(self.matrices.iter())
            .zip(self.geometries.iter())
        {
            let mut plane = Plane::new(geometry.width, geometry.height)?;
            for by in 0..geometry.blocks_y {
                for bx in 0..geometry.blocks_x {
                    let quantized = &plane_coeffs[by * geometry.blocks_x + bx];
                    let samples = self.dct.inverse(&matrix.dequantize(quantized));
                    for y in 0..BLOCK_DIM {
                        for x in 0..BLOCK_DIM {
                            let px = bx * BLOCK_DIM + x;
                            let py = by * BLOCK_DIM + y;
                            if px < geometry.width && py < geometry.height {
                                plane.set(px, py, samples[y * BLOCK_DIM + x]);
                            }
                        }
                    }
                }
            }
            planes.push(plane);
        }
        Ok(planes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var_dct::encode::VarDctParams;
    use crate::var_dct::encode_body;

    fn gradient_planes(width: usize, height: usize, count: usize) -> Vec<Plane<f32>> {
        (0..count)
            .map(|c| {
                let mut plane = Plane::new(width, height).unwrap();
                for y in 0..height {
                    for x in 0..width {
                        let value =
                            ((x as f32 * 0.7 + y as f32 * 1.3 + c as f32 * 5.0) % 256.0) - 128.0;
                        plane.set(x, y, value);
                    }
                }
                plane
            })
            .collect()
    }

    fn max_error(a: &Plane<f32>, b: &Plane<f32>) -> f32 {
        let mut worst = 0.0f32;
        for y in 0..a.height() {
            for x in 0..a.width() {
                worst = worst.max((a.get(x, y) - b.get(x, y)).abs());
            }
        }
        worst
    }

    fn decode_all(
        body: &crate::var_dct::VarDctBody,
        width: usize,
        height: usize,
        is_chroma: &[bool],
        subsampled: &[bool],
        distance: f32,
        use_ans: bool,
        dc_only: bool,
    ) -> VarDctDecoder {
        let mut decoder = VarDctDecoder::new(
            width,
            height,
            is_chroma,
            subsampled,
            distance,
            body.num_passes,
            use_ans,
            dc_only,
        )
        .unwrap();
        let groups = body.num_groups as usize;
        for pass in 0..body.num_passes as usize {
            let sections: Vec<&[u8]> = body.sections[pass * groups..(pass + 1) * groups]
                .iter()
                .map(|s| s.as_slice())
                .collect();
            decoder.decode_pass(&sections).unwrap();
        }
        assert!(decoder.is_done());
        decoder
    }

    fn roundtrip(width: usize, height: usize, progressive: bool, use_ans: bool) -> f32 {
        let planes = gradient_planes(width, height, 3);
        let is_chroma = [false, true, true];
        let subsampled = [false, false, false];
        let params = VarDctParams {
            distance: 0.5,
            progressive,
            use_ans,
            ..Default::default()
        };
        let body = encode_body(&planes, &is_chroma, &subsampled, &params).unwrap();
        let decoder = decode_all(
            &body, width, height, &is_chroma, &subsampled, 0.5, use_ans, false,
        );
        let decoded = decoder.reconstruct().unwrap();
        planes
            .iter()
            .zip(decoded.iter())
            .map(|(a, b)| max_error(a, b))
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_single_pass_roundtrip_error_bounded() {
        // Worst-case reconstruction error is bounded by half the largest
        // quantisation step (chroma doubles the AC steps).
        let error = roundtrip(32, 24, false, false);
        assert!(error < 64.0 * 3.8, "error {error}");
    }

    #[test]
    fn test_progressive_equals_single_pass() {
        let single = roundtrip(40, 40, false, false);
        let progressive = roundtrip(40, 40, true, false);
        assert!((single - progressive).abs() < 1e-4);
    }

    #[test]
    fn test_ans_equals_rice() {
        let rice = roundtrip(24, 16, false, false);
        let ans = roundtrip(24, 16, false, true);
        assert!((rice - ans).abs() < 1e-4);
    }

    #[test]
    fn test_progressive_passes_refine() {
        let planes = gradient_planes(16, 16, 1);
        let params = VarDctParams {
            distance: 1.0,
            progressive: true,
            ..Default::default()
        };
        let body = encode_body(&planes, &[false], &[false], &params).unwrap();
        let mut decoder =
            VarDctDecoder::new(16, 16, &[false], &[false], 1.0, 3, false, false).unwrap();
        let mut errors = Vec::new();
        for pass in 0..3 {
            let section: &[u8] = &body.sections[pass];
            decoder.decode_pass(&[section]).unwrap();
            let recon = decoder.reconstruct().unwrap();
            errors.push(max_error(&planes[0], &recon[0]));
        }
        assert_eq!(decoder.pass_state(), PassState::Done);
        // Each pass adds coefficients; the error cannot grow from DC-only
        // to the full set.
        assert!(errors[2] <= errors[0] + 1e-3);
    }

    #[test]
    fn test_multi_group_roundtrip() {
        let error = roundtrip(300, 260, false, false);
        assert!(error < 64.0 * 3.8, "error {error}");
    }

    #[test]
    fn test_subsampled_chroma_roundtrip() {
        let planes = gradient_planes(64, 48, 3);
        let is_chroma = [false, true, true];
        let subsampled = [false, true, true];
        let params = VarDctParams {
            distance: 1.0,
            ..Default::default()
        };
        let body = encode_body(&planes, &is_chroma, &subsampled, &params).unwrap();
        let decoder = decode_all(
            &body, 64, 48, &is_chroma, &subsampled, 1.0, false, false,
        );
        let decoded = decoder.reconstruct().unwrap();
        // Luma is coded at full resolution, chroma at half.
        assert_eq!(decoded[0].size(), (64, 48));
        assert_eq!(decoded[1].size(), (32, 24));
        assert_eq!(decoded[2].size(), (32, 24));
        assert!(max_error(&planes[0], &decoded[0]) < 64.0 * 3.8);
    }

    #[test]
    fn test_subsampling_shrinks_payload() {
        let planes = gradient_planes(64, 64, 3);
        let is_chroma = [false, true, true];
        let params = VarDctParams {
            distance: 1.0,
            ..Default::default()
        };
        let full = encode_body(&planes, &is_chroma, &[false, false, false], &params).unwrap();
        let half = encode_body(&planes, &is_chroma, &[false, true, true], &params).unwrap();
        let size = |body: &crate::var_dct::VarDctBody| -> usize {
            body.sections.iter().map(|s| s.len()).sum()
        };
        assert!(size(&half) < size(&full));
    }

    #[test]
    fn test_dc_only_body() {
        let planes = gradient_planes(24, 24, 1);
        let params = VarDctParams {
            distance: 1.0,
            dc_only: true,
            ..Default::default()
        };
        let body = encode_body(&planes, &[false], &[false], &params).unwrap();
        assert_eq!(body.num_passes, 1);
        let decoder = decode_all(&body, 24, 24, &[false], &[false], 1.0, false, true);
        let decoded = decoder.reconstruct().unwrap();
        // Each 8x8 block collapses to its mean.
        for by in 0..3 {
            for bx in 0..3 {
                let corner = decoded[0].get(bx * 8, by * 8);
                for y in 0..8 {
                    for x in 0..8 {
                        let value = decoded[0].get(bx * 8 + x, by * 8 + y);
                        assert!((value - corner).abs() < 1e-3);
                    }
                }
            }
        }
    }

    #[test]
    fn test_wrong_section_count_rejected() {
        let planes = gradient_planes(16, 16, 1);
        let params = VarDctParams {
            distance: 1.0,
            ..Default::default()
        };
        let body = encode_body(&planes, &[false], &[false], &params).unwrap();
        let mut decoder =
            VarDctDecoder::new(16, 16, &[false], &[false], 1.0, 1, false, false).unwrap();
        let section: &[u8] = &body.sections[0];
        assert!(decoder.decode_pass(&[section, section]).is_err());
    }

    #[test]
    fn test_invalid_pass_count_rejected() {
        assert!(matches!(
            VarDctDecoder::new(8, 8, &[false], &[false], 1.0, 2, false, false),
            Err(Error::InvalidFrameHeader(_))
        ));
    }
}
