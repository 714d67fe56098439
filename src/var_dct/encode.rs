// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_writer::BitWriter;
use crate::entropy_coding::ans::write_ans_section;
use crate::entropy_coding::context::{activity_bucket, zigzag_encode};
use crate::entropy_coding::rice::RiceCoder;
use crate::error::Result;
use crate::image::Plane;
use crate::util::tracing_wrappers::*;
use crate::var_dct::coeff_order::ZIGZAG_ORDER;
use crate::var_dct::dct::Dct8;
use crate::var_dct::quant::QuantMatrix;
use crate::var_dct::{pass_ranges, plane_geometry, Geometry, NUM_COEFF_CONTEXTS};
use crate::{BLOCK_DIM, BLOCK_SIZE};

/// Entropy-coded VarDCT frame body: one section per pass per group,
/// pass-major.
#[derive(Debug, Clone)]
pub struct VarDctBody {
    pub sections: Vec<Vec<u8>>,
    pub num_passes: u32,
    pub num_groups: u32,
}

/// Per-frame knobs of the VarDCT coder; which planes are subsampled is
/// passed alongside the planes themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarDctParams {
    pub distance: f32,
    pub progressive: bool,
    pub use_ans: bool,
    /// Emit only the DC coefficients.
    pub dc_only: bool,
}

/// DC prediction over the group-local lattice: 0 at the group origin, the
/// left DC on the first row, the top DC on the first column, otherwise
/// their truncating average.
pub(super) fn predict_dc(left: Option<i32>, top: Option<i32>) -> i32 {
    match (left, top) {
        (None, None) => 0,
        (Some(left), None) => left,
        (None, Some(top)) => top,
        (Some(left), Some(top)) => (left + top) / 2,
    }
}

/// DC entropy context from the magnitudes of the causal neighbour DCs.
pub(super) fn dc_context(left: Option<i32>, top: Option<i32>) -> usize {
    let values = [left, top];
    let present = values.iter().flatten().count() as u64;
    if present == 0 {
        return 0;
    }
    let sum: u64 = values
        .iter()
        .flatten()
        .map(|v| v.unsigned_abs() as u64)
        .sum();
    activity_bucket((sum / present).min(u32::MAX as u64) as u32) as usize
}

/// AC entropy context from the running activity of the coefficients coded
/// so far in the same block.
pub(super) fn ac_context(sum_abs: u64, count: u32) -> usize {
    let average = if count == 0 { 0 } else { sum_abs / count as u64 };
    4 + activity_bucket(average.min(u32::MAX as u64) as u32) as usize
}

/// Extracts one 8x8 block, padding past the edges by repeating the last
/// row and column.
pub(super) fn extract_block(plane: &Plane<f32>, bx: usize, by: usize) -> [f32; BLOCK_SIZE] {
    let (width, height) = plane.size();
    let mut block = [0.0f32; BLOCK_SIZE];
    for y in 0..BLOCK_DIM {
        for x in 0..BLOCK_DIM {
            let px = (bx * BLOCK_DIM + x).min(width - 1);
            let py = (by * BLOCK_DIM + y).min(height - 1);
            block[y * BLOCK_DIM + x] = plane.get(px, py);
        }
    }
    block
}

/// Coded resolution of each plane given the subsampling choice.
pub(super) fn plane_geometries(
    width: usize,
    height: usize,
    subsampled: &[bool],
) -> Vec<Geometry> {
    subsampled
        .iter()
        .map(|&sub| plane_geometry(width, height, sub))
        .collect()
}

/// Collects the symbol stream of one section: each plane's blocks for the
/// group in row-major order, DC residual first (when the pass covers it)
/// then the pass's ZigZag span.
fn section_symbols(
    coeffs: &[Vec<[i16; BLOCK_SIZE]>],
    geometries: &[Geometry],
    group: usize,
    range: &std::ops::Range<usize>,
) -> Vec<(usize, u32)> {
    let mut symbols = Vec::new();
    for (plane_coeffs, geometry) in coeffs.iter().zip(geometries.iter()) {
        let (bx_range, by_range) = geometry.group_blocks(group);
        for by in by_range.clone() {
            for bx in bx_range.clone() {
                let block = &plane_coeffs[by * geometry.blocks_x + bx];
                if range.start == 0 {
                    let left = (bx > bx_range.start)
                        .then(|| plane_coeffs[by * geometry.blocks_x + bx - 1][0] as i32);
                    let top = (by > by_range.start)
                        .then(|| plane_coeffs[(by - 1) * geometry.blocks_x + bx][0] as i32);
                    let residual = block[0] as i32 - predict_dc(left, top);
                    symbols.push((dc_context(left, top), zigzag_encode(residual)));
                }
                let mut sum_abs = 0u64;
                let mut count = 0u32;
                for scan_pos in range.start.max(1)..range.end {
                    let value = block[ZIGZAG_ORDER[scan_pos]] as i32;
                    symbols.push((ac_context(sum_abs, count), zigzag_encode(value)));
                    sum_abs += value.unsigned_abs() as u64;
                    count += 1;
                }
            }
        }
    }
    symbols
}

pub(super) fn write_section(symbols: &[(usize, u32)], use_ans: bool) -> Vec<u8> {
    let mut bw = BitWriter::new();
    if use_ans {
        write_ans_section(&mut bw, NUM_COEFF_CONTEXTS, symbols);
    } else {
        let mut coder = RiceCoder::new(NUM_COEFF_CONTEXTS);
        for &(ctx, symbol) in symbols {
            coder.encode(&mut bw, ctx, symbol);
        }
    }
    bw.finalize()
}

/// Transforms, quantises, and entropy-codes centred f32 planes. The
/// planes arrive at full resolution; `subsampled` marks the ones to code
/// at half resolution.
pub fn encode_body(
    planes: &[Plane<f32>],
    is_chroma: &[bool],
    subsampled: &[bool],
    params: &VarDctParams,
) -> Result<VarDctBody> {
    debug_assert_eq!(planes.len(), is_chroma.len());
    debug_assert_eq!(planes.len(), subsampled.len());
    let (width, height) = planes[0].size();
    let geometries = plane_geometries(width, height, subsampled);
    let dct = Dct8::new();
    let matrices: Vec<QuantMatrix> = is_chroma
        .iter()
        .map(|&chroma| QuantMatrix::new(params.distance, chroma))
        .collect();

    let mut coeffs: Vec<Vec<[i16; BLOCK_SIZE]>> = Vec::with_capacity(planes.len());
    for plane_idx in 0..planes.len() {
        let coded = if subsampled[plane_idx] {
            crate::color::subsample::downsample_2x(&planes[plane_idx])?
        } else {
            planes[plane_idx].clone()
        };
        let geometry = &geometries[plane_idx];
        debug_assert_eq!(coded.size(), (geometry.width, geometry.height));
        let mut plane_coeffs = Vec::with_capacity(geometry.num_blocks());
        for by in 0..geometry.blocks_y {
            for bx in 0..geometry.blocks_x {
                let block = extract_block(&coded, bx, by);
                plane_coeffs.push(matrices[plane_idx].quantize(&dct.forward(&block)));
            }
        }
        coeffs.push(plane_coeffs);
    }

    let ranges = if params.dc_only {
        vec![0..1]
    } else {
        pass_ranges(params.progressive)
    };
    let num_groups = geometries[0].num_groups();
    let mut sections = Vec::with_capacity(ranges.len() * num_groups);
    for range in &ranges {
        for group in 0..num_groups {
            let symbols = section_symbols(&coeffs, &geometries, group, range);
            sections.push(write_section(&symbols, params.use_ans));
        }
    }
    debug!(
        num_passes = ranges.len(),
        num_groups,
        subsampled = subsampled.iter().any(|&s| s),
        "vardct body encoded"
    );
    Ok(VarDctBody {
        sections,
        num_passes: ranges.len() as u32,
        num_groups: num_groups as u32,
    })
}
