// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_writer::BitWriter;
use crate::entropy_coding::ans::write_ans_section;
use crate::entropy_coding::context::zigzag_encode;
use crate::entropy_coding::rice::RiceCoder;
use crate::error::Result;
use crate::image::Plane;
use crate::modular::predict::Neighborhood;
use crate::modular::squeeze::forward_squeeze;
use crate::modular::tree::MaTree;
use crate::modular::MAX_SAMPLE_VALUE;
use crate::util::tracing_wrappers::*;

/// Codes one channel plane into a framed section: squeeze, MA prediction,
/// then the context-adaptive entropy coder. The plane is transformed in
/// place.
pub fn encode_channel(
    plane: &mut Plane<i32>,
    channel_index: usize,
    tree: &MaTree,
    squeeze_levels: usize,
    use_ans: bool,
) -> Result<Vec<u8>> {
    if squeeze_levels > 0 {
        forward_squeeze(plane, squeeze_levels);
    }
    let (width, height) = plane.size();
    let mut residuals = Plane::new(width, height)?;
    let mut symbols: Vec<(usize, u32)> = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let neighborhood = Neighborhood::gather(plane, &residuals, x, y);
            let properties = MaTree::properties(channel_index, &neighborhood);
            let (predictor, ctx) = tree.lookup(&properties);
            let predicted = predictor.predict_one(&neighborhood, MAX_SAMPLE_VALUE);
            let residual = plane.get(x, y).wrapping_sub(predicted);
            residuals.set(x, y, residual);
            symbols.push((ctx as usize, zigzag_encode(residual)));
        }
    }
    let mut bw = BitWriter::new();
    if use_ans {
        write_ans_section(&mut bw, tree.num_contexts(), &symbols);
    } else {
        let mut coder = RiceCoder::new(tree.num_contexts());
        for &(ctx, symbol) in &symbols {
            coder.encode(&mut bw, ctx, symbol);
        }
    }
    let section = bw.finalize();
    debug!(
        channel_index,
        pixels = width * height,
        bytes = section.len(),
        "modular channel encoded"
    );
    Ok(section)
}
