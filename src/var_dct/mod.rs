// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod coeff_order;
pub mod dct;
mod decode;
mod encode;
pub mod quant;

pub use decode::VarDctDecoder;
pub use encode::{encode_body, VarDctBody, VarDctParams};

use crate::{BLOCK_DIM, GROUP_DIM};

/// Number of entropy contexts used for coefficients: four DC-magnitude
/// buckets and four AC-activity buckets.
pub const NUM_COEFF_CONTEXTS: usize = 8;

/// ZigZag positions covered by each progressive pass: DC, the first ten AC
/// coefficients, then the remaining fifty-three.
pub const PASS_SPLITS: [std::ops::Range<usize>; 3] = [0..1, 1..11, 11..64];

/// Per-frame pass structure: three progressive passes or a single one.
pub fn pass_ranges(progressive: bool) -> Vec<std::ops::Range<usize>> {
    if progressive {
        PASS_SPLITS.to_vec()
    } else {
        vec![0..64]
    }
}

/// In-frame decoding state for the progressive pass machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    Dc,
    LowAc,
    HighAc,
    Done,
}

impl PassState {
    /// Advances on each parsed pass; a single-pass frame jumps straight to
    /// Done.
    pub fn advance(self, num_passes: u32) -> PassState {
        match (self, num_passes) {
            (PassState::Idle, 1) => PassState::Done,
            (PassState::Idle, _) => PassState::Dc,
            (PassState::Dc, _) => PassState::LowAc,
            (PassState::LowAc, _) => PassState::HighAc,
            _ => PassState::Done,
        }
    }
}

/// Block and group geometry of one coded plane; groups tile the plane in
/// `group_dim`-pixel squares and are coded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub blocks_x: usize,
    pub blocks_y: usize,
    pub groups_x: usize,
    pub groups_y: usize,
    group_dim: usize,
}

impl Geometry {
    pub fn new(width: usize, height: usize) -> Geometry {
        Self::with_group_dim(width, height, GROUP_DIM)
    }

    /// Subsampled chroma planes use half the group dimension so their
    /// group grid stays congruent with the luma grid.
    pub fn with_group_dim(width: usize, height: usize, group_dim: usize) -> Geometry {
        let blocks_x = width.div_ceil(BLOCK_DIM);
        let blocks_y = height.div_ceil(BLOCK_DIM);
        let group_blocks = group_dim / BLOCK_DIM;
        Geometry {
            width,
            height,
            blocks_x,
            blocks_y,
            groups_x: blocks_x.div_ceil(group_blocks),
            groups_y: blocks_y.div_ceil(group_blocks),
            group_dim,
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks_x * self.blocks_y
    }

    pub fn num_groups(&self) -> usize {
        self.groups_x * self.groups_y
    }

    /// Block-coordinate bounds of one group, `(bx0..bx1, by0..by1)`.
    pub fn group_blocks(&self, group: usize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let group_blocks = self.group_dim / BLOCK_DIM;
        let gx = group % self.groups_x;
        let gy = group / self.groups_x;
        let bx0 = gx * group_blocks;
        let by0 = gy * group_blocks;
        (
            bx0..(bx0 + group_blocks).min(self.blocks_x),
            by0..(by0 + group_blocks).min(self.blocks_y),
        )
    }
}

/// Per-plane coding geometry: subsampled planes shrink by two in both
/// directions and tile with half-sized groups.
pub fn plane_geometry(width: usize, height: usize, subsampled: bool) -> Geometry {
    if subsampled {
        Geometry::with_group_dim(width.div_ceil(2), height.div_ceil(2), GROUP_DIM / 2)
    } else {
        Geometry::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_group_geometry() {
        let geometry = Geometry::new(100, 60);
        assert_eq!(geometry.blocks_x, 13);
        assert_eq!(geometry.blocks_y, 8);
        assert_eq!(geometry.num_groups(), 1);
        let (bx, by) = geometry.group_blocks(0);
        assert_eq!((bx.len(), by.len()), (13, 8));
    }

    #[test]
    fn test_multi_group_geometry() {
        let geometry = Geometry::new(300, 257);
        assert_eq!(geometry.groups_x, 2);
        assert_eq!(geometry.groups_y, 2);
        let (bx, by) = geometry.group_blocks(3);
        assert_eq!(bx, 32..38);
        assert_eq!(by, 32..33);
    }

    #[test]
    fn test_subsampled_geometry_group_grid_matches_luma() {
        for (w, h) in [(300usize, 257usize), (256, 256), (257, 100), (1000, 513)] {
            let luma = plane_geometry(w, h, false);
            let chroma = plane_geometry(w, h, true);
            assert_eq!(luma.groups_x, chroma.groups_x, "{w}x{h}");
            assert_eq!(luma.groups_y, chroma.groups_y, "{w}x{h}");
            assert_eq!(chroma.width, w.div_ceil(2));
        }
    }

    #[test]
    fn test_pass_state_machine() {
        let mut state = PassState::Idle;
        let order = [PassState::Dc, PassState::LowAc, PassState::HighAc];
        for expected in order {
            state = state.advance(3);
            assert_eq!(state, expected);
        }
        assert_eq!(state.advance(3), PassState::Done);
        assert_eq!(PassState::Idle.advance(1), PassState::Done);
    }

    #[test]
    fn test_pass_splits_cover_all_coefficients() {
        let total: usize = PASS_SPLITS.iter().map(|r| r.len()).sum();
        assert_eq!(total, 64);
        assert_eq!(pass_ranges(false), vec![0..64]);
    }
}
