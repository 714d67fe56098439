// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Meta-Adaptive tree: a small arena-indexed decision tree that maps
//! causal properties of a pixel to a predictor and an entropy context.

use num_derive::FromPrimitive;

use crate::error::{Error, Result};
use crate::modular::predict::{Neighborhood, Predictor};

/// Properties a decision node may test.
#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    ChannelIndex = 0,
    GradientH = 1,
    GradientV = 2,
    NorthValue = 3,
    WestValue = 4,
    NorthWestValue = 5,
    WestMinusNorthWest = 6,
    NorthMinusNorthWest = 7,
    NorthMinusNorthEast = 8,
    MaxAbsResidual = 9,
}

pub const NUM_PROPERTIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode {
    /// `value <= threshold` descends left, otherwise right.
    Decision {
        property: Property,
        threshold: i32,
        left: u32,
        right: u32,
    },
    Leaf {
        predictor: Predictor,
        context: u32,
    },
}

/// Which built-in tree a frame uses; serialized in the global section.
#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeKind {
    #[default]
    Default = 0,
    Extended = 1,
}

#[derive(Debug, Clone)]
pub struct MaTree {
    nodes: Vec<TreeNode>,
    num_contexts: usize,
}

const GRADIENT_THRESHOLD: i32 = 16;
const RESIDUAL_THRESHOLD: i32 = 8;

impl MaTree {
    /// Seven nodes, four contexts: MED in smooth regions, West/North along
    /// strong single-axis gradients, Select in textured ones.
    pub fn default_tree() -> MaTree {
        use Predictor::*;
        use Property::*;
        let nodes = vec![
            TreeNode::Decision {
                property: GradientH,
                threshold: GRADIENT_THRESHOLD,
                left: 1,
                right: 2,
            },
            TreeNode::Decision {
                property: GradientV,
                threshold: GRADIENT_THRESHOLD,
                left: 3,
                right: 4,
            },
            TreeNode::Decision {
                property: GradientV,
                threshold: GRADIENT_THRESHOLD,
                left: 5,
                right: 6,
            },
            TreeNode::Leaf {
                predictor: Med,
                context: 0,
            },
            TreeNode::Leaf {
                predictor: West,
                context: 1,
            },
            TreeNode::Leaf {
                predictor: North,
                context: 2,
            },
            TreeNode::Leaf {
                predictor: Select,
                context: 3,
            },
        ];
        MaTree {
            nodes,
            num_contexts: 4,
        }
    }

    /// Fifteen nodes, eight contexts: the default structure with a second
    /// axis on the causal residual magnitude, promoting Zero in
    /// high-frequency regions.
    pub fn extended_tree() -> MaTree {
        use Predictor::*;
        use Property::*;
        let decision = |property, threshold, left, right| TreeNode::Decision {
            property,
            threshold,
            left,
            right,
        };
        let leaf = |predictor, context| TreeNode::Leaf { predictor, context };
        let nodes = vec![
            decision(GradientH, GRADIENT_THRESHOLD, 1, 2),
            decision(GradientV, GRADIENT_THRESHOLD, 3, 4),
            decision(GradientV, GRADIENT_THRESHOLD, 5, 6),
            decision(MaxAbsResidual, RESIDUAL_THRESHOLD, 7, 8),
            decision(MaxAbsResidual, RESIDUAL_THRESHOLD, 9, 10),
            decision(MaxAbsResidual, RESIDUAL_THRESHOLD, 11, 12),
            decision(MaxAbsResidual, RESIDUAL_THRESHOLD, 13, 14),
            leaf(Med, 0),
            leaf(AverageWestAndNorth, 1),
            leaf(West, 2),
            leaf(AverageWestAndNorthWest, 3),
            leaf(North, 4),
            leaf(AverageNorthAndNorthWest, 5),
            leaf(Select, 6),
            leaf(Zero, 7),
        ];
        MaTree {
            nodes,
            num_contexts: 8,
        }
    }

    pub fn for_kind(kind: TreeKind) -> MaTree {
        match kind {
            TreeKind::Default => MaTree::default_tree(),
            TreeKind::Extended => MaTree::extended_tree(),
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn num_contexts(&self) -> usize {
        self.num_contexts
    }

    /// Evaluates the property vector for a pixel.
    pub fn properties(channel: usize, n: &Neighborhood) -> [i32; NUM_PROPERTIES] {
        [
            channel as i32,
            (n.west.wrapping_sub(n.north_west)).saturating_abs(),
            (n.north.wrapping_sub(n.north_west)).saturating_abs(),
            n.north,
            n.west,
            n.north_west,
            n.west.wrapping_sub(n.north_west),
            n.north.wrapping_sub(n.north_west),
            n.north.wrapping_sub(n.north_east),
            n.res_north
                .saturating_abs()
                .max(n.res_west.saturating_abs())
                .max(n.res_north_west.saturating_abs()),
        ]
    }

    /// Walks from the root to a leaf; left branches are `<= threshold`.
    pub fn lookup(&self, properties: &[i32; NUM_PROPERTIES]) -> (Predictor, u32) {
        let mut index = 0usize;
        loop {
            match self.nodes[index] {
                TreeNode::Decision {
                    property,
                    threshold,
                    left,
                    right,
                } => {
                    index = if properties[property as usize] <= threshold {
                        left as usize
                    } else {
                        right as usize
                    };
                }
                TreeNode::Leaf { predictor, context } => return (predictor, context),
            }
        }
    }

    /// Structural invariants: in-bounds children and unique in-range leaf
    /// contexts.
    pub fn validate(&self) -> Result<()> {
        let mut seen = vec![false; self.num_contexts];
        for node in &self.nodes {
            match *node {
                TreeNode::Decision { left, right, .. } => {
                    if left as usize >= self.nodes.len() || right as usize >= self.nodes.len() {
                        return Err(Error::DecodingFailed("tree child out of bounds".into()));
                    }
                }
                TreeNode::Leaf { context, .. } => {
                    let slot = seen.get_mut(context as usize).ok_or_else(|| {
                        Error::DecodingFailed("leaf context out of range".into())
                    })?;
                    if *slot {
                        return Err(Error::DecodingFailed("duplicate leaf context".into()));
                    }
                    *slot = true;
                }
            }
        }
        Ok(())
    }
}
