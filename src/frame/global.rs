// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::FromPrimitive;

use crate::error::{Error, Result};
use crate::modular::tree::TreeKind;

const FLAG_MODULAR: u8 = 1 << 0;
const FLAG_RCT: u8 = 1 << 1;
const FLAG_XYB: u8 = 1 << 2;
const FLAG_PROGRESSIVE: u8 = 1 << 3;
const FLAG_RESPONSIVE: u8 = 1 << 4;
const FLAG_ANS: u8 = 1 << 5;
const FLAG_SUBSAMPLED_CHROMA: u8 = 1 << 6;

/// The frame's global section: a byte-aligned record of the coding flags,
/// channel count, tree type, and squeeze depth, plus the quantisation
/// distance (and responsive layer ladder) for VarDCT frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGlobal {
    pub modular: bool,
    pub rct: bool,
    pub xyb: bool,
    pub progressive: bool,
    pub responsive: bool,
    pub ans: bool,
    pub subsampled_chroma: bool,
    pub num_channels: u8,
    pub tree_kind: TreeKind,
    pub squeeze_levels: u8,
    pub distance: f32,
    pub layer_distances: Vec<f32>,
}

impl FrameGlobal {
    pub fn write(&self) -> Vec<u8> {
        let mut flags = 0u8;
        for (bit, set) in [
            (FLAG_MODULAR, self.modular),
            (FLAG_RCT, self.rct),
            (FLAG_XYB, self.xyb),
            (FLAG_PROGRESSIVE, self.progressive),
            (FLAG_RESPONSIVE, self.responsive),
            (FLAG_ANS, self.ans),
            (FLAG_SUBSAMPLED_CHROMA, self.subsampled_chroma),
        ] {
            if set {
                flags |= bit;
            }
        }
        let mut out = vec![
            flags,
            self.num_channels,
            self.tree_kind as u8,
            self.squeeze_levels,
        ];
        if !self.modular {
            let mut distance = [0u8; 4];
            LittleEndian::write_f32(&mut distance, self.distance);
            out.extend_from_slice(&distance);
            if self.responsive {
                out.push(self.layer_distances.len() as u8);
                for &layer_distance in &self.layer_distances {
                    let mut bytes = [0u8; 4];
                    LittleEndian::write_f32(&mut bytes, layer_distance);
                    out.extend_from_slice(&bytes);
                }
            }
        }
        out
    }

    pub fn parse(data: &[u8]) -> Result<FrameGlobal> {
        if data.len() < 4 {
            return Err(Error::TruncatedData);
        }
        let flags = data[0];
        let modular = flags & FLAG_MODULAR != 0;
        let num_channels = data[1];
        if !(1..=4).contains(&num_channels) {
            return Err(Error::DecodingFailed(format!(
                "global section channel count {num_channels}"
            )));
        }
        let tree_kind = TreeKind::from_u8(data[2])
            .ok_or_else(|| Error::UnsupportedEncoding(format!("tree type {}", data[2])))?;
        let squeeze_levels = data[3];
        let mut distance = 0.0;
        let mut layer_distances = Vec::new();
        if !modular {
            if data.len() < 8 {
                return Err(Error::TruncatedData);
            }
            distance = LittleEndian::read_f32(&data[4..8]);
            if !distance.is_finite() || distance < 0.0 {
                return Err(Error::DecodingFailed(format!(
                    "quantisation distance {distance}"
                )));
            }
            if flags & FLAG_RESPONSIVE != 0 {
                if data.len() < 9 {
                    return Err(Error::TruncatedData);
                }
                let num_layers = data[8] as usize;
                if data.len() < 9 + 4 * num_layers {
                    return Err(Error::TruncatedData);
                }
                for layer in 0..num_layers {
                    layer_distances
                        .push(LittleEndian::read_f32(&data[9 + 4 * layer..13 + 4 * layer]));
                }
            }
        }
        Ok(FrameGlobal {
            modular,
            rct: flags & FLAG_RCT != 0,
            xyb: flags & FLAG_XYB != 0,
            progressive: flags & FLAG_PROGRESSIVE != 0,
            responsive: flags & FLAG_RESPONSIVE != 0,
            ans: flags & FLAG_ANS != 0,
            subsampled_chroma: flags & FLAG_SUBSAMPLED_CHROMA != 0,
            num_channels,
            tree_kind,
            squeeze_levels,
            distance,
            layer_distances,
        })
    }
}
