// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;

use crate::image::Plane;

/// Pixel predictors available to MA tree leaves.
#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    Zero = 0,
    West = 1,
    North = 2,
    AverageWestAndNorth = 3,
    AverageWestAndNorthWest = 4,
    AverageNorthAndNorthWest = 5,
    Med = 6,
    Select = 7,
}

/// Causal neighbourhood of one pixel: the N/W/NW/NE samples and the
/// residuals recorded at the same positions, with the edge fallbacks
/// already applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighborhood {
    pub west: i32,
    pub north: i32,
    pub north_west: i32,
    pub north_east: i32,
    pub res_west: i32,
    pub res_north: i32,
    pub res_north_west: i32,
}

impl Neighborhood {
    /// Edge rules: on the first row N and NW fall back to W, on the first
    /// column W and NW fall back to N, and the first pixel of a channel
    /// sees all zeros. NE falls back to N past the right edge. Residual
    /// fallbacks are always 0.
    pub fn gather(data: &Plane<i32>, residuals: &Plane<i32>, x: usize, y: usize) -> Neighborhood {
        let width = data.width();
        let (west, north, north_west, north_east) = if x == 0 && y == 0 {
            (0, 0, 0, 0)
        } else if y == 0 {
            let west = data.get(x - 1, y);
            (west, west, west, west)
        } else if x == 0 {
            let north = data.get(x, y - 1);
            let north_east = if x + 1 < width {
                data.get(x + 1, y - 1)
            } else {
                north
            };
            (north, north, north, north_east)
        } else {
            let north = data.get(x, y - 1);
            let north_east = if x + 1 < width {
                data.get(x + 1, y - 1)
            } else {
                north
            };
            (data.get(x - 1, y), north, data.get(x - 1, y - 1), north_east)
        };
        let res_west = if x > 0 { residuals.get(x - 1, y) } else { 0 };
        let res_north = if y > 0 { residuals.get(x, y - 1) } else { 0 };
        let res_north_west = if x > 0 && y > 0 {
            residuals.get(x - 1, y - 1)
        } else {
            0
        };
        Neighborhood {
            west,
            north,
            north_west,
            north_east,
            res_west,
            res_north,
            res_north_west,
        }
    }
}

impl Predictor {
    pub const NUM_PREDICTORS: u32 = Predictor::Select as u32 + 1;

    /// Predicts one sample from its causal neighbourhood. Intermediate
    /// arithmetic is widened so it cannot overflow; the result is clamped
    /// to `[0, max_value]`.
    pub fn predict_one(&self, n: &Neighborhood, max_value: i32) -> i32 {
        let (west, north, north_west) = (n.west as i64, n.north as i64, n.north_west as i64);
        let pred = match self {
            Predictor::Zero => 0,
            Predictor::West => west,
            Predictor::North => north,
            Predictor::AverageWestAndNorth => (west + north) / 2,
            Predictor::AverageWestAndNorthWest => (west + north_west) / 2,
            Predictor::AverageNorthAndNorthWest => (north + north_west) / 2,
            Predictor::Med => north + west - north_west,
            Predictor::Select => {
                if (north - north_west).abs() < (west - north_west).abs() {
                    west
                } else {
                    north
                }
            }
        };
        pred.clamp(0, max_value as i64) as i32
    }
}
