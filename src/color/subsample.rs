// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chroma resampling for the 4:2:0 lossy path: box-filter downsampling
//! and nearest-neighbour upsampling.

use crate::error::Result;
use crate::image::Plane;

/// Halves both dimensions (rounding up), averaging each 2x2 cell over the
/// samples that exist.
pub fn downsample_2x(plane: &Plane<f32>) -> Result<Plane<f32>> {
    let (width, height) = plane.size();
    let mut out = Plane::new(width.div_ceil(2), height.div_ceil(2))?;
    for oy in 0..out.height() {
        for ox in 0..out.width() {
            let mut sum = 0.0f32;
            let mut count = 0.0f32;
            for dy in 0..2 {
                for dx in 0..2 {
                    let (x, y) = (ox * 2 + dx, oy * 2 + dy);
                    if x < width && y < height {
                        sum += plane.get(x, y);
                        count += 1.0;
                    }
                }
            }
            out.set(ox, oy, sum / count);
        }
    }
    Ok(out)
}

/// Expands a half-resolution plane back to `(width, height)` by sample
/// replication.
pub fn upsample_2x(plane: &Plane<f32>, width: usize, height: usize) -> Result<Plane<f32>> {
    let mut out = Plane::new(width, height)?;
    for y in 0..height {
        for x in 0..width {
            out.set(x, y, plane.get((x / 2).min(plane.width() - 1), (y / 2).min(plane.height() - 1)));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_averages_cells() {
        let mut plane = Plane::new(4, 2).unwrap();
        for (i, value) in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]
            .iter()
            .enumerate()
        {
            plane.set(i % 4, i / 4, *value);
        }
        let down = downsample_2x(&plane).unwrap();
        assert_eq!(down.size(), (2, 1));
        assert_eq!(down.get(0, 0), 35.0);
        assert_eq!(down.get(1, 0), 55.0);
    }

    #[test]
    fn test_odd_dimensions() {
        let mut plane = Plane::new(3, 3).unwrap();
        plane.set(2, 2, 9.0);
        let down = downsample_2x(&plane).unwrap();
        assert_eq!(down.size(), (2, 2));
        // The bottom-right cell has a single contributing sample.
        assert_eq!(down.get(1, 1), 9.0);
    }

    #[test]
    fn test_constant_plane_survives_roundtrip() {
        let mut plane = Plane::new(5, 7).unwrap();
        for y in 0..7 {
            for x in 0..5 {
                plane.set(x, y, 42.0);
            }
        }
        let up = upsample_2x(&downsample_2x(&plane).unwrap(), 5, 7).unwrap();
        assert_eq!(up, plane);
    }

    #[test]
    fn test_upsample_replicates() {
        let mut half = Plane::new(2, 1).unwrap();
        half.set(0, 0, 1.0);
        half.set(1, 0, 2.0);
        let up = upsample_2x(&half, 4, 2).unwrap();
        assert_eq!(up.row(0), &[1.0, 1.0, 2.0, 2.0]);
        assert_eq!(up.row(1), &[1.0, 1.0, 2.0, 2.0]);
    }
}
