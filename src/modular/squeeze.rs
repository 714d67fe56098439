// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Haar-like multi-resolution lifting transform. Each level averages
//! neighbouring pairs horizontally then vertically and recurses on the
//! average quadrant; the inverse replays the schedule backwards.

use crate::image::Plane;

/// Levels applied when a frame does not override the depth.
pub const DEFAULT_SQUEEZE_LEVELS: u8 = 3;

/// Region schedule for `levels` levels over a `(width, height)` plane.
/// Dimensions of 1 skip their direction; a level with nothing to do ends
/// the schedule early.
fn region_schedule(width: usize, height: usize, levels: usize) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let (mut w, mut h) = (width, height);
    for _ in 0..levels {
        if w <= 1 && h <= 1 {
            break;
        }
        regions.push((w, h));
        w = w.div_ceil(2);
        h = h.div_ceil(2);
    }
    regions
}

/// `avg = (a + b) >> 1` floors; the reconstruction recovers the low bit
/// from the parity of the detail. Widened internally so the floor is exact
/// across the whole storable range; details must fit in i32.
fn lift(a: i32, b: i32) -> (i32, i32) {
    let sum = a as i64 + b as i64;
    let detail = a as i64 - b as i64;
    debug_assert!(i32::try_from(detail).is_ok());
    ((sum >> 1) as i32, detail as i32)
}

fn unlift(avg: i32, detail: i32) -> (i32, i32) {
    let detail = detail as i64;
    let a = avg as i64 + ((detail + (detail & 1)) >> 1);
    (a as i32, (a - detail) as i32)
}

fn forward_h(plane: &mut Plane<i32>, region_w: usize, region_h: usize) {
    let half = region_w.div_ceil(2);
    let mut tmp = vec![0i32; region_w];
    for y in 0..region_h {
        let row = plane.row_mut(y);
        for i in 0..region_w / 2 {
            let (avg, detail) = lift(row[2 * i], row[2 * i + 1]);
            tmp[i] = avg;
            tmp[half + i] = detail;
        }
        if region_w % 2 == 1 {
            tmp[half - 1] = row[region_w - 1];
        }
        row[..region_w].copy_from_slice(&tmp);
    }
}

fn inverse_h(plane: &mut Plane<i32>, region_w: usize, region_h: usize) {
    let half = region_w.div_ceil(2);
    let mut tmp = vec![0i32; region_w];
    for y in 0..region_h {
        let row = plane.row_mut(y);
        for i in 0..region_w / 2 {
            let (a, b) = unlift(row[i], row[half + i]);
            tmp[2 * i] = a;
            tmp[2 * i + 1] = b;
        }
        if region_w % 2 == 1 {
            tmp[region_w - 1] = row[half - 1];
        }
        row[..region_w].copy_from_slice(&tmp);
    }
}

fn forward_v(plane: &mut Plane<i32>, region_w: usize, region_h: usize) {
    let half = region_h.div_ceil(2);
    let mut tmp = vec![0i32; region_h];
    for x in 0..region_w {
        for i in 0..region_h / 2 {
            let (avg, detail) = lift(plane.get(x, 2 * i), plane.get(x, 2 * i + 1));
            tmp[i] = avg;
            tmp[half + i] = detail;
        }
        if region_h % 2 == 1 {
            tmp[half - 1] = plane.get(x, region_h - 1);
        }
        for (y, &value) in tmp.iter().enumerate() {
            plane.set(x, y, value);
        }
    }
}

fn inverse_v(plane: &mut Plane<i32>, region_w: usize, region_h: usize) {
    let half = region_h.div_ceil(2);
    let mut tmp = vec![0i32; region_h];
    for x in 0..region_w {
        for i in 0..region_h / 2 {
            let (a, b) = unlift(plane.get(x, i), plane.get(x, half + i));
            tmp[2 * i] = a;
            tmp[2 * i + 1] = b;
        }
        if region_h % 2 == 1 {
            tmp[region_h - 1] = plane.get(x, half - 1);
        }
        for (y, &value) in tmp.iter().enumerate() {
            plane.set(x, y, value);
        }
    }
}

/// In-place forward squeeze, horizontal then vertical per level.
pub fn forward_squeeze(plane: &mut Plane<i32>, levels: usize) {
    let (width, height) = plane.size();
    for &(w, h) in &region_schedule(width, height, levels) {
        if w > 1 {
            forward_h(plane, w, h);
        }
        if h > 1 {
            forward_v(plane, w, h);
        }
    }
}

/// Exact inverse of [`forward_squeeze`] with the same level count.
pub fn inverse_squeeze(plane: &mut Plane<i32>, levels: usize) {
    let (width, height) = plane.size();
    for &(w, h) in region_schedule(width, height, levels).iter().rev() {
        if h > 1 {
            inverse_v(plane, w, h);
        }
        if w > 1 {
            inverse_h(plane, w, h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn roundtrip(width: usize, height: usize, levels: usize, seed: u64) {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let mut plane = Plane::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                plane.set(x, y, rng.random_range(-(1 << 20)..(1 << 20)));
            }
        }
        let original = plane.clone();
        forward_squeeze(&mut plane, levels);
        inverse_squeeze(&mut plane, levels);
        assert_eq!(plane, original, "{width}x{height} at {levels} levels");
    }

    #[test]
    fn test_lift_pair() {
        assert_eq!(lift(10, 6), (8, 4));
        assert_eq!(unlift(8, 4), (10, 6));
        assert_eq!(lift(5, 2), (3, 3));
        assert_eq!(unlift(3, 3), (5, 2));
        assert_eq!(lift(-3, 2), (-1, -5));
        assert_eq!(unlift(-1, -5), (-3, 2));
    }

    #[test]
    fn test_roundtrip_even_dimensions() {
        roundtrip(8, 8, 3, 1);
        roundtrip(16, 4, 3, 2);
        roundtrip(64, 64, 3, 3);
    }

    #[test]
    fn test_roundtrip_odd_dimensions() {
        roundtrip(7, 5, 3, 4);
        roundtrip(1, 9, 3, 5);
        roundtrip(9, 1, 3, 6);
        roundtrip(13, 21, 5, 7);
    }

    #[test]
    fn test_roundtrip_tiny_planes() {
        roundtrip(1, 1, 3, 8);
        roundtrip(2, 1, 3, 9);
        roundtrip(2, 2, 1, 10);
    }

    #[test]
    fn test_averages_land_in_front() {
        let mut plane = Plane::new(4, 1).unwrap();
        for x in 0..4 {
            plane.set(x, 0, (x as i32 + 1) * 10);
        }
        forward_squeeze(&mut plane, 1);
        // Pairs (10, 20) and (30, 40) -> averages 15, 35; details -10, -10.
        assert_eq!(plane.row(0), &[15, 35, -10, -10]);
    }

    #[test]
    fn test_deep_schedule_stops_early() {
        // More levels than the plane can halve must behave like the
        // maximum meaningful depth.
        roundtrip(8, 8, 30, 11);
    }
}
