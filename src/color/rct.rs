// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Reversible colour transform (YCoCg-R), integer-exact both ways.

use crate::image::Plane;

/// Offset added to the signed chroma planes so they stay representable in
/// the unsigned sample range.
pub const CHROMA_OFFSET: i32 = 1 << 15;

/// Forward YCoCg-R on one pixel; returns `(y, co, cg)` without the chroma
/// offset applied.
pub fn forward_rct_pixel(r: i32, g: i32, b: i32) -> (i32, i32, i32) {
    let co = r - b;
    let t = b + (co >> 1);
    let cg = g - t;
    let y = t + (cg >> 1);
    (y, co, cg)
}

/// Exact integer inverse of [`forward_rct_pixel`].
pub fn inverse_rct_pixel(y: i32, co: i32, cg: i32) -> (i32, i32, i32) {
    let t = y - (cg >> 1);
    let g = cg + t;
    let b = t - (co >> 1);
    let r = b + co;
    (r, g, b)
}

/// Applies the forward RCT across the first three planes in place, storing
/// the chroma planes with [`CHROMA_OFFSET`]. Any further planes (alpha)
/// are left untouched.
pub fn forward_rct(planes: &mut [Plane<i32>]) {
    debug_assert!(planes.len() >= 3);
    let (width, height) = planes[0].size();
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = (planes[0].get(x, y), planes[1].get(x, y), planes[2].get(x, y));
            let (luma, co, cg) = forward_rct_pixel(r, g, b);
            planes[0].set(x, y, luma);
            planes[1].set(x, y, co + CHROMA_OFFSET);
            planes[2].set(x, y, cg + CHROMA_OFFSET);
        }
    }
}

/// Inverse of [`forward_rct`].
pub fn inverse_rct(planes: &mut [Plane<i32>]) {
    debug_assert!(planes.len() >= 3);
    let (width, height) = planes[0].size();
    for y in 0..height {
        for x in 0..width {
            let luma = planes[0].get(x, y);
            let co = planes[1].get(x, y) - CHROMA_OFFSET;
            let cg = planes[2].get(x, y) - CHROMA_OFFSET;
            let (r, g, b) = inverse_rct_pixel(luma, co, cg);
            planes[0].set(x, y, r);
            planes[1].set(x, y, g);
            planes[2].set(x, y, b);
        }
    }
}
