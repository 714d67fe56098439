// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::BLOCK_SIZE;

/// Canonical JPEG ZigZag scan: `ZIGZAG_ORDER[i]` is the row-major block
/// position of the i-th scanned coefficient. Position 0 is the DC,
/// position 63 the bottom-right corner.
#[rustfmt::skip]
pub const ZIGZAG_ORDER: [usize; BLOCK_SIZE] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Linearises a row-major block into scan order.
pub fn scan<T: Copy + Default>(block: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    let mut out = [T::default(); BLOCK_SIZE];
    for (scan_pos, &block_pos) in ZIGZAG_ORDER.iter().enumerate() {
        out[scan_pos] = block[block_pos];
    }
    out
}

/// Inverse of [`scan`].
pub fn unscan<T: Copy + Default>(scanned: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    let mut out = [T::default(); BLOCK_SIZE];
    for (scan_pos, &block_pos) in ZIGZAG_ORDER.iter().enumerate() {
        out[block_pos] = scanned[scan_pos];
    }
    out
}
