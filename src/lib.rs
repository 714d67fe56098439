// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]

pub mod api;
pub mod bit_reader;
pub mod bit_writer;
pub mod color;
pub mod container;
pub mod entropy_coding;
pub mod error;
pub mod frame;
pub mod headers;
pub mod image;
pub mod modular;
pub mod util;
pub mod validate;
pub mod var_dct;

pub use error::{Error, Result};

pub const BLOCK_DIM: usize = 8;
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;
pub(crate) const GROUP_DIM: usize = 256;
