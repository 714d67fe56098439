// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

mod decoder;
mod encoder;
mod options;

pub use decoder::JxlDecoder;
pub use encoder::{EncodeStats, JxlEncoder};
pub use options::{
    ChromaSubsampling, Effort, EncodingMode, JxlEncoderOptions, ResponsiveConfig,
};
