// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

/// Closed error taxonomy of the codec. Two errors of the same kind with the
/// same payload compare equal; every message renders as `"<Kind>: <detail>"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("InvalidSignature: signature bytes mismatch, expected ff0a")]
    InvalidSignature,
    #[error("TruncatedData: input ends before the declared length")]
    TruncatedData,
    #[error("InvalidImageHeader: {0}")]
    InvalidImageHeader(String),
    #[error("InvalidFrameHeader: {0}")]
    InvalidFrameHeader(String),
    #[error("UnsupportedEncoding: {0}")]
    UnsupportedEncoding(String),
    #[error("InvalidDimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("DecodingFailed: {0}")]
    DecodingFailed(String),
    #[error("InvalidContainer: {0}")]
    InvalidContainer(String),
    #[error("EncodingFailed: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
