// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{BigEndian, ByteOrder};
use num_traits::FromPrimitive;

use crate::error::{Error, Result};
use crate::image::{AlphaMode, ColorSpace, ImageFrame, SampleType};

/// Bytes every codestream starts with.
pub const CODESTREAM_SIGNATURE: [u8; 2] = [0xff, 0x0a];

/// Byte length of the serialized image header.
pub const IMAGE_HEADER_SIZE: usize = 14;

/// Byte-oriented image header:
/// signature (2) + width (4, BE) + height (4, BE) + bits-per-sample (1) +
/// channel count (1) + colour-space indicator (1) + alpha mode (1).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u32,
    pub num_channels: u32,
    pub color_space: ColorSpace,
    pub has_alpha: bool,
    pub alpha_mode: AlphaMode,
    pub header_size: usize,
}

impl ImageHeader {
    pub fn for_frame(frame: &ImageFrame) -> ImageHeader {
        ImageHeader {
            width: frame.width() as u32,
            height: frame.height() as u32,
            bits_per_sample: frame.bits_per_sample(),
            num_channels: frame.num_channels() as u32,
            color_space: frame.color_space().clone(),
            has_alpha: frame.has_alpha(),
            alpha_mode: frame.alpha_mode(),
            header_size: IMAGE_HEADER_SIZE,
        }
    }

    pub fn sample_type(&self) -> Result<SampleType> {
        SampleType::for_bits_per_sample(self.bits_per_sample)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut dims = [0u8; 8];
        BigEndian::write_u32(&mut dims[..4], self.width);
        BigEndian::write_u32(&mut dims[4..], self.height);
        out.extend_from_slice(&CODESTREAM_SIGNATURE);
        out.extend_from_slice(&dims);
        out.push(self.bits_per_sample as u8);
        out.push(self.num_channels as u8);
        out.push(self.color_space.indicator());
        out.push(if self.has_alpha {
            1 + self.alpha_mode as u8
        } else {
            0
        });
    }

    pub fn parse(data: &[u8]) -> Result<ImageHeader> {
        if data.len() < 2 {
            return Err(Error::TruncatedData);
        }
        if data[..2] != CODESTREAM_SIGNATURE {
            return Err(Error::InvalidSignature);
        }
        if data.len() < IMAGE_HEADER_SIZE {
            return Err(Error::TruncatedData);
        }
        let width = BigEndian::read_u32(&data[2..6]);
        let height = BigEndian::read_u32(&data[6..10]);
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions(width, height));
        }
        let bits_per_sample = data[10] as u32;
        // Reject absurd pixel counts before any allocation happens.
        if width as u64 * height as u64 * bits_per_sample.max(1) as u64 / 8 > i32::MAX as u64 {
            return Err(Error::InvalidDimensions(width, height));
        }
        SampleType::for_bits_per_sample(bits_per_sample)?;
        let num_channels = data[11] as u32;
        if !(1..=4).contains(&num_channels) {
            return Err(Error::InvalidImageHeader(format!(
                "invalid channel count: {num_channels}"
            )));
        }
        let color_space = ColorSpace::from_indicator(data[12])?;
        let (has_alpha, alpha_mode) = match data[13] {
            0 => (false, AlphaMode::Straight),
            tag @ (1 | 2) => (true, AlphaMode::from_u8(tag - 1).unwrap()),
            tag => {
                return Err(Error::InvalidImageHeader(format!(
                    "invalid alpha mode: {tag}"
                )));
            }
        };
        if has_alpha != (num_channels == 2 || num_channels == 4) {
            return Err(Error::InvalidImageHeader(format!(
                "alpha flag does not match {num_channels} channels"
            )));
        }
        Ok(ImageHeader {
            width,
            height,
            bits_per_sample,
            num_channels,
            color_space,
            has_alpha,
            alpha_mode,
            header_size: IMAGE_HEADER_SIZE,
        })
    }
}
