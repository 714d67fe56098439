// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;

use crate::error::{Error, Result};

/// Sample representation of an [`ImageFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum SampleType {
    U8 = 0,
    U16 = 1,
    F32 = 2,
}

impl SampleType {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 => 2,
            SampleType::F32 => 4,
        }
    }

    /// The sample type implied by a declared bits-per-sample value.
    pub fn for_bits_per_sample(bits: u32) -> Result<SampleType> {
        match bits {
            8 => Ok(SampleType::U8),
            10 | 12 | 16 => Ok(SampleType::U16),
            32 => Ok(SampleType::F32),
            _ => Err(Error::InvalidImageHeader(format!(
                "invalid bits_per_sample: {bits}"
            ))),
        }
    }
}

/// Alpha interpretation, relevant only when an alpha channel is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum AlphaMode {
    #[default]
    Straight = 0,
    Premultiplied = 1,
}

/// Colour-space descriptor carried in the image header.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    Srgb,
    LinearRgb,
    Grayscale,
    DisplayP3,
    Rec2020Pq,
    /// xy chromaticities for R, G, B, the white point, and a pure-gamma
    /// transfer function.
    Custom {
        primaries: [[f32; 2]; 3],
        white_point: [f32; 2],
        gamma: f32,
    },
}

impl ColorSpace {
    pub fn indicator(&self) -> u8 {
        match self {
            ColorSpace::Srgb => 0,
            ColorSpace::LinearRgb => 1,
            ColorSpace::Grayscale => 2,
            ColorSpace::DisplayP3 => 3,
            ColorSpace::Rec2020Pq => 4,
            ColorSpace::Custom { .. } => 5,
        }
    }

    /// Maps a header indicator back to a descriptor. Custom colour spaces
    /// decode with sRGB primaries; the codestream does not carry the
    /// chromaticities themselves.
    pub fn from_indicator(indicator: u8) -> Result<ColorSpace> {
        match indicator {
            0 => Ok(ColorSpace::Srgb),
            1 => Ok(ColorSpace::LinearRgb),
            2 => Ok(ColorSpace::Grayscale),
            3 => Ok(ColorSpace::DisplayP3),
            4 => Ok(ColorSpace::Rec2020Pq),
            5 => Ok(ColorSpace::Custom {
                primaries: [[0.64, 0.33], [0.30, 0.60], [0.15, 0.06]],
                white_point: [0.3127, 0.3290],
                gamma: 2.2,
            }),
            _ => Err(Error::InvalidImageHeader(format!(
                "invalid color space indicator: {indicator}"
            ))),
        }
    }

    pub fn is_grayscale(&self) -> bool {
        matches!(self, ColorSpace::Grayscale)
    }
}

/// Planar sample storage; one plane per channel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl SampleBuffer {
    fn zeroed(sample_type: SampleType, len: usize) -> SampleBuffer {
        match sample_type {
            SampleType::U8 => SampleBuffer::U8(vec![0; len]),
            SampleType::U16 => SampleBuffer::U16(vec![0; len]),
            SampleType::F32 => SampleBuffer::F32(vec![0.0; len]),
        }
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            SampleBuffer::U8(_) => SampleType::U8,
            SampleBuffer::U16(_) => SampleType::U16,
            SampleBuffer::F32(_) => SampleType::F32,
        }
    }

    fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::U16(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
        }
    }
}

/// A planar, row-major raster plus the metadata the codestream carries.
///
/// The sample for `(x, y, c)` lives at `channel_plane_offset(c) + y * width
/// + x` in the backing buffer. Frames are constructed by the caller and
/// never retained by the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    width: usize,
    height: usize,
    num_channels: usize,
    bits_per_sample: u32,
    color_space: ColorSpace,
    alpha_mode: AlphaMode,
    samples: SampleBuffer,
}

impl ImageFrame {
    /// Creates a zero-filled frame after checking the data-model
    /// invariants: non-zero dimensions, a channel count matching the
    /// colour-space family, and alpha exactly on 2- or 4-channel frames.
    pub fn new(
        width: usize,
        height: usize,
        num_channels: usize,
        bits_per_sample: u32,
        color_space: ColorSpace,
        alpha_mode: AlphaMode,
    ) -> Result<ImageFrame> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions(width as u32, height as u32));
        }
        if width as u64 * height as u64 * num_channels as u64 > i32::MAX as u64 {
            return Err(Error::InvalidDimensions(width as u32, height as u32));
        }
        if !(1..=4).contains(&num_channels) {
            return Err(Error::InvalidImageHeader(format!(
                "invalid channel count: {num_channels}"
            )));
        }
        let grayscale_family = num_channels <= 2;
        if grayscale_family != color_space.is_grayscale() {
            return Err(Error::InvalidImageHeader(format!(
                "channel count {num_channels} does not match color space"
            )));
        }
        let sample_type = SampleType::for_bits_per_sample(bits_per_sample)?;
        let samples = SampleBuffer::zeroed(sample_type, width * height * num_channels);
        Ok(ImageFrame {
            width,
            height,
            num_channels,
            bits_per_sample,
            color_space,
            alpha_mode,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    pub fn color_space(&self) -> &ColorSpace {
        &self.color_space
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Alpha is present exactly on 2- and 4-channel frames.
    pub fn has_alpha(&self) -> bool {
        self.num_channels == 2 || self.num_channels == 4
    }

    pub fn channel_plane_offset(&self, channel: usize) -> usize {
        channel * self.width * self.height
    }

    /// Largest representable integer sample value.
    pub fn max_value(&self) -> i32 {
        match self.sample_type() {
            SampleType::F32 => i32::MAX,
            _ => ((1u64 << self.bits_per_sample) - 1) as i32,
        }
    }

    fn index(&self, x: usize, y: usize, channel: usize) -> usize {
        debug_assert!(x < self.width && y < self.height && channel < self.num_channels);
        self.channel_plane_offset(channel) + y * self.width + x
    }

    /// Integer sample accessor; f32 samples are returned as their raw bit
    /// pattern so that lossless coding can treat every plane uniformly.
    pub fn sample_i32(&self, x: usize, y: usize, channel: usize) -> i32 {
        let idx = self.index(x, y, channel);
        match &self.samples {
            SampleBuffer::U8(v) => v[idx] as i32,
            SampleBuffer::U16(v) => v[idx] as i32,
            SampleBuffer::F32(v) => v[idx].to_bits() as i32,
        }
    }

    pub fn set_sample_i32(&mut self, x: usize, y: usize, channel: usize, value: i32) {
        let idx = self.index(x, y, channel);
        match &mut self.samples {
            SampleBuffer::U8(v) => v[idx] = value.clamp(0, 0xff) as u8,
            SampleBuffer::U16(v) => v[idx] = value.clamp(0, 0xffff) as u16,
            SampleBuffer::F32(v) => v[idx] = f32::from_bits(value as u32),
        }
    }

    /// Sample scaled into the nominal 8-bit domain `[0, 255]`, used by the
    /// lossy pipeline.
    pub fn sample_f32_8bit(&self, x: usize, y: usize, channel: usize) -> f32 {
        let idx = self.index(x, y, channel);
        match &self.samples {
            SampleBuffer::U8(v) => v[idx] as f32,
            SampleBuffer::U16(v) => v[idx] as f32 * 255.0 / self.max_value() as f32,
            SampleBuffer::F32(v) => v[idx] * 255.0,
        }
    }

    pub fn set_sample_f32_8bit(&mut self, x: usize, y: usize, channel: usize, value: f32) {
        let idx = self.index(x, y, channel);
        let max = self.max_value() as f32;
        match &mut self.samples {
            SampleBuffer::U8(v) => v[idx] = value.round().clamp(0.0, 255.0) as u8,
            SampleBuffer::U16(v) => v[idx] = (value * max / 255.0).round().clamp(0.0, max) as u16,
            SampleBuffer::F32(v) => v[idx] = value / 255.0,
        }
    }

    /// Extracts channel `c` as an `i32` coding plane.
    pub fn plane_i32(&self, channel: usize) -> Result<Plane<i32>> {
        let mut plane = Plane::new(self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                plane.set(x, y, self.sample_i32(x, y, channel));
            }
        }
        Ok(plane)
    }

    pub fn set_plane_from_i32(&mut self, channel: usize, plane: &Plane<i32>) {
        debug_assert_eq!(plane.size(), (self.width, self.height));
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_sample_i32(x, y, channel, plane.get(x, y));
            }
        }
    }
}

/// A rectangular coding plane; the modular and VarDCT pipelines work on
/// these rather than on interleaved frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    size: (usize, usize),
    data: Vec<T>,
}

impl<T: Copy + Default> Plane<T> {
    pub fn new(xsize: usize, ysize: usize) -> Result<Plane<T>> {
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidDimensions(xsize as u32, ysize as u32));
        }
        let total = xsize
            .checked_mul(ysize)
            .ok_or(Error::InvalidDimensions(xsize as u32, ysize as u32))?;
        Ok(Plane {
            size: (xsize, ysize),
            data: vec![T::default(); total],
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.0
    }

    pub fn height(&self) -> usize {
        self.size.1
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.size.0..(y + 1) * self.size.0]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.size.0..(y + 1) * self.size.0]
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.size.0 + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.size.0 + x] = value;
    }
}
