// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::modular::tree::TreeKind;

/// Rate-control mode of the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodingMode {
    /// Pixel-exact Modular coding.
    Lossless,
    /// Quality 0..=100 mapped onto a distance.
    Lossy { quality: u32 },
    /// Explicit Butteraugli-style distance; 0 means lossless.
    Distance(f32),
}

/// Encoder search depth, ordered fastest to slowest. Efforts up to
/// cheetah use the small MA tree; the rest use the extended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Effort {
    Lightning,
    Falcon,
    Cheetah,
    Hare,
    Squirrel,
    Kitten,
    Wombat,
    Tortoise,
}

impl Effort {
    pub fn tree_kind(self) -> TreeKind {
        if self <= Effort::Cheetah {
            TreeKind::Default
        } else {
            TreeKind::Extended
        }
    }
}

/// Chroma resolution of the lossy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaSubsampling {
    /// Full-resolution chroma.
    #[default]
    Cs444,
    /// Chroma coded at half resolution in both directions.
    Cs420,
}

/// Responsive (quality-layered) emission settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsiveConfig {
    /// Clamped to 2..=8.
    pub layer_count: u32,
    /// Strictly descending distances; derived from the base distance when
    /// empty.
    pub layer_distances: Vec<f32>,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        ResponsiveConfig {
            layer_count: 3,
            layer_distances: Vec::new(),
        }
    }
}

/// The closed encoder option set.
#[derive(Debug, Clone, PartialEq)]
pub struct JxlEncoderOptions {
    pub mode: EncodingMode,
    pub effort: Effort,
    /// Force the Modular path even for lossy modes.
    pub modular_mode: bool,
    pub progressive: bool,
    pub responsive_encoding: bool,
    pub responsive_config: ResponsiveConfig,
    pub use_xyb_color_space: bool,
    pub use_ans: bool,
    pub chroma_subsampling: ChromaSubsampling,
    /// Hint only; never changes the emitted bits.
    pub use_hardware_acceleration: bool,
    /// Hint only; never changes the emitted bits.
    pub thread_count: u32,
}

impl Default for JxlEncoderOptions {
    fn default() -> Self {
        JxlEncoderOptions {
            mode: EncodingMode::Lossless,
            effort: Effort::Squirrel,
            modular_mode: false,
            progressive: true,
            responsive_encoding: false,
            responsive_config: ResponsiveConfig::default(),
            use_xyb_color_space: false,
            use_ans: false,
            chroma_subsampling: ChromaSubsampling::default(),
            use_hardware_acceleration: false,
            thread_count: 1,
        }
    }
}

impl JxlEncoderOptions {
    pub fn lossless() -> Self {
        Self::default()
    }

    pub fn lossy(quality: u32) -> Self {
        JxlEncoderOptions {
            mode: EncodingMode::Lossy { quality },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_selects_tree() {
        assert_eq!(Effort::Lightning.tree_kind(), TreeKind::Default);
        assert_eq!(Effort::Cheetah.tree_kind(), TreeKind::Default);
        assert_eq!(Effort::Hare.tree_kind(), TreeKind::Extended);
        assert_eq!(Effort::Tortoise.tree_kind(), TreeKind::Extended);
    }

    #[test]
    fn test_effort_ordering() {
        assert!(Effort::Lightning < Effort::Falcon);
        assert!(Effort::Wombat < Effort::Tortoise);
    }
}
