// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::time::Instant;

use crate::api::options::{ChromaSubsampling, Effort, EncodingMode, JxlEncoderOptions};
use crate::error::{Error, Result};
use crate::frame::{encode_frame, FrameConfig};
use crate::headers::frame_header::Encoding;
use crate::headers::image_header::ImageHeader;
use crate::image::{ImageFrame, SampleType};
use crate::modular::squeeze::DEFAULT_SQUEEZE_LEVELS;
use crate::modular::tree::TreeKind;
use crate::util::tracing_wrappers::*;
use crate::util::CpuFeatures;
use crate::var_dct::quant::distance_for_quality;

/// Compression statistics of the most recent `encode` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeStats {
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub encoding_time_ns: u64,
}

/// The encoder. A value type: distinct instances share nothing and may
/// run concurrently.
#[derive(Debug, Clone)]
pub struct JxlEncoder {
    options: JxlEncoderOptions,
    cpu: CpuFeatures,
    last_stats: Option<EncodeStats>,
}

impl JxlEncoder {
    /// Builds an encoder, normalising the responsive layer count into
    /// 2..=8. Invalid layer ladders are reported by `encode`.
    pub fn new(options: JxlEncoderOptions) -> JxlEncoder {
        let mut options = options;
        options.responsive_config.layer_count = options.responsive_config.layer_count.clamp(2, 8);
        let cpu = if options.use_hardware_acceleration {
            CpuFeatures::detect()
        } else {
            CpuFeatures::default()
        };
        JxlEncoder {
            options,
            cpu,
            last_stats: None,
        }
    }

    pub fn options(&self) -> &JxlEncoderOptions {
        &self.options
    }

    pub fn last_stats(&self) -> Option<&EncodeStats> {
        self.last_stats.as_ref()
    }

    /// Target distance of the configured mode; 0 selects lossless.
    fn distance(&self) -> Result<f32> {
        match self.options.mode {
            EncodingMode::Lossless => Ok(0.0),
            EncodingMode::Lossy { quality } => {
                if quality > 100 {
                    return Err(Error::EncodingFailed(format!("quality {quality} > 100")));
                }
                Ok(distance_for_quality(quality))
            }
            EncodingMode::Distance(distance) => {
                if !distance.is_finite() || distance < 0.0 {
                    return Err(Error::EncodingFailed(format!("distance {distance}")));
                }
                Ok(distance)
            }
        }
    }

    /// Resolves the responsive layer ladder: explicit distances must be
    /// strictly descending; an empty list derives `base * 2^(L-i)`.
    fn layer_distances(&self, base_distance: f32) -> Result<Vec<f32>> {
        let config = &self.options.responsive_config;
        let mut distances = if config.layer_distances.is_empty() {
            let count = config.layer_count;
            (1..=count)
                .map(|i| base_distance * (1u32 << (count - i)) as f32)
                .collect()
        } else {
            config.layer_distances.clone()
        };
        if distances.len() == 1 {
            distances.insert(0, distances[0] * 2.0);
        }
        distances.truncate(8);
        if distances.windows(2).any(|pair| pair[1] >= pair[0]) {
            return Err(Error::EncodingFailed("descending order".into()));
        }
        Ok(distances)
    }

    fn frame_config(
        &self,
        frame: &ImageFrame,
        is_last: bool,
        duration: u32,
    ) -> Result<FrameConfig> {
        let distance = self.distance()?;
        let lossless = distance == 0.0;
        let modular = lossless || self.options.modular_mode;
        let float_samples = frame.sample_type() == SampleType::F32;
        // Bit-cast float planes skip the lifting transform (its detail
        // terms are only guaranteed to fit for integer samples) and take
        // the ANS path, where huge cold-start residuals escape to compact
        // varints instead of unary runs.
        let squeeze_levels = if float_samples {
            0
        } else {
            DEFAULT_SQUEEZE_LEVELS
        };
        let use_ans = self.options.use_ans || float_samples;
        let layer_distances = if !modular && self.options.responsive_encoding {
            self.layer_distances(distance)?
        } else {
            Vec::new()
        };
        Ok(FrameConfig {
            encoding: if modular {
                Encoding::Modular
            } else {
                Encoding::VarDct
            },
            distance,
            use_xyb: self.options.use_xyb_color_space && frame.num_channels() >= 3,
            progressive: self.options.progressive && !modular && layer_distances.is_empty(),
            layer_distances,
            use_ans,
            subsample_chroma: self.options.chroma_subsampling == ChromaSubsampling::Cs420
                && !modular
                && frame.num_channels() >= 3,
            dc_only: false,
            tree_kind: self.options.effort.tree_kind(),
            squeeze_levels,
            is_last,
            duration,
            name: String::new(),
        })
    }

    /// Encodes one frame payload, widening the search at deeper efforts:
    /// from kitten up, Modular frames are coded with both built-in trees
    /// and the smaller result wins.
    fn encode_frame_payload(
        &self,
        frame: &ImageFrame,
        is_last: bool,
        duration: u32,
    ) -> Result<Vec<u8>> {
        let config = self.frame_config(frame, is_last, duration)?;
        let payload = encode_frame(frame, &config)?;
        if config.encoding == Encoding::Modular && self.options.effort >= Effort::Kitten {
            let alternate = FrameConfig {
                tree_kind: match config.tree_kind {
                    TreeKind::Default => TreeKind::Extended,
                    TreeKind::Extended => TreeKind::Default,
                },
                ..config
            };
            let candidate = encode_frame(frame, &alternate)?;
            if candidate.len() < payload.len() {
                return Ok(candidate);
            }
        }
        Ok(payload)
    }

    /// Encodes one still frame into a bare codestream.
    pub fn encode(&mut self, frame: &ImageFrame) -> Result<(Vec<u8>, EncodeStats)> {
        let start = Instant::now();
        let mut codestream = Vec::new();
        ImageHeader::for_frame(frame).write(&mut codestream);
        codestream.extend_from_slice(&self.encode_frame_payload(frame, true, 0)?);
        let original_size = (frame.width() * frame.height() * frame.num_channels()) as u64
            * frame.sample_type().bytes_per_sample() as u64;
        let compressed_size = codestream.len() as u64;
        let stats = EncodeStats {
            original_size,
            compressed_size,
            compression_ratio: original_size as f64 / compressed_size.max(1) as f64,
            encoding_time_ns: start.elapsed().as_nanos() as u64,
        };
        debug!(
            original = stats.original_size,
            compressed = stats.compressed_size,
            sse4_2 = self.cpu.sse4_2,
            "frame encoded"
        );
        self.last_stats = Some(stats.clone());
        Ok((codestream, stats))
    }

    /// Encodes an animation: consecutive frames with the last one marked.
    pub fn encode_frames(&mut self, frames: &[ImageFrame]) -> Result<Vec<u8>> {
        let Some(first) = frames.first() else {
            return Err(Error::EncodingFailed("empty frames".into()));
        };
        for frame in &frames[1..] {
            let matches = frame.width() == first.width()
                && frame.height() == first.height()
                && frame.num_channels() == first.num_channels()
                && frame.bits_per_sample() == first.bits_per_sample();
            if !matches {
                return Err(Error::EncodingFailed(
                    "animation frames must share geometry".into(),
                ));
            }
        }
        let mut codestream = Vec::new();
        ImageHeader::for_frame(first).write(&mut codestream);
        for (index, frame) in frames.iter().enumerate() {
            let is_last = index + 1 == frames.len();
            codestream.extend_from_slice(&self.encode_frame_payload(frame, is_last, 0)?);
        }
        Ok(codestream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::options::ResponsiveConfig;
    use crate::image::{AlphaMode, ColorSpace};

    fn gray_frame() -> ImageFrame {
        let mut frame =
            ImageFrame::new(4, 4, 1, 8, ColorSpace::Grayscale, AlphaMode::Straight).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                frame.set_sample_i32(x, y, 0, (x * 16 + y) as i32);
            }
        }
        frame
    }

    #[test]
    fn test_layer_count_is_clamped() {
        let encoder = JxlEncoder::new(JxlEncoderOptions {
            responsive_config: ResponsiveConfig {
                layer_count: 1,
                layer_distances: Vec::new(),
            },
            ..Default::default()
        });
        assert_eq!(encoder.options().responsive_config.layer_count, 2);
        let encoder = JxlEncoder::new(JxlEncoderOptions {
            responsive_config: ResponsiveConfig {
                layer_count: 10,
                layer_distances: Vec::new(),
            },
            ..Default::default()
        });
        assert_eq!(encoder.options().responsive_config.layer_count, 8);
    }

    #[test]
    fn test_ascending_layer_distances_rejected() {
        let mut encoder = JxlEncoder::new(JxlEncoderOptions {
            mode: EncodingMode::Distance(1.0),
            responsive_encoding: true,
            responsive_config: ResponsiveConfig {
                layer_count: 3,
                layer_distances: vec![3.0, 6.0, 1.0],
            },
            ..Default::default()
        });
        assert_eq!(
            encoder.encode(&gray_frame()).unwrap_err(),
            Error::EncodingFailed("descending order".into())
        );
    }

    #[test]
    fn test_descending_layer_distances_accepted() {
        let mut encoder = JxlEncoder::new(JxlEncoderOptions {
            mode: EncodingMode::Distance(1.0),
            responsive_encoding: true,
            responsive_config: ResponsiveConfig {
                layer_count: 3,
                layer_distances: vec![6.0, 3.0, 1.0],
            },
            ..Default::default()
        });
        encoder.encode(&gray_frame()).unwrap();
    }

    #[test]
    fn test_derived_ladder_is_descending() {
        let encoder = JxlEncoder::new(JxlEncoderOptions {
            responsive_config: ResponsiveConfig {
                layer_count: 4,
                layer_distances: Vec::new(),
            },
            ..Default::default()
        });
        let ladder = encoder.layer_distances(0.5).unwrap();
        assert_eq!(ladder, vec![4.0, 2.0, 1.0, 0.5]);
    }

    #[test]
    fn test_empty_frames_rejected() {
        let mut encoder = JxlEncoder::new(JxlEncoderOptions::default());
        assert_eq!(
            encoder.encode_frames(&[]).unwrap_err(),
            Error::EncodingFailed("empty frames".into())
        );
    }

    #[test]
    fn test_stats_are_plausible() {
        let mut encoder = JxlEncoder::new(JxlEncoderOptions::default());
        let (bytes, stats) = encoder.encode(&gray_frame()).unwrap();
        assert_eq!(stats.original_size, 16);
        assert_eq!(stats.compressed_size, bytes.len() as u64);
        assert!(stats.compression_ratio > 0.0);
        assert_eq!(encoder.last_stats(), Some(&stats));
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let mut encoder = JxlEncoder::new(JxlEncoderOptions {
            mode: EncodingMode::Lossy { quality: 101 },
            ..Default::default()
        });
        assert!(matches!(
            encoder.encode(&gray_frame()),
            Err(Error::EncodingFailed(_))
        ));
    }
}
