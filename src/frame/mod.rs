// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Frame assembly and parsing: the global section, the per-frame table of
//! contents, both codec branches, and the responsive layer framing.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::color::rct::{forward_rct, inverse_rct};
use crate::color::{xyb, ycbcr};
use crate::error::{Error, Result};
use crate::color::subsample::upsample_2x;
use crate::headers::frame_header::{Encoding, FrameHeader, FrameType};
use crate::headers::image_header::ImageHeader;
use crate::headers::toc::Toc;
use crate::image::{ImageFrame, Plane};
use crate::modular::tree::{MaTree, TreeKind};
use crate::modular::{decode_channel, encode_channel};
use crate::util::tracing_wrappers::*;
use crate::var_dct::{encode_body, Geometry, VarDctDecoder, VarDctParams};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

mod global;
pub use global::FrameGlobal;

/// Everything the frame builder needs to know about one frame, derived
/// from the encoder options.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub encoding: Encoding,
    pub distance: f32,
    pub use_xyb: bool,
    pub progressive: bool,
    /// Responsive layer distances, already validated and descending.
    pub layer_distances: Vec<f32>,
    pub use_ans: bool,
    /// Code chroma planes at half resolution (4:2:0).
    pub subsample_chroma: bool,
    /// Emit a DC-only frame: a single pass carrying no AC coefficients.
    pub dc_only: bool,
    pub tree_kind: TreeKind,
    pub squeeze_levels: u8,
    pub is_last: bool,
    pub duration: u32,
    pub name: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            encoding: Encoding::Modular,
            distance: 0.0,
            use_xyb: false,
            progressive: false,
            layer_distances: Vec::new(),
            use_ans: false,
            subsample_chroma: false,
            dc_only: false,
            tree_kind: TreeKind::Default,
            squeeze_levels: crate::modular::squeeze::DEFAULT_SQUEEZE_LEVELS,
            is_last: true,
            duration: 0,
            name: String::new(),
        }
    }
}

fn assemble(header: &FrameHeader, sections: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    let mut bw = BitWriter::new();
    header.write(&mut bw)?;
    bw.flush_byte();
    let toc = Toc::new(sections.iter().map(|s| s.len() as u32).collect());
    toc.write(&mut bw);
    for section in &sections {
        bw.write_bytes_aligned(section);
    }
    Ok(bw.finalize())
}

/// Serialises one frame: frame header, ToC, global section, payload
/// sections.
pub fn encode_frame(frame: &ImageFrame, config: &FrameConfig) -> Result<Vec<u8>> {
    match config.encoding {
        Encoding::Modular => encode_modular_frame(frame, config),
        Encoding::VarDct if !config.layer_distances.is_empty() => {
            encode_responsive_frame(frame, config)
        }
        Encoding::VarDct => encode_vardct_frame(frame, config),
    }
}

fn encode_modular_frame(frame: &ImageFrame, config: &FrameConfig) -> Result<Vec<u8>> {
    let num_channels = frame.num_channels();
    let use_rct = num_channels >= 3;
    let mut planes: Vec<Plane<i32>> = (0..num_channels)
        .map(|c| frame.plane_i32(c))
        .collect::<Result<_>>()?;
    if use_rct {
        forward_rct(&mut planes);
    }
    let tree = MaTree::for_kind(config.tree_kind);
    let squeeze_levels = config.squeeze_levels as usize;

    #[cfg(feature = "parallel")]
    let channel_sections: Vec<Vec<u8>> = planes
        .par_iter_mut()
        .enumerate()
        .map(|(c, plane)| encode_channel(plane, c, &tree, squeeze_levels, config.use_ans))
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let channel_sections: Vec<Vec<u8>> = planes
        .iter_mut()
        .enumerate()
        .map(|(c, plane)| encode_channel(plane, c, &tree, squeeze_levels, config.use_ans))
        .collect::<Result<_>>()?;

    let global = FrameGlobal {
        modular: true,
        rct: use_rct,
        xyb: false,
        progressive: false,
        responsive: false,
        ans: config.use_ans,
        subsampled_chroma: false,
        num_channels: num_channels as u8,
        tree_kind: config.tree_kind,
        squeeze_levels: config.squeeze_levels,
        distance: 0.0,
        layer_distances: Vec::new(),
    };
    let mut sections = vec![global.write()];
    sections.extend(channel_sections);

    let header = FrameHeader {
        encoding: Encoding::Modular,
        is_last: config.is_last,
        duration: config.duration,
        name: config.name.clone(),
        num_passes: 1,
        num_groups: 1,
        ..Default::default()
    };
    assemble(&header, sections)
}

/// Planes coded at half resolution: chroma planes of a 4:2:0 frame.
fn subsample_flags(is_chroma: &[bool], subsample: bool) -> Vec<bool> {
    is_chroma
        .iter()
        .map(|&chroma| chroma && subsample)
        .collect()
}

fn encode_vardct_frame(frame: &ImageFrame, config: &FrameConfig) -> Result<Vec<u8>> {
    let (planes, is_chroma) = frame_to_centered_planes(frame, config.use_xyb)?;
    let subsampled = subsample_flags(&is_chroma, config.subsample_chroma);
    let progressive = config.progressive && !config.dc_only;
    let body = encode_body(
        &planes,
        &is_chroma,
        &subsampled,
        &VarDctParams {
            distance: config.distance,
            progressive,
            use_ans: config.use_ans,
            dc_only: config.dc_only,
        },
    )?;
    let global = FrameGlobal {
        modular: false,
        rct: false,
        xyb: config.use_xyb,
        progressive,
        responsive: false,
        ans: config.use_ans,
        subsampled_chroma: config.subsample_chroma,
        num_channels: frame.num_channels() as u8,
        tree_kind: TreeKind::Default,
        squeeze_levels: 0,
        distance: config.distance,
        layer_distances: Vec::new(),
    };
    let mut sections = vec![global.write()];
    sections.extend(body.sections);
    let header = FrameHeader {
        frame_type: if config.dc_only {
            FrameType::DcOnly
        } else {
            FrameType::Regular
        },
        encoding: Encoding::VarDct,
        is_last: config.is_last,
        duration: config.duration,
        name: config.name.clone(),
        num_passes: body.num_passes,
        num_groups: body.num_groups,
        ..Default::default()
    };
    assemble(&header, sections)
}

/// Responsive emission: one self-contained single-pass VarDCT body per
/// layer, at strictly descending distances. The frame header advertises
/// one pass per layer.
fn encode_responsive_frame(frame: &ImageFrame, config: &FrameConfig) -> Result<Vec<u8>> {
    let (planes, is_chroma) = frame_to_centered_planes(frame, config.use_xyb)?;
    let subsampled = subsample_flags(&is_chroma, config.subsample_chroma);
    let mut layer_sections = Vec::with_capacity(config.layer_distances.len());
    for &layer_distance in &config.layer_distances {
        let body = encode_body(
            &planes,
            &is_chroma,
            &subsampled,
            &VarDctParams {
                distance: layer_distance,
                progressive: false,
                use_ans: config.use_ans,
                dc_only: false,
            },
        )?;
        let mut bw = BitWriter::new();
        bw.write_u32_var(body.sections.len() as u32);
        for section in &body.sections {
            bw.write_u32_var(section.len() as u32);
        }
        for section in &body.sections {
            bw.write_bytes_aligned(section);
        }
        layer_sections.push(bw.finalize());
    }
    let global = FrameGlobal {
        modular: false,
        rct: false,
        xyb: config.use_xyb,
        progressive: false,
        responsive: true,
        ans: config.use_ans,
        subsampled_chroma: config.subsample_chroma,
        num_channels: frame.num_channels() as u8,
        tree_kind: TreeKind::Default,
        squeeze_levels: 0,
        distance: *config.layer_distances.last().unwrap(),
        layer_distances: config.layer_distances.clone(),
    };
    let mut sections = vec![global.write()];
    sections.extend(layer_sections);
    let header = FrameHeader {
        encoding: Encoding::VarDct,
        is_last: config.is_last,
        duration: config.duration,
        name: config.name.clone(),
        num_passes: config.layer_distances.len() as u32,
        num_groups: 1,
        ..Default::default()
    };
    assemble(&header, sections)
}

/// Result of decoding one frame from the codestream.
pub struct DecodedFrame {
    pub frame: ImageFrame,
    pub header: FrameHeader,
    pub consumed: usize,
}

/// Parses and decodes one frame starting at `data[0]`. `on_pass` observes
/// every progressive pass; non-progressive frames report a single pass 0.
pub fn decode_frame(
    data: &[u8],
    image_header: &ImageHeader,
    mut on_pass: Option<&mut dyn FnMut(&ImageFrame, usize)>,
) -> Result<DecodedFrame> {
    let mut br = BitReader::new(data);
    let header = FrameHeader::read(&mut br)?;
    br.jump_to_byte_boundary()?;
    let num_sections = match header.encoding {
        Encoding::Modular => 1 + image_header.num_channels as usize,
        Encoding::VarDct => {
            let count = header.num_passes as u64 * header.num_groups as u64;
            if count > (1 << 20) {
                return Err(Error::InvalidFrameHeader(format!(
                    "{} passes in {} groups",
                    header.num_passes, header.num_groups
                )));
            }
            1 + count as usize
        }
    };
    let toc = Toc::read(&mut br, num_sections)?;
    let sections_start = br.total_bits_read() / 8;
    let consumed = sections_start + toc.total_size();
    if data.len() < consumed {
        return Err(Error::TruncatedData);
    }
    let mut sections: Vec<&[u8]> = Vec::with_capacity(num_sections);
    let mut offset = sections_start;
    for &len in &toc.entries {
        sections.push(&data[offset..offset + len as usize]);
        offset += len as usize;
    }
    let global = FrameGlobal::parse(sections[0])?;
    if global.modular != (header.encoding == Encoding::Modular) {
        return Err(Error::InvalidFrameHeader(
            "global section disagrees with frame encoding".into(),
        ));
    }
    if global.num_channels as u32 != image_header.num_channels {
        return Err(Error::InvalidFrameHeader(format!(
            "frame has {} channels, image header {}",
            global.num_channels, image_header.num_channels
        )));
    }

    let frame = if global.modular {
        let frame = decode_modular_body(&sections[1..], image_header, &global)?;
        if let Some(callback) = on_pass.as_deref_mut() {
            callback(&frame, 0);
        }
        frame
    } else if global.responsive {
        let frame = decode_responsive_body(&sections[1..], image_header, &global)?;
        if let Some(callback) = on_pass.as_deref_mut() {
            callback(&frame, 0);
        }
        frame
    } else {
        decode_vardct_body(&sections[1..], image_header, &global, &header, &mut on_pass)?
    };
    debug!(consumed, "frame decoded");
    Ok(DecodedFrame {
        frame,
        header,
        consumed,
    })
}

fn decode_modular_body(
    sections: &[&[u8]],
    image_header: &ImageHeader,
    global: &FrameGlobal,
) -> Result<ImageFrame> {
    let width = image_header.width as usize;
    let height = image_header.height as usize;
    let tree = MaTree::for_kind(global.tree_kind);
    let squeeze_levels = global.squeeze_levels as usize;

    #[cfg(feature = "parallel")]
    let mut planes: Vec<Plane<i32>> = sections
        .par_iter()
        .enumerate()
        .map(|(c, section)| {
            decode_channel(section, width, height, c, &tree, squeeze_levels, global.ans)
        })
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let mut planes: Vec<Plane<i32>> = sections
        .iter()
        .enumerate()
        .map(|(c, section)| {
            decode_channel(section, width, height, c, &tree, squeeze_levels, global.ans)
        })
        .collect::<Result<_>>()?;

    if global.rct {
        inverse_rct(&mut planes);
    }
    let mut frame = ImageFrame::new(
        width,
        height,
        image_header.num_channels as usize,
        image_header.bits_per_sample,
        image_header.color_space.clone(),
        image_header.alpha_mode,
    )?;
    for (c, plane) in planes.iter().enumerate() {
        frame.set_plane_from_i32(c, plane);
    }
    Ok(frame)
}

fn decode_vardct_body(
    sections: &[&[u8]],
    image_header: &ImageHeader,
    global: &FrameGlobal,
    header: &FrameHeader,
    on_pass: &mut Option<&mut dyn FnMut(&ImageFrame, usize)>,
) -> Result<ImageFrame> {
    let width = image_header.width as usize;
    let height = image_header.height as usize;
    let is_chroma = chroma_flags(image_header.num_channels as usize, global.xyb);
    let subsampled = subsample_flags(&is_chroma, global.subsampled_chroma);
    let mut decoder = VarDctDecoder::new(
        width,
        height,
        &is_chroma,
        &subsampled,
        global.distance,
        header.num_passes,
        global.ans,
        header.frame_type == FrameType::DcOnly,
    )?;
    let groups = decoder.num_groups();
    if sections.len() != header.num_passes as usize * groups {
        return Err(Error::DecodingFailed(format!(
            "{} vardct sections, expected {}",
            sections.len(),
            header.num_passes as usize * groups
        )));
    }
    let mut frame = None;
    for pass in 0..header.num_passes as usize {
        decoder.decode_pass(&sections[pass * groups..(pass + 1) * groups])?;
        let needs_frame = on_pass.is_some() || pass + 1 == header.num_passes as usize;
        if needs_frame {
            let planes = reconstruct_full_planes(&decoder, &subsampled, width, height)?;
            let decoded = centered_planes_to_frame(&planes, image_header, global.xyb)?;
            if let Some(callback) = on_pass.as_deref_mut() {
                callback(&decoded, pass);
            }
            frame = Some(decoded);
        }
    }
    Ok(frame.expect("at least one pass"))
}

/// Reconstructs the decoder's planes and brings any subsampled ones back
/// to full resolution.
fn reconstruct_full_planes(
    decoder: &VarDctDecoder,
    subsampled: &[bool],
    width: usize,
    height: usize,
) -> Result<Vec<Plane<f32>>> {
    let planes = decoder.reconstruct()?;
    planes
        .into_iter()
        .zip(subsampled.iter())
        .map(|(plane, &sub)| {
            if sub {
                upsample_2x(&plane, width, height)
            } else {
                Ok(plane)
            }
        })
        .collect()
}

/// Decodes a responsive frame from its finest (last) layer.
fn decode_responsive_body(
    sections: &[&[u8]],
    image_header: &ImageHeader,
    global: &FrameGlobal,
) -> Result<ImageFrame> {
    let layer = sections
        .last()
        .ok_or_else(|| Error::DecodingFailed("responsive frame with no layers".into()))?;
    let width = image_header.width as usize;
    let height = image_header.height as usize;

    let mut br = BitReader::new(layer);
    let num_sections = br.read_u32_var()? as usize;
    let expected = Geometry::new(width, height).num_groups();
    if num_sections != expected {
        return Err(Error::DecodingFailed(format!(
            "responsive layer has {num_sections} sections, expected {expected}"
        )));
    }
    let mut lengths = Vec::with_capacity(num_sections);
    for _ in 0..num_sections {
        lengths.push(br.read_u32_var()? as usize);
    }
    br.jump_to_byte_boundary()?;
    let mut offset = br.total_bits_read() / 8;
    let mut layer_sections = Vec::with_capacity(num_sections);
    for &len in &lengths {
        if offset + len > layer.len() {
            return Err(Error::TruncatedData);
        }
        layer_sections.push(&layer[offset..offset + len]);
        offset += len;
    }

    let is_chroma = chroma_flags(image_header.num_channels as usize, global.xyb);
    let subsampled = subsample_flags(&is_chroma, global.subsampled_chroma);
    let mut decoder = VarDctDecoder::new(
        width,
        height,
        &is_chroma,
        &subsampled,
        global.distance,
        1,
        global.ans,
        false,
    )?;
    decoder.decode_pass(&layer_sections)?;
    let planes = reconstruct_full_planes(&decoder, &subsampled, width, height)?;
    centered_planes_to_frame(&planes, image_header, global.xyb)
}

/// Quantisation class per plane: chroma planes get the coarser matrix.
fn chroma_flags(num_channels: usize, use_xyb: bool) -> Vec<bool> {
    match num_channels {
        1 => vec![false],
        2 => vec![false, false],
        n if use_xyb => {
            let mut flags = vec![true, false, true];
            flags.resize(n, false);
            flags
        }
        n => {
            let mut flags = vec![false, true, true];
            flags.resize(n, false);
            flags
        }
    }
}

/// Converts a frame into centred f32 planes in the nominal 8-bit domain,
/// applying the configured colour transform to the first three channels.
fn frame_to_centered_planes(
    frame: &ImageFrame,
    use_xyb: bool,
) -> Result<(Vec<Plane<f32>>, Vec<bool>)> {
    let (width, height) = (frame.width(), frame.height());
    let num_channels = frame.num_channels();
    let mut planes = Vec::with_capacity(num_channels);
    for _ in 0..num_channels {
        planes.push(Plane::<f32>::new(width, height)?);
    }
    for y in 0..height {
        for x in 0..width {
            if num_channels >= 3 {
                let r = frame.sample_f32_8bit(x, y, 0);
                let g = frame.sample_f32_8bit(x, y, 1);
                let b = frame.sample_f32_8bit(x, y, 2);
                let (c0, c1, c2) = if use_xyb {
                    let (xv, yv, bv) = xyb::forward_xyb(r / 255.0, g / 255.0, b / 255.0);
                    (xv * 255.0, yv * 255.0 - 128.0, bv * 255.0 - 128.0)
                } else {
                    let (yv, cb, cr) = ycbcr::forward_ycbcr(r, g, b);
                    (yv - 128.0, cb, cr)
                };
                planes[0].set(x, y, c0);
                planes[1].set(x, y, c1);
                planes[2].set(x, y, c2);
                for extra in 3..num_channels {
                    planes[extra].set(x, y, frame.sample_f32_8bit(x, y, extra) - 128.0);
                }
            } else {
                for (c, plane) in planes.iter_mut().enumerate() {
                    plane.set(x, y, frame.sample_f32_8bit(x, y, c) - 128.0);
                }
            }
        }
    }
    Ok((planes, chroma_flags(num_channels, use_xyb)))
}

/// Inverse of [`frame_to_centered_planes`], writing into a fresh frame
/// described by the image header.
fn centered_planes_to_frame(
    planes: &[Plane<f32>],
    image_header: &ImageHeader,
    use_xyb: bool,
) -> Result<ImageFrame> {
    let width = image_header.width as usize;
    let height = image_header.height as usize;
    let num_channels = image_header.num_channels as usize;
    let mut frame = ImageFrame::new(
        width,
        height,
        num_channels,
        image_header.bits_per_sample,
        image_header.color_space.clone(),
        image_header.alpha_mode,
    )?;
    for y in 0..height {
        for x in 0..width {
            if num_channels >= 3 {
                let c0 = planes[0].get(x, y);
                let c1 = planes[1].get(x, y);
                let c2 = planes[2].get(x, y);
                let (r, g, b) = if use_xyb {
                    let (r, g, b) = xyb::inverse_xyb(
                        c0 / 255.0,
                        (c1 + 128.0) / 255.0,
                        (c2 + 128.0) / 255.0,
                    );
                    (r * 255.0, g * 255.0, b * 255.0)
                } else {
                    ycbcr::inverse_ycbcr(c0 + 128.0, c1, c2)
                };
                frame.set_sample_f32_8bit(x, y, 0, r);
                frame.set_sample_f32_8bit(x, y, 1, g);
                frame.set_sample_f32_8bit(x, y, 2, b);
                for extra in 3..num_channels {
                    frame.set_sample_f32_8bit(x, y, extra, planes[extra].get(x, y) + 128.0);
                }
            } else {
                for c in 0..num_channels {
                    frame.set_sample_f32_8bit(x, y, c, planes[c].get(x, y) + 128.0);
                }
            }
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{AlphaMode, ColorSpace};

    fn test_frame(width: usize, height: usize, channels: usize) -> ImageFrame {
        let color_space = if channels <= 2 {
            ColorSpace::Grayscale
        } else {
            ColorSpace::Srgb
        };
        let mut frame =
            ImageFrame::new(width, height, channels, 8, color_space, AlphaMode::Straight)
                .unwrap();
        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    frame.set_sample_i32(x, y, c, ((x * 7 + y * 13 + c * 31) % 256) as i32);
                }
            }
        }
        frame
    }

    fn image_header(frame: &ImageFrame) -> ImageHeader {
        ImageHeader::for_frame(frame)
    }

    #[test]
    fn test_modular_frame_roundtrip() {
        for channels in [1usize, 2, 3, 4] {
            let frame = test_frame(29, 17, channels);
            let payload = encode_frame(&frame, &FrameConfig::default()).unwrap();
            let decoded = decode_frame(&payload, &image_header(&frame), None).unwrap();
            assert_eq!(decoded.frame, frame, "{channels} channels");
            assert_eq!(decoded.consumed, payload.len());
            assert!(decoded.header.is_last);
        }
    }

    #[test]
    fn test_modular_frame_with_ans_roundtrip() {
        let frame = test_frame(33, 21, 3);
        let config = FrameConfig {
            use_ans: true,
            tree_kind: TreeKind::Extended,
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let decoded = decode_frame(&payload, &image_header(&frame), None).unwrap();
        assert_eq!(decoded.frame, frame);
    }

    #[test]
    fn test_vardct_frame_close_to_source() {
        let frame = test_frame(40, 32, 3);
        let config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 1.0,
            progressive: true,
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let decoded = decode_frame(&payload, &image_header(&frame), None).unwrap();
        let mut worst = 0i32;
        for c in 0..3 {
            for y in 0..32 {
                for x in 0..40 {
                    let delta =
                        (decoded.frame.sample_i32(x, y, c) - frame.sample_i32(x, y, c)).abs();
                    worst = worst.max(delta);
                }
            }
        }
        // The sawtooth source has strong high frequencies; the bound only
        // needs to show the pipeline is sane.
        assert!(worst < 128, "worst channel delta {worst}");
    }

    #[test]
    fn test_progressive_callback_order() {
        let frame = test_frame(24, 24, 3);
        let config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 1.0,
            progressive: true,
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let mut passes = Vec::new();
        let mut on_pass = |_: &ImageFrame, pass: usize| passes.push(pass);
        decode_frame(&payload, &image_header(&frame), Some(&mut on_pass)).unwrap();
        assert_eq!(passes, vec![0, 1, 2]);
    }

    #[test]
    fn test_modular_callback_fires_once() {
        let frame = test_frame(10, 10, 1);
        let payload = encode_frame(&frame, &FrameConfig::default()).unwrap();
        let mut passes = Vec::new();
        let mut on_pass = |_: &ImageFrame, pass: usize| passes.push(pass);
        decode_frame(&payload, &image_header(&frame), Some(&mut on_pass)).unwrap();
        assert_eq!(passes, vec![0]);
    }

    #[test]
    fn test_responsive_frame_decodes_from_finest_layer() {
        let frame = test_frame(32, 32, 3);
        let config = FrameConfig {
            encoding: Encoding::VarDct,
            layer_distances: vec![4.0, 2.0, 0.5],
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let decoded = decode_frame(&payload, &image_header(&frame), None).unwrap();
        assert_eq!(decoded.frame.width(), 32);

        // The finest layer at distance 0.5 must beat a lone coarse layer.
        let coarse_config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 4.0,
            ..Default::default()
        };
        let coarse_payload = encode_frame(&frame, &coarse_config).unwrap();
        let coarse = decode_frame(&coarse_payload, &image_header(&frame), None).unwrap();
        let sum_err = |decoded: &ImageFrame| -> u64 {
            let mut total = 0u64;
            for c in 0..3 {
                for y in 0..32 {
                    for x in 0..32 {
                        total += (decoded.sample_i32(x, y, c) - frame.sample_i32(x, y, c))
                            .unsigned_abs() as u64;
                    }
                }
            }
            total
        };
        assert!(sum_err(&decoded.frame) <= sum_err(&coarse.frame));
    }

    #[test]
    fn test_subsampled_chroma_frame_roundtrip() {
        let frame = test_frame(48, 40, 3);
        let full_config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 1.0,
            ..Default::default()
        };
        let sub_config = FrameConfig {
            subsample_chroma: true,
            ..full_config.clone()
        };
        let full = encode_frame(&frame, &full_config).unwrap();
        let sub = encode_frame(&frame, &sub_config).unwrap();
        assert!(sub.len() < full.len());
        let decoded = decode_frame(&sub, &image_header(&frame), None).unwrap();
        assert_eq!(decoded.frame.width(), 48);
        assert_eq!(decoded.frame.height(), 40);
        // Halving the chroma resolution degrades gracefully on average.
        let mut total = 0u64;
        for c in 0..3 {
            for y in 0..40 {
                for x in 0..48 {
                    total += (decoded.frame.sample_i32(x, y, c) - frame.sample_i32(x, y, c))
                        .unsigned_abs() as u64;
                }
            }
        }
        let mean = total / (3 * 40 * 48);
        assert!(mean < 48, "mean delta {mean}");
    }

    #[test]
    fn test_dc_only_frame() {
        let frame = test_frame(24, 16, 3);
        let config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 1.0,
            dc_only: true,
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let full_config = FrameConfig {
            encoding: Encoding::VarDct,
            distance: 1.0,
            progressive: false,
            ..Default::default()
        };
        let full_payload = encode_frame(&frame, &full_config).unwrap();
        // Dropping 63 of 64 coefficients must shrink the frame.
        assert!(payload.len() < full_payload.len());
        let decoded = decode_frame(&payload, &image_header(&frame), None).unwrap();
        assert_eq!(
            decoded.header.frame_type,
            crate::headers::frame_header::FrameType::DcOnly
        );
        // Every 8x8 tile is flat in a DC-only reconstruction.
        for c in 0..3 {
            let corner = decoded.frame.sample_i32(0, 0, c);
            for y in 0..8 {
                for x in 0..8 {
                    assert!((decoded.frame.sample_i32(x, y, c) - corner).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn test_truncated_frame_payload() {
        let frame = test_frame(16, 16, 3);
        let payload = encode_frame(&frame, &FrameConfig::default()).unwrap();
        let truncated = &payload[..payload.len() - 10];
        assert!(decode_frame(truncated, &image_header(&frame), None).is_err());
    }

    #[test]
    fn test_f32_frame_roundtrip_without_squeeze() {
        let mut frame =
            ImageFrame::new(9, 5, 1, 32, ColorSpace::Grayscale, AlphaMode::Straight).unwrap();
        for y in 0..5 {
            for x in 0..9 {
                frame.set_sample_f32_8bit(x, y, 0, (x as f32 * 11.3 + y as f32) / 45.0 * 255.0);
            }
        }
        let config = FrameConfig {
            squeeze_levels: 0,
            use_ans: true,
            ..Default::default()
        };
        let payload = encode_frame(&frame, &config).unwrap();
        let decoded = decode_frame(&payload, &ImageHeader::for_frame(&frame), None).unwrap();
        assert_eq!(decoded.frame, frame);
    }
}
