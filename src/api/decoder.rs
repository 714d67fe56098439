// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::container::parse::is_bare_codestream;
use crate::container::{ParsedContainer, CONTAINER_SIGNATURE};
use crate::error::{Error, Result};
use crate::frame::decode_frame;
use crate::headers::frame_header::FrameHeader;
use crate::headers::image_header::{ImageHeader, CODESTREAM_SIGNATURE};
use crate::image::ImageFrame;
use crate::util::tracing_wrappers::*;

/// Decoder driver states; errors are terminal in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderStage {
    Start,
    ParseSignature,
    ParseContainer,
    ParseImageHeader,
    ParseFrameHeader,
    Done,
}

/// The decoder. A value type with no retained state between calls;
/// distinct instances may run concurrently.
#[derive(Debug, Clone, Default)]
pub struct JxlDecoder {}

impl JxlDecoder {
    pub fn new() -> JxlDecoder {
        JxlDecoder::default()
    }

    /// Decodes the first frame of a bare codestream or container.
    pub fn decode(&self, data: &[u8]) -> Result<ImageFrame> {
        self.drive(data, true, None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::DecodingFailed("codestream has no frames".into()))
    }

    /// Decodes every frame, in bitstream order.
    pub fn decode_frames(&self, data: &[u8]) -> Result<Vec<ImageFrame>> {
        self.drive(data, false, None)
    }

    /// Decodes the first frame, reporting each progressive pass to the
    /// callback: pass indices {0, 1, 2} for a progressive VarDCT frame,
    /// a single pass 0 otherwise.
    pub fn decode_progressive(
        &self,
        data: &[u8],
        mut callback: impl FnMut(&ImageFrame, usize),
    ) -> Result<()> {
        self.drive(data, true, Some(&mut callback))?;
        Ok(())
    }

    fn drive(
        &self,
        data: &[u8],
        stop_after_first: bool,
        mut on_pass: Option<&mut dyn FnMut(&ImageFrame, usize)>,
    ) -> Result<Vec<ImageFrame>> {
        let mut stage = DecoderStage::Start;
        let mut codestream: &[u8] = &[];
        let mut image_header = None;
        let mut pos = 0usize;
        let mut frames = Vec::new();
        loop {
            match stage {
                DecoderStage::Start => stage = DecoderStage::ParseSignature,
                DecoderStage::ParseSignature => {
                    if data.len() < 2 {
                        return Err(Error::TruncatedData);
                    }
                    if is_bare_codestream(data) {
                        codestream = data;
                        stage = DecoderStage::ParseImageHeader;
                    } else {
                        stage = DecoderStage::ParseContainer;
                    }
                }
                DecoderStage::ParseContainer => {
                    codestream = self.extract_codestream(data)?;
                    stage = DecoderStage::ParseImageHeader;
                }
                DecoderStage::ParseImageHeader => {
                    let header = ImageHeader::parse(codestream)?;
                    pos = header.header_size;
                    image_header = Some(header);
                    stage = DecoderStage::ParseFrameHeader;
                }
                DecoderStage::ParseFrameHeader => {
                    let header = image_header.as_ref().expect("set before this stage");
                    let decoded = match on_pass {
                        Some(ref mut cb) => {
                            decode_frame(&codestream[pos..], header, Some(&mut **cb))?
                        }
                        None => decode_frame(&codestream[pos..], header, None)?,
                    };
                    pos += decoded.consumed;
                    let is_last = decoded.header.is_last;
                    frames.push(decoded.frame);
                    trace!(frame = frames.len(), is_last, "frame parsed");
                    if is_last || stop_after_first {
                        stage = DecoderStage::Done;
                    }
                }
                DecoderStage::Done => return Ok(frames),
            }
        }
    }

    /// Returns a bare codestream unchanged, or the `jxlc` payload of a
    /// container. Inputs matching neither signature fail with
    /// `InvalidSignature`.
    pub fn extract_codestream<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        if is_bare_codestream(data) {
            return Ok(data);
        }
        let prefix = &data[..data.len().min(CONTAINER_SIGNATURE.len())];
        if !CONTAINER_SIGNATURE.starts_with(prefix) {
            return Err(Error::InvalidSignature);
        }
        if data.len() < CONTAINER_SIGNATURE.len() {
            return Err(Error::TruncatedData);
        }
        Ok(ParsedContainer::parse(data)?.codestream)
    }

    /// Parses the box structure of a container.
    pub fn parse_container<'a>(&self, data: &'a [u8]) -> Result<ParsedContainer<'a>> {
        ParsedContainer::parse(data)
    }

    /// Convenience accessor for `(exif, xmp, icc)` metadata blobs; a bare
    /// codestream has none.
    pub fn extract_metadata<'a>(
        &self,
        data: &'a [u8],
    ) -> Result<(Option<&'a [u8]>, Option<&'a [u8]>, Option<&'a [u8]>)> {
        if is_bare_codestream(data) {
            return Ok((None, None, None));
        }
        let parsed = ParsedContainer::parse(data)?;
        Ok((parsed.exif, parsed.xmp, parsed.icc))
    }

    /// Checks the two-byte codestream signature.
    pub fn parse_signature(data: &[u8]) -> Result<()> {
        if data.len() < 2 {
            return Err(Error::TruncatedData);
        }
        if data[..2] != CODESTREAM_SIGNATURE {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }

    /// Parses the image header at the start of a bare codestream.
    pub fn parse_image_header(data: &[u8]) -> Result<ImageHeader> {
        ImageHeader::parse(data)
    }

    /// Parses a frame header from bytes positioned at one.
    pub fn parse_frame_header(data: &[u8]) -> Result<FrameHeader> {
        let mut br = crate::bit_reader::BitReader::new(data);
        FrameHeader::read(&mut br)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature() {
        JxlDecoder::parse_signature(&[0xff, 0x0a, 0, 0]).unwrap();
        assert_eq!(
            JxlDecoder::parse_signature(&[0x00, 0x0a, 1, 1]),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            JxlDecoder::parse_signature(&[0xff]),
            Err(Error::TruncatedData)
        );
    }

    #[test]
    fn test_every_other_two_byte_prefix_fails() {
        for first in [0x00u8, 0x0a, 0xfe, 0xff] {
            for second in [0x00u8, 0x0b, 0xff] {
                let result = JxlDecoder::parse_signature(&[first, second, 0, 0]);
                if (first, second) == (0xff, 0x0a) {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result, Err(Error::InvalidSignature));
                }
            }
        }
    }
}
