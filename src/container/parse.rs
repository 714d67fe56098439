// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{BigEndian, ByteOrder};

use crate::container::frame_index::{parse_entries, FrameIndexEntry};
use crate::container::{ContainerBoxType, CONTAINER_SIGNATURE, SIGNATURE_BOX_PAYLOAD};
use crate::error::{Error, Result};
use crate::headers::image_header::CODESTREAM_SIGNATURE;
use crate::util::tracing_wrappers::*;

/// A parsed container. Payload fields borrow the input; the parser never
/// copies box contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContainer<'a> {
    pub codestream: &'a [u8],
    pub level: Option<u8>,
    pub icc: Option<&'a [u8]>,
    pub exif: Option<&'a [u8]>,
    pub xmp: Option<&'a [u8]>,
    pub frame_index: Vec<FrameIndexEntry>,
    /// Boxes the walker recognises but does not interpret, `jbrd` included.
    pub aux_boxes: Vec<(ContainerBoxType, &'a [u8])>,
}

/// Whether the input is a bare codestream rather than a container.
pub fn is_bare_codestream(data: &[u8]) -> bool {
    data.starts_with(&CODESTREAM_SIGNATURE)
}

struct BoxWalker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoxWalker<'a> {
    /// Returns `(box_type, payload)`, advancing past the box.
    fn next_box(&mut self) -> Result<Option<(ContainerBoxType, &'a [u8])>> {
        if self.pos == self.data.len() {
            return Ok(None);
        }
        if self.pos + 8 > self.data.len() {
            return Err(Error::InvalidContainer("truncated box header".into()));
        }
        let declared = BigEndian::read_u32(&self.data[self.pos..]) as u64;
        let box_type = ContainerBoxType(
            self.data[self.pos + 4..self.pos + 8].try_into().unwrap(),
        );
        let mut header_size = 8usize;
        let total = match declared {
            0 => (self.data.len() - self.pos) as u64,
            1 => {
                if self.pos + 16 > self.data.len() {
                    return Err(Error::InvalidContainer("truncated 64-bit box size".into()));
                }
                header_size = 16;
                BigEndian::read_u64(&self.data[self.pos + 8..])
            }
            size => size,
        };
        if total < header_size as u64 || total > (self.data.len() - self.pos) as u64 {
            return Err(Error::InvalidContainer(format!(
                "box {box_type:?} of {total} bytes exceeds remaining input"
            )));
        }
        let payload = &self.data[self.pos + header_size..self.pos + total as usize];
        self.pos += total as usize;
        Ok(Some((box_type, payload)))
    }
}

impl<'a> ParsedContainer<'a> {
    /// Linear walk over the container boxes. The signature box must come
    /// first and a `jxlc` box must be present.
    pub fn parse(data: &'a [u8]) -> Result<ParsedContainer<'a>> {
        if !data.starts_with(&CONTAINER_SIGNATURE) {
            return Err(Error::InvalidContainer("missing JXL signature box".into()));
        }
        let mut walker = BoxWalker { data, pos: 0 };
        let (first_type, first_payload) = walker
            .next_box()?
            .expect("signature prefix guarantees one box");
        if first_type != ContainerBoxType::JXL || first_payload != SIGNATURE_BOX_PAYLOAD {
            return Err(Error::InvalidContainer("malformed signature box".into()));
        }

        let mut codestream = None;
        let mut level = None;
        let mut icc = None;
        let mut exif = None;
        let mut xmp = None;
        let mut frame_index = Vec::new();
        let mut aux_boxes = Vec::new();
        while let Some((box_type, payload)) = walker.next_box()? {
            trace!(?box_type, bytes = payload.len(), "container box");
            match box_type {
                ContainerBoxType::CODESTREAM => {
                    if codestream.is_some() {
                        return Err(Error::InvalidContainer("duplicate jxlc box".into()));
                    }
                    codestream = Some(payload);
                }
                ContainerBoxType::JXL_LEVEL => {
                    if payload.len() != 1 {
                        return Err(Error::InvalidContainer("jxll box must be one byte".into()));
                    }
                    level = Some(payload[0]);
                }
                ContainerBoxType::COLOR => {
                    if payload.len() < 4 || payload[..4] != *b"prof" {
                        return Err(Error::InvalidContainer(
                            "colr box without ICC profile tag".into(),
                        ));
                    }
                    icc = Some(&payload[4..]);
                }
                ContainerBoxType::EXIF => {
                    if payload.len() < 4 {
                        return Err(Error::InvalidContainer(
                            "Exif box shorter than its offset field".into(),
                        ));
                    }
                    exif = Some(&payload[4..]);
                }
                ContainerBoxType::XML => {
                    xmp = Some(payload);
                }
                ContainerBoxType::FRAME_INDEX => {
                    frame_index = parse_entries(payload)?;
                }
                ContainerBoxType::FILE_TYPE => {}
                other => {
                    aux_boxes.push((other, payload));
                }
            }
        }
        let codestream = codestream
            .ok_or_else(|| Error::InvalidContainer("no jxlc box in container".into()))?;
        Ok(ParsedContainer {
            codestream,
            level,
            icc,
            exif,
            xmp,
            frame_index,
            aux_boxes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerBuilder;

    #[test]
    fn test_roundtrip_all_metadata() {
        let codestream = vec![0xff, 0x0a, 9, 9, 9];
        let exif = b"II*\0exifdata".to_vec();
        let xmp = b"<x:xmpmeta/>".to_vec();
        let icc = vec![1u8, 2, 3, 4, 5];
        let entries = vec![
            FrameIndexEntry {
                frame_number: 0,
                byte_offset: 0,
                duration: 100,
            },
            FrameIndexEntry {
                frame_number: 1,
                byte_offset: 256,
                duration: 200,
            },
        ];
        let bytes = ContainerBuilder::new(codestream.clone())
            .with_level(10)
            .with_icc(icc.clone())
            .with_frame_index(entries.clone())
            .with_exif(exif.clone())
            .with_xmp(xmp.clone())
            .serialize();
        let parsed = ParsedContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.codestream, &codestream[..]);
        assert_eq!(parsed.level, Some(10));
        assert_eq!(parsed.icc, Some(&icc[..]));
        assert_eq!(parsed.exif, Some(&exif[..]));
        assert_eq!(parsed.xmp, Some(&xmp[..]));
        assert_eq!(parsed.frame_index, entries);
    }

    #[test]
    fn test_empty_metadata_blobs_are_preserved() {
        let bytes = ContainerBuilder::new(vec![0xff, 0x0a])
            .with_exif(Vec::new())
            .with_xmp(Vec::new())
            .serialize();
        let parsed = ParsedContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.exif, Some(&[][..]));
        assert_eq!(parsed.xmp, Some(&[][..]));
    }

    #[test]
    fn test_box_past_end_of_input() {
        let mut bytes = ContainerBuilder::new(vec![0xff, 0x0a, 1, 2, 3]).serialize();
        // Grow the declared size of the last box beyond the input.
        let len = bytes.len();
        bytes[len - 13] = 0xff;
        assert!(matches!(
            ParsedContainer::parse(&bytes),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_missing_codestream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_SIGNATURE);
        assert_eq!(
            ParsedContainer::parse(&bytes),
            Err(Error::InvalidContainer("no jxlc box in container".into()))
        );
    }

    #[test]
    fn test_not_a_container() {
        assert!(ParsedContainer::parse(&[0xff, 0x0a, 0, 0]).is_err());
        assert!(is_bare_codestream(&[0xff, 0x0a, 0, 0]));
        assert!(!is_bare_codestream(&CONTAINER_SIGNATURE));
    }

    #[test]
    fn test_jbrd_box_lands_in_aux() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_SIGNATURE);
        // jbrd box with a 3-byte payload, then the codestream box.
        bytes.extend_from_slice(&[0, 0, 0, 11]);
        bytes.extend_from_slice(b"jbrd");
        bytes.extend_from_slice(&[7, 8, 9]);
        bytes.extend_from_slice(&[0, 0, 0, 10]);
        bytes.extend_from_slice(b"jxlc");
        bytes.extend_from_slice(&[0xff, 0x0a]);
        let parsed = ParsedContainer::parse(&bytes).unwrap();
        assert_eq!(
            parsed.aux_boxes,
            vec![(ContainerBoxType::JPEG_RECONSTRUCTION, &[7u8, 8, 9][..])]
        );
        assert_eq!(parsed.codestream, &[0xff, 0x0a]);
    }

    #[test]
    fn test_to_eof_box_size() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_SIGNATURE);
        // Size 0: jxlc extends to the end of the file.
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"jxlc");
        bytes.extend_from_slice(&[0xff, 0x0a, 42]);
        let parsed = ParsedContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.codestream, &[0xff, 0x0a, 42]);
    }

    #[test]
    fn test_64_bit_box_size() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_SIGNATURE);
        bytes.extend_from_slice(&[0, 0, 0, 1]);
        bytes.extend_from_slice(b"jxlc");
        bytes.extend_from_slice(&19u64.to_be_bytes());
        bytes.extend_from_slice(&[0xff, 0x0a, 7]);
        let parsed = ParsedContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.codestream, &[0xff, 0x0a, 7]);
    }
}
