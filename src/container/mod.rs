// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod frame_index;
pub mod parse;

pub use frame_index::FrameIndexEntry;
pub use parse::ParsedContainer;

use byteorder::{BigEndian, WriteBytesExt};

use crate::bit_writer::BitWriter;
use crate::util::tracing_wrappers::*;

/// Four-character box type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerBoxType(pub [u8; 4]);

impl ContainerBoxType {
    pub const JXL: ContainerBoxType = ContainerBoxType(*b"JXL ");
    pub const FILE_TYPE: ContainerBoxType = ContainerBoxType(*b"ftyp");
    pub const JXL_LEVEL: ContainerBoxType = ContainerBoxType(*b"jxll");
    pub const CODESTREAM: ContainerBoxType = ContainerBoxType(*b"jxlc");
    pub const FRAME_INDEX: ContainerBoxType = ContainerBoxType(*b"jxli");
    pub const JPEG_RECONSTRUCTION: ContainerBoxType = ContainerBoxType(*b"jbrd");
    pub const EXIF: ContainerBoxType = ContainerBoxType(*b"Exif");
    pub const XML: ContainerBoxType = ContainerBoxType(*b"xml ");
    pub const COLOR: ContainerBoxType = ContainerBoxType(*b"colr");
}

impl std::fmt::Debug for ContainerBoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(name) => write!(f, "ContainerBoxType({name:?})"),
            Err(_) => write!(f, "ContainerBoxType({:02x?})", self.0),
        }
    }
}

/// Payload of the `JXL ` signature box.
pub const SIGNATURE_BOX_PAYLOAD: [u8; 4] = [0x0d, 0x0a, 0x87, 0x0a];

/// Full 12-byte container signature.
pub const CONTAINER_SIGNATURE: [u8; 12] =
    [0, 0, 0, 0xc, b'J', b'X', b'L', b' ', 0xd, 0xa, 0x87, 0xa];

/// ICC payloads in `colr` boxes carry this colour type prefix.
const COLR_PROFILE_TAG: [u8; 4] = *b"prof";

fn write_box(out: &mut Vec<u8>, box_type: ContainerBoxType, payload: &[u8]) {
    out.write_u32::<BigEndian>(payload.len() as u32 + 8)
        .unwrap();
    out.extend_from_slice(&box_type.0);
    out.extend_from_slice(payload);
}

/// Assembles an ISOBMFF container around a codestream: signature and
/// `ftyp` first, then the optional metadata boxes, then `jxlc`.
#[derive(Debug, Clone, Default)]
pub struct ContainerBuilder {
    codestream: Vec<u8>,
    level: Option<u8>,
    icc: Option<Vec<u8>>,
    frame_index: Vec<FrameIndexEntry>,
    exif: Option<Vec<u8>>,
    xmp: Option<Vec<u8>>,
}

impl ContainerBuilder {
    pub fn new(codestream: Vec<u8>) -> ContainerBuilder {
        ContainerBuilder {
            codestream,
            ..Default::default()
        }
    }

    /// Level indicator, 5 or 10.
    pub fn with_level(mut self, level: u8) -> ContainerBuilder {
        self.level = Some(level);
        self
    }

    pub fn with_icc(mut self, icc: Vec<u8>) -> ContainerBuilder {
        self.icc = Some(icc);
        self
    }

    pub fn with_frame_index(mut self, entries: Vec<FrameIndexEntry>) -> ContainerBuilder {
        self.frame_index = entries;
        self
    }

    /// TIFF blob; the 4-byte offset prefix is added at serialisation time.
    pub fn with_exif(mut self, exif: Vec<u8>) -> ContainerBuilder {
        self.exif = Some(exif);
        self
    }

    /// Raw UTF-8 XMP packet.
    pub fn with_xmp(mut self, xmp: Vec<u8>) -> ContainerBuilder {
        self.xmp = Some(xmp);
        self
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_box(&mut out, ContainerBoxType::JXL, &SIGNATURE_BOX_PAYLOAD);
        let mut ftyp = Vec::new();
        ftyp.extend_from_slice(b"jxl ");
        ftyp.write_u32::<BigEndian>(0).unwrap();
        ftyp.extend_from_slice(b"jxl ");
        write_box(&mut out, ContainerBoxType::FILE_TYPE, &ftyp);
        if let Some(level) = self.level {
            write_box(&mut out, ContainerBoxType::JXL_LEVEL, &[level]);
        }
        if let Some(icc) = &self.icc {
            let mut payload = COLR_PROFILE_TAG.to_vec();
            payload.extend_from_slice(icc);
            write_box(&mut out, ContainerBoxType::COLOR, &payload);
        }
        if !self.frame_index.is_empty() {
            let mut bw = BitWriter::new();
            frame_index::write_entries(&mut bw, &self.frame_index);
            write_box(&mut out, ContainerBoxType::FRAME_INDEX, &bw.finalize());
        }
        if let Some(exif) = &self.exif {
            let mut payload = vec![0u8; 4];
            payload.extend_from_slice(exif);
            write_box(&mut out, ContainerBoxType::EXIF, &payload);
        }
        if let Some(xmp) = &self.xmp {
            write_box(&mut out, ContainerBoxType::XML, xmp);
        }
        write_box(&mut out, ContainerBoxType::CODESTREAM, &self.codestream);
        debug!(bytes = out.len(), "container serialized");
        out
    }
}
