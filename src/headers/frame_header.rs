// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};

/// Longest frame name the header accepts, in UTF-8 bytes.
pub const MAX_FRAME_NAME_LEN: usize = 1071;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum FrameType {
    #[default]
    Regular = 0,
    DcOnly = 1,
    ReferenceOnly = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum Encoding {
    #[default]
    VarDct = 0,
    Modular = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum BlendMode {
    #[default]
    Replace = 0,
    Blend = 1,
}

/// Per-frame header. The all-default shortcut elides every field when the
/// frame is a plain last VarDCT frame with one group and one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub encoding: Encoding,
    pub blend_mode: BlendMode,
    pub is_last: bool,
    pub save_as_reference: u32,
    pub duration: u32,
    pub num_passes: u32,
    pub num_groups: u32,
    pub name: String,
}

impl Default for FrameHeader {
    fn default() -> Self {
        FrameHeader {
            frame_type: FrameType::Regular,
            encoding: Encoding::VarDct,
            blend_mode: BlendMode::Replace,
            is_last: true,
            save_as_reference: 0,
            duration: 0,
            num_passes: 1,
            num_groups: 1,
            name: String::new(),
        }
    }
}

impl FrameHeader {
    pub fn write(&self, bw: &mut BitWriter) -> Result<()> {
        if self.name.len() > MAX_FRAME_NAME_LEN {
            return Err(Error::EncodingFailed(format!(
                "frame name is {} bytes, max {MAX_FRAME_NAME_LEN}",
                self.name.len()
            )));
        }
        let all_default = *self == FrameHeader::default();
        bw.write_bit(all_default);
        if all_default {
            return Ok(());
        }
        bw.write_bits(self.frame_type as u64, 2);
        bw.write_bits(self.encoding as u64, 1);
        bw.write_bits(self.blend_mode as u64, 1);
        bw.write_bit(self.is_last);
        bw.write_bits(self.save_as_reference as u64, 2);
        bw.write_u32_var(self.duration);
        bw.write_u32_var(self.num_passes);
        bw.write_u32_var(self.num_groups);
        bw.write_u32_var(self.name.len() as u32);
        for &byte in self.name.as_bytes() {
            bw.write_bits(byte as u64, 8);
        }
        Ok(())
    }

    pub fn read(br: &mut BitReader) -> Result<FrameHeader> {
        if br.read_bit()? {
            return Ok(FrameHeader::default());
        }
        let frame_type = FrameType::from_u64(br.read(2)?)
            .ok_or_else(|| Error::InvalidFrameHeader("unknown frame type tag".into()))?;
        let encoding = Encoding::from_u64(br.read(1)?)
            .ok_or_else(|| Error::InvalidFrameHeader("unknown encoding tag".into()))?;
        let blend_mode = BlendMode::from_u64(br.read(1)?)
            .ok_or_else(|| Error::InvalidFrameHeader("unknown blend mode tag".into()))?;
        let is_last = br.read_bit()?;
        let save_as_reference = br.read(2)? as u32;
        let duration = br.read_u32_var()?;
        let num_passes = br.read_u32_var()?;
        let num_groups = br.read_u32_var()?;
        if num_passes == 0 || num_groups == 0 {
            return Err(Error::InvalidFrameHeader(format!(
                "{num_passes} passes in {num_groups} groups"
            )));
        }
        let name_len = br.read_u32_var()? as usize;
        if name_len > MAX_FRAME_NAME_LEN {
            return Err(Error::InvalidFrameHeader(format!(
                "frame name is {name_len} bytes, max {MAX_FRAME_NAME_LEN}"
            )));
        }
        let mut name_bytes = Vec::with_capacity(name_len);
        for _ in 0..name_len {
            name_bytes.push(br.read(8)? as u8);
        }
        let name = String::from_utf8(name_bytes)
            .map_err(|_| Error::InvalidFrameHeader("frame name is not UTF-8".into()))?;
        Ok(FrameHeader {
            frame_type,
            encoding,
            blend_mode,
            is_last,
            save_as_reference,
            duration,
            num_passes,
            num_groups,
            name,
        })
    }
}
