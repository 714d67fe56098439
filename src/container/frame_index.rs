// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Frame Index box (`jxli`) payload: a seek table mapping frame numbers to
//! codestream byte offsets and durations.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};

/// One seek-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIndexEntry {
    pub frame_number: u32,
    pub byte_offset: u64,
    pub duration: u32,
}

/// Writes a count followed by `(frame_number, byte_offset, duration)`
/// triples.
pub fn write_entries(bw: &mut BitWriter, entries: &[FrameIndexEntry]) {
    bw.write_u32_var(entries.len() as u32);
    for entry in entries {
        bw.write_u32_var(entry.frame_number);
        bw.write_u64_var(entry.byte_offset);
        bw.write_u32_var(entry.duration);
    }
    bw.flush_byte();
}

/// Parses a `jxli` payload.
pub fn parse_entries(data: &[u8]) -> Result<Vec<FrameIndexEntry>> {
    let mut br = BitReader::new(data);
    let count = br.read_u32_var()? as usize;
    if count as u64 > data.len() as u64 * 8 {
        // Each entry takes at least one byte; an impossible count means a
        // corrupt box rather than merely truncated input.
        return Err(Error::InvalidContainer(format!(
            "frame index claims {count} entries in {} bytes",
            data.len()
        )));
    }
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(FrameIndexEntry {
            frame_number: br.read_u32_var()?,
            byte_offset: br.read_u64_var()?,
            duration: br.read_u32_var()?,
        });
    }
    Ok(entries)
}
