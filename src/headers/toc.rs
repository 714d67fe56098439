// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::Result;

/// Table of contents of a frame: the byte length of every section, in
/// emission order. Byte-aligned on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Toc {
    pub entries: Vec<u32>,
}

impl Toc {
    pub fn new(entries: Vec<u32>) -> Toc {
        Toc { entries }
    }

    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|&len| len as usize).sum()
    }

    pub fn write(&self, bw: &mut BitWriter) {
        for &entry in &self.entries {
            bw.write_u32_var(entry);
        }
        bw.flush_byte();
    }

    pub fn read(br: &mut BitReader, num_entries: usize) -> Result<Toc> {
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            entries.push(br.read_u32_var()?);
        }
        br.jump_to_byte_boundary()?;
        Ok(Toc { entries })
    }
}
