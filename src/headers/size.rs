// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};
use crate::headers::encodings::{U32, U32Coder};

/// Common width-to-height ratios that elide the explicit width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
enum AspectRatio {
    Unknown = 0,
    Ratio1Over1 = 1,
    Ratio12Over10 = 2,
    Ratio4Over3 = 3,
    Ratio3Over2 = 4,
    Ratio16Over9 = 5,
    Ratio5Over4 = 6,
    Ratio2Over1 = 7,
}

fn map_aspect_ratio(ysize: u32, ratio: AspectRatio) -> u32 {
    match ratio {
        AspectRatio::Unknown => unreachable!("explicit width carries no ratio"),
        AspectRatio::Ratio1Over1 => ysize,
        AspectRatio::Ratio12Over10 => (ysize as u64 * 12 / 10) as u32,
        AspectRatio::Ratio4Over3 => (ysize as u64 * 4 / 3) as u32,
        AspectRatio::Ratio3Over2 => (ysize as u64 * 3 / 2) as u32,
        AspectRatio::Ratio16Over9 => (ysize as u64 * 16 / 9) as u32,
        AspectRatio::Ratio5Over4 => (ysize as u64 * 5 / 4) as u32,
        AspectRatio::Ratio2Over1 => ysize * 2,
    }
}

const DIM_CODER: U32Coder = U32Coder(
    U32::BitsOffset { n: 14, off: 1 },
    U32::BitsOffset { n: 18, off: 1 },
    U32::BitsOffset { n: 22, off: 1 },
    U32::BitsOffset { n: 30, off: 1 },
);

/// Bit-packed image dimensions: a small-value shortcut for multiples of 8
/// up to 256, or a general selector-coded field, with the width optionally
/// replaced by an aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHeader {
    width: u32,
    height: u32,
}

impl SizeHeader {
    pub fn new(width: u32, height: u32) -> Result<SizeHeader> {
        if width == 0 || height == 0 || width >= (1 << 30) || height >= (1 << 30) {
            return Err(Error::InvalidDimensions(width, height));
        }
        Ok(SizeHeader { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn is_small(dim: u32) -> bool {
        dim % 8 == 0 && dim <= 256
    }

    fn ratio(&self) -> AspectRatio {
        for tag in 1..8u8 {
            let candidate = AspectRatio::from_u8(tag).unwrap();
            if map_aspect_ratio(self.height, candidate) == self.width {
                return candidate;
            }
        }
        AspectRatio::Unknown
    }

    pub fn write(&self, bw: &mut BitWriter) -> Result<()> {
        let small = Self::is_small(self.width) && Self::is_small(self.height);
        bw.write_bit(small);
        if small {
            bw.write_bits((self.height / 8 - 1) as u64, 5);
        } else {
            DIM_CODER.write(bw, self.height)?;
        }
        let ratio = self.ratio();
        bw.write_bits(ratio as u64, 3);
        if ratio == AspectRatio::Unknown {
            if small {
                bw.write_bits((self.width / 8 - 1) as u64, 5);
            } else {
                DIM_CODER.write(bw, self.width)?;
            }
        }
        Ok(())
    }

    pub fn read(br: &mut BitReader) -> Result<SizeHeader> {
        let small = br.read_bit()?;
        let height = if small {
            (br.read(5)? as u32 + 1) * 8
        } else {
            DIM_CODER.read(br)?
        };
        let ratio = AspectRatio::from_u8(br.read(3)? as u8).unwrap();
        let width = if ratio == AspectRatio::Unknown {
            if small {
                (br.read(5)? as u32 + 1) * 8
            } else {
                DIM_CODER.read(br)?
            }
        } else {
            map_aspect_ratio(height, ratio)
        };
        SizeHeader::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(width: u32, height: u32) -> usize {
        let header = SizeHeader::new(width, height).unwrap();
        let mut bw = BitWriter::new();
        header.write(&mut bw).unwrap();
        let bytes = bw.finalize();
        let mut br = BitReader::new(&bytes);
        let parsed = SizeHeader::read(&mut br).unwrap();
        assert_eq!(parsed, header);
        bytes.len()
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            SizeHeader::new(0, 100),
            Err(Error::InvalidDimensions(0, 100))
        );
        assert_eq!(SizeHeader::new(5, 0), Err(Error::InvalidDimensions(5, 0)));
    }

    #[test]
    fn test_small_shortcut_roundtrip() {
        // 8..256 multiples of 8 use the 5-bit shortcut.
        for dim in [8u32, 64, 128, 256] {
            assert!(roundtrip(dim, dim) <= 2);
        }
    }

    #[test]
    fn test_general_roundtrip() {
        for (w, h) in [(1u32, 1u32), (13, 7), (1920, 1080), (100000, 3), (3, 100000)] {
            roundtrip(w, h);
        }
    }

    #[test]
    fn test_ratio_elides_width() {
        // 1:1 at a non-multiple-of-8 size still needs no explicit width.
        let with_ratio = roundtrip(1000, 1000);
        let without_ratio = roundtrip(1000, 999);
        assert!(with_ratio < without_ratio);
    }

    #[test]
    fn test_truncated_input() {
        let mut br = BitReader::new(&[]);
        assert_eq!(SizeHeader::read(&mut br), Err(Error::TruncatedData));
    }
}
