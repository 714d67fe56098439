// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::entropy_coding::ans::AnsSectionDecoder;
use crate::entropy_coding::context::zigzag_decode;
use crate::entropy_coding::rice::RiceCoder;
use crate::error::{Error, Result};
use crate::image::Plane;
use crate::modular::predict::Neighborhood;
use crate::modular::squeeze::inverse_squeeze;
use crate::modular::tree::MaTree;
use crate::modular::MAX_SAMPLE_VALUE;

enum SymbolSource {
    Rice(RiceCoder),
    Ans(Box<AnsSectionDecoder>),
}

/// Decodes one channel section back into a plane; the exact mirror of
/// [`encode_channel`](crate::modular::encode_channel).
pub fn decode_channel(
    section: &[u8],
    width: usize,
    height: usize,
    channel_index: usize,
    tree: &MaTree,
    squeeze_levels: usize,
    use_ans: bool,
) -> Result<Plane<i32>> {
    let fail = |_| Error::DecodingFailed(format!("modular channel {channel_index}"));
    let mut br = BitReader::new(section);
    let mut source = if use_ans {
        SymbolSource::Ans(Box::new(
            AnsSectionDecoder::new(&mut br, tree.num_contexts()).map_err(fail)?,
        ))
    } else {
        SymbolSource::Rice(RiceCoder::new(tree.num_contexts()))
    };
    let mut data = Plane::new(width, height)?;
    let mut residuals = Plane::new(width, height)?;
    for y in 0..height {
        for x in 0..width {
            let neighborhood = Neighborhood::gather(&data, &residuals, x, y);
            let properties = MaTree::properties(channel_index, &neighborhood);
            let (predictor, ctx) = tree.lookup(&properties);
            let predicted = predictor.predict_one(&neighborhood, MAX_SAMPLE_VALUE);
            let symbol = match &mut source {
                SymbolSource::Rice(coder) => coder.decode(&mut br, ctx as usize),
                SymbolSource::Ans(decoder) => decoder.decode_symbol(ctx as usize),
            }
            .map_err(fail)?;
            let residual = zigzag_decode(symbol);
            data.set(x, y, predicted.wrapping_add(residual));
            residuals.set(x, y, residual);
        }
    }
    if let SymbolSource::Ans(decoder) = &source {
        decoder.check_final_state().map_err(fail)?;
    }
    if squeeze_levels > 0 {
        inverse_squeeze(&mut data, squeeze_levels);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modular::encode_channel;
    use crate::modular::tree::{MaTree, TreeKind};
    use paste::paste;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    fn gradient_plane(width: usize, height: usize) -> Plane<i32> {
        let mut plane = Plane::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                plane.set(x, y, ((x * 3 + y * 7) % 256) as i32);
            }
        }
        plane
    }

    fn noisy_plane(width: usize, height: usize, seed: u64) -> Plane<i32> {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let mut plane = Plane::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                plane.set(x, y, rng.random_range(0..65536));
            }
        }
        plane
    }

    fn roundtrip(original: &Plane<i32>, kind: TreeKind, squeeze_levels: usize, use_ans: bool) {
        let tree = MaTree::for_kind(kind);
        let mut plane = original.clone();
        let section =
            encode_channel(&mut plane, 0, &tree, squeeze_levels, use_ans).unwrap();
        let decoded = decode_channel(
            &section,
            original.width(),
            original.height(),
            0,
            &tree,
            squeeze_levels,
            use_ans,
        )
        .unwrap();
        assert_eq!(&decoded, original);
    }

    macro_rules! channel_roundtrip_tests {
        ($($name:ident: $kind:expr, $squeeze:expr, $ans:expr;)*) => {
            $(
                paste! {
                    #[test]
                    fn [<test_roundtrip_ $name>]() {
                        roundtrip(&gradient_plane(23, 17), $kind, $squeeze, $ans);
                        roundtrip(&noisy_plane(16, 16, 99), $kind, $squeeze, $ans);
                    }
                }
            )*
        };
    }

    channel_roundtrip_tests! {
        default_tree_plain: TreeKind::Default, 0, false;
        default_tree_squeezed: TreeKind::Default, 3, false;
        extended_tree_plain: TreeKind::Extended, 0, false;
        extended_tree_squeezed: TreeKind::Extended, 3, false;
        default_tree_ans: TreeKind::Default, 3, true;
        extended_tree_ans: TreeKind::Extended, 3, true;
    }

    #[test]
    fn test_roundtrip_single_pixel() {
        let mut plane = Plane::new(1, 1).unwrap();
        plane.set(0, 0, 128);
        roundtrip(&plane, TreeKind::Default, 3, false);
    }

    #[test]
    fn test_truncated_section_fails() {
        let tree = MaTree::default_tree();
        let mut plane = noisy_plane(8, 8, 5);
        let section = encode_channel(&mut plane, 0, &tree, 0, false).unwrap();
        let truncated = &section[..section.len() / 2];
        let result = decode_channel(truncated, 8, 8, 0, &tree, 0, false);
        assert_eq!(
            result,
            Err(Error::DecodingFailed("modular channel 0".into()))
        );
    }

    #[test]
    fn test_smooth_content_compresses() {
        let tree = MaTree::default_tree();
        let mut plane = Plane::new(64, 64).unwrap();
        for y in 0..64 {
            for x in 0..64 {
                plane.set(x, y, 77);
            }
        }
        let section = encode_channel(&mut plane, 0, &tree, 3, false).unwrap();
        // A constant plane predicts perfectly almost everywhere.
        assert!(section.len() < 64 * 64 / 4, "section was {}", section.len());
    }
}
