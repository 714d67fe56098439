// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::entropy_coding::context::ContextModel;
use crate::error::{Error, Result};

/// Context-adaptive Rice coder. Encoder and decoder share the same model
/// update rule, so the parameter estimate stays in lockstep: `k` is always
/// computed from the statistics *before* the current symbol is recorded.
#[derive(Debug)]
pub struct RiceCoder {
    model: ContextModel,
}

impl RiceCoder {
    pub fn new(num_contexts: usize) -> RiceCoder {
        RiceCoder {
            model: ContextModel::new(num_contexts),
        }
    }

    pub fn num_contexts(&self) -> usize {
        self.model.num_contexts()
    }

    /// Emits `symbol` as a `symbol >> k` unary quotient followed by the
    /// `k` low bits.
    pub fn encode(&mut self, bw: &mut BitWriter, ctx: usize, symbol: u32) {
        let k = self.model.rice_parameter(ctx) as usize;
        bw.write_unary(symbol >> k);
        bw.write_bits((symbol & ((1u32 << k) - 1)) as u64, k);
        self.model.record(ctx, symbol);
    }

    pub fn decode(&mut self, br: &mut BitReader, ctx: usize) -> Result<u32> {
        let k = self.model.rice_parameter(ctx) as usize;
        let quotient = br.read_unary()? as u64;
        let low = br.read(k)?;
        let symbol = (quotient << k) | low;
        let symbol =
            u32::try_from(symbol).map_err(|_| Error::DecodingFailed("rice overflow".into()))?;
        self.model.record(ctx, symbol);
        Ok(symbol)
    }
}
