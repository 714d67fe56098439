// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Optional range-based Asymmetric Numeral Systems coder.
//!
//! Sections encoded with ANS carry per-context frequency tables built from
//! the section's symbol counts, followed by a single interleaved rANS
//! payload. The encoder consumes symbols in reverse so the decoder can run
//! forward; tokens above [`ANS_TOKEN_LIMIT`] escape to a side list of
//! variable-length values.

use std::collections::VecDeque;

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};

pub const PROB_BITS: u32 = 12;
pub const PROB_SCALE: u32 = 1 << PROB_BITS;
const RANS_L: u32 = 1 << 23;
pub const ANS_ALPHABET: usize = 256;
pub const ANS_TOKEN_LIMIT: u32 = (ANS_ALPHABET - 1) as u32;
const FREQ_BITS: usize = 13;

/// A normalized frequency table for one context, with the cumulative
/// distribution and the slot-to-symbol lookup used by the decoder.
#[derive(Debug, Clone)]
pub struct AnsHistogram {
    freqs: [u32; ANS_ALPHABET],
    cumul: [u32; ANS_ALPHABET + 1],
    slots: Vec<u8>,
}

impl AnsHistogram {
    /// Normalizes raw counts so they sum to [`PROB_SCALE`], keeping every
    /// present symbol at a non-zero frequency.
    pub fn from_counts(counts: &[u32; ANS_ALPHABET]) -> AnsHistogram {
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        let mut freqs = [0u32; ANS_ALPHABET];
        if total == 0 {
            freqs[0] = PROB_SCALE;
            return Self::from_freqs(freqs);
        }
        let mut sum = 0u32;
        for (freq, &count) in freqs.iter_mut().zip(counts.iter()) {
            if count > 0 {
                *freq = ((count as u64 * PROB_SCALE as u64 / total) as u32).max(1);
                sum += *freq;
            }
        }
        while sum > PROB_SCALE {
            let idx = Self::argmax(&freqs);
            let take = (freqs[idx] - 1).min(sum - PROB_SCALE);
            debug_assert!(take > 0);
            freqs[idx] -= take;
            sum -= take;
        }
        if sum < PROB_SCALE {
            let idx = Self::argmax(&freqs);
            freqs[idx] += PROB_SCALE - sum;
        }
        Self::from_freqs(freqs)
    }

    fn argmax(freqs: &[u32; ANS_ALPHABET]) -> usize {
        let mut best = 0;
        for (idx, &freq) in freqs.iter().enumerate() {
            if freq > freqs[best] {
                best = idx;
            }
        }
        best
    }

    fn from_freqs(freqs: [u32; ANS_ALPHABET]) -> AnsHistogram {
        let mut cumul = [0u32; ANS_ALPHABET + 1];
        for i in 0..ANS_ALPHABET {
            cumul[i + 1] = cumul[i] + freqs[i];
        }
        debug_assert_eq!(cumul[ANS_ALPHABET], PROB_SCALE);
        let mut slots = vec![0u8; PROB_SCALE as usize];
        for symbol in 0..ANS_ALPHABET {
            for slot in cumul[symbol]..cumul[symbol + 1] {
                slots[slot as usize] = symbol as u8;
            }
        }
        AnsHistogram {
            freqs,
            cumul,
            slots,
        }
    }

    pub fn write(&self, bw: &mut BitWriter) {
        for &freq in &self.freqs {
            bw.write_bits(freq as u64, FREQ_BITS);
        }
    }

    pub fn read(br: &mut BitReader) -> Result<AnsHistogram> {
        let mut freqs = [0u32; ANS_ALPHABET];
        let mut sum = 0u64;
        for freq in freqs.iter_mut() {
            *freq = br.read(FREQ_BITS)? as u32;
            sum += *freq as u64;
        }
        if sum != PROB_SCALE as u64 {
            return Err(Error::DecodingFailed(format!(
                "ans table sums to {sum}, expected {PROB_SCALE}"
            )));
        }
        Ok(Self::from_freqs(freqs))
    }
}

/// Encodes `(context, token)` pairs into a self-terminating rANS payload.
/// Symbols are processed in reverse; the final state leads the byte stream.
fn rans_encode(histograms: &[AnsHistogram], tokens: &[(usize, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut state: u32 = RANS_L;
    for &(ctx, token) in tokens.iter().rev() {
        let histogram = &histograms[ctx];
        let freq = histogram.freqs[token as usize];
        let cumul = histogram.cumul[token as usize];
        let state_max = ((RANS_L >> PROB_BITS) << 8) * freq;
        while state >= state_max {
            out.push((state & 0xff) as u8);
            state >>= 8;
        }
        state = ((state / freq) << PROB_BITS) + (state % freq) + cumul;
    }
    out.extend_from_slice(&state.to_le_bytes());
    out.reverse();
    out
}

/// Writes one ANS-coded section: escape list, per-context tables, payload.
pub fn write_ans_section(bw: &mut BitWriter, num_contexts: usize, symbols: &[(usize, u32)]) {
    let mut escapes = Vec::new();
    let tokens: Vec<(usize, u8)> = symbols
        .iter()
        .map(|&(ctx, symbol)| {
            if symbol < ANS_TOKEN_LIMIT {
                (ctx, symbol as u8)
            } else {
                escapes.push(symbol);
                (ctx, ANS_TOKEN_LIMIT as u8)
            }
        })
        .collect();

    bw.write_u32_var(escapes.len() as u32);
    for &escape in &escapes {
        bw.write_u32_var(escape);
    }

    let mut counts = vec![[0u32; ANS_ALPHABET]; num_contexts];
    for &(ctx, token) in &tokens {
        counts[ctx][token as usize] += 1;
    }
    let histograms: Vec<AnsHistogram> = counts.iter().map(AnsHistogram::from_counts).collect();
    for histogram in &histograms {
        histogram.write(bw);
    }

    let payload = rans_encode(&histograms, &tokens);
    bw.write_u32_var(payload.len() as u32);
    bw.write_bytes_aligned(&payload);
}

/// Streaming decoder for a section written by [`write_ans_section`]. The
/// caller drives it with the same context sequence the encoder used.
#[derive(Debug)]
pub struct AnsSectionDecoder {
    histograms: Vec<AnsHistogram>,
    escapes: VecDeque<u32>,
    data: Vec<u8>,
    pos: usize,
    state: u32,
}

impl AnsSectionDecoder {
    pub fn new(br: &mut BitReader, num_contexts: usize) -> Result<AnsSectionDecoder> {
        let num_escapes = br.read_u32_var()? as usize;
        // Every escape costs at least two bits in the stream.
        if num_escapes > br.total_bits_available() / 2 {
            return Err(Error::DecodingFailed(format!(
                "ans section claims {num_escapes} escapes"
            )));
        }
        let mut escapes = VecDeque::with_capacity(num_escapes);
        for _ in 0..num_escapes {
            escapes.push_back(br.read_u32_var()?);
        }
        let mut histograms = Vec::with_capacity(num_contexts);
        for _ in 0..num_contexts {
            histograms.push(AnsHistogram::read(br)?);
        }
        let payload_len = br.read_u32_var()? as usize;
        br.jump_to_byte_boundary()?;
        let mut data = Vec::with_capacity(payload_len);
        for _ in 0..payload_len {
            data.push(br.read(8)? as u8);
        }
        if data.len() < 4 {
            return Err(Error::DecodingFailed("ans payload too short".into()));
        }
        let state = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        Ok(AnsSectionDecoder {
            histograms,
            escapes,
            data,
            pos: 4,
            state,
        })
    }

    pub fn decode_symbol(&mut self, ctx: usize) -> Result<u32> {
        let histogram = &self.histograms[ctx];
        let slot = self.state & (PROB_SCALE - 1);
        let token = histogram.slots[slot as usize];
        let freq = histogram.freqs[token as usize];
        let cumul = histogram.cumul[token as usize];
        self.state = freq * (self.state >> PROB_BITS) + slot - cumul;
        while self.state < RANS_L {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or_else(|| Error::DecodingFailed("ans underflow".into()))?;
            self.pos += 1;
            self.state = (self.state << 8) | byte as u32;
        }
        if token as u32 == ANS_TOKEN_LIMIT {
            self.escapes
                .pop_front()
                .ok_or_else(|| Error::DecodingFailed("ans escape underflow".into()))
        } else {
            Ok(token as u32)
        }
    }

    /// Verifies that the decoder consumed exactly the encoded symbols.
    pub fn check_final_state(&self) -> Result<()> {
        if self.state == RANS_L && self.pos == self.data.len() {
            Ok(())
        } else {
            Err(Error::DecodingFailed("ans final state mismatch".into()))
        }
    }
}
