//! Sync Correlator (C1): finds the best-matching sync pattern and offset
//! in a soft-symbol window.

use std::sync::OnceLock;

use crate::constants::MIN_CORRELATION_BITS;
use crate::errors::SyncError;
use crate::packet_fixer::{distort, Phase};

/// Generator polynomials for the K=7 rate-1/2 convolutional code, matching
/// the taps used by [`crate::viterbi`]. G2's output is inverted per CCSDS
/// convention. These are used here only to derive the 8 reference sync
/// patterns from the ASM; the decoder itself never encodes.
const G1_POLY: u8 = 0o171;
const G2_POLY: u8 = 0o133;

fn parity(mut v: u8) -> u8 {
    v ^= v >> 4;
    v ^= v >> 2;
    v ^= v >> 1;
    v & 1
}

/// Convolutionally encodes `bits` (MSB-first input bits) at rate 1/2,
/// starting from an all-zero shift register, interleaving G1 then G2 per
/// input bit.
fn conv_encode(bits: &[u8]) -> Vec<u8> {
    let mut shift_reg: u8 = 0;
    let mut out = Vec::with_capacity(bits.len() * 2);
    for &bit in bits {
        shift_reg = ((shift_reg << 1) | (bit & 1)) & 0x7F;
        let g1 = parity(shift_reg & G1_POLY);
        let g2 = parity(shift_reg & G2_POLY) ^ 1;
        out.push(g1);
        out.push(g2);
    }
    out
}

fn asm_bits() -> Vec<u8> {
    (0..32)
        .rev()
        .map(|bit| ((crate::constants::ASM >> bit) & 1) as u8)
        .collect()
}

/// Maps a hard decision bit to its canonical bias-128 extreme. `hard(b) = b <
/// 128 ? 1 : 0`, so bit 1 maps to the low extreme and bit 0 to the high one.
fn bit_to_sample(bit: u8) -> u8 {
    if bit == 1 {
        0
    } else {
        255
    }
}

fn hard_bit(sample: u8) -> u8 {
    if sample < 128 {
        1
    } else {
        0
    }
}

fn build_sync_words() -> [u64; 8] {
    let canonical_bits = conv_encode(&asm_bits());
    debug_assert_eq!(canonical_bits.len(), 64);
    let canonical_samples: Vec<u8> = canonical_bits.iter().map(|&b| bit_to_sample(b)).collect();

    let mut table = [0u64; 8];
    for word_idx in 0..8 {
        let (phase, iq_inverted) = Phase::from_word_idx(word_idx);
        let mut distorted = canonical_samples.clone();
        distort(&mut distorted, phase, iq_inverted);
        let mut word = 0u64;
        for (i, &sample) in distorted.iter().enumerate() {
            if hard_bit(sample) == 1 {
                word |= 1u64 << (63 - i);
            }
        }
        table[word_idx] = word;
    }
    table
}

fn sync_words() -> &'static [u64; 8] {
    static TABLE: OnceLock<[u64; 8]> = OnceLock::new();
    TABLE.get_or_init(build_sync_words)
}

fn hard_word(bytes: &[u8]) -> u64 {
    let mut w = 0u64;
    for (i, &b) in bytes.iter().enumerate() {
        if hard_bit(b) == 1 {
            w |= 1u64 << (63 - i);
        }
    }
    w
}

/// Result of a correlation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub word_idx: usize,
    pub offset: usize,
    pub bits_matching: u32,
}

/// Scans `window` at candidate offsets `0..search_length` for the
/// best-matching sync pattern. `window` must be at least 64 bytes longer
/// than the largest offset searched; offsets beyond `window.len() - 64` are
/// skipped rather than panicking.
pub fn correlate(window: &[u8], search_length: usize) -> Result<Correlation, SyncError> {
    if window.len() < 64 {
        return Err(SyncError::WindowTooShort {
            needed: 64,
            available: window.len(),
        });
    }
    let effective_length = search_length.min(window.len() - 64 + 1);

    let patterns = sync_words();
    let mut best = Correlation {
        word_idx: 0,
        offset: 0,
        bits_matching: 0,
    };
    for p in 0..effective_length {
        let word = hard_word(&window[p..p + 64]);
        for (idx, pattern) in patterns.iter().enumerate() {
            let bits = 64 - (word ^ pattern).count_ones();
            if bits > best.bits_matching {
                best = Correlation {
                    word_idx: idx,
                    offset: p,
                    bits_matching: bits,
                };
            }
        }
    }
    Ok(best)
}

/// Returns `Ok(correlation)` only if it clears [`MIN_CORRELATION_BITS`].
pub fn correlate_above_threshold(
    window: &[u8],
    search_length: usize,
) -> Result<Correlation, SyncError> {
    let best = correlate(window, search_length)?;
    if best.bits_matching < MIN_CORRELATION_BITS {
        return Err(SyncError::BelowThreshold {
            bits: best.bits_matching,
            minimum: MIN_CORRELATION_BITS,
        });
    }
    Ok(best)
}

/// Number of offsets scanned during a fast recheck while locked.
pub fn fast_recheck_length(coded_frame_size: usize) -> usize {
    coded_frame_size / 64
}
