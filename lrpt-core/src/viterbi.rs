//! Viterbi Decoder (C3): CCSDS-standard K=7, rate-1/2 soft-decision decoding.
//!
//! Generator polynomials G1 = 0o171, G2 = 0o133 (G2's output inverted per
//! CCSDS/NASA convention); equivalently 0x4F/0x6D under the bit-reversed
//! shift-register convention used by some reference decoders. Operates on
//! bias-128 soft bytes: a sample near 0 favors a decoded bit of 1, a sample
//! near 255 favors 0 — the same convention used throughout this crate.

const NUM_STATES: usize = 64;
const G1_POLY: u8 = 0o171;
const G2_POLY: u8 = 0o133;

fn parity(mut v: u8) -> u8 {
    v ^= v >> 4;
    v ^= v >> 2;
    v ^= v >> 1;
    v & 1
}

fn branch_output(register: u8) -> (u8, u8) {
    let g1 = parity(register & G1_POLY);
    let g2 = parity(register & G2_POLY) ^ 1;
    (g1, g2)
}

fn ideal_sample(bit: u8) -> i32 {
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

/// Result of decoding one soft-symbol window.
pub struct DecodeResult {
    /// Decoded bytes, MSB-first bit packing, one bit per input symbol pair.
    pub bytes: Vec<u8>,
    /// Raw count of channel-bit disagreements along the winning path.
    pub raw_errors: u32,
    /// Total channel bits examined (`bytes.len() * 8 * 2`, i.e. the coded
    /// bit count), used to normalize `raw_errors` into a percentage.
    total_channel_bits: u32,
}

impl DecodeResult {
    /// Raw error count, matching the contract's `ber()`.
    pub fn ber(&self) -> u32 {
        self.raw_errors
    }

    /// Error rate as an integer percentage in `0..=100`.
    pub fn percent_ber(&self) -> u32 {
        if self.total_channel_bits == 0 {
            return 0;
        }
        ((self.raw_errors as u64 * 100) / self.total_channel_bits as u64).min(100) as u32
    }
}

/// Decodes `samples` (soft bytes, even length) at rate 1/2, starting from a
/// uniform prior over all 64 encoder states (the caller is expected to have
/// prefixed `samples` with the previous frame's tail as warm-up history).
pub fn decode(samples: &[u8]) -> DecodeResult {
    assert!(samples.len() % 2 == 0, "viterbi input must have even length");
    let steps = samples.len() / 2;

    let mut metrics = [0u32; NUM_STATES];
    // predecessor[step][new_state] = (old_state << 1) | input_bit
    let mut predecessors: Vec<[u8; NUM_STATES]> = Vec::with_capacity(steps);

    for step in 0..steps {
        let sample_g1 = samples[step * 2];
        let sample_g2 = samples[step * 2 + 1];

        let mut next_metrics = [u32::MAX; NUM_STATES];
        let mut next_pred = [0u8; NUM_STATES];

        for old_state in 0..NUM_STATES {
            let old_metric = metrics[old_state];
            if old_metric == u32::MAX {
                continue;
            }
            for bit in 0u8..2 {
                let register = (((old_state as u8) << 1) | bit) & 0x7F;
                let (g1, g2) = branch_output(register);
                let cost = (sample_g1 as i32 - ideal_sample(g1)).unsigned_abs()
                    + (sample_g2 as i32 - ideal_sample(g2)).unsigned_abs();
                let total = old_metric.saturating_add(cost);
                let new_state = (register & 0x3F) as usize;
                if total < next_metrics[new_state] {
                    next_metrics[new_state] = total;
                    next_pred[new_state] = ((old_state as u8) << 1) | bit;
                }
            }
        }
        metrics = next_metrics;
        predecessors.push(next_pred);
    }

    let mut state = metrics
        .iter()
        .enumerate()
        .min_by_key(|&(_, m)| m)
        .map(|(s, _)| s)
        .unwrap_or(0);

    let mut bits = vec![0u8; steps];
    let mut raw_errors = 0u32;
    for step in (0..steps).rev() {
        let entry = predecessors[step][state];
        let bit = entry & 1;
        let old_state = (entry >> 1) as usize;

        let register = (((old_state as u8) << 1) | bit) & 0x7F;
        let (g1, g2) = branch_output(register);
        let sample_g1 = samples[step * 2];
        let sample_g2 = samples[step * 2 + 1];
        if hard_bit(sample_g1) != g1 {
            raw_errors += 1;
        }
        if hard_bit(sample_g2) != g2 {
            raw_errors += 1;
        }

        bits[step] = bit;
        state = old_state;
    }

    let bytes = bits
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect();

    DecodeResult {
        bytes,
        raw_errors,
        total_channel_bits: (steps * 2) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bits: &[u8]) -> Vec<u8> {
        let mut shift_reg: u8 = 0;
        let mut out = Vec::with_capacity(bits.len() * 2);
        for &bit in bits {
            shift_reg = ((shift_reg << 1) | (bit & 1)) & 0x7F;
            let (g1, g2) = branch_output(shift_reg);
            out.push(if g1 == 1 { 0 } else { 255 });
            out.push(if g2 == 1 { 0 } else { 255 });
        }
        out
    }

    #[test]
    fn decodes_clean_encoded_bits_with_zero_errors() {
        let bits: Vec<u8> = (0..128).map(|i| ((i * 7 + 3) % 2) as u8).collect();
        let coded = encode(&bits);
        let result = decode(&coded);
        let decoded_bits: Vec<u8> = result
            .bytes
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1))
            .collect();
        assert_eq!(decoded_bits, bits);
        assert_eq!(result.ber(), 0);
        assert_eq!(result.percent_ber(), 0);
    }

    #[test]
    fn tolerates_a_few_erasures() {
        let bits: Vec<u8> = (0..256).map(|i| ((i * 13 + 5) % 2) as u8).collect();
        let mut coded = encode(&bits);
        for i in (0..coded.len()).step_by(37) {
            coded[i] = 128;
        }
        let result = decode(&coded);
        let decoded_bits: Vec<u8> = result
            .bytes
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1))
            .collect();
        assert_eq!(decoded_bits, bits);
    }
}
