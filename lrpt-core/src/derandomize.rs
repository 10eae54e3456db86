//! Derandomizer (C4): removes the CCSDS pseudo-random sequence applied to
//! the post-ASM payload at the transmitter.
//!
//! Sequence generator: polynomial x^8 + x^7 + x^5 + x^3 + 1, seed 0xFF,
//! period 255 bytes, repeating across the whole region. XOR is its own
//! inverse, so the same table both randomizes and derandomizes.

use std::sync::OnceLock;

const PERIOD: usize = 255;

fn generate_table() -> [u8; PERIOD] {
    // Galois LFSR: bit 0 is the feedback tap, taps at bits 0,2,4,7 correspond
    // to polynomial terms x^0, x^3, x^5, x^7 relative to x^8 (the implicit
    // shift-out term).
    let mut table = [0u8; PERIOD];
    let mut reg: u8 = 0xFF;
    for slot in table.iter_mut() {
        let mut byte = 0u8;
        for bit_pos in (0..8).rev() {
            let out_bit = reg & 1;
            byte |= out_bit << bit_pos;
            let feedback = out_bit ^ ((reg >> 2) & 1) ^ ((reg >> 4) & 1) ^ ((reg >> 7) & 1);
            reg = (reg >> 1) | (feedback << 7);
        }
        *slot = byte;
    }
    table
}

fn table() -> &'static [u8; PERIOD] {
    static TABLE: OnceLock<[u8; PERIOD]> = OnceLock::new();
    TABLE.get_or_init(generate_table)
}

/// XORs `data` in place with the repeating CCSDS PN sequence.
pub fn derandomize(data: &mut [u8]) {
    let pn = table();
    for (i, b) in data.iter_mut().enumerate() {
        *b ^= pn[i % PERIOD];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_byte_is_all_ones() {
        assert_eq!(table()[0], 0xFF);
    }

    #[test]
    fn derandomize_is_its_own_inverse() {
        let original: Vec<u8> = (0..1020u32).map(|v| (v % 256) as u8).collect();
        let mut data = original.clone();
        derandomize(&mut data);
        assert_ne!(data, original);
        derandomize(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn table_has_no_degenerate_all_zero_run() {
        let pn = table();
        assert!(pn.iter().any(|&b| b != 0));
    }

    proptest::proptest! {
        #[test]
        fn derandomize_round_trips_for_any_payload(data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..1200)) {
            let mut round_tripped = data.clone();
            derandomize(&mut round_tripped);
            derandomize(&mut round_tripped);
            proptest::prop_assert_eq!(round_tripped, data);
        }
    }
}
