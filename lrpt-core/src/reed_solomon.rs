//! Reed-Solomon Block (C5): RS(255,223) dual-basis decoding over a 4-way
//! interleaved payload.
//!
//! Deinterleave/correct/reinterleave structure mirrors the CCSDS convention:
//! byte `j` of the 1020-byte payload belongs to sub-block `j % RS_BLOCKS` at
//! position `j / RS_BLOCKS`. Each 255-byte sub-block is corrected
//! independently via [`rs2::correct_message`], which implements the CCSDS
//! dual-basis GF(2^8) convention (generator 173, first consecutive root 112).

use rs2::RSState;

use crate::constants::{POST_ASM_SIZE, RS_BLOCKS, RS_CODEWORD_SIZE};

/// Per-interleave outcome: `Some(n)` is the number of symbols corrected,
/// `None` means the block was uncorrectable.
pub type BlockOutcome = Option<u8>;

fn deinterleave(data: &[u8]) -> [[u8; RS_CODEWORD_SIZE]; RS_BLOCKS] {
    let mut blocks = [[0u8; RS_CODEWORD_SIZE]; RS_BLOCKS];
    for (j, &b) in data.iter().enumerate() {
        blocks[j % RS_BLOCKS][j / RS_BLOCKS] = b;
    }
    blocks
}

fn reinterleave(blocks: &[[u8; RS_CODEWORD_SIZE]; RS_BLOCKS], data: &mut [u8]) {
    for (j, out) in data.iter_mut().enumerate() {
        *out = blocks[j % RS_BLOCKS][j / RS_BLOCKS];
    }
}

/// Corrects each of the 4 interleaved RS(255,223) blocks in `payload`
/// (length [`POST_ASM_SIZE`]) in place, writing both data and parity back
/// (copy-parity-to-output). Returns the per-block outcome.
pub fn decode_blocks(payload: &mut [u8]) -> [BlockOutcome; RS_BLOCKS] {
    debug_assert_eq!(payload.len(), POST_ASM_SIZE);

    let mut blocks = deinterleave(payload);
    let mut outcomes: [BlockOutcome; RS_BLOCKS] = [None; RS_BLOCKS];

    for (i, block) in blocks.iter_mut().enumerate() {
        let result = rs2::correct_message(&block[..]);
        match result.state {
            RSState::Ok => {
                outcomes[i] = Some(0);
            }
            RSState::Corrected(n) => {
                if let Some(message) = result.message {
                    block.copy_from_slice(&message);
                }
                outcomes[i] = Some(n.max(0) as u8);
            }
            RSState::Uncorrectable(_) | RSState::NotPerformed => {
                outcomes[i] = None;
            }
        }
    }

    reinterleave(&blocks, payload);
    outcomes
}
