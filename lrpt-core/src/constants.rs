//! Frame and coding constants for the LRPT datalink.

/// CCSDS transfer frame size: 4-byte ASM + 892-byte data + 128-byte RS parity.
pub const FRAME_SIZE: usize = 1024;

/// `FRAME_SIZE` in bits.
pub const FRAME_BITS: usize = FRAME_SIZE * 8;

/// Soft-symbol window size: rate-1/2 expansion, one soft byte per coded bit.
pub const CODED_FRAME_SIZE: usize = 16_384;

/// Correlation threshold below which a sync candidate is rejected.
pub const MIN_CORRELATION_BITS: u32 = 46;

/// Width in bytes of the Attached Sync Marker once Viterbi-decoded.
pub const SYNC_WORD_SIZE: usize = 4;

/// Total RS parity across the 4 interleaves (32 bytes each).
pub const RS_PARITY_BLOCK_SIZE: usize = 128;

/// RS interleave depth.
pub const RS_BLOCKS: usize = 4;

/// Length of a single RS(255,223) codeword.
pub const RS_CODEWORD_SIZE: usize = 255;

/// Number of soft-symbol bytes carried across frame boundaries as Viterbi
/// warm-up prefix (prevents traceback boundary loss).
pub const TAIL_BYTES: usize = 64;

/// Neutral (zero-confidence) soft-symbol fill value.
pub const NEUTRAL_SOFT_BYTE: u8 = 128;

/// Total soft-symbol bytes fed to the Viterbi decoder per frame, including
/// the carried-over tail.
pub const VITERBI_INPUT_LEN: usize = CODED_FRAME_SIZE + TAIL_BYTES;

/// Decoded bits produced per Viterbi call (rate 1/2).
pub const VITERBI_OUTPUT_BITS: usize = VITERBI_INPUT_LEN / 2;

/// Decoded bytes produced per Viterbi call, including the warm-up prefix.
pub const VITERBI_OUTPUT_BYTES: usize = VITERBI_OUTPUT_BITS / 8;

/// Decoded bytes discarded from the front of each Viterbi call (the 64
/// warm-up bits decode to 32 bits = 4 bytes of prefix).
pub const TAIL_SHIFT_BYTES: usize = TAIL_BYTES / 2 / 8;

/// Derandomized/RS-coded payload length following ASM strip.
pub const POST_ASM_SIZE: usize = FRAME_SIZE - SYNC_WORD_SIZE;

/// Final emitted data length per locked frame (ASM and RS parity stripped).
pub const OUTPUT_FRAME_SIZE: usize = FRAME_SIZE - RS_PARITY_BLOCK_SIZE - SYNC_WORD_SIZE;

/// Frames between forced full-width resync attempts.
pub const FLYWHEEL_LIMIT: u32 = 256;

/// Frames between EMA resets for the running RS/Viterbi correction averages.
pub const AVERAGE_LAST_N_SAMPLES: u64 = 8192;

/// Frames between telemetry snapshots.
pub const TELEMETRY_INTERVAL_FRAMES: u64 = 32;

/// Bytes of the most recent coded window included in a constellation snapshot.
pub const CONSTELLATION_SNAPSHOT_BYTES: usize = 200;

/// The CCSDS Attached Sync Marker.
pub const ASM: u32 = 0x1ACF_FC1D;
