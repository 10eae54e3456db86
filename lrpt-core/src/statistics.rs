//! Statistics Accumulator (C7): running counters and EMA quality metrics
//! surfaced to the host and to telemetry.

use serde::{Deserialize, Serialize};

use crate::constants::{AVERAGE_LAST_N_SAMPLES, FRAME_BITS, FRAME_SIZE, RS_BLOCKS};

/// A snapshot of decoder statistics, safe to serialize or copy out to a
/// telemetry subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Statistics {
    pub total_bytes: u64,
    pub total_bytes_read: u64,
    pub total_packets: u64,
    pub dropped_packets: u64,
    pub vcid: u8,
    pub packet_number: u32,
    pub sync_word: [u8; 4],
    pub signal_quality: u8,
    pub sync_correlation: u32,
    pub average_vit_corrections: f64,
    pub average_rs_corrections: [f64; RS_BLOCKS],
    pub frame_bits: u64,
    pub received_packets_per_channel: [u64; 64],
    frames_since_reset: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            frame_bits: FRAME_BITS as u64,
            ..Default::default()
        }
    }

    /// Called for every correlation at or above threshold, before RS.
    pub fn record_correlation(&mut self, bits_matching: u32) {
        self.total_packets += 1;
        self.sync_correlation = bits_matching;
    }

    pub fn record_bytes_read(&mut self, n: u64) {
        self.total_bytes_read += n;
    }

    /// Sets the known size of the input stream, e.g. from `fs::metadata`.
    /// Distinct from `total_bytes_read`, the running count of bytes actually
    /// consumed so far.
    pub fn set_total_bytes(&mut self, total: u64) {
        self.total_bytes = total;
    }

    /// Applies the C5 outcome policy.
    pub fn record_rs_outcome(&mut self, outcomes: &[Option<u8>; RS_BLOCKS]) {
        let any_recovered = outcomes.iter().any(Option::is_some);
        if !any_recovered {
            self.dropped_packets += 1;
            self.average_rs_corrections = [-1.0; RS_BLOCKS];
            return;
        }
        for (slot, outcome) in self.average_rs_corrections.iter_mut().zip(outcomes.iter()) {
            if let Some(errors) = outcome {
                *slot = (*slot + *errors as f64) / 2.0;
            }
        }
    }

    pub fn record_viterbi(&mut self, raw_errors: u32) {
        self.average_vit_corrections = (self.average_vit_corrections + raw_errors as f64) / 2.0;
    }

    /// Derives VCID, packet number, and sync word from a decoded,
    /// RS-corrected frame (pre ASM-strip). `any_recovered` gates the
    /// per-channel packet count, matching the source decoder's
    /// `if FrameLock { ReceivedPacketsPerChannel[VCID]++ }`.
    pub fn record_frame_fields(&mut self, decoded: &[u8; FRAME_SIZE], any_recovered: bool) {
        self.sync_word.copy_from_slice(&decoded[0..4]);
        self.vcid = decoded[4 + 1] & 0x3F;
        let be = u32::from_be_bytes([decoded[4 + 2], decoded[4 + 3], decoded[4 + 4], decoded[4 + 5]]);
        self.packet_number = (be & 0xFFFF_FF00) >> 8;
        if any_recovered && (self.vcid as usize) < self.received_packets_per_channel.len() {
            self.received_packets_per_channel[self.vcid as usize] += 1;
        }
    }

    /// Signal quality, forced to 0 when unlocked.
    pub fn update_signal_quality(&mut self, percent_ber: u32, frame_lock: bool) {
        if !frame_lock {
            self.signal_quality = 0;
            return;
        }
        let raw = 100i32 - 10 * percent_ber as i32;
        self.signal_quality = raw.clamp(0, 100) as u8;
    }

    /// Call once per frame; resets the RS/Viterbi EMAs every
    /// `AVERAGE_LAST_N_SAMPLES` frames.
    pub fn tick(&mut self) {
        self.frames_since_reset += 1;
        if self.frames_since_reset >= AVERAGE_LAST_N_SAMPLES {
            self.frames_since_reset = 0;
            self.average_rs_corrections = [0.0; RS_BLOCKS];
            self.average_vit_corrections = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_blocks_failing_marks_dropped_and_sets_sentinels() {
        let mut stats = Statistics::new();
        stats.record_rs_outcome(&[None, None, None, None]);
        assert_eq!(stats.dropped_packets, 1);
        assert_eq!(stats.average_rs_corrections, [-1.0; RS_BLOCKS]);
    }

    #[test]
    fn recovered_block_updates_ema() {
        let mut stats = Statistics::new();
        stats.record_rs_outcome(&[Some(2), None, Some(0), None]);
        assert_eq!(stats.average_rs_corrections[0], 1.0);
        assert_eq!(stats.average_rs_corrections[2], 0.0);
        assert_eq!(stats.average_rs_corrections[1], 0.0);
    }

    #[test]
    fn frame_fields_gate_channel_count_on_recovery() {
        let mut stats = Statistics::new();
        let mut decoded = [0u8; FRAME_SIZE];
        decoded[4 + 1] = 3;
        stats.record_frame_fields(&decoded, false);
        assert_eq!(stats.vcid, 3);
        assert_eq!(stats.received_packets_per_channel[3], 0);
        stats.record_frame_fields(&decoded, true);
        assert_eq!(stats.received_packets_per_channel[3], 1);
    }

    #[test]
    fn set_total_bytes_is_independent_of_bytes_read() {
        let mut stats = Statistics::new();
        stats.set_total_bytes(4096);
        stats.record_bytes_read(1024);
        assert_eq!(stats.total_bytes, 4096);
        assert_eq!(stats.total_bytes_read, 1024);
    }

    #[test]
    fn signal_quality_zero_when_unlocked() {
        let mut stats = Statistics::new();
        stats.update_signal_quality(0, false);
        assert_eq!(stats.signal_quality, 0);
    }

    #[test]
    fn signal_quality_clamped_to_range() {
        let mut stats = Statistics::new();
        stats.update_signal_quality(20, true);
        assert_eq!(stats.signal_quality, 0);
        stats.update_signal_quality(0, true);
        assert_eq!(stats.signal_quality, 100);
    }

    #[test]
    fn ema_resets_after_n_samples() {
        let mut stats = Statistics::new();
        stats.average_vit_corrections = 7.0;
        for _ in 0..AVERAGE_LAST_N_SAMPLES {
            stats.tick();
        }
        assert_eq!(stats.average_vit_corrections, 0.0);
    }
}
