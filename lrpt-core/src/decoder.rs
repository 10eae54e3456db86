//! The canonical LRPT decoder. This is the only way soft-symbol bytes flow
//! through the pipeline; the file-path-based [`decode`] free function and any
//! future host bindings are thin wrappers around [`Decoder::run`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::DecoderConfig;
use crate::constants::{
    CODED_FRAME_SIZE, FRAME_SIZE, NEUTRAL_SOFT_BYTE, OUTPUT_FRAME_SIZE, SYNC_WORD_SIZE,
    TAIL_BYTES, TAIL_SHIFT_BYTES, TELEMETRY_INTERVAL_FRAMES, VITERBI_INPUT_LEN,
};
use crate::derandomize;
use crate::errors::{IoError, LrptError};
use crate::flywheel::Flywheel;
use crate::logging::SignalLogger;
use crate::packet_fixer::{self, Phase};
use crate::reed_solomon;
use crate::statistics::Statistics;
use crate::sync;
use crate::telemetry::{ConstellationSample, StatisticsSnapshot, TelemetrySink};
use crate::viterbi;

/// Outcome of a single attempted fill from the input stream: either the
/// buffer was filled completely, or the stream hit EOF partway through.
enum Fill {
    Full,
    Eof,
}

fn fill_buffer<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<(Fill, usize)> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok((Fill::Eof, filled));
        }
        filled += n;
    }
    Ok((Fill::Full, filled))
}

/// Fills `buf` from `input`, recording the bytes actually read into `stats`.
/// Returns `true` if `buf` was filled completely, `false` on a clean EOF
/// with nothing read. A non-empty partial fill means the stream ended
/// mid-frame and is reported as [`IoError::ShortRead`].
fn fill_or_eof<R: Read>(
    input: &mut R,
    buf: &mut [u8],
    stats: &mut Statistics,
    id: &str,
) -> Result<bool, LrptError> {
    let (fill, n) = fill_buffer(input, buf).map_err(|source| IoError::StatInput {
        path: id.to_string(),
        source,
    })?;
    stats.record_bytes_read(n as u64);
    match fill {
        Fill::Full => Ok(true),
        Fill::Eof if n == 0 => Ok(false),
        Fill::Eof => Err(IoError::ShortRead {
            needed: buf.len(),
            got: n,
        }
        .into()),
    }
}

/// A decoder bound to one input/output pair and an optional telemetry sink.
/// Buffers are allocated once at construction and reused for every frame.
pub struct Decoder {
    config: DecoderConfig,
    logger: SignalLogger,
    flywheel: Flywheel,
    stats: Statistics,
    frame_index: u64,

    coded_data: Vec<u8>,
    raw_coded_data: Vec<u8>,
    viterbi_input: Vec<u8>,
    last_frame_tail: [u8; TAIL_BYTES],
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        let logger = SignalLogger::new(config.log_config.clone());
        Self {
            config,
            logger,
            flywheel: Flywheel::new(),
            stats: Statistics::new(),
            frame_index: 0,
            coded_data: vec![0u8; CODED_FRAME_SIZE],
            raw_coded_data: vec![0u8; CODED_FRAME_SIZE],
            viterbi_input: vec![0u8; VITERBI_INPUT_LEN],
            last_frame_tail: [NEUTRAL_SOFT_BYTE; TAIL_BYTES],
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Records the known size of the input stream (e.g. from `fs::metadata`)
    /// for `Statistics::total_bytes`. Distinct from the running
    /// `total_bytes_read` counter, which `run` updates as it consumes input.
    pub fn set_input_size(&mut self, total_bytes: u64) {
        self.stats.set_total_bytes(total_bytes);
    }

    /// Runs the pipeline until cancellation or input exhaustion. `telemetry`
    /// is pushed every [`TELEMETRY_INTERVAL_FRAMES`] frames; push failures
    /// are logged but never abort decoding.
    pub fn run<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        cancel: &AtomicBool,
        mut telemetry: Option<&mut dyn TelemetrySink>,
    ) -> Result<(), LrptError> {
        if !fill_or_eof(input, &mut self.coded_data, &mut self.stats, &self.config.id)? {
            return Ok(());
        }

        loop {
            if cancel.load(Ordering::Relaxed) {
                break;
            }

            let forced = self.flywheel.begin_frame();
            let locked_and_not_forced = self.flywheel.frame_lock() && !forced;

            let correlation = if locked_and_not_forced {
                let fast_len = sync::fast_recheck_length(CODED_FRAME_SIZE);
                let fast = sync::correlate(&self.coded_data, fast_len)
                    .expect("coded_data buffer is always >= 64 bytes");
                if fast.offset == 0 {
                    fast
                } else {
                    sync::correlate(&self.coded_data, CODED_FRAME_SIZE)
                        .expect("coded_data buffer is always >= 64 bytes")
                }
            } else {
                sync::correlate(&self.coded_data, CODED_FRAME_SIZE)
                    .expect("coded_data buffer is always >= 64 bytes")
            };

            if correlation.bits_matching < crate::constants::MIN_CORRELATION_BITS {
                self.logger.debug(
                    "SYNC",
                    format_args!(
                        "below-threshold correlation ({} bits), skipping frame",
                        correlation.bits_matching
                    ),
                );
                if fill_or_eof(input, &mut self.coded_data, &mut self.stats, &self.config.id)? {
                    continue;
                } else {
                    break;
                }
            }

            self.stats.record_correlation(correlation.bits_matching);
            self.flywheel.observe_offset(correlation.offset);

            if correlation.offset != 0 {
                self.coded_data.copy_within(correlation.offset.., 0);
                let fill_start = CODED_FRAME_SIZE - correlation.offset;
                if !fill_or_eof(
                    input,
                    &mut self.coded_data[fill_start..],
                    &mut self.stats,
                    &self.config.id,
                )? {
                    break;
                }
            }

            if self.config.telemetry_enabled {
                self.raw_coded_data.copy_from_slice(&self.coded_data);
            }

            let (phase, iq_inverted) = Phase::from_word_idx(correlation.word_idx);
            packet_fixer::correct(&mut self.coded_data, phase, iq_inverted);

            self.viterbi_input[..TAIL_BYTES].copy_from_slice(&self.last_frame_tail);
            self.viterbi_input[TAIL_BYTES..].copy_from_slice(&self.coded_data);

            let result = viterbi::decode(&self.viterbi_input);
            self.last_frame_tail.copy_from_slice(
                &self.viterbi_input[CODED_FRAME_SIZE..CODED_FRAME_SIZE + TAIL_BYTES],
            );

            let mut decoded_data = [0u8; FRAME_SIZE];
            decoded_data
                .copy_from_slice(&result.bytes[TAIL_SHIFT_BYTES..TAIL_SHIFT_BYTES + FRAME_SIZE]);

            derandomize::derandomize(&mut decoded_data[SYNC_WORD_SIZE..]);
            let outcomes = reed_solomon::decode_blocks(&mut decoded_data[SYNC_WORD_SIZE..]);
            let any_recovered = outcomes.iter().any(Option::is_some);

            self.flywheel.observe_rs_outcome(any_recovered);
            self.stats.record_viterbi(result.ber());
            self.stats.record_frame_fields(&decoded_data, any_recovered);
            self.stats
                .update_signal_quality(result.percent_ber(), self.flywheel.frame_lock());
            self.stats.record_rs_outcome(&outcomes);

            if any_recovered {
                let frame = &decoded_data[SYNC_WORD_SIZE..SYNC_WORD_SIZE + OUTPUT_FRAME_SIZE];
                crate::sink::write_frame(output, frame)?;
            } else {
                self.logger
                    .warn("RS", "all interleaves uncorrectable, dropping frame");
            }

            self.stats.tick();
            self.frame_index += 1;

            if self.config.telemetry_enabled && self.frame_index % TELEMETRY_INTERVAL_FRAMES == 0
            {
                if let Some(sink) = telemetry.as_deref_mut() {
                    if let Err(e) = sink.push_constellation(ConstellationSample::capture(
                        self.frame_index,
                        &self.raw_coded_data,
                    )) {
                        self.logger
                            .warn("TELEMETRY", format_args!("constellation push failed: {e}"));
                    }
                    if let Err(e) = sink.push_statistics(StatisticsSnapshot {
                        frame_index: self.frame_index,
                        statistics: self.stats.clone(),
                    }) {
                        self.logger
                            .warn("TELEMETRY", format_args!("statistics push failed: {e}"));
                    }
                }
            }

            if !fill_or_eof(input, &mut self.coded_data, &mut self.stats, &self.config.id)? {
                break;
            }
        }

        Ok(())
    }
}

/// Constructs a decoder bound to `id`, with telemetry disabled.
pub fn new_decoder(id: impl Into<String>) -> Decoder {
    Decoder::new(DecoderConfig::new(id))
}

/// Runs a decoder end to end over file paths. `cancel_flag` is polled once
/// per frame iteration.
pub fn decode(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    cancel_flag: &AtomicBool,
) -> Result<Statistics, LrptError> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input_file = File::open(input_path).map_err(|source| IoError::OpenInput {
        path: input_path.display().to_string(),
        source,
    })?;
    let input_len = input_file
        .metadata()
        .map_err(|source| IoError::StatInput {
            path: input_path.display().to_string(),
            source,
        })?
        .len();
    let output_file = File::create(output_path).map_err(|source| IoError::CreateOutput {
        path: output_path.display().to_string(),
        source,
    })?;

    let mut reader = BufReader::new(input_file);
    let mut writer = BufWriter::new(output_file);

    let mut decoder = new_decoder(input_path.display().to_string());
    decoder.set_input_size(input_len);
    decoder.run(&mut reader, &mut writer, cancel_flag, None)?;
    writer
        .flush()
        .map_err(|source| IoError::WriteFrame { source })?;

    Ok(decoder.statistics().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;

    fn conv_encode(bits: &[u8]) -> Vec<u8> {
        const G1: u8 = 0o171;
        const G2: u8 = 0o133;
        fn parity(mut v: u8) -> u8 {
            v ^= v >> 4;
            v ^= v >> 2;
            v ^= v >> 1;
            v & 1
        }
        let mut shift_reg = 0u8;
        let mut out = Vec::with_capacity(bits.len() * 2);
        for &bit in bits {
            shift_reg = ((shift_reg << 1) | bit) & 0x7F;
            let g1 = parity(shift_reg & G1);
            let g2 = parity(shift_reg & G2) ^ 1;
            out.push(if g1 == 1 { 0u8 } else { 255u8 });
            out.push(if g2 == 1 { 0u8 } else { 255u8 });
        }
        out
    }

    fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1))
            .collect()
    }

    /// Builds one CodedFrameSize-length soft-symbol window carrying a clean
    /// frame: ASM + 892 bytes of `fill`, CCSDS-derandomized, then Viterbi
    /// encoded. Parity bytes are left as whatever the derandomizer produces
    /// from zero input, so these fixtures exercise correlation, fixing, and
    /// Viterbi tail-carry without asserting a particular RS outcome.
    fn build_clean_frame(fill: u8) -> Vec<u8> {
        let mut frame = vec![0u8; FRAME_SIZE];
        frame[0..4].copy_from_slice(&crate::constants::ASM.to_be_bytes());
        for b in frame[4..4 + 892].iter_mut() {
            *b = fill;
        }
        let mut post_asm = frame[4..].to_vec();
        derandomize::derandomize(&mut post_asm);
        frame[4..].copy_from_slice(&post_asm);

        let bits = bytes_to_bits(&frame);
        let mut coded = conv_encode(&bits);
        coded.resize(CODED_FRAME_SIZE, NEUTRAL_SOFT_BYTE);
        coded
    }

    #[test]
    fn empty_input_produces_no_output_and_no_packets() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("s1");
        let cancel = AtomicBool::new(false);
        decoder.run(&mut input, &mut output, &cancel, None).unwrap();
        assert_eq!(output.into_inner().len(), 0);
        assert_eq!(decoder.statistics().total_packets, 0);
    }

    #[test]
    fn single_clean_frame_correlates_and_runs_through_rs() {
        let coded = build_clean_frame(0x5A);
        let mut input = Cursor::new(coded);
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("s2");
        let cancel = AtomicBool::new(false);
        decoder.run(&mut input, &mut output, &cancel, None).unwrap();
        assert_eq!(decoder.statistics().total_packets, 1);
        assert_eq!(
            decoder.statistics().sync_word,
            crate::constants::ASM.to_be_bytes()
        );
    }

    #[test]
    fn misaligned_frame_realigns_via_nonzero_offset() {
        let mut coded = vec![0u8; 37];
        coded.extend(build_clean_frame(0x5A));
        coded.truncate(CODED_FRAME_SIZE);
        let mut input = Cursor::new(coded);
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("s6");
        let cancel = AtomicBool::new(false);
        decoder.run(&mut input, &mut output, &cancel, None).unwrap();
        assert_eq!(decoder.statistics().total_packets, 1);
    }

    #[test]
    fn cancellation_stops_the_loop_before_processing() {
        let coded = build_clean_frame(0x5A);
        let mut input = Cursor::new(coded);
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("cancel");
        let cancel = AtomicBool::new(true);
        decoder.run(&mut input, &mut output, &cancel, None).unwrap();
        assert_eq!(decoder.statistics().total_packets, 0);
    }

    #[test]
    fn truncated_mid_frame_input_is_a_short_read_error() {
        let coded = vec![0u8; CODED_FRAME_SIZE - 10];
        let mut input = Cursor::new(coded);
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("truncated");
        let cancel = AtomicBool::new(false);
        let err = decoder.run(&mut input, &mut output, &cancel, None).unwrap_err();
        assert!(matches!(
            err,
            LrptError::Io(IoError::ShortRead {
                needed: CODED_FRAME_SIZE,
                got,
            }) if got == CODED_FRAME_SIZE - 10
        ));
    }

    #[test]
    fn input_size_and_bytes_read_are_tracked_independently() {
        let coded = build_clean_frame(0x5A);
        let mut input = Cursor::new(coded);
        let mut output = Cursor::new(Vec::new());
        let mut decoder = new_decoder("bytes-tracking");
        decoder.set_input_size(999_999);
        let cancel = AtomicBool::new(false);
        decoder.run(&mut input, &mut output, &cancel, None).unwrap();
        assert_eq!(decoder.statistics().total_bytes, 999_999);
        assert_eq!(
            decoder.statistics().total_bytes_read,
            CODED_FRAME_SIZE as u64
        );
    }
}
