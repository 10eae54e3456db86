//! lrpt-core: frame synchronization and FEC decoding for CCSDS-derived LRPT
//! downlinks.
//!
//! Ingests a stream of bias-128 soft symbols and recovers 892-byte CCSDS
//! transfer frames via byte-level sync correlation across the four QPSK
//! phase/IQ ambiguities, K=7 rate-1/2 Viterbi decoding with tail-carry,
//! CCSDS derandomization, and 4-way interleaved RS(255,223) correction. See
//! [`decoder::Decoder`] for the canonical entry point.

pub mod config;
pub mod constants;
pub mod decoder;
pub mod derandomize;
pub mod errors;
pub mod flywheel;
pub mod logging;
pub mod packet_fixer;
pub mod reed_solomon;
pub mod sink;
pub mod statistics;
pub mod sync;
pub mod telemetry;
pub mod viterbi;

pub use config::DecoderConfig;
pub use decoder::{decode, new_decoder, Decoder};
pub use errors::{LrptError, Result};
pub use statistics::Statistics;
