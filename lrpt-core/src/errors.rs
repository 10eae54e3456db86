//! Error types for the LRPT decode pipeline.

use thiserror::Error;

/// Top-level error type for all lrpt-core operations.
#[derive(Debug, Error)]
pub enum LrptError {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("synchronization error: {0}")]
    Sync(#[from] SyncError),

    #[error("Reed-Solomon error: {0}")]
    ReedSolomon(#[from] RsError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while opening, reading, or writing decode streams.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open input {path}: {source}")]
    OpenInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat input {path}: {source}")]
    StatInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output {path}: {source}")]
    CreateOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("short read: needed {needed} bytes, got {got}")]
    ShortRead { needed: usize, got: usize },

    #[error("failed to write decoded frame: {source}")]
    WriteFrame {
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the sync correlator and flywheel state machine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("correlation below threshold: {bits} bits matched, minimum is {minimum}")]
    BelowThreshold { bits: u32, minimum: u32 },

    #[error("window too short for correlation: need at least {needed} bytes, have {available}")]
    WindowTooShort { needed: usize, available: usize },
}

/// Errors raised by the interleaved Reed-Solomon decoder.
#[derive(Debug, Error)]
pub enum RsError {
    #[error("block {index} is uncorrectable: {reason}")]
    Uncorrectable { index: usize, reason: String },

    #[error("all {count} interleaved blocks failed correction")]
    AllBlocksFailed { count: usize },
}

/// Errors raised while pushing telemetry to a sink.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to publish {kind} snapshot: {reason}")]
    PublishFailed { kind: &'static str, reason: String },
}

/// Configuration and construction errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Result type alias for lrpt-core operations.
pub type Result<T> = std::result::Result<T, LrptError>;
