//! Configuration types for constructing a decoder.

use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;

/// Construction-time configuration for a single [`crate::decoder::Decoder`]
/// instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Identifies this decoder instance in logs and telemetry; arbitrary.
    pub id: String,
    /// Enables the telemetry push channels (see [`crate::telemetry`]).
    pub telemetry_enabled: bool,
    #[serde(skip)]
    pub log_config: LogConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            telemetry_enabled: false,
            log_config: LogConfig::default(),
        }
    }
}

impl DecoderConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }
}
