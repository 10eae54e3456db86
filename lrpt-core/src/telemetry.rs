//! Telemetry Sink: explicit, per-decoder scoped push channels for
//! constellation and statistics snapshots.
//!
//! The original implementation registered `http.HandleFunc` routes at
//! decoder construction time, tying each instance to a process-wide routing
//! table with no teardown story. Here a decoder instead holds an optional
//! `Box<dyn TelemetrySink>`; nothing is registered globally, and dropping the
//! decoder drops the sink. Transport (websockets, HTTP, etc.) is left to the
//! host — this crate only defines the push contract and the snapshot shapes.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::constants::CONSTELLATION_SNAPSHOT_BYTES;
use crate::errors::TelemetryError;
use crate::statistics::Statistics;

/// A base64-encoded snapshot of the most recent coded window, pushed every
/// `TELEMETRY_INTERVAL_FRAMES` frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstellationSample {
    pub frame_index: u64,
    pub data_base64: String,
}

impl ConstellationSample {
    pub fn capture(frame_index: u64, coded_data: &[u8]) -> Self {
        let take = coded_data.len().min(CONSTELLATION_SNAPSHOT_BYTES);
        let data_base64 = base64::engine::general_purpose::STANDARD.encode(&coded_data[..take]);
        Self {
            frame_index,
            data_base64,
        }
    }
}

/// A structured statistics snapshot, safe to serialize for a telemetry
/// subscriber. Readers must treat this as copy-on-read: it is a value type,
/// not a handle into live decoder state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub frame_index: u64,
    pub statistics: Statistics,
}

/// Implemented by telemetry transports. A decoder with no sink must behave
/// identically to one whose sink always returns `Ok`; push failures are
/// suppressed by the caller (see [`crate::errors::TelemetryError`]).
pub trait TelemetrySink: Send {
    fn push_constellation(&mut self, sample: ConstellationSample) -> Result<(), TelemetryError>;
    fn push_statistics(&mut self, snapshot: StatisticsSnapshot) -> Result<(), TelemetryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording {
        constellations: Vec<ConstellationSample>,
        stats: Vec<StatisticsSnapshot>,
    }

    impl TelemetrySink for Recording {
        fn push_constellation(
            &mut self,
            sample: ConstellationSample,
        ) -> Result<(), TelemetryError> {
            self.constellations.push(sample);
            Ok(())
        }
        fn push_statistics(&mut self, snapshot: StatisticsSnapshot) -> Result<(), TelemetryError> {
            self.stats.push(snapshot);
            Ok(())
        }
    }

    #[test]
    fn capture_truncates_to_snapshot_length() {
        let data = vec![7u8; 500];
        let sample = ConstellationSample::capture(3, &data);
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(sample.data_base64)
            .unwrap();
        assert_eq!(decoded.len(), CONSTELLATION_SNAPSHOT_BYTES);
    }

    #[test]
    fn sink_receives_pushes() {
        let mut sink = Recording {
            constellations: Vec::new(),
            stats: Vec::new(),
        };
        sink.push_constellation(ConstellationSample::capture(0, &[1, 2, 3]))
            .unwrap();
        sink.push_statistics(StatisticsSnapshot {
            frame_index: 0,
            statistics: Statistics::new(),
        })
        .unwrap();
        assert_eq!(sink.constellations.len(), 1);
        assert_eq!(sink.stats.len(), 1);
    }
}
