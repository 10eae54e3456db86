//! A `TelemetrySink` implementation for the CLI host: writes each push as a
//! newline-delimited JSON record. Transport beyond a local file or stdout
//! (websockets, HTTP) is left to whatever wraps this binary.

use std::io::Write;

use lrpt_core::telemetry::{ConstellationSample, StatisticsSnapshot, TelemetrySink};

pub struct JsonlTelemetrySink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlTelemetrySink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> TelemetrySink for JsonlTelemetrySink<W> {
    fn push_constellation(
        &mut self,
        sample: ConstellationSample,
    ) -> Result<(), lrpt_core::errors::TelemetryError> {
        self.write_line("constellation", &sample)
    }

    fn push_statistics(
        &mut self,
        snapshot: StatisticsSnapshot,
    ) -> Result<(), lrpt_core::errors::TelemetryError> {
        self.write_line("statistics", &snapshot)
    }
}

impl<W: Write + Send> JsonlTelemetrySink<W> {
    fn write_line<T: serde::Serialize>(
        &mut self,
        kind: &'static str,
        value: &T,
    ) -> Result<(), lrpt_core::errors::TelemetryError> {
        let line = serde_json::to_string(value).map_err(|e| {
            lrpt_core::errors::TelemetryError::PublishFailed {
                kind,
                reason: e.to_string(),
            }
        })?;
        writeln!(self.writer, "{}", line).map_err(|e| {
            lrpt_core::errors::TelemetryError::PublishFailed {
                kind,
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_are_newline_delimited_json() {
        let mut sink = JsonlTelemetrySink::new(Vec::new());
        sink.push_constellation(ConstellationSample::capture(1, &[1, 2, 3]))
            .unwrap();
        sink.push_statistics(StatisticsSnapshot {
            frame_index: 1,
            statistics: lrpt_core::Statistics::new(),
        })
        .unwrap();
        let out = String::from_utf8(sink.writer).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(serde_json::from_str::<serde_json::Value>(out.lines().next().unwrap()).is_ok());
    }
}
