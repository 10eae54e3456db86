//! Structured logging for the CLI host: run-level events and the final
//! statistics summary, distinct from `lrpt-core`'s internal `SignalLogger`.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use lrpt_core::Statistics;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// Final statistics for a completed (or cancelled) run.
    Statistics(StatisticsEvent),

    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub statistics: Statistics,
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config.file_path.as_ref().ok_or_else(|| {
                    color_eyre::eyre::eyre!("file path required for file logging")
                })?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::Statistics(s) => format!(
                "ts=\"{}\" type=statistics duration_secs={:.2} total_packets={} dropped_packets={} vcid={} signal_quality={}",
                ts, s.duration_secs, s.statistics.total_packets, s.statistics.dropped_packets,
                s.statistics.vcid, s.statistics.signal_quality
            ),
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d),
                None => format!("ts=\"{}\" level=error msg=\"{}\"", ts, message),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::Statistics(s) => format!(
                "[{}] STATISTICS ({:.2}s): packets={} dropped={} vcid={} signal_quality={}",
                ts,
                s.duration_secs,
                s.statistics.total_packets,
                s.statistics.dropped_packets,
                s.statistics.vcid,
                s.statistics.signal_quality
            ),
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{}] ERROR: {} | {}", ts, message, d),
                None => format!("[{}] ERROR: {}", ts, message),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
