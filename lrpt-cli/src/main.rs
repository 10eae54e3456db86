//! Command-line host for `lrpt-core`: reads a stream of bias-128 soft
//! symbols from a file, decodes it into CCSDS transfer frames, and writes
//! them to an output file.

mod config;
mod logging;
mod telemetry;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use lrpt_core::{Decoder, DecoderConfig};

use config::CliConfig;
use logging::{LogEvent, StatisticsEvent, StructuredLogger};
use telemetry::JsonlTelemetrySink;

/// Decode a recorded LRPT soft-symbol stream into CCSDS transfer frames.
#[derive(Parser, Debug)]
#[command(name = "lrpt", version, about)]
struct Cli {
    /// Path to the input soft-symbol stream (bias-128 bytes)
    input: PathBuf,

    /// Path to write decoded CCSDS transfer frames to
    output: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug-level logging, overriding the config file
    #[arg(short, long)]
    verbose: bool,

    /// Write constellation and statistics telemetry as JSON lines to this file
    #[arg(long)]
    telemetry_out: Option<PathBuf>,

    /// Disable the progress bar (useful when output is piped or scripted)
    #[arg(long)]
    no_progress: bool,
}

/// Wraps a reader to drive a progress bar off the number of bytes consumed.
struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bar.inc(n as u64);
        Ok(n)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut cli_config = match &cli.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    if cli.verbose {
        cli_config.logging.level = config::LogLevel::Debug;
    }

    let mut logger = StructuredLogger::new(cli_config.logging.clone())?;

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_for_handler.store(true, Ordering::Relaxed);
    })
    .wrap_err("failed to install Ctrl-C handler")?;

    let input_file = File::open(&cli.input)
        .wrap_err_with(|| format!("failed to open input {}", cli.input.display()))?;
    let input_len = input_file
        .metadata()
        .wrap_err("failed to stat input file")?
        .len();
    let output_file = File::create(&cli.output)
        .wrap_err_with(|| format!("failed to create output {}", cli.output.display()))?;

    let bar = if cli.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(input_len);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        bar
    };

    let mut reader = ProgressReader {
        inner: BufReader::new(input_file),
        bar: bar.clone(),
    };
    let mut writer = BufWriter::new(output_file);

    let telemetry_enabled = cli.telemetry_out.is_some();
    let mut telemetry_sink = cli
        .telemetry_out
        .as_ref()
        .map(|path| -> Result<JsonlTelemetrySink<BufWriter<File>>> {
            let file = File::create(path).wrap_err_with(|| {
                format!("failed to create telemetry output {}", path.display())
            })?;
            Ok(JsonlTelemetrySink::new(BufWriter::new(file)))
        })
        .transpose()?;

    let decoder_config = DecoderConfig::new(cli.input.display().to_string())
        .with_telemetry(telemetry_enabled)
        .with_log_config(cli_config.logging.to_core_log_config());
    let mut decoder = Decoder::new(decoder_config);
    decoder.set_input_size(input_len);

    logger.log(LogEvent::Info {
        message: format!(
            "decoding {} -> {}",
            cli.input.display(),
            cli.output.display()
        ),
    })?;

    let run_result = decoder.run(
        &mut reader,
        &mut writer,
        &cancel,
        telemetry_sink
            .as_mut()
            .map(|s| s as &mut dyn lrpt_core::telemetry::TelemetrySink),
    );

    bar.finish_and_clear();

    match run_result {
        Ok(()) => {}
        Err(e) => {
            logger.log(LogEvent::Error {
                message: "decode run failed".to_string(),
                details: Some(e.to_string()),
            })?;
            return Err(e.into());
        }
    }

    logger.log(LogEvent::Statistics(StatisticsEvent {
        timestamp: Utc::now(),
        duration_secs: logger.elapsed(),
        statistics: decoder.statistics().clone(),
    }))?;

    Ok(())
}
