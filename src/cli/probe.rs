//! Probe subcommand implementation.
//!
//! Handles `infraprobe probe <host>`: one bounded TCP connection attempt,
//! optionally judged against an expectation.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::probe::{self, Expectation, ProbeReport};
use crate::types::ProbeTarget;
use clap::Parser;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probe whether a TCP port answers within a timeout.
#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Host to probe (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Port to probe [default: from settings, usually 5432]
    #[arg(short, long)]
    pub port: Option<String>,

    /// Timeout in milliseconds [default: from settings, usually 2000]
    #[arg(short = 't', long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Expected outcome; the command fails when it does not hold
    #[arg(long, value_enum)]
    pub expect: Option<Expectation>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl ProbeCommand {
    /// Execute the probe command.
    pub async fn execute(&self, settings: &AppSettings) -> CliResult<()> {
        let port = self.port.as_deref().unwrap_or(&settings.default_port);
        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.default_timeout());

        let target = ProbeTarget::new(&self.host, port, timeout)?;
        debug!(host = %self.host, port, timeout_ms = timeout.as_millis() as u64, "probing");

        let started = Instant::now();
        let result = probe::probe(&target).await;
        let mut report = ProbeReport::new(&target, &result, started.elapsed());

        let verdict = self.expect.map(|expect| (expect, result.verdict(expect)));
        if let Some((expect, verdict)) = &verdict {
            report = report.with_verdict(*expect, verdict);
        }

        let rendered = output::render_probe(&report, self.output)?;
        if rendered.ends_with('\n') {
            print!("{}", rendered);
        } else {
            println!("{}", rendered);
        }

        match verdict {
            Some((_, verdict)) if !verdict.passed() => Err(CliError::ChecksFailed(1)),
            _ => Ok(()),
        }
    }
}
