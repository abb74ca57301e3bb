//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of probe
//! reports and suite runs.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{probe_csv, run_csv};
pub use json_format::to_json;
pub use plain::{
    print_error, print_history, print_info, print_run_header, print_success, print_warning,
    probe_plain, run_plain,
};

use crate::cli::OutputFormat;
use crate::probe::ProbeReport;
use crate::storage::RunRecord;
use std::io;

/// Render a probe report in the requested format.
pub fn render_probe(report: &ProbeReport, format: OutputFormat) -> io::Result<String> {
    match format {
        OutputFormat::Plain => Ok(probe_plain(report)),
        OutputFormat::Json => to_json(report),
        OutputFormat::Csv => probe_csv(report),
    }
}

/// Render a suite run in the requested format.
pub fn render_run(record: &RunRecord, format: OutputFormat) -> io::Result<String> {
    match format {
        OutputFormat::Plain => Ok(run_plain(record)),
        OutputFormat::Json => to_json(record),
        OutputFormat::Csv => run_csv(record),
    }
}
