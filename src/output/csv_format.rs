//! CSV output formatting.

use crate::probe::ProbeReport;
use crate::storage::RunRecord;
use std::io;

fn finish(wtr: csv::Writer<Vec<u8>>) -> io::Result<String> {
    let bytes = wtr.into_inner().map_err(|e| io::Error::other(e.to_string()))?;
    String::from_utf8(bytes).map_err(io::Error::other)
}

/// One header row and one data row for a probe.
pub fn probe_csv(report: &ProbeReport) -> io::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["target", "outcome", "elapsed_ms", "passed", "diagnostic"])?;
    wtr.write_record([
        report.target.as_str(),
        report.outcome.to_string().as_str(),
        report.elapsed_ms.to_string().as_str(),
        report.passed.map_or(String::new(), |p| p.to_string()).as_str(),
        report.diagnostic.as_str(),
    ])?;

    finish(wtr)
}

/// One row per check of a suite run.
pub fn run_csv(record: &RunRecord) -> io::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["run_id", "check", "subject", "passed", "detail"])?;
    let id = record.id.to_string();
    for check in &record.report.checks {
        wtr.write_record([
            id.as_str(),
            check.check.to_string().as_str(),
            check.subject.as_str(),
            check.passed.to_string().as_str(),
            check.detail.as_str(),
        ])?;
    }

    finish(wtr)
}
