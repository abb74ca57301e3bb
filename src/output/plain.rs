//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::probe::{ProbeOutcome, ProbeReport};
use crate::storage::RunRecord;
use console::{style, Style};
use std::fmt::Write;

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Render a probe report.
pub fn probe_plain(report: &ProbeReport) -> String {
    let outcome_style = match report.outcome {
        ProbeOutcome::Reachable => Style::new().green().bold(),
        ProbeOutcome::Blocked => Style::new().yellow().bold(),
        ProbeOutcome::Failed => Style::new().red().bold(),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}",
        style(&report.target).white().bold(),
        outcome_style.apply_to(report.outcome),
        style(format!("({} ms)", report.elapsed_ms)).dim()
    );
    let _ = writeln!(out, "  {}", report.diagnostic);

    if let (Some(expected), Some(passed)) = (report.expected, report.passed) {
        let verdict = if passed {
            style("PASS").green().bold()
        } else {
            style("FAIL").red().bold()
        };
        let _ = writeln!(out, "  {} expected {}", verdict, expected);
    }

    out
}

/// Render a suite run as a results table.
pub fn run_plain(record: &RunRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style(RULE).cyan());
    let _ = writeln!(
        out,
        "                  {} Suite Results",
        style("infraprobe").cyan().bold()
    );
    let _ = writeln!(out, "{}", style(RULE).cyan());
    let _ = writeln!(out);

    let _ = writeln!(out, "  {} {}", style("Module:").bold(), record.terraform_dir);
    let _ = writeln!(out, "  {} {}", style("Region:").bold(), record.region);
    let _ = writeln!(
        out,
        "  {} {}",
        style("Run ID:").bold(),
        style(record.id.short()).dim()
    );
    let _ = writeln!(
        out,
        "  {} {:.2}s",
        style("Duration:").bold(),
        record.duration_ms() as f64 / 1000.0
    );
    let _ = writeln!(out);

    if let Some(error) = &record.provision_error {
        let _ = writeln!(
            out,
            "  {} {}",
            style("Provisioning failed:").red().bold(),
            error
        );
    }

    if record.report.checks.is_empty() {
        let _ = writeln!(out, "  {}", style("No checks ran.").dim());
    } else {
        let _ = writeln!(out, "  {}", style(THIN_RULE).dim());
        let _ = writeln!(
            out,
            "  {:<6}  {:<18}  {:<14}  {}",
            style("RESULT").bold(),
            style("CHECK").bold(),
            style("SUBJECT").bold(),
            style("DETAIL").bold()
        );
        let _ = writeln!(out, "  {}", style(THIN_RULE).dim());

        for check in &record.report.checks {
            let result = if check.passed {
                style("pass").green().bold()
            } else {
                style("FAIL").red().bold()
            };
            let _ = writeln!(
                out,
                "  {:<6}  {:<18}  {:<14}  {}",
                result,
                check.check.to_string(),
                check.subject,
                check.detail
            );
        }

        let _ = writeln!(out, "  {}", style(THIN_RULE).dim());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {} {} passed, {} failed",
        style("Summary:").bold(),
        style(record.report.passed_count()).green().bold(),
        style(record.report.failed_count()).red()
    );

    if let Some(error) = &record.teardown_error {
        let _ = writeln!(
            out,
            "  {} {}",
            style("Teardown failed:").red().bold(),
            error
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style(RULE).cyan());
    out
}

/// Print a banner before a suite run starts.
pub fn print_run_header(dir: &str, binary: &str, region: &str) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("infraprobe").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Module: {}", style("•").dim(), style(dir).white().bold());
    println!("{} Tool: {}", style("•").dim(), style(binary).yellow());
    println!("{} Region: {}", style("•").dim(), region);
    println!();
}

/// Print a list of past runs.
pub fn print_history(records: &[RunRecord]) {
    if records.is_empty() {
        println!("{}", style("No runs recorded.").dim());
        return;
    }

    for record in records {
        let status = if record.passed() {
            style("pass").green().bold()
        } else {
            style("FAIL").red().bold()
        };
        println!(
            "{}  {}  {}  {}",
            style(record.id.short()).dim(),
            record.started_at.format("%Y-%m-%d %H:%M"),
            status,
            record.summary()
        );
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    eprintln!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Expectation;
    use crate::suite::{CheckKind, CheckResult, SuiteReport};

    #[test]
    fn test_probe_plain_includes_verdict() {
        console::set_colors_enabled(false);
        let report = ProbeReport {
            target: "10.0.0.5:5432".to_string(),
            timeout_ms: 2000,
            outcome: ProbeOutcome::Blocked,
            diagnostic: "dial 10.0.0.5:5432: timed out after 2000 ms".to_string(),
            elapsed_ms: 2001,
            expected: Some(Expectation::Blocked),
            passed: Some(true),
        };

        let text = probe_plain(&report);
        assert!(text.contains("10.0.0.5:5432 blocked"));
        assert!(text.contains("PASS expected blocked"));
    }

    #[test]
    fn test_run_plain_lists_checks() {
        console::set_colors_enabled(false);
        let mut report = SuiteReport::default();
        report.push(CheckResult::fail(
            CheckKind::InstanceRunning,
            "db",
            "expected running, found stopped",
        ));
        let record = RunRecord::new("infra-module", "eu-north-1").finish(
            report,
            None,
            Some("destroy failed".to_string()),
        );

        let text = run_plain(&record);
        assert!(text.contains("instance-running"));
        assert!(text.contains("expected running, found stopped"));
        assert!(text.contains("Teardown failed: destroy failed"));
    }
}
