//! Reachability probing.
//!
//! A probe is one bounded TCP connect attempt. Its result is always one of
//! three outcomes:
//!
//! - [`ProbeResult::Reachable`]: the connection was established (and closed)
//! - [`ProbeResult::Blocked`]: the attempt did not finish within the timeout
//! - [`ProbeResult::Failed`]: any other network error
//!
//! Whether an outcome is good news depends on the caller. A database port
//! is expected to be [`Expectation::Blocked`] from the internet, so a
//! successful connection there is a failure.

mod tcp;

pub use tcp::probe;

use crate::types::ProbeTarget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// A connection that was established and then closed by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Address the probe connected to.
    pub peer: SocketAddr,
    /// Local end of the connection, when the OS reported it.
    pub local: Option<SocketAddr>,
    /// Time from the start of the attempt to an established connection.
    pub connect_time: Duration,
}

/// Category of a non-timeout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The host answered with a reset: nothing listening.
    Refused,
    /// The hostname could not be resolved.
    Resolution,
    /// No route to the host or network.
    Unreachable,
    /// Anything else.
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused => write!(f, "connection refused"),
            Self::Resolution => write!(f, "resolution failed"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::Other => write!(f, "error"),
        }
    }
}

/// A probe failure other than a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Classified outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// Connected before the timeout. The stream is already closed.
    Reachable(Connection),
    /// The attempt timed out; carries the timeout diagnostic.
    Blocked(String),
    /// A different network error occurred.
    Failed(ProbeFailure),
}

impl ProbeResult {
    /// The fieldless outcome.
    pub fn outcome(&self) -> ProbeOutcome {
        match self {
            Self::Reachable(_) => ProbeOutcome::Reachable,
            Self::Blocked(_) => ProbeOutcome::Blocked,
            Self::Failed(_) => ProbeOutcome::Failed,
        }
    }

    /// Human-readable description suitable for test-failure reporting.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Reachable(conn) => format!(
                "connected to {} in {} ms",
                conn.peer,
                conn.connect_time.as_millis()
            ),
            Self::Blocked(reason) => reason.clone(),
            Self::Failed(failure) => failure.message.clone(),
        }
    }

    /// Judge this result against what the caller expected.
    pub fn verdict(&self, expect: Expectation) -> Verdict {
        match (expect, self) {
            (Expectation::Blocked, Self::Blocked(_)) => {
                Verdict::Pass("not reachable, as expected".to_string())
            }
            (Expectation::Blocked, Self::Reachable(conn)) => Verdict::Fail(format!(
                "unexpected successful connection to {}",
                conn.peer
            )),
            (Expectation::Reachable, Self::Reachable(conn)) => {
                Verdict::Pass(format!("reachable at {}", conn.peer))
            }
            (Expectation::Reachable, Self::Blocked(reason)) => {
                Verdict::Fail(format!("expected a connection: {}", reason))
            }
            (_, Self::Failed(failure)) => {
                Verdict::Fail(format!("unexpected error: {}", failure.message))
            }
        }
    }
}

/// Fieldless mirror of [`ProbeResult`] for reports and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    Reachable,
    Blocked,
    Failed,
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable => write!(f, "reachable"),
            Self::Blocked => write!(f, "blocked"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What the caller wants a probe to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    /// The port should accept connections.
    Reachable,
    /// The port should not be reachable (timeout).
    Blocked,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable => write!(f, "reachable"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

/// Pass or fail, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(String),
    Fail(String),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Pass(msg) | Self::Fail(msg) => msg,
        }
    }
}

/// Serializable record of one probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub target: String,
    pub timeout_ms: u64,
    pub outcome: ProbeOutcome,
    pub diagnostic: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expectation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

impl ProbeReport {
    /// Build a report from a finished probe.
    pub fn new(target: &ProbeTarget, result: &ProbeResult, elapsed: Duration) -> Self {
        Self {
            target: target.to_string(),
            timeout_ms: target.timeout().as_millis() as u64,
            outcome: result.outcome(),
            diagnostic: result.diagnostic(),
            elapsed_ms: elapsed.as_millis() as u64,
            expected: None,
            passed: None,
        }
    }

    /// Record the expectation and the verdict reached against it.
    pub fn with_verdict(mut self, expect: Expectation, verdict: &Verdict) -> Self {
        self.expected = Some(expect);
        self.passed = Some(verdict.passed());
        self.diagnostic = format!("{} ({})", verdict.message(), self.diagnostic);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reachable() -> ProbeResult {
        ProbeResult::Reachable(Connection {
            peer: "10.0.0.5:5432".parse().unwrap(),
            local: None,
            connect_time: Duration::from_millis(3),
        })
    }

    fn refused() -> ProbeResult {
        ProbeResult::Failed(ProbeFailure {
            kind: FailureKind::Refused,
            message: "connect to 10.0.0.5:5432: connection refused".to_string(),
        })
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(reachable().outcome(), ProbeOutcome::Reachable);
        assert_eq!(
            ProbeResult::Blocked("timed out".into()).outcome(),
            ProbeOutcome::Blocked
        );
        assert_eq!(refused().outcome(), ProbeOutcome::Failed);
    }

    #[test]
    fn test_expect_blocked() {
        let blocked = ProbeResult::Blocked("timed out after 2000 ms".into());
        assert!(blocked.verdict(Expectation::Blocked).passed());

        let verdict = reachable().verdict(Expectation::Blocked);
        assert!(!verdict.passed());
        assert!(verdict.message().contains("unexpected successful connection"));

        let verdict = refused().verdict(Expectation::Blocked);
        assert!(!verdict.passed());
        assert!(verdict.message().starts_with("unexpected error"));
    }

    #[test]
    fn test_expect_reachable() {
        assert!(reachable().verdict(Expectation::Reachable).passed());
        assert!(!ProbeResult::Blocked("t".into())
            .verdict(Expectation::Reachable)
            .passed());
        assert!(!refused().verdict(Expectation::Reachable).passed());
    }

    #[test]
    fn test_report_with_verdict() {
        let target = ProbeTarget::new("10.0.0.5", "5432", Duration::from_secs(2)).unwrap();
        let result = ProbeResult::Blocked("timed out after 2000 ms".into());
        let verdict = result.verdict(Expectation::Blocked);
        let report = ProbeReport::new(&target, &result, Duration::from_millis(2001))
            .with_verdict(Expectation::Blocked, &verdict);

        assert_eq!(report.outcome, ProbeOutcome::Blocked);
        assert_eq!(report.timeout_ms, 2000);
        assert_eq!(report.passed, Some(true));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["target"], "10.0.0.5:5432");
        assert_eq!(json["expected"], "blocked");
    }
}
