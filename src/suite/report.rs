//! Check results and suite reports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of check a suite runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    OutputPresent,
    InstanceRunning,
    VpcPlacement,
    SubnetPlacement,
    PortExposure,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputPresent => write!(f, "output-present"),
            Self::InstanceRunning => write!(f, "instance-running"),
            Self::VpcPlacement => write!(f, "vpc-placement"),
            Self::SubnetPlacement => write!(f, "subnet-placement"),
            Self::PortExposure => write!(f, "port-exposure"),
        }
    }
}

/// Result of one check against one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckKind,
    /// Instance name, or `instance:port` for exposure checks.
    pub subject: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn pass(check: CheckKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check,
            subject: subject.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(check: CheckKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check,
            subject: subject.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// All check results of one suite run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub checks: Vec<CheckResult>,
}

impl SuiteReport {
    pub fn push(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = CheckResult>) {
        self.checks.extend(results);
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count()
    }

    /// True when there is at least one check and none failed.
    pub fn all_passed(&self) -> bool {
        !self.checks.is_empty() && self.failed_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
