//! Configuration management for infraprobe.
//!
//! Provides XDG-compliant application settings and the suite files that
//! describe what to deploy and verify.

mod settings;
mod suite;

pub use settings::{AppSettings, Paths};
pub use suite::{ExposureRule, InstanceSpec, SuiteConfig};
