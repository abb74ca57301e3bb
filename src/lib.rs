//! # infraprobe - Integration Tests for Network-Isolated Infrastructure
//!
//! infraprobe deploys a Terraform or Terragrunt module, checks what came up,
//! and tears it down again. The central check is a reachability probe: a
//! TCP connection attempt bounded by a timeout, whose outcome is one of
//! reachable, blocked (no answer within the window) or failed.
//!
//! ## Features
//!
//! - **Bounded Probes**: Timeouts are classified structurally, never by
//!   matching error text
//! - **Scoped Deployments**: Apply once, run every check, destroy always,
//!   even when a check panics
//! - **Placement Checks**: Instances running, inside the VPC, in their own
//!   subnet only
//! - **Run History**: Every run saved as JSON and exportable as JSON or CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use infraprobe::probe::{self, Expectation};
//! use infraprobe::types::ProbeTarget;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = ProbeTarget::new("192.168.2.20", "5432", Duration::from_secs(2))?;
//!     let result = probe::probe(&target).await;
//!
//!     let verdict = result.verdict(Expectation::Blocked);
//!     println!("{}: {}", target, verdict.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated inputs: ports, hosts, probe targets, run IDs
//! - [`probe`] - The timeout-bounded TCP probe and its verdicts
//! - [`network`] - CIDR containment
//! - [`provision`] - The `Provisioner` trait, the Terraform driver and
//!   scoped deployments
//! - [`cloud`] - Instance state lookup
//! - [`suite`] - The verification checks run against a deployment
//! - [`config`] - Application settings and suite files
//! - [`storage`] - Run history persistence
//! - [`output`] - Plain, JSON and CSV rendering
//! - [`error`] - Error types per concern

pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod probe;
pub mod provision;
pub mod storage;
pub mod suite;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ProbeError, ProvisionError};
pub use probe::{probe, Expectation, ProbeOutcome, ProbeResult, Verdict};
pub use provision::{with_deployment, Deployment, Provisioner, Teardown, Terraform};
pub use types::{Host, Port, ProbeTarget, RunId};
