//! Cloud provider state.
//!
//! The verification suite only needs one question answered: what state is
//! the instance with this address in. [`InstanceLookup`] is that seam;
//! [`AwsCli`] answers it through the AWS command line tool.

mod aws_cli;

pub use aws_cli::AwsCli;

use crate::error::CloudResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Lifecycle state of a compute instance, as named by EC2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    /// A state name this crate does not know about.
    Unknown(String),
}

impl InstanceState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::ShuttingDown => write!(f, "shutting-down"),
            Self::Terminated => write!(f, "terminated"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unknown(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for InstanceState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl From<String> for InstanceState {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        state.to_string()
    }
}

/// Looks up the state of the instance holding an address.
#[async_trait]
pub trait InstanceLookup: Send + Sync {
    /// State of the instance with address `ip` in `region`.
    async fn instance_state(&self, ip: IpAddr, region: &str) -> CloudResult<InstanceState>;
}
