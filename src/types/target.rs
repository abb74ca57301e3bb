//! Probe target specification.
//!
//! A `ProbeTarget` is the validated input of a single reachability probe:
//! - a host, either an IP literal (IPv4 or IPv6) or a hostname
//! - a port, given as a numeric string
//! - a strictly positive timeout

use crate::error::ProbeError;
use crate::types::Port;
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// The host part of a probe target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    /// An IP literal; no resolution needed.
    Ip(IpAddr),
    /// A hostname to be resolved at probe time.
    Name(String),
}

impl Host {
    /// Parse a host string.
    pub fn parse(s: &str) -> Result<Self, ProbeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProbeError::EmptyHost);
        }

        // Accept bracketed IPv6 as written in URLs
        let unbracketed = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);
        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Name(s.to_string()));
        }

        Err(ProbeError::InvalidHost(s.to_string()))
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Validated input for one reachability probe. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    host: Host,
    port: Port,
    timeout: Duration,
}

impl ProbeTarget {
    /// Build a target from a host string, a numeric port string and a timeout.
    ///
    /// A zero timeout is rejected rather than treated as an immediate timeout.
    pub fn new(host: &str, port: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let host = Host::parse(host)?;
        let port: Port = port.parse()?;
        Self::from_parts(host, port, timeout)
    }

    /// Build a target from already-validated parts.
    pub fn from_parts(host: Host, port: Port, timeout: Duration) -> Result<Self, ProbeError> {
        if timeout.is_zero() {
            return Err(ProbeError::InvalidTimeout);
        }
        Ok(Self {
            host,
            port,
            timeout,
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the target to a socket address.
    ///
    /// IP literals resolve immediately. Hostnames go through DNS and the
    /// first returned address is used.
    pub async fn resolve(&self) -> Result<SocketAddr, String> {
        let ip = match &self.host {
            Host::Ip(ip) => *ip,
            Host::Name(name) => {
                let resolver = TokioAsyncResolver::tokio(
                    ResolverConfig::default(),
                    ResolverOpts::default(),
                );

                let response = resolver
                    .lookup_ip(name.as_str())
                    .await
                    .map_err(|e| format!("failed to resolve hostname '{}': {}", name, e))?;

                response
                    .iter()
                    .next()
                    .ok_or_else(|| format!("no IP addresses found for hostname '{}'", name))?
            }
        };
        Ok(SocketAddr::new(ip, self.port.as_u16()))
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Host::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

impl Serialize for ProbeTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        // Can only contain alphanumeric and hyphens
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
