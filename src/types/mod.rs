//! Core type definitions using newtype patterns for type safety.
//!
//! Probe inputs are validated once, at construction, so the prober never
//! sees an empty host, a non-numeric port or a zero timeout.

mod port;
mod run_id;
mod target;

pub use port::Port;
pub use run_id::{RunId, RunIdError};
pub use target::{Host, ProbeTarget};
