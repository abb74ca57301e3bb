//! Suite run persistence.
//!
//! Provides JSON-based storage for run records with query capabilities.

mod json_store;

pub use json_store::{RunRecord, RunStore};
