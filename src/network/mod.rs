//! Address and network-block helpers.

mod cidr;

pub use cidr::{cidr_contains, parse_network};
