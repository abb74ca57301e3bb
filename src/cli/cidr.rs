//! Cidr subcommand implementation.

use crate::error::CliResult;
use crate::network::cidr_contains;
use clap::Parser;

/// Check whether an address or block lies inside another block.
///
/// Prints `true` or `false`.
#[derive(Parser, Debug)]
pub struct CidrCommand {
    /// Address or CIDR block to test (e.g. 192.168.1.7 or 192.168.1.0/24)
    #[arg(value_name = "ADDR_OR_BLOCK")]
    pub inner: String,

    /// Enclosing CIDR block (e.g. 192.168.0.0/16)
    #[arg(value_name = "BLOCK")]
    pub outer: String,
}

impl CidrCommand {
    /// Execute the cidr command.
    pub fn execute(&self) -> CliResult<()> {
        println!("{}", cidr_contains(&self.inner, &self.outer)?);
        Ok(())
    }
}
