//! Subcommand implementations.

pub mod compress;
pub mod migrate;
