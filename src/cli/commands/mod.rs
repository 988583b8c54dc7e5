//! CLI command implementations

pub mod cdf;
pub mod completions;
pub mod config;
pub mod curve;
pub mod forecast;
pub mod init;
pub mod rank;
pub mod simulate;
