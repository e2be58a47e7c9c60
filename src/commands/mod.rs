//! CLI command implementations for herakles-memory-collector.
//!
//! This module provides implementations for all CLI subcommands:
//! - `collect`: Single collection cycle
//! - `check`: Source and configuration validation
//! - `config`: Configuration file generation
//! - `units`: Unit listing

pub mod check;
pub mod collect;
pub mod config;
pub mod units;

// Re-export command functions
pub use check::command_check;
pub use collect::command_collect;
pub use config::command_config;
pub use units::command_units;
