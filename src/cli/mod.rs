//! CLI layer for scanstore.
//!
//! Provides the command-line interface using clap, with commands for
//! running the startup sequence and inspecting its results.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
