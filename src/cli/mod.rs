//! CLI module for the ds-ec2 planner.
//!
//! This module provides the command-line interface for planning and
//! synthesizing the data-science instance stack.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
