//! Command-line interface for symptom-intake.
//!
//! Provides commands for parsing model responses, classifying question
//! text, and inspecting parsed question sets.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
