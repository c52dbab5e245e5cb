//! Command-line interface for bench-report.
//!
//! Provides commands for building run reports, regenerating summaries from
//! saved task metadata, and inspecting individual traces.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
