//! Command-line interface
//!
//! Thin glue over the orchestrator core: parses arguments, loads the
//! manifest, and maps run results to process exit codes (`0` success,
//! `1` failure, `2` fatal misconfiguration or halted run).
//!
//! All commands support `--format text|json` and `--verbose`.

mod app;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
