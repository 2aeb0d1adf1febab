//! Forge - Declarative task-graph build runner

use std::process::ExitCode;

fn main() -> ExitCode {
    match forge_cli::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Registration, planning, and manifest errors are fatal
            // misconfiguration, distinct from a failed run (exit 1).
            ExitCode::from(2)
        }
    }
}
