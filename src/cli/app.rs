//! Main CLI application structure

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use crate::domain::{plan, Plan, TargetGraph};
use crate::exec::{self, Outcome, OverallResult, RunReport};
use crate::manifest::{base_context, to_targets, Manifest};

#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about = "Declarative task-graph build runner")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to the manifest file
    #[arg(long, short = 'm', global = true, default_value = "forge.toml")]
    pub manifest: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute targets in dependency order
    Run {
        /// Goal targets (defaults to the manifest's `default` target)
        goals: Vec<String>,

        /// Set an input value, overriding manifest params
        #[arg(long, short = 's', value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Show the execution order without running anything
    Plan {
        /// Goal targets (defaults to the manifest's `default` target)
        goals: Vec<String>,
    },

    /// List registered targets
    List,
}

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("Forge starting");

    match cli.command {
        Commands::Run { goals, set } => run_cmd(&output, &cli.manifest, goals, &set),
        Commands::Plan { goals } => {
            plan_cmd(&output, &cli.manifest, goals)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => {
            list_cmd(&output, &cli.manifest)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_cmd(
    output: &Output,
    manifest_path: &Path,
    goals: Vec<String>,
    set: &[String],
) -> Result<ExitCode> {
    let manifest = Manifest::load(manifest_path)?;

    let overrides = set
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<Result<Vec<_>>>()?;
    let ctx = base_context(
        &manifest,
        overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );

    let goals = resolve_goals(&manifest, goals)?;
    let graph = TargetGraph::from_targets(to_targets(&manifest))?;
    let p = plan(&graph, &goals)?;

    output.verbose_ctx("run", &format!("goals: {:?}", goals));
    output.verbose_ctx("run", &format!("plan: {:?}", p.as_slice()));

    let report = exec::run(&graph, &p, &ctx);
    render_report(output, &report);

    Ok(ExitCode::from(report.overall.exit_code()))
}

fn plan_cmd(output: &Output, manifest_path: &Path, goals: Vec<String>) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let goals = resolve_goals(&manifest, goals)?;
    let graph = TargetGraph::from_targets(to_targets(&manifest))?;
    let p = plan(&graph, &goals)?;

    render_plan(output, &p);
    Ok(())
}

fn list_cmd(output: &Output, manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let graph = TargetGraph::from_targets(to_targets(&manifest))?;

    if output.is_json() {
        output.data(&graph.names());
        return Ok(());
    }

    for name in graph.names() {
        let Some(target) = graph.target(name) else {
            continue;
        };
        let deps = target.depends_on.join(", ");
        let description = target.description.as_deref().unwrap_or("");
        output.row(&[name, &deps, description]);
    }
    Ok(())
}

/// Falls back to the manifest's default target when no goals are given
fn resolve_goals(manifest: &Manifest, goals: Vec<String>) -> Result<Vec<String>> {
    if !goals.is_empty() {
        return Ok(goals);
    }
    match &manifest.default {
        Some(default) => Ok(vec![default.clone()]),
        None => bail!("no goals given and the manifest declares no default target"),
    }
}

/// Parses a `--set KEY=VALUE` assignment
fn parse_assignment(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid --set value '{}', expected KEY=VALUE", s),
    }
}

fn render_plan(output: &Output, p: &Plan) {
    if output.is_json() {
        output.data(p);
        return;
    }
    for (position, name) in p.iter().enumerate() {
        let index = (position + 1).to_string();
        output.row(&[&index, name]);
    }
}

fn render_report(output: &Output, report: &RunReport) {
    if output.is_json() {
        output.data(report);
        return;
    }

    for result in &report.results {
        match &result.outcome {
            Outcome::Succeeded => {
                let timing = format!("{} ms", result.duration_ms);
                output.row(&[result.outcome.label(), &result.name, &timing]);
            }
            Outcome::Failed(reason) => {
                let detail = reason.to_string();
                output.row(&[result.outcome.label(), &result.name, &detail]);
            }
            _ => output.row(&[result.outcome.label(), &result.name]),
        }
    }

    output.blank();
    match report.overall {
        OverallResult::Success => output.success("Build succeeded"),
        OverallResult::Failure => output.error("build failed"),
        OverallResult::Fatal => output.error("build halted: a required input is missing"),
    }
}
