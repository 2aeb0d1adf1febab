//! Conversion from manifest definitions to executable targets
//!
//! Actions run each `run` entry through `sh -c`, with the run context
//! exported as `FORGE_*` environment variables. The orchestrator core only
//! sees success or an error; exit-code translation of nested tools stops
//! here.

use std::process::Command;

use anyhow::{bail, Context as _, Result};

use super::format::{Manifest, TargetDef};
use crate::domain::{Condition, RunContext, Target};

/// Builds the run context from manifest defaults and CLI overrides
///
/// Overrides win over `[params]` defaults.
pub fn base_context<'a>(
    manifest: &Manifest,
    overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> RunContext {
    let mut ctx: RunContext = manifest
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    for (key, value) in overrides {
        ctx.set(key, value);
    }
    ctx
}

/// Converts every manifest definition into a domain target
pub fn to_targets(manifest: &Manifest) -> Vec<Target> {
    manifest
        .targets
        .iter()
        .map(|(name, def)| to_target(name, def))
        .collect()
}

fn to_target(name: &str, def: &TargetDef) -> Target {
    let commands = def.run.clone();
    let mut target = Target::new(name, move |ctx: &RunContext| run_commands(&commands, ctx));

    target.depends_on = def.depends_on.clone();
    target.before = def.before.clone();
    target.after = def.after.clone();
    target.requires = def.requires.clone();
    target.condition = def.when.as_deref().map(parse_condition);
    target.produces = def.produces.clone();
    target.description = def.description.clone();
    target
}

/// Parses a `when` gate: a context key, optionally negated with `!`
fn parse_condition(expr: &str) -> Condition {
    match expr.strip_prefix('!') {
        Some(key) => {
            let key = key.to_string();
            Box::new(move |ctx| !ctx.is_truthy(&key))
        }
        None => {
            let key = expr.to_string();
            Box::new(move |ctx| ctx.is_truthy(&key))
        }
    }
}

fn run_commands(commands: &[String], ctx: &RunContext) -> Result<()> {
    for command in commands {
        let mut child = Command::new("sh");
        child.arg("-c").arg(command);
        for (key, value) in ctx.iter() {
            child.env(env_key(key), value);
        }

        let status = child
            .status()
            .with_context(|| format!("failed to spawn `{}`", command))?;
        if !status.success() {
            bail!("command `{}` failed with {}", command, status);
        }
    }
    Ok(())
}

/// Maps a context key to its environment variable name
///
/// `api-key` becomes `FORGE_API_KEY`.
fn env_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 6);
    name.push_str("FORGE_");
    for c in key.chars() {
        match c {
            'a'..='z' => name.push(c.to_ascii_uppercase()),
            '-' | '.' | ' ' => name.push('_'),
            other => name.push(other),
        }
    }
    name
}
