//! Manifest file format
//!
//! serde schema for `forge.toml`. Field names are kebab-case in the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A parsed `forge.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Manifest {
    /// Goal used when none is given on the command line
    #[serde(default)]
    pub default: Option<String>,

    /// Default input values, overridable with `--set`
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Target definitions, keyed by name
    #[serde(default)]
    pub targets: BTreeMap<String, TargetDef>,
}

/// One `[targets.<name>]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TargetDef {
    /// Shell commands executed in order; the first non-zero exit fails
    /// the target
    #[serde(default)]
    pub run: Vec<String>,

    /// Hard dependencies: must run and succeed first
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Soft ordering: this target precedes these, when they are scheduled
    #[serde(default)]
    pub before: Vec<String>,

    /// Soft ordering: this target follows these, when they are scheduled
    #[serde(default)]
    pub after: Vec<String>,

    /// Inputs that must be set for this target to execute
    #[serde(default)]
    pub requires: Vec<String>,

    /// Context key gating execution; prefix with `!` to negate
    #[serde(default)]
    pub when: Option<String>,

    /// Declared output paths (advisory)
    #[serde(default)]
    pub produces: Vec<PathBuf>,

    /// Shown by `forge list`
    #[serde(default)]
    pub description: Option<String>,
}

impl Manifest {
    /// Parses manifest text
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads and parses a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
