//! Manifest handling
//!
//! Targets are declared in a TOML manifest (`forge.toml` by default):
//!
//! ```toml
//! default = "compile"
//!
//! [params]
//! configuration = "debug"
//!
//! [targets.restore]
//! run = ["cargo fetch"]
//!
//! [targets.compile]
//! depends-on = ["restore"]
//! requires = ["configuration"]
//! run = ["cargo build"]
//! produces = ["target/debug"]
//! ```
//!
//! The manifest layer is thin glue: it parses definitions and turns them
//! into [`crate::domain::Target`] values whose actions shell out through
//! `sh -c`. All graph validation happens in the domain layer.

mod format;
mod loader;

pub use format::{Manifest, ManifestError, TargetDef};
pub use loader::{base_context, to_targets};
