//! Command-line interface for curaforge.
//!
//! Provides commands for curating a batch manifest and inspecting the
//! effective configuration.

mod commands;
mod manifest;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
pub use manifest::{load_manifest, parse_manifest, ManifestEntry};
