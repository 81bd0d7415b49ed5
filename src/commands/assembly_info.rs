//! Label a build from the version in an `AssemblyInfo` file.
//!
//! # Examples
//!
//! ```bash
//! # First candidate file that carries an AssemblyVersion wins
//! revision-labeller assembly-info --paths Properties/AssemblyInfo.cs,SharedAssemblyInfo.cs
//!
//! # Candidates from the configuration file
//! revision-labeller assembly-info --config labeller.toml --format json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::{
    Map,
    json,
};

use super::common::{
    emit_label,
    load_config,
};
use crate::assembly_info::{
    AssemblyInfoFiles,
    VersionSource,
};

/// Arguments for the `assembly-info` command.
#[derive(Parser, Debug)]
pub struct AssemblyInfoArgs {
    /// Comma-separated candidate files, tried in order.
    ///
    /// Overrides `assemblyInfoPath` from the configuration file.
    #[arg(long)]
    paths: Option<String>,

    /// Path to the labeller configuration file (TOML).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output format for the label.
    ///
    /// - `version`: Print just the label
    /// - `json`: Print JSON with label and version parts
    /// - `github-actions`: Append to GITHUB_OUTPUT in GitHub Actions format
    #[arg(long, default_value = "version")]
    format: String,

    /// Path to GitHub Actions output file.
    ///
    /// Only used when `--format github-actions` is specified.
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<String>,
}

/// Print the version found in the first readable `AssemblyInfo` file.
///
/// When no candidate carries a version the label is `0.0.0.0`, matching what
/// build servers expect from this labeller.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read or is invalid
/// - No candidate paths are given
/// - The output cannot be written
pub fn assembly_info(args: AssemblyInfoArgs) -> Result<()> {
    let mut logger = cargo_plugin_utils::logger::Logger::new();

    let config = load_config(args.config.as_deref())?;
    let paths = args
        .paths
        .or(config.assembly_info_path)
        .filter(|p| !p.trim().is_empty());
    let Some(paths) = paths else {
        anyhow::bail!("No assembly info paths given (pass --paths or set `assemblyInfoPath`)");
    };

    logger.status("Reading", &paths);
    let version = AssemblyInfoFiles.lookup(&paths);
    if !version.is_major_valid {
        logger.warning("Missing", "no AssemblyVersion found in any candidate file");
    }
    logger.finish();

    let mut details = Map::new();
    details.insert("major".to_string(), json!(version.major));
    details.insert("minor".to_string(), json!(version.minor));
    details.insert("build".to_string(), json!(version.build));
    details.insert("revision".to_string(), json!(version.revision));

    emit_label(
        &args.format,
        &version.to_string(),
        details,
        args.github_output.as_deref(),
    )
}
