//! Print the latest revision of the repository.
//!
//! Unlike `generate`, this command fails when Subversion cannot be reached,
//! which makes it the tool to check connection settings with.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use super::common::{
    SvnArgs,
    load_config,
};

/// Arguments for the `revision` command.
#[derive(Parser, Debug)]
pub struct RevisionArgs {
    /// Path to the labeller configuration file (TOML).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(flatten)]
    svn: SvnArgs,

    /// Output format: `version` (bare number) or `json`.
    #[arg(long, default_value = "version")]
    format: String,
}

/// Query Subversion for the latest revision and print it.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read or is invalid
/// - No repository url is configured
/// - `svn` cannot be run or its output has no revision
/// - The format is not supported
pub fn revision(args: RevisionArgs) -> Result<()> {
    let mut logger = cargo_plugin_utils::logger::Logger::new();

    let mut config = load_config(args.config.as_deref())?;
    args.svn.apply(&mut config);
    let provider = config.svn_provider()?;

    logger.status("Querying", &provider.url);
    let revision = provider.query()?;
    logger.finish();

    match args.format.as_str() {
        "version" => println!("{}", revision),
        "json" => println!("{}", json!({ "url": provider.url, "revision": revision })),
        _ => anyhow::bail!("Invalid format: {}", args.format),
    }

    Ok(())
}
