//! Build label generator for Subversion-backed CI.
//!
//! - Generate the next build label from the repository revision
//! - Read a version straight out of an `AssemblyInfo` file
//! - Print the latest repository revision

use std::fs;

use anyhow::Result;
use clap::{
    Parser,
    Subcommand,
};
use revision_labeller::commands;
use revision_labeller::commands::{
    AssemblyInfoArgs,
    GenerateArgs,
    RevisionArgs,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "revision-labeller", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the label of the next build
    #[command(name = "generate")]
    Generate(GenerateArgs),
    /// Label a build from an AssemblyInfo file
    #[command(name = "assembly-info")]
    AssemblyInfo(AssemblyInfoArgs),
    /// Print the latest repository revision
    #[command(name = "revision")]
    Revision(RevisionArgs),
}

/// Check if any .env* files exist in the current directory.
fn has_env_files() -> bool {
    let current_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(_) => return false,
    };

    let mut candidates: Vec<String> = [".env", ".env.local", ".env.ci"]
        .into_iter()
        .map(String::from)
        .collect();
    if let Ok(user) = std::env::var("USER") {
        candidates.push(format!(".env.{}", user));
    }

    candidates.iter().any(|name| {
        fs::metadata(current_dir.join(name))
            .map(|m| m.is_file())
            .unwrap_or(false)
    })
}

fn main() -> Result<()> {
    // Repository credentials (SVN_USERNAME, SVN_PASSWORD) may live in
    // dotenvage-encrypted .env files.
    if has_env_files()
        && let Err(e) = dotenvage::EnvLoader::new().and_then(|loader| loader.load())
    {
        eprintln!("Warning: Failed to load/decrypt env files: {}", e);
        eprintln!("Continuing with existing environment variables...");
    }

    // Labels go to stdout, diagnostics to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::Generate(args) => commands::generate(args),
        Command::AssemblyInfo(args) => commands::assembly_info(args),
        Command::Revision(args) => commands::revision(args),
    }
}
