//! Generate the label of the next build.
//!
//! This is the command a CI server runs once per build. It reads the
//! labeller configuration, looks up the current Subversion revision (unless
//! the host already knows it), reads back the previous label and prints the
//! new one.
//!
//! # Examples
//!
//! ```bash
//! # Next label from the repository in labeller.toml
//! revision-labeller generate --config labeller.toml \
//!     --previous-label 1.0.4.1200 --status success
//!
//! # Revision supplied by the CI host, custom pattern
//! revision-labeller generate --revision 1234 \
//!     --pattern "{major}.{minor}.{build}.{revision}" --major 2 --minor 1
//!
//! # Expose the label to later GitHub Actions steps
//! revision-labeller generate --config labeller.toml --format github-actions
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::{
    Map,
    Value,
    json,
};

use super::common::{
    SvnArgs,
    emit_label,
    load_config,
};
use crate::config::{
    ConfigMode,
    LabellerConfig,
};
use crate::labeller::{
    IntegrationStatus,
    LabelGenerator,
    PreviousBuild,
};
use crate::svn::{
    FixedRevision,
    RevisionProvider,
};

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the labeller configuration file (TOML).
    ///
    /// Command-line options override values from the file.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Major version.
    #[arg(long)]
    major: Option<u32>,

    /// Minor version.
    #[arg(long)]
    minor: Option<u32>,

    /// Pin the build number. `-1` computes it.
    #[arg(long, allow_negative_numbers = true)]
    build: Option<i64>,

    /// Label pattern, e.g. `{major}.{minor}.{build}.{revision}`.
    #[arg(long)]
    pattern: Option<String>,

    /// Reference date of the `{date}` token, e.g. `2010-08-20`.
    #[arg(long)]
    start_date: Option<String>,

    /// Bump the build number after failed builds too.
    #[arg(long)]
    increment_on_failure: bool,

    /// Keep counting builds when major or minor go up.
    #[arg(long)]
    no_reset_build_after_version_change: bool,

    /// Match literal pattern text exactly when reading the previous label.
    #[arg(long)]
    strict_literals: bool,

    /// Produce legacy `<prefix>major.minor.revision.n` labels.
    #[arg(long)]
    legacy: bool,

    /// Label prefix for `--legacy`.
    #[arg(long)]
    prefix: Option<String>,

    /// Use this revision instead of asking Subversion.
    #[arg(long)]
    revision: Option<u32>,

    #[command(flatten)]
    svn: SvnArgs,

    /// Label of the previous build.
    ///
    /// Read back unless `--last-successful-label` is given.
    #[arg(long)]
    previous_label: Option<String>,

    /// Label of the last successful build.
    #[arg(long)]
    last_successful_label: Option<String>,

    /// Outcome of the previous build.
    #[arg(long, value_enum, default_value_t = IntegrationStatus::Unknown)]
    status: IntegrationStatus,

    /// Output format for the label.
    ///
    /// - `version`: Print just the label
    /// - `json`: Print JSON with label, revision and status fields
    /// - `github-actions`: Append to GITHUB_OUTPUT in GitHub Actions format
    #[arg(long, default_value = "version")]
    format: String,

    /// Path to GitHub Actions output file.
    ///
    /// Only used when `--format github-actions` is specified.
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<String>,
}

impl GenerateArgs {
    fn apply(&self, config: &mut LabellerConfig) {
        if let Some(major) = self.major {
            config.major = major;
        }
        if let Some(minor) = self.minor {
            config.minor = minor;
        }
        if let Some(build) = self.build {
            config.build = build;
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(start_date) = &self.start_date {
            config.start_date = Some(start_date.clone());
        }
        if self.increment_on_failure {
            config.increment_on_failure = true;
        }
        if self.no_reset_build_after_version_change {
            config.reset_build_after_version_change = false;
        }
        if self.strict_literals {
            config.strict_literals = true;
        }
        if self.legacy {
            config.mode = ConfigMode::Legacy;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        self.svn.apply(config);
    }

    fn previous_build(&self) -> PreviousBuild {
        PreviousBuild {
            last_successful_label: self
                .last_successful_label
                .clone()
                .or_else(|| self.previous_label.clone()),
            status: self.status,
        }
    }
}

/// Generate the label of the next build and print it.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read or is invalid
/// - The pattern is invalid
/// - No revision is given and no repository url is configured
/// - The output cannot be written
///
/// A failing `svn` call is not an error: the revision is taken as `0`.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use revision_labeller::commands::{
///     GenerateArgs,
///     generate,
/// };
///
/// let args = GenerateArgs::parse_from([
///     "generate",
///     "--revision",
///     "105",
///     "--previous-label",
///     "1.0.0.100",
///     "--status",
///     "success",
/// ]);
/// generate(args)?; // Prints "1.0.1.105"
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Example Output
///
/// With `--format json`:
/// ```json
/// {"label":"1.0.1.105","previous":"1.0.0.100","revision":105,"status":"success"}
/// ```
pub fn generate(args: GenerateArgs) -> Result<()> {
    let mut logger = cargo_plugin_utils::logger::Logger::new();

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    logger.status("Binding", "labeller configuration");
    let settings = config.settings()?;

    let revisions: Box<dyn RevisionProvider> = match args.revision {
        Some(revision) => Box::new(FixedRevision(revision)),
        None => {
            let provider = config.svn_provider()?;
            logger.status("Querying", &provider.url);
            Box::new(provider)
        }
    };

    let mut labeller = LabelGenerator::new(settings, revisions)?;
    let previous = args.previous_build();
    let label = labeller.next_label(&previous);
    logger.finish();

    let mut details = Map::new();
    details.insert(
        "previous".to_string(),
        json!(previous.last_successful_label.unwrap_or_default()),
    );
    details.insert("status".to_string(), Value::String(previous.status.to_string()));
    details.insert(
        "revision".to_string(),
        json!(labeller.last_revision().unwrap_or_default()),
    );

    emit_label(&args.format, &label, details, args.github_output.as_deref())
}
