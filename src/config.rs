//! Labeller configuration.
//!
//! Configuration is read from a TOML file whose keys are the option names CI
//! hosts already use for this labeller:
//!
//! ```toml
//! major = 2
//! minor = 3
//! build = -1
//! pattern = "{major}.{minor}.{build}.{revision}"
//! incrementOnFailure = false
//! resetBuildAfterVersionChange = true
//! startDate = "20/08/2010"
//! url = "https://svn.example.com/repo/trunk"
//! username = "ci"
//! trustServerCertificate = true
//! ```
//!
//! All keys are optional. Unknown keys are rejected, so typos surface when the
//! configuration is loaded instead of silently producing default labels.

use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use serde::Deserialize;

use crate::labeller::{
    LabelMode,
    LabelSettings,
};
use crate::pattern::{
    DEFAULT_PATTERN,
    LiteralMatching,
};
use crate::svn::SvnRevisionProvider;

/// Label layout selected in the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigMode {
    #[default]
    Pattern,
    Legacy,
}

/// Labeller options as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LabellerConfig {
    pub major: u32,
    pub minor: u32,
    /// Pinned build number; any negative value (conventionally `-1`) computes
    /// it.
    pub build: i64,
    pub pattern: String,
    pub increment_on_failure: bool,
    pub reset_build_after_version_change: bool,
    pub start_date: Option<String>,
    /// Match literal pattern text exactly when reading previous labels.
    pub strict_literals: bool,
    pub mode: ConfigMode,
    /// Label prefix, legacy mode only.
    pub prefix: String,
    pub executable: String,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub trust_server_certificate: bool,
    /// Comma-separated candidate files for the assembly-info labeller.
    pub assembly_info_path: Option<String>,
}

impl Default for LabellerConfig {
    fn default() -> Self {
        Self {
            major: 1,
            minor: 0,
            build: -1,
            pattern: DEFAULT_PATTERN.to_string(),
            increment_on_failure: false,
            reset_build_after_version_change: true,
            start_date: None,
            strict_literals: false,
            mode: ConfigMode::Pattern,
            prefix: String::new(),
            executable: "svn".to_string(),
            url: None,
            username: None,
            password: None,
            trust_server_certificate: false,
            assembly_info_path: None,
        }
    }
}

impl LabellerConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid labeller configuration")
    }

    /// Labelling policy for the engine.
    ///
    /// The pattern is compiled here so that a broken pattern is reported once,
    /// when the configuration is bound, and not on every build.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `build` does not fit a build number
    /// - The pattern references an unknown token or cannot be read back
    pub fn settings(&self) -> Result<LabelSettings> {
        let build = if self.build < 0 {
            None
        } else {
            Some(
                u32::try_from(self.build)
                    .with_context(|| format!("Build number out of range: {}", self.build))?,
            )
        };

        let settings = LabelSettings {
            major: self.major,
            minor: self.minor,
            build,
            pattern: self.pattern.clone(),
            increment_on_failure: self.increment_on_failure,
            reset_build_after_version_change: self.reset_build_after_version_change,
            start_date: self.start_date.clone().filter(|d| !d.trim().is_empty()),
            literal_matching: if self.strict_literals {
                LiteralMatching::Strict
            } else {
                LiteralMatching::Loose
            },
            mode: match self.mode {
                ConfigMode::Pattern => LabelMode::Pattern,
                ConfigMode::Legacy => LabelMode::Legacy {
                    prefix: self.prefix.clone(),
                },
            },
        };

        settings
            .compile_pattern()
            .with_context(|| format!("Invalid pattern: {}", settings.pattern))?;
        Ok(settings)
    }

    /// Subversion revision lookup for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository `url` is configured.
    pub fn svn_provider(&self) -> Result<SvnRevisionProvider> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .context("No repository url configured (set `url` or pass --url)")?;

        Ok(SvnRevisionProvider {
            executable: self.executable.clone(),
            url: url.to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
            trust_server_certificate: self.trust_server_certificate,
        })
    }
}
