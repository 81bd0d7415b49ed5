//! Version model shared by the labellers.

use std::fmt;

use anyhow::{
    Context,
    Result,
};

/// Four-part `major.minor.build.revision` version.
///
/// Every component carries its own validity flag so callers can tell a
/// component that was actually read from input apart from one that was
/// defaulted to zero (e.g. `4.5.*` only provides major and minor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
    pub is_major_valid: bool,
    pub is_minor_valid: bool,
    pub is_build_valid: bool,
    pub is_revision_valid: bool,
}

impl VersionInfo {
    /// Version with all four components present.
    pub fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
            is_major_valid: true,
            is_minor_valid: true,
            is_build_valid: true,
            is_revision_valid: true,
        }
    }

    /// Synthetic version used when nothing could be read; all flags are unset.
    pub fn fallback(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
            ..Self::default()
        }
    }

    /// Parse a dotted `X.Y[.Z[.W]]` version.
    ///
    /// Major and minor are mandatory. Build and revision are flagged valid only
    /// when they are numeric, so `4.5.*` parses to `4.5.0.0` with build and
    /// revision marked invalid.
    pub fn from_dotted(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split('.').collect();
        if parts.len() < 2 {
            anyhow::bail!(
                "Version must have at least 2 parts (major.minor), got: {}",
                text
            );
        }

        let major = parts[0]
            .parse::<u32>()
            .with_context(|| format!("Invalid major version: {}", parts[0]))?;
        let minor = parts[1]
            .parse::<u32>()
            .with_context(|| format!("Invalid minor version: {}", parts[1]))?;

        let mut version = Self {
            major,
            minor,
            is_major_valid: true,
            is_minor_valid: true,
            ..Self::default()
        };

        if let Some(Ok(build)) = parts.get(2).map(|p| p.parse::<u32>()) {
            version.build = build;
            version.is_build_valid = true;
        }
        if let Some(Ok(revision)) = parts.get(3).map(|p| p.parse::<u32>()) {
            version.revision = revision;
            version.is_revision_valid = true;
        }

        Ok(version)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}
