//! Build label generation.
//!
//! A [`LabelGenerator`] turns the result of the previous build into the label
//! of the next one. It is called once per build and keeps a single piece of
//! state between calls: the rebuild counter.
//!
//! # Decision procedure
//!
//! 1. Ask the [`RevisionProvider`] for the current revision.
//! 2. Read the previous label back through the [`LabelPattern`]. A label that
//!    cannot be read is replaced by `major.minor.0.<current revision>`.
//! 3. Compute the build number:
//!    - a pinned build number always wins;
//!    - a configured major/minor above the previous one is a version bump,
//!      which resets the build (or keeps counting, see
//!      [`LabelSettings::reset_build_after_version_change`]);
//!    - otherwise the build is bumped when the repository moved on and the
//!      previous build succeeded (or [`LabelSettings::increment_on_failure`]
//!      is set).
//! 4. Count a rebuild when the revision did not change.
//! 5. Render the pattern with the configured major/minor, the new build, the
//!    current revision, the rebuild count and the clock-derived values.
//!
//! # Legacy mode
//!
//! [`LabelMode::Legacy`] reproduces the older `prefix + major.minor.revision.n`
//! labels, where `n` counts builds of the same revision and starts over at
//! zero when the revision changes.


use std::fmt;

use anyhow::Result;

use crate::clock::{
    self,
    Clock,
    SystemClock,
};
use crate::pattern::{
    DEFAULT_PATTERN,
    LabelPattern,
    LabelValues,
    LiteralMatching,
};
use crate::svn::RevisionProvider;
use crate::version::VersionInfo;

/// Fixed pattern of [`LabelMode::Legacy`].
pub const LEGACY_PATTERN: &str = "{major}.{minor}.{revision}.{rebuild}";

/// Outcome of the previous build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum IntegrationStatus {
    Success,
    Failure,
    #[default]
    Unknown,
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegrationStatus::Success => "success",
            IntegrationStatus::Failure => "failure",
            IntegrationStatus::Unknown => "unknown",
        })
    }
}

/// What the CI host knows about the previous build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousBuild {
    /// Label of the last successful build. This is the one read back.
    pub last_successful_label: Option<String>,
    pub status: IntegrationStatus,
}

/// Label layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelMode {
    /// Labels follow [`LabelSettings::pattern`].
    #[default]
    Pattern,
    /// `prefix` followed by [`LEGACY_PATTERN`].
    Legacy { prefix: String },
}

/// Labelling policy, fixed for the lifetime of a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSettings {
    pub major: u32,
    pub minor: u32,
    /// Pinned build number; `None` computes it.
    pub build: Option<u32>,
    pub pattern: String,
    /// Also bump the build number after a failed build.
    pub increment_on_failure: bool,
    /// Start the build number over at zero when major or minor go up.
    pub reset_build_after_version_change: bool,
    /// Reference date of `{date}`.
    pub start_date: Option<String>,
    pub literal_matching: LiteralMatching,
    pub mode: LabelMode,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            major: 1,
            minor: 0,
            build: None,
            pattern: DEFAULT_PATTERN.to_string(),
            increment_on_failure: false,
            reset_build_after_version_change: true,
            start_date: None,
            literal_matching: LiteralMatching::Loose,
            mode: LabelMode::Pattern,
        }
    }
}

impl LabelSettings {
    /// Compile the pattern this configuration renders with.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be compiled.
    pub fn compile_pattern(&self) -> Result<LabelPattern> {
        match self.mode {
            LabelMode::Pattern => LabelPattern::compile(&self.pattern, self.literal_matching),
            LabelMode::Legacy { .. } => LabelPattern::compile(LEGACY_PATTERN, LiteralMatching::Strict),
        }
    }

    fn prefix(&self) -> &str {
        match &self.mode {
            LabelMode::Pattern => "",
            LabelMode::Legacy { prefix } => prefix,
        }
    }
}

/// Previous label as seen by one generation.
#[derive(Debug, Clone, Copy)]
struct PreviousVersion {
    version: VersionInfo,
    rebuild: Option<u32>,
    /// False when `version` is the synthetic fallback.
    from_label: bool,
}

/// Generates build labels.
///
/// One generator serves one project: `generate` takes `&mut self` because it
/// updates the rebuild counter, which lives as long as the generator.
pub struct LabelGenerator {
    settings: LabelSettings,
    pattern: LabelPattern,
    revisions: Box<dyn RevisionProvider>,
    clock: Box<dyn Clock>,
    rebuild: u32,
    last_revision: Option<u32>,
}

impl fmt::Debug for LabelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelGenerator")
            .field("settings", &self.settings)
            .field("rebuild", &self.rebuild)
            .field("last_revision", &self.last_revision)
            .finish_non_exhaustive()
    }
}

impl LabelGenerator {
    /// Generator that reads the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured pattern is invalid.
    pub fn new(settings: LabelSettings, revisions: impl RevisionProvider + 'static) -> Result<Self> {
        Self::with_clock(settings, revisions, SystemClock)
    }

    /// Generator with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured pattern is invalid.
    pub fn with_clock(
        settings: LabelSettings,
        revisions: impl RevisionProvider + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        let pattern = settings.compile_pattern()?;
        if clock::starts_in_future(settings.start_date.as_deref(), clock.today()) {
            tracing::warn!(
                start_date = settings.start_date.as_deref().unwrap_or_default(),
                "start date is in the future, {{date}} will be negative"
            );
        }
        Ok(Self {
            settings,
            pattern,
            revisions: Box::new(revisions),
            clock: Box::new(clock),
            rebuild: 0,
            last_revision: None,
        })
    }

    /// Revision the most recent label was generated for, `None` before the
    /// first generation. `Some(0)` can also mean the lookup failed.
    pub fn last_revision(&self) -> Option<u32> {
        self.last_revision
    }

    /// Number of builds of an unchanged revision seen so far.
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild
    }

    /// Label for the build following `previous`.
    pub fn next_label(&mut self, previous: &PreviousBuild) -> String {
        self.generate(previous.last_successful_label.as_deref(), previous.status)
    }

    /// Label for the build following one labelled `previous_label` that ended
    /// with `previous_status`.
    ///
    /// Never fails: an absent or unreadable previous label is replaced by
    /// `major.minor.0.<current revision>`.
    pub fn generate(&mut self, previous_label: Option<&str>, previous_status: IntegrationStatus) -> String {
        let current_revision = self.revisions.current_revision();
        self.last_revision = Some(current_revision);
        let previous = self.read_previous(previous_label, current_revision);

        let build = self.next_build(&previous.version, previous_status, current_revision);
        self.rebuild = self.next_rebuild(&previous, current_revision);

        let now = self.clock.now();
        let values = LabelValues {
            major: self.settings.major,
            minor: self.settings.minor,
            build,
            revision: current_revision,
            rebuild: self.rebuild,
            elapsed_days: clock::elapsed_days(self.settings.start_date.as_deref(), now),
            ms_revision: clock::ms_revision(now),
        };

        let label = format!("{}{}", self.settings.prefix(), self.pattern.render(&values));
        tracing::info!(
            %label,
            previous = previous_label.unwrap_or_default(),
            %previous_status,
            revision = current_revision,
            "generated build label"
        );
        label
    }

    fn read_previous(&self, previous_label: Option<&str>, current_revision: u32) -> PreviousVersion {
        let parsed = previous_label
            .map(|label| label.strip_prefix(self.settings.prefix()).unwrap_or(label))
            .filter(|label| !label.trim().is_empty())
            .and_then(|label| self.pattern.parse(label));

        match parsed {
            Some(parsed) => {
                tracing::debug!(version = %parsed.version, rebuild = ?parsed.rebuild, "read previous label");
                PreviousVersion {
                    version: parsed.version,
                    rebuild: parsed.rebuild,
                    from_label: true,
                }
            }
            None => {
                tracing::debug!(
                    previous = previous_label.unwrap_or_default(),
                    pattern = self.pattern.as_str(),
                    "previous label not readable, falling back"
                );
                PreviousVersion {
                    version: VersionInfo::fallback(
                        self.settings.major,
                        self.settings.minor,
                        0,
                        current_revision,
                    ),
                    rebuild: None,
                    from_label: false,
                }
            }
        }
    }

    fn next_build(&self, previous: &VersionInfo, status: IntegrationStatus, current_revision: u32) -> u32 {
        if let Some(pinned) = self.settings.build {
            return pinned;
        }

        let version_bumped =
            self.settings.major > previous.major || self.settings.minor > previous.minor;
        if version_bumped {
            return if self.settings.reset_build_after_version_change {
                0
            } else {
                previous.build.saturating_add(1)
            };
        }

        let counts = status == IntegrationStatus::Success || self.settings.increment_on_failure;
        if counts && current_revision > previous.revision {
            previous.build.saturating_add(1)
        } else {
            previous.build
        }
    }

    fn next_rebuild(&self, previous: &PreviousVersion, current_revision: u32) -> u32 {
        let unchanged = current_revision == previous.version.revision;
        match self.settings.mode {
            LabelMode::Pattern => {
                // A rebuild number read from the label replaces the counter.
                // The counter is never reset when the revision moves on.
                let base = previous.rebuild.unwrap_or(self.rebuild);
                if unchanged { base.saturating_add(1) } else { base }
            }
            LabelMode::Legacy { .. } => {
                if previous.from_label && unchanged {
                    previous.rebuild.unwrap_or(0).saturating_add(1)
                } else {
                    0
                }
            }
        }
    }
}
