//! Version lookup from `AssemblyInfo`-style source files.
//!
//! Any text file containing something like
//! `[assembly: AssemblyVersion("4.0.0.*")]` can provide the label directly,
//! without bump logic. This is used where the build server pulls packages
//! that carry a copy of the version file at their root.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::version::VersionInfo;

/// Looks up a version from a list of candidate sources.
pub trait VersionSource {
    /// Resolve a version from the comma-separated `paths_csv`.
    ///
    /// Never fails; returns the all-zero, all-invalid version when nothing
    /// matches.
    fn lookup(&self, paths_csv: &str) -> VersionInfo;
}

/// Reads the first file that carries an `AssemblyVersion("...")` literal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssemblyInfoFiles;

impl VersionSource for AssemblyInfoFiles {
    fn lookup(&self, paths_csv: &str) -> VersionInfo {
        let paths: Vec<&str> = paths_csv
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        tracing::info!(
            count = paths.len(),
            "checking paths for assembly version info"
        );

        for (index, path) in paths.iter().enumerate() {
            if let Some(version) = read_assembly_version(Path::new(path), index) {
                return version;
            }
        }

        VersionInfo::default()
    }
}

fn read_assembly_version(path: &Path, index: usize) -> Option<VersionInfo> {
    if !path.is_file() {
        tracing::info!(index, path = %path.display(), "assembly info file not found");
        return None;
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(index, path = %path.display(), error = %e, "cannot read assembly info file");
            return None;
        }
    };

    match extract_assembly_version(&contents) {
        Some(version) => {
            tracing::info!(index, path = %path.display(), %version, "parsed assembly version");
            Some(version)
        }
        None => {
            tracing::info!(index, path = %path.display(), "no assembly version found");
            None
        }
    }
}

/// Find the first well-formed `AssemblyVersion("X.Y[.Z[.W]]")` in `contents`.
///
/// Literals whose major or minor part is not numeric are skipped.
pub fn extract_assembly_version(contents: &str) -> Option<VersionInfo> {
    let re = Regex::new(r#"AssemblyVersion\("([0-9.*]+)"\)"#).ok()?;
    re.captures_iter(contents)
        .find_map(|caps| VersionInfo::from_dotted(&caps[1]).ok())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{
        NamedTempFile,
        TempDir,
    };

    use super::*;

    const ASSEMBLY_INFO: &str = r#"
using System.Reflection;
[assembly: AssemblyTitle("Example")]
[assembly: AssemblyVersion("4.5.*")]
[assembly: AssemblyFileVersion("4.5.6.7")]
"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_extract_wildcard_version() {
        let version = extract_assembly_version(ASSEMBLY_INFO).unwrap();
        assert_eq!(version.to_string(), "4.5.0.0");
        assert!(version.is_major_valid && version.is_minor_valid);
        assert!(!version.is_build_valid && !version.is_revision_valid);
    }

    #[test]
    fn test_extract_full_version() {
        let version = extract_assembly_version(r#"[assembly: AssemblyVersion("1.2.3.4")]"#).unwrap();
        assert_eq!(version, VersionInfo::new(1, 2, 3, 4));
    }

    #[test]
    fn test_extract_skips_malformed_literal() {
        let contents = r#"
[assembly: AssemblyVersion("*")]
[assembly: AssemblyVersion("2.1")]
"#;
        assert_eq!(extract_assembly_version(contents).unwrap().to_string(), "2.1.0.0");
        assert!(extract_assembly_version("AssemblyFileVersion(\"1.0.0.0\")").is_none());
    }

    #[test]
    fn test_lookup_skips_missing_file() {
        let file = write_temp(ASSEMBLY_INFO);
        let missing = format!("{}.nothere", file.path().display());
        let csv = format!("{},{}", missing, file.path().display());

        let version = AssemblyInfoFiles.lookup(&csv);
        assert_eq!(version.to_string(), "4.5.0.0");
        assert!(version.is_minor_valid);
        assert!(!version.is_build_valid);
    }

    #[test]
    fn test_lookup_stops_at_first_match() {
        let first = write_temp(r#"[assembly: AssemblyVersion("1.0.0.0")]"#);
        let second = write_temp(r#"[assembly: AssemblyVersion("2.0.0.0")]"#);
        let csv = format!("{} , {}", first.path().display(), second.path().display());
        assert_eq!(AssemblyInfoFiles.lookup(&csv).to_string(), "1.0.0.0");
    }

    #[test]
    fn test_lookup_skips_file_without_version() {
        let empty = write_temp("namespace Example {}");
        let real = write_temp(r#"[assembly: AssemblyVersion("3.2.1.*")]"#);
        let csv = format!("{},{}", empty.path().display(), real.path().display());
        assert_eq!(AssemblyInfoFiles.lookup(&csv).to_string(), "3.2.1.0");
    }

    #[test]
    fn test_lookup_nothing_found() {
        let dir = TempDir::new().unwrap();
        let csv = format!("{}", dir.path().join("AssemblyInfo.cs").display());
        assert_eq!(AssemblyInfoFiles.lookup(&csv), VersionInfo::default());
        assert_eq!(AssemblyInfoFiles.lookup(""), VersionInfo::default());
        // A directory is not a candidate file.
        let dir_csv = dir.path().display().to_string();
        assert_eq!(AssemblyInfoFiles.lookup(&dir_csv), VersionInfo::default());
    }
}
