//! Repository revision lookup.
//!
//! The labeller only needs one number from version control: the revision of
//! the latest commit. [`SvnRevisionProvider`] reads it from
//! `svn log --xml --limit 1 <url>`.

use std::process::Command;

use anyhow::{
    Context,
    Result,
};
use regex::Regex;

/// Supplies the current repository revision.
///
/// Implementations must not fail: any lookup problem is reported as
/// revision `0`.
pub trait RevisionProvider {
    fn current_revision(&self) -> u32;
}

impl<T: RevisionProvider + ?Sized> RevisionProvider for Box<T> {
    fn current_revision(&self) -> u32 {
        (**self).current_revision()
    }
}

/// A revision known up front, e.g. passed in by the CI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRevision(pub u32);

impl RevisionProvider for FixedRevision {
    fn current_revision(&self) -> u32 {
        self.0
    }
}

/// Reads the latest revision with the `svn` command-line client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnRevisionProvider {
    /// Path or name of the `svn` executable.
    pub executable: String,
    /// Repository URL.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pass `--trust-server-cert` (self-signed certificates, svn 1.6+).
    pub trust_server_certificate: bool,
}

impl SvnRevisionProvider {
    /// Provider for `url` with the `svn` found on `PATH`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            executable: "svn".to_string(),
            url: url.into(),
            username: None,
            password: None,
            trust_server_certificate: false,
        }
    }

    /// Command-line arguments for the log query.
    ///
    /// The URL is a single argument, so no quoting is needed for URLs that
    /// contain spaces.
    pub fn arguments(&self) -> Vec<String> {
        let mut args: Vec<String> = ["log", "--xml", "--limit", "1"]
            .into_iter()
            .map(String::from)
            .collect();
        args.push(self.url.clone());

        if self.trust_server_certificate {
            args.push("--trust-server-cert".to_string());
        }

        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            args.extend([
                "--username".to_string(),
                username.to_string(),
                "--password".to_string(),
                self.password.clone().unwrap_or_default(),
                "--non-interactive".to_string(),
                "--no-auth-cache".to_string(),
            ]);
        }

        args
    }

    /// Run `svn log` and extract the revision.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The executable cannot be started
    /// - `svn` exits with a non-zero status
    /// - The output has no parsable `<logentry revision="...">`
    pub fn query(&self) -> Result<u32> {
        let output = Command::new(&self.executable)
            .args(self.arguments())
            .output()
            .with_context(|| format!("Failed to execute {}. Is it installed?", self.executable))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("svn log failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(xml = %stdout, "received svn log output");
        parse_log_revision(&stdout)
    }
}

impl RevisionProvider for SvnRevisionProvider {
    fn current_revision(&self) -> u32 {
        match self.query() {
            Ok(revision) => revision,
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::warn!(url = %self.url, %error, "revision lookup failed, using 0");
                0
            }
        }
    }
}

/// Extract the revision from `svn log --xml` output.
pub fn parse_log_revision(xml: &str) -> Result<u32> {
    // `revision` attribute of the first <logentry> element
    let re = Regex::new(r#"<logentry\b[^>]*?\brevision\s*=\s*["']([^"']*)["']"#)
        .context("Failed to compile logentry expression")?;
    let caps = re
        .captures(xml)
        .context("No <logentry revision=\"...\"> element in svn log output")?;
    let raw = &caps[1];
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid revision number: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<log>
<logentry
   revision="1234">
<author>jdoe</author>
<date>2010-09-21T05:13:59.000000Z</date>
<msg>Fix the build</msg>
</logentry>
</log>
"#;

    #[test]
    fn test_parse_log_revision() {
        assert_eq!(parse_log_revision(LOG_XML).unwrap(), 1234);
    }

    #[test]
    fn test_parse_log_revision_single_quotes() {
        let xml = "<log><logentry revision='42'><msg/></logentry></log>";
        assert_eq!(parse_log_revision(xml).unwrap(), 42);
    }

    #[test]
    fn test_parse_log_revision_failures() {
        assert!(parse_log_revision("").is_err());
        assert!(parse_log_revision("<log></log>").is_err());
        assert!(parse_log_revision("svn: E170013: Unable to connect").is_err());
        let err = parse_log_revision(r#"<log><logentry revision="abc"></logentry></log>"#)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid revision number"));
        assert!(parse_log_revision(r#"<logentry revision="99999999999">"#).is_err());
    }

    #[test]
    fn test_arguments_minimal() {
        let provider = SvnRevisionProvider::new("https://svn.example.com/my repo/trunk");
        assert_eq!(
            provider.arguments(),
            vec![
                "log",
                "--xml",
                "--limit",
                "1",
                "https://svn.example.com/my repo/trunk"
            ]
        );
    }

    #[test]
    fn test_arguments_with_credentials_and_trust() {
        let provider = SvnRevisionProvider {
            username: Some("ci".to_string()),
            password: Some("secret".to_string()),
            trust_server_certificate: true,
            ..SvnRevisionProvider::new("https://svn.example.com/repo")
        };
        let args = provider.arguments();
        assert!(args.contains(&"--trust-server-cert".to_string()));
        let username_at = args.iter().position(|a| a == "--username").unwrap();
        assert_eq!(args[username_at + 1], "ci");
        assert_eq!(args[username_at + 2], "--password");
        assert_eq!(args[username_at + 3], "secret");
        assert!(args.ends_with(&["--non-interactive".to_string(), "--no-auth-cache".to_string()]));
    }

    #[test]
    fn test_arguments_skip_blank_username() {
        let provider = SvnRevisionProvider {
            username: Some(String::new()),
            password: Some("secret".to_string()),
            ..SvnRevisionProvider::new("file:///repo")
        };
        assert!(!provider.arguments().contains(&"--username".to_string()));
    }

    #[test]
    fn test_missing_executable_degrades_to_zero() {
        let provider = SvnRevisionProvider {
            executable: "/nonexistent/bin/svn".to_string(),
            ..SvnRevisionProvider::new("file:///repo")
        };
        assert!(provider.query().is_err());
        assert_eq!(provider.current_revision(), 0);
    }

    #[test]
    fn test_fixed_revision() {
        assert_eq!(FixedRevision(105).current_revision(), 105);
    }
}
