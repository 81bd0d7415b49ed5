//! Common helpers shared across commands.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use clap::Args;
use serde_json::{
    Map,
    Value,
};

use crate::config::LabellerConfig;

/// Subversion options shared by the commands that query the repository.
#[derive(Args, Debug, Default, Clone)]
pub struct SvnArgs {
    /// Repository URL.
    ///
    /// Overrides `url` from the configuration file.
    #[arg(long)]
    pub url: Option<String>,

    /// Path to the `svn` executable.
    ///
    /// Defaults to `svn` on the `PATH`.
    #[arg(long)]
    pub executable: Option<String>,

    /// Username for the repository.
    #[arg(long, env = "SVN_USERNAME")]
    pub username: Option<String>,

    /// Password for the repository.
    #[arg(long, env = "SVN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Trust the server certificate blindly (self-signed certificates).
    #[arg(long)]
    pub trust_server_certificate: bool,
}

impl SvnArgs {
    /// Apply command-line overrides on top of the configuration file.
    pub fn apply(&self, config: &mut LabellerConfig) {
        if let Some(url) = &self.url {
            config.url = Some(url.clone());
        }
        if let Some(executable) = &self.executable {
            config.executable = executable.clone();
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if self.trust_server_certificate {
            config.trust_server_certificate = true;
        }
    }
}

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<LabellerConfig> {
    match path {
        Some(path) => LabellerConfig::load(path),
        None => Ok(LabellerConfig::default()),
    }
}

/// Print a label in the requested output format.
///
/// - `version`: the bare label
/// - `json`: one JSON object with `label` and every entry of `details`
/// - `github-actions`: `key=value` lines appended to `github_output`
///   (stdout when unset)
pub fn emit_label(
    format: &str,
    label: &str,
    details: Map<String, Value>,
    github_output: Option<&str>,
) -> Result<()> {
    match format {
        "version" => println!("{}", label),
        "json" => {
            let mut object = Map::new();
            object.insert("label".to_string(), Value::String(label.to_string()));
            object.extend(details);
            println!("{}", Value::Object(object));
        }
        "github-actions" => {
            let mut output = format!("label={}\n", label);
            for (key, value) in &details {
                match value {
                    Value::String(text) => output.push_str(&format!("{}={}\n", key, text)),
                    other => output.push_str(&format!("{}={}\n", key, other)),
                }
            }
            let output_file = github_output.unwrap_or("/dev/stdout");
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(output_file)
                .with_context(|| format!("Failed to open {}", output_file))?;
            file.write_all(output.as_bytes())
                .with_context(|| format!("Failed to write to {}", output_file))?;
        }
        _ => anyhow::bail!("Invalid format: {}", format),
    }

    Ok(())
}
