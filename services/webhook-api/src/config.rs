// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration.
//!
//! Settings come from environment variables (after an optional `.env` file has
//! been loaded by the binary). Empty values are treated as unset. Everything is
//! checked once at startup by [`Settings::validate`]; a service with invalid
//! settings never starts accepting events.

use benchbot_pipeline::{CommandSpec, ToolConfig};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment could not be read into [`Settings`].
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A required variable is unset or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A variable has an unusable value.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Service settings.
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Owner of the repository comments are posted to.
    #[serde(default)]
    pub repo_owner: String,
    /// Name of that repository.
    #[serde(default)]
    pub repo_name: String,
    /// Suite entry file, relative to the workspace root.
    #[serde(default)]
    pub suite_filename: String,
    /// GitHub API token.
    #[serde(default)]
    pub github_token: String,

    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Directory workspaces are created in.
    pub scratch_root: PathBuf,
    /// GitHub API base URL.
    pub github_api_url: String,
    /// Version-control program.
    pub git_program: String,
    /// Dependency install command line.
    pub install_command: String,
    /// Program the suite entry file is run with.
    pub suite_interpreter: String,
    /// Clone and checkout timeout.
    pub fetch_timeout_secs: u64,
    /// Dependency install timeout.
    pub install_timeout_secs: u64,
    /// Suite run timeout.
    pub run_timeout_secs: u64,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Settings {
    /// Load and validate settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load and validate settings from `vars`.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        let settings: Settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 4278)?
            .set_default("scratch_root", "./tmp")?
            .set_default("github_api_url", "https://api.github.com")?
            .set_default("git_program", "git")?
            .set_default("install_command", "npm i --quiet")?
            .set_default("suite_interpreter", "node")?
            .set_default("fetch_timeout_secs", 300)?
            .set_default("install_timeout_secs", 600)?
            .set_default("run_timeout_secs", 1800)?
            .set_default("log_format", "pretty")?
            .add_source(config::Environment::default().source(Some(vars)))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check every value the service depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("REPO_OWNER", &self.repo_owner),
            ("REPO_NAME", &self.repo_name),
            ("SUITE_FILENAME", &self.suite_filename),
            ("GITHUB_TOKEN", &self.github_token),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        if self.port == 0 {
            return Err(invalid("PORT", "must be between 1 and 65535"));
        }
        for (name, secs) in [
            ("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs),
            ("INSTALL_TIMEOUT_SECS", self.install_timeout_secs),
            ("RUN_TIMEOUT_SECS", self.run_timeout_secs),
        ] {
            if secs == 0 {
                return Err(invalid(name, "must be positive"));
            }
        }
        let url = &self.github_api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(invalid("GITHUB_API_URL", "must be an http(s) URL"));
        }

        self.tool_config()?;
        self.interpreter()?;
        Ok(())
    }

    /// Address to listen on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tooling used to provision workspaces.
    pub fn tool_config(&self) -> Result<ToolConfig, ConfigError> {
        let install = CommandSpec::parse(&self.install_command)
            .ok_or_else(|| invalid("INSTALL_COMMAND", "must not be empty"))?;
        Ok(ToolConfig {
            git: self.git_program.clone(),
            install,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            install_timeout: Duration::from_secs(self.install_timeout_secs),
        })
    }

    /// Command the suite entry file is appended to.
    pub fn interpreter(&self) -> Result<CommandSpec, ConfigError> {
        CommandSpec::parse(&self.suite_interpreter)
            .ok_or_else(|| invalid("SUITE_INTERPRETER", "must not be empty"))
    }

    /// Suite run timeout.
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("suite_filename", &self.suite_filename)
            .field("github_token", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scratch_root", &self.scratch_root)
            .field("github_api_url", &self.github_api_url)
            .field("git_program", &self.git_program)
            .field("install_command", &self.install_command)
            .field("suite_interpreter", &self.suite_interpreter)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("install_timeout_secs", &self.install_timeout_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, &str); 4] = [
        ("REPO_OWNER", "owner"),
        ("REPO_NAME", "proj"),
        ("SUITE_FILENAME", "benchmark/suite.js"),
        ("GITHUB_TOKEN", "ghp_secret"),
    ];

    fn with(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        REQUIRED
            .iter()
            .chain(extra)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn without(name: &str) -> Vec<(String, String)> {
        with(&[]).into_iter().filter(|(k, _)| k != name).collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(with(&[])).unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:4278");
        assert_eq!(settings.scratch_root, PathBuf::from("./tmp"));
        assert_eq!(settings.github_api_url, "https://api.github.com");
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.run_timeout(), Duration::from_secs(1800));

        let tools = settings.tool_config().unwrap();
        assert_eq!(tools.git, "git");
        assert_eq!(tools.install.to_string(), "npm i --quiet");
        assert_eq!(tools.fetch_timeout, Duration::from_secs(300));
        assert_eq!(tools.install_timeout, Duration::from_secs(600));
        assert_eq!(settings.interpreter().unwrap().to_string(), "node");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_vars(with(&[
            ("PORT", "8080"),
            ("INSTALL_COMMAND", "yarn install --frozen-lockfile"),
            ("RUN_TIMEOUT_SECS", "60"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(
            settings.tool_config().unwrap().install.to_string(),
            "yarn install --frozen-lockfile"
        );
        assert_eq!(settings.run_timeout(), Duration::from_secs(60));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_each_required_variable_is_enforced() {
        for (name, _) in REQUIRED {
            let err = Settings::from_vars(without(name)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(n) if n == name), "{name}");
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = without("REPO_OWNER");
        vars.push(("REPO_OWNER".to_string(), "  ".to_string()));
        let err = Settings::from_vars(vars).unwrap_err();
        assert_eq!(err.to_string(), "REPO_OWNER is required");
    }

    #[test]
    fn test_empty_optional_value_falls_back_to_default() {
        let settings = Settings::from_vars(with(&[("HOST", "")])).unwrap();
        assert_eq!(settings.host, "0.0.0.0");
    }

    #[test]
    fn test_zero_port_and_timeout_rejected() {
        assert!(matches!(
            Settings::from_vars(with(&[("PORT", "0")])).unwrap_err(),
            ConfigError::Invalid { name: "PORT", .. }
        ));
        assert!(matches!(
            Settings::from_vars(with(&[("FETCH_TIMEOUT_SECS", "0")])).unwrap_err(),
            ConfigError::Invalid { name: "FETCH_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_non_numeric_port_is_load_error() {
        let err = Settings::from_vars(with(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings::from_vars(with(&[])).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
