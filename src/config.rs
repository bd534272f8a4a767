//! Run configuration.
//!
//! Settings come from four layers, highest first: command-line flags, the
//! environment, an optional `release-on-tag.toml` in the working directory
//! (or the file passed with `--config`), and built-in defaults. The GitHub
//! token is only ever read from `GH_TOKEN`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::github::DEFAULT_API_URL;
use crate::upload::TransportKind;

/// Environment variable holding the GitHub token.
pub const TOKEN_ENV_VAR: &str = "GH_TOKEN";

/// Environment variable overriding the API base URL (set on GitHub runners).
const API_URL_ENV_VAR: &str = "GITHUB_API_URL";

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "release-on-tag.toml";

pub const DEFAULT_APP_REPO: &str = "lbryio/lbry-app";
pub const DEFAULT_DAEMON_REPO: &str = "lbryio/lbrynet-daemon";
pub const DEFAULT_CURL_PROGRAM: &str = "curl";

/// Contents of the TOML config file. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    /// GitHub API base URL.
    pub api_url: Option<String>,
    /// `owner/name` of the repository receiving the installer.
    pub app_repo: Option<String>,
    /// `owner/name` of the repository receiving the daemon binary.
    pub daemon_repo: Option<String>,
    /// How assets are POSTed: `curl` or `http`.
    pub transport: Option<TransportKind>,
    /// Program run by the curl transport.
    pub curl_program: Option<String>,
}

/// Per-invocation values from command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub app_repo: Option<String>,
    pub daemon_repo: Option<String>,
    pub transport: Option<TransportKind>,
    pub curl_program: Option<String>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub app_repo: String,
    pub daemon_repo: String,
    pub transport: TransportKind,
    pub curl_program: String,
}

impl Settings {
    /// Whether the API URL is plain HTTP (the token would travel unencrypted).
    pub fn is_non_https(&self) -> bool {
        !self.api_url.starts_with("https://")
    }
}

impl ReleaseConfig {
    /// Default config path for a working directory.
    pub fn default_path(workdir: &Path) -> PathBuf {
        workdir.join(CONFIG_FILE_NAME)
    }

    /// Load the config for a run.
    ///
    /// An explicit path must exist. The default path is optional; a missing
    /// file yields defaults. Parse errors are always hard failures.
    pub fn load(workdir: &Path, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let contents = std::fs::read_to_string(path).with_context(|| {
                    format!("failed to read config file at {}", path.display())
                })?;
                Self::parse(&contents, path)
            }
            None => Self::load_from(&Self::default_path(workdir)),
        }
    }

    /// Load config from a path. Returns defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file at {}", path.display()))
            }
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    /// Resolve the effective settings, reading `GITHUB_API_URL`.
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings> {
        self.resolve_with_env(overrides, std::env::var(API_URL_ENV_VAR).ok())
    }

    /// Resolver that takes the env var value as a parameter for testability.
    ///
    /// Empty or whitespace-only values at any layer fall through to the next.
    fn resolve_with_env(
        &self,
        overrides: &Overrides,
        env_api_url: Option<String>,
    ) -> Result<Settings> {
        let api_url = non_empty_trimmed(overrides.api_url.clone())
            .or_else(|| non_empty_trimmed(env_api_url))
            .or_else(|| non_empty_trimmed(self.api_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let app_repo = non_empty_trimmed(overrides.app_repo.clone())
            .or_else(|| non_empty_trimmed(self.app_repo.clone()))
            .unwrap_or_else(|| DEFAULT_APP_REPO.to_string());
        validate_repo_name(&app_repo)?;

        let daemon_repo = non_empty_trimmed(overrides.daemon_repo.clone())
            .or_else(|| non_empty_trimmed(self.daemon_repo.clone()))
            .unwrap_or_else(|| DEFAULT_DAEMON_REPO.to_string());
        validate_repo_name(&daemon_repo)?;

        let transport = overrides.transport.or(self.transport).unwrap_or_default();

        let curl_program = non_empty_trimmed(overrides.curl_program.clone())
            .or_else(|| non_empty_trimmed(self.curl_program.clone()))
            .unwrap_or_else(|| DEFAULT_CURL_PROGRAM.to_string());

        Ok(Settings {
            api_url,
            app_repo,
            daemon_repo,
            transport,
            curl_program,
        })
    }
}

/// Read the GitHub token from `GH_TOKEN`.
pub fn github_token() -> Result<String> {
    token_from(std::env::var(TOKEN_ENV_VAR).ok())
}

fn token_from(value: Option<String>) -> Result<String> {
    match non_empty_trimmed(value) {
        Some(token) => Ok(token),
        None => bail!("{TOKEN_ENV_VAR} is not set; a GitHub token is required to publish assets"),
    }
}

/// Require `owner/name` with both halves non-empty.
pub fn validate_repo_name(name: &str) -> Result<()> {
    match name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(())
        }
        _ => bail!("Invalid repository name '{name}': expected 'owner/name'"),
    }
}

/// Return the trimmed value if non-empty after trimming, otherwise `None`.
fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
