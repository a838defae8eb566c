//! Configuration management for scanflow
//!
//! Configuration merges three sources, highest priority first:
//! 1. `.scanflow.env` in the current directory (KEY=VALUE)
//! 2. `.scanflow.yaml` in the current directory
//! 3. `~/.scanflow.yaml`
//!
//! The remote project reference is required. Credentials are an opaque
//! access token, resolved from the configuration or from the environment.

pub mod error;

pub use error::{ConfigError, Result};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_FILE: &str = ".scanflow.env";
const YAML_FILE: &str = ".scanflow.yaml";

const TOKEN_ENV: &str = "SCANFLOW_TOKEN";
const FALLBACK_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const DEFAULT_REGION: &str = "global";
const DEFAULT_TIMEOUT_MINUTES: u64 = 30;

/// Resolved configuration, validated and with defaults applied.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote project reference (required)
    pub project: String,

    /// Remote region; `global` uses the service's default endpoint
    pub region: String,

    /// Access token, if configured directly
    pub token: Option<String>,

    /// Path to a file holding the access token
    pub token_file: Option<PathBuf>,

    /// Minimum severity for the printed table (unset keeps everything)
    pub severity: Option<String>,

    /// Client-side polling budget in minutes
    pub timeout_minutes: u64,
}

/// Opaque capability bundle for the remote APIs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
}

/// One configuration source before merging; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    project: Option<String>,
    region: Option<String>,
    token: Option<String>,
    token_file: Option<String>,
    severity: Option<String>,
    timeout_minutes: Option<u64>,
}

impl RawConfig {
    /// Fill fields this source leaves unset from a lower-priority source.
    fn merge(&mut self, lower: RawConfig) {
        self.project = self.project.take().or(lower.project);
        self.region = self.region.take().or(lower.region);
        self.token = self.token.take().or(lower.token);
        self.token_file = self.token_file.take().or(lower.token_file);
        self.severity = self.severity.take().or(lower.severity);
        self.timeout_minutes = self.timeout_minutes.take().or(lower.timeout_minutes);
    }
}

impl Config {
    /// Load configuration relative to the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(&std::env::current_dir()?)
    }

    /// Load configuration with `dir` standing in for the current directory.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut raw = load_env_file(&dir.join(ENV_FILE))?;

        if let Some(local) = load_yaml_file(&dir.join(YAML_FILE))? {
            raw.merge(local);
        }
        if let Some(home) = dirs::home_dir()
            && let Some(global) = load_yaml_file(&home.join(YAML_FILE))?
        {
            raw.merge(global);
        }

        let project = raw.project.unwrap_or_default();
        if project.is_empty() {
            return Err(ConfigError::MissingProject);
        }

        Ok(Config {
            project,
            region: raw
                .region
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            token: raw.token,
            token_file: raw.token_file.map(PathBuf::from),
            severity: raw.severity,
            timeout_minutes: raw.timeout_minutes.unwrap_or(DEFAULT_TIMEOUT_MINUTES),
        })
    }

    /// Resolve the access token: configured token, then token file, then the
    /// `SCANFLOW_TOKEN` / `GOOGLE_OAUTH_ACCESS_TOKEN` environment variables.
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token
            && !token.is_empty()
        {
            return Ok(Credentials {
                token: token.clone(),
            });
        }

        if let Some(path) = &self.token_file {
            let token = std::fs::read_to_string(path).map_err(|source| {
                ConfigError::TokenFile {
                    path: path.clone(),
                    source,
                }
            })?;
            return Ok(Credentials {
                token: token.trim().to_string(),
            });
        }

        for var in [TOKEN_ENV, FALLBACK_TOKEN_ENV] {
            if let Ok(token) = std::env::var(var)
                && !token.is_empty()
            {
                debug!(source = var, "Using access token from environment");
                return Ok(Credentials { token });
            }
        }

        Err(ConfigError::MissingCredentials)
    }

    /// Client-side budget for the job poller.
    pub fn poll_budget(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes * 60)
    }
}

fn load_yaml_file(path: &Path) -> Result<Option<RawConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let raw = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded configuration file");
    Ok(Some(raw))
}

/// Parse a KEY=VALUE env file, skipping blank and comment lines.
fn load_env_file(path: &Path) -> Result<RawConfig> {
    let mut raw = RawConfig::default();
    if !path.exists() {
        return Ok(raw);
    }

    let content = std::fs::read_to_string(path)?;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = strip_quotes(value.trim()).to_string();

        match key {
            "SCANFLOW_PROJECT" => raw.project = Some(value),
            "SCANFLOW_REGION" => raw.region = Some(value),
            "SCANFLOW_TOKEN" => raw.token = Some(value),
            "SCANFLOW_TOKEN_FILE" => raw.token_file = Some(value),
            "SCANFLOW_SEVERITY" => raw.severity = Some(value),
            "SCANFLOW_TIMEOUT_MINUTES" => {
                let minutes = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
                raw.timeout_minutes = Some(minutes);
            }
            _ => {}
        }
    }
    debug!(path = %path.display(), "Loaded env file");
    Ok(raw)
}

/// "value" → value, 'value' → value, value → value
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
