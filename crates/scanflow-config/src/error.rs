use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project is required: set SCANFLOW_PROJECT in .scanflow.env or project in .scanflow.yaml")]
    MissingProject,

    #[error(
        "no credentials configured: set token or token_file in the configuration, \
         or export SCANFLOW_TOKEN or GOOGLE_OAUTH_ACCESS_TOKEN"
    )]
    MissingCredentials,

    #[error("Failed to read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
