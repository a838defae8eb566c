use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Remote request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication rejected by the remote service: {0}")]
    Auth(String),

    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("Remote API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid job configuration: {0}")]
    InvalidJob(String),

    #[error("Build failed with status {0}")]
    BuildFailed(String),

    #[error("Job did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Job cancelled before completion")]
    Cancelled,

    #[error("Scan report error: {0}")]
    Report(#[from] scanflow_report::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
