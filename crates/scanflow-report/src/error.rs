use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Scan results are not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Failed to render report template: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
