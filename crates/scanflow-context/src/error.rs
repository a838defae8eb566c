use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Failed to read ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ContextError>;
