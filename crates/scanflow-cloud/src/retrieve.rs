//! Artifact retrieval
//!
//! Fetches the artifact a completed job produced and parses it. A missing
//! artifact is a build/scan failure (`NotFound`), not a parse failure; raw
//! scan bytes are persisted verbatim before parsing so a parse failure
//! still leaves forensic data on disk.

use crate::error::Result;
use crate::job::BuildJob;
use crate::storage::ObjectStore;
use scanflow_report::ScanReport;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fetch and parse the scan artifact. Returns the report together with the
/// path of the persisted raw artifact.
pub async fn retrieve_scan_results(
    store: &dyn ObjectStore,
    job: &BuildJob,
    output_dir: &Path,
) -> Result<(ScanReport, PathBuf)> {
    let raw = store.download(job.bucket(), &job.scan_results_key()).await?;
    debug!(bytes = raw.len(), "Downloaded scan results");

    // persist before parsing: a parse failure must not lose the artifact
    tokio::fs::create_dir_all(output_dir).await?;
    let raw_path = output_dir.join(format!("{}-raw.json", job.id()));
    tokio::fs::write(&raw_path, &raw).await?;
    info!(path = %raw_path.display(), "Saved raw scan results");

    let report = scanflow_report::parse_report(&raw)?;
    Ok((report, raw_path))
}

/// One Dockerfile lint finding, as reported by hadolint.
#[derive(Debug, Clone, Deserialize)]
pub struct LintIssue {
    #[serde(default)]
    pub line: u32,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub level: String,

    #[serde(default)]
    pub message: String,
}

/// Fetch and parse the lint artifact produced by a lint job.
pub async fn retrieve_lint_results(
    store: &dyn ObjectStore,
    job: &BuildJob,
) -> Result<Vec<LintIssue>> {
    let raw = store.download(job.bucket(), &job.lint_results_key()).await?;
    let issues: Vec<LintIssue> =
        serde_json::from_slice(&raw).map_err(scanflow_report::ReportError::Format)?;
    debug!(count = issues.len(), "Parsed lint results");
    Ok(issues)
}
