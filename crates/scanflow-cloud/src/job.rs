//! Build job identity and specification
//!
//! A job is identified by a process-unique ID and owns the object keys and
//! image tag derived from it. The specification is the wire-level build
//! request: a step sequence, a storage source and an artifact destination.
//! Once submitted, nothing here changes; only the job status moves.

use crate::error::{CloudError, Result};
use serde::Serialize;
use std::path::{Component, Path};
use uuid::Uuid;

pub const CONTEXT_OBJECT: &str = "context.tar.gz";
pub const SCAN_RESULTS_OBJECT: &str = "scan-results.json";
pub const LINT_RESULTS_OBJECT: &str = "lint-results.json";

/// Wall-clock limit enforced by the remote service, independent of the
/// client-side polling budget.
const JOB_TIMEOUT: &str = "1800s";

const DOCKER_BUILDER_IMAGE: &str = "gcr.io/cloud-builders/docker";
const SCANNER_IMAGE: &str = "aquasec/trivy";
const LINTER_IMAGE: &str = "hadolint/hadolint:latest-debian";

/// Identity of one build-and-scan invocation.
#[derive(Debug, Clone)]
pub struct BuildJob {
    id: String,
    bucket: String,
}

impl BuildJob {
    pub fn new(project: &str) -> Self {
        Self {
            id: format!("scanflow-{}", Uuid::new_v4()),
            bucket: format!("{}-scanflow-builds", project),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn context_key(&self) -> String {
        format!("{}/{}", self.id, CONTEXT_OBJECT)
    }

    pub fn scan_results_key(&self) -> String {
        format!("{}/{}", self.id, SCAN_RESULTS_OBJECT)
    }

    pub fn lint_results_key(&self) -> String {
        format!("{}/{}", self.id, LINT_RESULTS_OBJECT)
    }

    /// Image tag derived deterministically from the job ID.
    pub fn image_tag(&self, project: &str) -> String {
        format!("gcr.io/{}/{}", project, self.id)
    }

    #[cfg(test)]
    pub(crate) fn with_id(id: &str, project: &str) -> Self {
        Self {
            id: id.to_string(),
            bucket: format!("{}-scanflow-builds", project),
        }
    }
}

/// The build request sent to the remote service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    steps: Vec<BuildStep>,
    timeout: String,
    source: Source,
    artifacts: Artifacts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildStep {
    name: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entrypoint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Source {
    storage_source: StorageSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StorageSource {
    bucket: String,
    object: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Artifacts {
    objects: ArtifactObjects,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactObjects {
    location: String,
    paths: Vec<String>,
}

impl JobSpec {
    /// Two-step job: build the image from the uploaded context, then scan
    /// the built tag, declaring the scanner's output as the job artifact.
    pub fn build_and_scan(project: &str, job: &BuildJob, dockerfile: &str) -> Self {
        let tag = job.image_tag(project);
        let steps = vec![
            BuildStep {
                name: DOCKER_BUILDER_IMAGE.to_string(),
                args: vec![
                    "build".to_string(),
                    "-t".to_string(),
                    tag.clone(),
                    "-f".to_string(),
                    dockerfile.to_string(),
                    ".".to_string(),
                ],
                dir: Some("/workspace".to_string()),
                entrypoint: None,
            },
            BuildStep {
                name: SCANNER_IMAGE.to_string(),
                args: vec![
                    "image".to_string(),
                    "--format".to_string(),
                    "json".to_string(),
                    "--output".to_string(),
                    format!("/workspace/{}", SCAN_RESULTS_OBJECT),
                    tag,
                ],
                dir: None,
                entrypoint: None,
            },
        ];
        Self::with_steps(job, steps, SCAN_RESULTS_OBJECT)
    }

    /// Single-step Dockerfile lint. The linter writes its findings to the
    /// artifact path itself; a non-empty finding list is not a job failure.
    pub fn lint(job: &BuildJob, dockerfile: &str) -> Self {
        let steps = vec![BuildStep {
            name: LINTER_IMAGE.to_string(),
            args: vec![
                "-c".to_string(),
                format!(
                    "hadolint --format json {} > /workspace/{} || true",
                    dockerfile, LINT_RESULTS_OBJECT
                ),
            ],
            dir: Some("/workspace".to_string()),
            entrypoint: Some("/bin/sh".to_string()),
        }];
        Self::with_steps(job, steps, LINT_RESULTS_OBJECT)
    }

    fn with_steps(job: &BuildJob, steps: Vec<BuildStep>, artifact: &str) -> Self {
        Self {
            steps,
            timeout: JOB_TIMEOUT.to_string(),
            source: Source {
                storage_source: StorageSource {
                    bucket: job.bucket().to_string(),
                    object: job.context_key(),
                },
            },
            artifacts: Artifacts {
                objects: ArtifactObjects {
                    location: format!("gs://{}/{}", job.bucket(), job.id()),
                    paths: vec![artifact.to_string()],
                },
            },
        }
    }
}

/// Resolve the Dockerfile path relative to the context root.
///
/// A relative path is taken as relative to the root; the result must stay
/// inside the root since the remote builder only sees the uploaded context.
pub fn resolve_dockerfile(context_root: &Path, dockerfile: &Path) -> Result<String> {
    let absolute = if dockerfile.is_absolute() {
        dockerfile.to_path_buf()
    } else {
        context_root.join(dockerfile)
    };

    let canonical = absolute.canonicalize().map_err(|e| {
        CloudError::InvalidJob(format!("Dockerfile not found: {}: {}", absolute.display(), e))
    })?;
    let root = context_root.canonicalize().map_err(|e| {
        CloudError::InvalidJob(format!(
            "Build context not found: {}: {}",
            context_root.display(),
            e
        ))
    })?;

    let rel = canonical.strip_prefix(&root).map_err(|_| {
        CloudError::InvalidJob(format!(
            "Dockerfile {} is outside the build context {}",
            canonical.display(),
            root.display()
        ))
    })?;

    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(name) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&name.to_string_lossy());
        }
    }
    Ok(out)
}
