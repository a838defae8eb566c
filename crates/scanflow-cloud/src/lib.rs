//! Remote build-and-scan orchestration for scanflow
//!
//! This crate talks to the remote build service and object store: it owns
//! the job specification, the operation poller, artifact retrieval and the
//! storage gateway. All remote state lives behind the `BuildService` and
//! `ObjectStore` traits; the concrete implementations speak the Cloud Build
//! and Cloud Storage REST APIs over rustls.

pub mod error;
pub mod job;
pub mod poller;
pub mod progress;
pub mod retrieve;
pub mod service;
pub mod storage;

pub use error::{CloudError, Result};
pub use job::{BuildJob, JobSpec, resolve_dockerfile};
pub use poller::{JobOutcome, JobState, POLL_INTERVAL, wait_for_completion};
pub use progress::JobProgress;
pub use retrieve::{LintIssue, retrieve_lint_results, retrieve_scan_results};
pub use service::{BuildService, OperationHandle, OperationStatus, RemoteBuildService};
pub use storage::{GcsStore, ObjectStore};
