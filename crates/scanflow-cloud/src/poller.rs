//! Job status polling
//!
//! The poller samples the operation on a fixed interval until the service
//! reports a terminal outcome or the client-side budget runs out. The
//! inter-sample wait races the interval timer against a cancellation
//! signal; a cancellation observed before a terminal status always wins and
//! triggers a best-effort remote cancel. A status already observed as
//! terminal is never retracted.

use crate::error::{CloudError, Result};
use crate::progress::JobProgress;
use crate::service::{BuildService, OperationHandle};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Job lifecycle states. `Succeeded`, `Failed` and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Submitted => "submitted",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed-out",
        };
        write!(f, "{}", label)
    }
}

/// Terminal result of one polled job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub state: JobState,

    /// Service-reported status string, when the metadata carried one
    pub status: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationMetadata {
    #[serde(default)]
    build: Option<BuildMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildMetadata {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    finish_time: Option<String>,
}

/// Poll `handle` until it reaches a terminal state or `budget` elapses.
///
/// Returns the terminal outcome; only cancellation and transport failures
/// are errors. The caller decides how a `Failed` or `TimedOut` outcome is
/// surfaced.
pub async fn wait_for_completion(
    service: &dyn BuildService,
    handle: &OperationHandle,
    budget: Duration,
    mut cancel: watch::Receiver<bool>,
    progress: Option<&JobProgress>,
) -> Result<JobOutcome> {
    let submitted_at = Utc::now();
    let deadline = Instant::now() + budget;
    let mut state = JobState::Submitted;

    loop {
        // a cancellation observed before a terminal status wins
        if *cancel.borrow() {
            warn!("Cancellation requested, stopping polling");
            best_effort_cancel(service, handle).await;
            return Err(CloudError::Cancelled);
        }

        let status = service.get_operation(&handle.name).await?;

        if state == JobState::Submitted {
            state = JobState::Running;
            debug!("Job is running");
            if let Some(progress) = progress {
                progress.set_message("Build running...");
            }
        }

        if status.done {
            let outcome = terminal_outcome(status.metadata.as_ref(), submitted_at);
            info!(state = %outcome.state, "Job reached terminal state");
            return Ok(outcome);
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(?budget, "Polling budget exceeded");
            best_effort_cancel(service, handle).await;
            return Ok(JobOutcome {
                state: JobState::TimedOut,
                status: None,
                started_at: submitted_at,
                finished_at: Utc::now(),
            });
        }

        let interval = POLL_INTERVAL.min(deadline - now);
        wait_or_cancel(interval, &mut cancel).await;
    }
}

/// Sleep for `interval`, returning early when a cancellation arrives. A
/// closed channel means no cancellation can ever come; the full interval is
/// waited out instead of spinning.
async fn wait_or_cancel(interval: Duration, cancel: &mut watch::Receiver<bool>) {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        let changed = tokio::select! {
            _ = &mut sleep => return,
            changed = cancel.changed() => changed,
        };
        match changed {
            // sender gone, no cancellation can ever arrive; wait out the timer
            Err(_) => {
                sleep.as_mut().await;
                return;
            }
            Ok(()) if *cancel.borrow() => return,
            // flag flipped back to false; keep waiting
            Ok(()) => {}
        }
    }
}

async fn best_effort_cancel(service: &dyn BuildService, handle: &OperationHandle) {
    let Some(build_id) = &handle.build_id else {
        warn!("No build ID known, cannot signal the remote job");
        return;
    };
    if let Err(e) = service.cancel_build(build_id).await {
        warn!(error = %e, "Failed to signal the remote job to stop");
    }
}

/// Extract the terminal state and timing from the operation metadata.
/// Missing or malformed metadata never fails the pipeline; timestamps fall
/// back to local wall-clock bounds.
fn terminal_outcome(
    metadata: Option<&serde_json::Value>,
    submitted_at: DateTime<Utc>,
) -> JobOutcome {
    let build = metadata
        .and_then(|m| serde_json::from_value::<OperationMetadata>(m.clone()).ok())
        .and_then(|m| m.build)
        .unwrap_or_default();

    let state = match build.status.as_deref() {
        // an operation that completes without a status is taken as success;
        // a missing artifact downstream still surfaces the failure
        Some("SUCCESS") | None => JobState::Succeeded,
        Some(_) => JobState::Failed,
    };

    let started_at = parse_timestamp(build.start_time.as_deref()).unwrap_or(submitted_at);
    let finished_at = parse_timestamp(build.finish_time.as_deref()).unwrap_or_else(Utc::now);

    JobOutcome {
        state,
        status: build.status,
        started_at,
        finished_at,
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}
