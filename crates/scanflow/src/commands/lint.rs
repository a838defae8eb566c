//! `scanflow lint` — remote Dockerfile lint
//!
//! Reuses the scan pipeline's upload, polling and retrieval; the job is a
//! single linter step whose findings come back as the job artifact.

use colored::Colorize;
use scanflow_cloud::{
    BuildJob, BuildService, CloudError, GcsStore, JobProgress, JobSpec, JobState, ObjectStore,
    RemoteBuildService, resolve_dockerfile, retrieve_lint_results, wait_for_completion,
};
use scanflow_config::Config;
use scanflow_context::ContextArchiver;
use std::path::Path;
use tokio::sync::watch;

pub async fn handle(config: &Config, context: &Path, file: &Path) -> anyhow::Result<()> {
    let credentials = config.credentials()?;

    let context_root = context
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("build context not found: {}: {}", context.display(), e))?;
    let dockerfile = resolve_dockerfile(&context_root, file)?;

    println!("{}", "Linting Dockerfile remotely...".blue());
    let job = BuildJob::new(&config.project);

    let archive_root = context_root.clone();
    let (archive, _stats) =
        tokio::task::spawn_blocking(move || ContextArchiver::archive(&archive_root)).await??;

    let client = reqwest::Client::new();
    let store = GcsStore::new(client.clone(), &config.project, &credentials);
    let service = RemoteBuildService::new(client, &config.project, &config.region, &credentials);

    store.ensure_bucket(job.bucket()).await?;
    let spool = tokio::fs::File::from_std(archive.into_file());
    store.upload(job.bucket(), &job.context_key(), spool).await?;

    let spec = JobSpec::lint(&job, &dockerfile);
    let handle = service.create_build(&spec).await?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let progress = JobProgress::new("Waiting for lint to complete...");
    let outcome = match wait_for_completion(
        &service,
        &handle,
        config.poll_budget(),
        cancel_rx,
        Some(&progress),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    };

    match outcome.state {
        JobState::Succeeded => progress.finish_success("Lint completed"),
        JobState::Failed => {
            let status = outcome.status.unwrap_or_else(|| "FAILURE".to_string());
            progress.finish_error(&status);
            return Err(CloudError::BuildFailed(status).into());
        }
        JobState::TimedOut => {
            progress.finish_error("timed out");
            return Err(CloudError::Timeout(config.poll_budget()).into());
        }
        state => anyhow::bail!("unexpected non-terminal job state: {}", state),
    }

    let issues = retrieve_lint_results(&store, &job).await?;

    if issues.is_empty() {
        println!("{}", "No issues found in your Dockerfile".green());
    } else {
        println!();
        println!("Found {} issues in your Dockerfile:", issues.len());
        println!();
        for issue in &issues {
            println!("Line {}: {}", issue.line, issue.message);
            println!("Level: {}", issue.level);
            println!("Code: {}", issue.code);
            println!();
        }
    }

    if let Err(e) = store.delete(job.bucket(), &job.context_key()).await {
        tracing::warn!(error = %e, "Failed to delete uploaded build context");
        println!(
            "{}",
            format!("Warning: failed to clean up build context: {}", e).yellow()
        );
    }

    Ok(())
}
