//! `scanflow scan` — the full remote build-and-scan pipeline

use crate::output::{self, OUTPUT_DIR};
use colored::Colorize;
use scanflow_cloud::{
    BuildJob, BuildService, GcsStore, JobProgress, JobSpec, JobState, ObjectStore,
    RemoteBuildService, resolve_dockerfile, retrieve_scan_results, wait_for_completion,
};
use scanflow_cloud::CloudError;
use scanflow_config::Config;
use scanflow_context::{ContextArchiver, format_size};
use scanflow_report::{Severity, render_table};
use std::path::Path;
use tokio::sync::watch;

pub async fn handle(
    config: &Config,
    context: &Path,
    file: &Path,
    severity: Option<String>,
) -> anyhow::Result<()> {
    let min_severity = min_severity(config, severity)?;
    let credentials = config.credentials()?;

    let context_root = context
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("build context not found: {}: {}", context.display(), e))?;
    let dockerfile = resolve_dockerfile(&context_root, file)?;

    println!("{}", "Starting remote build and scan...".blue());
    let job = BuildJob::new(&config.project);
    println!("Job ID: {}", job.id().cyan());
    println!("Using Dockerfile: {}", dockerfile.cyan());

    // Build context archive; the walk is blocking filesystem work
    println!("{}", "Preparing build context...".blue());
    let archive_root = context_root.clone();
    let (archive, stats) =
        tokio::task::spawn_blocking(move || ContextArchiver::archive(&archive_root)).await??;

    println!("  Files included: {} ({})", stats.files_included, format_size(stats.bytes_included));
    println!(
        "  {}",
        format!(
            "Files excluded: {} ({})",
            stats.files_excluded,
            format_size(stats.bytes_excluded)
        )
        .yellow()
    );
    println!("  Archive size: {}", format_size(archive.size()).green());

    let client = reqwest::Client::new();
    let store = GcsStore::new(client.clone(), &config.project, &credentials);
    let service = RemoteBuildService::new(client, &config.project, &config.region, &credentials);

    store.ensure_bucket(job.bucket()).await?;

    let progress = JobProgress::new("Uploading build context...");
    let spool = tokio::fs::File::from_std(archive.into_file());
    match store.upload(job.bucket(), &job.context_key(), spool).await {
        Ok(()) => progress.finish_success("Build context uploaded"),
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    }

    // Submit the two-step job
    let spec = JobSpec::build_and_scan(&config.project, &job, &dockerfile);
    let handle = service.create_build(&spec).await?;

    // Ctrl-C requests cancellation; the poller races it against its timer
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let progress = JobProgress::new("Waiting for build to complete...");
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
        JobState::Succeeded => progress.finish_success("Build completed"),
        JobState::Failed => {
            let status = outcome.status.unwrap_or_else(|| "FAILURE".to_string());
            progress.finish_error(&status);
            return Err(CloudError::BuildFailed(status).into());
        }
        JobState::TimedOut => {
            progress.finish_error("timed out");
            return Err(CloudError::Timeout(config.poll_budget()).into());
        }
        // the poller only returns terminal states
        state => anyhow::bail!("unexpected non-terminal job state: {}", state),
    }

    println!("{}", "Retrieving scan results...".blue());
    let output_dir = Path::new(OUTPUT_DIR);
    let (report, raw_path) = retrieve_scan_results(&store, &job, output_dir).await?;

    let html_path = output::write_html(&report, job.id(), output_dir)?;
    let summary_path = output::write_summary(&report, job.id(), output_dir)?;

    println!();
    let shown = report.filter_by_severity(min_severity);
    if shown.is_empty() {
        println!("{}", "No vulnerabilities found".green());
    } else {
        print!("{}", render_table(&shown));
    }

    let summary = report.summary();
    println!();
    println!("Total vulnerabilities: {}", summary.total());
    println!("  Critical: {}", summary.critical.to_string().red());
    println!("  High: {}", summary.high);
    println!("  Medium: {}", summary.medium);
    println!("  Low: {}", summary.low);
    println!("  Unknown: {}", summary.unknown);

    let duration = outcome.finished_at - outcome.started_at;
    println!("Build duration: {}s", duration.num_seconds());

    println!();
    println!("{}", "Results written to:".bold());
    println!("  {}", raw_path.display());
    println!("  {}", html_path.display());
    println!("  {}", summary_path.display());

    // best-effort: the job already produced its result
    if let Err(e) = store.delete(job.bucket(), &job.context_key()).await {
        tracing::warn!(error = %e, "Failed to delete uploaded build context");
        println!(
            "{}",
            format!("Warning: failed to clean up build context: {}", e).yellow()
        );
    }

    Ok(())
}

fn min_severity(config: &Config, flag: Option<String>) -> anyhow::Result<Severity> {
    let label = flag.or_else(|| config.severity.clone());
    match label {
        Some(label) => label
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid severity: {}", label)),
        None => Ok(Severity::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_severity(severity: Option<&str>) -> Config {
        Config {
            project: "p".to_string(),
            region: "global".to_string(),
            token: Some("t".to_string()),
            token_file: None,
            severity: severity.map(String::from),
            timeout_minutes: 30,
        }
    }

    #[test]
    fn test_min_severity_defaults_to_unknown() {
        let config = config_with_severity(None);
        assert_eq!(min_severity(&config, None).unwrap(), Severity::Unknown);
    }

    #[test]
    fn test_min_severity_flag_overrides_config() {
        let config = config_with_severity(Some("LOW"));
        assert_eq!(
            min_severity(&config, Some("high".to_string())).unwrap(),
            Severity::High
        );
        assert_eq!(min_severity(&config, None).unwrap(), Severity::Low);
    }

    #[test]
    fn test_min_severity_rejects_garbage() {
        let config = config_with_severity(None);
        assert!(min_severity(&config, Some("urgent".to_string())).is_err());
    }
}
