//! Persisted report outputs
//!
//! One set of sibling files per job under a fixed output directory: the raw
//! artifact (written by the retriever), a human-readable summary and an
//! HTML document. The renderers themselves are pure; this module is where
//! their output hits the disk.

use anyhow::Result;
use chrono::Utc;
use scanflow_report::{ScanReport, render_html, render_table};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR: &str = "scanflow";

pub fn write_html(report: &ScanReport, job_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}-report.html", job_id));
    let html = render_html(report, job_id, Utc::now())?;
    std::fs::write(&path, html)?;
    Ok(path)
}

pub fn write_summary(report: &ScanReport, job_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}-summary.txt", job_id));
    std::fs::write(&path, summary_text(report, job_id))?;
    Ok(path)
}

fn summary_text(report: &ScanReport, job_id: &str) -> String {
    let summary = report.summary();
    let mut out = String::new();
    let _ = writeln!(out, "Scan summary for {}", job_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "Total vulnerabilities: {}", summary.total());
    let _ = writeln!(out, "Critical: {}", summary.critical);
    let _ = writeln!(out, "High: {}", summary.high);
    let _ = writeln!(out, "Medium: {}", summary.medium);
    let _ = writeln!(out, "Low: {}", summary.low);
    let _ = writeln!(out, "Unknown: {}", summary.unknown);
    let _ = writeln!(out);
    out.push_str(&render_table(report));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanflow_report::{ScanReport, Severity, Vulnerability};
    use tempfile::tempdir;

    fn report() -> ScanReport {
        ScanReport::new(vec![Vulnerability {
            id: "CVE-2024-1".to_string(),
            package: "openssl".to_string(),
            installed_version: "3.0.1".to_string(),
            fixed_version: Some("3.0.2".to_string()),
            severity: Severity::Critical,
            title: "Something bad".to_string(),
            description: "Details".to_string(),
        }])
    }

    #[test]
    fn test_write_summary() {
        let out = tempdir().unwrap();
        let path = write_summary(&report(), "scanflow-x", out.path()).unwrap();

        assert_eq!(path, out.path().join("scanflow-x-summary.txt"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Total vulnerabilities: 1"));
        assert!(text.contains("Critical: 1"));
        assert!(text.contains("openssl"));
    }

    #[test]
    fn test_write_html() {
        let out = tempdir().unwrap();
        let path = write_html(&report(), "scanflow-x", out.path()).unwrap();

        assert_eq!(path, out.path().join("scanflow-x-report.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("CVE-2024-1"));
    }
}
