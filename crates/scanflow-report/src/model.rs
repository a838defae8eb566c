//! Scan report model
//!
//! A report is immutable once built: filtering returns a new report and the
//! summary is derived at construction time.

use crate::severity::Severity;
use serde::Serialize;

/// A single vulnerability finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vulnerability {
    /// Advisory identifier (CVE-..., GHSA-..., ...)
    pub id: String,

    /// Affected package name
    pub package: String,

    /// Version found in the image
    pub installed_version: String,

    /// First fixed version, if the advisory names one
    pub fixed_version: Option<String>,

    pub severity: Severity,

    pub title: String,

    pub description: String,
}

/// Per-severity counts derived from a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl Summary {
    fn of(vulnerabilities: &[Vulnerability]) -> Self {
        let mut summary = Summary::default();
        for vuln in vulnerabilities {
            match vuln.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.unknown
    }
}

/// An ordered sequence of findings plus its derived summary.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    vulnerabilities: Vec<Vulnerability>,
    summary: Summary,
}

impl ScanReport {
    pub fn new(vulnerabilities: Vec<Vulnerability>) -> Self {
        let summary = Summary::of(&vulnerabilities);
        Self {
            vulnerabilities,
            summary,
        }
    }

    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        &self.vulnerabilities
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.vulnerabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty()
    }

    /// Returns a new report keeping only findings with severity rank at or
    /// above `min`. Relative order is preserved.
    pub fn filter_by_severity(&self, min: Severity) -> ScanReport {
        let kept = self
            .vulnerabilities
            .iter()
            .filter(|v| v.severity >= min)
            .cloned()
            .collect();
        ScanReport::new(kept)
    }

    /// Findings with the given severity, in report order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Vulnerability> {
        self.vulnerabilities
            .iter()
            .filter(move |v| v.severity == severity)
    }
}

#[cfg(test)]
pub(crate) fn sample_vulnerability(id: &str, severity: Severity) -> Vulnerability {
    Vulnerability {
        id: id.to_string(),
        package: "libexample".to_string(),
        installed_version: "1.0.0".to_string(),
        fixed_version: Some("1.0.1".to_string()),
        severity,
        title: format!("{} in libexample", id),
        description: "An example finding".to_string(),
    }
}
