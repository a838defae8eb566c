//! Scan artifact parsing
//!
//! The scanner (Trivy) writes one result group per scanned target. The
//! parser flattens those groups into a single ordered sequence, preserving
//! group order as received and source order within each group.

use crate::error::Result;
use crate::model::{ScanReport, Vulnerability};
use crate::severity::Severity;
use serde::Deserialize;

// the scanner writes `null` rather than `[]` for empty groups
#[derive(Debug, Deserialize)]
struct TrivyReport {
    #[serde(rename = "Results", default)]
    results: Option<Vec<TrivyResult>>,
}

#[derive(Debug, Deserialize)]
struct TrivyResult {
    #[serde(rename = "Vulnerabilities", default)]
    vulnerabilities: Option<Vec<TrivyVulnerability>>,
}

#[derive(Debug, Deserialize)]
struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID", default)]
    vulnerability_id: String,

    #[serde(rename = "PkgName", default)]
    pkg_name: String,

    #[serde(rename = "InstalledVersion", default)]
    installed_version: String,

    #[serde(rename = "FixedVersion", default)]
    fixed_version: String,

    #[serde(rename = "Severity", default)]
    severity: String,

    #[serde(rename = "Title", default)]
    title: String,

    #[serde(rename = "Description", default)]
    description: String,
}

/// Parse the raw scan artifact into a report.
///
/// Invalid JSON is a format error; the caller is expected to have persisted
/// the raw bytes already so the artifact survives for inspection.
pub fn parse_report(raw: &[u8]) -> Result<ScanReport> {
    let parsed: TrivyReport = serde_json::from_slice(raw)?;

    let mut vulnerabilities = Vec::new();
    for result in parsed.results.unwrap_or_default() {
        for vuln in result.vulnerabilities.unwrap_or_default() {
            vulnerabilities.push(Vulnerability {
                id: vuln.vulnerability_id,
                package: vuln.pkg_name,
                installed_version: vuln.installed_version,
                fixed_version: if vuln.fixed_version.is_empty() {
                    None
                } else {
                    Some(vuln.fixed_version)
                },
                severity: Severity::from_label(&vuln.severity),
                title: vuln.title,
                description: vuln.description,
            });
        }
    }

    tracing::debug!(count = vulnerabilities.len(), "Parsed scan results");
    Ok(ScanReport::new(vulnerabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_groups_in_order() {
        let raw = br#"{
            "Results": [
                {"Vulnerabilities": [
                    {"VulnerabilityID": "CVE-A", "PkgName": "p1", "InstalledVersion": "1", "Severity": "HIGH"},
                    {"VulnerabilityID": "CVE-B", "PkgName": "p2", "InstalledVersion": "2", "Severity": "LOW"}
                ]},
                {"Vulnerabilities": [
                    {"VulnerabilityID": "CVE-C", "PkgName": "p3", "InstalledVersion": "3", "Severity": "CRITICAL"}
                ]}
            ]
        }"#;

        let report = parse_report(raw).unwrap();
        let ids: Vec<&str> = report
            .vulnerabilities()
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(ids, vec!["CVE-A", "CVE-B", "CVE-C"]);
    }

    #[test]
    fn test_empty_fixed_version_becomes_none() {
        let raw = br#"{
            "Results": [
                {"Vulnerabilities": [
                    {"VulnerabilityID": "CVE-A", "PkgName": "p", "InstalledVersion": "1",
                     "FixedVersion": "", "Severity": "HIGH"},
                    {"VulnerabilityID": "CVE-B", "PkgName": "p", "InstalledVersion": "1",
                     "FixedVersion": "1.2", "Severity": "HIGH"}
                ]}
            ]
        }"#;

        let report = parse_report(raw).unwrap();
        assert_eq!(report.vulnerabilities()[0].fixed_version, None);
        assert_eq!(
            report.vulnerabilities()[1].fixed_version.as_deref(),
            Some("1.2")
        );
    }

    #[test]
    fn test_unexpected_severity_collapses_to_unknown() {
        let raw = br#"{
            "Results": [
                {"Vulnerabilities": [
                    {"VulnerabilityID": "CVE-A", "PkgName": "p", "InstalledVersion": "1",
                     "Severity": "NEGLIGIBLE"}
                ]}
            ]
        }"#;

        let report = parse_report(raw).unwrap();
        assert_eq!(report.vulnerabilities()[0].severity, Severity::Unknown);
    }

    #[test]
    fn test_results_without_vulnerabilities() {
        // Targets with nothing found omit the key or write null
        let raw = br#"{"Results": [{}, {"Vulnerabilities": []}, {"Vulnerabilities": null}]}"#;
        let report = parse_report(raw).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_null_results() {
        let report = parse_report(br#"{"Results": null}"#).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let result = parse_report(b"not json at all");
        assert!(matches!(
            result,
            Err(crate::error::ReportError::Format(_))
        ));
    }
}
