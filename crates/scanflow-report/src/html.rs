//! HTML report rendering
//!
//! Renders a report into a standalone HTML document via a Tera template:
//! one summary card per non-empty ranked severity, then one detail block per
//! finding grouped in display order. Findings with unknown severity appear
//! in the detail section but never get a summary card.

use crate::error::{ReportError, Result};
use crate::model::{ScanReport, Vulnerability};
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE: &str = include_str!("templates/report.html.tera");

#[derive(Serialize)]
struct CardContext {
    severity: String,
    class: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct VulnContext<'a> {
    id: &'a str,
    title: &'a str,
    package: &'a str,
    installed_version: &'a str,
    fixed_version: Option<&'a str>,
    severity: String,
    class: &'static str,
    description: &'a str,
}

impl<'a> From<&'a Vulnerability> for VulnContext<'a> {
    fn from(vuln: &'a Vulnerability) -> Self {
        Self {
            id: &vuln.id,
            title: &vuln.title,
            package: &vuln.package,
            installed_version: &vuln.installed_version,
            fixed_version: vuln.fixed_version.as_deref(),
            severity: vuln.severity.to_string(),
            class: vuln.severity.css_class(),
            description: &vuln.description,
        }
    }
}

/// Render the report as an HTML document. Pure: the timestamp comes from the
/// caller and nothing is written anywhere.
pub fn render_html(
    report: &ScanReport,
    job_id: &str,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let cards: Vec<CardContext> = Severity::DISPLAY_ORDER
        .iter()
        .filter(|&&severity| report.summary().count(severity) > 0)
        .map(|&severity| CardContext {
            severity: severity.to_string(),
            class: severity.css_class(),
            count: report.summary().count(severity),
        })
        .collect();

    // detail blocks grouped by severity in display order, unranked last
    let mut vulnerabilities: Vec<VulnContext<'_>> = Vec::with_capacity(report.len());
    for severity in Severity::DISPLAY_ORDER {
        vulnerabilities.extend(report.with_severity(severity).map(VulnContext::from));
    }
    vulnerabilities.extend(report.with_severity(Severity::Unknown).map(VulnContext::from));

    let mut context = Context::new();
    context.insert("job_id", job_id);
    context.insert(
        "generated_at",
        &generated_at.format("%B %e, %Y %H:%M:%S UTC").to_string(),
    );
    context.insert("cards", &cards);
    context.insert("vulnerabilities", &vulnerabilities);

    Tera::one_off(TEMPLATE, &context, true)
        .map_err(|e| ReportError::Template(e.to_string()))
}
