//! Fixed-width table rendering

use crate::model::ScanReport;

const HEADERS: [&str; 5] = ["SEVERITY", "PACKAGE", "VERSION", "FIXED IN", "TITLE"];

/// Render the report as a fixed-width text table, one row per finding in
/// report order. Pure: the caller decides where the text goes.
pub fn render_table(report: &ScanReport) -> String {
    let rows: Vec<[String; 5]> = report
        .vulnerabilities()
        .iter()
        .map(|v| {
            [
                v.severity.to_string(),
                v.package.clone(),
                v.installed_version.clone(),
                v.fixed_version.clone().unwrap_or_default(),
                v.title.clone(),
            ]
        })
        .collect();

    // column width = widest cell, header included
    let mut widths: [usize; 5] = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &HEADERS.map(String::from), &widths);
    let separator = widths.map(|w| "-".repeat(w));
    write_row(&mut out, &separator, &widths);
    for row in &rows {
        write_row(&mut out, row, &widths);
    }
    out
}

fn write_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        // no trailing padding on the last column
        if i < cells.len() - 1 {
            for _ in cell.len()..*width {
                out.push(' ');
            }
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScanReport, Summary, sample_vulnerability};
    use crate::severity::Severity;

    fn sample_report() -> ScanReport {
        ScanReport::new(vec![
            sample_vulnerability("CVE-2024-0001", Severity::Critical),
            sample_vulnerability("CVE-2024-0002", Severity::High),
            sample_vulnerability("CVE-2024-0003", Severity::High),
            sample_vulnerability("CVE-2024-0004", Severity::Medium),
            sample_vulnerability("CVE-2024-0005", Severity::Unknown),
        ])
    }

    #[test]
    fn test_header_and_separator() {
        let table = render_table(&sample_report());
        let mut lines = table.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("SEVERITY"));
        assert!(header.contains("FIXED IN"));
        let separator = lines.next().unwrap();
        assert!(separator.chars().all(|c| c == '-' || c == ' '));
    }

    #[test]
    fn test_one_row_per_vulnerability_in_order() {
        let report = sample_report();
        let table = render_table(&report);
        // two header lines plus one row per finding
        assert_eq!(table.lines().count(), 2 + report.len());

        let first_row = table.lines().nth(2).unwrap();
        assert!(first_row.starts_with("CRITICAL"));
    }

    #[test]
    fn test_counts_round_trip_through_table() {
        let report = sample_report();
        let table = render_table(&report);

        // re-scan the rendered rows and rebuild the per-severity counts
        let mut recounted = Summary::default();
        for row in table.lines().skip(2) {
            match row.split_whitespace().next() {
                Some("CRITICAL") => recounted.critical += 1,
                Some("HIGH") => recounted.high += 1,
                Some("MEDIUM") => recounted.medium += 1,
                Some("LOW") => recounted.low += 1,
                Some("UNKNOWN") => recounted.unknown += 1,
                _ => {}
            }
        }
        assert_eq!(&recounted, report.summary());
    }

    #[test]
    fn test_empty_report_renders_header_only() {
        let table = render_table(&ScanReport::new(Vec::new()));
        assert_eq!(table.lines().count(), 2);
    }
}
