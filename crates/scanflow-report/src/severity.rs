//! Severity ranking
//!
//! A single total order used by both filtering and display grouping, so the
//! two can never disagree.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vulnerability severity, ordered UNKNOWN < LOW < MEDIUM < HIGH < CRITICAL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Unknown = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Severity {
    /// Display order for summaries and grouped report sections.
    /// UNKNOWN is deliberately absent: unranked findings are listed but not
    /// counted in severity cards.
    pub const DISPLAY_ORDER: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Numeric rank used for threshold filtering.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Lenient conversion for scanner output. Scanners occasionally emit
    /// severities outside the usual five; those collapse to `Unknown`
    /// instead of failing the whole parse.
    pub fn from_label(label: &str) -> Severity {
        Severity::from_str(label).unwrap_or(Severity::Unknown)
    }

    /// Lowercase name, used as a CSS class in the HTML report.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Severity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            "UNKNOWN" => Ok(Severity::Unknown),
            other => Err(ReportError::UnknownSeverity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Unknown);

        assert_eq!(Severity::Critical.rank(), 4);
        assert_eq!(Severity::Unknown.rank(), 0);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("High".parse::<Severity>().unwrap(), Severity::High);
        assert!("catastrophic".parse::<Severity>().is_err());
    }

    #[test]
    fn test_from_label_collapses_to_unknown() {
        assert_eq!(Severity::from_label("MEDIUM"), Severity::Medium);
        assert_eq!(Severity::from_label("NEGLIGIBLE"), Severity::Unknown);
        assert_eq!(Severity::from_label(""), Severity::Unknown);
    }

    #[test]
    fn test_display_order_excludes_unknown() {
        assert!(!Severity::DISPLAY_ORDER.contains(&Severity::Unknown));
        assert_eq!(Severity::DISPLAY_ORDER[0], Severity::Critical);
    }
}
