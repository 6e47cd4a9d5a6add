//! Score-to-label classification for contract risk.
//!
//! The evaluation service scores each clause and averages the per-clause
//! scores onto a roughly 1..3 scale (Low = 1, Medium = 2, High = 3). This
//! module maps those averages onto discrete [`RiskLevel`]s and tallies
//! clause-level labels into [`RiskCounts`].
//!
//! # Thresholds
//!
//! One canonical pair is used everywhere in the workspace:
//!
//! - `score <= 1.5` → Low
//! - `1.5 < score <= 2.3` → Medium
//! - `score > 2.3` → High
//! - non-finite or missing → Unknown

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ClauseFinding;

/// Upper bound (inclusive) of the Low band.
pub const LOW_MAX: f64 = 1.5;

/// Upper bound (inclusive) of the Medium band.
pub const MEDIUM_MAX: f64 = 2.3;

/// Discrete risk label for a clause or a whole contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised risk level: {0:?}")]
pub struct ParseRiskLevelError(pub String);

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }

    /// Severity rank: Low = 1, Medium = 2, High = 3. `Unknown` has no rank.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Low => Some(1),
            Self::Medium => Some(2),
            Self::High => Some(3),
            Self::Unknown => None,
        }
    }

    /// Text shown on the risk badge, e.g. "High Risk".
    pub fn badge(&self) -> String {
        format!("{} Risk", self.as_str())
    }

    /// One-line recommendation shown under the summary.
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::High => Some(
                "Multiple high-risk clauses found. Recommend legal review and negotiation of terms.",
            ),
            Self::Medium => {
                Some("Some clauses need attention. Consider modifying specific sections.")
            }
            Self::Low => Some("Contract appears low-risk on key categories, but review as needed."),
            Self::Unknown => None,
        }
    }

    /// Lenient parse for labels supplied by upstream services.
    ///
    /// Case and surrounding whitespace are ignored. Returns `None` for
    /// anything that is not one of the four labels, so callers can fall
    /// back to deriving a level from a score.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseRiskLevelError(s.to_string()))
    }
}

/// Map an average risk score onto a [`RiskLevel`].
///
/// Total: `None`, NaN and infinities all map to `Unknown`.
pub fn label_for_score(score: Option<f64>) -> RiskLevel {
    match score {
        Some(avg) if avg.is_finite() => {
            if avg <= LOW_MAX {
                RiskLevel::Low
            } else if avg <= MEDIUM_MAX {
                RiskLevel::Medium
            } else {
                RiskLevel::High
            }
        }
        _ => RiskLevel::Unknown,
    }
}

/// Clause tallies per known risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskCounts {
    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Unknown => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Tally findings into Low/Medium/High buckets.
///
/// Each finding is counted under its own label. Normalisation has already
/// derived labels the upstream omitted, so an `Unknown` here was declared
/// or underivable and is not counted in any bucket.
pub fn aggregate_counts(findings: &[ClauseFinding]) -> RiskCounts {
    let mut counts = RiskCounts::default();
    for finding in findings {
        match finding.risk_level {
            RiskLevel::Low => counts.low += 1,
            RiskLevel::Medium => counts.medium += 1,
            RiskLevel::High => counts.high += 1,
            RiskLevel::Unknown => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(level: RiskLevel, similarity: Option<f64>) -> ClauseFinding {
        ClauseFinding {
            sentence: "The Supplier shall indemnify the Customer".into(),
            matched_category: "Indemnification".into(),
            similarity_score: similarity,
            risk_level: level,
            cluster_id: None,
        }
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(label_for_score(Some(1.5)), RiskLevel::Low);
        assert_eq!(label_for_score(Some(1.51)), RiskLevel::Medium);
        assert_eq!(label_for_score(Some(2.3)), RiskLevel::Medium);
        assert_eq!(label_for_score(Some(2.31)), RiskLevel::High);
    }

    #[test]
    fn extremes_stay_in_range() {
        assert_eq!(label_for_score(Some(-4.0)), RiskLevel::Low);
        assert_eq!(label_for_score(Some(0.0)), RiskLevel::Low);
        assert_eq!(label_for_score(Some(1e9)), RiskLevel::High);
    }

    #[test]
    fn non_finite_is_unknown() {
        assert_eq!(label_for_score(None), RiskLevel::Unknown);
        assert_eq!(label_for_score(Some(f64::NAN)), RiskLevel::Unknown);
        assert_eq!(label_for_score(Some(f64::INFINITY)), RiskLevel::Unknown);
        assert_eq!(label_for_score(Some(f64::NEG_INFINITY)), RiskLevel::Unknown);
    }

    #[test]
    fn monotone_across_range() {
        let mut prev = 0u8;
        let mut score = -1.0;
        while score <= 4.0 {
            let rank = label_for_score(Some(score))
                .rank()
                .expect("finite scores are always ranked");
            assert!(rank >= prev, "severity dropped at {score}");
            prev = rank;
            score += 0.01;
        }
        assert_eq!(prev, 3);
    }

    #[test]
    fn parse_labels_leniently() {
        assert_eq!(RiskLevel::from_label("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label(" Medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_label("LOW"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_label("Unknown"), Some(RiskLevel::Unknown));
        assert_eq!(RiskLevel::from_label("Critical"), None);
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn badge_and_advice() {
        assert_eq!(RiskLevel::High.badge(), "High Risk");
        assert_eq!(RiskLevel::Unknown.badge(), "Unknown Risk");
        assert!(RiskLevel::Medium.advice().is_some());
        assert!(RiskLevel::Unknown.advice().is_none());
    }

    #[test]
    fn counts_use_declared_levels() {
        let findings = vec![
            finding(RiskLevel::High, Some(0.2)),
            finding(RiskLevel::High, None),
            finding(RiskLevel::Medium, Some(0.7)),
            finding(RiskLevel::Low, Some(0.9)),
        ];
        let counts = aggregate_counts(&findings);
        assert_eq!(
            counts,
            RiskCounts {
                low: 1,
                medium: 1,
                high: 2
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn declared_unknown_is_not_rederived_from_similarity() {
        let findings = vec![
            finding(RiskLevel::Unknown, Some(2.9)),
            finding(RiskLevel::Unknown, Some(1.0)),
            finding(RiskLevel::Medium, Some(2.9)),
        ];
        let counts = aggregate_counts(&findings);
        assert_eq!(counts.high, 0);
        assert_eq!(counts.low, 0);
        assert_eq!(counts.medium, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn unknown_findings_are_excluded_from_counts() {
        let findings = vec![
            finding(RiskLevel::Unknown, None),
            finding(RiskLevel::Unknown, Some(f64::NAN)),
            finding(RiskLevel::Low, Some(1.0)),
        ];
        let counts = aggregate_counts(&findings);
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.get(RiskLevel::Low), 1);
        assert_eq!(counts.get(RiskLevel::Unknown), 0);
    }

    #[test]
    fn counts_of_empty_slice() {
        assert_eq!(aggregate_counts(&[]), RiskCounts::default());
    }
}
