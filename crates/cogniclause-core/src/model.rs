//! Canonical presentation model shared by the session, history, and renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::risk::{self, RiskCounts, RiskLevel};

/// One analysed sentence of a contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseFinding {
    pub sentence: String,
    /// Legal category of the nearest clause cluster, `"Unknown"` if none.
    pub matched_category: String,
    /// Similarity to the matched cluster. Not normalised to any fixed range.
    pub similarity_score: Option<f64>,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

/// Normalised outcome of one evaluation, independent of the upstream shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub average_risk_score: Option<f64>,
    pub risk_level: RiskLevel,
    /// Findings in upstream (document) order.
    pub details: Vec<ClauseFinding>,
}

impl EvaluationResult {
    /// Result for a response with nothing usable in it.
    pub fn empty() -> Self {
        Self {
            average_risk_score: None,
            risk_level: RiskLevel::Unknown,
            details: Vec::new(),
        }
    }

    pub fn counts(&self) -> RiskCounts {
        risk::aggregate_counts(&self.details)
    }

    pub fn summary(&self) -> RiskSummary {
        RiskSummary {
            level: self.risk_level,
            average_risk_score: self.average_risk_score,
            counts: self.counts(),
            advice: self.risk_level.advice(),
        }
    }

    /// Re-encode in the evaluation service's wire shape.
    ///
    /// Feeding the output back through [`crate::normalize::normalize`]
    /// yields an equal result.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Upload metadata echoed back by the document service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DocumentInfo {
    pub filename: Option<String>,
    pub text_preview: Option<String>,
}

/// Summary block: overall level, average, per-level clause counts, advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    pub level: RiskLevel,
    pub average_risk_score: Option<f64>,
    pub counts: RiskCounts,
    pub advice: Option<&'static str>,
}

/// A persisted evaluation, as listed by the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: String,
    pub name: String,
    /// Contract text. Only used for search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub level: RiskLevel,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(level: RiskLevel, similarity: Option<f64>) -> ClauseFinding {
        ClauseFinding {
            sentence: "Either party may terminate on thirty days notice".into(),
            matched_category: "Termination".into(),
            similarity_score: similarity,
            risk_level: level,
            cluster_id: Some("7".into()),
        }
    }

    #[test]
    fn summary_reflects_details() {
        let result = EvaluationResult {
            average_risk_score: Some(2.5),
            risk_level: RiskLevel::High,
            details: vec![
                clause(RiskLevel::High, Some(0.4)),
                clause(RiskLevel::Medium, Some(0.7)),
                clause(RiskLevel::High, Some(0.5)),
            ],
        };
        let summary = result.summary();
        assert_eq!(summary.level, RiskLevel::High);
        assert_eq!(summary.counts.high, 2);
        assert_eq!(summary.counts.medium, 1);
        assert_eq!(summary.counts.low, 0);
        assert!(summary.advice.unwrap().contains("legal review"));
    }

    #[test]
    fn wire_encoding_uses_upstream_field_names() {
        let result = EvaluationResult {
            average_risk_score: Some(1.2),
            risk_level: RiskLevel::Low,
            details: vec![clause(RiskLevel::Low, Some(0.91))],
        };
        let wire = result.to_wire();
        assert_eq!(wire["average_risk_score"], 1.2);
        assert_eq!(wire["risk_level"], "Low");
        assert_eq!(wire["details"][0]["matched_category"], "Termination");
        assert_eq!(wire["details"][0]["similarity_score"], 0.91);
        assert_eq!(wire["details"][0]["cluster_id"], "7");
    }

    #[test]
    fn empty_result_is_unknown() {
        let empty = EvaluationResult::empty();
        assert_eq!(empty.risk_level, RiskLevel::Unknown);
        assert!(empty.details.is_empty());
        assert_eq!(empty.counts().total(), 0);
        assert!(empty.summary().advice.is_none());
    }
}
