//! Text rendering for evaluation results and history pages.
//!
//! Renders the canonical model only: a summary block, the risk badge, one
//! card per clause, and history cards with a pagination footer.

use cogniclause_core::{
    ClauseFinding, DocumentInfo, EvaluationResult, HistoryRecord, PageSlice, RiskLevel,
};

const PREVIEW_CHARS: usize = 300;
const SENTENCE_CHARS: usize = 240;

/// Summary block, badge, and clause cards for one evaluation.
pub fn render_evaluation(result: &EvaluationResult, document: Option<&DocumentInfo>) -> String {
    let mut out = String::new();

    if let Some(doc) = document {
        out.push_str(&render_document(doc));
        out.push('\n');
    }
    out.push_str(&render_summary(result));
    out.push('\n');

    out.push_str("--- Clauses ---\n");
    if result.details.is_empty() {
        out.push_str("  No clause-level details returned.\n");
    }
    for (i, finding) in result.details.iter().enumerate() {
        out.push_str(&render_clause(i + 1, finding));
    }
    out
}

/// Overall level, average score, per-level counts, and advice.
pub fn render_summary(result: &EvaluationResult) -> String {
    let summary = result.summary();
    let mut out = format!("=== {} ===\n", badge(summary.level));

    out.push_str(&row("Level", &format!("{} overall", summary.level)));
    out.push_str(&row(
        "Average risk score",
        &format_score(summary.average_risk_score),
    ));
    for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low] {
        out.push_str(&row(
            &format!("{level} clauses"),
            &summary.counts.get(level).to_string(),
        ));
    }
    if let Some(advice) = summary.advice {
        out.push_str(&format!("  {advice}\n"));
    }
    out
}

/// Badge text, e.g. `[ High Risk ]`.
pub fn badge(level: RiskLevel) -> String {
    format!("[ {} ]", level.badge())
}

fn row(label: &str, value: &str) -> String {
    format!("  {label:<20} {value}\n")
}

fn render_clause(n: usize, finding: &ClauseFinding) -> String {
    format!(
        "  {n:>3}. {}\n       {} | {} | sim: {}\n",
        truncate(&finding.sentence, SENTENCE_CHARS),
        finding.matched_category,
        finding.risk_level,
        format_score(finding.similarity_score),
    )
}

fn render_document(doc: &DocumentInfo) -> String {
    let mut out = String::new();
    if let Some(name) = &doc.filename {
        out.push_str(&row("Filename", name));
    }
    if let Some(preview) = &doc.text_preview {
        out.push_str(&row(
            "Extracted preview",
            &truncate(preview.trim(), PREVIEW_CHARS),
        ));
    }
    out
}

/// One page of history cards plus a pagination footer.
pub fn render_history(slice: &PageSlice<'_>) -> String {
    let mut out = String::from("=== History ===\n");
    if slice.items.is_empty() {
        out.push_str("  No matching evaluations.\n");
    }
    for record in &slice.items {
        out.push_str(&render_record(record));
    }
    out.push_str(&format!(
        "{} Page {}/{} ({} total) {}\n",
        if slice.has_prev { "<- Prev" } else { "       " },
        slice.page,
        slice.page_count,
        slice.total,
        if slice.has_next { "Next ->" } else { "" },
    ));
    out
}

fn render_record(record: &HistoryRecord) -> String {
    let when = record
        .created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let name = if record.name.is_empty() {
        "(untitled)"
    } else {
        record.name.as_str()
    };
    format!(
        "  {name}\n    Risk Level: {}    {when}\n",
        record.level
    )
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) => format!("{v}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cogniclause_core::history::paginate;

    fn result() -> EvaluationResult {
        EvaluationResult {
            average_risk_score: Some(2.5),
            risk_level: RiskLevel::High,
            details: vec![
                ClauseFinding {
                    sentence: "Liability is unlimited".into(),
                    matched_category: "Limitation of Liability".into(),
                    similarity_score: Some(0.42),
                    risk_level: RiskLevel::High,
                    cluster_id: None,
                },
                ClauseFinding {
                    sentence: "Notices must be in writing".into(),
                    matched_category: "Notices".into(),
                    similarity_score: Some(0.9),
                    risk_level: RiskLevel::Low,
                    cluster_id: None,
                },
            ],
        }
    }

    #[test]
    fn summary_shows_counts_and_advice() {
        let text = render_summary(&result());
        assert!(text.starts_with("=== [ High Risk ] ==="));
        assert!(text.contains("Average risk score   2.5"));
        assert!(text.contains("High clauses         1"));
        assert!(text.contains("Medium clauses       0"));
        assert!(text.contains("legal review"));
    }

    #[test]
    fn unknown_result_renders_placeholders() {
        let text = render_evaluation(&EvaluationResult::empty(), None);
        assert!(text.contains("[ Unknown Risk ]"));
        assert!(text.contains("Average risk score   -"));
        assert!(text.contains("No clause-level details returned."));
    }

    #[test]
    fn clauses_render_in_order() {
        let text = render_evaluation(&result(), None);
        let first = text.find("Liability is unlimited").unwrap();
        let second = text.find("Notices must be in writing").unwrap();
        assert!(first < second);
        assert!(text.contains("Limitation of Liability | High | sim: 0.42"));
    }

    #[test]
    fn document_preview_is_truncated() {
        let doc = DocumentInfo {
            filename: Some("lease.pdf".into()),
            text_preview: Some("x".repeat(500)),
        };
        let text = render_evaluation(&result(), Some(&doc));
        assert!(text.contains("lease.pdf"));
        assert!(text.contains(&format!("{}...", "x".repeat(PREVIEW_CHARS))));
        assert!(!text.contains(&"x".repeat(PREVIEW_CHARS + 1)));
    }

    #[test]
    fn history_page_footer() {
        let records: Vec<HistoryRecord> = (1..=7)
            .map(|i| HistoryRecord {
                id: i.to_string(),
                name: format!("contract-{i}"),
                text: None,
                level: RiskLevel::Medium,
                created_at: Some(Utc.with_ymd_and_hms(2025, 12, i, 9, 0, 0).unwrap()),
            })
            .collect();
        let refs: Vec<&HistoryRecord> = records.iter().collect();

        let text = render_history(&paginate(&refs, 2, 5));
        assert!(text.contains("contract-6"));
        assert!(text.contains("2025-12-07 09:00"));
        assert!(text.contains("<- Prev Page 2/2 (7 total)"));
        assert!(!text.contains("Next ->"));
    }

    #[test]
    fn empty_history() {
        let text = render_history(&paginate(&[], 1, 5));
        assert!(text.contains("No matching evaluations."));
        assert!(text.contains("Page 1/1 (0 total)"));
    }
}
