//! Response normalisation: every upstream shape becomes one [`EvaluationResult`].
//!
//! The evaluation and upload services disagree on response layout:
//!
//! - **Flat** (text evaluation, and some upload deployments):
//!   `{ average_risk_score, risk_level?, details? }`
//! - **Nested** (upload): `{ analysis: { average_risk_score, risk_level?, details? },
//!   filename?, extracted_text_preview? }`
//!
//! All shape sniffing lives here. Nothing in this module fails: input that
//! carries no usable score degrades to `average_risk_score = None` and
//! `risk_level = Unknown`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{ClauseFinding, DocumentInfo, EvaluationResult, HistoryRecord};
use crate::risk::{self, RiskLevel};

/// Category used when the service reports no cluster match.
pub const UNMATCHED_CATEGORY: &str = "Unknown";

/// Layout of a raw service response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Analysis fields at the top level.
    Flat,
    /// Analysis fields under an `analysis` object.
    Nested,
    /// Not a JSON object at all.
    Unrecognised,
}

/// Classify the layout of a raw response.
pub fn detect_shape(raw: &Value) -> ResponseShape {
    match raw.as_object() {
        None => ResponseShape::Unrecognised,
        Some(obj) if obj.get("analysis").is_some_and(Value::is_object) => ResponseShape::Nested,
        Some(_) => ResponseShape::Flat,
    }
}

/// Normalise a raw evaluation or upload response.
///
/// For nested responses each field is read from `analysis` first and from
/// the top level second. A missing `risk_level` is derived from
/// `average_risk_score`; missing `details` become an empty list.
pub fn normalize(raw: &Value) -> EvaluationResult {
    let shape = detect_shape(raw);
    let Some(top) = raw.as_object() else {
        debug!(?shape, "response is not an object, using empty result");
        return EvaluationResult::empty();
    };
    let body = match shape {
        ResponseShape::Nested => top.get("analysis").and_then(Value::as_object),
        _ => None,
    };

    let average_risk_score = lookup(body, top, "average_risk_score").and_then(number);
    let risk_level = match lookup(body, top, "risk_level").and_then(label) {
        Some(level) => level,
        None => {
            let derived = risk::label_for_score(average_risk_score);
            debug!(?shape, score = ?average_risk_score, %derived, "derived overall risk level");
            derived
        }
    };
    let details = match lookup(body, top, "details") {
        Some(Value::Array(items)) => items.iter().map(normalize_clause).collect(),
        _ => Vec::new(),
    };

    EvaluationResult {
        average_risk_score,
        risk_level,
        details,
    }
}

/// Normalise one entry of a response's `details` array.
pub fn normalize_clause(raw: &Value) -> ClauseFinding {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let sentence = match raw {
        Value::String(s) => s.clone(),
        _ => obj
            .get("sentence")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };
    let matched_category = obj
        .get("matched_category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNMATCHED_CATEGORY)
        .to_string();
    let similarity_score = obj.get("similarity_score").and_then(number);
    let risk_level = obj
        .get("risk_level")
        .and_then(label)
        .unwrap_or_else(|| risk::label_for_score(similarity_score));
    let cluster_id = obj.get("cluster_id").and_then(id_string);

    ClauseFinding {
        sentence,
        matched_category,
        similarity_score,
        risk_level,
        cluster_id,
    }
}

/// Upload metadata from a response, if it carries any.
pub fn document_info(raw: &Value) -> Option<DocumentInfo> {
    let obj = raw.as_object()?;
    let filename = obj
        .get("filename")
        .and_then(Value::as_str)
        .map(str::to_string);
    let text_preview = obj
        .get("extracted_text_preview")
        .and_then(Value::as_str)
        .map(str::to_string);
    if filename.is_none() && text_preview.is_none() {
        return None;
    }
    Some(DocumentInfo {
        filename,
        text_preview,
    })
}

/// Translate one record-store row into a [`HistoryRecord`].
///
/// `level` is taken as stored when it is a recognisable label. Rows from
/// older deployments only carry a numeric `risk_score`; their level is
/// derived from it. Returns `None` for rows that are not objects.
pub fn normalize_record(raw: &Value) -> Option<HistoryRecord> {
    let obj = raw.as_object()?;

    let id = obj.get("id").and_then(id_string).unwrap_or_default();
    let name = ["name", "title", "filename"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();
    let text = obj.get("text").and_then(Value::as_str).map(str::to_string);
    let level = ["level", "risk_level"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(label))
        .unwrap_or_else(|| risk::label_for_score(obj.get("risk_score").and_then(number)));
    let created_at = obj
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    Some(HistoryRecord {
        id,
        name,
        text,
        level,
        created_at,
    })
}

// ── Field helpers ──

/// Non-null field from `primary`, else from `fallback`.
fn lookup<'a>(
    primary: Option<&'a Map<String, Value>>,
    fallback: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    primary
        .and_then(|obj| obj.get(key))
        .filter(|v| !v.is_null())
        .or_else(|| fallback.get(key).filter(|v| !v.is_null()))
}

/// Finite number from a JSON number or a numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn label(value: &Value) -> Option<RiskLevel> {
    value.as_str().and_then(RiskLevel::from_label)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Timestamps without an offset are stored in UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
