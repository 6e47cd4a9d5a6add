pub mod history;
pub mod model;
pub mod normalize;
pub mod risk;

pub use history::{HistoryView, LevelFilter, PageSlice};
pub use model::{ClauseFinding, DocumentInfo, EvaluationResult, HistoryRecord, RiskSummary};
pub use normalize::normalize;
pub use risk::{RiskCounts, RiskLevel, aggregate_counts, label_for_score};
