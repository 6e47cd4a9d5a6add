//! Search, risk filter, and pagination over a fetched set of history records.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::HistoryRecord;
use crate::risk::{ParseRiskLevelError, RiskLevel};

/// Records per page in the history view.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Risk-level filter: everything, or one stored level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Level(RiskLevel),
}

impl LevelFilter {
    pub fn matches(&self, level: RiskLevel) -> bool {
        match self {
            Self::All => true,
            Self::Level(wanted) => *wanted == level,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Level(level) => level.fmt(f),
        }
    }
}

impl FromStr for LevelFilter {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Level)
        }
    }
}

/// Records matching both the level filter and the search term.
///
/// The search term matches case-insensitively against `name` or `text`;
/// an empty term matches everything. Input order is preserved.
pub fn apply<'a>(
    records: &'a [HistoryRecord],
    search_term: &str,
    level_filter: LevelFilter,
) -> Vec<&'a HistoryRecord> {
    let needle = search_term.to_lowercase();
    records
        .iter()
        .filter(|rec| level_filter.matches(rec.level))
        .filter(|rec| needle.is_empty() || matches_search(rec, &needle))
        .collect()
}

fn matches_search(record: &HistoryRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record
            .text
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Number of pages for `len` items; at least 1 so an empty set has a page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a 1-based page into `[1, page_count]`.
pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(len, page_size))
}

/// One window of the filtered records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSlice<'a> {
    pub items: Vec<&'a HistoryRecord>,
    /// Effective 1-based page after clamping.
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Slice `filtered` to the requested 1-based page.
///
/// The page is clamped first, so the slice is never empty unless
/// `filtered` is.
pub fn paginate<'a>(
    filtered: &[&'a HistoryRecord],
    page: usize,
    page_size: usize,
) -> PageSlice<'a> {
    let page_size = page_size.max(1);
    let total = filtered.len();
    let page = clamp_page(page, total, page_size);
    let pages = page_count(total, page_size);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);

    PageSlice {
        items: filtered[start..end].to_vec(),
        page,
        page_count: pages,
        total,
        has_prev: page > 1,
        has_next: page < pages,
    }
}

/// History view: a fetched record set plus the user's search, filter and page.
///
/// Every mutation re-clamps the page against the current filtered set.
#[derive(Debug, Clone)]
pub struct HistoryView {
    records: Vec<HistoryRecord>,
    search_term: String,
    level_filter: LevelFilter,
    page: usize,
    page_size: usize,
}

impl HistoryView {
    pub fn new(records: Vec<HistoryRecord>, page_size: usize) -> Self {
        Self {
            records,
            search_term: String::new(),
            level_filter: LevelFilter::All,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.level_filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filtered(&self) -> Vec<&HistoryRecord> {
        apply(&self.records, &self.search_term, self.level_filter)
    }

    pub fn current_page(&self) -> PageSlice<'_> {
        paginate(&self.filtered(), self.page, self.page_size)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.reclamp();
    }

    pub fn set_level_filter(&mut self, filter: LevelFilter) {
        self.level_filter = filter;
        self.reclamp();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
        self.reclamp();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Swap in a freshly fetched record set. Search, filter and page are kept.
    pub fn replace_records(&mut self, records: Vec<HistoryRecord>) {
        self.records = records;
        self.reclamp();
    }

    fn reclamp(&mut self) {
        let len = self.filtered().len();
        self.page = clamp_page(self.page, len, self.page_size);
    }
}
