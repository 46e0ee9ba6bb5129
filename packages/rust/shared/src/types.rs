//! Core domain types for spreadsheet enrichment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// A single spreadsheet row: an ordered list of string cells.
///
/// Rows are ragged — the Sheets API omits trailing unset cells, so a row
/// may carry fewer than three cells. A missing cell means "not set", which
/// is distinct from an empty string only in the JSON encoding; both count
/// as "no summary" for work-set purposes.
///
/// Cell layout: `[url, summary, category]`. The first row of a read range
/// is a header and is never processed, only passed through on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<String>);

impl Row {
    /// Build a row from string-ish cells.
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(cells.into_iter().map(Into::into).collect())
    }

    /// The URL cell (identity key), if the row has any cells.
    pub fn url(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The summary cell, if present.
    pub fn summary(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Whether the row already carries a non-empty summary.
    pub fn has_summary(&self) -> bool {
        self.summary().is_some_and(|s| !s.is_empty())
    }

    /// Whether the row has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Row {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

// ---------------------------------------------------------------------------
// UrlSummary
// ---------------------------------------------------------------------------

/// The enrichment produced for one URL in a single run.
///
/// Invariant: constructed only when both fetch and summarize succeeded.
/// Categorization is total, so `category` is always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSummary {
    /// The URL this summary belongs to (row identity key).
    pub url: String,
    /// Abstractive summary of the page content.
    pub summary: String,
    /// Comma-joined category labels, `"General"` if nothing matched.
    pub category: String,
}

impl UrlSummary {
    /// Render as a full replacement row `[url, summary, category]`.
    pub fn to_row(&self) -> Row {
        Row::new([
            self.url.as_str(),
            self.summary.as_str(),
            self.category.as_str(),
        ])
    }
}

/// Accumulated per-run results, keyed by URL.
///
/// Duplicate URLs in the sheet are processed in order; a later result for
/// the same URL overwrites the earlier one, matching last-write-wins on
/// the merge.
pub type SummaryMap = HashMap<String, UrlSummary>;
