//! Data model for extracted articles and batch progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured output of extracting one URL.
///
/// Immutable once built; the batch run owns the accumulated records until
/// they are handed to the export collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// The canonicalized URL the record was extracted from.
    pub source_url: String,

    /// Resolved title, or the "No title found" sentinel.
    pub title: String,

    /// Filtered section headings in document order. Falls back to a
    /// single-element list holding the title when the page had none.
    pub headings: Vec<String>,

    /// Cleaned article body text, or the "No content found" sentinel.
    pub body: String,

    /// When the extraction completed.
    pub fetched_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// The first heading, used as the lead column in tabular export.
    pub fn first_heading(&self) -> &str {
        self.headings.first().map_or("No heading", |h| h.as_str())
    }
}

/// Progress counters for a running batch. Continuously overwritten, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// URLs processed so far (successes and failures both count).
    pub completed: usize,
    /// Total URLs in the batch.
    pub total: usize,
}
