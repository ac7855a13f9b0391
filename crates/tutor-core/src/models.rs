//! Core data types used throughout Textbook Tutor.
//!
//! These types represent the passages that flow through the ingestion
//! and retrieval pipeline, plus the filter and ranked-match shapes the
//! store boundary speaks.

use serde::Serialize;

/// Label used for `chapter`/`section` when no heading of that depth has
/// been seen yet at parse time.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One retrievable unit of textbook content: a single subsection body,
/// labeled with its position in the chapter/section hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    /// Sequential decimal id (`"1"`, `"2"`, …) assigned in document order.
    pub id: String,
    /// Trimmed, non-empty subsection body.
    pub text: String,
    pub metadata: PassageMetadata,
}

/// Chapter/section/subsection labels stamped onto a passage.
///
/// `chapter` and `section` carry [`UNKNOWN_LABEL`] when the source
/// document never introduced a heading of that depth before the
/// passage. An explicitly empty heading title stays the empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassageMetadata {
    pub chapter: String,
    pub section: String,
    pub subsection: String,
}

/// A ranked match returned from [`VectorStore::query`](crate::store::VectorStore::query).
///
/// `distance` is cosine distance (`1 − cosine similarity`); matches are
/// ordered ascending, best first. The batch-of-batches shape of the
/// underlying single-query call is flattened away at the store boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    pub id: String,
    pub text: String,
    pub metadata: PassageMetadata,
    pub distance: f64,
}

/// Equality constraint over passage metadata, applied before ranking.
///
/// A passage is eligible only when every `Some` field equals the
/// corresponding metadata field exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassageFilter {
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
}

impl PassageFilter {
    /// Filter on the `chapter` label alone.
    pub fn chapter(chapter: impl Into<String>) -> Self {
        Self {
            chapter: Some(chapter.into()),
            ..Self::default()
        }
    }

    /// True when `metadata` satisfies every constrained field.
    pub fn matches(&self, metadata: &PassageMetadata) -> bool {
        self.chapter
            .as_deref()
            .map_or(true, |c| c == metadata.chapter)
            && self
                .section
                .as_deref()
                .map_or(true, |s| s == metadata.section)
            && self
                .subsection
                .as_deref()
                .map_or(true, |s| s == metadata.subsection)
    }
}
