//! Storage abstraction for Textbook Tutor.
//!
//! The [`VectorStore`] trait defines the two operations the ingestion
//! and retrieval pipeline needs from a collection of embedded passages,
//! enabling pluggable backends (SQLite, in-memory, future networked
//! stores). The embedding function, vector index, and similarity metric
//! all live behind this boundary; the pipeline never sees a raw vector.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{PassageFilter, PassageMetadata, ScoredPassage};

/// One collection of embedded passages, queryable by text similarity.
///
/// Collections are resolved by name with get-or-create semantics from a
/// backend-specific client (see [`memory::MemoryStore`] and the SQLite
/// store in the app crate); a handle obtained that way is already bound
/// to its embedding function.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add`](VectorStore::add) | Insert a batch of passages, all-or-nothing |
/// | [`query`](VectorStore::query) | Ranked similarity search with optional metadata filter |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a batch of passages.
    ///
    /// `ids`, `texts`, and `metadatas` (when provided) must be equal
    /// length; a mismatch is an error. Omitted metadatas default to
    /// empty labels. Inserting an id that already exists in the
    /// collection propagates the backend's error; no deduplication
    /// happens at this layer, and the batch commits as a whole or not
    /// at all.
    async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        metadatas: Option<&[PassageMetadata]>,
    ) -> Result<()>;

    /// Rank stored passages against `query_text` and return up to
    /// `top_k` matches, ascending by distance (best first).
    ///
    /// When `filter` is present, only passages whose metadata satisfies
    /// every constrained field are eligible for ranking.
    async fn query(
        &self,
        query_text: &str,
        top_k: usize,
        filter: Option<&PassageFilter>,
    ) -> Result<Vec<ScoredPassage>>;
}

/// Check the parallel-slice contract shared by every [`VectorStore::add`]
/// implementation.
pub fn check_batch_shape(
    ids: &[String],
    texts: &[String],
    metadatas: Option<&[PassageMetadata]>,
) -> Result<()> {
    if ids.len() != texts.len() {
        anyhow::bail!(
            "ids and texts must be equal length ({} vs {})",
            ids.len(),
            texts.len()
        );
    }
    if let Some(metas) = metadatas {
        if metas.len() != ids.len() {
            anyhow::bail!(
                "metadatas must match ids length ({} vs {})",
                metas.len(),
                ids.len()
            );
        }
    }
    Ok(())
}
