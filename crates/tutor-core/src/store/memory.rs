//! In-memory [`VectorStore`] implementation for tests and embedded use.
//!
//! Process-local collections behind `std::sync::RwLock`; similarity is
//! brute-force cosine distance over all stored vectors. Also the
//! reference implementation of the store contract: the app crate's
//! SQLite store must agree with it on add/query semantics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::{cosine_distance, Embedder};
use crate::models::{PassageFilter, PassageMetadata, ScoredPassage};

use super::{check_batch_shape, VectorStore};

struct StoredPassage {
    id: String,
    text: String,
    metadata: PassageMetadata,
    vector: Vec<f32>,
}

/// One named in-memory collection, bound to its embedder.
pub struct MemoryCollection {
    embedder: Arc<dyn Embedder>,
    rows: RwLock<Vec<StoredPassage>>,
}

/// Client over process-local collections with get-or-create semantics.
///
/// The same name always resolves to the same collection for the
/// lifetime of the store; nothing survives the process.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a collection by name, creating it (bound to `embedder`)
    /// on first use. Idempotent: a later call with the same name
    /// returns the existing collection and ignores the embedder
    /// argument, mirroring the persistent store's ingestion-time
    /// binding.
    pub fn collection(&self, name: &str, embedder: Arc<dyn Embedder>) -> Arc<MemoryCollection> {
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryCollection {
                    embedder,
                    rows: RwLock::new(Vec::new()),
                })
            })
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryCollection {
    async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        metadatas: Option<&[PassageMetadata]>,
    ) -> Result<()> {
        check_batch_shape(ids, texts, metadatas)?;

        {
            let rows = self.rows.read().unwrap();
            for id in ids {
                if rows.iter().any(|r| &r.id == id) {
                    bail!("duplicate passage id: {}", id);
                }
            }
        }

        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != texts.len() {
            bail!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }

        let mut rows = self.rows.write().unwrap();
        for (i, (id, text)) in ids.iter().zip(texts.iter()).enumerate() {
            rows.push(StoredPassage {
                id: id.clone(),
                text: text.clone(),
                metadata: metadatas.map(|m| m[i].clone()).unwrap_or_default(),
                vector: vectors[i].clone(),
            });
        }
        Ok(())
    }

    async fn query(
        &self,
        query_text: &str,
        top_k: usize,
        filter: Option<&PassageFilter>,
    ) -> Result<Vec<ScoredPassage>> {
        let query_vec = self
            .embedder
            .embed(&[query_text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty embedding response for query"))?;

        let rows = self.rows.read().unwrap();
        let mut matches: Vec<ScoredPassage> = rows
            .iter()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|r| ScoredPassage {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(&query_vec, &r.vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}
