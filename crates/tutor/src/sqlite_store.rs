//! SQLite-backed collection store.
//!
//! Persists passages and their embedding vectors in a single database
//! file (or in memory when no persist directory is configured).
//! Collections are created lazily with get-or-create semantics and are
//! bound to the embedding model that first created them; similarity is
//! brute-force cosine distance over the collection's stored vectors.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use tutor_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob, Embedder};
use tutor_core::models::{PassageFilter, PassageMetadata, ScoredPassage};
use tutor_core::store::{check_batch_shape, VectorStore};

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;

/// Open the configured database and resolve the target collection.
///
/// Shared entry point for the CLI commands: builds the configured
/// embedder, opens the store at the resolved persist location, and
/// get-or-creates the collection (`name_override` wins over the
/// configured name).
pub async fn open_collection(
    config: &Config,
    name_override: Option<&str>,
) -> Result<SqliteCollection> {
    let embedder = create_embedder(&config.embedding)?;
    let persist_dir = config.store.resolve_persist_dir();
    let store = SqliteStore::open(persist_dir.as_deref()).await?;
    let name = name_override.unwrap_or(&config.collection.name);
    store.collection(name, embedder).await
}

/// Client over the collection database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database under `persist_dir` (in-memory when `None`)
    /// and ensure the schema exists.
    pub async fn open(persist_dir: Option<&Path>) -> Result<Self> {
        let pool = db::connect(persist_dir).await?;
        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Resolve a collection by name, creating it on first use.
    ///
    /// Idempotent: the same name always returns the same logical
    /// collection within this database. The collection is bound to the
    /// embedding model that created it; re-opening with a different
    /// model is an error, since stored vectors would not be comparable
    /// to new ones.
    pub async fn collection(
        &self,
        name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<SqliteCollection> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT model FROM collections WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        match existing {
            Some(model) if model != embedder.model_name() => bail!(
                "collection '{}' is bound to embedding model '{}', not '{}'",
                name,
                model,
                embedder.model_name()
            ),
            Some(_) => {}
            None => {
                let now = chrono::Utc::now().timestamp();
                sqlx::query(
                    "INSERT INTO collections (name, model, dims, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(name)
                .bind(embedder.model_name())
                .bind(embedder.dims() as i64)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(SqliteCollection {
            pool: self.pool.clone(),
            name: name.to_string(),
            embedder,
        })
    }
}

/// One named collection handle, bound to its embedder.
pub struct SqliteCollection {
    pool: SqlitePool,
    name: String,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for SqliteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCollection")
            .field("name", &self.name)
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passages (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            text TEXT NOT NULL,
            chapter TEXT NOT NULL DEFAULT '',
            section TEXT NOT NULL DEFAULT '',
            subsection TEXT NOT NULL DEFAULT '',
            embedding BLOB NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_passages_chapter ON passages(collection, chapter)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl VectorStore for SqliteCollection {
    async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        metadatas: Option<&[PassageMetadata]>,
    ) -> Result<()> {
        check_batch_shape(ids, texts, metadatas)?;

        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != texts.len() {
            bail!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }

        // One transaction: a duplicate id (PRIMARY KEY violation) or any
        // other failure rolls back the whole batch.
        let mut tx = self.pool.begin().await?;

        let default_meta = PassageMetadata::default();
        for (i, (id, text)) in ids.iter().zip(texts.iter()).enumerate() {
            let meta = metadatas.map_or(&default_meta, |m| &m[i]);
            let blob = vec_to_blob(&vectors[i]);

            sqlx::query(
                r#"
                INSERT INTO passages (collection, id, text, chapter, section, subsection, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&self.name)
            .bind(id)
            .bind(text)
            .bind(&meta.chapter)
            .bind(&meta.section)
            .bind(&meta.subsection)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
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

        let mut sql = String::from(
            "SELECT id, text, chapter, section, subsection, embedding FROM passages WHERE collection = ?",
        );
        if let Some(f) = filter {
            if f.chapter.is_some() {
                sql.push_str(" AND chapter = ?");
            }
            if f.section.is_some() {
                sql.push_str(" AND section = ?");
            }
            if f.subsection.is_some() {
                sql.push_str(" AND subsection = ?");
            }
        }

        let mut query = sqlx::query(&sql).bind(&self.name);
        if let Some(f) = filter {
            if let Some(ref chapter) = f.chapter {
                query = query.bind(chapter);
            }
            if let Some(ref section) = f.section {
                query = query.bind(section);
            }
            if let Some(ref subsection) = f.subsection {
                query = query.bind(subsection);
            }
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut matches: Vec<ScoredPassage> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                ScoredPassage {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata: PassageMetadata {
                        chapter: row.get("chapter"),
                        section: row.get("section"),
                        subsection: row.get("subsection"),
                    },
                    distance: cosine_distance(&query_vec, &vector),
                }
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

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    const DIMS: usize = 16;

    /// Deterministic test embedder: hashed bag-of-words buckets.
    struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        fn model_name(&self) -> &str {
            "hash-test"
        }

        fn dims(&self) -> usize {
            DIMS
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; DIMS];
                    for token in text.split_whitespace() {
                        let mut hasher = DefaultHasher::new();
                        token.hash(&mut hasher);
                        v[(hasher.finish() % DIMS as u64) as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    struct OtherModel;

    #[async_trait]
    impl Embedder for OtherModel {
        fn model_name(&self) -> &str {
            "other-model"
        }

        fn dims(&self) -> usize {
            DIMS
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            bail!("not used")
        }
    }

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn meta(chapter: &str, section: &str, subsection: &str) -> PassageMetadata {
        PassageMetadata {
            chapter: chapter.to_string(),
            section: section.to_string(),
            subsection: subsection.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_query_ranked() {
        let store = SqliteStore::open(None).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();

        coll.add(
            &strs(&["1", "2"]),
            &strs(&["the chain rule for derivatives", "glaze firing temperatures"]),
            Some(&[meta("C1", "S1", "A"), meta("C1", "S1", "B")]),
        )
        .await
        .unwrap();

        let matches = coll
            .query("the chain rule for derivatives", 5, None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "1");
        assert!(matches[0].distance <= matches[1].distance);
        assert_eq!(matches[0].metadata.subsection, "A");
    }

    #[tokio::test]
    async fn test_chapter_filter_restricts_rows() {
        let store = SqliteStore::open(None).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();

        coll.add(
            &strs(&["1", "2"]),
            &strs(&["limits at infinity", "limits at infinity"]),
            Some(&[meta("C1", "S1", "A"), meta("C2", "S9", "B")]),
        )
        .await
        .unwrap();

        let filter = PassageFilter::chapter("C2");
        let matches = coll
            .query("limits at infinity", 5, Some(&filter))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "2");
    }

    #[tokio::test]
    async fn test_duplicate_id_aborts_whole_batch() {
        let store = SqliteStore::open(None).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();

        coll.add(&strs(&["1"]), &strs(&["first"]), None).await.unwrap();

        // "9" would be new, but "1" collides; neither row may land.
        let err = coll
            .add(&strs(&["9", "1"]), &strs(&["new", "again"]), None)
            .await;
        assert!(err.is_err());

        let matches = coll.query("new", 10, None).await.unwrap();
        assert!(matches.iter().all(|m| m.id != "9"));
    }

    #[tokio::test]
    async fn test_length_mismatch_rejected() {
        let store = SqliteStore::open(None).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();
        assert!(coll
            .add(&strs(&["1", "2"]), &strs(&["only one"]), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = SqliteStore::open(None).await.unwrap();
        let a = store
            .collection("same", Arc::new(HashEmbedder))
            .await
            .unwrap();
        a.add(&strs(&["1"]), &strs(&["text body"]), None)
            .await
            .unwrap();

        let b = store
            .collection("same", Arc::new(HashEmbedder))
            .await
            .unwrap();
        let matches = b.query("text body", 5, None).await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_model_mismatch_rejected() {
        let store = SqliteStore::open(None).await.unwrap();
        store
            .collection("bound", Arc::new(HashEmbedder))
            .await
            .unwrap();

        let err = store.collection("bound", Arc::new(OtherModel)).await;
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("bound to embedding model"));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteStore::open(None).await.unwrap();
        let a = store
            .collection("alpha", Arc::new(HashEmbedder))
            .await
            .unwrap();
        let b = store
            .collection("beta", Arc::new(HashEmbedder))
            .await
            .unwrap();

        a.add(&strs(&["1"]), &strs(&["alpha only content"]), None)
            .await
            .unwrap();

        assert!(b.query("alpha only content", 5, None).await.unwrap().is_empty());
        // Same id in another collection is not a duplicate.
        b.add(&strs(&["1"]), &strs(&["beta content"]), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();

        {
            let store = SqliteStore::open(Some(dir.path())).await.unwrap();
            let coll = store
                .collection("textbook", Arc::new(HashEmbedder))
                .await
                .unwrap();
            coll.add(&strs(&["1"]), &strs(&["persisted passage body"]), None)
                .await
                .unwrap();
        }

        let store = SqliteStore::open(Some(dir.path())).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();
        let matches = coll.query("persisted passage body", 5, None).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "1");
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let store = SqliteStore::open(None).await.unwrap();
        let coll = store
            .collection("textbook", Arc::new(HashEmbedder))
            .await
            .unwrap();
        coll.add(
            &strs(&["1", "2", "3"]),
            &strs(&["alpha", "beta", "gamma"]),
            None,
        )
        .await
        .unwrap();

        assert_eq!(coll.query("alpha", 2, None).await.unwrap().len(), 2);
    }
}
