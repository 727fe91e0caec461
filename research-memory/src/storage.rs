//! RocksDB-backed semantic memory store
//!
//! Append-only log of timestamped query/content records with embeddings,
//! persisted one row per record with LZ4 compression. Uses instant-distance
//! HNSW for O(log n) similarity search with a linear-scan fallback.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use dashmap::DashMap;
use instant_distance::{Builder, HnswMap, Point, Search};
use parking_lot::{Mutex, RwLock};
use rocksdb::{IteratorMode, Options, DB};
use serde::{Deserialize, Serialize};

use crate::embedding::{cosine_similarity, VectorEngine};
use crate::error::{MemoryError, Result};

/// Key prefix for persisted records
const RECORD_PREFIX: &str = "rec:";

/// Kind of a memory record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// A research query as typed by the user
    Query,
    /// Free-form content with a collaborator-chosen subtype (e.g. "paper")
    Content { subtype: String },
}

impl RecordKind {
    /// Tag used in record id derivation
    pub fn tag(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Content { subtype } => subtype,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query)
    }
}

/// An append-only memory record
///
/// Created exactly once; never updated or deleted within a session. The id
/// is derived from the kind tag and the creation timestamp, which the store
/// guarantees to be strictly increasing across the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub kind: RecordKind,
    pub timestamp: DateTime<Utc>,
    pub embedding: Vec<f32>,
}

/// HNSW point wrapper for semantic search
#[derive(Clone)]
struct MemoryPoint {
    id: String,
    vector: Vec<f32>,
}

impl Point for MemoryPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1 - similarity (HNSW finds minimum)
        1.0 - cosine_similarity(&self.vector, &other.vector)
    }
}

/// HNSW index wrapper
struct HnswIndex {
    hnsw: HnswMap<MemoryPoint, String>,
}

/// RocksDB-based append-only memory store with HNSW indexing
pub struct MemoryStore {
    db: Arc<DB>,
    record_cache: Arc<DashMap<String, MemoryRecord>>,
    hnsw_index: Arc<RwLock<Option<HnswIndex>>>,
    hnsw_points: Arc<RwLock<Vec<MemoryPoint>>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    engine: Arc<VectorEngine>,
}

impl MemoryStore {
    /// Open (or create) a MemoryStore at the given path
    pub fn open(path: impl AsRef<Path>, engine: Arc<VectorEngine>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_bytes_per_sync(1048576); // 1MB
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;

        log::info!("MemoryStore opened at: {}", path.display());

        let store = Self {
            db: Arc::new(db),
            record_cache: Arc::new(DashMap::new()),
            hnsw_index: Arc::new(RwLock::new(None)),
            hnsw_points: Arc::new(RwLock::new(Vec::new())),
            last_timestamp: Mutex::new(None),
            engine,
        };

        store.load_cache()?;
        Ok(store)
    }

    /// Load persisted records into cache on startup
    fn load_cache(&self) -> Result<()> {
        let mut count = 0;
        let mut skipped = 0;
        let mut points = Vec::new();
        let mut latest: Option<DateTime<Utc>> = None;
        let iter = self.db.iterator(IteratorMode::Start);

        for item in iter {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);

            let Some(id) = key_str.strip_prefix(RECORD_PREFIX) else {
                continue;
            };

            // Gracefully handle deserialization errors
            match bincode::deserialize::<MemoryRecord>(&value) {
                Ok(record) => {
                    if latest.map_or(true, |t| record.timestamp > t) {
                        latest = Some(record.timestamp);
                    }
                    points.push(MemoryPoint {
                        id: id.to_string(),
                        vector: record.embedding.clone(),
                    });
                    self.record_cache.insert(id.to_string(), record);
                    count += 1;
                }
                Err(e) => {
                    log::warn!("Failed to deserialize record {}: {}. Skipping.", id, e);
                    skipped += 1;
                }
            }
        }

        *self.last_timestamp.lock() = latest;

        if count > 0 {
            log::info!("Loaded {} memory records from disk", count);
            if skipped > 0 {
                log::warn!("Skipped {} records due to deserialization errors", skipped);
            }
            self.rebuild_hnsw_index(points);
        }

        Ok(())
    }

    /// Issue a creation timestamp strictly greater than any issued before.
    ///
    /// Guards against clock granularity and backwards clock steps by bumping
    /// non-increasing readings one microsecond past the previous issue.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock();
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    /// Append a record: embed, persist, index
    async fn append(&self, text: &str, kind: RecordKind) -> Result<MemoryRecord> {
        if text.trim().is_empty() {
            return Err(MemoryError::EmptyInput);
        }

        let embedding = self.engine.embed(text)?;
        let timestamp = self.next_timestamp();
        let id = format!(
            "{}_{}",
            kind.tag(),
            timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
        );

        let record = MemoryRecord {
            id: id.clone(),
            text: text.to_string(),
            kind,
            timestamp,
            embedding: embedding.clone(),
        };

        // Persist the full record as a single row
        let key = format!("{}{}", RECORD_PREFIX, id);
        self.db.put(key.as_bytes(), bincode::serialize(&record)?)?;
        self.db.flush()?;
        self.record_cache.insert(id.clone(), record.clone());

        // Update HNSW
        let mut points = self.hnsw_points.write();
        points.push(MemoryPoint {
            id,
            vector: embedding,
        });
        let all_points = points.clone();
        drop(points);
        self.rebuild_hnsw_index(all_points);

        Ok(record)
    }

    /// Store a research query
    pub async fn add_query(&self, query: &str) -> Result<MemoryRecord> {
        self.append(query, RecordKind::Query).await
    }

    /// Store free-form content under a collaborator-chosen subtype
    pub async fn add_content(&self, text: &str, content_type: &str) -> Result<MemoryRecord> {
        self.append(
            text,
            RecordKind::Content {
                subtype: content_type.to_string(),
            },
        )
        .await
    }

    /// Find up to `k` records most similar to the given text.
    ///
    /// Results are ordered by descending similarity; equal scores are broken
    /// by more-recent timestamp first. An empty store yields an empty
    /// sequence, not an error.
    pub fn query_related(&self, text: &str, k: usize) -> Result<Vec<(MemoryRecord, f32)>> {
        if k == 0 || self.record_cache.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.engine.embed(text)?;
        let candidate_limit = (k * 4).max(16);
        let candidates = self.semantic_search(&query_vector, candidate_limit);

        let mut results: Vec<(MemoryRecord, f32)> = candidates
            .into_iter()
            .filter_map(|(id, score)| {
                self.record_cache.get(&id).map(|entry| (entry.clone(), score))
            })
            .collect();

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.timestamp.cmp(&a.0.timestamp))
        });
        results.truncate(k);
        Ok(results)
    }

    /// Get a record by ID
    pub fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.record_cache.get(id).map(|e| e.clone())
    }

    /// All records in insertion (timestamp) order
    pub fn records(&self) -> Vec<MemoryRecord> {
        let mut all: Vec<MemoryRecord> = self
            .record_cache
            .iter()
            .map(|e| e.value().clone())
            .collect();
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        all
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.record_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_cache.is_empty()
    }

    /// Get the vector engine reference
    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }

    /// Nearest-neighbor search over stored embeddings
    fn semantic_search(&self, query_vector: &[f32], limit: usize) -> Vec<(String, f32)> {
        let index_guard = self.hnsw_index.read();
        let index = match index_guard.as_ref() {
            Some(idx) => idx,
            None => return self.linear_search(query_vector, limit),
        };

        let query_point = MemoryPoint {
            id: String::new(),
            vector: query_vector.to_vec(),
        };

        let mut search = Search::default();
        let mut results = Vec::new();

        for candidate in index.hnsw.search(&query_point, &mut search) {
            let similarity = cosine_similarity(query_vector, &candidate.point.vector);
            results.push((candidate.value.clone(), similarity));

            if results.len() >= limit {
                break;
            }
        }

        results
    }

    /// Linear search fallback
    fn linear_search(&self, query_vector: &[f32], limit: usize) -> Vec<(String, f32)> {
        let mut results: Vec<(String, f32)> = self
            .record_cache
            .iter()
            .map(|entry| {
                let similarity = cosine_similarity(query_vector, &entry.value().embedding);
                (entry.key().clone(), similarity)
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        results.truncate(limit);
        results
    }

    /// Rebuild HNSW index
    fn rebuild_hnsw_index(&self, points: Vec<MemoryPoint>) {
        if points.is_empty() {
            *self.hnsw_index.write() = None;
            *self.hnsw_points.write() = Vec::new();
            return;
        }

        let ids: Vec<String> = points.iter().map(|p| p.id.clone()).collect();
        let hnsw = Builder::default()
            .ef_construction(100)
            .build(points.clone(), ids);

        *self.hnsw_points.write() = points;
        *self.hnsw_index.write() = Some(HnswIndex { hnsw });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbedding;
    use tempfile::TempDir;

    fn test_engine() -> Arc<VectorEngine> {
        Arc::new(VectorEngine::new(Arc::new(HashedEmbedding::default())))
    }

    fn open_store(dir: &TempDir) -> MemoryStore {
        MemoryStore::open(dir.path(), test_engine()).unwrap()
    }

    #[tokio::test]
    async fn test_add_query_creates_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let record = store.add_query("graph neural networks").await.unwrap();
        assert!(record.kind.is_query());
        assert!(record.id.starts_with("query_"));
        assert_eq!(record.text, "graph neural networks");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_add_content_uses_subtype_tag() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let record = store
            .add_content("GNN Survey: architectures summarized", "paper")
            .await
            .unwrap();
        assert!(record.id.starts_with("paper_"));
        assert!(!record.kind.is_query());
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let result = store.add_query("   \t\n").await;
        assert!(matches!(result, Err(MemoryError::EmptyInput)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increasing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut previous: Option<DateTime<Utc>> = None;
        for i in 0..32 {
            let record = store.add_query(&format!("query number {}", i)).await.unwrap();
            if let Some(prev) = previous {
                assert!(record.timestamp > prev);
            }
            previous = Some(record.timestamp);
        }
        // Derived ids are unique as a consequence
        assert_eq!(store.len(), 32);
    }

    #[tokio::test]
    async fn test_query_related_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let results = store.query_related("anything", 5).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_exact_match_returned_first() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.add_query("reinforcement learning").await.unwrap();
        let target = store.add_query("graph neural networks").await.unwrap();
        store.add_query("protein folding models").await.unwrap();

        let results = store.query_related("graph neural networks", 3).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0.id, target.id);
        assert!((results[0].1 - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_ties_broken_by_recency() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let older = store.add_query("transformer attention").await.unwrap();
        let newer = store
            .add_content("transformer attention", "note")
            .await
            .unwrap();

        let results = store.query_related("transformer attention", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, newer.id);
        assert_eq!(results[1].0.id, older.id);
    }

    #[tokio::test]
    async fn test_query_related_caps_at_k() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        for i in 0..8 {
            store
                .add_query(&format!("machine learning topic {}", i))
                .await
                .unwrap();
        }

        let results = store.query_related("machine learning", 3).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let first_id;
        {
            let store = open_store(&dir);
            first_id = store.add_query("graph neural networks").await.unwrap().id;
            store.add_content("GNN Survey", "paper").await.unwrap();
        }

        let reopened = open_store(&dir);
        assert_eq!(reopened.len(), 2);

        let record = reopened.get(&first_id).unwrap();
        assert_eq!(record.text, "graph neural networks");
        assert!(record.kind.is_query());

        // Search works against reloaded embeddings
        let results = reopened.query_related("graph neural networks", 2).unwrap();
        assert_eq!(results[0].0.id, first_id);
    }

    #[tokio::test]
    async fn test_reopened_store_keeps_timestamps_increasing() {
        let dir = TempDir::new().unwrap();
        let last_before;
        {
            let store = open_store(&dir);
            store.add_query("first query").await.unwrap();
            last_before = store.add_query("second query").await.unwrap().timestamp;
        }

        let reopened = open_store(&dir);
        let after = reopened.add_query("third query").await.unwrap().timestamp;
        assert!(after > last_before);
    }

    #[tokio::test]
    async fn test_records_in_timestamp_order() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.add_query("alpha query").await.unwrap();
        store.add_query("beta query").await.unwrap();
        store.add_query("gamma query").await.unwrap();

        let records = store.records();
        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(records[0].text, "alpha query");
        assert_eq!(records[2].text, "gamma query");
    }
}
