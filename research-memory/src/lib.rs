//! Research Copilot Memory Engine
//!
//! Knowledge graph and semantic memory for a research assistant: links each
//! query to the papers and projects it surfaced, connects related findings
//! to each other, and answers "what have I seen before that relates to
//! this?" over past queries.
//!
//! ## Features
//!
//! - **Typed knowledge graph** - Query/paper/project nodes with origin and
//!   topic-link edges, built incrementally per research cycle
//! - **Append-only semantic memory** - Timestamped query/content records
//!   with embeddings, persisted in RocksDB with an HNSW index
//! - **Pluggable embeddings** - The store works against the
//!   [`TextEmbedder`] seam; embedding production stays external
//! - **Insight reports** - Past related queries composed with current
//!   findings into a deterministic text report
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use research_memory::{
//!     Finding, HashedEmbedding, InsightGenerator, KnowledgeGraph, MemoryStore, VectorEngine,
//! };
//!
//! // Initialize stores with an injected embedder
//! let engine = Arc::new(VectorEngine::new(Arc::new(HashedEmbedding::default())));
//! let memory = Arc::new(MemoryStore::open(&db_path, engine)?);
//! let graph = KnowledgeGraph::new();
//! let insights = InsightGenerator::new(Arc::clone(&memory));
//!
//! // One research cycle: retrieval collaborators supply (finding, summary) pairs
//! memory.add_query(query).await?;
//! graph.update_graph(query, &findings);
//! let report = insights.get_insights(query, &findings)?;
//!
//! // A rendering collaborator consumes the snapshot
//! let snapshot = graph.render();
//! ```

pub mod embedding;
pub mod error;
pub mod graph;
pub mod insight;
pub mod record;
pub mod storage;
pub mod topics;

// Re-exports for convenience
pub use embedding::{HashedEmbedding, TextEmbedder, VectorEngine};
pub use error::MemoryError;
pub use graph::{EdgeKind, GraphSnapshot, KnowledgeGraph, Node, NodeKind, SnapshotEdge};
pub use insight::InsightGenerator;
pub use record::{Finding, PaperRecord, ProjectRecord};
pub use storage::{MemoryRecord, MemoryStore, RecordKind};
