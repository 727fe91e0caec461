//! Vector embedding engine
//!
//! High-level API for generating and caching embeddings.

use std::sync::Arc;

use dashmap::DashMap;

use super::{cosine_similarity, TextEmbedder};
use crate::error::Result;

/// Vector embedding engine with caching
///
/// Wraps any [`TextEmbedder`] with a DashMap cache for efficient repeated
/// lookups.
pub struct VectorEngine {
    embedder: Arc<dyn TextEmbedder>,
    cache: DashMap<String, Vec<f32>>,
    dimension: usize,
}

impl VectorEngine {
    /// Create a VectorEngine around the given embedder
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        let dimension = embedder.dimension();

        log::info!("VectorEngine ready ({}d)", dimension);

        Self {
            embedder,
            cache: DashMap::new(),
            dimension,
        }
    }

    /// Generate embedding with caching
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Check cache first
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.clone());
        }

        // Generate and cache
        let embedding = self.embedder.embed(text)?;
        self.cache.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Cosine similarity between two embeddings
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
