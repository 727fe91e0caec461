//! Hashed bag-of-words embeddings
//!
//! Deterministic reference embedder: tokens are hashed into a fixed number
//! of buckets and the resulting term-frequency vector is L2-normalized.
//! Identical texts always embed identically, so an exact re-query scores a
//! cosine similarity of 1.0. A placeholder of the same rank as the
//! abstract-keyword heuristic — swap in a model-backed [`TextEmbedder`]
//! for production-quality similarity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::TextEmbedder;
use crate::error::Result;

/// Default vector dimension
const DEFAULT_DIMENSION: usize = 256;

/// Hashed bag-of-words embedder
pub struct HashedEmbedding {
    dimension: usize,
}

impl HashedEmbedding {
    /// Create an embedder with the given output dimension
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be non-zero");
        Self { dimension }
    }

    /// Tokenize text into lowercase alphanumeric terms
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Map a token to its bucket
    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl TextEmbedder for HashedEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in Self::tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
