//! Bag-of-words similarity vectors
//!
//! Each key's value text is projected onto a fixed-dimension vector: every
//! token hashes to a bucket, bucket counts are accumulated, and the vector
//! is unit-normalized. Scoring is the dot product (cosine similarity for
//! normalized vectors).
//!
//! The word hash must be stable across processes; vectors are rebuilt at
//! recovery and scores have to come out the same. `FxHasher` is a fixed
//! non-cryptographic function with no per-process seed.

use crate::tokenizer::tokenize;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Default projection dimension
pub const DEFAULT_DIM: usize = 64;

/// Per-key unit-normalized bag-of-words vectors over a hash projection
pub struct SimilarityIndex {
    dim: usize,
    vectors: DashMap<String, Vec<f64>>,
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityIndex {
    /// Create an empty index with the default dimension
    pub fn new() -> Self {
        Self::with_dim(DEFAULT_DIM)
    }

    /// Create an empty index with dimension `dim`
    pub fn with_dim(dim: usize) -> Self {
        assert!(dim > 0, "projection dimension must be positive");
        SimilarityIndex {
            dim,
            vectors: DashMap::new(),
        }
    }

    /// The projection dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = FxHasher::default();
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.dim
    }

    fn to_vector(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.dim];
        for token in tokenize(text) {
            vec[self.bucket(&token)] += 1.0;
        }
        let norm = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut vec {
                *x /= norm;
            }
        }
        vec
    }

    /// Index (or re-index) one key's value text
    pub fn index(&self, key: &str, text: &str) {
        self.vectors.insert(key.to_string(), self.to_vector(text));
    }

    /// Remove one key from the index
    pub fn forget(&self, key: &str) {
        self.vectors.remove(key);
    }

    /// Drop everything
    pub fn clear(&self) {
        self.vectors.clear();
    }

    /// Top-k keys by descending dot product against the query's vector
    ///
    /// Ties break by key order, giving a deterministic ranking for any
    /// given state of the index.
    pub fn search_similar(&self, query: &str, top_k: usize) -> Vec<(String, f64)> {
        let query_vec = self.to_vector(query);
        let mut scored: Vec<(String, f64)> = self
            .vectors
            .iter()
            .map(|entry| {
                let score = entry
                    .value()
                    .iter()
                    .zip(&query_vec)
                    .map(|(a, b)| a * b)
                    .sum();
                (entry.key().clone(), score)
            })
            .collect();
        scored.sort_by(|(ka, sa), (kb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ka.cmp(kb))
        });
        scored.truncate(top_k);
        scored
    }

    /// Number of keys currently indexed
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no keys
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
