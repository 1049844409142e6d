//! Inverted index: word -> set of keys
//!
//! Re-indexing a key first removes its previous postings, so the index
//! always reflects exactly the current value of every key. The side map
//! from key to its token list makes that removal precise instead of a
//! scan over every posting list.

use crate::tokenizer::{tokenize, tokenize_unique};
use dashmap::DashMap;
use std::collections::HashSet;

/// Inverted word-to-keys index with AND query semantics
#[derive(Default)]
pub struct FullTextIndex {
    postings: DashMap<String, HashSet<String>>,
    key_tokens: DashMap<String, Vec<String>>,
}

impl FullTextIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index (or re-index) one key's value text
    pub fn index(&self, key: &str, text: &str) {
        self.forget(key);
        let tokens = tokenize_unique(text);
        for token in &tokens {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.key_tokens.insert(key.to_string(), tokens);
    }

    /// Remove one key from the index
    pub fn forget(&self, key: &str) {
        let Some((_, tokens)) = self.key_tokens.remove(key) else {
            return;
        };
        for token in tokens {
            let emptied = match self.postings.get_mut(&token) {
                Some(mut keys) => {
                    keys.remove(key);
                    keys.is_empty()
                }
                None => false,
            };
            if emptied {
                self.postings.remove_if(&token, |_, keys| keys.is_empty());
            }
        }
    }

    /// Drop everything
    pub fn clear(&self) {
        self.postings.clear();
        self.key_tokens.clear();
    }

    /// Keys whose indexed text contains every token of the query
    ///
    /// Empty query (no tokens) matches nothing. Results are sorted for
    /// stable output.
    pub fn search(&self, query: &str) -> Vec<String> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut result: Option<HashSet<String>> = None;
        for token in &tokens {
            let keys = match self.postings.get(token) {
                Some(entry) => entry.value().clone(),
                None => return Vec::new(),
            };
            result = Some(match result {
                None => keys,
                Some(acc) => acc.intersection(&keys).cloned().collect(),
            });
            if result.as_ref().is_some_and(HashSet::is_empty) {
                return Vec::new();
            }
        }

        let mut keys: Vec<String> = result.unwrap_or_default().into_iter().collect();
        keys.sort();
        keys
    }

    /// Number of keys currently indexed
    pub fn len(&self) -> usize {
        self.key_tokens.len()
    }

    /// Whether the index holds no keys
    pub fn is_empty(&self) -> bool {
        self.key_tokens.is_empty()
    }
}
