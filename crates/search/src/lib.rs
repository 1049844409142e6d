//! Value indexes for Harbor
//!
//! Two optional structures derived deterministically from the live map:
//! an inverted word-to-keys index and a per-key bag-of-words similarity
//! vector. Both are rebuilt from the map during recovery and are never
//! read from disk.
//!
//! The engine calls `index`/`forget` inside its mutation guard; both are
//! synchronous and total; no failure mode is visible to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fulltext;
pub mod similarity;
pub mod tokenizer;

pub use fulltext::FullTextIndex;
pub use similarity::SimilarityIndex;
pub use tokenizer::tokenize;

use harbor_core::Value;
use std::collections::HashMap;

/// Text rendering of a value for indexing purposes
///
/// Strings index their raw text; every other JSON value indexes its JSON
/// rendering.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The pair of value indexes behind one engine-facing handle
pub struct ValueIndexes {
    fulltext: FullTextIndex,
    similarity: SimilarityIndex,
}

impl Default for ValueIndexes {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueIndexes {
    /// Create empty indexes with the default vector dimension
    pub fn new() -> Self {
        ValueIndexes {
            fulltext: FullTextIndex::new(),
            similarity: SimilarityIndex::new(),
        }
    }

    /// Index (or re-index) one key's value in both structures
    pub fn index(&self, key: &str, value: &Value) {
        let text = value_text(value);
        self.fulltext.index(key, &text);
        self.similarity.index(key, &text);
    }

    /// Drop one key from both structures
    pub fn forget(&self, key: &str) {
        self.fulltext.forget(key);
        self.similarity.forget(key);
    }

    /// Reconstruct both structures from the live map
    ///
    /// Called once at recovery; the indexes have no persistent form.
    pub fn rebuild(&self, map: &HashMap<String, Value>) {
        self.fulltext.clear();
        self.similarity.clear();
        for (key, value) in map {
            self.index(key, value);
        }
    }

    /// Keys whose value contains every token of the query (AND semantics)
    pub fn search(&self, query: &str) -> Vec<String> {
        self.fulltext.search(query)
    }

    /// Top-k keys by bag-of-words similarity to the query
    pub fn search_similar(&self, query: &str, top_k: usize) -> Vec<(String, f64)> {
        self.similarity.search_similar(query, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text_string_is_raw() {
        assert_eq!(value_text(&json!("plain words")), "plain words");
    }

    #[test]
    fn test_value_text_structures_render_as_json() {
        assert_eq!(value_text(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(value_text(&json!([1, 2])), "[1,2]");
        assert_eq!(value_text(&json!(true)), "true");
    }

    #[test]
    fn test_index_and_search_both_structures() {
        let indexes = ValueIndexes::new();
        indexes.index("doc1", &json!("red green blue"));
        indexes.index("doc2", &json!("green yellow"));

        assert_eq!(indexes.search("green"), vec!["doc1", "doc2"]);
        assert_eq!(indexes.search("red green"), vec!["doc1"]);

        let similar = indexes.search_similar("green yellow", 10);
        assert_eq!(similar[0].0, "doc2");
    }

    #[test]
    fn test_forget_removes_from_both() {
        let indexes = ValueIndexes::new();
        indexes.index("doc", &json!("findable words"));
        indexes.forget("doc");

        assert!(indexes.search("findable").is_empty());
        assert!(indexes.search_similar("findable words", 10).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let indexes = ValueIndexes::new();
        indexes.index("stale", &json!("old content"));

        let mut map = HashMap::new();
        map.insert("fresh".to_string(), json!("new content"));
        indexes.rebuild(&map);

        assert!(indexes.search("old").is_empty());
        assert_eq!(indexes.search("new"), vec!["fresh"]);
    }
}
