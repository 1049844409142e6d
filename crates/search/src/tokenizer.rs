//! Tokenization for the value indexes
//!
//! Lowercase word-character tokens: alphanumeric and underscore runs,
//! everything else is a separator.

/// Tokenize text into lowercase word tokens
///
/// # Example
///
/// ```
/// use harbor_search::tokenizer::tokenize;
///
/// let tokens = tokenize("Hello, WAL_writer 42!");
/// assert_eq!(tokens, vec!["hello", "wal_writer", "42"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Tokenize and deduplicate, preserving first-seen order
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_keeps_single_chars() {
        assert_eq!(tokenize("I am a test"), vec!["i", "am", "a", "test"]);
    }

    #[test]
    fn test_tokenize_underscore_is_word_character() {
        assert_eq!(tokenize("snake_case-kebab"), vec!["snake_case", "kebab"]);
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("v1.2 x42"), vec!["v1", "2", "x42"]);
    }

    #[test]
    fn test_tokenize_empty_and_punctuation() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("...---...").is_empty());
    }

    #[test]
    fn test_tokenize_unique_preserves_order() {
        assert_eq!(
            tokenize_unique("apple banana APPLE cherry"),
            vec!["apple", "banana", "cherry"]
        );
    }
}
