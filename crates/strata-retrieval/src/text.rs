//! Lexical helpers shared by deduplication, decomposition and relevance scoring.

use std::collections::HashSet;

/// Function words ignored when extracting content terms.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on", "or", "our",
    "please", "should", "so", "some", "than", "that", "the", "their", "them", "then", "there",
    "these", "this", "those", "to", "up", "us", "was", "we", "were", "what", "when", "where",
    "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Lowercased alphanumeric tokens, in order.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Distinct lowercased tokens.
pub fn token_set(text: &str) -> HashSet<String> {
    tokens(text).collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Tokens that carry meaning: no stopwords, no single characters. Order preserved,
/// duplicates removed.
pub fn content_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens(text)
        .filter(|t| t.chars().count() > 1 && !is_stopword(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(b).count();
    let total = a.len() + b.len() - shared;
    shared as f64 / total as f64
}

/// First word of `text`, lowercased.
pub fn first_word(text: &str) -> Option<String> {
    tokens(text).next()
}
