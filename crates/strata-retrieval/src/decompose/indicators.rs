//! Complexity indicators and clause splitting.
//!
//! A separator (comma, semicolon, sentence break, "and", "then", "also", "after
//! that", a question mark) only splits the query when the text after it starts a
//! new actionable clause: an action verb or a question word. "Write tests and docs
//! for auth" stays one clause; "Implement auth and write tests" becomes two.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::text::{content_terms, first_word, token_set};

pub const ACTION_VERBS: &[&str] = &[
    "add", "analyze", "build", "check", "clean", "compare", "configure", "continue", "create",
    "debug", "define", "delete", "deploy", "describe", "design", "document", "explain",
    "extract", "find", "fix", "generate", "implement", "install", "integrate", "introduce",
    "investigate", "list", "migrate", "move", "optimize", "publish", "refactor", "release",
    "remove", "rename", "review", "run", "scaffold", "set", "setup", "show", "summarize",
    "test", "update", "upgrade", "verify", "write",
];

pub const QUESTION_WORDS: &[&str] = &[
    "are", "can", "could", "do", "does", "how", "is", "should", "what", "when", "where",
    "which", "who", "why", "would",
];

/// Verbs that produce something later clauses build on.
pub const FOUNDATIONAL_VERBS: &[&str] = &[
    "add", "build", "create", "define", "design", "implement", "introduce", "scaffold", "set",
    "setup",
];

/// Artifacts that only make sense after something was built.
pub const FOLLOW_UP_TERMS: &[&str] = &[
    "changelog", "deploy", "deployment", "doc", "docs", "documentation", "readme", "release",
    "review", "spec", "specs", "test", "tests",
];

pub const ANAPHORA: &[&str] = &["it", "its", "that", "them", "these", "this", "those"];

static SEPARATOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(?:[;,]|\.\s)\s*(?:(?:and\s+)?then\s+|and\s+|also\s+|plus\s+|after\s+that,?\s+)?|\s+(?:and\s+then|after\s+that|then|and|also|plus)\s+|\?\s*",
    )
    .ok()
});

/// Result of scanning a query for compound structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexityReport {
    /// Actionable clauses, in query order. A simple query yields one.
    pub clauses: Vec<String>,
    pub indicators: usize,
    /// Separators that joined two actionable clauses.
    pub joined_clauses: usize,
    pub question_marks: usize,
    /// Distinct action verbs opening a clause.
    pub action_verbs: BTreeSet<String>,
}

pub fn is_action_verb(word: &str) -> bool {
    ACTION_VERBS.contains(&word)
}

fn is_actionable(text: &str) -> bool {
    first_word(text).is_some_and(|w| is_action_verb(&w) || QUESTION_WORDS.contains(&w.as_str()))
}

/// Whether a clause opens with a foundational verb.
pub fn is_foundational(clause: &str) -> bool {
    first_word(clause).is_some_and(|w| FOUNDATIONAL_VERBS.contains(&w.as_str()))
}

pub fn mentions_follow_up(clause: &str) -> bool {
    token_set(clause)
        .iter()
        .any(|t| FOLLOW_UP_TERMS.contains(&t.as_str()))
}

pub fn has_anaphora(clause: &str) -> bool {
    token_set(clause).iter().any(|t| ANAPHORA.contains(&t.as_str()))
}

/// Content terms naming what a clause is about: no action verbs, no follow-up
/// artifacts.
pub fn subject_terms(clause: &str) -> BTreeSet<String> {
    content_terms(clause)
        .into_iter()
        .filter(|t| !is_action_verb(t) && !FOLLOW_UP_TERMS.contains(&t.as_str()))
        .collect()
}

/// Split `query` into actionable clauses and count complexity indicators.
pub fn analyze(query: &str) -> ComplexityReport {
    let mut clauses = Vec::new();
    let mut joined_clauses = 0;
    let mut seg_start = 0;

    if let Some(re) = SEPARATOR.as_ref() {
        for m in re.find_iter(query) {
            if m.start() < seg_start || !is_actionable(&query[m.end()..]) {
                continue;
            }
            let is_question = m.as_str().trim_start().starts_with('?');
            // Keep the question mark with the question it ends.
            let seg_end = if is_question { m.start() + 1 } else { m.start() };
            push_clause(&mut clauses, &query[seg_start..seg_end]);
            if !is_question {
                joined_clauses += 1;
            }
            seg_start = m.end();
        }
    }
    push_clause(&mut clauses, &query[seg_start..]);

    let question_marks = query.matches('?').count();
    let action_verbs: BTreeSet<String> = clauses
        .iter()
        .filter_map(|c| first_word(c))
        .filter(|w| is_action_verb(w))
        .collect();

    let mut indicators = joined_clauses;
    if question_marks >= 2 {
        indicators += question_marks - 1;
    }
    if action_verbs.len() >= 2 {
        indicators += 1;
    }

    ComplexityReport {
        clauses,
        indicators,
        joined_clauses,
        question_marks,
        action_verbs,
    }
}

fn push_clause(clauses: &mut Vec<String>, raw: &str) {
    let clause = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | '.') || c.is_whitespace());
    if !clause.is_empty() {
        clauses.push(clause.to_string());
    }
}
