//! Static lexical rule table.
//!
//! Each rule is a case-insensitive pattern voting for one query type with a fixed
//! weight. A type's score is the sum of its matched rule weights.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use strata_core::models::QueryType;

/// A compiled classification rule.
pub struct LexicalRule {
    pub name: &'static str,
    pub query_type: QueryType,
    pub regex: &'static LazyLock<Option<Regex>>,
    pub weight: f64,
}

macro_rules! lexical_rule {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── Procedural ─────────────────────────────────────────────────────────────
lexical_rule!(
    RE_CONTINUATION,
    r"(?i)^\s*(continue|resume|keep going|carry on|pick up)\b"
);
lexical_rule!(
    RE_WORK_IN_PROGRESS,
    r"(?i)\b(working on|next step|left off|where (was i|were we))\b"
);
lexical_rule!(
    RE_IMPERATIVE,
    r"(?i)^\s*(implement|fix|add|write|create|build|refactor|update|run|set up|setup|deploy|migrate|remove|delete|rename)\b"
);

// ── Factual ────────────────────────────────────────────────────────────────
lexical_rule!(
    RE_WHAT_IS,
    r"(?i)^\s*(what|who|which)\s+(is|are|was|were|does|do)\b"
);
lexical_rule!(RE_HOW_DOES, r"(?i)\bhow (does|do|is|are|can|should)\b");
lexical_rule!(
    RE_EXPLAIN,
    r"(?i)\b(explain|define|definition of|meaning of|describe)\b"
);

// ── Architectural ──────────────────────────────────────────────────────────
lexical_rule!(
    RE_STRUCTURE,
    r"(?i)\b(dependenc(y|ies)|imports?|imported|depends on|dependents|callers|call graph|called by|modules?|architecture|structure|layering|used by)\b"
);

// ── User ───────────────────────────────────────────────────────────────────
lexical_rule!(
    RE_PREFERENCE,
    r"(?i)\b(i prefer|my preference|i like|i usually|i always|my (style|settings|conventions?)|do i (like|prefer|use))\b"
);
lexical_rule!(RE_PREFERENCE_NOUN, r"(?i)\b(preferences?|preferred|conventions?)\b");

// ── Historical ─────────────────────────────────────────────────────────────
lexical_rule!(RE_WHY_DID, r"(?i)\bwhy (did|do|were|was) (we|i|you|they)\b");
lexical_rule!(
    RE_DECISION,
    r"(?i)\b(decision|decided|history|historically|previously|last time|when did|rationale)\b"
);

/// Every rule, grouped by the type it votes for.
pub fn all_rules() -> Vec<LexicalRule> {
    vec![
        LexicalRule {
            name: "continuation",
            query_type: QueryType::Procedural,
            regex: &RE_CONTINUATION,
            weight: 0.8,
        },
        LexicalRule {
            name: "work_in_progress",
            query_type: QueryType::Procedural,
            regex: &RE_WORK_IN_PROGRESS,
            weight: 0.5,
        },
        LexicalRule {
            name: "imperative",
            query_type: QueryType::Procedural,
            regex: &RE_IMPERATIVE,
            weight: 0.7,
        },
        LexicalRule {
            name: "what_is",
            query_type: QueryType::Factual,
            regex: &RE_WHAT_IS,
            weight: 0.8,
        },
        LexicalRule {
            name: "how_does",
            query_type: QueryType::Factual,
            regex: &RE_HOW_DOES,
            weight: 0.7,
        },
        LexicalRule {
            name: "explain",
            query_type: QueryType::Factual,
            regex: &RE_EXPLAIN,
            weight: 0.6,
        },
        LexicalRule {
            name: "structure",
            query_type: QueryType::Architectural,
            regex: &RE_STRUCTURE,
            weight: 0.8,
        },
        LexicalRule {
            name: "preference",
            query_type: QueryType::User,
            regex: &RE_PREFERENCE,
            weight: 0.8,
        },
        LexicalRule {
            name: "preference_noun",
            query_type: QueryType::User,
            regex: &RE_PREFERENCE_NOUN,
            weight: 0.4,
        },
        LexicalRule {
            name: "why_did",
            query_type: QueryType::Historical,
            regex: &RE_WHY_DID,
            weight: 0.9,
        },
        LexicalRule {
            name: "decision",
            query_type: QueryType::Historical,
            regex: &RE_DECISION,
            weight: 0.6,
        },
    ]
}

/// Scores from one pass over the rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Highest-scoring type, `None` when nothing matched.
    pub best: Option<QueryType>,
    /// Always within [0, 1].
    pub confidence: f64,
    pub scores: BTreeMap<QueryType, f64>,
    pub matched: Vec<&'static str>,
}

/// Run every rule against `query`.
///
/// Confidence is `min(1, best) × best / total`: a strong single-type match scores
/// high, competing matches across types pull it down. Ties go to the type declared
/// first in [`QueryType::ALL`].
pub fn evaluate(query: &str) -> RuleMatch {
    let mut scores: BTreeMap<QueryType, f64> = BTreeMap::new();
    let mut matched = Vec::new();

    for rule in all_rules() {
        let Some(re) = rule.regex.as_ref() else { continue };
        if re.is_match(query) {
            *scores.entry(rule.query_type).or_default() += rule.weight;
            matched.push(rule.name);
        }
    }

    let mut best: Option<(QueryType, f64)> = None;
    for query_type in QueryType::ALL {
        if let Some(&score) = scores.get(&query_type) {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((query_type, score));
            }
        }
    }

    let total: f64 = scores.values().sum();
    let confidence = match best {
        Some((_, score)) if total > 0.0 => (score.min(1.0) * (score / total)).clamp(0.0, 1.0),
        _ => 0.0,
    };

    RuleMatch {
        best: best.map(|(t, _)| t),
        confidence,
        scores,
        matched,
    }
}
