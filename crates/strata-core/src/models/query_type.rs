use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnknownVariant;

/// The kind of question a query asks. Determines which layers are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// Continue or perform a task ("continue working on auth").
    Procedural,
    /// Ask what something is or how it works.
    Factual,
    /// Ask about structure: dependencies, imports, modules.
    Architectural,
    /// Ask about the user's own preferences.
    User,
    /// Ask why something was decided, or what happened before.
    Historical,
    /// Anything else; consults every layer.
    General,
}

impl QueryType {
    pub const COUNT: usize = 6;

    pub const ALL: [QueryType; 6] = [
        Self::Procedural,
        Self::Factual,
        Self::Architectural,
        Self::User,
        Self::Historical,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procedural => "PROCEDURAL",
            Self::Factual => "FACTUAL",
            Self::Architectural => "ARCHITECTURAL",
            Self::User => "USER",
            Self::Historical => "HISTORICAL",
            Self::General => "GENERAL",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| UnknownVariant {
                kind: "query type",
                value: s.to_string(),
            })
    }
}
