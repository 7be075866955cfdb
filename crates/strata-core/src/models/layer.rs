use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnknownVariant;

/// Free-form metadata attached to layer items and fused items.
/// Ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// The six memory layers a query can be routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerId {
    /// Working-session log.
    Session,
    /// Project dependency graph.
    Project,
    /// Semantic vector index.
    Vector,
    /// User preference store.
    User,
    /// Decision history / audit log.
    Historical,
    /// General fallback layer.
    General,
}

impl LayerId {
    pub const COUNT: usize = 6;

    pub const ALL: [LayerId; 6] = [
        Self::Session,
        Self::Project,
        Self::Vector,
        Self::User,
        Self::Historical,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "SESSION",
            Self::Project => "PROJECT",
            Self::Vector => "VECTOR",
            Self::User => "USER",
            Self::Historical => "HISTORICAL",
            Self::General => "GENERAL",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str() == upper)
            .ok_or_else(|| UnknownVariant {
                kind: "layer",
                value: s.to_string(),
            })
    }
}

/// One raw item returned by a memory layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerItem {
    pub content: String,
    /// Raw relevance score on the layer's own scale.
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl LayerItem {
    pub fn new(content: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
