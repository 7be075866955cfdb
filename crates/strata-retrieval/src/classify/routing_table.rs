//! Query type → (layer → weight) routing rules.
//!
//! Default weights are hardcoded; individual types can be overridden from the
//! `[classifier.rules]` config table.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use strata_core::config::{defaults, ClassifierConfig};
use strata_core::errors::ConfigError;
use strata_core::models::{LayerId, QueryType};

/// Read-only routing rules, shared by every classifier in a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    rules: HashMap<QueryType, BTreeMap<LayerId, f64>>,
}

impl RoutingTable {
    /// Create with hardcoded default rules.
    pub fn default_rules() -> Self {
        let mut rules = HashMap::new();

        // Procedural: where the work is happening, then the project around it.
        rules.insert(
            QueryType::Procedural,
            Self::build_map(&[(LayerId::Session, 0.6), (LayerId::Project, 0.4)]),
        );
        rules.insert(QueryType::Factual, Self::build_map(&[(LayerId::Vector, 1.0)]));
        rules.insert(
            QueryType::Architectural,
            Self::build_map(&[(LayerId::Project, 1.0)]),
        );
        rules.insert(QueryType::User, Self::build_map(&[(LayerId::User, 1.0)]));
        rules.insert(
            QueryType::Historical,
            Self::build_map(&[(LayerId::Historical, 0.7), (LayerId::Session, 0.3)]),
        );

        // General: every layer, nothing favoured.
        let general: Vec<(LayerId, f64)> = LayerId::ALL
            .iter()
            .map(|&l| (l, defaults::DEFAULT_GENERAL_LAYER_WEIGHT))
            .collect();
        rules.insert(QueryType::General, Self::build_map(&general));

        Self { rules }
    }

    /// Default rules with any `[classifier.rules]` overrides applied. An override
    /// replaces the whole rule for its type.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let mut table = Self::default_rules();
        for (type_name, layers) in &config.rules {
            let query_type =
                QueryType::from_str(type_name).map_err(|e| ConfigError::InvalidValue {
                    field: format!("classifier.rules.{type_name}"),
                    reason: e.to_string(),
                })?;
            let mut rule = BTreeMap::new();
            for (layer_name, weight) in layers {
                let layer = LayerId::from_str(layer_name).map_err(|e| ConfigError::InvalidValue {
                    field: format!("classifier.rules.{type_name}.{layer_name}"),
                    reason: e.to_string(),
                })?;
                rule.insert(layer, *weight);
            }
            table.rules.insert(query_type, rule);
        }
        Ok(table)
    }

    /// Layer weights for a type. A type with no rule routes like GENERAL.
    pub fn weights(&self, query_type: QueryType) -> BTreeMap<LayerId, f64> {
        self.rules
            .get(&query_type)
            .or_else(|| self.rules.get(&QueryType::General))
            .cloned()
            .unwrap_or_default()
    }

    fn build_map(pairs: &[(LayerId, f64)]) -> BTreeMap<LayerId, f64> {
        pairs.iter().copied().collect()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_routing_rules() {
        let table = RoutingTable::default_rules();
        let procedural = table.weights(QueryType::Procedural);
        assert_eq!(procedural.get(&LayerId::Session), Some(&0.6));
        assert_eq!(procedural.get(&LayerId::Project), Some(&0.4));
        assert_eq!(table.weights(QueryType::General).len(), LayerId::COUNT);
    }

    #[test]
    fn config_override_replaces_rule() {
        let mut config = ClassifierConfig::default();
        config.rules.insert(
            "factual".to_string(),
            BTreeMap::from([("vector".to_string(), 0.7), ("project".to_string(), 0.3)]),
        );
        let table = RoutingTable::from_config(&config).unwrap();
        let factual = table.weights(QueryType::Factual);
        assert_eq!(factual.len(), 2);
        assert_eq!(factual.get(&LayerId::Project), Some(&0.3));
    }

    #[test]
    fn unknown_layer_in_override_is_rejected() {
        let mut config = ClassifierConfig::default();
        config.rules.insert(
            "factual".to_string(),
            BTreeMap::from([("wiki".to_string(), 1.0)]),
        );
        assert!(matches!(
            RoutingTable::from_config(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
