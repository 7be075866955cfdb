//! Test fixture loader for Strata golden datasets, plus in-memory fakes shared
//! by integration tests across crates.

pub mod fakes;

use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Root directory of the test-fixtures folder, the one holding `golden/`.
fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    // From inside a crate, walk up to the workspace root. The fixture crate
    // itself is also named `test-fixtures`, so look for the datasets.
    while !path.join("test-fixtures").join("golden").is_dir() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_the_golden_datasets() {
        assert!(fixtures_root().join("golden").is_dir());
        assert!(fixture_exists("golden/classification.json"));
        assert!(fixture_exists("golden/decomposition.json"));
    }

    #[test]
    fn golden_classification_loads_as_json() {
        let value = load_fixture_value("golden/classification.json");
        assert!(value["cases"].as_array().is_some_and(|c| !c.is_empty()));
    }
}
