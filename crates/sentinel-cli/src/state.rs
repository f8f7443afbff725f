//! The local state file: resource address to last-known remote state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub attributes: Value,
}

impl StateEntry {
    /// Builds an entry from the JSON a resource returned; the id is taken
    /// from its `id` attribute.
    pub fn from_attributes(resource_type: impl Into<String>, attributes: Value) -> Result<Self> {
        let id = attributes
            .get("id")
            .and_then(Value::as_str)
            .context("resource state has no id")?
            .to_string();
        Ok(Self {
            resource_type: resource_type.into(),
            id,
            attributes,
        })
    }
}

#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    entries: BTreeMap<String, StateEntry>,
}

impl StateFile {
    /// Loads the state at `path`; a missing file is an empty state.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid state file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the state next to its final location, then renames it over.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), resources = self.entries.len(), "saved state");
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&StateEntry> {
        self.entries.get(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, entry: StateEntry) {
        self.entries.insert(address.into(), entry);
    }

    pub fn remove(&mut self, address: &str) -> Option<StateEntry> {
        self.entries.remove(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateEntry)> {
        self.entries.iter()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> StateEntry {
        StateEntry::from_attributes(
            "azurerm_sentinel_alert_rule_fusion",
            json!({ "id": "/subscriptions/s/x", "name": "BuiltInFusion", "enabled": true }),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::load(dir.path().join("none.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.state.json");

        let mut state = StateFile::load(&path).unwrap();
        state.insert("fusion.main", entry());
        state.save().unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["fusion.main"]["type"], json!("azurerm_sentinel_alert_rule_fusion"));
        assert_eq!(raw["fusion.main"]["id"], json!("/subscriptions/s/x"));

        let mut reloaded = StateFile::load(&path).unwrap();
        assert_eq!(reloaded.get("fusion.main"), Some(&entry()));
        assert!(reloaded.remove("fusion.main").is_some());
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_entry_requires_id() {
        assert!(StateEntry::from_attributes("t", json!({ "name": "x" })).is_err());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(StateFile::load(&path).is_err());
    }
}
