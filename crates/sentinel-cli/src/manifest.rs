//! TOML resource files.
//!
//! ```toml
//! [[resource]]
//! type = "azurerm_sentinel_alert_rule_machine_learning_behavior_analytics"
//! address = "ml.anomalous_ssh"
//! name = "anomalous-ssh"
//! log_analytics_workspace_id = "/subscriptions/.../workspaces/sentinel"
//! alert_rule_template_guid = "fa118b98-de46-4e94-87f9-8e6d5060b60b"
//! enabled = false
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    resource: Vec<ResourceBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub address: String,
    /// Everything else is the resource's configuration.
    #[serde(flatten)]
    pub attributes: toml::Table,
}

impl ResourceBlock {
    pub fn config(&self) -> Result<Value> {
        serde_json::to_value(&self.attributes)
            .with_context(|| format!("converting attributes of {}", self.address))
    }
}

#[derive(Debug, Default)]
pub struct Manifest {
    pub resources: Vec<ResourceBlock>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let file: ManifestFile = toml::from_str(content).context("Invalid resource file")?;
        let mut seen = HashSet::new();
        for block in &file.resource {
            if block.address.trim().is_empty() {
                anyhow::bail!("resource of type {} has an empty address", block.resource_type);
            }
            if !seen.insert(block.address.as_str()) {
                anyhow::bail!("duplicate resource address \"{}\"", block.address);
            }
        }
        Ok(Self {
            resources: file.resource,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn get(&self, address: &str) -> Option<&ResourceBlock> {
        self.resources.iter().find(|r| r.address == address)
    }
}
