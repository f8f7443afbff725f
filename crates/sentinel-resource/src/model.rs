//! Declarative configuration and state of a template alert rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::schema::Schema;

fn default_enabled() -> bool {
    true
}

/// User-supplied arguments of a template alert rule resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRuleConfig {
    pub name: String,
    pub log_analytics_workspace_id: String,
    pub alert_rule_template_guid: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl AlertRuleConfig {
    pub fn new(
        name: impl Into<String>,
        log_analytics_workspace_id: impl Into<String>,
        alert_rule_template_guid: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            log_analytics_workspace_id: log_analytics_workspace_id.into(),
            alert_rule_template_guid: alert_rule_template_guid.into(),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Parses and validates a configuration object, applying defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = Schema::template_alert_rule().normalize(value)?;
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Runs the schema validators over this configuration.
    pub fn validate(&self) -> Result<()> {
        let value = serde_json::to_value(self)?;
        Schema::template_alert_rule().normalize(value)?;
        Ok(())
    }
}

/// What is persisted for a managed rule: its resource id plus the
/// attributes last read back from the remote side. Never carries the etag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRuleState {
    pub id: String,
    #[serde(flatten)]
    pub attributes: AlertRuleConfig,
}

impl AlertRuleState {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
