//! Diffing prior state against desired configuration.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::Schema;

/// What applying a configuration to a prior state would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    NoOp,
    Create,
    /// In-place update of the listed mutable attributes.
    Update { changed: Vec<String> },
    /// Delete then create, because the listed attributes cannot change in place.
    Replace { force_new: Vec<String> },
    Delete,
}

impl Plan {
    pub fn action(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
            Self::Delete => "delete",
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Compares `prior` state with `config`, both already normalized by `schema`.
///
/// Only attributes the schema knows are compared, so server-owned fields in
/// the state (such as `id`) never produce a diff.
pub fn plan(schema: &Schema, prior: Option<&Map<String, Value>>, config: Option<&Map<String, Value>>) -> Plan {
    let (prior, config) = match (prior, config) {
        (None, None) => return Plan::NoOp,
        (None, Some(_)) => return Plan::Create,
        (Some(_), None) => return Plan::Delete,
        (Some(prior), Some(config)) => (prior, config),
    };

    let mut changed = Vec::new();
    let mut force_new = Vec::new();
    for attr in schema.attributes() {
        let before = prior.get(attr.name).unwrap_or(&Value::Null);
        let after = config.get(attr.name).unwrap_or(&Value::Null);
        if before == after {
            continue;
        }
        if attr.force_new {
            force_new.push(attr.name.to_string());
        } else {
            changed.push(attr.name.to_string());
        }
    }

    if !force_new.is_empty() {
        Plan::Replace { force_new }
    } else if !changed.is_empty() {
        Plan::Update { changed }
    } else {
        Plan::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn state() -> Map<String, Value> {
        object(json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/ws/providers/Microsoft.SecurityInsights/alertRules/ml",
            "name": "ml",
            "log_analytics_workspace_id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/ws",
            "alert_rule_template_guid": "737a2ce1-70a3-4968-9e90-3e6aca836abf",
            "enabled": true
        }))
    }

    fn config() -> Map<String, Value> {
        let mut config = state();
        config.remove("id");
        config
    }

    #[test]
    fn test_create_and_delete() {
        let schema = Schema::template_alert_rule();
        assert_eq!(plan(&schema, None, Some(&config())), Plan::Create);
        assert_eq!(plan(&schema, Some(&state()), None), Plan::Delete);
        assert_eq!(plan(&schema, None, None), Plan::NoOp);
    }

    #[test]
    fn test_unchanged_is_noop() {
        let schema = Schema::template_alert_rule();
        assert!(plan(&schema, Some(&state()), Some(&config())).is_noop());
    }

    #[test]
    fn test_enabled_updates_in_place() {
        let schema = Schema::template_alert_rule();
        let mut config = config();
        config.insert("enabled".into(), json!(false));
        assert_eq!(
            plan(&schema, Some(&state()), Some(&config)),
            Plan::Update {
                changed: vec!["enabled".into()]
            }
        );
    }

    #[test]
    fn test_template_change_forces_replacement() {
        let schema = Schema::template_alert_rule();
        let mut config = config();
        config.insert(
            "alert_rule_template_guid".into(),
            json!("fa118b98-de46-4e94-87f9-8e6d5060b60b"),
        );
        config.insert("enabled".into(), json!(false));
        let planned = plan(&schema, Some(&state()), Some(&config));
        assert_eq!(
            planned,
            Plan::Replace {
                force_new: vec!["alert_rule_template_guid".into()]
            }
        );
        assert_eq!(planned.action(), "replace");
    }
}
