//! Declarative attribute schemas.
//!
//! A [`Schema`] lists the attributes a resource accepts, which of them are
//! required, which force a replacement when they change, their defaults and
//! their validators. Configuration arrives as a JSON object; the schema fills
//! in defaults and rejects anything it does not describe.

use serde_json::{Map, Value};
use sentinel_core::{CoreError, is_uuid, log_analytics_workspace_id, string_is_not_empty};

use crate::error::Result;

pub type Validator = fn(&str, &str) -> sentinel_core::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub required: bool,
    /// Changing the value replaces the remote object instead of updating it.
    pub force_new: bool,
    pub default: Option<Value>,
    pub validate: Option<Validator>,
}

impl Attribute {
    pub fn required_string(name: &'static str) -> Self {
        Self {
            name,
            ty: AttributeType::String,
            required: true,
            force_new: false,
            default: None,
            validate: None,
        }
    }

    pub fn optional_bool(name: &'static str, default: bool) -> Self {
        Self {
            name,
            ty: AttributeType::Bool,
            required: false,
            force_new: false,
            default: Some(Value::Bool(default)),
            validate: None,
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn validated_by(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    fn check(&self, value: &Value) -> sentinel_core::Result<()> {
        match (self.ty, value) {
            (AttributeType::String, Value::String(s)) => match self.validate {
                Some(validate) => validate(self.name, s),
                None => Ok(()),
            },
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),
            (AttributeType::String, other) => Err(CoreError::invalid_attribute(
                self.name,
                format!("expected a string, got {other}"),
            )),
            (AttributeType::Bool, other) => Err(CoreError::invalid_attribute(
                self.name,
                format!("expected a bool, got {other}"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Schema shared by every template-backed alert rule resource.
    pub fn template_alert_rule() -> Self {
        Self::new(vec![
            Attribute::required_string("name")
                .force_new()
                .validated_by(string_is_not_empty),
            Attribute::required_string("log_analytics_workspace_id")
                .force_new()
                .validated_by(log_analytics_workspace_id),
            Attribute::required_string("alert_rule_template_guid")
                .force_new()
                .validated_by(is_uuid),
            Attribute::optional_bool("enabled", true),
        ])
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Fills in defaults for absent (or null) optional attributes.
    pub fn apply_defaults(&self, config: &mut Map<String, Value>) {
        for attr in &self.attributes {
            if let Some(default) = &attr.default {
                let slot = config.entry(attr.name).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = default.clone();
                }
            }
        }
    }

    /// Checks a configuration object: no unknown attributes, every required
    /// attribute present, every value of the right type and accepted by its
    /// validator.
    pub fn validate(&self, config: &Map<String, Value>) -> Result<()> {
        if let Some(unknown) = config.keys().find(|k| self.attribute(k).is_none()) {
            return Err(CoreError::invalid_attribute(unknown.as_str(), "unsupported argument").into());
        }
        for attr in &self.attributes {
            match config.get(attr.name) {
                None | Some(Value::Null) if attr.required => {
                    return Err(CoreError::invalid_attribute(attr.name, "is required").into());
                }
                None | Some(Value::Null) => {}
                Some(value) => attr.check(value)?,
            }
        }
        Ok(())
    }

    /// Applies defaults, then validates.
    pub fn normalize(&self, config: Value) -> Result<Map<String, Value>> {
        let mut map = match config {
            Value::Object(map) => map,
            other => {
                return Err(CoreError::invalid_attribute(
                    "<root>",
                    format!("expected an object, got {other}"),
                )
                .into());
            }
        };
        self.apply_defaults(&mut map);
        self.validate(&map)?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WORKSPACE: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/ws";

    fn config() -> Value {
        json!({
            "name": "rule",
            "log_analytics_workspace_id": WORKSPACE,
            "alert_rule_template_guid": "737a2ce1-70a3-4968-9e90-3e6aca836abf"
        })
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let map = Schema::template_alert_rule().normalize(config()).unwrap();
        assert_eq!(map["enabled"], json!(true));
    }

    #[test]
    fn test_explicit_false_is_kept() {
        let mut cfg = config();
        cfg["enabled"] = json!(false);
        let map = Schema::template_alert_rule().normalize(cfg).unwrap();
        assert_eq!(map["enabled"], json!(false));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let schema = Schema::template_alert_rule();
        for (key, value) in [
            ("name", json!("")),
            ("log_analytics_workspace_id", json!("/subscriptions/s")),
            ("alert_rule_template_guid", json!("not-a-guid")),
            ("enabled", json!("yes")),
            ("display_name", json!("extra")),
        ] {
            let mut cfg = config();
            cfg[key] = value;
            assert!(schema.normalize(cfg).is_err(), "accepted bad {key}");
        }
    }

    #[test]
    fn test_rejects_missing_required() {
        let mut cfg = config();
        cfg.as_object_mut().unwrap().remove("alert_rule_template_guid");
        let err = Schema::template_alert_rule().normalize(cfg).unwrap_err();
        assert!(err.to_string().contains("alert_rule_template_guid"));
    }

    #[test]
    fn test_force_new_attributes() {
        let schema = Schema::template_alert_rule();
        let force_new: Vec<_> = schema
            .attributes()
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name)
            .collect();
        assert_eq!(
            force_new,
            ["name", "log_analytics_workspace_id", "alert_rule_template_guid"]
        );
    }
}
