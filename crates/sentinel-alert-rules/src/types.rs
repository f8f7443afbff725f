//! Alert rule types for the Security Insights `alertRules` collection.
//!
//! The wire format is a single JSON object with a `kind` field selecting the
//! variant. Kinds this workspace manages are parsed into typed variants;
//! anything else is kept as an [`UntypedAlertRule`] so a reconciler can still
//! report what it found under a name.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

/// The `kind` discriminant of an alert rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertRuleKind {
    Fusion,
    MlBehaviorAnalytics,
    MicrosoftSecurityIncidentCreation,
    Scheduled,
    ThreatIntelligence,
    /// A kind introduced by the service after this client was written.
    Other(String),
}

impl AlertRuleKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fusion => "Fusion",
            Self::MlBehaviorAnalytics => "MLBehaviorAnalytics",
            Self::MicrosoftSecurityIncidentCreation => "MicrosoftSecurityIncidentCreation",
            Self::Scheduled => "Scheduled",
            Self::ThreatIntelligence => "ThreatIntelligence",
            Self::Other(kind) => kind,
        }
    }

    /// Parses a wire name. Unknown names map to [`AlertRuleKind::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Fusion" => Self::Fusion,
            "MLBehaviorAnalytics" => Self::MlBehaviorAnalytics,
            "MicrosoftSecurityIncidentCreation" => Self::MicrosoftSecurityIncidentCreation,
            "Scheduled" => Self::Scheduled,
            "ThreatIntelligence" => Self::ThreatIntelligence,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AlertRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertRuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertRuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Properties shared by template-backed rule kinds (`MLBehaviorAnalytics`
/// and `Fusion`). Only the template name and the enabled flag are writable;
/// the remaining fields are filled in by the service and never sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRuleProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_rule_template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing)]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub severity: Option<String>,
    #[serde(default, skip_serializing)]
    pub tactics: Vec<String>,
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "time::serde::rfc3339::option::deserialize"
    )]
    pub last_modified_utc: Option<OffsetDateTime>,
}

/// Envelope of a template-backed alert rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateAlertRule {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing)]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing)]
    pub resource_type: Option<String>,
    /// Concurrency token. Sent back unchanged on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<TemplateRuleProperties>,
}

impl TemplateAlertRule {
    /// Builds a write payload from the two writable properties.
    #[must_use]
    pub fn new(alert_rule_template_name: impl Into<String>, enabled: bool) -> Self {
        Self {
            properties: Some(TemplateRuleProperties {
                alert_rule_template_name: Some(alert_rule_template_name.into()),
                enabled: Some(enabled),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Sets the concurrency token.
    #[must_use]
    pub fn with_etag(mut self, etag: Option<String>) -> Self {
        self.etag = etag;
        self
    }
}

/// A rule of a kind this workspace does not model. The body is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UntypedAlertRule {
    pub kind: AlertRuleKind,
    pub id: Option<String>,
    pub etag: Option<String>,
    pub body: Value,
}

/// A rule from the polymorphic `alertRules` collection.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertRule {
    MlBehaviorAnalytics(TemplateAlertRule),
    Fusion(TemplateAlertRule),
    Other(UntypedAlertRule),
}

impl AlertRule {
    #[must_use]
    pub fn kind(&self) -> AlertRuleKind {
        match self {
            Self::MlBehaviorAnalytics(_) => AlertRuleKind::MlBehaviorAnalytics,
            Self::Fusion(_) => AlertRuleKind::Fusion,
            Self::Other(rule) => rule.kind.clone(),
        }
    }

    /// The remote resource id, whatever the variant.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::MlBehaviorAnalytics(rule) | Self::Fusion(rule) => rule.id.as_deref(),
            Self::Other(rule) => rule.id.as_deref(),
        }
    }

    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::MlBehaviorAnalytics(rule) | Self::Fusion(rule) => rule.etag.as_deref(),
            Self::Other(rule) => rule.etag.as_deref(),
        }
    }

    /// The template-backed envelope, if this is a template-backed kind.
    #[must_use]
    pub fn template(&self) -> Option<&TemplateAlertRule> {
        match self {
            Self::MlBehaviorAnalytics(rule) | Self::Fusion(rule) => Some(rule),
            Self::Other(_) => None,
        }
    }

    /// Serializes the rule into its wire form, `kind` included.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = match self {
            Self::MlBehaviorAnalytics(rule) | Self::Fusion(rule) => serde_json::to_value(rule)?,
            Self::Other(rule) => rule.body.clone(),
        };
        if let Some(obj) = value.as_object_mut() {
            obj.insert("kind".to_string(), Value::String(self.kind().as_str().to_string()));
        }
        Ok(value)
    }

    /// Parses a rule from its wire form.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .map(AlertRuleKind::from_name)
            .ok_or_else(|| serde_json::Error::custom("alert rule is missing \"kind\""))?;

        match kind {
            AlertRuleKind::MlBehaviorAnalytics => {
                Ok(Self::MlBehaviorAnalytics(serde_json::from_value(value)?))
            }
            AlertRuleKind::Fusion => Ok(Self::Fusion(serde_json::from_value(value)?)),
            kind => Ok(Self::Other(UntypedAlertRule {
                kind,
                id: value.get("id").and_then(Value::as_str).map(str::to_string),
                etag: value.get("etag").and_then(Value::as_str).map(str::to_string),
                body: value,
            })),
        }
    }
}

impl Serialize for AlertRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AlertRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}
