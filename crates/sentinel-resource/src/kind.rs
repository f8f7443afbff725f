//! Template-backed alert rule kinds managed by this crate.

use sentinel_alert_rules::{AlertRule, AlertRuleKind, TemplateAlertRule};

/// A rule kind whose writable surface is "template + enabled".
///
/// Implementations tie a declarative type name to one variant of the
/// polymorphic [`AlertRule`].
pub trait TemplateRuleKind: Send + Sync + 'static {
    /// Declarative resource type name.
    const TYPE_NAME: &'static str;

    /// Label used in error messages and logs.
    const LABEL: &'static str;

    fn kind() -> AlertRuleKind;

    fn wrap(rule: TemplateAlertRule) -> AlertRule;

    /// Returns the envelope if `rule` is this kind.
    fn unwrap(rule: &AlertRule) -> Option<&TemplateAlertRule>;
}

/// Machine Learning Behavior Analytics rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlBehaviorAnalytics;

impl TemplateRuleKind for MlBehaviorAnalytics {
    const TYPE_NAME: &'static str = "azurerm_sentinel_alert_rule_machine_learning_behavior_analytics";
    const LABEL: &'static str = "MLBehaviorAnalytics";

    fn kind() -> AlertRuleKind {
        AlertRuleKind::MlBehaviorAnalytics
    }

    fn wrap(rule: TemplateAlertRule) -> AlertRule {
        AlertRule::MlBehaviorAnalytics(rule)
    }

    fn unwrap(rule: &AlertRule) -> Option<&TemplateAlertRule> {
        match rule {
            AlertRule::MlBehaviorAnalytics(r) => Some(r),
            _ => None,
        }
    }
}

/// Fusion (multistage attack detection) rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fusion;

impl TemplateRuleKind for Fusion {
    const TYPE_NAME: &'static str = "azurerm_sentinel_alert_rule_fusion";
    const LABEL: &'static str = "Fusion";

    fn kind() -> AlertRuleKind {
        AlertRuleKind::Fusion
    }

    fn wrap(rule: TemplateAlertRule) -> AlertRule {
        AlertRule::Fusion(rule)
    }

    fn unwrap(rule: &AlertRule) -> Option<&TemplateAlertRule> {
        match rule {
            AlertRule::Fusion(r) => Some(r),
            _ => None,
        }
    }
}
