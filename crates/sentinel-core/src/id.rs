//! Azure Resource Manager identifiers for Log Analytics workspaces and the
//! Sentinel alert rules that live inside them.
//!
//! Both identifiers render to and parse from the canonical ARM form:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.OperationalInsights/workspaces/{ws}
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.OperationalInsights/workspaces/{ws}/providers/Microsoft.SecurityInsights/alertRules/{name}
//! ```
//!
//! Segment keys and provider namespaces are matched case-insensitively, since
//! ARM itself hands back ids such as `/resourcegroups/` on some endpoints.
//! Values are kept exactly as given.
//!
//! ```
//! use sentinel_core::AlertRuleId;
//!
//! let id = AlertRuleId::parse(
//!     "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.OperationalInsights/workspaces/ws1/providers/Microsoft.SecurityInsights/alertRules/rule1",
//! )
//! .unwrap();
//! assert_eq!(id.workspace_name, "ws1");
//! assert_eq!(id.name, "rule1");
//! ```

use std::fmt;

use crate::error::{CoreError, Result};

/// Resource provider namespace owning Log Analytics workspaces. Passed to every
/// alert rule API call.
pub const OPERATIONAL_INSIGHTS_PROVIDER: &str = "Microsoft.OperationalInsights";

/// Resource provider namespace owning Sentinel alert rules.
pub const SECURITY_INSIGHTS_PROVIDER: &str = "Microsoft.SecurityInsights";

/// A Log Analytics workspace identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub workspace_name: String,
}

impl WorkspaceId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        workspace_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            workspace_name: workspace_name.into(),
        }
    }

    /// Parses a workspace id. Trailing segments are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = Segments::new("LogAnalyticsWorkspace", input)?;
        let id = Self::from_segments(&mut segments)?;
        segments.finish()?;
        Ok(id)
    }

    fn from_segments(segments: &mut Segments<'_>) -> Result<Self> {
        let subscription_id = segments.value("subscriptions")?;
        let resource_group = segments.value("resourceGroups")?;
        segments.fixed("providers", OPERATIONAL_INSIGHTS_PROVIDER)?;
        let workspace_name = segments.value("workspaces")?;
        Ok(Self::new(subscription_id, resource_group, workspace_name))
    }

    /// Renders the canonical ARM id.
    pub fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/workspaces/{}",
            self.subscription_id, self.resource_group, OPERATIONAL_INSIGHTS_PROVIDER, self.workspace_name
        )
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// A Sentinel alert rule identifier: a workspace plus a rule name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertRuleId {
    pub subscription_id: String,
    pub resource_group: String,
    pub workspace_name: String,
    pub name: String,
}

impl AlertRuleId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        workspace_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            workspace_name: workspace_name.into(),
            name: name.into(),
        }
    }

    /// Derives the rule id from the workspace that contains it.
    pub fn in_workspace(workspace: &WorkspaceId, name: impl Into<String>) -> Self {
        Self::new(
            workspace.subscription_id.clone(),
            workspace.resource_group.clone(),
            workspace.workspace_name.clone(),
            name,
        )
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = Segments::new("AlertRule", input)?;
        let workspace = WorkspaceId::from_segments(&mut segments)?;
        segments.fixed("providers", SECURITY_INSIGHTS_PROVIDER)?;
        let name = segments.value("alertRules")?;
        segments.finish()?;
        Ok(Self::in_workspace(&workspace, name))
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        WorkspaceId::new(
            self.subscription_id.clone(),
            self.resource_group.clone(),
            self.workspace_name.clone(),
        )
    }

    pub fn id(&self) -> String {
        format!(
            "{}/providers/{}/alertRules/{}",
            self.workspace_id().id(),
            SECURITY_INSIGHTS_PROVIDER,
            self.name
        )
    }
}

impl fmt::Display for AlertRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Cursor over the `key/value` pairs of an ARM id.
struct Segments<'a> {
    kind: &'static str,
    input: &'a str,
    parts: Vec<&'a str>,
    pos: usize,
}

impl<'a> Segments<'a> {
    fn new(kind: &'static str, input: &'a str) -> Result<Self> {
        let trimmed = input
            .strip_prefix('/')
            .ok_or_else(|| CoreError::invalid_id(kind, input, "ID must start with '/'"))?;
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::invalid_id(kind, input, "ID contains an empty segment"));
        }
        if parts.len() % 2 != 0 {
            return Err(CoreError::invalid_id(
                kind,
                input,
                "the number of segments is not divisible by 2",
            ));
        }
        Ok(Self {
            kind,
            input,
            parts,
            pos: 0,
        })
    }

    fn value(&mut self, key: &str) -> Result<&'a str> {
        match self.parts.get(self.pos) {
            Some(found) if found.eq_ignore_ascii_case(key) => {
                let value = self.parts[self.pos + 1];
                self.pos += 2;
                Ok(value)
            }
            Some(found) => Err(self.error(format!("expected segment {key:?}, found {found:?}"))),
            None => Err(self.error(format!("missing segment {key:?}"))),
        }
    }

    fn fixed(&mut self, key: &str, expected: &str) -> Result<()> {
        let value = self.value(key)?;
        if !value.eq_ignore_ascii_case(expected) {
            return Err(self.error(format!(
                "expected {key:?} to be {expected:?}, found {value:?}"
            )));
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if self.pos < self.parts.len() {
            let rest = self.parts[self.pos..].join("/");
            return Err(self.error(format!("unexpected trailing segments {rest:?}")));
        }
        Ok(())
    }

    fn error(&self, reason: String) -> CoreError {
        CoreError::invalid_id(self.kind, self.input, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKSPACE: &str = "/subscriptions/11111111-1111-1111-1111-111111111111/resourceGroups/security-rg/providers/Microsoft.OperationalInsights/workspaces/sentinel-ws";

    #[test]
    fn test_workspace_id_round_trips() {
        let id = WorkspaceId::parse(WORKSPACE).unwrap();
        assert_eq!(id.subscription_id, "11111111-1111-1111-1111-111111111111");
        assert_eq!(id.resource_group, "security-rg");
        assert_eq!(id.workspace_name, "sentinel-ws");
        assert_eq!(id.id(), WORKSPACE);
    }

    #[test]
    fn test_alert_rule_id_derived_from_workspace() {
        let ws = WorkspaceId::parse(WORKSPACE).unwrap();
        let rule = AlertRuleId::in_workspace(&ws, "ml-rule");
        assert_eq!(
            rule.id(),
            format!("{WORKSPACE}/providers/Microsoft.SecurityInsights/alertRules/ml-rule")
        );
        assert_eq!(AlertRuleId::parse(&rule.id()).unwrap(), rule);
        assert_eq!(rule.workspace_id(), ws);
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let lower = "/subscriptions/s/resourcegroups/rg/providers/microsoft.operationalinsights/workspaces/ws/providers/microsoft.securityinsights/alertrules/r";
        let id = AlertRuleId::parse(lower).unwrap();
        assert_eq!(id.resource_group, "rg");
        assert_eq!(id.name, "r");
        assert!(id.id().contains("/resourceGroups/rg/"));
    }

    #[test]
    fn test_rejects_malformed_ids() {
        for input in [
            "",
            "subscriptions/s/resourceGroups/rg",
            "/subscriptions/s/resourceGroups",
            "/subscriptions//resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/ws",
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/workspaces/ws",
        ] {
            assert!(WorkspaceId::parse(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_workspace_id_is_not_an_alert_rule_id() {
        let err = AlertRuleId::parse(WORKSPACE).unwrap_err();
        assert!(err.to_string().contains("missing segment \"providers\""));

        let rule = format!("{WORKSPACE}/providers/Microsoft.SecurityInsights/alertRules/r");
        let err = WorkspaceId::parse(&rule).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }
}
