//! Attribute validators used by resource schemas.

use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::id::WorkspaceId;

pub fn string_is_not_empty(attribute: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::empty_value(attribute));
    }
    Ok(())
}

/// Accepts the hyphenated 36-character form only, which is what the
/// Security Insights API returns for template names.
pub fn is_uuid(attribute: &str, value: &str) -> Result<()> {
    if value.len() != 36 || Uuid::try_parse(value).is_err() {
        return Err(CoreError::invalid_uuid(attribute, value));
    }
    Ok(())
}

/// Accepts a workspace id in canonical ARM casing only, matching what
/// state records for it.
pub fn log_analytics_workspace_id(attribute: &str, value: &str) -> Result<()> {
    let id = WorkspaceId::parse(value)
        .map_err(|e| CoreError::invalid_attribute(attribute, e.to_string()))?;
    let canonical = id.id();
    if canonical != value {
        return Err(CoreError::invalid_attribute(
            attribute,
            format!("expected the canonical form {canonical:?}"),
        ));
    }
    Ok(())
}
