//! The remote collection contract shared by every alert rule backend.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::AlertRule;

/// Access to the `alertRules` collection of a Sentinel-enabled workspace.
///
/// Every call names the workspace's resource provider explicitly; for Log
/// Analytics workspaces that is always
/// `sentinel_core::OPERATIONAL_INSIGHTS_PROVIDER`. The subscription is bound
/// when the backend is constructed.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait AlertRulesApi: Send + Sync {
    /// Fetches a rule.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no rule with that name exists.
    async fn get(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<AlertRule, ApiError>;

    /// Creates or replaces a rule and returns what the backend stored.
    ///
    /// If the payload carries an etag, the write only succeeds when it matches
    /// the stored rule's etag.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::PreconditionFailed` if the etag is stale.
    async fn create_or_update(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
        rule: &AlertRule,
    ) -> Result<AlertRule, ApiError>;

    /// Deletes a rule.
    async fn delete(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<(), ApiError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
