//! # sentinel-alert-rules
//!
//! The Sentinel alert rule collection as seen by resource reconcilers.
//!
//! Every rule in a workspace lives in one remote collection keyed by
//! workspace + rule name. Rules are polymorphic: the `kind` discriminant
//! decides which properties a rule carries. [`AlertRule`] models that as a
//! tagged enum, and [`AlertRulesApi`] is the contract a backend (the ARM
//! REST client, or the in-memory store used in tests) must fulfil.
//!
//! ## Example
//!
//! ```ignore
//! use sentinel_alert_rules::{AlertRule, AlertRulesApi, ApiError};
//!
//! async fn enabled(api: &dyn AlertRulesApi) -> Result<Option<bool>, ApiError> {
//!     let rule = api
//!         .get("rg", "Microsoft.OperationalInsights", "ws", "rule")
//!         .await?;
//!     Ok(rule.template().and_then(|r| r.properties.as_ref()?.enabled))
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ApiError, ErrorCategory};
pub use traits::AlertRulesApi;
pub use types::{AlertRule, AlertRuleKind, TemplateAlertRule, TemplateRuleProperties, UntypedAlertRule};

/// Type alias for an alert rule API result.
pub type ApiResult<T> = Result<T, ApiError>;

/// Type alias for a shared alert rule API trait object.
pub type DynAlertRulesApi = std::sync::Arc<dyn AlertRulesApi>;
