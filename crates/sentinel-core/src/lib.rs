pub mod error;
pub mod id;
pub mod validate;

pub use error::{CoreError, ErrorCategory, Result};
pub use id::{AlertRuleId, WorkspaceId, OPERATIONAL_INSIGHTS_PROVIDER, SECURITY_INSIGHTS_PROVIDER};
pub use validate::{is_uuid, log_analytics_workspace_id, string_is_not_empty};
