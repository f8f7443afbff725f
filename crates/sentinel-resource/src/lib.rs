//! Declarative reconcilers for template-backed Sentinel alert rules.
//!
//! Rules of every kind share one remote collection per workspace. A
//! reconciler manages exactly one kind: [`TemplateAlertRuleResource`] is
//! generic over a [`TemplateRuleKind`] and checks the remote discriminant
//! before it trusts any field it reads back.
//!
//! ```ignore
//! use sentinel_resource::{AlertRuleConfig, MlBehaviorAnalytics, TemplateAlertRuleResource, Timeouts};
//!
//! let resource = TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(api, Timeouts::default(), stop);
//! let state = resource.create(&AlertRuleConfig::new(
//!     "ml-ssh",
//!     "/subscriptions/.../workspaces/sentinel",
//!     "737a2ce1-70a3-4968-9e90-3e6aca836abf",
//! )).await?;
//! assert!(resource.read(&state.id).await?.is_some());
//! ```

pub mod error;
pub mod kind;
pub mod model;
pub mod plan;
pub mod provider;
pub mod reconciler;
pub mod schema;
pub mod timeouts;

pub use error::{ErrorCategory, ResourceError, Result};
pub use kind::{Fusion, MlBehaviorAnalytics, TemplateRuleKind};
pub use model::{AlertRuleConfig, AlertRuleState};
pub use plan::{Plan, plan};
pub use provider::{Provider, Resource};
pub use reconciler::TemplateAlertRuleResource;
pub use schema::{Attribute, AttributeType, Schema};
pub use timeouts::{Operation, Timeouts};
