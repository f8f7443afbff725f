//! In-memory Sentinel alert rule collection.
//!
//! This crate provides an in-memory implementation of the `AlertRulesApi`
//! trait from `sentinel-alert-rules`, using a papaya lock-free HashMap. It
//! enforces etags on write the same way the service does, which makes it the
//! backend of choice for reconciler tests and offline runs.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_rules_memory::InMemoryAlertRules;
//! use sentinel_alert_rules::{AlertRule, AlertRulesApi, TemplateAlertRule};
//!
//! let rules = InMemoryAlertRules::new("00000000-0000-0000-0000-000000000000");
//! let payload = AlertRule::MlBehaviorAnalytics(TemplateAlertRule::new(
//!     "737a2ce1-70a3-4968-9e90-3e6aca836abf",
//!     true,
//! ));
//! let stored = rules
//!     .create_or_update("rg", "Microsoft.OperationalInsights", "ws", "rule", &payload)
//!     .await?;
//! assert!(stored.etag().is_some());
//! ```

mod store;

pub use sentinel_alert_rules::{AlertRulesApi, ApiError};
pub use store::{InMemoryAlertRules, RuleKey};

