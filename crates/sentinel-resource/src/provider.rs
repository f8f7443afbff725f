//! Resource registry keyed by declarative type name.
//!
//! Callers that only know a type name and a JSON configuration (the CLI,
//! state files) go through [`Provider`] and the object-safe [`Resource`]
//! trait instead of the typed reconcilers.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use sentinel_alert_rules::DynAlertRulesApi;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{ResourceError, Result};
use crate::kind::{Fusion, MlBehaviorAnalytics, TemplateRuleKind};
use crate::model::{AlertRuleConfig, AlertRuleState};
use crate::plan::{Plan, plan};
use crate::reconciler::TemplateAlertRuleResource;
use crate::schema::Schema;
use crate::timeouts::Timeouts;

/// A declarative resource speaking JSON objects.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, config: Value) -> Result<Value>;

    /// `Ok(None)` means the remote object is gone.
    async fn read(&self, id: &str) -> Result<Option<Value>>;

    /// Re-reads the object recorded in `prior` state. Attributes the remote
    /// side does not report keep their prior values.
    async fn refresh(&self, prior: &Value) -> Result<Option<Value>>;

    async fn update(&self, config: Value) -> Result<Value>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn import(&self, id: &str) -> Result<Value>;

    /// Diffs prior state against a configuration, normalizing the
    /// configuration first.
    fn plan(&self, prior: Option<&Value>, config: Option<&Value>) -> Result<Plan> {
        let schema = self.schema();
        let config = config.map(|c| schema.normalize(c.clone())).transpose()?;
        let prior = prior.and_then(Value::as_object);
        Ok(plan(&schema, prior, config.as_ref()))
    }
}

#[async_trait]
impl<K: TemplateRuleKind> Resource for TemplateAlertRuleResource<K> {
    fn type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::template_alert_rule()
    }

    async fn create(&self, config: Value) -> Result<Value> {
        let config = AlertRuleConfig::from_value(config)?;
        TemplateAlertRuleResource::create(self, &config).await?.to_value()
    }

    async fn read(&self, id: &str) -> Result<Option<Value>> {
        TemplateAlertRuleResource::read(self, id)
            .await?
            .map(|state| state.to_value())
            .transpose()
    }

    async fn refresh(&self, prior: &Value) -> Result<Option<Value>> {
        let prior: AlertRuleState = serde_json::from_value(prior.clone())?;
        TemplateAlertRuleResource::refresh(self, &prior)
            .await?
            .map(|state| state.to_value())
            .transpose()
    }

    async fn update(&self, config: Value) -> Result<Value> {
        let config = AlertRuleConfig::from_value(config)?;
        TemplateAlertRuleResource::update(self, &config).await?.to_value()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        TemplateAlertRuleResource::delete(self, id).await
    }

    async fn import(&self, id: &str) -> Result<Value> {
        TemplateAlertRuleResource::import(self, id).await?.to_value()
    }
}

/// All resource types served over one alert rule backend.
pub struct Provider {
    resources: IndexMap<&'static str, Arc<dyn Resource>>,
}

impl Provider {
    /// Registers every template alert rule kind against `api`.
    pub fn new(api: DynAlertRulesApi, timeouts: Timeouts, stop: CancellationToken) -> Self {
        let mut provider = Self::empty();
        provider.register(Arc::new(TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(
            api.clone(),
            timeouts,
            stop.clone(),
        )));
        provider.register(Arc::new(TemplateAlertRuleResource::<Fusion>::new(
            api, timeouts, stop,
        )));
        provider
    }

    pub fn empty() -> Self {
        Self {
            resources: IndexMap::new(),
        }
    }

    /// Adds a resource, replacing any previous one with the same type name.
    pub fn register(&mut self, resource: Arc<dyn Resource>) {
        tracing::debug!(resource_type = resource.type_name(), "registered resource type");
        self.resources.insert(resource.type_name(), resource);
    }

    pub fn resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ResourceError::UnknownResourceType(type_name.to_string()))
    }

    /// Registered type names, in registration order.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sentinel_core::WorkspaceId;
    use sentinel_rules_memory::InMemoryAlertRules;
    use serde_json::json;

    use super::*;

    const ML: &str = "azurerm_sentinel_alert_rule_machine_learning_behavior_analytics";

    fn provider() -> (Arc<InMemoryAlertRules>, Provider) {
        let store = Arc::new(InMemoryAlertRules::default());
        let provider = Provider::new(store.clone(), Timeouts::default(), CancellationToken::new());
        (store, provider)
    }

    fn config(enabled: bool) -> Value {
        json!({
            "name": "ml",
            "log_analytics_workspace_id": WorkspaceId::new("00000000-0000-0000-0000-000000000000", "rg", "ws").id(),
            "alert_rule_template_guid": "737a2ce1-70a3-4968-9e90-3e6aca836abf",
            "enabled": enabled,
        })
    }

    #[test]
    fn test_registers_both_kinds() {
        let (_, provider) = provider();
        let types: Vec<_> = provider.resource_types().collect();
        assert_eq!(types, [ML, "azurerm_sentinel_alert_rule_fusion"]);

        let err = provider.resource("azurerm_sentinel_alert_rule_scheduled").err().unwrap();
        assert!(matches!(err, ResourceError::UnknownResourceType(_)));
    }

    #[tokio::test]
    async fn test_json_lifecycle() {
        let (store, provider) = provider();
        let resource = provider.resource(ML).unwrap();

        assert_eq!(resource.plan(None, Some(&config(true))).unwrap(), Plan::Create);
        let state = resource.create(config(true)).await.unwrap();
        let id = state["id"].as_str().unwrap().to_string();
        assert!(resource.plan(Some(&state), Some(&config(true))).unwrap().is_noop());

        let planned = resource.plan(Some(&state), Some(&config(false))).unwrap();
        assert_eq!(
            planned,
            Plan::Update {
                changed: vec!["enabled".to_string()]
            }
        );
        let state = resource.update(config(false)).await.unwrap();
        assert_eq!(state["enabled"], json!(false));

        let refreshed = resource.refresh(&state).await.unwrap().unwrap();
        assert_eq!(refreshed, state);

        resource.delete(&id).await.unwrap();
        assert!(resource.read(&id).await.unwrap().is_none());
        assert!(resource.refresh(&state).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_attributes() {
        let (store, provider) = provider();
        let mut cfg = config(true);
        cfg["severity"] = json!("High");
        let err = provider.resource(ML).unwrap().create(cfg).await.unwrap_err();
        assert!(err.to_string().contains("severity"));
        assert_eq!(store.write_count(), 0);
    }
}
