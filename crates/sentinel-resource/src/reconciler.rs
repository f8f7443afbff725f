//! CRUD reconciliation of one template-backed alert rule kind.

use std::marker::PhantomData;

use sentinel_alert_rules::{AlertRule, DynAlertRulesApi, TemplateAlertRule};
use sentinel_core::{AlertRuleId, OPERATIONAL_INSIGHTS_PROVIDER, WorkspaceId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ResourceError, Result};
use crate::kind::TemplateRuleKind;
use crate::model::{AlertRuleConfig, AlertRuleState};
use crate::timeouts::{Operation, Timeouts};

/// Reconciles declarative [`AlertRuleConfig`]s of kind `K` against the
/// remote alert rule collection.
///
/// Every operation runs under its own deadline from [`Timeouts`] and is
/// aborted when `stop` is cancelled.
pub struct TemplateAlertRuleResource<K> {
    api: DynAlertRulesApi,
    timeouts: Timeouts,
    stop: CancellationToken,
    _kind: PhantomData<fn() -> K>,
}

impl<K: TemplateRuleKind> TemplateAlertRuleResource<K> {
    pub fn new(api: DynAlertRulesApi, timeouts: Timeouts, stop: CancellationToken) -> Self {
        Self {
            api,
            timeouts,
            stop,
            _kind: PhantomData,
        }
    }

    /// Creates the rule, refusing to adopt one that already exists.
    pub async fn create(&self, config: &AlertRuleConfig) -> Result<AlertRuleState> {
        config.validate()?;
        let id = rule_id(config)?;

        self.timeouts
            .run(Operation::Create, &self.stop, async {
                match self.get(&id).await {
                    Ok(existing) => {
                        if existing.id().is_some_and(|remote| !remote.is_empty()) {
                            return Err(ResourceError::AlreadyExists {
                                resource_type: K::TYPE_NAME,
                                id: id.id(),
                            });
                        }
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        return Err(ResourceError::api("checking for existing", K::LABEL, id.id(), e));
                    }
                }

                let payload = K::wrap(TemplateAlertRule::new(
                    config.alert_rule_template_guid.as_str(),
                    config.enabled,
                ));
                self.put(&id, &payload)
                    .await
                    .map_err(|e| ResourceError::api("creating", K::LABEL, id.id(), e))
            })
            .await?;

        info!(rule = %id, kind = K::LABEL, enabled = config.enabled, "created alert rule");
        self.read_back(&id, config).await
    }

    /// Updates the rule in place, carrying the remote etag into the write.
    pub async fn update(&self, config: &AlertRuleConfig) -> Result<AlertRuleState> {
        config.validate()?;
        let id = rule_id(config)?;

        self.timeouts
            .run(Operation::Update, &self.stop, async {
                let existing = self
                    .get(&id)
                    .await
                    .map_err(|e| ResourceError::api("retrieving", K::LABEL, id.id(), e))?;
                let current = assert_kind::<K>(&id, &existing)?;

                let payload = K::wrap(
                    TemplateAlertRule::new(config.alert_rule_template_guid.as_str(), config.enabled)
                        .with_etag(current.etag.clone()),
                );
                self.put(&id, &payload)
                    .await
                    .map_err(|e| ResourceError::api("updating", K::LABEL, id.id(), e))
            })
            .await?;

        info!(rule = %id, kind = K::LABEL, enabled = config.enabled, "updated alert rule");
        self.read_back(&id, config).await
    }

    /// Reads the rule. `Ok(None)` means it no longer exists and should be
    /// dropped from state.
    pub async fn read(&self, id: &str) -> Result<Option<AlertRuleState>> {
        let id = AlertRuleId::parse(id)?;
        self.timeouts
            .run(Operation::Read, &self.stop, self.fetch(&id, None))
            .await
    }

    /// Like [`read`](Self::read), but attributes the remote rule does not
    /// report keep their values from `prior`.
    pub async fn refresh(&self, prior: &AlertRuleState) -> Result<Option<AlertRuleState>> {
        let id = AlertRuleId::parse(&prior.id)?;
        self.timeouts
            .run(Operation::Read, &self.stop, self.fetch(&id, Some(&prior.attributes)))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = AlertRuleId::parse(id)?;
        self.timeouts
            .run(Operation::Delete, &self.stop, async {
                self.api
                    .delete(
                        &id.resource_group,
                        OPERATIONAL_INSIGHTS_PROVIDER,
                        &id.workspace_name,
                        &id.name,
                    )
                    .await
                    .map_err(|e| ResourceError::api("deleting", K::LABEL, id.id(), e))
            })
            .await?;

        info!(rule = %id, kind = K::LABEL, "deleted alert rule");
        Ok(())
    }

    /// Adopts an existing remote rule into state.
    ///
    /// The id must parse, the rule must exist and it must be of kind `K`.
    pub async fn import(&self, id: &str) -> Result<AlertRuleState> {
        let id = AlertRuleId::parse(id)?;
        let state = self
            .timeouts
            .run(Operation::Read, &self.stop, async {
                let rule = match self.get(&id).await {
                    Ok(rule) => rule,
                    Err(e) if e.is_not_found() => {
                        return Err(ResourceError::ImportNotFound { id: id.id() });
                    }
                    Err(e) => {
                        return Err(ResourceError::api("retrieving", K::LABEL, id.id(), e));
                    }
                };
                Ok(project(&id, assert_kind::<K>(&id, &rule)?, None))
            })
            .await?;

        info!(rule = %id, kind = K::LABEL, "imported alert rule");
        Ok(state)
    }

    async fn fetch(
        &self,
        id: &AlertRuleId,
        prior: Option<&AlertRuleConfig>,
    ) -> Result<Option<AlertRuleState>> {
        let rule = match self.get(id).await {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                debug!(rule = %id, kind = K::LABEL, "alert rule was not found, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(ResourceError::api("retrieving", K::LABEL, id.id(), e)),
        };
        Ok(Some(project(id, assert_kind::<K>(id, &rule)?, prior)))
    }

    /// Normalizes state after a write by reading the rule back.
    async fn read_back(&self, id: &AlertRuleId, config: &AlertRuleConfig) -> Result<AlertRuleState> {
        let state = self
            .timeouts
            .run(Operation::Read, &self.stop, self.fetch(id, Some(config)))
            .await?;
        match state {
            Some(state) => Ok(state),
            None => {
                warn!(rule = %id, kind = K::LABEL, "alert rule vanished right after it was written");
                Err(ResourceError::Vanished { id: id.id() })
            }
        }
    }

    async fn get(&self, id: &AlertRuleId) -> sentinel_alert_rules::ApiResult<AlertRule> {
        self.api
            .get(
                &id.resource_group,
                OPERATIONAL_INSIGHTS_PROVIDER,
                &id.workspace_name,
                &id.name,
            )
            .await
    }

    async fn put(&self, id: &AlertRuleId, rule: &AlertRule) -> sentinel_alert_rules::ApiResult<()> {
        self.api
            .create_or_update(
                &id.resource_group,
                OPERATIONAL_INSIGHTS_PROVIDER,
                &id.workspace_name,
                &id.name,
                rule,
            )
            .await
            .map(|_| ())
    }
}

fn rule_id(config: &AlertRuleConfig) -> Result<AlertRuleId> {
    let workspace = WorkspaceId::parse(&config.log_analytics_workspace_id)?;
    Ok(AlertRuleId::in_workspace(&workspace, config.name.as_str()))
}

fn assert_kind<'a, K: TemplateRuleKind>(
    id: &AlertRuleId,
    rule: &'a AlertRule,
) -> Result<&'a TemplateAlertRule> {
    K::unwrap(rule).ok_or_else(|| ResourceError::kind_mismatch(id.id(), &K::kind(), &rule.kind()))
}

/// Projects a rule of the right kind into declarative state.
///
/// A rule without a properties object leaves the template and `enabled`
/// attributes as they were in `prior`, falling back to zero values when
/// there is no prior. Inside a properties object, absent fields read back
/// as zero values.
fn project(
    id: &AlertRuleId,
    rule: &TemplateAlertRule,
    prior: Option<&AlertRuleConfig>,
) -> AlertRuleState {
    let (alert_rule_template_guid, enabled) = match (rule.properties.as_ref(), prior) {
        (Some(props), _) => (
            props.alert_rule_template_name.clone().unwrap_or_default(),
            props.enabled.unwrap_or(false),
        ),
        (None, Some(prior)) => (prior.alert_rule_template_guid.clone(), prior.enabled),
        (None, None) => (String::new(), false),
    };
    AlertRuleState {
        id: id.id(),
        attributes: AlertRuleConfig {
            name: id.name.clone(),
            log_analytics_workspace_id: id.workspace_id().id(),
            alert_rule_template_guid,
            enabled,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use sentinel_alert_rules::{AlertRuleKind, AlertRulesApi, ApiError, ApiResult, UntypedAlertRule};
    use sentinel_rules_memory::InMemoryAlertRules;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::ErrorCategory;
    use crate::kind::{Fusion, MlBehaviorAnalytics};

    const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
    const GUID: &str = "737a2ce1-70a3-4968-9e90-3e6aca836abf";

    fn workspace() -> String {
        WorkspaceId::new(SUBSCRIPTION, "rg", "ws").id()
    }

    fn config(name: &str) -> AlertRuleConfig {
        AlertRuleConfig::new(name, workspace(), GUID)
    }

    fn setup() -> (Arc<InMemoryAlertRules>, TemplateAlertRuleResource<MlBehaviorAnalytics>) {
        let store = Arc::new(InMemoryAlertRules::new(SUBSCRIPTION));
        let resource =
            TemplateAlertRuleResource::new(store.clone(), Timeouts::default(), CancellationToken::new());
        (store, resource)
    }

    fn scheduled_rule() -> AlertRule {
        AlertRule::Other(UntypedAlertRule {
            kind: AlertRuleKind::Scheduled,
            id: None,
            etag: None,
            body: json!({
                "kind": "Scheduled",
                "properties": { "displayName": "impossible travel", "enabled": true }
            }),
        })
    }

    #[tokio::test]
    async fn test_create_then_read_matches_config() {
        let (_, resource) = setup();
        let created = assert_ok!(resource.create(&config("ml")).await);
        assert_eq!(created.attributes, config("ml"));
        assert_eq!(
            created.id,
            AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "ml").id()
        );

        let read = assert_ok!(resource.read(&created.id).await).unwrap();
        assert_eq!(read, created);
        assert!(read.to_value().unwrap().get("etag").is_none());
    }

    #[tokio::test]
    async fn test_create_existing_conflicts_without_writing() {
        let (store, resource) = setup();
        store.seed(
            "rg",
            OPERATIONAL_INSIGHTS_PROVIDER,
            "ws",
            "ml",
            MlBehaviorAnalytics::wrap(TemplateAlertRule::new(GUID, true)),
        );

        let err = assert_err!(resource.create(&config("ml")).await);
        assert!(err.is_already_exists());
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().contains("needs to be imported into the state"));
        assert!(err.to_string().contains(MlBehaviorAnalytics::TYPE_NAME));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_create_over_other_kind_conflicts() {
        let (store, resource) = setup();
        store.seed("rg", OPERATIONAL_INSIGHTS_PROVIDER, "ws", "ml", scheduled_rule());

        let err = assert_err!(resource.create(&config("ml")).await);
        assert!(err.is_already_exists());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_kind_mismatch_writes_nothing() {
        let (store, resource) = setup();
        store.seed("rg", OPERATIONAL_INSIGHTS_PROVIDER, "ws", "ml", scheduled_rule());

        let err = assert_err!(resource.update(&config("ml").with_enabled(false)).await);
        assert!(err.is_kind_mismatch());
        assert!(err.to_string().contains("expected: \"MLBehaviorAnalytics\", got \"Scheduled\""));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_threads_etag_and_persists_disabled() {
        let (store, resource) = setup();
        let created = assert_ok!(resource.create(&config("ml")).await);
        let before = store
            .get("rg", OPERATIONAL_INSIGHTS_PROVIDER, "ws", "ml")
            .await
            .unwrap();

        let updated = assert_ok!(resource.update(&config("ml").with_enabled(false)).await);
        assert!(!updated.attributes.enabled);
        assert_eq!(updated.id, created.id);
        assert_eq!(store.write_count(), 2);

        let after = store
            .get("rg", OPERATIONAL_INSIGHTS_PROVIDER, "ws", "ml")
            .await
            .unwrap();
        assert_ne!(after.etag(), before.etag());

        let read = assert_ok!(resource.read(&created.id).await).unwrap();
        assert!(!read.attributes.enabled);
        assert_eq!(read.attributes.alert_rule_template_guid, GUID);
    }

    #[tokio::test]
    async fn test_update_missing_rule_is_fatal() {
        let (store, resource) = setup();
        let err = assert_err!(resource.update(&config("ml")).await);
        assert!(err.api_error().is_some_and(ApiError::is_not_found));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_read_missing_clears_state() {
        let (_, resource) = setup();
        let id = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "gone").id();
        assert_eq!(assert_ok!(resource.read(&id).await), None);
    }

    #[tokio::test]
    async fn test_read_other_kind_is_mismatch() {
        let (store, _) = setup();
        let fusion: TemplateAlertRuleResource<Fusion> =
            TemplateAlertRuleResource::new(store.clone(), Timeouts::default(), CancellationToken::new());
        let ml = TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(
            store.clone(),
            Timeouts::default(),
            CancellationToken::new(),
        );

        let created = assert_ok!(ml.create(&config("ml")).await);
        let err = assert_err!(fusion.read(&created.id).await);
        assert!(err.is_kind_mismatch());
    }

    #[tokio::test]
    async fn test_delete_then_read_is_cleared() {
        let (store, resource) = setup();
        let created = assert_ok!(resource.create(&config("ml")).await);
        assert_ok!(resource.delete(&created.id).await);
        assert!(store.is_empty());
        assert_eq!(assert_ok!(resource.read(&created.id).await), None);
    }

    #[tokio::test]
    async fn test_template_guid_reads_back_byte_identical() {
        let (_, resource) = setup();
        let guid = "FA118B98-DE46-4E94-87F9-8E6D5060B60B";
        let created =
            assert_ok!(resource.create(&AlertRuleConfig::new("ml", workspace(), guid)).await);
        assert_eq!(created.attributes.alert_rule_template_guid, guid);
    }

    #[tokio::test]
    async fn test_remote_failures_are_fatal_and_wrapped() {
        let (store, resource) = setup();
        let id = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "ml").id();
        store.fail_with(500);

        let err = assert_err!(resource.read(&id).await);
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert!(err.to_string().starts_with("retrieving Sentinel Alert Rule MLBehaviorAnalytics"));

        let err = assert_err!(resource.create(&config("ml")).await);
        assert!(err.to_string().starts_with("checking for existing Sentinel Alert Rule"));

        let err = assert_err!(resource.delete(&id).await);
        assert!(err.to_string().starts_with("deleting Sentinel Alert Rule"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_the_api() {
        let (store, resource) = setup();
        store.fail_with(500);

        let err = assert_err!(resource.read("/subscriptions/s/resourceGroups/rg").await);
        assert_eq!(err.category(), ErrorCategory::Validation);

        let bad_guid = AlertRuleConfig::new("ml", workspace(), "not-a-guid");
        let err = assert_err!(resource.create(&bad_guid).await);
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_import() {
        let (store, resource) = setup();
        store.seed(
            "rg",
            OPERATIONAL_INSIGHTS_PROVIDER,
            "ws",
            "ml",
            MlBehaviorAnalytics::wrap(TemplateAlertRule::new(GUID, false)),
        );
        store.seed("rg", OPERATIONAL_INSIGHTS_PROVIDER, "ws", "sched", scheduled_rule());

        let id = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "ml").id();
        let imported = assert_ok!(resource.import(&id).await);
        assert_eq!(imported.attributes, config("ml").with_enabled(false));

        let other = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "sched").id();
        assert!(assert_err!(resource.import(&other).await).is_kind_mismatch());

        let missing = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "missing").id();
        let err = assert_err!(resource.import(&missing).await);
        assert!(matches!(err, ResourceError::ImportNotFound { .. }));
    }

    /// Replaces the rule with one whose body carries no properties object.
    fn seed_bare(store: &InMemoryAlertRules, name: &str) {
        store.seed(
            "rg",
            OPERATIONAL_INSIGHTS_PROVIDER,
            "ws",
            name,
            MlBehaviorAnalytics::wrap(TemplateAlertRule::default()),
        );
    }

    #[tokio::test]
    async fn test_missing_properties_keep_prior_attributes() {
        let (store, resource) = setup();
        let created = assert_ok!(resource.create(&config("bare").with_enabled(false)).await);
        seed_bare(&store, "bare");

        let refreshed = assert_ok!(resource.refresh(&created).await).unwrap();
        assert_eq!(refreshed, created);

        let read = assert_ok!(resource.read(&created.id).await).unwrap();
        assert!(!read.attributes.enabled);
        assert_eq!(read.attributes.alert_rule_template_guid, "");
    }

    #[tokio::test]
    async fn test_missing_properties_plan_converges() {
        let (store, resource) = setup();
        let created = assert_ok!(resource.create(&config("bare")).await);
        seed_bare(&store, "bare");

        let refreshed = assert_ok!(resource.refresh(&created).await).unwrap();
        let prior = refreshed.to_value().unwrap();
        let desired = serde_json::to_value(config("bare")).unwrap();
        let planned = crate::plan::plan(
            &crate::schema::Schema::template_alert_rule(),
            prior.as_object(),
            desired.as_object(),
        );
        assert!(planned.is_noop(), "unexpected plan {planned:?}");
    }

    #[tokio::test]
    async fn test_lowercase_workspace_id_is_rejected() {
        let (store, resource) = setup();
        let lower = format!("/subscriptions/{SUBSCRIPTION}/resourcegroups/rg/providers/microsoft.operationalinsights/workspaces/ws");
        let err = assert_err!(resource.create(&AlertRuleConfig::new("ml", lower, GUID)).await);
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(store.write_count(), 0);
    }

    /// Lets a concurrent writer replace the rule right after the first read.
    struct RacingApi {
        store: Arc<InMemoryAlertRules>,
        raced: AtomicBool,
    }

    #[async_trait]
    impl AlertRulesApi for RacingApi {
        async fn get(&self, rg: &str, provider: &str, ws: &str, name: &str) -> ApiResult<AlertRule> {
            let rule = self.store.get(rg, provider, ws, name).await?;
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.store.seed(
                    rg,
                    provider,
                    ws,
                    name,
                    MlBehaviorAnalytics::wrap(TemplateAlertRule::new(GUID, true)),
                );
            }
            Ok(rule)
        }

        async fn create_or_update(
            &self,
            rg: &str,
            provider: &str,
            ws: &str,
            name: &str,
            rule: &AlertRule,
        ) -> ApiResult<AlertRule> {
            self.store.create_or_update(rg, provider, ws, name, rule).await
        }

        async fn delete(&self, rg: &str, provider: &str, ws: &str, name: &str) -> ApiResult<()> {
            self.store.delete(rg, provider, ws, name).await
        }

        fn backend_name(&self) -> &'static str {
            "racing"
        }
    }

    #[tokio::test]
    async fn test_update_with_stale_etag_fails() {
        let (store, resource) = setup();
        assert_ok!(resource.create(&config("ml")).await);

        let racing = TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(
            Arc::new(RacingApi {
                store: store.clone(),
                raced: AtomicBool::new(false),
            }),
            Timeouts::default(),
            CancellationToken::new(),
        );
        let err = assert_err!(racing.update(&config("ml").with_enabled(false)).await);
        assert!(err.api_error().is_some_and(ApiError::is_precondition_failed));
        assert!(err.to_string().starts_with("updating Sentinel Alert Rule"));
        assert_eq!(store.write_count(), 1);

        let current = assert_ok!(resource.read(&rule_id(&config("ml")).unwrap().id()).await).unwrap();
        assert!(current.attributes.enabled);
    }

    struct StalledApi;

    #[async_trait]
    impl AlertRulesApi for StalledApi {
        async fn get(&self, _: &str, _: &str, _: &str, name: &str) -> ApiResult<AlertRule> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ApiError::not_found(name))
        }

        async fn create_or_update(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
            rule: &AlertRule,
        ) -> ApiResult<AlertRule> {
            Ok(rule.clone())
        }

        async fn delete(&self, _: &str, _: &str, _: &str, _: &str) -> ApiResult<()> {
            std::future::pending().await
        }

        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_respect_deadlines() {
        let timeouts = Timeouts {
            create: Duration::from_secs(60),
            read: Duration::from_secs(5),
            ..Timeouts::default()
        };
        let resource = TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(
            Arc::new(StalledApi),
            timeouts,
            CancellationToken::new(),
        );

        let err = assert_err!(resource.create(&config("ml")).await);
        assert!(matches!(
            err,
            ResourceError::DeadlineExceeded {
                operation: Operation::Create,
                after,
            } if after == Duration::from_secs(60)
        ));

        let id = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "ml").id();
        let err = assert_err!(resource.read(&id).await);
        assert_eq!(err.category(), ErrorCategory::Interrupted);
    }

    #[tokio::test]
    async fn test_stop_cancels_in_flight_delete() {
        let stop = CancellationToken::new();
        let resource = TemplateAlertRuleResource::<MlBehaviorAnalytics>::new(
            Arc::new(StalledApi),
            Timeouts::default(),
            stop.clone(),
        );
        let id = AlertRuleId::new(SUBSCRIPTION, "rg", "ws", "ml").id();

        let task = tokio::spawn(async move { resource.delete(&id).await });
        tokio::task::yield_now().await;
        stop.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            ResourceError::Cancelled {
                operation: Operation::Delete
            }
        ));
    }
}
