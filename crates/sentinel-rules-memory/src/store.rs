use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use sentinel_alert_rules::{AlertRule, AlertRulesApi, ApiError, TemplateAlertRule};
use sentinel_core::AlertRuleId;
use time::OffsetDateTime;
use tokio::sync::Mutex;

const RULE_RESOURCE_TYPE: &str = "Microsoft.SecurityInsights/alertRules";

pub type RuleKey = String; // Format: "resource_group/provider/workspace/name", lowercased

pub(crate) fn make_rule_key(
    resource_group: &str,
    provider: &str,
    workspace_name: &str,
    rule_name: &str,
) -> RuleKey {
    format!("{resource_group}/{provider}/{workspace_name}/{rule_name}").to_ascii_lowercase()
}

/// In-memory alert rule collection using papaya lock-free HashMap.
///
/// This implementation provides:
/// - Case-insensitive addressing, like ARM
/// - A fresh etag on every write, with stale etags rejected
/// - A write counter, so tests can assert that a rejected operation wrote nothing
/// - Failure injection, to exercise error paths of callers
#[derive(Debug)]
pub struct InMemoryAlertRules {
    subscription_id: String,
    /// Main storage using papaya for lock-free concurrent reads
    data: Arc<PapayaHashMap<RuleKey, AlertRule>>,
    /// Serializes writes so the etag check and the insert happen together
    write_lock: Mutex<()>,
    etag_counter: AtomicU64,
    writes: AtomicU64,
    /// HTTP status every call fails with; 0 disables injection
    failure_status: AtomicU16,
}

impl InMemoryAlertRules {
    /// Creates an empty collection for one subscription.
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            data: Arc::new(PapayaHashMap::new()),
            write_lock: Mutex::new(()),
            etag_counter: AtomicU64::new(1),
            writes: AtomicU64::new(0),
            failure_status: AtomicU16::new(0),
        }
    }

    /// Stores a rule without any etag check and without counting it as a
    /// write. Used to seed rules created "out of band".
    pub fn seed(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
        rule: AlertRule,
    ) -> AlertRule {
        let id = self.rule_id(resource_group, workspace_name, rule_name);
        let stamped = self.stamp(rule, &id);
        let key = make_rule_key(resource_group, provider, workspace_name, rule_name);
        self.data.pin().insert(key, stamped.clone());
        stamped
    }

    /// Makes every subsequent call fail with the given HTTP status.
    pub fn fail_with(&self, status: u16) {
        self.failure_status.store(status, Ordering::SeqCst);
    }

    pub fn clear_failure(&self) {
        self.failure_status.store(0, Ordering::SeqCst);
    }

    /// Number of successful writes (upserts and deletes) so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rule_id(&self, resource_group: &str, workspace_name: &str, rule_name: &str) -> String {
        AlertRuleId::new(
            self.subscription_id.clone(),
            resource_group,
            workspace_name,
            rule_name,
        )
        .id()
    }

    fn next_etag(&self) -> String {
        let n = self.etag_counter.fetch_add(1, Ordering::SeqCst);
        format!("\"{n:08x}-0000-0000-0000-000000000000\"")
    }

    fn check_failure(&self) -> Result<(), ApiError> {
        match self.failure_status.load(Ordering::SeqCst) {
            0 => Ok(()),
            status => Err(ApiError::http(
                status,
                Some("InjectedFailure".to_string()),
                "failure injected by test",
            )),
        }
    }

    /// Fills in the server-owned fields of a rule.
    fn stamp(&self, rule: AlertRule, id: &str) -> AlertRule {
        let etag = self.next_etag();
        let name = id.rsplit('/').next().unwrap_or_default().to_string();
        match rule {
            AlertRule::MlBehaviorAnalytics(mut r) => {
                stamp_template(&mut r, id, name, etag);
                AlertRule::MlBehaviorAnalytics(r)
            }
            AlertRule::Fusion(mut r) => {
                stamp_template(&mut r, id, name, etag);
                AlertRule::Fusion(r)
            }
            AlertRule::Other(mut r) => {
                if let Some(obj) = r.body.as_object_mut() {
                    obj.insert("id".to_string(), id.into());
                    obj.insert("name".to_string(), name.into());
                    obj.insert("etag".to_string(), etag.clone().into());
                }
                r.id = Some(id.to_string());
                r.etag = Some(etag);
                AlertRule::Other(r)
            }
        }
    }
}

fn stamp_template(rule: &mut TemplateAlertRule, id: &str, name: String, etag: String) {
    rule.id = Some(id.to_string());
    rule.name = Some(name);
    rule.resource_type = Some(RULE_RESOURCE_TYPE.to_string());
    rule.etag = Some(etag);
    if let Some(props) = rule.properties.as_mut() {
        props.last_modified_utc = Some(OffsetDateTime::now_utc());
    }
}

impl Default for InMemoryAlertRules {
    fn default() -> Self {
        Self::new("00000000-0000-0000-0000-000000000000")
    }
}

#[async_trait]
impl AlertRulesApi for InMemoryAlertRules {
    async fn get(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<AlertRule, ApiError> {
        self.check_failure()?;
        let key = make_rule_key(resource_group, provider, workspace_name, rule_name);
        let guard = self.data.pin();
        guard
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::not_found(self.rule_id(resource_group, workspace_name, rule_name)))
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
        rule: &AlertRule,
    ) -> Result<AlertRule, ApiError> {
        self.check_failure()?;
        let id = self.rule_id(resource_group, workspace_name, rule_name);
        let key = make_rule_key(resource_group, provider, workspace_name, rule_name);

        let _write = self.write_lock.lock().await;
        let guard = self.data.pin();

        if let Some(expected) = rule.etag() {
            let actual = guard.get(&key).and_then(|existing| existing.etag().map(str::to_string));
            match actual {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(ApiError::precondition_failed(
                        id,
                        format!("etag {expected} does not match current etag {actual}"),
                    ));
                }
                None => {
                    return Err(ApiError::precondition_failed(
                        id,
                        format!("etag {expected} given but the rule does not exist"),
                    ));
                }
            }
        }

        let stamped = self.stamp(rule.clone(), &id);
        guard.insert(key, stamped.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(rule = %id, kind = %stamped.kind(), "stored alert rule");
        Ok(stamped)
    }

    async fn delete(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<(), ApiError> {
        self.check_failure()?;
        let key = make_rule_key(resource_group, provider, workspace_name, rule_name);

        let _write = self.write_lock.lock().await;
        // ARM answers 204 for rules that are already gone.
        if self.data.pin().remove(&key).is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
