use async_trait::async_trait;
use sentinel_alert_rules::{AlertRule, AlertRulesApi, ApiError};
use sentinel_core::SECURITY_INSIGHTS_PROVIDER;
use serde_json::Value;
use url::Url;

use crate::auth::{Credential, TokenSource};

/// Public-cloud ARM endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Security Insights API version spoken by this client.
pub const API_VERSION: &str = "2019-01-01-preview";

pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    subscription_id: String,
    tokens: TokenSource,
}

impl ArmClient {
    pub fn new(
        endpoint: &str,
        subscription_id: impl Into<String>,
        credential: Credential,
    ) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| ApiError::transport(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("sentinel-rules/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::transport(format!("building HTTP client: {e}")))?;
        Ok(Self {
            tokens: TokenSource::new(credential, http.clone()),
            http,
            endpoint,
            subscription_id: subscription_id.into(),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn rule_url(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::transport(format!("endpoint {} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                &self.subscription_id,
                "resourceGroups",
                resource_group,
                "providers",
                provider,
                "workspaces",
                workspace_name,
                "providers",
                SECURITY_INSIGHTS_PROVIDER,
                "alertRules",
                rule_name,
            ]);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        url: Url,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = self.tokens.token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        rule_path: &str,
    ) -> Result<(reqwest::StatusCode, String), ApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("sending request for {rule_path}: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("reading response for {rule_path}: {e}")))?;
        tracing::debug!(rule = %rule_path, status = status.as_u16(), "ARM response");
        Ok((status, body))
    }
}

#[async_trait]
impl AlertRulesApi for ArmClient {
    async fn get(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<AlertRule, ApiError> {
        let url = self.rule_url(resource_group, provider, workspace_name, rule_name)?;
        let rule_path = url.path().to_string();
        let req = self.request(reqwest::Method::GET, url).await?;
        let (status, body) = self.send(req, &rule_path).await?;
        handle_rule_response(status, &body, &rule_path)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
        rule: &AlertRule,
    ) -> Result<AlertRule, ApiError> {
        let url = self.rule_url(resource_group, provider, workspace_name, rule_name)?;
        let rule_path = url.path().to_string();
        let payload = rule
            .to_value()
            .map_err(|e| ApiError::decode(format!("encoding alert rule: {e}")))?;
        let req = self
            .request(reqwest::Method::PUT, url)
            .await?
            .header("Content-Type", "application/json")
            .json(&payload);
        let (status, body) = self.send(req, &rule_path).await?;
        handle_rule_response(status, &body, &rule_path)
    }

    async fn delete(
        &self,
        resource_group: &str,
        provider: &str,
        workspace_name: &str,
        rule_name: &str,
    ) -> Result<(), ApiError> {
        let url = self.rule_url(resource_group, provider, workspace_name, rule_name)?;
        let rule_path = url.path().to_string();
        let req = self.request(reqwest::Method::DELETE, url).await?;
        let (status, body) = self.send(req, &rule_path).await?;
        if !status.is_success() {
            return Err(error_from_response(status, &body, &rule_path));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "arm"
    }
}

fn handle_rule_response(
    status: reqwest::StatusCode,
    body: &str,
    rule_path: &str,
) -> Result<AlertRule, ApiError> {
    if !status.is_success() {
        return Err(error_from_response(status, body, rule_path));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::decode(format!("parsing alert rule {rule_path}: {e}")))?;
    AlertRule::from_value(value)
        .map_err(|e| ApiError::decode(format!("parsing alert rule {rule_path}: {e}")))
}

fn error_from_response(status: reqwest::StatusCode, body: &str, rule_path: &str) -> ApiError {
    // ARM wraps failures as {"error": {"code": "...", "message": "..."}}
    let (code, message) = match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let error = json.get("error");
            let code = error
                .and_then(|e| e.get("code"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = error
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map_or_else(|| body.to_string(), str::to_string);
            (code, message)
        }
        Err(_) => (None, body.to_string()),
    };

    match status {
        reqwest::StatusCode::NOT_FOUND => ApiError::not_found(rule_path),
        reqwest::StatusCode::PRECONDITION_FAILED => ApiError::precondition_failed(rule_path, message),
        _ => ApiError::http(status.as_u16(), code, message),
    }
}
