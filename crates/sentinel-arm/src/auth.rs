use std::time::{Duration, Instant};

use sentinel_alert_rules::ApiError;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Entra ID authority used when none is configured.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Token scope for Azure Resource Manager in the public cloud.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// How the client proves its identity to ARM.
#[derive(Clone)]
pub enum Credential {
    /// A pre-issued bearer token, used as is.
    AccessToken(String),
    /// Entra ID client credentials grant.
    ClientSecret {
        authority: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
        scope: String,
    },
}

impl Credential {
    pub fn client_secret(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::ClientSecret {
            authority: DEFAULT_AUTHORITY.to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: MANAGEMENT_SCOPE.to_string(),
        }
    }

    /// Overrides the authority host (sovereign clouds, tests).
    pub fn with_authority(mut self, new_authority: impl Into<String>) -> Self {
        if let Self::ClientSecret { authority, .. } = &mut self {
            *authority = new_authority.into().trim_end_matches('/').to_string();
        }
        self
    }

    /// Overrides the token scope.
    pub fn with_scope(mut self, new_scope: impl Into<String>) -> Self {
        if let Self::ClientSecret { scope, .. } = &mut self {
            *scope = new_scope.into();
        }
        self
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens, fetching and caching them when needed.
pub struct TokenSource {
    credential: Credential,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credential: Credential, http: reqwest::Client) -> Self {
        Self {
            credential,
            http,
            cached: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> Result<String, ApiError> {
        let (authority, tenant_id, client_id, client_secret, scope) = match &self.credential {
            Credential::AccessToken(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                authority,
                tenant_id,
                client_id,
                client_secret,
                scope,
            } => (authority, tenant_id, client_id, client_secret, scope),
        };

        if let Some(cached) = self.cached.read().await.as_ref()
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.token.clone());
        }

        let mut slot = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref()
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.token.clone());
        }

        tracing::debug!(tenant_id = %tenant_id, client_id = %client_id, "requesting ARM access token");
        let resp = self
            .http
            .post(format!("{authority}/{tenant_id}/oauth2/v2.0/token"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!(
                "grant_type=client_credentials&client_id={}&client_secret={}&scope={}",
                urlencoding(client_id),
                urlencoding(client_secret),
                urlencoding(scope),
            ))
            .send()
            .await
            .map_err(|e| ApiError::auth(format!("token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| ApiError::auth(format!("token request failed (HTTP {status}): {e}")))?;
            return Err(ApiError::auth(format!("token request failed (HTTP {status}): {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::auth(format!("parsing token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        *slot = Some(CachedToken {
            token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        Ok(token.access_token)
    }
}

fn urlencoding(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
