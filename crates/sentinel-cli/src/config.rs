use std::time::Duration;

use sentinel_arm::{Credential, DEFAULT_AUTHORITY, DEFAULT_ENDPOINT};
use sentinel_resource::Timeouts;
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sentinel.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub state: StateConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Azure validations
        if self.azure.subscription_id.trim().is_empty() {
            return Err("azure.subscription_id is required".into());
        }
        if self.azure.endpoint.trim().is_empty() {
            return Err("azure.endpoint must not be empty".into());
        }
        if self.azure.access_token.is_none() {
            let missing: Vec<&str> = [
                ("tenant_id", &self.azure.tenant_id),
                ("client_id", &self.azure.client_id),
                ("client_secret", &self.azure.client_secret),
            ]
            .into_iter()
            .filter(|(_, v)| v.as_deref().unwrap_or("").is_empty())
            .map(|(k, _)| k)
            .collect();
            if !missing.is_empty() {
                return Err(format!(
                    "azure.access_token or azure.{{tenant_id, client_id, client_secret}} is required (missing {})",
                    missing.join(", ")
                ));
            }
        }
        // Timeout validations
        let t = &self.timeouts;
        if t.create_secs == 0 || t.read_secs == 0 || t.update_secs == 0 || t.delete_secs == 0 {
            return Err("timeouts must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.state.path.trim().is_empty() {
            return Err("state.path must not be empty".into());
        }
        Ok(())
    }

    /// The config with every secret replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        for secret in [&mut cfg.azure.client_secret, &mut cfg.azure.access_token] {
            if secret.is_some() {
                *secret = Some("<redacted>".to_string());
            }
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// For security, prefer SENTINEL__AZURE__CLIENT_SECRET over the file.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Pre-issued bearer token; takes precedence over client credentials.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            endpoint: default_endpoint(),
            authority: default_authority(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            access_token: None,
        }
    }
}

impl AzureConfig {
    /// Builds the credential the ARM client authenticates with. Assumes the
    /// config passed [`AppConfig::validate`].
    pub fn credential(&self) -> Result<Credential, String> {
        if let Some(token) = &self.access_token {
            return Ok(Credential::AccessToken(token.clone()));
        }
        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant), Some(client), Some(secret)) => {
                let scope = format!("{}/.default", self.endpoint.trim_end_matches('/'));
                Ok(Credential::client_secret(tenant, client, secret)
                    .with_authority(&self.authority)
                    .with_scope(scope))
            }
            _ => Err("no Azure credentials configured".into()),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_write_secs")]
    pub create_secs: u64,
    #[serde(default = "default_read_secs")]
    pub read_secs: u64,
    #[serde(default = "default_write_secs")]
    pub update_secs: u64,
    #[serde(default = "default_write_secs")]
    pub delete_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            create_secs: default_write_secs(),
            read_secs: default_read_secs(),
            update_secs: default_write_secs(),
            delete_secs: default_write_secs(),
        }
    }
}

impl From<&TimeoutsConfig> for Timeouts {
    fn from(cfg: &TimeoutsConfig) -> Self {
        Timeouts {
            create: Duration::from_secs(cfg.create_secs),
            read: Duration::from_secs(cfg.read_secs),
            update: Duration::from_secs(cfg.update_secs),
            delete: Duration::from_secs(cfg.delete_secs),
        }
    }
}

fn default_write_secs() -> u64 {
    30 * 60
}

fn default_read_secs() -> u64 {
    5 * 60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> String {
    "sentinel.state.json".to_string()
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_PATH};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file {p} does not exist"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., SENTINEL__AZURE__SUBSCRIPTION_ID=...
        builder = builder.add_source(
            Environment::with_prefix("SENTINEL")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
