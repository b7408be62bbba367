use foru_client::{ClientConfig, MetricsSettings, DEFAULT_METRICS_PATH};
use foru_core::{EnvSecret, RequestAuth};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Contents of `foru.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForuConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Value sent in `x-foru-apikey`.
    pub api_key: String,
    /// Environment variable holding the signing secret.
    pub secret_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub metrics: MetricsTomlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsTomlConfig {
    pub path: String,
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub single_flight: bool,
}

impl Default for ForuConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            secret_env: "FORU_SECRET".to_string(),
            timeout_secs: 10,
            metrics: MetricsTomlConfig::default(),
        }
    }
}

impl Default for MetricsTomlConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_METRICS_PATH.to_string(),
            ttl_secs: 30,
            max_entries: 500,
            single_flight: false,
        }
    }
}

impl ForuConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load the file if it exists, falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Human-readable problems, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(format!(
                "base_url must start with http:// or https:// (got '{}')",
                self.base_url
            ));
        }
        if self.api_key.trim().is_empty() {
            errors.push("api_key is not set".to_string());
        }
        if self.secret_env.trim().is_empty() {
            errors.push("secret_env is not set".to_string());
        }
        if self.timeout_secs == 0 {
            errors.push("timeout_secs must be > 0".to_string());
        }
        if self.metrics.ttl_secs == 0 {
            errors.push("metrics.ttl_secs must be > 0".to_string());
        }
        if self.metrics.max_entries == 0 {
            errors.push("metrics.max_entries must be > 0".to_string());
        }
        if self.metrics.path.trim_matches('/').is_empty() {
            errors.push("metrics.path is empty".to_string());
        }
        errors
    }

    pub fn client_config(&self, bearer: Option<&str>) -> ClientConfig {
        let config = ClientConfig::new(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match bearer {
            Some(token) => config.with_bearer(token),
            None => config,
        }
    }

    pub fn metrics_settings(&self) -> MetricsSettings {
        MetricsSettings {
            path: self.metrics.path.clone(),
            ttl: Duration::from_secs(self.metrics.ttl_secs),
            max_entries: self.metrics.max_entries,
            single_flight: self.metrics.single_flight,
        }
    }

    pub fn request_auth(&self) -> RequestAuth {
        RequestAuth::new(&self.api_key, EnvSecret::new(&self.secret_env))
    }
}
