//! Rust client for the ForU backend.
//!
//! Signs every call with the shared [`RequestAuth`] and serves user metrics
//! through one [`MetricsCache`] owned by the [`Foru`] handle.
//!
//! # Example
//! ```rust,no_run
//! use foru_client::{ClientConfig, Foru, MetricsSettings};
//! use foru_core::{EnvSecret, RequestAuth};
//!
//! #[tokio::main]
//! async fn main() -> foru_core::Result<()> {
//!     let auth = RequestAuth::new("extension-key", EnvSecret::new("FORU_SECRET"));
//!     let foru = Foru::new(
//!         ClientConfig::new("https://api.foru.example"),
//!         MetricsSettings::default(),
//!         auth,
//!     )?;
//!
//!     let metrics = foru.fetch_user_metrics("Alice").await;
//!     println!("identifi score: {}", metrics.identifi_score);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod endpoint;
pub mod fetcher;

pub use client::{ClientConfig, ForuClient};
pub use endpoint::{HttpJsonFetcher, JsonEndpointCache};
pub use fetcher::{HttpMetricsFetcher, DEFAULT_METRICS_PATH};

use foru_core::{
    MetricsCache, RequestAuth, Result, UserMetrics, DEFAULT_METRICS_CAPACITY, DEFAULT_METRICS_TTL,
};
use std::sync::Arc;
use std::time::Duration;

/// Metrics cache tuning.
#[derive(Debug, Clone)]
pub struct MetricsSettings {
    pub path: String,
    pub ttl: Duration,
    pub max_entries: usize,
    pub single_flight: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_METRICS_PATH.to_string(),
            ttl: DEFAULT_METRICS_TTL,
            max_entries: DEFAULT_METRICS_CAPACITY,
            single_flight: false,
        }
    }
}

/// Client plus the metrics cache shared by every widget in one tree.
pub struct Foru {
    client: ForuClient,
    metrics: Arc<MetricsCache<HttpMetricsFetcher>>,
}

impl Foru {
    pub fn new(config: ClientConfig, settings: MetricsSettings, auth: RequestAuth) -> Result<Self> {
        Ok(Self::from_client(ForuClient::new(config, auth)?, settings))
    }

    pub fn from_client(client: ForuClient, settings: MetricsSettings) -> Self {
        let fetcher = HttpMetricsFetcher::new(client.clone(), settings.path);
        let label = fetcher.path().to_string();
        let metrics = MetricsCache::new(fetcher)
            .with_label(label)
            .with_ttl(settings.ttl)
            .with_fetch_deadline(client.timeout())
            .with_max_entries(settings.max_entries)
            .with_single_flight(settings.single_flight);
        Self {
            client,
            metrics: Arc::new(metrics),
        }
    }

    pub fn client(&self) -> &ForuClient {
        &self.client
    }

    /// Handle to the shared cache, for components that outlive this borrow.
    pub fn metrics_cache(&self) -> Arc<MetricsCache<HttpMetricsFetcher>> {
        self.metrics.clone()
    }

    /// Cached metrics for `user`; all-zero when the user is unknown or the
    /// backend is unreachable.
    pub async fn fetch_user_metrics(&self, user: &str) -> UserMetrics {
        self.metrics.get(user, false).await
    }

    /// Bypass the cache and overwrite the entry.
    pub async fn refresh_user_metrics(&self, user: &str) -> UserMetrics {
        self.metrics.get(user, true).await
    }

    /// A separate per-user JSON cache with its own TTL, capped and
    /// deadlined like the metrics cache.
    pub fn endpoint_cache(&self, path: &str, ttl: Duration) -> JsonEndpointCache {
        let fetcher = HttpJsonFetcher::new(self.client.clone(), path);
        let label = fetcher.path().to_string();
        JsonEndpointCache::new(fetcher)
            .with_label(label)
            .with_ttl(ttl)
            .with_max_entries(self.metrics.max_entries())
            .with_fetch_deadline(self.client.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foru_core::StaticSecret;

    fn foru(config: ClientConfig) -> Foru {
        Foru::new(
            config,
            MetricsSettings::default(),
            RequestAuth::new("k", StaticSecret::new("s")),
        )
        .unwrap()
    }

    #[test]
    fn test_caches_follow_client_timeout() {
        let config = ClientConfig::new("http://localhost:8080").with_timeout(Duration::from_secs(30));
        let foru = foru(config);
        assert_eq!(foru.metrics_cache().fetch_deadline(), Duration::from_secs(30));
        assert_eq!(foru.metrics_cache().label(), DEFAULT_METRICS_PATH);

        let badges = foru.endpoint_cache("/user/badges/", Duration::from_secs(300));
        assert_eq!(badges.fetch_deadline(), Duration::from_secs(30));
        assert_eq!(badges.ttl(), Duration::from_secs(300));
        assert_eq!(badges.max_entries(), DEFAULT_METRICS_CAPACITY);
        assert_eq!(badges.fetcher().path(), "user/badges");
        assert_eq!(badges.label(), "user/badges");
    }

    #[test]
    fn test_default_settings() {
        let foru = foru(ClientConfig::new("http://localhost:8080"));
        let cache = foru.metrics_cache();
        assert_eq!(cache.ttl(), DEFAULT_METRICS_TTL);
        assert_eq!(cache.max_entries(), DEFAULT_METRICS_CAPACITY);
        assert_eq!(cache.fetch_deadline(), foru_core::DEFAULT_DEADLINE);
    }
}
