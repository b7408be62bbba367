use crate::client::ForuClient;
use async_trait::async_trait;
use foru_core::{ApiOutcome, EntryFetcher, ForuError, Result, UserMetrics};
use serde_json::Value;

pub const DEFAULT_METRICS_PATH: &str = "user/metrics";

/// Fetches `GET {base}/{path}/{user}` for the metrics cache.
pub struct HttpMetricsFetcher {
    client: ForuClient,
    path: String,
}

impl HttpMetricsFetcher {
    pub fn new(client: ForuClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into().trim_matches('/').to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl EntryFetcher for HttpMetricsFetcher {
    type Value = UserMetrics;

    async fn fetch_entry(&self, user: &str) -> Result<Option<UserMetrics>> {
        let path = format!("{}/{}", self.path, urlencoding::encode(user));
        match self.client.get::<Value>(&path, "").await? {
            ApiOutcome::Success(Some(data)) => Ok(Some(UserMetrics::from_value(&data))),
            ApiOutcome::Success(None) => Ok(Some(UserMetrics::zero())),
            ApiOutcome::NotFound => Ok(None),
            ApiOutcome::Failed { code, message } => Err(ForuError::status(code, message)),
        }
    }
}
