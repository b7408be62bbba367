use crate::client::ForuClient;
use async_trait::async_trait;
use foru_core::{ApiOutcome, EntryFetcher, ForuError, KeyedCache, Result};
use serde_json::Value;

/// Per-user JSON endpoint cache (badges, DNA traits and similar widget data).
///
/// Shares the metrics cache's behaviour; the sentinel is `Value::Null`.
pub type JsonEndpointCache = KeyedCache<HttpJsonFetcher>;

/// Fetches `GET {base}/{path}/{user}` and hands back the envelope `data`.
pub struct HttpJsonFetcher {
    client: ForuClient,
    path: String,
}

impl HttpJsonFetcher {
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
impl EntryFetcher for HttpJsonFetcher {
    type Value = Value;

    async fn fetch_entry(&self, user: &str) -> Result<Option<Value>> {
        let path = format!("{}/{}", self.path, urlencoding::encode(user));
        match self.client.get::<Value>(&path, "").await? {
            ApiOutcome::Success(data) => Ok(Some(data.unwrap_or(Value::Null))),
            ApiOutcome::NotFound => Ok(None),
            ApiOutcome::Failed { code, message } => Err(ForuError::status(code, message)),
        }
    }
}
