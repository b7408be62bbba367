use foru_core::deadline::DEFAULT_DEADLINE;
use foru_core::{ApiEnvelope, ApiOutcome, ForuError, Payload, RequestAuth, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`ForuClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.foru.example`.
    pub base_url: String,
    /// Per-request wall-clock timeout.
    pub timeout: Duration,
    /// Bearer token for user-scoped endpoints.
    pub bearer: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_DEADLINE,
            bearer: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Signed HTTP client for the ForU backend.
///
/// Every request carries fresh `x-foru-*` headers from the shared
/// [`RequestAuth`]. Cheap to clone.
#[derive(Clone)]
pub struct ForuClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    bearer: Option<String>,
    auth: Arc<RequestAuth>,
}

impl ForuClient {
    pub fn new(config: ClientConfig, auth: RequestAuth) -> Result<Self> {
        Self::with_shared_auth(config, Arc::new(auth))
    }

    pub fn with_shared_auth(config: ClientConfig, auth: Arc<RequestAuth>) -> Result<Self> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ForuError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                config.base_url
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForuError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            bearer: config.bearer,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &Arc<RequestAuth> {
        &self.auth
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Signed GET. `query` is appended to the URL; the signature covers the
    /// query string as it goes on the wire, percent-encoding included.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<ApiOutcome<T>> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ForuError::Config(format!("invalid URL for '{}': {}", path, e)))?;
        if let Payload::Query(q) = Payload::query(query) {
            url.set_query(Some(q.strip_prefix('?').unwrap_or(&q)));
        }
        let payload = Payload::query(url.query().unwrap_or_default());
        let request = self.http.get(url.clone());
        self.dispatch(Method::GET, url.as_str(), request, &payload).await
    }

    /// Signed POST with a JSON body.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiOutcome<T>> {
        self.send_json(Method::POST, path, body).await
    }

    /// Signed PUT with a JSON body.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiOutcome<T>> {
        self.send_json(Method::PUT, path, body).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiOutcome<T>> {
        let body: Value = serde_json::to_value(body)?;
        let url = self.url(path);
        let request = self.http.request(method.clone(), &url).json(&body);
        self.dispatch(method, &url, request, &Payload::Json(body)).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        mut request: RequestBuilder,
        payload: &Payload,
    ) -> Result<ApiOutcome<T>> {
        let headers = self
            .auth
            .signed_headers(method.as_str(), payload, self.bearer.as_deref())
            .await?;
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        debug!(%method, url, "Sending signed request");
        let response = request.send().await.map_err(|e| self.transport(e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<ApiOutcome<T>> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(ApiOutcome::NotFound);
        }

        let text = response.text().await.map_err(|e| self.transport(e))?;
        match serde_json::from_str::<ApiEnvelope<T>>(&text) {
            Ok(envelope) if status.is_success() => Ok(envelope.into_outcome()),
            Ok(envelope) => Ok(ApiOutcome::Failed {
                code: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            }),
            Err(e) if status.is_success() => Err(ForuError::Decode(e)),
            Err(_) => {
                warn!(status = status.as_u16(), "Backend returned a non-envelope error body");
                Ok(ApiOutcome::Failed {
                    code: status.as_u16(),
                    message: text.chars().take(200).collect(),
                })
            }
        }
    }

    fn transport(&self, e: reqwest::Error) -> ForuError {
        if e.is_timeout() {
            ForuError::Timeout(self.timeout)
        } else {
            ForuError::Transport(e.to_string())
        }
    }
}
