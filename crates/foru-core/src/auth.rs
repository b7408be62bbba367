use crate::error::{ForuError, Result};
use crate::signer::{timestamp_millis, Payload, SignedHeaders, Signer};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Where the shared signing secret comes from.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch_secret(&self) -> Result<Vec<u8>>;
}

/// A secret compiled into the build.
pub struct StaticSecret(Vec<u8>);

impl StaticSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }
}

#[async_trait]
impl SecretSource for StaticSecret {
    async fn fetch_secret(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Reads the secret from an environment variable on first use.
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretSource for EnvSecret {
    async fn fetch_secret(&self) -> Result<Vec<u8>> {
        let raw = std::env::var(&self.var)
            .map_err(|_| ForuError::Secret(format!("{} environment variable not set", self.var)))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ForuError::Secret(format!("{} is empty", self.var)));
        }
        Ok(trimmed.as_bytes().to_vec())
    }
}

/// Builds signed header sets, resolving the secret once on first use.
///
/// Shared by every consumer through an `Arc`; concurrent first calls all wait
/// on the same secret fetch and the resolved [`Signer`] is read-only afterwards.
pub struct RequestAuth {
    api_key: String,
    source: Arc<dyn SecretSource>,
    signer: OnceCell<Signer>,
}

impl RequestAuth {
    pub fn new(api_key: impl Into<String>, source: impl SecretSource + 'static) -> Self {
        Self {
            api_key: api_key.into(),
            source: Arc::new(source),
            signer: OnceCell::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The resolved signer, fetching the secret on the first call.
    ///
    /// A failed fetch is not cached; the next call retries.
    pub async fn signer(&self) -> Result<&Signer> {
        self.signer
            .get_or_try_init(|| async {
                let secret = self.source.fetch_secret().await?;
                debug!(api_key = %self.api_key, "Signing secret resolved");
                Ok::<_, ForuError>(Signer::new(self.api_key.clone(), secret))
            })
            .await
    }

    /// Sign `method` + `payload` with a fresh timestamp.
    pub async fn signed_headers(
        &self,
        method: &str,
        payload: &Payload,
        bearer: Option<&str>,
    ) -> Result<SignedHeaders> {
        let signer = self.signer().await?;
        Ok(signer.headers(method, payload, &timestamp_millis(), bearer))
    }
}
