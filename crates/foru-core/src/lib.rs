//! Shared core for ForU backend consumers: request signing, the response
//! envelope, and the per-user metrics cache.
//!
//! Everything that renders a widget goes through two units from this crate:
//! [`RequestAuth`] to sign outbound calls and [`MetricsCache`] to avoid
//! repeating the same metrics GET while several widgets render at once.

pub mod auth;
pub mod cache;
pub mod deadline;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod signer;

pub use auth::{EnvSecret, RequestAuth, SecretSource, StaticSecret};
pub use cache::{
    normalize_key, CacheStats, EntryFetcher, KeyedCache, MetricsCache, MetricsFetcher, TtlCache,
    DEFAULT_METRICS_CAPACITY, DEFAULT_METRICS_TTL,
};
pub use deadline::{with_deadline, DEFAULT_DEADLINE};
pub use envelope::{ApiEnvelope, ApiOutcome};
pub use error::{ForuError, Result};
pub use metrics::UserMetrics;
pub use signer::{timestamp_millis, Payload, SignedHeaders, Signer};
