pub mod keyed;
pub mod metrics;
pub mod ttl;

pub use keyed::{CacheStats, EntryFetcher, KeyedCache};
pub use metrics::{MetricsCache, MetricsFetcher, DEFAULT_METRICS_CAPACITY, DEFAULT_METRICS_TTL};
pub use ttl::TtlCache;

/// Cache keys are user identifiers compared case-insensitively.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}
