use super::metrics::{DEFAULT_METRICS_CAPACITY, DEFAULT_METRICS_TTL};
use super::{normalize_key, TtlCache};
use crate::deadline::{with_deadline, DEFAULT_DEADLINE};
use crate::error::{ForuError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as FlightLock;
use tracing::{debug, error};

/// Network side of a [`KeyedCache`].
///
/// `Value::default()` is the sentinel stored when the backend has nothing for
/// a key or the fetch fails.
#[async_trait]
pub trait EntryFetcher: Send + Sync {
    type Value: Clone + Default + Send + Sync + 'static;

    /// `Ok(None)` means the backend has no data for this key yet (404).
    async fn fetch_entry(&self, key: &str) -> Result<Option<Self::Value>>;
}

#[async_trait]
impl<T: EntryFetcher + ?Sized> EntryFetcher for Arc<T> {
    type Value = T::Value;

    async fn fetch_entry(&self, key: &str) -> Result<Option<Self::Value>> {
        (**self).fetch_entry(key).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub fetches: u64,
    pub failures: u64,
    pub entries: usize,
}

/// Per-key memo of one GET endpoint.
///
/// Keys are lower-cased. A fresh entry is served without I/O; anything else
/// goes to the fetcher and the result, or the sentinel on a miss or failure,
/// is stored. `get` never fails.
///
/// Concurrent misses for the same key each fetch unless single-flight is
/// enabled, in which case later callers wait for the first fetch to land.
pub struct KeyedCache<F: EntryFetcher> {
    fetcher: F,
    label: String,
    entries: TtlCache<F::Value>,
    ttl: Duration,
    max_entries: usize,
    fetch_deadline: Duration,
    single_flight: bool,
    flights: Mutex<HashMap<String, Arc<FlightLock<()>>>>,
    hits: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

impl<F: EntryFetcher> KeyedCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            label: "metrics".to_string(),
            entries: TtlCache::new(DEFAULT_METRICS_TTL).with_max_entries(DEFAULT_METRICS_CAPACITY),
            ttl: DEFAULT_METRICS_TTL,
            max_entries: DEFAULT_METRICS_CAPACITY,
            fetch_deadline: DEFAULT_DEADLINE,
            single_flight: false,
            flights: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Name attached to this cache's log lines.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self.entries = TtlCache::new(ttl).with_max_entries(self.max_entries);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self.entries = TtlCache::new(self.ttl).with_max_entries(max);
        self
    }

    pub fn with_fetch_deadline(mut self, deadline: Duration) -> Self {
        self.fetch_deadline = deadline;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn fetch_deadline(&self) -> Duration {
        self.fetch_deadline
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Value for `key`, from cache when fresh unless `force_refresh`.
    pub async fn get(&self, key: &str, force_refresh: bool) -> F::Value {
        let key = normalize_key(key);

        if !force_refresh {
            if let Some(cached) = self.cached(&key) {
                return cached;
            }
            if self.single_flight {
                return self.get_single_flight(&key).await;
            }
        }

        self.refresh(&key).await
    }

    /// Fresh cached value without fetching.
    pub fn peek(&self, key: &str) -> Option<F::Value> {
        self.entries.get(&normalize_key(key))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn cached(&self, key: &str) -> Option<F::Value> {
        let hit = self.entries.get(key);
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    async fn get_single_flight(&self, key: &str) -> F::Value {
        let gate = self.flight_gate(key);
        let value = {
            let _turn = gate.lock().await;
            match self.cached(key) {
                Some(landed) => landed,
                None => self.refresh(key).await,
            }
        };
        self.release_gate(key, gate);
        value
    }

    fn flight_gate(&self, key: &str) -> Arc<FlightLock<()>> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        flights.entry(key.to_string()).or_default().clone()
    }

    fn release_gate(&self, key: &str, gate: Arc<FlightLock<()>>) {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        // map + ours: nobody else is waiting on this key
        if Arc::strong_count(&gate) <= 2 {
            flights.remove(key);
        }
    }

    async fn refresh(&self, key: &str) -> F::Value {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let outcome = with_deadline(self.fetch_deadline, self.fetcher.fetch_entry(key))
            .await
            .unwrap_or_else(|| Err(ForuError::Timeout(self.fetch_deadline)));

        let value = match outcome {
            Ok(Some(value)) => {
                debug!(cache = %self.label, key = %key, "Fetched entry");
                value
            }
            Ok(None) => {
                debug!(cache = %self.label, key = %key, "No data recorded for key yet");
                F::Value::default()
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!(cache = %self.label, key = %key, error = %e, "Failed to fetch cache entry");
                F::Value::default()
            }
        };

        self.entries.insert(key, value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MetricsCache;
    use crate::metrics::UserMetrics;
    use std::sync::atomic::AtomicUsize;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Copy)]
    enum Reply {
        Metrics(UserMetrics),
        NotFound,
        Status(u16),
        Transport,
        Hang,
    }

    struct ScriptedFetcher {
        reply: Mutex<Reply>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(reply),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn set(&self, reply: Reply) {
            *self.reply.lock().unwrap() = reply;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntryFetcher for ScriptedFetcher {
        type Value = UserMetrics;

        async fn fetch_entry(&self, user: &str) -> Result<Option<UserMetrics>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(user.to_string());
            let reply = *self.reply.lock().unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            match reply {
                Reply::Metrics(m) => Ok(Some(m)),
                Reply::NotFound => Ok(None),
                Reply::Status(code) => Err(ForuError::status(code, "Internal Server Error")),
                Reply::Transport => Err(ForuError::Transport("connection refused".into())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    /// Badge lists keyed by handle; unknown handles are 404.
    struct BadgeFetcher;

    #[async_trait]
    impl EntryFetcher for BadgeFetcher {
        type Value = Vec<String>;

        async fn fetch_entry(&self, handle: &str) -> Result<Option<Vec<String>>> {
            match handle {
                "alice" => Ok(Some(vec!["early-adopter".to_string()])),
                "boom" => Err(ForuError::status(500, "database unavailable")),
                _ => Ok(None),
            }
        }
    }

    fn scored(identifi: f64) -> UserMetrics {
        UserMetrics {
            identifi_score: identifi,
            ..UserMetrics::zero()
        }
    }

    #[derive(Clone, Default)]
    struct LevelCapture(Arc<Mutex<Vec<Level>>>);

    impl LevelCapture {
        fn errors(&self) -> usize {
            self.0.lock().unwrap().iter().filter(|l| **l == Level::ERROR).count()
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl_then_again_after() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(10.0)));
        let cache = MetricsCache::new(fetcher.clone());

        assert_eq!(cache.get("Alice", false).await, scored(10.0));
        assert_eq!(cache.get("Alice", false).await, scored(10.0));
        assert_eq!(fetcher.calls(), 1);

        tokio::time::advance(DEFAULT_METRICS_TTL).await;
        fetcher.set(Reply::Metrics(scored(11.0)));
        assert_eq!(cache.get("Alice", false).await, scored(11.0));
        assert_eq!(fetcher.calls(), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fetches, 2);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_case_insensitive() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(3.0)));
        let cache = MetricsCache::new(fetcher.clone());

        cache.get("ALICE", false).await;
        cache.get("alice", false).await;
        cache.get("Alice", false).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fetcher.seen.lock().unwrap().as_slice(), ["alice"]);
        assert_eq!(cache.peek("aLiCe"), Some(scored(3.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_always_fetches() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(1.0)));
        let cache = MetricsCache::new(fetcher.clone());

        cache.get("bob", false).await;
        fetcher.set(Reply::Metrics(scored(2.0)));
        assert_eq!(cache.get("bob", true).await, scored(2.0));
        assert_eq!(cache.get("bob", true).await, scored(2.0));
        assert_eq!(fetcher.calls(), 3);
        // the forced result is what later readers see
        assert_eq!(cache.get("bob", false).await, scored(2.0));
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_caches_zero_without_error_log() {
        let capture = LevelCapture::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(capture.clone()),
        );

        let fetcher = ScriptedFetcher::new(Reply::NotFound);
        let cache = MetricsCache::new(fetcher.clone());

        assert!(cache.get("newcomer", false).await.is_zero());
        assert!(cache.get("newcomer", false).await.is_zero());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(capture.errors(), 0);
        assert_eq!(cache.stats().failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_caches_zero_and_logs_error() {
        let capture = LevelCapture::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(capture.clone()),
        );

        let fetcher = ScriptedFetcher::new(Reply::Status(500));
        let cache = MetricsCache::new(fetcher.clone());

        assert!(cache.get("dave", false).await.is_zero());
        assert_eq!(capture.errors(), 1);

        // the sentinel suppresses hammering the failing endpoint
        assert!(cache.get("dave", false).await.is_zero());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_yields_zero() {
        let fetcher = ScriptedFetcher::new(Reply::Transport);
        let cache = MetricsCache::new(fetcher.clone());
        assert!(cache.get("carol", false).await.is_zero());
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_hits_deadline() {
        let fetcher = ScriptedFetcher::new(Reply::Hang);
        let cache = MetricsCache::new(fetcher.clone()).with_fetch_deadline(Duration::from_secs(5));

        assert!(cache.get("erin", false).await.is_zero());
        assert_eq!(cache.stats().failures, 1);
        assert_eq!(cache.peek("erin"), Some(UserMetrics::zero()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_each_fetch_by_default() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(5.0)));
        let cache = MetricsCache::new(fetcher.clone());

        let (a, b) = tokio::join!(cache.get("frank", false), cache.get("FRANK", false));
        assert_eq!(a, b);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_coalesces_concurrent_misses() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(5.0)));
        let cache = MetricsCache::new(fetcher.clone()).with_single_flight(true);

        let (a, b, c) = tokio::join!(
            cache.get("frank", false),
            cache.get("Frank", false),
            cache.get("FRANK", false)
        );
        assert_eq!(a, scored(5.0));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.flights.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let fetcher = ScriptedFetcher::new(Reply::Metrics(scored(1.0)));
        let cache = MetricsCache::new(fetcher.clone()).with_ttl(Duration::from_secs(600));
        assert_eq!(cache.ttl(), Duration::from_secs(600));

        cache.get("gina", false).await;
        tokio::time::advance(Duration::from_secs(300)).await;
        cache.get("gina", false).await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_metrics_values_use_their_default_as_sentinel() {
        let capture = LevelCapture::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(capture.clone()),
        );

        let cache = KeyedCache::new(BadgeFetcher)
            .with_label("user/badges")
            .with_max_entries(2);
        assert_eq!(cache.label(), "user/badges");

        assert_eq!(cache.get("Alice", false).await, vec!["early-adopter".to_string()]);
        assert!(cache.get("ghost", false).await.is_empty());
        assert_eq!(capture.errors(), 0);

        assert!(cache.get("boom", false).await.is_empty());
        assert_eq!(capture.errors(), 1);

        let stats = cache.stats();
        assert_eq!(stats.fetches, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.entries, 2);
    }
}
