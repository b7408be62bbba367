use super::keyed::{EntryFetcher, KeyedCache};
use crate::metrics::UserMetrics;
use std::time::Duration;

pub const DEFAULT_METRICS_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_METRICS_CAPACITY: usize = 500;

/// A fetcher whose entries are [`UserMetrics`]; the zero record is its
/// sentinel.
pub trait MetricsFetcher: EntryFetcher<Value = UserMetrics> {}

impl<T: EntryFetcher<Value = UserMetrics> + ?Sized> MetricsFetcher for T {}

/// Per-user memo of the metrics endpoint. `get` returns
/// [`UserMetrics::zero()`] for unknown users and failed fetches.
pub type MetricsCache<F> = KeyedCache<F>;
