use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default wall-clock budget for one network call.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Resolve to `None` if `fut` has not settled within `deadline`.
///
/// Missing the deadline is never fatal; callers fall back to a placeholder or
/// the zero-sentinel. The losing future is dropped, not cancelled remotely.
pub async fn with_deadline<F: Future>(deadline: Duration, fut: F) -> Option<F::Output> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(output) => Some(output),
        Err(_) => {
            debug!(?deadline, "Operation missed its deadline");
            None
        }
    }
}
