//! Deadlines for store calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::StoreError;

/// Run a store call, turning an overrun of `limit` into [`StoreError::Unavailable`].
///
/// The request thread is never parked on a hung backend for longer than `limit`.
pub async fn with_deadline<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(StoreError::Unavailable(format!(
                "{operation} did not complete within {}ms",
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let out = with_deadline(Duration::from_millis(50), "fast", async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_becomes_unavailable() {
        let out = with_deadline(Duration::from_millis(50), "slow", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert!(matches!(out, Err(StoreError::Unavailable(_))));
    }
}
