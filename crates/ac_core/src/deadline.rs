use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Per-call bounds for downstream I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub generation_secs: u64,
    pub store_secs: u64,
    pub fetch_secs: u64,
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            generation_secs: 60,
            store_secs: 10,
            fetch_secs: 30,
            request_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn generation(&self) -> Duration {
        Duration::from_secs(self.generation_secs)
    }

    pub fn store(&self) -> Duration {
        Duration::from_secs(self.store_secs)
    }

    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Run `fut` until it finishes, `timeout` elapses or `cancel` fires,
/// whichever comes first. A dropped future is never polled again.
pub async fn guarded<T, F>(
    cancel: &CancellationToken,
    timeout: Duration,
    op: &str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled(op.to_string()));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled(op.to_string())),
        outcome = tokio::time::timeout(timeout, fut) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { op: op.to_string(), after: timeout }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_results() {
        let token = CancellationToken::new();
        let value = guarded(&token, Duration::from_secs(1), "noop", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let err = guarded(&token, Duration::from_secs(1), "generate", async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(op) if op == "generate"));
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_work() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let err = guarded(&token, Duration::from_secs(5), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let token = CancellationToken::new();
        let err = guarded(&token, Duration::from_millis(10), "store", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
