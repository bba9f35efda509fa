use crate::error::CallError;
use std::future::Future;
use std::time::Duration;

/// Await a remote call for at most `limit`.
///
/// An expired deadline surfaces as [`CallError::Timeout`] and is handled like
/// any other call failure.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, CallError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CallError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_completed_calls() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, CallError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out() {
        let limit = Duration::from_secs(120);
        let result: Result<(), CallError> =
            bounded(limit, std::future::pending::<Result<(), CallError>>()).await;
        assert_eq!(result, Err(CallError::Timeout(limit)));
    }
}
