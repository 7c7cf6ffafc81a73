//! Deadline for provider calls.

use grounded_types::{GatewayError, ProviderError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Race `fut` against `deadline`.
///
/// On expiry the in-flight future is dropped and never observed again; a late
/// result cannot reach the caller.
pub async fn with_timeout<T, F>(deadline: Duration, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(GatewayError::from),
        Err(_) => {
            warn!("[Timeout] Provider call exceeded {}s deadline", deadline.as_secs());
            Err(GatewayError::ProviderTimeout { duration_secs: deadline.as_secs() })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounded_types::ProviderErrorCode;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let out = with_timeout(Duration::from_secs(1), async { Ok::<_, ProviderError>(7) }).await;
        assert!(matches!(out, Ok(7)));
    }

    #[tokio::test]
    async fn test_times_out_and_abandons_call() {
        let finished = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = finished.clone();
        let out = with_timeout(Duration::from_millis(20), async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, ProviderError>(())
        })
        .await;
        assert_eq!(out.err().map(|e| e.code()), Some("TIMEOUT"));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!finished.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let out = with_timeout(Duration::from_secs(1), async {
            Err::<(), _>(ProviderError::from_code(ProviderErrorCode::InvalidApiKey))
        })
        .await;
        assert_eq!(out.err().map(|e| e.code()), Some("INVALID_API_KEY"));
    }
}
