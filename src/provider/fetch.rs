//! Bounded-retry fetch loop shared by both clients.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::errors::{RetryClass, UpstreamError};

use super::transport::{HttpTransport, TransportError};

/// Percent-encode query pairs into a query string.
///
/// Pair order is preserved; cache-key normalization sorts separately.
pub(crate) fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Issue a GET with bounded retries and return the response body.
///
/// Retry pacing follows the error's [`RetryClass`]: rate limits honor the
/// upstream's `Retry-After` hint (defaulting to `rate_limit_wait`, capped
/// at `max_rate_limit_wait`); everything else backs off exponentially.
/// After `max_retries` attempts the last failure is returned for the
/// caller's degradation policy to absorb.
pub(crate) async fn fetch_with_retry(
    transport: &dyn HttpTransport,
    config: &ClientConfig,
    provider: &'static str,
    url: &str,
    headers: &[(String, String)],
) -> Result<String, UpstreamError> {
    let mut attempt: u32 = 0;

    loop {
        let failure = match transport.get(url, headers).await {
            Ok(response) if response.is_success() => return Ok(response.body),
            Ok(response) if response.status == 429 => UpstreamError::RateLimited {
                provider,
                retry_after: response.retry_after.map(Duration::from_secs),
            },
            Ok(response) => UpstreamError::Status {
                provider,
                status: response.status,
            },
            Err(TransportError::Timeout) => UpstreamError::Timeout { provider },
            Err(TransportError::Network(message)) => UpstreamError::Network { provider, message },
        };

        attempt += 1;
        if attempt >= config.max_retries {
            warn!(
                "{}: giving up after {} attempts: {}",
                provider, attempt, failure
            );
            return Err(failure);
        }

        let wait = match failure.retry_class() {
            RetryClass::RateLimitWait => {
                let hinted = match &failure {
                    UpstreamError::RateLimited {
                        retry_after: Some(hint),
                        ..
                    } => *hint,
                    _ => config.rate_limit_wait,
                };
                hinted.min(config.max_rate_limit_wait)
            }
            RetryClass::Backoff => config.backoff_base * 2u32.pow(attempt),
        };

        debug!(
            "{}: attempt {} failed ({}), retrying in {:?}",
            provider, attempt, failure, wait
        );
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support::ScriptedTransport;

    #[test]
    fn test_encode_query_escapes_values() {
        let query = encode_query(&[
            ("vs_currency", "usd".to_string()),
            ("ids", "bitcoin,ethereum".to_string()),
        ]);
        assert_eq!(query, "vs_currency=usd&ids=bitcoin%2Cethereum");
    }

    #[tokio::test]
    async fn test_success_returns_body_on_first_attempt() {
        let transport = ScriptedTransport::new().ok(r#"{"ok":true}"#);
        let config = ClientConfig::fast();

        let body = fetch_with_retry(&transport, &config, "coingecko", "http://x", &[])
            .await
            .unwrap();

        assert_eq!(body, r#"{"ok":true}"#);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_then_succeeds() {
        let transport = ScriptedTransport::new()
            .status(500, None)
            .network_error()
            .ok("recovered");
        let config = ClientConfig::fast();

        let body = fetch_with_retry(&transport, &config, "coingecko", "http://x", &[])
            .await
            .unwrap();

        assert_eq!(body, "recovered");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_failure() {
        let transport = ScriptedTransport::failing();
        let config = ClientConfig::fast();

        let result = fetch_with_retry(&transport, &config, "coingecko", "http://x", &[]).await;

        assert!(matches!(result, Err(UpstreamError::Network { .. })));
        // Exactly max_retries outbound calls, no more.
        assert_eq!(transport.calls(), config.max_retries as usize);
    }

    #[tokio::test]
    async fn test_rate_limit_consumes_attempts() {
        let transport = ScriptedTransport::new()
            .status(429, Some(0))
            .status(429, Some(0))
            .status(429, Some(0));
        let config = ClientConfig::fast();

        let result = fetch_with_retry(&transport, &config, "coinapi", "http://x", &[]).await;

        assert!(matches!(result, Err(UpstreamError::RateLimited { .. })));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let transport = ScriptedTransport::new().status(429, Some(0)).ok("after-429");
        let config = ClientConfig::fast();

        let body = fetch_with_retry(&transport, &config, "coinapi", "http://x", &[])
            .await
            .unwrap();

        assert_eq!(body, "after-429");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_after_is_capped() {
        // A hostile Retry-After of an hour must be clamped to the
        // configured ceiling, or this test would hang.
        let transport = ScriptedTransport::new().status(429, Some(3600)).ok("done");
        let config = ClientConfig::fast();

        let body = fetch_with_retry(&transport, &config, "coinapi", "http://x", &[])
            .await
            .unwrap();

        assert_eq!(body, "done");
    }
}
