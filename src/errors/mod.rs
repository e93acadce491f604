//! Error types and retry classification for the market data crate.
//!
//! Two error layers exist by design:
//! - [`UpstreamError`]: operational failures (rate limits, timeouts, bad
//!   HTTP statuses). These drive the retry loop and are fully absorbed by
//!   each client's degradation policy; they never reach consumers.
//! - [`MarketDataError`]: faults that do cross the public boundary -
//!   malformed responses, invalid parameters, and total multi-source
//!   failure.

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use thiserror::Error;

/// Errors that can escape the aggregation layer.
///
/// Upstream unavailability is *not* represented here: each client degrades
/// to cached or synthetic data instead of failing. The variants below are
/// the only cases a consumer must handle.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request parameters were structurally invalid (e.g. `page` of
    /// zero). Raised before any network or cache activity.
    #[error("Invalid request parameters: {0}")]
    InvalidParams(String),

    /// An upstream returned a body we could not parse into its documented
    /// shape. Treated as a defect rather than an operational failure -
    /// masking it as degradation would hide a real bug.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider whose response failed to parse
        provider: String,
        /// What went wrong during parsing or conversion
        message: String,
    },

    /// Both providers failed with no cache of any kind available.
    /// The one terminal state the aggregator can reach.
    #[error("All market data sources failed (primary: {primary}; secondary: {secondary})")]
    AllSourcesFailed {
        /// The primary provider's error
        primary: String,
        /// The secondary provider's error
        secondary: String,
    },
}

/// Operational upstream failures, internal to the clients.
///
/// Every variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which determines how the fetch loop
/// paces the next attempt. Once retries are exhausted the client falls back
/// to cached or synthetic data; this type never crosses the client boundary.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: &'static str,
        /// Parsed `Retry-After` hint, if the response carried one
        retry_after: Option<Duration>,
    },

    /// The provider returned a non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    Status {
        /// The provider that returned the status
        provider: &'static str,
        /// The HTTP status code
        status: u16,
    },

    /// The request to the provider timed out.
    #[error("Timeout contacting {provider}")]
    Timeout {
        /// The provider that timed out
        provider: &'static str,
    },

    /// A network-level error occurred before a response was received.
    #[error("Network error contacting {provider}: {message}")]
    Network {
        /// The provider we were contacting
        provider: &'static str,
        /// The underlying transport error
        message: String,
    },
}

impl UpstreamError {
    /// Returns the retry classification for this failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use coinpulse_market_data::errors::{RetryClass, UpstreamError};
    ///
    /// let error = UpstreamError::RateLimited { provider: "coingecko", retry_after: None };
    /// assert_eq!(error.retry_class(), RetryClass::RateLimitWait);
    ///
    /// let error = UpstreamError::Timeout { provider: "coinapi" };
    /// assert_eq!(error.retry_class(), RetryClass::Backoff);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::RateLimitWait,
            Self::Status { .. } | Self::Timeout { .. } | Self::Network { .. } => {
                RetryClass::Backoff
            }
        }
    }
}

/// Outcome of a single live fetch inside a client.
///
/// Separates failures the degradation policy absorbs from faults that must
/// propagate, so the cache pipeline can branch on the distinction.
#[derive(Debug)]
pub(crate) enum LiveError {
    /// Operational failure - degrade to cache or fallback data.
    Upstream(UpstreamError),
    /// Defect - propagate to the caller.
    Fault(MarketDataError),
}

impl From<UpstreamError> for LiveError {
    fn from(e: UpstreamError) -> Self {
        Self::Upstream(e)
    }
}

impl From<MarketDataError> for LiveError {
    fn from(e: MarketDataError) -> Self {
        Self::Fault(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_waits_for_rate_limit() {
        let error = UpstreamError::RateLimited {
            provider: "coingecko",
            retry_after: Some(Duration::from_secs(10)),
        };
        assert_eq!(error.retry_class(), RetryClass::RateLimitWait);
    }

    #[test]
    fn test_status_backs_off() {
        let error = UpstreamError::Status {
            provider: "coingecko",
            status: 503,
        };
        assert_eq!(error.retry_class(), RetryClass::Backoff);
    }

    #[test]
    fn test_timeout_backs_off() {
        let error = UpstreamError::Timeout {
            provider: "coinapi",
        };
        assert_eq!(error.retry_class(), RetryClass::Backoff);
    }

    #[test]
    fn test_network_backs_off() {
        let error = UpstreamError::Network {
            provider: "coinapi",
            message: "connection refused".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Backoff);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::InvalidParams("per_page must be at least 1".to_string());
        assert_eq!(
            format!("{}", error),
            "Invalid request parameters: per_page must be at least 1"
        );

        let error = MarketDataError::MalformedResponse {
            provider: "coingecko".to_string(),
            message: "expected array".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Malformed response from coingecko: expected array"
        );

        let error = UpstreamError::Status {
            provider: "coinapi",
            status: 502,
        };
        assert_eq!(format!("{}", error), "HTTP 502 from coinapi");
    }

    #[test]
    fn test_all_sources_failed_display_names_both() {
        let error = MarketDataError::AllSourcesFailed {
            primary: "HTTP 500 from coingecko".to_string(),
            secondary: "Timeout contacting coinapi".to_string(),
        };
        let rendered = format!("{}", error);
        assert!(rendered.contains("coingecko"));
        assert!(rendered.contains("coinapi"));
    }
}
