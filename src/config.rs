//! Retry, backoff, and TTL configuration for upstream clients.
//!
//! All degradation-policy timing lives here so tests can inject
//! millisecond-scale waits instead of wall-clock ones.

use std::time::Duration;

use crate::cache::ResourceFamily;

/// Freshness TTL per resource family.
///
/// Chosen by volatility: per-coin detail and chart series move fastest,
/// global aggregates and exchange rates slowest.
#[derive(Clone, Debug)]
pub struct FamilyTtls {
    /// Markets listing
    pub markets: Duration,
    /// Per-coin detail
    pub coin_detail: Duration,
    /// Global aggregate
    pub global: Duration,
    /// Exchange rate table
    pub exchange_rates: Duration,
    /// Historical series
    pub chart: Duration,
}

impl FamilyTtls {
    /// The TTL for a given family.
    pub fn for_family(&self, family: ResourceFamily) -> Duration {
        match family {
            ResourceFamily::Markets => self.markets,
            ResourceFamily::CoinDetail => self.coin_detail,
            ResourceFamily::Global => self.global,
            ResourceFamily::ExchangeRates => self.exchange_rates,
            ResourceFamily::Chart => self.chart,
        }
    }
}

impl Default for FamilyTtls {
    fn default() -> Self {
        Self {
            markets: Duration::from_secs(5 * 60),
            coin_detail: Duration::from_secs(2 * 60),
            global: Duration::from_secs(10 * 60),
            exchange_rates: Duration::from_secs(10 * 60),
            chart: Duration::from_secs(2 * 60),
        }
    }
}

/// Degradation-policy configuration for one upstream client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Total attempts per live fetch, including the first.
    pub max_retries: u32,

    /// Base for exponential backoff; attempt `n` waits `backoff_base * 2^n`.
    pub backoff_base: Duration,

    /// Wait applied on HTTP 429 when the response carries no `Retry-After`.
    pub rate_limit_wait: Duration,

    /// Ceiling on any single rate-limit wait, whatever the upstream asks for.
    pub max_rate_limit_wait: Duration,

    /// Per-request timeout handed to the HTTP client.
    pub request_timeout: Duration,

    /// Freshness TTLs per resource family.
    pub ttls: FamilyTtls,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            rate_limit_wait: Duration::from_secs(30),
            max_rate_limit_wait: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            ttls: FamilyTtls::default(),
        }
    }
}

impl ClientConfig {
    /// A config with near-zero waits, for tests.
    #[cfg(test)]
    pub(crate) fn fast() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(1),
            rate_limit_wait: Duration::from_millis(1),
            max_rate_limit_wait: Duration::from_millis(2),
            request_timeout: Duration::from_secs(1),
            ttls: FamilyTtls::default(),
        }
    }
}
