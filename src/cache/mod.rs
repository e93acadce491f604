//! Per-family, per-client in-memory caching.
//!
//! Each upstream client owns one [`FamilyCache`] per [`ResourceFamily`].
//! Families do not share entries and each carries its own TTL, chosen by
//! volatility (short for per-coin detail and chart series, longer for
//! global aggregates and exchange rates).
//!
//! Entries are only replaced by a call that actually reached the live
//! upstream, or removed by explicit invalidation. There is no size or LRU
//! eviction: the key space is bounded by the small set of parameter
//! combinations the consuming UI actually requests.

mod key;
mod store;

pub use key::cache_key;
pub use store::{CacheEntry, FamilyCache, FamilyStats};

use std::fmt;

use serde::Serialize;

/// The distinct categories of data fetched from an upstream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    /// Paged market listing (`/coins/markets` and its translation)
    Markets,
    /// Per-coin detail
    CoinDetail,
    /// Global market aggregate
    Global,
    /// BTC-based exchange rate table
    ExchangeRates,
    /// Historical price/volume series
    Chart,
}

impl ResourceFamily {
    /// All families, in cache-stats reporting order.
    pub const ALL: [ResourceFamily; 5] = [
        ResourceFamily::Markets,
        ResourceFamily::CoinDetail,
        ResourceFamily::Global,
        ResourceFamily::ExchangeRates,
        ResourceFamily::Chart,
    ];

    /// Stable string form, used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markets => "markets",
            Self::CoinDetail => "coin_detail",
            Self::Global => "global",
            Self::ExchangeRates => "exchange_rates",
            Self::Chart => "chart",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a returned value was ultimately produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Fetched from the live upstream on this call
    Live,
    /// Served from a fresh cache entry
    Cache,
    /// Stale cache entry or synthetic seed data
    Fallback,
}

impl Provenance {
    /// Stable string form, used as the `source` label suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
