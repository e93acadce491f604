//! Upstream client contract and shared degradation pipeline.
//!
//! Both providers implement [`MarketDataProvider`] and run every family
//! operation through [`cached_fetch`]: fresh cache first, then a live
//! attempt with bounded retries, then stale cache, then synthetic seed
//! data. Operational upstream failure never escapes a client.

pub mod coinapi;
pub mod coingecko;
mod fetch;
pub mod transport;

pub(crate) use fetch::{encode_query, fetch_with_retry};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

use std::future::Future;

use async_trait::async_trait;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::cache::{FamilyCache, FamilyStats, Provenance};
use crate::errors::{LiveError, MarketDataError};
use crate::models::{
    ChartParams, CoinDetail, CoinMarket, ExchangeRates, GlobalSnapshot, MarketChart,
    MarketsParams, Sourced,
};

/// Normalize and validate a caller-supplied coin id.
pub(crate) fn validate_coin_id(coin_id: &str) -> Result<String, MarketDataError> {
    let normalized = coin_id.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(MarketDataError::InvalidParams(
            "coin id must not be empty".to_string(),
        ));
    }
    Ok(normalized)
}

/// Convert a nullable upstream float, zero-filling absence.
pub(crate) fn to_decimal(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
}

/// Convert a nullable upstream float, preserving absence.
pub(crate) fn to_decimal_opt(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

/// Cache diagnostics for one provider, one entry per resource family.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderCacheStats {
    /// Provider id
    pub provider: String,
    /// Per-family counters
    pub families: Vec<FamilyStats>,
}

impl ProviderCacheStats {
    /// Total entries across all families.
    pub fn entry_count(&self) -> usize {
        self.families.iter().map(|f| f.entry_count).sum()
    }

    /// Total approximate bytes across all families.
    pub fn approx_bytes(&self) -> usize {
        self.families.iter().map(|f| f.approx_bytes).sum()
    }
}

/// A market data provider.
///
/// One implementation per upstream. Every fetch operation resolves to
/// *some* payload (live, cached, or synthetic) under upstream
/// unavailability; the `Err` channel carries only defects - malformed
/// responses and invalid parameters.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier, used as the `source` label prefix.
    fn id(&self) -> &'static str;

    /// Fetch a page of the markets listing.
    async fn get_markets(
        &self,
        params: &MarketsParams,
    ) -> Result<Sourced<Vec<CoinMarket>>, MarketDataError>;

    /// Fetch detail for one coin.
    async fn get_coin_detail(&self, coin_id: &str) -> Result<Sourced<CoinDetail>, MarketDataError>;

    /// Fetch the global market aggregate.
    async fn get_global(&self) -> Result<Sourced<GlobalSnapshot>, MarketDataError>;

    /// Fetch the BTC-based exchange rate table.
    async fn get_exchange_rates(&self) -> Result<Sourced<ExchangeRates>, MarketDataError>;

    /// Fetch a historical price/volume series for one coin.
    async fn get_market_chart(
        &self,
        coin_id: &str,
        params: &ChartParams,
    ) -> Result<Sourced<MarketChart>, MarketDataError>;

    /// Drop every cache entry in every family.
    fn invalidate_caches(&self);

    /// Cache diagnostics across all families.
    fn cache_stats(&self) -> ProviderCacheStats;
}

/// Resolve one family operation through the degradation pipeline.
///
/// 1. A fresh cache entry is returned immediately, with no network I/O.
///    Entries seeded from synthetic data keep their `fallback` label on
///    cache hits so observability never mistakes them for real data.
/// 2. Otherwise the `live` future runs (with its own bounded retries).
/// 3. On operational failure, any cache entry - even stale - beats an
///    error; with no entry at all, `seed` synthesizes one and the cache is
///    primed with it so calls inside the TTL window skip the network.
///
/// Only a [`LiveError::Fault`] (parse defect) propagates.
pub(crate) async fn cached_fetch<T, Fut>(
    provider: &'static str,
    cache: &FamilyCache<T>,
    key: &str,
    live: Fut,
    seed: impl FnOnce() -> T,
) -> Result<Sourced<T>, MarketDataError>
where
    T: Clone + Serialize,
    Fut: Future<Output = Result<T, LiveError>>,
{
    if let Some(entry) = cache.get(key) {
        if cache.is_fresh(&entry) {
            let provenance = match entry.provenance {
                Provenance::Fallback => Provenance::Fallback,
                _ => Provenance::Cache,
            };
            return Ok(Sourced {
                data: entry.data,
                provenance,
            });
        }
    }

    match live.await {
        Ok(data) => {
            cache.put(key, data.clone(), Provenance::Live);
            Ok(Sourced {
                data,
                provenance: Provenance::Live,
            })
        }
        Err(LiveError::Fault(error)) => Err(error),
        Err(LiveError::Upstream(error)) => {
            if let Some(entry) = cache.get(key) {
                warn!(
                    "{}: {} unavailable ({}), serving stale cache for '{}'",
                    provider,
                    cache.family(),
                    error,
                    key
                );
                return Ok(Sourced {
                    data: entry.data,
                    provenance: Provenance::Fallback,
                });
            }

            warn!(
                "{}: {} unavailable ({}) with no cache for '{}', serving seed data",
                provider,
                cache.family(),
                error,
                key
            );
            let data = seed();
            cache.put(key, data.clone(), Provenance::Fallback);
            Ok(Sourced {
                data,
                provenance: Provenance::Fallback,
            })
        }
    }
}
