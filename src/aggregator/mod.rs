//! Two-provider aggregator: the single entry point consumers use.
//!
//! Every operation tries the primary client first and, only when that
//! client raises a true fault (not mere degradation - the clients absorb
//! upstream unavailability themselves), transparently retries through the
//! secondary. The returned `source` label records which provider and
//! which provenance won.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::errors::MarketDataError;
use crate::models::{
    ChartParams, CoinDetail, CoinMarket, ExchangeRates, GlobalSnapshot, MarketChart,
    MarketsParams, Sourced, UnifiedResult,
};
use crate::provider::coinapi::CoinApiClient;
use crate::provider::coingecko::CoinGeckoClient;
use crate::provider::{MarketDataProvider, ProviderCacheStats};

/// Cache diagnostics across both providers.
#[derive(Clone, Debug, Serialize)]
pub struct AggregateCacheStats {
    /// Per-provider, per-family counters
    pub providers: Vec<ProviderCacheStats>,
    /// Total entries across both providers
    pub total_entries: usize,
    /// Total approximate bytes across both providers
    pub total_bytes: usize,
}

/// Market data aggregator fronting a primary and a secondary provider.
pub struct MarketDataAggregator {
    primary: Arc<dyn MarketDataProvider>,
    secondary: Arc<dyn MarketDataProvider>,
}

impl MarketDataAggregator {
    /// Build an aggregator over two arbitrary providers.
    pub fn new(
        primary: Arc<dyn MarketDataProvider>,
        secondary: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Build the production pairing: CoinGecko primary, CoinAPI secondary.
    pub fn with_default_clients(coingecko_api_key: Option<String>, coinapi_api_key: String) -> Self {
        Self::new(
            Arc::new(CoinGeckoClient::new(coingecko_api_key)),
            Arc::new(CoinApiClient::new(coinapi_api_key)),
        )
    }

    fn label<T>(provider: &dyn MarketDataProvider, sourced: Sourced<T>) -> UnifiedResult<T> {
        UnifiedResult {
            data: sourced.data,
            source: format!("{}-{}", provider.id(), sourced.provenance),
        }
    }

    fn both_failed(
        &self,
        operation: &str,
        primary: MarketDataError,
        secondary: MarketDataError,
    ) -> MarketDataError {
        warn!(
            "{}: both providers failed (primary '{}': {}; secondary '{}': {})",
            operation,
            self.primary.id(),
            primary,
            self.secondary.id(),
            secondary
        );
        MarketDataError::AllSourcesFailed {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    /// Fetch a page of the markets listing.
    pub async fn get_markets(
        &self,
        params: &MarketsParams,
    ) -> Result<UnifiedResult<Vec<CoinMarket>>, MarketDataError> {
        match self.primary.get_markets(params).await {
            Ok(sourced) => Ok(Self::label(self.primary.as_ref(), sourced)),
            Err(primary_err) => {
                debug!(
                    "markets: primary '{}' raised ({}), trying secondary",
                    self.primary.id(),
                    primary_err
                );
                match self.secondary.get_markets(params).await {
                    Ok(sourced) => Ok(Self::label(self.secondary.as_ref(), sourced)),
                    Err(secondary_err) => {
                        Err(self.both_failed("markets", primary_err, secondary_err))
                    }
                }
            }
        }
    }

    /// Fetch detail for one coin.
    pub async fn get_coin_detail(
        &self,
        coin_id: &str,
    ) -> Result<UnifiedResult<CoinDetail>, MarketDataError> {
        match self.primary.get_coin_detail(coin_id).await {
            Ok(sourced) => Ok(Self::label(self.primary.as_ref(), sourced)),
            Err(primary_err) => {
                debug!(
                    "coin detail: primary '{}' raised ({}), trying secondary",
                    self.primary.id(),
                    primary_err
                );
                match self.secondary.get_coin_detail(coin_id).await {
                    Ok(sourced) => Ok(Self::label(self.secondary.as_ref(), sourced)),
                    Err(secondary_err) => {
                        Err(self.both_failed("coin detail", primary_err, secondary_err))
                    }
                }
            }
        }
    }

    /// Fetch the global market aggregate.
    pub async fn get_global(&self) -> Result<UnifiedResult<GlobalSnapshot>, MarketDataError> {
        match self.primary.get_global().await {
            Ok(sourced) => Ok(Self::label(self.primary.as_ref(), sourced)),
            Err(primary_err) => {
                debug!(
                    "global: primary '{}' raised ({}), trying secondary",
                    self.primary.id(),
                    primary_err
                );
                match self.secondary.get_global().await {
                    Ok(sourced) => Ok(Self::label(self.secondary.as_ref(), sourced)),
                    Err(secondary_err) => {
                        Err(self.both_failed("global", primary_err, secondary_err))
                    }
                }
            }
        }
    }

    /// Fetch the BTC-based exchange rate table.
    pub async fn get_exchange_rates(
        &self,
    ) -> Result<UnifiedResult<ExchangeRates>, MarketDataError> {
        match self.primary.get_exchange_rates().await {
            Ok(sourced) => Ok(Self::label(self.primary.as_ref(), sourced)),
            Err(primary_err) => {
                debug!(
                    "exchange rates: primary '{}' raised ({}), trying secondary",
                    self.primary.id(),
                    primary_err
                );
                match self.secondary.get_exchange_rates().await {
                    Ok(sourced) => Ok(Self::label(self.secondary.as_ref(), sourced)),
                    Err(secondary_err) => {
                        Err(self.both_failed("exchange rates", primary_err, secondary_err))
                    }
                }
            }
        }
    }

    /// Fetch a historical price/volume series for one coin.
    pub async fn get_market_chart(
        &self,
        coin_id: &str,
        params: &ChartParams,
    ) -> Result<UnifiedResult<MarketChart>, MarketDataError> {
        match self.primary.get_market_chart(coin_id, params).await {
            Ok(sourced) => Ok(Self::label(self.primary.as_ref(), sourced)),
            Err(primary_err) => {
                debug!(
                    "market chart: primary '{}' raised ({}), trying secondary",
                    self.primary.id(),
                    primary_err
                );
                match self.secondary.get_market_chart(coin_id, params).await {
                    Ok(sourced) => Ok(Self::label(self.secondary.as_ref(), sourced)),
                    Err(secondary_err) => {
                        Err(self.both_failed("market chart", primary_err, secondary_err))
                    }
                }
            }
        }
    }

    /// Clear every cache family on both providers.
    ///
    /// Used after manual data corrections or on operator command; the
    /// next call of any operation performs a live attempt.
    pub fn invalidate_all_caches(&self) {
        self.primary.invalidate_caches();
        self.secondary.invalidate_caches();
        debug!("invalidated all caches on both providers");
    }

    /// Aggregated cache diagnostics across both providers.
    pub fn cache_stats(&self) -> AggregateCacheStats {
        let providers = vec![self.primary.cache_stats(), self.secondary.cache_stats()];
        let total_entries = providers.iter().map(|p| p.entry_count()).sum();
        let total_bytes = providers.iter().map(|p| p.approx_bytes()).sum();

        AggregateCacheStats {
            providers,
            total_entries,
            total_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FamilyStats, Provenance, ResourceFamily};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        id: &'static str,
        should_fail: bool,
        call_count: AtomicUsize,
        invalidations: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, should_fail: bool) -> Self {
            Self {
                id,
                should_fail,
                call_count: AtomicUsize::new(0),
                invalidations: AtomicUsize::new(0),
            }
        }

        fn fail_or<T>(&self, data: T) -> Result<Sourced<T>, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.should_fail {
                Err(MarketDataError::MalformedResponse {
                    provider: self.id.to_string(),
                    message: "mock failure".to_string(),
                })
            } else {
                Ok(Sourced {
                    data,
                    provenance: Provenance::Live,
                })
            }
        }

        fn market_row() -> CoinMarket {
            CoinMarket {
                id: "bitcoin".to_string(),
                symbol: "btc".to_string(),
                name: "Bitcoin".to_string(),
                image: None,
                current_price: dec!(64250),
                market_cap: dec!(1265000000000),
                market_cap_rank: Some(1),
                total_volume: dec!(28400000000),
                high_24h: None,
                low_24h: None,
                price_change_percentage_24h: dec!(0),
                circulating_supply: dec!(0),
                total_supply: None,
                last_updated: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn get_markets(
            &self,
            _params: &MarketsParams,
        ) -> Result<Sourced<Vec<CoinMarket>>, MarketDataError> {
            self.fail_or(vec![Self::market_row()])
        }

        async fn get_coin_detail(
            &self,
            coin_id: &str,
        ) -> Result<Sourced<CoinDetail>, MarketDataError> {
            self.fail_or(CoinDetail {
                id: coin_id.to_string(),
                symbol: coin_id.to_string(),
                name: coin_id.to_string(),
                description: None,
                market_cap_rank: None,
                market: crate::models::MarketSummary {
                    current_price: dec!(1),
                    market_cap: dec!(1),
                    total_volume: dec!(1),
                    price_change_percentage_24h: dec!(0),
                    circulating_supply: dec!(0),
                    total_supply: None,
                },
                last_updated: Utc::now(),
            })
        }

        async fn get_global(&self) -> Result<Sourced<GlobalSnapshot>, MarketDataError> {
            self.fail_or(GlobalSnapshot {
                active_cryptocurrencies: 1,
                markets: 0,
                total_market_cap: BTreeMap::new(),
                total_volume: BTreeMap::new(),
                market_cap_percentage: BTreeMap::new(),
                market_cap_change_percentage_24h_usd: Decimal::ZERO,
                updated_at: Utc::now(),
            })
        }

        async fn get_exchange_rates(&self) -> Result<Sourced<ExchangeRates>, MarketDataError> {
            self.fail_or(ExchangeRates {
                rates: BTreeMap::new(),
            })
        }

        async fn get_market_chart(
            &self,
            _coin_id: &str,
            _params: &ChartParams,
        ) -> Result<Sourced<MarketChart>, MarketDataError> {
            self.fail_or(MarketChart {
                prices: Vec::new(),
                total_volumes: Vec::new(),
            })
        }

        fn invalidate_caches(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }

        fn cache_stats(&self) -> ProviderCacheStats {
            ProviderCacheStats {
                provider: self.id.to_string(),
                families: vec![FamilyStats {
                    family: ResourceFamily::Markets,
                    entry_count: 2,
                    approx_bytes: 128,
                    keys: vec!["markets?page=1".to_string(), "markets?page=2".to_string()],
                }],
            }
        }
    }

    fn aggregator(
        primary_fails: bool,
        secondary_fails: bool,
    ) -> (MarketDataAggregator, Arc<MockProvider>, Arc<MockProvider>) {
        let primary = Arc::new(MockProvider::new("mock-a", primary_fails));
        let secondary = Arc::new(MockProvider::new("mock-b", secondary_fails));
        let aggregator = MarketDataAggregator::new(
            Arc::clone(&primary) as Arc<dyn MarketDataProvider>,
            Arc::clone(&secondary) as Arc<dyn MarketDataProvider>,
        );
        (aggregator, primary, secondary)
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (aggregator, primary, secondary) = aggregator(false, false);

        let result = aggregator.get_markets(&MarketsParams::default()).await.unwrap();

        assert_eq!(result.source, "mock-a-live");
        assert_eq!(primary.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failover_labels_source_with_secondary_prefix() {
        let (aggregator, primary, secondary) = aggregator(true, false);

        let result = aggregator.get_markets(&MarketsParams::default()).await.unwrap();

        assert!(result.source.starts_with("mock-b-"));
        assert_eq!(result.source, "mock-b-live");
        // The translated payload keeps the primary's field contract.
        assert_eq!(result.data[0].id, "bitcoin");
        assert_eq!(result.data[0].price_change_percentage_24h, dec!(0));
        assert_eq!(primary.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_total_failure_propagates_single_aggregate_error() {
        let (aggregator, _, _) = aggregator(true, true);

        let result = aggregator.get_markets(&MarketsParams::default()).await;

        match result {
            Err(MarketDataError::AllSourcesFailed { primary, secondary }) => {
                assert!(primary.contains("mock-a"));
                assert!(secondary.contains("mock-b"));
            }
            other => panic!("expected AllSourcesFailed, got {:?}", other.map(|r| r.source)),
        }
    }

    #[tokio::test]
    async fn test_every_operation_fails_over() {
        let (aggregator, _, _) = aggregator(true, false);

        assert_eq!(
            aggregator.get_coin_detail("bitcoin").await.unwrap().source,
            "mock-b-live"
        );
        assert_eq!(aggregator.get_global().await.unwrap().source, "mock-b-live");
        assert_eq!(
            aggregator.get_exchange_rates().await.unwrap().source,
            "mock-b-live"
        );
        assert_eq!(
            aggregator
                .get_market_chart("bitcoin", &ChartParams::default())
                .await
                .unwrap()
                .source,
            "mock-b-live"
        );
    }

    #[tokio::test]
    async fn test_invalidate_all_reaches_both_providers() {
        let (aggregator, primary, secondary) = aggregator(false, false);

        aggregator.invalidate_all_caches();

        assert_eq!(primary.invalidations.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_stats_aggregate_both_providers() {
        let (aggregator, _, _) = aggregator(false, false);

        let stats = aggregator.cache_stats();

        assert_eq!(stats.providers.len(), 2);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.total_bytes, 256);
        assert_eq!(stats.providers[0].provider, "mock-a");
        assert_eq!(stats.providers[1].provider, "mock-b");
    }
}
