//! CoinGecko-style market data client (primary provider).
//!
//! Endpoints used:
//! - `/coins/markets` for the paged listing
//! - `/coins/{id}` for per-coin detail
//! - `/global` for the market-wide aggregate
//! - `/exchange_rates` for the BTC-based rate table
//! - `/coins/{id}/market_chart` for historical series
//!
//! The free tier is aggressively rate limited (HTTP 429 with an optional
//! `Retry-After`); an API key raises the quota but is not required.

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use crate::cache::{cache_key, FamilyCache, ResourceFamily};
use crate::config::ClientConfig;
use crate::errors::{LiveError, MarketDataError, UpstreamError};
use crate::fallback;
use crate::models::{
    ChartParams, ChartPoint, CoinDetail, CoinMarket, ExchangeRates, GlobalSnapshot, MarketChart,
    MarketsParams, RateInfo, Sourced,
};
use crate::provider::{
    cached_fetch, encode_query, fetch_with_retry, to_decimal, validate_coin_id, HttpTransport,
    MarketDataProvider, ProviderCacheStats, ReqwestTransport,
};

use models::{RawCoinDetail, RawExchangeRates, RawGlobal, RawMarketChart, RawMarketCoin};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "coingecko";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko-style client with per-family caching and degradation.
pub struct CoinGeckoClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: Option<String>,
    config: ClientConfig,
    markets: FamilyCache<Vec<CoinMarket>>,
    details: FamilyCache<CoinDetail>,
    global: FamilyCache<GlobalSnapshot>,
    rates: FamilyCache<ExchangeRates>,
    charts: FamilyCache<MarketChart>,
}

impl CoinGeckoClient {
    /// Create a client with default configuration.
    ///
    /// The API key is optional; without one the upstream applies its
    /// public-tier rate limits.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_config(api_key, ClientConfig::default())
    }

    /// Create a client with a custom degradation policy.
    pub fn with_config(api_key: Option<String>, config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout));
        Self::with_transport(transport, api_key, config)
    }

    /// Create a client over an injected transport.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        api_key: Option<String>,
        config: ClientConfig,
    ) -> Self {
        Self {
            markets: FamilyCache::new(ResourceFamily::Markets, config.ttls.markets),
            details: FamilyCache::new(ResourceFamily::CoinDetail, config.ttls.coin_detail),
            global: FamilyCache::new(ResourceFamily::Global, config.ttls.global),
            rates: FamilyCache::new(ResourceFamily::ExchangeRates, config.ttls.exchange_rates),
            charts: FamilyCache::new(ResourceFamily::Chart, config.ttls.chart),
            transport,
            base_url: BASE_URL.to_string(),
            api_key,
            config,
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.api_key {
            Some(key) => vec![(API_KEY_HEADER.to_string(), key.clone())],
            None => Vec::new(),
        }
    }

    async fn fetch_body(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, encode_query(query))
        };

        debug!("coingecko request: {}", path);
        fetch_with_retry(
            self.transport.as_ref(),
            &self.config,
            PROVIDER_ID,
            &url,
            &self.headers(),
        )
        .await
    }

    fn parse_fault(message: String) -> LiveError {
        LiveError::Fault(MarketDataError::MalformedResponse {
            provider: PROVIDER_ID.to_string(),
            message,
        })
    }

    async fn fetch_markets_live(
        &self,
        params: &MarketsParams,
    ) -> Result<Vec<CoinMarket>, LiveError> {
        let body = self.fetch_body("/coins/markets", &params.to_pairs()).await?;

        let raw: Vec<RawMarketCoin> = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("markets listing: {}", e)))?;

        let coins = raw
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                let market = row.into_market();
                if market.is_none() {
                    warn!("coingecko: dropping market row '{}' without a price", id);
                }
                market
            })
            .collect();

        Ok(coins)
    }

    async fn fetch_detail_live(&self, coin_id: &str) -> Result<CoinDetail, LiveError> {
        let path = format!("/coins/{}", urlencoding::encode(coin_id));
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
        ];
        let body = self.fetch_body(&path, &query).await?;

        let raw: RawCoinDetail = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("coin detail '{}': {}", coin_id, e)))?;

        Ok(raw.into_detail())
    }

    async fn fetch_global_live(&self) -> Result<GlobalSnapshot, LiveError> {
        let body = self.fetch_body("/global", &[]).await?;

        let raw: RawGlobal = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("global data: {}", e)))?;
        let data = raw.data;

        Ok(GlobalSnapshot {
            active_cryptocurrencies: data.active_cryptocurrencies.unwrap_or(0),
            markets: data.markets.unwrap_or(0),
            total_market_cap: decimal_map(&data.total_market_cap),
            total_volume: decimal_map(&data.total_volume),
            market_cap_percentage: decimal_map(&data.market_cap_percentage),
            market_cap_change_percentage_24h_usd: to_decimal(
                data.market_cap_change_percentage_24h_usd,
            ),
            updated_at: data.updated_at_utc(),
        })
    }

    async fn fetch_rates_live(&self) -> Result<ExchangeRates, LiveError> {
        let body = self.fetch_body("/exchange_rates", &[]).await?;

        let raw: RawExchangeRates = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("exchange rates: {}", e)))?;

        let rates = raw
            .rates
            .into_iter()
            .map(|(code, rate)| {
                (
                    code.to_lowercase(),
                    RateInfo {
                        name: rate.name,
                        unit: rate.unit,
                        value: to_decimal(rate.value),
                        rate_type: rate.rate_type.unwrap_or_else(|| "unknown".to_string()),
                    },
                )
            })
            .collect();

        Ok(ExchangeRates { rates })
    }

    async fn fetch_chart_live(
        &self,
        coin_id: &str,
        params: &ChartParams,
    ) -> Result<MarketChart, LiveError> {
        let path = format!("/coins/{}/market_chart", urlencoding::encode(coin_id));
        let body = self.fetch_body(&path, &params.to_pairs()).await?;

        let raw: RawMarketChart = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("market chart '{}': {}", coin_id, e)))?;

        Ok(MarketChart {
            prices: chart_points(&raw.prices),
            total_volumes: chart_points(&raw.total_volumes),
        })
    }
}

// ============================================================================
// Conversion Helpers
// ============================================================================

/// Convert `[millis, value]` pairs into ordered chart points.
///
/// Points with out-of-range timestamps or non-finite values are dropped
/// rather than failing the whole series.
fn chart_points(pairs: &[(f64, f64)]) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = pairs
        .iter()
        .filter_map(|(millis, value)| {
            let timestamp = Utc.timestamp_millis_opt(*millis as i64).single()?;
            let value = to_decimal(Some(*value));
            Some(ChartPoint { timestamp, value })
        })
        .collect();

    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    points
}

fn decimal_map(
    raw: &std::collections::HashMap<String, f64>,
) -> std::collections::BTreeMap<String, rust_decimal::Decimal> {
    raw.iter()
        .map(|(code, value)| (code.to_lowercase(), to_decimal(Some(*value))))
        .collect()
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_markets(
        &self,
        params: &MarketsParams,
    ) -> Result<Sourced<Vec<CoinMarket>>, MarketDataError> {
        params.validate()?;
        let key = cache_key(ResourceFamily::Markets, &params.to_pairs());

        cached_fetch(
            PROVIDER_ID,
            &self.markets,
            &key,
            self.fetch_markets_live(params),
            || fallback::markets(params),
        )
        .await
    }

    async fn get_coin_detail(&self, coin_id: &str) -> Result<Sourced<CoinDetail>, MarketDataError> {
        let coin_id = validate_coin_id(coin_id)?;
        let key = cache_key(ResourceFamily::CoinDetail, &[("id", coin_id.clone())]);

        cached_fetch(
            PROVIDER_ID,
            &self.details,
            &key,
            self.fetch_detail_live(&coin_id),
            || fallback::coin_detail(&coin_id),
        )
        .await
    }

    async fn get_global(&self) -> Result<Sourced<GlobalSnapshot>, MarketDataError> {
        let key = cache_key(ResourceFamily::Global, &[]);

        cached_fetch(
            PROVIDER_ID,
            &self.global,
            &key,
            self.fetch_global_live(),
            fallback::global,
        )
        .await
    }

    async fn get_exchange_rates(&self) -> Result<Sourced<ExchangeRates>, MarketDataError> {
        let key = cache_key(ResourceFamily::ExchangeRates, &[]);

        cached_fetch(
            PROVIDER_ID,
            &self.rates,
            &key,
            self.fetch_rates_live(),
            fallback::exchange_rates,
        )
        .await
    }

    async fn get_market_chart(
        &self,
        coin_id: &str,
        params: &ChartParams,
    ) -> Result<Sourced<MarketChart>, MarketDataError> {
        let coin_id = validate_coin_id(coin_id)?;
        params.validate()?;

        let mut pairs = params.to_pairs();
        pairs.push(("id", coin_id.clone()));
        let key = cache_key(ResourceFamily::Chart, &pairs);

        cached_fetch(
            PROVIDER_ID,
            &self.charts,
            &key,
            self.fetch_chart_live(&coin_id, params),
            || fallback::chart(&coin_id, params),
        )
        .await
    }

    fn invalidate_caches(&self) {
        self.markets.invalidate_all();
        self.details.invalidate_all();
        self.global.invalidate_all();
        self.rates.invalidate_all();
        self.charts.invalidate_all();
    }

    fn cache_stats(&self) -> ProviderCacheStats {
        ProviderCacheStats {
            provider: PROVIDER_ID.to_string(),
            families: vec![
                self.markets.stats(),
                self.details.stats(),
                self.global.stats(),
                self.rates.stats(),
                self.charts.stats(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Provenance;
    use crate::provider::test_support::ScriptedTransport;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const MARKETS_JSON: &str = r#"[
        {
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 64250.12,
            "market_cap": 1265000000000,
            "market_cap_rank": 1,
            "total_volume": 28400000000,
            "high_24h": 65100.0,
            "low_24h": 63200.0,
            "price_change_percentage_24h": -1.42,
            "circulating_supply": 19700000.0,
            "total_supply": 21000000.0,
            "last_updated": "2024-06-01T12:00:00.000Z"
        },
        {
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "image": null,
            "current_price": 3150.25,
            "market_cap": 378000000000,
            "market_cap_rank": 2,
            "total_volume": 14200000000,
            "high_24h": null,
            "low_24h": null,
            "price_change_percentage_24h": 2.15,
            "circulating_supply": 120200000.0,
            "total_supply": null,
            "last_updated": "2024-06-01T12:00:00.000Z"
        }
    ]"#;

    fn client_with(transport: ScriptedTransport) -> (CoinGeckoClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = CoinGeckoClient::with_transport(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            None,
            ClientConfig::fast(),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn test_live_fetch_then_cache_hit() {
        let (client, transport) = client_with(ScriptedTransport::new().ok(MARKETS_JSON));
        let params = MarketsParams::default();

        let first = client.get_markets(&params).await.unwrap();
        assert_eq!(first.provenance, Provenance::Live);
        assert_eq!(first.data.len(), 2);
        assert_eq!(first.data[0].current_price, dec!(64250.12));
        assert_eq!(transport.calls(), 1);

        let second = client.get_markets(&params).await.unwrap();
        assert_eq!(second.provenance, Provenance::Cache);
        assert_eq!(second.data, first.data);
        // Fresh hit issued no further network calls.
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_never_throws_when_upstream_is_down() {
        let (client, transport) = client_with(ScriptedTransport::failing());
        let params = MarketsParams::default();

        let result = client.get_markets(&params).await.unwrap();
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(!result.data.is_empty());
        assert_eq!(transport.calls(), client.config.max_retries as usize);
    }

    #[tokio::test]
    async fn test_never_throws_across_status_timeout_and_429() {
        let (client, transport) = client_with(
            ScriptedTransport::new()
                .status(500, None)
                .timeout()
                .status(429, Some(0)),
        );

        let result = client.get_global().await.unwrap();
        assert_eq!(result.provenance, Provenance::Fallback);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_fallback_seeds_the_cache() {
        let (client, transport) = client_with(ScriptedTransport::failing());
        let params = MarketsParams::default();

        let first = client.get_markets(&params).await.unwrap();
        assert_eq!(first.provenance, Provenance::Fallback);
        let calls_after_first = transport.calls();

        // Second call inside the TTL window: served from the seeded
        // entry, still labeled fallback, zero additional upstream calls.
        let second = client.get_markets(&params).await.unwrap();
        assert_eq!(second.provenance, Provenance::Fallback);
        assert_eq!(second.data, first.data);
        assert_eq!(transport.calls(), calls_after_first);
    }

    #[tokio::test]
    async fn test_stale_cache_beats_synthetic_fallback() {
        let transport = Arc::new(ScriptedTransport::new().ok(MARKETS_JSON));
        let mut config = ClientConfig::fast();
        config.ttls.markets = Duration::ZERO; // every entry is immediately stale
        let client = CoinGeckoClient::with_transport(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            None,
            config,
        );
        let params = MarketsParams::default();

        let first = client.get_markets(&params).await.unwrap();
        assert_eq!(first.provenance, Provenance::Live);

        // Script exhausted: the live re-fetch fails, the stale entry wins.
        let second = client.get_markets(&params).await.unwrap();
        assert_eq!(second.provenance, Provenance::Fallback);
        assert_eq!(second.data, first.data);
    }

    #[tokio::test]
    async fn test_invalidation_forces_live_attempt() {
        let (client, transport) =
            client_with(ScriptedTransport::new().ok(MARKETS_JSON).ok(MARKETS_JSON));
        let params = MarketsParams::default();

        client.get_markets(&params).await.unwrap();
        assert_eq!(transport.calls(), 1);

        client.invalidate_caches();
        assert_eq!(client.cache_stats().entry_count(), 0);

        let result = client.get_markets(&params).await.unwrap();
        assert_eq!(result.provenance, Provenance::Live);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_propagates() {
        let (client, _transport) = client_with(ScriptedTransport::new().ok("not json"));

        let result = client.get_markets(&MarketsParams::default()).await;
        assert!(matches!(
            result,
            Err(MarketDataError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_params_raise_before_any_network() {
        let (client, transport) = client_with(ScriptedTransport::failing());

        let params = MarketsParams {
            per_page: 0,
            ..Default::default()
        };
        assert!(matches!(
            client.get_markets(&params).await,
            Err(MarketDataError::InvalidParams(_))
        ));
        assert!(matches!(
            client.get_coin_detail("  ").await,
            Err(MarketDataError::InvalidParams(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_stats_reflect_activity() {
        let (client, _transport) = client_with(ScriptedTransport::new().ok(MARKETS_JSON));

        client.get_markets(&MarketsParams::default()).await.unwrap();

        let stats = client.cache_stats();
        assert_eq!(stats.provider, "coingecko");
        assert_eq!(stats.families.len(), 5);
        assert_eq!(stats.entry_count(), 1);
        assert!(stats.approx_bytes() > 0);

        let markets_stats = &stats.families[0];
        assert_eq!(markets_stats.family, ResourceFamily::Markets);
        assert!(markets_stats.keys[0].starts_with("markets?"));
    }
}
