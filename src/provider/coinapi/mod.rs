//! CoinAPI-style market data client (secondary provider).
//!
//! Endpoints used:
//! - `/v1/assets` for the listing and the synthesized global aggregate
//! - `/v1/assets/{id}` for per-coin detail
//! - `/v1/exchangerate/BTC` for the rate table
//! - `/v1/ohlcv/{id}/{quote}/latest` for historical series
//!
//! An API key is required. The native schema differs from the primary
//! provider's; every operation translates into the unified shape so the
//! aggregator can substitute this client transparently. Prices are
//! USD-denominated - the upstream quotes assets in USD only.
//!
//! The upstream reports no market capitalization; the 1-day USD volume
//! serves as the ranking estimate and fills `market_cap`. Fields it
//! cannot supply at all (24h change, supply figures, image) are
//! zero-filled or `None`, keeping the listing shape stable.

mod models;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use tracing::debug;

use crate::cache::{cache_key, FamilyCache, ResourceFamily};
use crate::config::ClientConfig;
use crate::errors::{LiveError, MarketDataError, UpstreamError};
use crate::fallback;
use crate::models::{
    ChartParams, ChartPoint, CoinDetail, CoinMarket, ExchangeRates, GlobalSnapshot, MarketChart,
    MarketSummary, MarketsParams, RateInfo, Sourced,
};
use crate::provider::{
    cached_fetch, encode_query, fetch_with_retry, to_decimal, validate_coin_id, HttpTransport,
    MarketDataProvider, ProviderCacheStats, ReqwestTransport,
};

use models::{RawAsset, RawExchangeRateTable, RawOhlcvBar};

const BASE_URL: &str = "https://rest.coinapi.io";
const PROVIDER_ID: &str = "coinapi";
const API_KEY_HEADER: &str = "X-CoinAPI-Key";

lazy_static! {
    /// Canonical-id to native-asset-id mapping for the coins the
    /// consuming UI actually tracks. Unlisted ids fall back to their
    /// uppercased form.
    static ref ASSET_IDS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("bitcoin", "BTC");
        map.insert("ethereum", "ETH");
        map.insert("tether", "USDT");
        map.insert("binancecoin", "BNB");
        map.insert("solana", "SOL");
        map.insert("ripple", "XRP");
        map.insert("usd-coin", "USDC");
        map.insert("dogecoin", "DOGE");
        map.insert("cardano", "ADA");
        map.insert("tron", "TRX");
        map
    };
}

fn native_asset_id(coin_id: &str) -> String {
    ASSET_IDS
        .get(coin_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| coin_id.to_uppercase())
}

/// CoinAPI-style client with per-family caching, degradation, and schema
/// translation.
pub struct CoinApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    config: ClientConfig,
    markets: FamilyCache<Vec<CoinMarket>>,
    details: FamilyCache<CoinDetail>,
    global: FamilyCache<GlobalSnapshot>,
    rates: FamilyCache<ExchangeRates>,
    charts: FamilyCache<MarketChart>,
}

impl CoinApiClient {
    /// Create a client with default configuration.
    pub fn new(api_key: String) -> Self {
        Self::with_config(api_key, ClientConfig::default())
    }

    /// Create a client with a custom degradation policy.
    pub fn with_config(api_key: String, config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout));
        Self::with_transport(transport, api_key, config)
    }

    /// Create a client over an injected transport.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        api_key: String,
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
        vec![(API_KEY_HEADER.to_string(), self.api_key.clone())]
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

        debug!("coinapi request: {}", path);
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

    async fn fetch_assets_live(&self) -> Result<Vec<RawAsset>, LiveError> {
        let body = self.fetch_body("/v1/assets", &[]).await?;

        serde_json::from_str(&body).map_err(|e| Self::parse_fault(format!("assets listing: {}", e)))
    }

    async fn fetch_markets_live(
        &self,
        params: &MarketsParams,
    ) -> Result<Vec<CoinMarket>, LiveError> {
        let assets = self.fetch_assets_live().await?;
        Ok(translate_assets(assets, params))
    }

    async fn fetch_detail_live(&self, coin_id: &str) -> Result<CoinDetail, LiveError> {
        let asset_id = native_asset_id(coin_id);
        let path = format!("/v1/assets/{}", urlencoding::encode(&asset_id));
        let body = self.fetch_body(&path, &[]).await?;

        let assets: Vec<RawAsset> = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("asset detail '{}': {}", coin_id, e)))?;

        let asset = assets.into_iter().next().ok_or_else(|| {
            Self::parse_fault(format!("asset detail '{}': empty response", coin_id))
        })?;

        Ok(translate_detail(coin_id, asset))
    }

    async fn fetch_global_live(&self) -> Result<GlobalSnapshot, LiveError> {
        let assets = self.fetch_assets_live().await?;
        Ok(translate_global(assets))
    }

    async fn fetch_rates_live(&self) -> Result<ExchangeRates, LiveError> {
        let body = self.fetch_body("/v1/exchangerate/BTC", &[]).await?;

        let table: RawExchangeRateTable = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("exchange rates: {}", e)))?;

        Ok(translate_rates(table))
    }

    async fn fetch_chart_live(
        &self,
        coin_id: &str,
        params: &ChartParams,
    ) -> Result<MarketChart, LiveError> {
        let asset_id = native_asset_id(coin_id);
        let quote = params.vs_currency.to_uppercase();
        let path = format!(
            "/v1/ohlcv/{}/{}/latest",
            urlencoding::encode(&asset_id),
            urlencoding::encode(&quote)
        );
        let query = [
            ("period_id", "1DAY".to_string()),
            ("limit", params.days.to_string()),
        ];
        let body = self.fetch_body(&path, &query).await?;

        let bars: Vec<RawOhlcvBar> = serde_json::from_str(&body)
            .map_err(|e| Self::parse_fault(format!("ohlcv '{}': {}", coin_id, e)))?;

        Ok(translate_chart(bars))
    }
}

// ============================================================================
// Schema Translation
// ============================================================================

/// Translate the native asset listing into the unified markets contract.
///
/// Assets the upstream marks non-crypto or without a USD price are
/// excluded. The remainder is sorted descending by the market-cap
/// estimate (ties broken by asset id for a stable order), ranked, then
/// sliced by `page`/`per_page` exactly like the primary provider's
/// listing.
fn translate_assets(assets: Vec<RawAsset>, params: &MarketsParams) -> Vec<CoinMarket> {
    let mut priced: Vec<(Decimal, RawAsset)> = assets
        .into_iter()
        .filter(|asset| asset.is_crypto() && asset.price_usd.is_some())
        .map(|asset| (to_decimal(asset.volume_1day_usd), asset))
        .collect();

    priced.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.asset_id.cmp(&b.1.asset_id)));

    let per_page = params.per_page as usize;
    let start = (params.page as usize - 1) * per_page;

    priced
        .into_iter()
        .enumerate()
        .skip(start)
        .take(per_page)
        .map(|(index, (estimate, asset))| asset_to_market(asset, estimate, index as u32 + 1))
        .collect()
}

fn asset_to_market(asset: RawAsset, estimate: Decimal, rank: u32) -> CoinMarket {
    let symbol = asset.asset_id.to_lowercase();

    CoinMarket {
        id: symbol.clone(),
        symbol: symbol.clone(),
        name: asset.name.unwrap_or(asset.asset_id),
        image: None,
        current_price: to_decimal(asset.price_usd),
        market_cap: estimate,
        market_cap_rank: Some(rank),
        total_volume: to_decimal(asset.volume_1day_usd),
        high_24h: None,
        low_24h: None,
        price_change_percentage_24h: Decimal::ZERO,
        circulating_supply: Decimal::ZERO,
        total_supply: None,
        last_updated: Utc::now(),
    }
}

fn translate_detail(coin_id: &str, asset: RawAsset) -> CoinDetail {
    let volume = to_decimal(asset.volume_1day_usd);

    CoinDetail {
        id: coin_id.to_string(),
        symbol: asset.asset_id.to_lowercase(),
        name: asset.name.unwrap_or_else(|| asset.asset_id.clone()),
        description: None,
        market_cap_rank: None,
        market: MarketSummary {
            current_price: to_decimal(asset.price_usd),
            market_cap: volume,
            total_volume: volume,
            price_change_percentage_24h: Decimal::ZERO,
            circulating_supply: Decimal::ZERO,
            total_supply: None,
        },
        last_updated: Utc::now(),
    }
}

fn translate_global(assets: Vec<RawAsset>) -> GlobalSnapshot {
    let mut estimates: Vec<(Decimal, String)> = assets
        .iter()
        .filter(|asset| asset.is_crypto() && asset.price_usd.is_some())
        .map(|asset| {
            (
                to_decimal(asset.volume_1day_usd),
                asset.asset_id.to_lowercase(),
            )
        })
        .collect();
    estimates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    // The estimate is the 1-day volume, so the cap and volume totals
    // coincide by construction.
    let total: Decimal = estimates.iter().map(|(estimate, _)| *estimate).sum();
    let active = estimates.len() as u32;

    let hundred = Decimal::new(100, 0);
    let mut dominance = BTreeMap::new();
    if total > Decimal::ZERO {
        for (estimate, symbol) in estimates.iter().take(2) {
            dominance.insert(symbol.clone(), (*estimate * hundred / total).round_dp(2));
        }
    }

    let mut total_market_cap = BTreeMap::new();
    total_market_cap.insert("usd".to_string(), total);
    let mut total_volume = BTreeMap::new();
    total_volume.insert("usd".to_string(), total);

    GlobalSnapshot {
        active_cryptocurrencies: active,
        markets: 0,
        total_market_cap,
        total_volume,
        market_cap_percentage: dominance,
        market_cap_change_percentage_24h_usd: Decimal::ZERO,
        updated_at: Utc::now(),
    }
}

fn translate_rates(table: RawExchangeRateTable) -> ExchangeRates {
    let rates = table
        .rates
        .into_iter()
        .map(|row| {
            let code = row.asset_id_quote.to_lowercase();
            (
                code.clone(),
                RateInfo {
                    name: row.asset_id_quote,
                    unit: code,
                    value: to_decimal(row.rate),
                    rate_type: "unknown".to_string(),
                },
            )
        })
        .collect();

    ExchangeRates { rates }
}

fn translate_chart(bars: Vec<RawOhlcvBar>) -> MarketChart {
    let mut prices = Vec::with_capacity(bars.len());
    let mut volumes = Vec::with_capacity(bars.len());

    for bar in bars {
        let timestamp = match bar.time_period_start {
            Some(start) => start,
            None => continue,
        };
        let close = match bar.price_close {
            Some(close) => close,
            None => continue,
        };

        prices.push(ChartPoint {
            timestamp,
            value: to_decimal(Some(close)),
        });
        volumes.push(ChartPoint {
            timestamp,
            value: to_decimal(bar.volume_traded),
        });
    }

    prices.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    volumes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    MarketChart {
        prices,
        total_volumes: volumes,
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for CoinApiClient {
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
