//! Raw response shapes for the CoinGecko-style API.
//!
//! Numeric fields arrive as nullable JSON floats and are converted to
//! `Decimal` during translation into the unified model.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::models::{CoinDetail, CoinMarket, MarketSummary};
use crate::provider::{to_decimal, to_decimal_opt};

/// One row of `/coins/markets`.
#[derive(Debug, Deserialize)]
pub(super) struct RawMarketCoin {
    pub(super) id: String,
    pub(super) symbol: String,
    pub(super) name: String,
    #[serde(default)]
    pub(super) image: Option<String>,
    pub(super) current_price: Option<f64>,
    pub(super) market_cap: Option<f64>,
    pub(super) market_cap_rank: Option<u32>,
    pub(super) total_volume: Option<f64>,
    pub(super) high_24h: Option<f64>,
    pub(super) low_24h: Option<f64>,
    pub(super) price_change_percentage_24h: Option<f64>,
    pub(super) circulating_supply: Option<f64>,
    pub(super) total_supply: Option<f64>,
    pub(super) last_updated: Option<DateTime<Utc>>,
}

impl RawMarketCoin {
    /// Convert into the unified shape. Rows without a price are dropped
    /// by the caller; a listing row with no price is unusable.
    pub(super) fn into_market(self) -> Option<CoinMarket> {
        let current_price = to_decimal_opt(self.current_price)?;

        Some(CoinMarket {
            id: self.id,
            symbol: self.symbol.to_lowercase(),
            name: self.name,
            image: self.image,
            current_price,
            market_cap: to_decimal(self.market_cap),
            market_cap_rank: self.market_cap_rank,
            total_volume: to_decimal(self.total_volume),
            high_24h: to_decimal_opt(self.high_24h),
            low_24h: to_decimal_opt(self.low_24h),
            price_change_percentage_24h: to_decimal(self.price_change_percentage_24h),
            circulating_supply: to_decimal(self.circulating_supply),
            total_supply: to_decimal_opt(self.total_supply),
            last_updated: self.last_updated.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RawDescription {
    #[serde(default)]
    pub(super) en: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawMarketData {
    #[serde(default)]
    pub(super) current_price: HashMap<String, f64>,
    #[serde(default)]
    pub(super) market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub(super) total_volume: HashMap<String, f64>,
    pub(super) price_change_percentage_24h: Option<f64>,
    pub(super) circulating_supply: Option<f64>,
    pub(super) total_supply: Option<f64>,
}

/// Response of `/coins/{id}`.
#[derive(Debug, Deserialize)]
pub(super) struct RawCoinDetail {
    pub(super) id: String,
    pub(super) symbol: String,
    pub(super) name: String,
    #[serde(default)]
    pub(super) description: Option<RawDescription>,
    pub(super) market_cap_rank: Option<u32>,
    #[serde(default)]
    pub(super) market_data: Option<RawMarketData>,
    pub(super) last_updated: Option<DateTime<Utc>>,
}

impl RawCoinDetail {
    pub(super) fn into_detail(self) -> CoinDetail {
        let market = match &self.market_data {
            Some(data) => MarketSummary {
                current_price: to_decimal(data.current_price.get("usd").copied()),
                market_cap: to_decimal(data.market_cap.get("usd").copied()),
                total_volume: to_decimal(data.total_volume.get("usd").copied()),
                price_change_percentage_24h: to_decimal(data.price_change_percentage_24h),
                circulating_supply: to_decimal(data.circulating_supply),
                total_supply: to_decimal_opt(data.total_supply),
            },
            None => MarketSummary {
                current_price: rust_decimal::Decimal::ZERO,
                market_cap: rust_decimal::Decimal::ZERO,
                total_volume: rust_decimal::Decimal::ZERO,
                price_change_percentage_24h: rust_decimal::Decimal::ZERO,
                circulating_supply: rust_decimal::Decimal::ZERO,
                total_supply: None,
            },
        };

        let description = self
            .description
            .and_then(|d| d.en)
            .filter(|text| !text.is_empty());

        CoinDetail {
            id: self.id,
            symbol: self.symbol.to_lowercase(),
            name: self.name,
            description,
            market_cap_rank: self.market_cap_rank,
            market,
            last_updated: self.last_updated.unwrap_or_else(Utc::now),
        }
    }
}

/// Response of `/global` (the payload is nested under `data`).
#[derive(Debug, Deserialize)]
pub(super) struct RawGlobal {
    pub(super) data: RawGlobalData,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawGlobalData {
    pub(super) active_cryptocurrencies: Option<u32>,
    pub(super) markets: Option<u32>,
    #[serde(default)]
    pub(super) total_market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub(super) total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub(super) market_cap_percentage: HashMap<String, f64>,
    pub(super) market_cap_change_percentage_24h_usd: Option<f64>,
    /// Unix seconds
    pub(super) updated_at: Option<i64>,
}

impl RawGlobalData {
    pub(super) fn updated_at_utc(&self) -> DateTime<Utc> {
        self.updated_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now)
    }
}

/// One rate inside `/exchange_rates`.
#[derive(Debug, Deserialize)]
pub(super) struct RawRate {
    pub(super) name: String,
    pub(super) unit: String,
    pub(super) value: Option<f64>,
    #[serde(rename = "type")]
    pub(super) rate_type: Option<String>,
}

/// Response of `/exchange_rates`.
#[derive(Debug, Deserialize)]
pub(super) struct RawExchangeRates {
    #[serde(default)]
    pub(super) rates: HashMap<String, RawRate>,
}

/// Response of `/coins/{id}/market_chart`.
///
/// Series arrive as `[millis, value]` pairs.
#[derive(Debug, Deserialize)]
pub(super) struct RawMarketChart {
    #[serde(default)]
    pub(super) prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub(super) total_volumes: Vec<(f64, f64)>,
}
