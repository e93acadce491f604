//! Raw response shapes for the CoinAPI-style API.
//!
//! Field names and units differ from the primary provider; translation
//! into the unified model happens in the parent module.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One asset from `/v1/assets` (also returned, singly, by
/// `/v1/assets/{id}`).
#[derive(Debug, Deserialize)]
pub(super) struct RawAsset {
    pub(super) asset_id: String,
    #[serde(default)]
    pub(super) name: Option<String>,
    /// 1 for crypto assets, 0 for fiat
    #[serde(default)]
    pub(super) type_is_crypto: Option<i32>,
    #[serde(default)]
    pub(super) price_usd: Option<f64>,
    #[serde(default)]
    pub(super) volume_1day_usd: Option<f64>,
}

impl RawAsset {
    pub(super) fn is_crypto(&self) -> bool {
        self.type_is_crypto == Some(1)
    }
}

/// Response of `/v1/exchangerate/{base}`.
#[derive(Debug, Deserialize)]
pub(super) struct RawExchangeRateTable {
    #[allow(dead_code)]
    pub(super) asset_id_base: String,
    #[serde(default)]
    pub(super) rates: Vec<RawRateRow>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRateRow {
    pub(super) asset_id_quote: String,
    pub(super) rate: Option<f64>,
}

/// One bar of `/v1/ohlcv/{id}/{quote}/latest`.
#[derive(Debug, Deserialize)]
pub(super) struct RawOhlcvBar {
    pub(super) time_period_start: Option<DateTime<Utc>>,
    pub(super) price_close: Option<f64>,
    #[serde(default)]
    pub(super) volume_traded: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_parsing() {
        let json = r#"{
            "asset_id": "BTC",
            "name": "Bitcoin",
            "type_is_crypto": 1,
            "data_quote_start": "2014-02-24T17:43:05.0000000Z",
            "price_usd": 64250.12,
            "volume_1hrs_usd": 1190000000.0,
            "volume_1day_usd": 28400000000.0
        }"#;

        let asset: RawAsset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.asset_id, "BTC");
        assert!(asset.is_crypto());
        assert_eq!(asset.price_usd, Some(64250.12));
    }

    #[test]
    fn test_fiat_asset_is_not_crypto() {
        let json = r#"{"asset_id": "USD", "name": "US Dollar", "type_is_crypto": 0}"#;
        let asset: RawAsset = serde_json::from_str(json).unwrap();
        assert!(!asset.is_crypto());
        assert_eq!(asset.price_usd, None);
    }

    #[test]
    fn test_exchange_rate_table_parsing() {
        let json = r#"{
            "asset_id_base": "BTC",
            "rates": [
                {"time": "2024-06-01T12:00:00.0000000Z", "asset_id_quote": "USD", "rate": 64250.1},
                {"time": "2024-06-01T12:00:00.0000000Z", "asset_id_quote": "EUR", "rate": 59110.2}
            ]
        }"#;

        let table: RawExchangeRateTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rates.len(), 2);
        assert_eq!(table.rates[0].asset_id_quote, "USD");
    }

    #[test]
    fn test_ohlcv_bar_parsing() {
        let json = r#"{
            "time_period_start": "2024-06-01T00:00:00.0000000Z",
            "time_period_end": "2024-06-02T00:00:00.0000000Z",
            "price_open": 63900.0,
            "price_high": 65100.0,
            "price_low": 63200.0,
            "price_close": 64250.1,
            "volume_traded": 441000.5
        }"#;

        let bar: RawOhlcvBar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.price_close, Some(64250.1));
        assert!(bar.time_period_start.is_some());
    }
}
