use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the markets listing.
///
/// Fields the secondary provider cannot supply (24h change, supply
/// figures, image) are zero-filled or `None` rather than omitted, so the
/// shape stays stable whichever provider satisfied the call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    /// Canonical identifier within the winning provider's namespace
    pub id: String,

    /// Ticker symbol, lowercase
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Logo URL, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Current price in the requested quote currency
    pub current_price: Decimal,

    /// Market capitalization (derived estimate for the secondary provider)
    pub market_cap: Decimal,

    /// Rank by market capitalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,

    /// 24h trading volume
    pub total_volume: Decimal,

    /// 24h high
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<Decimal>,

    /// 24h low
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<Decimal>,

    /// 24h price change, percent. Zero when the provider doesn't report it.
    pub price_change_percentage_24h: Decimal,

    /// Circulating supply. Zero when the provider doesn't report it.
    pub circulating_supply: Decimal,

    /// Total supply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<Decimal>,

    /// When the provider last updated this row
    pub last_updated: DateTime<Utc>,
}

/// Market figures nested inside a coin detail.
///
/// Denominated in USD regardless of request parameters; the detail
/// endpoint is currency-agnostic on both upstreams.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Current price
    pub current_price: Decimal,
    /// Market capitalization
    pub market_cap: Decimal,
    /// 24h trading volume
    pub total_volume: Decimal,
    /// 24h price change, percent
    pub price_change_percentage_24h: Decimal,
    /// Circulating supply
    pub circulating_supply: Decimal,
    /// Total supply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<Decimal>,
}

/// Per-coin detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    /// Canonical identifier
    pub id: String,
    /// Ticker symbol, lowercase
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Long-form description, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rank by market capitalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
    /// Market figures (USD)
    pub market: MarketSummary,
    /// When the provider last updated this coin
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_coin_market_serde_round_trip() {
        let coin = CoinMarket {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: None,
            current_price: dec!(64250.12),
            market_cap: dec!(1264000000000),
            market_cap_rank: Some(1),
            total_volume: dec!(28500000000),
            high_24h: Some(dec!(65100)),
            low_24h: Some(dec!(63200)),
            price_change_percentage_24h: dec!(-1.42),
            circulating_supply: dec!(19700000),
            total_supply: Some(dec!(21000000)),
            last_updated: Utc::now(),
        };

        let json = serde_json::to_string(&coin).unwrap();
        let back: CoinMarket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coin);
        // Optional fields without values stay out of the wire shape.
        assert!(!json.contains("image"));
    }
}
