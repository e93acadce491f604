use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market-wide aggregate snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    /// Number of tracked cryptocurrencies
    pub active_cryptocurrencies: u32,

    /// Number of tracked markets. Zero when the provider doesn't report it.
    pub markets: u32,

    /// Total market capitalization, keyed by quote currency
    pub total_market_cap: BTreeMap<String, Decimal>,

    /// Total 24h volume, keyed by quote currency
    pub total_volume: BTreeMap<String, Decimal>,

    /// Market-cap dominance per coin symbol, percent
    pub market_cap_percentage: BTreeMap<String, Decimal>,

    /// 24h market-cap change in USD terms, percent
    pub market_cap_change_percentage_24h_usd: Decimal,

    /// When the snapshot was taken
    pub updated_at: DateTime<Utc>,
}
