use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One exchange rate relative to the BTC base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateInfo {
    /// Display name of the quote unit
    pub name: String,
    /// Unit symbol (e.g. "$", "eth")
    pub unit: String,
    /// Value of one BTC in this unit
    pub value: Decimal,
    /// "fiat", "crypto", "commodity", or "unknown" when the provider
    /// doesn't classify
    #[serde(rename = "type")]
    pub rate_type: String,
}

/// BTC-based exchange rate table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    /// Rates keyed by lowercase quote currency code
    pub rates: BTreeMap<String, RateInfo>,
}
