//! Unified data model shared by both providers.
//!
//! Field names and shapes follow the primary provider's contract; the
//! secondary provider's translation layer reshapes its native schema into
//! these types so downstream consumers see one stable surface.

mod chart;
mod global;
mod market;
mod params;
mod rates;
mod types;

pub use chart::{ChartPoint, MarketChart};
pub use global::GlobalSnapshot;
pub use market::{CoinDetail, CoinMarket, MarketSummary};
pub use params::{ChartParams, MarketsOrder, MarketsParams};
pub use rates::{ExchangeRates, RateInfo};
pub use types::{Sourced, UnifiedResult};
