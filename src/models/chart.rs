use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of a historical series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Point timestamp
    pub timestamp: DateTime<Utc>,
    /// Point value in the requested quote currency
    pub value: Decimal,
}

/// Historical price/volume series for one coin.
///
/// Points are ordered by timestamp ascending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    /// Price over time
    pub prices: Vec<ChartPoint>,
    /// Trading volume over time
    pub total_volumes: Vec<ChartPoint>,
}
