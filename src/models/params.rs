use crate::errors::MarketDataError;

/// Sort order for the markets listing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MarketsOrder {
    /// Market capitalization, descending
    #[default]
    MarketCapDesc,
    /// Market capitalization, ascending
    MarketCapAsc,
    /// 24h volume, descending
    VolumeDesc,
    /// 24h volume, ascending
    VolumeAsc,
    /// Coin id, ascending
    IdAsc,
    /// Coin id, descending
    IdDesc,
}

impl MarketsOrder {
    /// The upstream query-parameter form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketCapDesc => "market_cap_desc",
            Self::MarketCapAsc => "market_cap_asc",
            Self::VolumeDesc => "volume_desc",
            Self::VolumeAsc => "volume_asc",
            Self::IdAsc => "id_asc",
            Self::IdDesc => "id_desc",
        }
    }
}

/// Query parameters for the markets listing.
#[derive(Clone, Debug)]
pub struct MarketsParams {
    /// Quote currency (lowercase code)
    pub vs_currency: String,
    /// Sort order
    pub order: MarketsOrder,
    /// Page size, 1..=250
    pub per_page: u32,
    /// 1-based page number
    pub page: u32,
    /// Whether to request sparkline data
    pub sparkline: bool,
    /// Extra price-change windows (e.g. "1h,24h,7d")
    pub price_change_percentage: Option<String>,
}

impl Default for MarketsParams {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            order: MarketsOrder::MarketCapDesc,
            per_page: 100,
            page: 1,
            sparkline: false,
            price_change_percentage: None,
        }
    }
}

impl MarketsParams {
    /// Validate structural constraints. Raised before any cache or network
    /// activity; this is the one parameter-shaped failure the layer
    /// surfaces.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.vs_currency.is_empty() {
            return Err(MarketDataError::InvalidParams(
                "vs_currency must not be empty".to_string(),
            ));
        }
        if self.page == 0 {
            return Err(MarketDataError::InvalidParams(
                "page is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.per_page == 0 || self.per_page > 250 {
            return Err(MarketDataError::InvalidParams(format!(
                "per_page must be within 1..=250, got {}",
                self.per_page
            )));
        }
        Ok(())
    }

    /// Normalized parameter pairs, used for both the upstream query string
    /// and the cache key.
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("vs_currency", self.vs_currency.to_lowercase()),
            ("order", self.order.as_str().to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sparkline", self.sparkline.to_string()),
        ];
        if let Some(windows) = &self.price_change_percentage {
            pairs.push(("price_change_percentage", windows.clone()));
        }
        pairs
    }
}

/// Query parameters for a historical chart.
#[derive(Clone, Debug)]
pub struct ChartParams {
    /// Quote currency (lowercase code)
    pub vs_currency: String,
    /// Days of history, 1..=365
    pub days: u32,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            days: 7,
        }
    }
}

impl ChartParams {
    /// Validate structural constraints.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.vs_currency.is_empty() {
            return Err(MarketDataError::InvalidParams(
                "vs_currency must not be empty".to_string(),
            ));
        }
        if self.days == 0 || self.days > 365 {
            return Err(MarketDataError::InvalidParams(format!(
                "days must be within 1..=365, got {}",
                self.days
            )));
        }
        Ok(())
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", self.vs_currency.to_lowercase()),
            ("days", self.days.to_string()),
        ]
    }
}
