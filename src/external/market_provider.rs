use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Placeholder stored for overview fields the provider does not return.
/// Every descriptive column in the destination is NOT NULL with this default.
pub const NOT_AVAILABLE: &str = "N/A";

/// Descriptive company metadata for one symbol. All fields are already
/// substituted with "N/A" where the provider had nothing, so the persistence
/// layer never sees an absent value.
#[derive(Debug, Clone)]
pub struct ExternalOverview {
    pub symbol: String,
    pub asset_type: String,
    pub name: String,
    pub description: String,
    pub exchange: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: String,
}

// One day's aggregated bar. Open is deliberately not carried.
#[derive(Debug, Clone)]
pub struct ExternalPriceBar {
    pub date: NaiveDate,
    pub low: f64,
    pub high: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// `Ok(None)` means the provider has no usable record for the symbol.
    /// That is an "empty" outcome for the caller, not an error.
    async fn fetch_overview(
        &self,
        symbol: &str,
    ) -> Result<Option<ExternalOverview>, ProviderError>;

    /// Maximum available daily history, ascending by date.
    /// An empty vec means the provider has no history for the symbol.
    async fn fetch_price_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<ExternalPriceBar>, ProviderError>;
}
