use crate::external::market_provider::{
    ExternalOverview, ExternalPriceBar, MarketDataProvider, ProviderError, NOT_AVAILABLE,
};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

// Minimal response structs (only what we need)

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(rename = "assetProfile")]
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    #[serde(rename = "longBusinessSummary")]
    long_business_summary: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceModule {
    symbol: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "exchangeName")]
    exchange_name: Option<String>,
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<serde_json::Number>,
}

fn na() -> String {
    NOT_AVAILABLE.to_string()
}

/// Builds the overview record, substituting "N/A" for anything the provider
/// left out. Returns None when the response carries no usable record, which
/// we detect as the price module not echoing a symbol back.
fn overview_from_summary(body: SummaryResponse) -> Option<ExternalOverview> {
    let result = body.quote_summary.result.and_then(|mut r| r.pop())?;
    let price = result.price?;
    let symbol = price.symbol?;

    let profile = result.asset_profile;

    Some(ExternalOverview {
        symbol,
        asset_type: price.quote_type.unwrap_or_else(na),
        name: price.long_name.or(price.short_name).unwrap_or_else(na),
        description: profile
            .as_ref()
            .and_then(|p| p.long_business_summary.clone())
            .unwrap_or_else(na),
        exchange: price.exchange_name.unwrap_or_else(na),
        sector: profile
            .as_ref()
            .and_then(|p| p.sector.clone())
            .unwrap_or_else(na),
        industry: profile
            .as_ref()
            .and_then(|p| p.industry.clone())
            .unwrap_or_else(na),
        market_cap: price
            .market_cap
            .and_then(|m| m.raw)
            .map(|n| n.to_string())
            .unwrap_or_else(na),
    })
}

/// Zips the timestamp axis with the quote arrays. Rows missing any of
/// low/high/close are skipped; a missing volume is 0.
fn bars_from_chart(body: ChartResponse) -> Result<Vec<ExternalPriceBar>, ProviderError> {
    let Some(result) = body.chart.result.and_then(|mut r| r.pop()) else {
        return Ok(Vec::new());
    };

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(result.timestamp.len());

    for (i, ts) in result.timestamp.iter().enumerate() {
        let low = quote.low.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();

        let (Some(low), Some(high), Some(close)) = (low, high, close) else {
            continue;
        };

        let dt = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| ProviderError::Parse("bad timestamp".into()))?;

        out.push(ExternalPriceBar {
            date: dt.date_naive(),
            low,
            high,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    // Ensure ascending by date
    out.sort_by_key(|b| b.date);

    Ok(out)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_overview(
        &self,
        symbol: &str,
    ) -> Result<Option<ExternalOverview>, ProviderError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{symbol}?modules=assetProfile,price"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Yahoo answers 404 for unknown symbols; that is "no record", not a failure.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "quoteSummary status {}",
                resp.status()
            )));
        }

        let body = resp
            .json::<SummaryResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(overview_from_summary(body))
    }

    async fn fetch_price_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<ExternalPriceBar>, ProviderError> {
        // range=max: the whole available history, daily bars
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=max&interval=1d"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "chart status {}",
                resp.status()
            )));
        }

        let body = resp
            .json::<ChartResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        bars_from_chart(body)
    }
}
