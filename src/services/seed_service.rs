use tracing::error;

use crate::db::SeedStore;
use crate::external::market_provider::MarketDataProvider;

/// Result of one fetch+write step. "Empty" (provider has nothing for the
/// symbol) is its own outcome, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Written successfully; carries the row count (1 for an overview).
    Stored(usize),
    Empty,
    Failed(String),
}

impl FetchOutcome {
    fn is_stored(&self) -> bool {
        matches!(self, FetchOutcome::Stored(_))
    }
}

#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub overview: FetchOutcome,
    pub prices: FetchOutcome,
}

#[derive(Debug)]
pub struct SeedReport {
    pub total: usize,
    pub overviews_stored: usize,
    pub histories_stored: usize,
    pub symbols: Vec<SymbolReport>,
}

impl SeedReport {
    pub fn summary_line(&self) -> String {
        format!(
            "Done! {}/{} overviews, {}/{} price histories stored.",
            self.overviews_stored, self.total, self.histories_stored, self.total
        )
    }
}

async fn seed_overview(
    provider: &dyn MarketDataProvider,
    store: &dyn SeedStore,
    symbol: &str,
) -> FetchOutcome {
    match provider.fetch_overview(symbol).await {
        Ok(Some(overview)) => match store.upsert_overview(&overview).await {
            Ok(()) => FetchOutcome::Stored(1),
            Err(e) => {
                error!("Failed to store overview for {}: {}", symbol, e);
                FetchOutcome::Failed(e.to_string())
            }
        },
        Ok(None) => FetchOutcome::Empty,
        Err(e) => {
            error!("Failed to fetch overview for {}: {}", symbol, e);
            FetchOutcome::Failed(e.to_string())
        }
    }
}

async fn seed_prices(
    provider: &dyn MarketDataProvider,
    store: &dyn SeedStore,
    symbol: &str,
) -> FetchOutcome {
    match provider.fetch_price_history(symbol).await {
        Ok(bars) if bars.is_empty() => FetchOutcome::Empty,
        Ok(bars) => match store.upsert_price_bars(symbol, &bars).await {
            Ok(()) => FetchOutcome::Stored(bars.len()),
            Err(e) => {
                error!("Failed to store price bars for {}: {}", symbol, e);
                FetchOutcome::Failed(e.to_string())
            }
        },
        Err(e) => {
            error!("Failed to fetch price history for {}: {}", symbol, e);
            FetchOutcome::Failed(e.to_string())
        }
    }
}

fn render_outcome(outcome: &FetchOutcome, with_row_count: bool) -> String {
    match outcome {
        FetchOutcome::Stored(rows) if with_row_count => format!("ok ({rows} rows)"),
        FetchOutcome::Stored(_) => "ok".to_string(),
        FetchOutcome::Empty => "empty".to_string(),
        FetchOutcome::Failed(msg) => format!("error: {msg}"),
    }
}

/// Sequential driver: for each symbol, overview then prices, each step
/// independent of the other's outcome. Per-symbol failures never abort the
/// run; the report carries the per-step outcomes and the final counts.
pub async fn run(
    provider: &dyn MarketDataProvider,
    store: &dyn SeedStore,
    symbols: &[String],
) -> SeedReport {
    let total = symbols.len();
    let mut report = SeedReport {
        total,
        overviews_stored: 0,
        histories_stored: 0,
        symbols: Vec::with_capacity(total),
    };

    for (i, symbol) in symbols.iter().enumerate() {
        let n = i + 1;

        let overview = seed_overview(provider, store, symbol).await;
        println!(
            "[{n}/{total}] {symbol} overview... {}",
            render_outcome(&overview, false)
        );

        let prices = seed_prices(provider, store, symbol).await;
        println!(
            "[{n}/{total}] {symbol} prices... {}",
            render_outcome(&prices, true)
        );
        println!();

        if overview.is_stored() {
            report.overviews_stored += 1;
        }
        if prices.is_stored() {
            report.histories_stored += 1;
        }
        report.symbols.push(SymbolReport {
            symbol: symbol.clone(),
            overview,
            prices,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::external::market_provider::{
        ExternalOverview, ExternalPriceBar, ProviderError,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn overview(symbol: &str, sector: &str) -> ExternalOverview {
        ExternalOverview {
            symbol: symbol.to_string(),
            asset_type: "EQUITY".to_string(),
            name: format!("{symbol} Inc"),
            description: "N/A".to_string(),
            exchange: "NMS".to_string(),
            sector: sector.to_string(),
            industry: "Semiconductors".to_string(),
            market_cap: "1000".to_string(),
        }
    }

    fn bar(date: &str, low: f64, high: f64, close: f64, volume: i64) -> ExternalPriceBar {
        ExternalPriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            low,
            high,
            close,
            volume,
        }
    }

    /// Per-symbol canned responses; anything not configured is "empty".
    #[derive(Default)]
    struct FakeProvider {
        overviews: HashMap<String, Result<Option<ExternalOverview>, String>>,
        histories: HashMap<String, Result<Vec<ExternalPriceBar>, String>>,
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn fetch_overview(
            &self,
            symbol: &str,
        ) -> Result<Option<ExternalOverview>, ProviderError> {
            match self.overviews.get(symbol) {
                Some(Ok(o)) => Ok(o.clone()),
                Some(Err(msg)) => Err(ProviderError::Network(msg.clone())),
                None => Ok(None),
            }
        }

        async fn fetch_price_history(
            &self,
            symbol: &str,
        ) -> Result<Vec<ExternalPriceBar>, ProviderError> {
            match self.histories.get(symbol) {
                Some(Ok(bars)) => Ok(bars.clone()),
                Some(Err(msg)) => Err(ProviderError::Network(msg.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    /// In-memory stand-in with the destination's upsert semantics: one
    /// overview per symbol, one bar per (symbol, date).
    #[derive(Default)]
    struct FakeStore {
        overviews: Mutex<HashMap<String, ExternalOverview>>,
        bars: Mutex<HashMap<(String, NaiveDate), ExternalPriceBar>>,
        bar_write_calls: Mutex<usize>,
    }

    #[async_trait]
    impl SeedStore for FakeStore {
        async fn upsert_overview(&self, overview: &ExternalOverview) -> Result<(), AppError> {
            self.overviews
                .lock()
                .unwrap()
                .insert(overview.symbol.clone(), overview.clone());
            Ok(())
        }

        async fn upsert_price_bars(
            &self,
            symbol: &str,
            bars: &[ExternalPriceBar],
        ) -> Result<(), AppError> {
            *self.bar_write_calls.lock().unwrap() += 1;
            let mut stored = self.bars.lock().unwrap();
            for b in bars {
                stored.insert((symbol.to_string(), b.date), b.clone());
            }
            Ok(())
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn end_to_end_single_symbol() {
        let mut provider = FakeProvider::default();
        provider
            .overviews
            .insert("ABC".to_string(), Ok(Some(overview("ABC", "Technology"))));
        provider.histories.insert(
            "ABC".to_string(),
            Ok(vec![
                bar("2024-01-01", 10.1234, 10.5, 10.4, 1000),
                bar("2024-01-02", 10.4, 10.9, 10.8, 2000),
            ]),
        );
        let store = FakeStore::default();

        let report = run(&provider, &store, &symbols(&["ABC"])).await;

        assert_eq!(report.overviews_stored, 1);
        assert_eq!(report.histories_stored, 1);
        assert_eq!(
            report.summary_line(),
            "Done! 1/1 overviews, 1/1 price histories stored."
        );
        assert_eq!(report.symbols[0].symbol, "ABC");
        assert_eq!(report.symbols[0].overview, FetchOutcome::Stored(1));
        assert_eq!(report.symbols[0].prices, FetchOutcome::Stored(2));

        let overviews = store.overviews.lock().unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews["ABC"].name, "ABC Inc");
        assert_eq!(overviews["ABC"].market_cap, "1000");

        let bars = store.bars.lock().unwrap();
        assert_eq!(bars.len(), 2);
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(bars[&("ABC".to_string(), jan1)].low, 10.1234);
        assert_eq!(bars[&("ABC".to_string(), jan1)].volume, 1000);
    }

    #[tokio::test]
    async fn rerun_overwrites_instead_of_duplicating() {
        let store = FakeStore::default();
        let bars = vec![bar("2024-01-01", 10.0, 11.0, 10.5, 100)];

        let mut provider = FakeProvider::default();
        provider
            .overviews
            .insert("X".to_string(), Ok(Some(overview("X", "Old"))));
        provider
            .histories
            .insert("X".to_string(), Ok(bars.clone()));
        run(&provider, &store, &symbols(&["X"])).await;

        provider
            .overviews
            .insert("X".to_string(), Ok(Some(overview("X", "New"))));
        let report = run(&provider, &store, &symbols(&["X"])).await;

        assert_eq!(report.overviews_stored, 1);
        let overviews = store.overviews.lock().unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews["X"].sector, "New");
        assert_eq!(store.bars.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overview_failure_leaves_prices_untouched() {
        let mut provider = FakeProvider::default();
        provider
            .overviews
            .insert("Y".to_string(), Err("connection refused".to_string()));
        provider.histories.insert(
            "Y".to_string(),
            Ok(vec![bar("2024-01-01", 1.0, 2.0, 1.5, 10)]),
        );
        let store = FakeStore::default();

        let report = run(&provider, &store, &symbols(&["Y"])).await;

        assert_eq!(report.overviews_stored, 0);
        assert_eq!(report.histories_stored, 1);
        assert_eq!(
            report.symbols[0].overview,
            FetchOutcome::Failed("network error: connection refused".to_string())
        );
        assert!(store.overviews.lock().unwrap().is_empty());
        assert_eq!(store.bars.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_history_skips_the_write() {
        let mut provider = FakeProvider::default();
        provider
            .overviews
            .insert("Z".to_string(), Ok(Some(overview("Z", "Technology"))));
        provider.histories.insert("Z".to_string(), Ok(Vec::new()));
        let store = FakeStore::default();

        let report = run(&provider, &store, &symbols(&["Z"])).await;

        assert_eq!(report.symbols[0].prices, FetchOutcome::Empty);
        assert_eq!(report.histories_stored, 0);
        assert_eq!(*store.bar_write_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn one_bad_symbol_never_aborts_the_run() {
        let mut provider = FakeProvider::default();
        provider
            .overviews
            .insert("BAD".to_string(), Err("timeout".to_string()));
        provider
            .histories
            .insert("BAD".to_string(), Err("timeout".to_string()));
        provider
            .overviews
            .insert("GOOD".to_string(), Ok(Some(overview("GOOD", "Technology"))));
        provider.histories.insert(
            "GOOD".to_string(),
            Ok(vec![bar("2024-01-01", 1.0, 2.0, 1.5, 10)]),
        );
        let store = FakeStore::default();

        let report = run(&provider, &store, &symbols(&["BAD", "GOOD"])).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.overviews_stored, 1);
        assert_eq!(report.histories_stored, 1);
        assert_eq!(
            report.summary_line(),
            "Done! 1/2 overviews, 1/2 price histories stored."
        );
    }

    #[tokio::test]
    async fn unknown_symbol_is_empty_not_an_error() {
        let provider = FakeProvider::default();
        let store = FakeStore::default();

        let report = run(&provider, &store, &symbols(&["GHOST"])).await;

        assert_eq!(report.symbols[0].overview, FetchOutcome::Empty);
        assert_eq!(report.symbols[0].prices, FetchOutcome::Empty);
        assert_eq!(
            report.summary_line(),
            "Done! 0/1 overviews, 0/1 price histories stored."
        );
    }

    #[test]
    fn progress_rendering() {
        assert_eq!(render_outcome(&FetchOutcome::Stored(1), false), "ok");
        assert_eq!(
            render_outcome(&FetchOutcome::Stored(251), true),
            "ok (251 rows)"
        );
        assert_eq!(render_outcome(&FetchOutcome::Empty, true), "empty");
        assert_eq!(
            render_outcome(&FetchOutcome::Failed("boom".to_string()), false),
            "error: boom"
        );
    }
}
