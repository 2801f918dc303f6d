use anyhow::Context;

/// Symbols seeded on every run. No override mechanism on purpose:
/// this binary exists to populate the starter dataset and nothing else.
const SYMBOLS: &[&str] = &[
    "AMD", "TSM", "MU", "SMCI", "VRT", "AVGO", "MRVL", "ANET",
    "NVDA", "INTC", "QCOM", "TXN", "ADI", "AMAT", "LRCX", "KLAC", "ASML",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub symbols: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("POSTGRES_URL"))
            .context("DATABASE_URL (or POSTGRES_URL) must be set")?;

        Ok(Self {
            database_url,
            symbols: SYMBOLS.iter().map(|s| s.to_string()).collect(),
        })
    }
}
