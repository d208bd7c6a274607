//! Instrument list intake.
//!
//! Symbols arrive either as comma-separated text or as a CSV table with a
//! `ticker` column. Both reduce to the same ordered list of trimmed,
//! upper-cased, non-empty symbols. Duplicates are kept.

use crate::domain::{normalize_symbol, Symbol};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Required header of an uploaded ticker table.
pub const TICKER_COLUMN: &str = "ticker";

#[derive(Debug, Error)]
pub enum SymbolListError {
    #[error("ticker table has no 'ticker' column")]
    MissingTickerColumn,

    #[error("failed to read ticker table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered instruments for one fetch invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentList {
    symbols: Vec<Symbol>,
}

impl InstrumentList {
    /// Build from raw symbols, dropping blanks.
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = raw
            .into_iter()
            .map(|s| normalize_symbol(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { symbols }
    }

    /// Parse free text such as `"AAPL, msft,,X:BTCUSD"`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split(','))
    }

    /// Read a CSV table and take its `ticker` column.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SymbolListError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let column = rdr
            .headers()?
            .iter()
            .position(|h| h == TICKER_COLUMN)
            .ok_or(SymbolListError::MissingTickerColumn)?;

        let mut raw = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(cell) = record.get(column) {
                raw.push(cell.to_string());
            }
        }
        Ok(Self::new(raw))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, SymbolListError> {
        let file = std::fs::File::open(path).map_err(|source| SymbolListError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Market class of a reference ticker, told apart by its Polygon prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Stock,
    Crypto,
    Forex,
}

impl AssetClass {
    pub fn of(symbol: &str) -> Self {
        if symbol.starts_with("X:") {
            AssetClass::Crypto
        } else if symbol.starts_with("C:") {
            AssetClass::Forex
        } else {
            AssetClass::Stock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Stock => "Stocks",
            AssetClass::Crypto => "Crypto",
            AssetClass::Forex => "Forex (FX)",
        }
    }

    /// Prefix rule shown alongside the reference list.
    pub fn prefix_hint(&self) -> &'static str {
        match self {
            AssetClass::Stock => "plain ticker (e.g., AAPL)",
            AssetClass::Crypto => "X: prefix (e.g., X:BTCUSD)",
            AssetClass::Forex => "C: prefix (e.g., C:USDSGD)",
        }
    }
}

/// Sample tickers that can be passed straight to a fetch.
pub const REFERENCE_TICKERS: &[(&str, &str)] = &[
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("TSLA", "Tesla"),
    ("NVDA", "Nvidia"),
    ("AMZN", "Amazon"),
    ("X:BTCUSD", "Bitcoin"),
    ("X:ETHUSD", "Ethereum"),
    ("X:SOLUSD", "Solana"),
    ("C:USDEUR", "USD/EUR"),
    ("C:USDJPY", "USD/JPY"),
    ("C:USDSGD", "USD/SGD"),
];

/// Reference tickers of one asset class, in listing order.
pub fn reference_tickers(class: AssetClass) -> impl Iterator<Item = (&'static str, &'static str)> {
    REFERENCE_TICKERS
        .iter()
        .copied()
        .filter(move |(symbol, _)| AssetClass::of(symbol) == class)
}
