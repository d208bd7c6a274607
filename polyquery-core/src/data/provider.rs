//! Transport seam, per-instrument outcomes and structured error types.
//!
//! The [`AggregatesSource`] trait abstracts the single HTTP round trip so the
//! pipeline can run against Polygon or an in-memory fake in tests.

use super::normalize::NormalizedDataset;
use super::request::AggregatesRequest;
use crate::domain::QueryError;
use thiserror::Error;

/// Raw HTTP reply: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure of one instrument's fetch.
///
/// These are displayable in CLI context and never abort other instruments.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("normalization failed: {0}")]
    Normalize(String),
}

/// Terminal status of one instrument.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(NormalizedDataset),
    Empty,
    Failure(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn dataset(&self) -> Option<&NormalizedDataset> {
        match self {
            FetchOutcome::Success(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn into_dataset(self) -> Option<NormalizedDataset> {
        match self {
            FetchOutcome::Success(ds) => Some(ds),
            _ => None,
        }
    }

    /// One-line, user-facing status for `symbol`.
    pub fn status_line(&self, symbol: &str) -> String {
        match self {
            FetchOutcome::Success(ds) => {
                format!("Retrieved data for {symbol} ({} rows)", ds.height())
            }
            FetchOutcome::Empty => format!("No data returned for {symbol}."),
            FetchOutcome::Failure(e) => format!("Failed to fetch data for {symbol}: {e}"),
        }
    }
}

/// One HTTP round trip against the aggregates endpoint.
///
/// Implementations return `Err` only for transport failures; any HTTP
/// status, including errors, is an `Ok(HttpReply)`.
pub trait AggregatesSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn send(&self, request: &AggregatesRequest) -> Result<HttpReply, FetchError>;
}

/// Progress callback for multi-instrument fetches.
pub trait FetchProgress {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called with the symbol's terminal outcome.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &FetchOutcome);

    /// Called when every symbol has a terminal outcome.
    fn on_batch_complete(&self, succeeded: usize, empty: usize, failed: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, outcome: &FetchOutcome) {
        println!("  {}", outcome.status_line(symbol));
    }

    fn on_batch_complete(&self, succeeded: usize, empty: usize, failed: usize) {
        println!("\nFetch complete: {succeeded} with data, {empty} empty, {failed} failed");
    }
}

/// Progress reporter that stays silent.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _outcome: &FetchOutcome) {}
    fn on_batch_complete(&self, _succeeded: usize, _empty: usize, _failed: usize) {}
}
