//! Fetch orchestrator: sequential fan-out over instruments.
//!
//! Each instrument gets one request, one round trip, one classification and
//! (on rows) one normalization, then exactly one terminal [`FetchOutcome`].
//! A failing instrument never stops the ones after it.

use super::classify::{classify, RawOutcome};
use super::normalize::{normalize, NormalizedDataset};
use super::provider::{AggregatesSource, FetchError, FetchOutcome, FetchProgress};
use super::request::RequestBuilder;
use crate::domain::{validate_range, BarUnit, Query, QueryError};
use crate::symbols::InstrumentList;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

/// Everything one fetch invocation needs besides the transport.
#[derive(Debug)]
pub struct FetchPlan {
    pub instruments: InstrumentList,
    pub bar_multiplier: u32,
    pub bar_unit: BarUnit,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub credential: SecretString,
}

impl FetchPlan {
    /// Per-instrument query for `symbol`.
    pub fn query_for(&self, symbol: &str) -> Query {
        Query::new(
            symbol,
            self.bar_multiplier,
            self.bar_unit,
            self.start_date,
            self.end_date,
            SecretString::new(self.credential.expose_secret().into()),
        )
    }
}

/// Terminal outcome of one instrument.
#[derive(Debug)]
pub struct InstrumentOutcome {
    pub symbol: String,
    pub outcome: FetchOutcome,
}

/// Outcomes of a fetch invocation, in instrument order.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<InstrumentOutcome>,
}

impl FetchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn empty(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, FetchOutcome::Empty))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, FetchOutcome::Failure(_)))
            .count()
    }

    pub fn any_succeeded(&self) -> bool {
        self.outcomes.iter().any(|o| o.outcome.is_success())
    }

    /// `(symbol, error)` for every failed instrument.
    pub fn errors(&self) -> Vec<(&str, &FetchError)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                FetchOutcome::Failure(e) => Some((o.symbol.as_str(), e)),
                _ => None,
            })
            .collect()
    }

    /// Successful datasets in fetch order; empty and failed instruments are skipped.
    pub fn into_datasets(self) -> Vec<NormalizedDataset> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.outcome.into_dataset())
            .collect()
    }
}

/// Fetch every instrument of `plan`, one after the other.
///
/// The bar size and date range are shared by all instruments and checked
/// once up front: a malformed range aborts before any request is sent.
pub fn fetch_all(
    source: &dyn AggregatesSource,
    builder: &RequestBuilder,
    plan: &FetchPlan,
    progress: &dyn FetchProgress,
) -> Result<FetchReport, QueryError> {
    validate_range(plan.bar_multiplier, plan.start_date, plan.end_date)?;

    let total = plan.instruments.len();
    let mut report = FetchReport {
        outcomes: Vec::with_capacity(total),
    };

    tracing::info!(
        source = source.name(),
        instruments = total,
        multiplier = plan.bar_multiplier,
        unit = %plan.bar_unit,
        start = %plan.start_date,
        end = %plan.end_date,
        "fetching aggregates"
    );

    for (i, symbol) in plan.instruments.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let outcome = fetch_instrument(source, builder, &plan.query_for(symbol));
        match &outcome {
            FetchOutcome::Success(ds) => tracing::info!(symbol, rows = ds.height(), "fetched"),
            FetchOutcome::Empty => tracing::info!(symbol, "no data returned"),
            FetchOutcome::Failure(e) => tracing::warn!(symbol, error = %e, "fetch failed"),
        }

        progress.on_complete(symbol, i, total, &outcome);
        report.outcomes.push(InstrumentOutcome {
            symbol: symbol.to_string(),
            outcome,
        });
    }

    progress.on_batch_complete(report.succeeded(), report.empty(), report.failed());
    Ok(report)
}

/// Fetch one instrument: build → send → classify → normalize.
pub fn fetch_instrument(
    source: &dyn AggregatesSource,
    builder: &RequestBuilder,
    query: &Query,
) -> FetchOutcome {
    let request = match builder.build(query) {
        Ok(r) => r,
        Err(e) => return FetchOutcome::Failure(e.into()),
    };

    let reply = match source.send(&request) {
        Ok(r) => r,
        Err(e) => return FetchOutcome::Failure(e),
    };

    match classify(reply.status, &reply.body) {
        RawOutcome::Rows(rows) => match normalize(request.symbol(), &rows) {
            Ok(ds) => FetchOutcome::Success(ds),
            Err(e) => FetchOutcome::Failure(FetchError::Normalize(e.to_string())),
        },
        RawOutcome::Empty => FetchOutcome::Empty,
        RawOutcome::Failure(e) => FetchOutcome::Failure(e),
    }
}
