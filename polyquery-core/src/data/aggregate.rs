//! Multi-instrument aggregation.
//!
//! `Combined` row-concatenates datasets in fetch order; `Separate` passes
//! them through for independent export. Neither mode de-duplicates: two
//! instruments may legitimately share a timestamp.

use super::normalize::NormalizedDataset;
use super::schema::INSTRUMENT_COLUMN;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// How fetched datasets are packaged for export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Combined,
    Separate,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

/// Row-wise union of normalized datasets.
#[derive(Debug, Clone)]
pub struct CombinedDataset {
    instruments: Vec<String>,
    frame: DataFrame,
}

impl CombinedDataset {
    pub fn empty() -> Self {
        Self {
            instruments: Vec::new(),
            frame: DataFrame::empty(),
        }
    }

    /// Contributing instruments, in fetch order.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Result of [`combine`], shaped by the requested mode.
#[derive(Debug, Clone)]
pub enum Aggregated {
    Combined(CombinedDataset),
    Separate(Vec<NormalizedDataset>),
}

impl Aggregated {
    pub fn is_empty(&self) -> bool {
        match self {
            Aggregated::Combined(c) => c.is_empty(),
            Aggregated::Separate(all) => all.is_empty(),
        }
    }
}

/// Combine datasets according to `mode`. An empty input is an empty result.
pub fn combine(
    datasets: Vec<NormalizedDataset>,
    mode: ExportMode,
) -> Result<Aggregated, AggregateError> {
    match mode {
        ExportMode::Separate => Ok(Aggregated::Separate(datasets)),
        ExportMode::Combined => concat_datasets(datasets).map(Aggregated::Combined),
    }
}

fn concat_datasets(datasets: Vec<NormalizedDataset>) -> Result<CombinedDataset, AggregateError> {
    if datasets.is_empty() {
        return Ok(CombinedDataset::empty());
    }

    let instruments: Vec<String> = datasets.iter().map(|d| d.instrument().to_string()).collect();
    let frames: Vec<LazyFrame> = reconcile_dtypes(datasets.into_iter().map(|d| d.into_frame()).collect())?
        .into_iter()
        .map(|frame| frame.lazy())
        .collect();

    // Diagonal: an optional wire key seen for one instrument only becomes a
    // null-padded column rather than a schema error. Numeric columns widen
    // to their supertype; everything else was settled above.
    let args = UnionArgs {
        parallel: false,
        rechunk: true,
        to_supertypes: true,
        ..Default::default()
    };
    let stacked = concat_lf_diagonal(frames, args)?.collect()?;

    Ok(CombinedDataset {
        instruments,
        frame: move_instrument_last(stacked)?,
    })
}

/// Align column dtypes across instruments before stacking.
///
/// A key carrying numbers of different widths is left for the concat to
/// widen. A key whose present values disagree otherwise (`true` for one
/// instrument, `3` for another) becomes text in every frame, so no value is
/// reinterpreted as a different kind. A column with no present value in
/// one frame takes the dtype the other frames agree on.
fn reconcile_dtypes(frames: Vec<DataFrame>) -> PolarsResult<Vec<DataFrame>> {
    let mut seen: HashMap<PlSmallStr, Vec<DataType>> = HashMap::new();
    for frame in &frames {
        for column in frame.get_columns() {
            if column.null_count() < column.len() {
                seen.entry(column.name().clone())
                    .or_default()
                    .push(column.dtype().clone());
            }
        }
    }

    let targets: HashMap<PlSmallStr, DataType> = seen
        .into_iter()
        .map(|(name, dtypes)| {
            let first = dtypes[0].clone();
            let target = if dtypes.iter().all(|d| *d == first) || dtypes.iter().all(DataType::is_primitive_numeric) {
                first
            } else {
                DataType::String
            };
            (name, target)
        })
        .collect();

    frames
        .into_iter()
        .map(|frame| {
            let columns = frame
                .take_columns()
                .into_iter()
                .map(|column| match targets.get(column.name()) {
                    Some(target) if needs_cast(&column, target) => column.cast(target),
                    _ => Ok(column),
                })
                .collect::<PolarsResult<Vec<_>>>()?;
            DataFrame::new(columns)
        })
        .collect()
}

fn needs_cast(column: &Column, target: &DataType) -> bool {
    if column.dtype() == target {
        return false;
    }
    let all_missing = column.null_count() == column.len();
    all_missing || *target == DataType::String
}

fn move_instrument_last(frame: DataFrame) -> PolarsResult<DataFrame> {
    let mut order: Vec<PlSmallStr> = frame
        .get_column_names()
        .into_iter()
        .cloned()
        .filter(|name| name.as_str() != INSTRUMENT_COLUMN)
        .collect();
    order.push(INSTRUMENT_COLUMN.into());
    frame.select(order)
}
