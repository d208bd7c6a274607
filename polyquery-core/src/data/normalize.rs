//! Normalization: raw bars → tagged, repaired polars frame.
//!
//! The column set is the union of wire keys in first-seen order with the
//! `instrument` column appended last. Missing cells are repaired per column
//! by forward-fill then backward-fill; rows are never dropped and the
//! column set never changes during repair.

use super::schema::{build_series, INSTRUMENT_COLUMN};
use crate::domain::RawBar;
use indexmap::IndexSet;
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no rows to normalize")]
    NoRows,

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

/// Bars of a single instrument in the common tabular contract.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    instrument: String,
    frame: DataFrame,
}

impl NormalizedDataset {
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }
}

/// Normalize the raw rows of one instrument.
pub fn normalize(symbol: &str, rows: &[RawBar]) -> Result<NormalizedDataset, NormalizeError> {
    if rows.is_empty() {
        return Err(NormalizeError::NoRows);
    }

    // A wire key named like the tag column is overwritten by the tag.
    let keys: IndexSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .filter(|key| *key != INSTRUMENT_COLUMN)
        .collect();

    let mut columns: Vec<Column> = keys
        .iter()
        .map(|key| {
            let cells: Vec<_> = rows.iter().map(|row| row.get(key)).collect();
            Column::from(build_series(key, &cells))
        })
        .collect();

    let tag = vec![symbol; rows.len()];
    columns.push(Column::from(Series::new(INSTRUMENT_COLUMN.into(), tag)));

    let frame = fill_missing(DataFrame::new(columns)?)?;

    Ok(NormalizedDataset {
        instrument: symbol.to_string(),
        frame,
    })
}

/// Forward-fill then backward-fill every column except `instrument`.
///
/// Columns are repaired independently. A column with no present value is
/// left fully missing.
pub fn fill_missing(frame: DataFrame) -> PolarsResult<DataFrame> {
    let columns = frame
        .take_columns()
        .into_iter()
        .map(|column| {
            let nulls = column.null_count();
            if column.name().as_str() == INSTRUMENT_COLUMN || nulls == 0 || nulls == column.len() {
                return Ok(column);
            }
            let repaired = column
                .as_materialized_series()
                .fill_null(FillNullStrategy::Forward(None))?
                .fill_null(FillNullStrategy::Backward(None))?;
            Ok(Column::from(repaired))
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    DataFrame::new(columns)
}
