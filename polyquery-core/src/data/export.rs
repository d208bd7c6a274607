//! CSV export of normalized and combined datasets.
//!
//! Output is comma-separated UTF-8 with a header row, one line per row and
//! no index column. Missing cells are written empty. The same dataset always
//! serializes to the same bytes, so repeated downloads are byte-identical.

use super::aggregate::{Aggregated, CombinedDataset};
use super::normalize::NormalizedDataset;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COMBINED_FILE_NAME: &str = "combined_data.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no instrument returned data")]
    NothingToExport,

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] PolarsError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can be written out as a table.
pub trait Tabular {
    fn frame(&self) -> &DataFrame;
}

impl Tabular for NormalizedDataset {
    fn frame(&self) -> &DataFrame {
        NormalizedDataset::frame(self)
    }
}

impl Tabular for CombinedDataset {
    fn frame(&self) -> &DataFrame {
        CombinedDataset::frame(self)
    }
}

impl Tabular for DataFrame {
    fn frame(&self) -> &DataFrame {
        self
    }
}

/// Serialize a dataset to CSV bytes.
pub fn export_csv<T: Tabular + ?Sized>(dataset: &T) -> Result<Vec<u8>, ExportError> {
    let mut frame = dataset.frame().clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut frame)?;
    Ok(buf)
}

/// Exported bytes paired with a deterministic file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn for_instrument(dataset: &NormalizedDataset) -> Result<Self, ExportError> {
        Ok(Self {
            file_name: instrument_file_name(dataset.instrument()),
            rows: dataset.height(),
            bytes: export_csv(dataset)?,
        })
    }

    pub fn for_combined(dataset: &CombinedDataset) -> Result<Self, ExportError> {
        Ok(Self {
            file_name: COMBINED_FILE_NAME.to_string(),
            rows: dataset.height(),
            bytes: export_csv(dataset)?,
        })
    }

    /// BLAKE3 hex digest of the bytes.
    pub fn digest(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}

/// `{SYMBOL}_data.csv`, with path-hostile characters (`:` `/` `\`) replaced
/// by `_` so prefixed symbols such as `X:BTCUSD` are valid file names.
pub fn instrument_file_name(symbol: &str) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| if matches!(c, ':' | '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe}_data.csv")
}

/// Export every dataset of an aggregation result.
///
/// Fails with [`ExportError::NothingToExport`] rather than producing an
/// empty file when no instrument contributed rows.
pub fn build_artifacts(aggregated: &Aggregated) -> Result<Vec<ExportArtifact>, ExportError> {
    if aggregated.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    match aggregated {
        Aggregated::Combined(combined) => Ok(vec![ExportArtifact::for_combined(combined)?]),
        Aggregated::Separate(datasets) => datasets.iter().map(ExportArtifact::for_instrument).collect(),
    }
}

/// Write artifacts into `dir`, creating it if needed. Returns written paths.
pub fn save_artifacts(artifacts: &[ExportArtifact], dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    artifacts
        .iter()
        .map(|artifact| {
            let path = dir.join(&artifact.file_name);
            std::fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), rows = artifact.rows, "wrote export");
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::{combine, ExportMode};
    use crate::data::normalize::normalize;
    use crate::domain::RawBar;
    use serde_json::json;

    fn dataset(symbol: &str, value: serde_json::Value) -> NormalizedDataset {
        let rows: Vec<RawBar> = serde_json::from_value(value).unwrap();
        normalize(symbol, &rows).unwrap()
    }

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn header_then_one_line_per_row() {
        let ds = dataset("AAPL", json!([{"t": 1, "n": 10}, {"t": 2, "n": 12}]));
        let out = lines(&export_csv(&ds).unwrap());
        assert_eq!(out, ["t,n,instrument", "1,10,AAPL", "2,12,AAPL"]);
    }

    #[test]
    fn export_is_idempotent() {
        let ds = dataset("AAPL", json!([{"o": 1.25, "c": null, "t": 1}, {"o": null, "c": 3.5, "t": 2}]));
        assert_eq!(export_csv(&ds).unwrap(), export_csv(&ds).unwrap());
    }

    #[test]
    fn fully_missing_cells_are_empty() {
        let ds = dataset("AAPL", json!([{"t": 1, "x": null}]));
        let out = lines(&export_csv(&ds).unwrap());
        assert_eq!(out, ["t,x,instrument", "1,,AAPL"]);
    }

    #[test]
    fn file_names_are_deterministic() {
        assert_eq!(instrument_file_name("AAPL"), "AAPL_data.csv");
        assert_eq!(instrument_file_name("X:BTCUSD"), "X_BTCUSD_data.csv");
        assert_eq!(instrument_file_name("C:USD/EUR"), "C_USD_EUR_data.csv");
    }

    #[test]
    fn nothing_to_export_for_empty_aggregation() {
        let combined = combine(vec![], ExportMode::Combined).unwrap();
        assert!(matches!(build_artifacts(&combined), Err(ExportError::NothingToExport)));
        let separate = combine(vec![], ExportMode::Separate).unwrap();
        assert!(matches!(build_artifacts(&separate), Err(ExportError::NothingToExport)));
    }

    #[test]
    fn separate_mode_yields_one_artifact_per_instrument() {
        let a = dataset("AAPL", json!([{"t": 1}]));
        let b = dataset("I:SPX", json!([{"t": 1}, {"t": 2}]));
        let artifacts = build_artifacts(&combine(vec![a, b], ExportMode::Separate).unwrap()).unwrap();

        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["AAPL_data.csv", "I_SPX_data.csv"]);
        assert_eq!(artifacts[1].rows, 2);
    }

    #[test]
    fn combined_mode_yields_single_artifact() {
        let a = dataset("AAPL", json!([{"t": 1}]));
        let b = dataset("MSFT", json!([{"t": 1}]));
        let artifacts = build_artifacts(&combine(vec![a, b], ExportMode::Combined).unwrap()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].file_name, COMBINED_FILE_NAME);
        assert_eq!(lines(&artifacts[0].bytes), ["t,instrument", "1,AAPL", "1,MSFT"]);
    }

    #[test]
    fn digest_tracks_bytes() {
        let a = ExportArtifact::for_instrument(&dataset("AAPL", json!([{"t": 1}]))).unwrap();
        let b = ExportArtifact::for_instrument(&dataset("AAPL", json!([{"t": 1}]))).unwrap();
        let c = ExportArtifact::for_instrument(&dataset("AAPL", json!([{"t": 2}]))).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn save_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        let a = ExportArtifact::for_instrument(&dataset("X:ETHUSD", json!([{"t": 1}]))).unwrap();

        let paths = save_artifacts(std::slice::from_ref(&a), &target).unwrap();
        assert_eq!(paths, [target.join("X_ETHUSD_data.csv")]);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), a.bytes);
    }
}
