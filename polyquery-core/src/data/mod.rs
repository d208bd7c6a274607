//! Retrieval, normalization, aggregation and export of aggregate bars

pub mod aggregate;
pub mod classify;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod polygon;
pub mod provider;
pub mod request;
pub mod schema;

pub use aggregate::{combine, AggregateError, Aggregated, CombinedDataset, ExportMode};
pub use classify::{classify, RawOutcome};
pub use export::{
    build_artifacts, export_csv, instrument_file_name, save_artifacts, ExportArtifact, ExportError,
    Tabular, COMBINED_FILE_NAME,
};
pub use normalize::{fill_missing, normalize, NormalizeError, NormalizedDataset};
pub use pipeline::{fetch_all, fetch_instrument, FetchPlan, FetchReport, InstrumentOutcome};
pub use polygon::PolygonClient;
pub use provider::{
    AggregatesSource, FetchError, FetchOutcome, FetchProgress, HttpReply, NoProgress, StdoutProgress,
};
pub use request::{AggregatesRequest, RequestBuilder};
pub use schema::INSTRUMENT_COLUMN;
