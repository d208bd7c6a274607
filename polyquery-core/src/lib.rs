//! Polyquery Core: aggregate-bar retrieval, normalization and CSV export.
//!
//! - Query validation and request building for the aggregates endpoint
//! - Response classification into rows, empty or failure
//! - Normalization into typed frames with gap repair and an instrument tag
//! - Combined or per-instrument packaging and deterministic CSV output

pub mod config;
pub mod data;
pub mod domain;
pub mod logging;
pub mod symbols;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Query>();
        require_sync::<domain::Query>();
        require_send::<domain::RawBar>();
        require_sync::<domain::RawBar>();
        require_send::<data::NormalizedDataset>();
        require_sync::<data::NormalizedDataset>();
        require_send::<data::CombinedDataset>();
        require_sync::<data::CombinedDataset>();
        require_send::<data::FetchOutcome>();
        require_sync::<data::FetchOutcome>();
        require_send::<data::FetchReport>();
        require_sync::<data::FetchReport>();
        require_send::<data::ExportArtifact>();
        require_sync::<data::ExportArtifact>();
        require_send::<data::PolygonClient>();
        require_sync::<data::PolygonClient>();
        require_send::<config::AppConfig>();
        require_sync::<config::AppConfig>();
        require_send::<symbols::InstrumentList>();
        require_sync::<symbols::InstrumentList>();
    }
}
