//! Domain types for PolyQuery

pub mod bar;
pub mod query;

pub use bar::RawBar;
pub use query::{normalize_symbol, validate_range, BarUnit, Query, QueryError};

/// Symbol type alias
pub type Symbol = String;
