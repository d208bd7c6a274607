use chrono::NaiveDate;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bar size unit accepted by the aggregates endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BarUnit {
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl BarUnit {
    pub const ALL: [BarUnit; 5] = [
        BarUnit::Minute,
        BarUnit::Hour,
        BarUnit::Day,
        BarUnit::Week,
        BarUnit::Month,
    ];

    /// Literal path segment used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            BarUnit::Minute => "minute",
            BarUnit::Hour => "hour",
            BarUnit::Day => "day",
            BarUnit::Week => "week",
            BarUnit::Month => "month",
        }
    }
}

impl fmt::Display for BarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarUnit {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(BarUnit::Minute),
            "hour" => Ok(BarUnit::Hour),
            "day" => Ok(BarUnit::Day),
            "week" => Ok(BarUnit::Week),
            "month" => Ok(BarUnit::Month),
            other => Err(QueryError::UnknownUnit(other.to_string())),
        }
    }
}

/// Malformed caller input. Surfaced before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("symbol is empty")]
    EmptySymbol,

    #[error("bar multiplier must be at least 1, got {0}")]
    NonPositiveMultiplier(u32),

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("unknown bar unit '{0}' (expected minute, hour, day, week or month)")]
    UnknownUnit(String),

    #[error("base url cannot carry a path: {0}")]
    BaseUrl(String),
}

/// One logical aggregates query for a single instrument.
///
/// The credential is wrapped in [`SecretString`] so `Debug` output never
/// shows it.
#[derive(Debug)]
pub struct Query {
    pub symbol: String,
    pub bar_multiplier: u32,
    pub bar_unit: BarUnit,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub credential: SecretString,
}

impl Query {
    /// Create a query; the symbol is trimmed and upper-cased.
    pub fn new(
        symbol: &str,
        bar_multiplier: u32,
        bar_unit: BarUnit,
        start_date: NaiveDate,
        end_date: NaiveDate,
        credential: SecretString,
    ) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            bar_multiplier,
            bar_unit,
            start_date,
            end_date,
            credential,
        }
    }

    /// Check the invariants a request needs.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.symbol.trim().is_empty() {
            return Err(QueryError::EmptySymbol);
        }
        validate_range(self.bar_multiplier, self.start_date, self.end_date)
    }
}

/// Validate the parameters shared by every instrument of one fetch.
pub fn validate_range(
    bar_multiplier: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), QueryError> {
    if bar_multiplier < 1 {
        return Err(QueryError::NonPositiveMultiplier(bar_multiplier));
    }
    if end_date < start_date {
        return Err(QueryError::EndBeforeStart {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}

/// Trim and upper-case a caller-supplied symbol. Prefixes such as `X:` are
/// left untouched.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key() -> SecretString {
        SecretString::new("test-key".into())
    }

    #[test]
    fn unit_round_trips_through_str() {
        for unit in BarUnit::ALL {
            assert_eq!(unit.as_str().parse::<BarUnit>().unwrap(), unit);
        }
        assert_eq!(" Week ".parse::<BarUnit>().unwrap(), BarUnit::Week);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = "quarter".parse::<BarUnit>().unwrap_err();
        assert_eq!(err, QueryError::UnknownUnit("quarter".into()));
    }

    #[test]
    fn symbol_is_trimmed_and_upper_cased() {
        let q = Query::new(" x:btcusd ", 1, BarUnit::Day, date(2024, 1, 1), date(2024, 1, 2), key());
        assert_eq!(q.symbol, "X:BTCUSD");
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        let q = Query::new("  ", 1, BarUnit::Day, date(2024, 1, 1), date(2024, 1, 2), key());
        assert_eq!(q.validate(), Err(QueryError::EmptySymbol));

        let q = Query::new("AAPL", 0, BarUnit::Day, date(2024, 1, 1), date(2024, 1, 2), key());
        assert_eq!(q.validate(), Err(QueryError::NonPositiveMultiplier(0)));

        let q = Query::new("AAPL", 1, BarUnit::Day, date(2024, 1, 2), date(2024, 1, 1), key());
        assert!(matches!(q.validate(), Err(QueryError::EndBeforeStart { .. })));
    }

    #[test]
    fn same_day_range_is_valid() {
        let q = Query::new("AAPL", 5, BarUnit::Minute, date(2024, 3, 1), date(2024, 3, 1), key());
        assert!(q.validate().is_ok());
    }

    #[test]
    fn debug_output_hides_credential() {
        let q = Query::new("AAPL", 1, BarUnit::Day, date(2024, 1, 1), date(2024, 1, 2), key());
        let dbg = format!("{q:?}");
        assert!(!dbg.contains("test-key"));
    }
}
