//! Aggregates request construction.
//!
//! Turns a [`Query`] into the GET URL for
//! `/v2/aggs/ticker/{symbol}/range/{multiplier}/{unit}/{start}/{end}`.
//! Building is pure: nothing here touches the network.

use crate::domain::{Query, QueryError};
use reqwest::Url;
use secrecy::ExposeSecret;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Query parameter carrying the credential.
pub const API_KEY_PARAM: &str = "apiKey";

/// Largest page the endpoint serves; one page per instrument is all we ask for.
pub const PAGE_LIMIT: u32 = 50_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A fully formed aggregates request for one instrument.
#[derive(Clone)]
pub struct AggregatesRequest {
    symbol: String,
    url: Url,
}

impl AggregatesRequest {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Complete URL, credential included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL with the credential value masked, for logs.
    pub fn redacted_url(&self) -> String {
        let mut redacted = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == API_KEY_PARAM { "***".into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
        redacted.to_string()
    }
}

impl fmt::Debug for AggregatesRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatesRequest")
            .field("symbol", &self.symbol)
            .field("url", &self.redacted_url())
            .finish()
    }
}

/// Builds aggregates requests against a base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
}

impl RequestBuilder {
    /// Builder for an arbitrary base URL (a proxy, or a local test server).
    pub fn new(base_url: &str) -> Result<Self, QueryError> {
        let base_url =
            Url::parse(base_url).map_err(|e| QueryError::BaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(QueryError::BaseUrl(base_url.to_string()));
        }
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request for `query`.
    ///
    /// Fails with [`QueryError`] when the multiplier is zero, the end date
    /// precedes the start date, or the symbol is blank.
    pub fn build(&self, query: &Query) -> Result<AggregatesRequest, QueryError> {
        query.validate()?;

        let symbol = query.symbol.trim();
        let multiplier = query.bar_multiplier.to_string();
        let start = query.start_date.format(DATE_FORMAT).to_string();
        let end = query.end_date.format(DATE_FORMAT).to_string();

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| QueryError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([
                "v2",
                "aggs",
                "ticker",
                symbol,
                "range",
                multiplier.as_str(),
                query.bar_unit.as_str(),
                start.as_str(),
                end.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("adjusted", "true")
            .append_pair("sort", "asc")
            .append_pair("limit", &PAGE_LIMIT.to_string())
            .append_pair(API_KEY_PARAM, query.credential.expose_secret());

        Ok(AggregatesRequest {
            symbol: symbol.to_string(),
            url,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL).expect("default base url is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BarUnit;
    use chrono::NaiveDate;
    use secrecy::SecretString;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query(symbol: &str, mult: u32, start: NaiveDate, end: NaiveDate) -> Query {
        Query::new(symbol, mult, BarUnit::Day, start, end, SecretString::new("s3cret".into()))
    }

    fn params(req: &AggregatesRequest) -> HashMap<String, String> {
        req.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn builds_endpoint_path_and_params() {
        let req = RequestBuilder::default()
            .build(&query("aapl", 1, date(2024, 1, 2), date(2024, 1, 5)))
            .unwrap();

        assert_eq!(req.symbol(), "AAPL");
        assert_eq!(req.url().host_str(), Some("api.polygon.io"));
        assert_eq!(
            req.url().path(),
            "/v2/aggs/ticker/AAPL/range/1/day/2024-01-02/2024-01-05"
        );

        let p = params(&req);
        assert_eq!(p["adjusted"], "true");
        assert_eq!(p["sort"], "asc");
        assert_eq!(p["limit"], "50000");
        assert_eq!(p[API_KEY_PARAM], "s3cret");
    }

    #[test]
    fn unit_and_multiplier_land_in_path() {
        let q = Query::new(
            "X:BTCUSD",
            15,
            BarUnit::Minute,
            date(2024, 6, 1),
            date(2024, 6, 1),
            SecretString::new("k".into()),
        );
        let req = RequestBuilder::default().build(&q).unwrap();
        assert!(req.url().path().contains("/ticker/X:BTCUSD/range/15/minute/"));
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let builder = RequestBuilder::new("http://127.0.0.1:8080/proxy/").unwrap();
        let req = builder
            .build(&query("MSFT", 1, date(2024, 1, 2), date(2024, 1, 3)))
            .unwrap();
        assert_eq!(
            req.url().path(),
            "/proxy/v2/aggs/ticker/MSFT/range/1/day/2024-01-02/2024-01-03"
        );
    }

    #[test]
    fn end_before_start_is_invalid() {
        let result = RequestBuilder::default().build(&query("AAPL", 1, date(2024, 2, 1), date(2024, 1, 1)));
        assert!(matches!(result, Err(QueryError::EndBeforeStart { .. })));
    }

    #[test]
    fn zero_multiplier_and_blank_symbol_are_invalid() {
        let builder = RequestBuilder::default();
        assert_eq!(
            builder.build(&query("AAPL", 0, date(2024, 1, 1), date(2024, 1, 2))).unwrap_err(),
            QueryError::NonPositiveMultiplier(0)
        );
        assert_eq!(
            builder.build(&query("   ", 1, date(2024, 1, 1), date(2024, 1, 2))).unwrap_err(),
            QueryError::EmptySymbol
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(RequestBuilder::new("not a url").is_err());
        assert!(RequestBuilder::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn debug_and_redacted_url_mask_key() {
        let req = RequestBuilder::default()
            .build(&query("AAPL", 1, date(2024, 1, 2), date(2024, 1, 5)))
            .unwrap();
        assert!(!format!("{req:?}").contains("s3cret"));
        let redacted = req.redacted_url();
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("apiKey=***") || redacted.contains("apiKey=%2A%2A%2A"));
    }
}
