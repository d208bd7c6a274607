//! Polygon.io transport.
//!
//! Sends one blocking GET per request with an explicit timeout. There is no
//! retry and no back-off; the reply is handed to the classifier as-is.

use super::provider::{AggregatesSource, FetchError, HttpReply};
use super::request::AggregatesRequest;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for the aggregates endpoint.
pub struct PolygonClient {
    client: reqwest::blocking::Client,
}

impl PolygonClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("polyquery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl AggregatesSource for PolygonClient {
    fn name(&self) -> &str {
        "polygon"
    }

    fn send(&self, request: &AggregatesRequest) -> Result<HttpReply, FetchError> {
        tracing::debug!(url = %request.redacted_url(), "GET aggregates");

        let resp = self
            .client
            .get(request.url().clone())
            .send()
            .map_err(|e| FetchError::Network(describe(&e)))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| FetchError::Network(describe(&e)))?;

        tracing::debug!(symbol = request.symbol(), status, bytes = body.len(), "reply");
        Ok(HttpReply { status, body })
    }
}

// reqwest errors echo the full URL, which carries the key.
fn describe(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    match err.status() {
        Some(status) => format!("{kind} (HTTP {status})"),
        None => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::request::RequestBuilder;
    use crate::domain::{BarUnit, Query};
    use chrono::NaiveDate;
    use secrecy::SecretString;

    #[test]
    fn client_builds_with_timeout() {
        let client = PolygonClient::new(Duration::from_secs(5)).unwrap();
        assert_eq!(client.name(), "polygon");
    }

    #[test]
    fn unreachable_host_is_network_error_without_key() {
        // Port 9 on loopback: nothing listens, connection is refused fast.
        let builder = RequestBuilder::new("http://127.0.0.1:9").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let query = Query::new("AAPL", 1, BarUnit::Day, day, day, SecretString::new("hidden-key".into()));
        let request = builder.build(&query).unwrap();

        let client = PolygonClient::new(Duration::from_secs(2)).unwrap();
        match client.send(&request) {
            Err(FetchError::Network(msg)) => assert!(!msg.contains("hidden-key")),
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
