//! Response classification: HTTP status + body → raw rows, empty, or failure.
//!
//! Error bodies are never parsed; the text is surfaced verbatim. There is
//! no retry and no header inspection: one round trip per instrument.

use super::provider::FetchError;
use crate::domain::RawBar;
use serde::Deserialize;
use serde_json::Value;

/// Success envelope of the aggregates endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<RawBar>>,
    #[serde(default)]
    results_count: Option<u64>,
    #[serde(default, rename = "next_url")]
    next_url: Option<String>,
}

/// Outcome of the extraction step, before normalization.
#[derive(Debug)]
pub enum RawOutcome {
    Rows(Vec<RawBar>),
    Empty,
    Failure(FetchError),
}

impl RawOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawOutcome::Empty)
    }
}

/// Classify one HTTP response.
pub fn classify(status: u16, body: &str) -> RawOutcome {
    if !(200..300).contains(&status) {
        return RawOutcome::Failure(FetchError::Http {
            status,
            message: body.to_string(),
        });
    }

    let response = match parse_envelope(body) {
        Ok(r) => r,
        Err(e) => return RawOutcome::Failure(FetchError::Parse(e)),
    };

    if let Some(next) = &response.next_url {
        tracing::warn!(
            results = response.results_count.unwrap_or_default(),
            next_url = %strip_query(next),
            "response truncated at the page limit; later pages are not fetched"
        );
    }

    match response.results {
        Some(rows) if !rows.is_empty() => RawOutcome::Rows(rows),
        _ => RawOutcome::Empty,
    }
}

// A derived struct also deserializes from a JSON array, so the object
// shape is checked before decoding the envelope.
fn parse_envelope(body: &str) -> Result<AggregatesResponse, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, got {}", json_kind(&value)));
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// next_url embeds a cursor and sometimes the key; log only the path.
fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
