use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire keys of the aggregates endpoint's bar objects.
pub mod fields {
    pub const OPEN: &str = "o";
    pub const HIGH: &str = "h";
    pub const LOW: &str = "l";
    pub const CLOSE: &str = "c";
    pub const VOLUME: &str = "v";
    pub const VWAP: &str = "vw";
    pub const TIMESTAMP: &str = "t";
    pub const TRANSACTIONS: &str = "n";
}

/// One aggregate bar exactly as the API returned it.
///
/// Keys keep their wire order. No field is guaranteed to be present and
/// unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBar(Map<String, Value>);

impl RawBar {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Field value, treating JSON `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn open(&self) -> Option<f64> {
        self.number(fields::OPEN)
    }

    pub fn high(&self) -> Option<f64> {
        self.number(fields::HIGH)
    }

    pub fn low(&self) -> Option<f64> {
        self.number(fields::LOW)
    }

    pub fn close(&self) -> Option<f64> {
        self.number(fields::CLOSE)
    }

    pub fn volume(&self) -> Option<f64> {
        self.number(fields::VOLUME)
    }

    pub fn vwap(&self) -> Option<f64> {
        self.number(fields::VWAP)
    }

    /// Bar start, epoch milliseconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.get(fields::TIMESTAMP).and_then(Value::as_i64)
    }

    pub fn transactions(&self) -> Option<u64> {
        self.get(fields::TRANSACTIONS).and_then(Value::as_u64)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }
}

impl From<Map<String, Value>> for RawBar {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
