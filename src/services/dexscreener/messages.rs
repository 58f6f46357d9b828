//! Dexscreener REST payloads

use serde::Deserialize;
use serde_json::Value;

/// `GET /latest/dex/candles/{chain}/{pair}`
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<CandleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandleEntry {
    /// Open time, ms
    pub t: i64,
    /// Close
    pub c: PriceValue,
}

/// Prices arrive either as JSON numbers or as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    /// Finite price, or `None` when the value is not a usable number.
    pub fn to_finite(&self) -> Option<f64> {
        let value = match self {
            PriceValue::Number(n) => *n,
            PriceValue::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// `GET /latest/dex/search?q=...`
///
/// The result list has shipped under several keys; the first non-empty one wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub pairs: Option<Vec<Value>>,
    #[serde(default)]
    pub tokens: Option<Vec<Value>>,
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

impl SearchResponse {
    pub fn into_entries(self) -> Vec<Value> {
        [self.pairs, self.tokens, self.results]
            .into_iter()
            .flatten()
            .find(|entries| !entries.is_empty())
            .unwrap_or_default()
    }
}
