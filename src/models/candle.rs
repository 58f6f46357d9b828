use serde::{Deserialize, Serialize};

/// One closed bar as far as signal computation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time in milliseconds since the Unix epoch.
    pub time_ms: i64,
    pub close: f64,
}

impl Candle {
    pub fn new(time_ms: i64, close: f64) -> Self {
        Self { time_ms, close }
    }
}

/// Column-oriented candle history, oldest first. `times` and `closes`
/// always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub times: Vec<i64>,
    pub closes: Vec<f64>,
}

impl CandleSeries {
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl FromIterator<Candle> for CandleSeries {
    fn from_iter<I: IntoIterator<Item = Candle>>(iter: I) -> Self {
        let (times, closes) = iter.into_iter().map(|c| (c.time_ms, c.close)).unzip();
        Self { times, closes }
    }
}
