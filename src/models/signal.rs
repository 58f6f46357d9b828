use serde::{Deserialize, Serialize};

/// Direction of a crossover or projected crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Buy for a strictly positive value, Sell otherwise.
    pub fn from_direction(value: f64) -> Self {
        if value > 0.0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Fast EMA crossed the slow EMA on the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub side: Side,
    /// Index into the price series; always the last bar.
    pub index: usize,
}

/// Linear projection of a crossover `bars_ahead` bars in the future.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreAlert {
    pub side: Side,
    pub bars_ahead: f64,
}

/// Parameters of one signal computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    pub fast: usize,
    pub slow: usize,
    /// Pre-alert lookahead window, in bars.
    pub pre_bars: f64,
}

impl SignalParams {
    pub fn new(fast: usize, slow: usize, pre_bars: f64) -> Self {
        Self {
            fast,
            slow,
            pre_bars,
        }
    }
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            fast: 7,
            slow: 21,
            pre_bars: 5.0,
        }
    }
}

/// Result of a signal computation.
///
/// With insufficient history every series is empty and both `cross` and
/// `pre_alert` are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    /// `ema_fast[i] - ema_slow[i]` for every bar.
    pub diff: Vec<f64>,
    pub cross: Option<CrossoverEvent>,
    pub pre_alert: Option<PreAlert>,
}

impl SignalReport {
    pub fn insufficient() -> Self {
        Self::default()
    }

    pub fn is_insufficient(&self) -> bool {
        self.ema_fast.is_empty()
    }

    /// Metric label summarising what the computation produced.
    pub fn outcome(&self) -> &'static str {
        if self.is_insufficient() {
            "insufficient"
        } else if self.cross.is_some() {
            "cross"
        } else if self.pre_alert.is_some() {
            "pre_alert"
        } else {
            "none"
        }
    }
}
