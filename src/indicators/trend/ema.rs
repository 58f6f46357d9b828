//! EMA (Exponential Moving Average) indicator
//!
//! The series is seeded with the first price as-is, with no SMA warm-up
//! window. Crossover detection downstream depends on this exact seeding,
//! including the transient it causes on the first bars for long periods.

/// Smoothing constant `k = 2 / (period + 1)`.
pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// One recurrence step: `value * k + previous * (1 - k)`.
pub fn ema_from_previous(value: f64, previous: f64, k: f64) -> f64 {
    value * k + previous * (1.0 - k)
}

/// Compute the EMA of `prices` for `period`, one output per input.
///
/// `period <= 1` returns the input unchanged. An empty input yields an
/// empty output.
pub fn compute_ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period <= 1 || prices.is_empty() {
        return prices.to_vec();
    }

    let k = smoothing_factor(period);
    let mut out = Vec::with_capacity(prices.len());
    let mut previous = prices[0];
    out.push(previous);

    for &value in &prices[1..] {
        previous = ema_from_previous(value, previous, k);
        out.push(previous);
    }

    out
}
