//! Signal evaluation engine: two EMAs, the latest crossover and a
//! pre-alert projection.

use tracing::debug;

use crate::indicators::trend::compute_ema;
use crate::models::{SignalParams, SignalReport};
use crate::signals::crossover::{detect_crossover, project_pre_alert};

/// Bars required on top of the longest period before a crossover is evaluated.
pub const WARMUP_MARGIN: usize = 3;

/// Minimum series length for `fast`/`slow` periods.
pub fn min_bars(fast: usize, slow: usize) -> usize {
    fast.max(slow).saturating_add(WARMUP_MARGIN)
}

/// Compute both EMAs, their difference, the crossover on the last bar and
/// the pre-alert projection.
///
/// Pure: identical input always produces an identical report. `cross` and
/// `pre_alert` are evaluated independently of each other.
pub fn compute_signals(prices: &[f64], params: &SignalParams) -> SignalReport {
    let required = min_bars(params.fast, params.slow);
    if prices.len() < required {
        debug!(
            length = prices.len(),
            required = required,
            "Insufficient history for signal evaluation"
        );
        return SignalReport::insufficient();
    }

    let ema_fast = compute_ema(prices, params.fast);
    let ema_slow = compute_ema(prices, params.slow);
    let diff: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();

    let last = prices.len() - 1;
    let diff_prev = diff[last - 1];
    let diff_now = diff[last];

    let cross = detect_crossover(diff_prev, diff_now, last);
    let pre_alert = project_pre_alert(diff_prev, diff_now, params.pre_bars);

    SignalReport {
        ema_fast,
        ema_slow,
        diff,
        cross,
        pre_alert,
    }
}
