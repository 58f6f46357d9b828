//! Crossover detection and linear pre-alert projection over the
//! fast-minus-slow EMA difference.

use crate::models::{CrossoverEvent, PreAlert, Side};

/// Returns 1, 0 or -1.
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Flag a crossover between the previous and the current bar.
///
/// Only a flip away from a non-zero sign counts: leaving an exact tie, or
/// staying at one, is not a crossover.
pub fn detect_crossover(diff_prev: f64, diff_now: f64, index: usize) -> Option<CrossoverEvent> {
    let sign_prev = sign(diff_prev);
    let sign_now = sign(diff_now);

    if sign_prev == 0 || sign_now == sign_prev {
        return None;
    }

    let side = if sign_now > 0 { Side::Buy } else { Side::Sell };
    Some(CrossoverEvent { side, index })
}

/// Project when the difference would reach zero at its current slope.
///
/// Emits a pre-alert only for a strictly future crossing no further than
/// `horizon` bars away. A zero slope has no projection.
pub fn project_pre_alert(diff_prev: f64, diff_now: f64, horizon: f64) -> Option<PreAlert> {
    let slope = diff_now - diff_prev;
    if slope == 0.0 {
        return None;
    }

    let bars_to_cross = -diff_now / slope;
    if bars_to_cross > 0.0 && bars_to_cross <= horizon {
        Some(PreAlert {
            side: Side::from_direction(slope),
            bars_ahead: bars_to_cross,
        })
    } else {
        None
    }
}
