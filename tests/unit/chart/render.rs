//! Unit tests for the PNG chart renderer

use masterdex::chart::{render_chart_png, ChartError, ChartRequest};
use masterdex::models::{CrossoverEvent, Side, SignalParams, SignalReport};
use masterdex::signals::engine::compute_signals;

use crate::fixtures::{rally_then_reversal, ramp};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn five_minute_times(count: usize) -> Vec<i64> {
    (0..count as i64)
        .map(|i| 1_700_000_000_000 + i * 300_000)
        .collect()
}

const TITLE: &str = "SOLANA • PAIR • TF 5m  –  EMA 3/9";

fn render_titled(
    prices: &[f64],
    times: &[i64],
    report: &SignalReport,
    title: &str,
) -> Result<Vec<u8>, ChartError> {
    render_chart_png(&ChartRequest {
        times,
        prices,
        fast: 3,
        slow: 9,
        title,
        report,
    })
}

fn render(prices: &[f64], times: &[i64], report: &SignalReport) -> Result<Vec<u8>, ChartError> {
    render_titled(prices, times, report, TITLE)
}

#[test]
fn test_renders_png_with_cross_marker() {
    let prices = rally_then_reversal();
    let times = five_minute_times(prices.len());
    let report = compute_signals(&prices, &SignalParams::new(3, 9, 5.0));
    assert!(report.cross.is_some());

    let png = render(&prices, &times, &report).expect("chart renders");
    assert!(png.len() > PNG_SIGNATURE.len());
    assert_eq!(png[..8], PNG_SIGNATURE);
}

#[test]
fn test_renders_png_with_pre_alert_projection() {
    let prices = rally_then_reversal()[..28].to_vec();
    let times = five_minute_times(prices.len());
    let report = compute_signals(&prices, &SignalParams::new(3, 9, 5.0));
    assert!(report.pre_alert.is_some());

    let png = render(&prices, &times, &report).expect("chart renders");
    assert_eq!(png[..8], PNG_SIGNATURE);
}

#[test]
fn test_renders_price_only_when_history_is_short() {
    let prices = ramp(1.0, 0.1, 5);
    let times = five_minute_times(prices.len());
    let report = compute_signals(&prices, &SignalParams::new(3, 9, 5.0));
    assert!(report.is_insufficient());

    let png = render(&prices, &times, &report).expect("chart renders");
    assert_eq!(png[..8], PNG_SIGNATURE);
}

#[test]
fn test_renders_single_flat_bar() {
    let png = render(&[2.0], &[1_700_000_000_000], &SignalReport::insufficient())
        .expect("chart renders");
    assert_eq!(png[..8], PNG_SIGNATURE);
}

#[test]
fn test_empty_series_is_an_error() {
    let result = render(&[], &[], &SignalReport::insufficient());
    assert!(matches!(result, Err(ChartError::EmptySeries)));
}

#[test]
fn test_mismatched_lengths_are_an_error() {
    let result = render(&[1.0, 2.0], &[0], &SignalReport::insufficient());
    assert!(matches!(
        result,
        Err(ChartError::LengthMismatch {
            times: 1,
            prices: 2
        })
    ));
}

#[test]
fn test_title_text_reaches_the_image() {
    let prices = rally_then_reversal();
    let times = five_minute_times(prices.len());
    let report = compute_signals(&prices, &SignalParams::new(3, 9, 5.0));

    let first = render_titled(&prices, &times, &report, "SOLANA • PAIR").expect("chart renders");
    let second = render_titled(&prices, &times, &report, "BSC • OTHER").expect("chart renders");
    assert_ne!(first, second);
}

#[test]
fn test_cross_marker_and_pre_alert_change_the_image() {
    let prices = rally_then_reversal();
    let times = five_minute_times(prices.len());
    let report = compute_signals(&prices, &SignalParams::new(3, 9, 5.0));
    assert!(report.cross.is_some());

    let with_cross = render(&prices, &times, &report).expect("chart renders");
    let without_cross = render(
        &prices,
        &times,
        &SignalReport {
            cross: None,
            ..report.clone()
        },
    )
    .expect("chart renders");
    assert_ne!(with_cross, without_cross);

    let prefix = &prices[..28];
    let report = compute_signals(prefix, &SignalParams::new(3, 9, 5.0));
    assert!(report.pre_alert.is_some());
    let with_alert = render(prefix, &times[..28], &report).expect("chart renders");
    let without_alert = render(
        prefix,
        &times[..28],
        &SignalReport {
            pre_alert: None,
            ..report.clone()
        },
    )
    .expect("chart renders");
    assert_ne!(with_alert, without_alert);
}

#[test]
fn test_cross_index_past_the_series_is_not_drawn() {
    let prices = ramp(1.0, 0.1, 12);
    let times = five_minute_times(prices.len());
    let report = SignalReport {
        cross: Some(CrossoverEvent {
            side: Side::Buy,
            index: 500,
        }),
        ..SignalReport::insufficient()
    };

    let png = render(&prices, &times, &report).expect("out-of-range marker is skipped");
    assert_eq!(png, render(&prices, &times, &SignalReport::insufficient()).expect("chart renders"));
}

#[test]
fn test_report_from_another_series_is_an_error() {
    let longer = ramp(1.0, 0.1, 40);
    let report = compute_signals(&longer, &SignalParams::new(3, 9, 5.0));
    let prices = &longer[..20];
    let times = five_minute_times(prices.len());

    let result = render(prices, &times, &report);
    assert!(matches!(
        result,
        Err(ChartError::SeriesMismatch {
            series: 40,
            prices: 20
        })
    ));
}
