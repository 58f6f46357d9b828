//! PNG chart of a price series with its EMA overlays.
//!
//! The renderer only draws what a `SignalReport` already contains; it never
//! evaluates signals itself. Drawing goes to an in-memory RGB buffer which is
//! then PNG-encoded, so no display or file system is involved. Text is drawn
//! with a bundled DejaVu Sans face registered as `sans-serif`.

use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use thiserror::Error;

use crate::models::{Side, SignalReport};

pub const CHART_WIDTH: u32 = 1560;
pub const CHART_HEIGHT: u32 = 650;

const PRICE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const EMA_FAST_COLOR: RGBColor = RGBColor(0xf2, 0xc9, 0x4c);
const EMA_SLOW_COLOR: RGBColor = RGBColor(0xeb, 0x57, 0x57);
const CROSS_BUY_COLOR: RGBColor = RGBColor(0x27, 0xae, 0x60);
const CROSS_SELL_COLOR: RGBColor = RGBColor(0xc0, 0x39, 0x2b);
const ALERT_BUY_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const ALERT_SELL_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);

const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no prices to chart")]
    EmptySeries,

    #[error("{times} timestamps for {prices} prices")]
    LengthMismatch { times: usize, prices: usize },

    #[error("report series has {series} points for {prices} prices")]
    SeriesMismatch { series: usize, prices: usize },

    #[error("bundled chart font could not be loaded")]
    Font,

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Register the bundled font with plotters. Runs once per process.
fn ensure_font() -> Result<(), ChartError> {
    let registered = FONT_REGISTERED.get_or_init(|| {
        plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if *registered {
        Ok(())
    } else {
        Err(ChartError::Font)
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Everything the renderer needs for one chart.
pub struct ChartRequest<'a> {
    /// Bar timestamps, ms since the Unix epoch.
    pub times: &'a [i64],
    pub prices: &'a [f64],
    pub fast: usize,
    pub slow: usize,
    pub title: &'a str,
    pub report: &'a SignalReport,
}

/// Render the chart as PNG bytes (`CHART_WIDTH` x `CHART_HEIGHT`).
pub fn render_chart_png(request: &ChartRequest<'_>) -> Result<Vec<u8>, ChartError> {
    if request.prices.is_empty() {
        return Err(ChartError::EmptySeries);
    }
    if request.times.len() != request.prices.len() {
        return Err(ChartError::LengthMismatch {
            times: request.times.len(),
            prices: request.prices.len(),
        });
    }
    let report = request.report;
    for series in [&report.ema_fast, &report.ema_slow] {
        if !series.is_empty() && series.len() != request.prices.len() {
            return Err(ChartError::SeriesMismatch {
                series: series.len(),
                prices: request.prices.len(),
            });
        }
    }
    ensure_font()?;

    let mut rgb = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    draw(request, &mut rgb)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&rgb, CHART_WIDTH, CHART_HEIGHT, ColorType::Rgb8)?;
    Ok(png)
}

/// X position (seconds) of a pre-alert: the last bar plus `bars_ahead`
/// average bar widths, measured from the last two bars.
pub fn pre_alert_position(xs: &[f64], bars_ahead: f64) -> Option<f64> {
    match xs {
        [.., prev, last] => Some(last + (last - prev) * bars_ahead),
        _ => None,
    }
}

fn value_range<'a>(series: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = series
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        lo.abs().max(1.0) * 0.01
    };
    (lo - pad, hi + pad)
}

fn format_time(seconds: &f64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis((*seconds * 1000.0) as i64)
        .map(|t| t.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn draw(request: &ChartRequest<'_>, buffer: &mut [u8]) -> Result<(), ChartError> {
    let report = request.report;
    let xs: Vec<f64> = request.times.iter().map(|&t| t as f64 / 1000.0).collect();

    let projection = report
        .pre_alert
        .and_then(|alert| pre_alert_position(&xs, alert.bars_ahead).map(|x| (alert, x)));

    let x_min = xs[0];
    let mut x_max = xs[xs.len() - 1];
    if let Some((_, x)) = projection {
        x_max = x_max.max(x);
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let (y_min, y_max) = value_range(
        request
            .prices
            .iter()
            .chain(&report.ema_fast)
            .chain(&report.ema_slow),
    );

    let root = BitMapBackend::with_buffer(buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(request.title, (FONT_FAMILY, 20))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_desc("Time (UTC)")
        .y_desc("Price")
        .x_label_formatter(&format_time)
        .draw()
        .map_err(draw_err)?;

    let line = |values: &[f64]| -> Vec<(f64, f64)> {
        xs.iter().copied().zip(values.iter().copied()).collect()
    };

    chart
        .draw_series(LineSeries::new(line(request.prices), PRICE_COLOR.stroke_width(1)))
        .map_err(draw_err)?
        .label("Price")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PRICE_COLOR));

    // Insufficient history leaves both EMA series empty.
    if !report.is_insufficient() {
        chart
            .draw_series(LineSeries::new(line(&report.ema_fast[..]), EMA_FAST_COLOR.stroke_width(2)))
            .map_err(draw_err)?
            .label(format!("EMA {}", request.fast))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], EMA_FAST_COLOR));

        chart
            .draw_series(LineSeries::new(line(&report.ema_slow[..]), EMA_SLOW_COLOR.stroke_width(2)))
            .map_err(draw_err)?
            .label(format!("EMA {}", request.slow))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], EMA_SLOW_COLOR));
    }

    if let Some(cross) = report.cross {
        let color = match cross.side {
            Side::Buy => CROSS_BUY_COLOR,
            Side::Sell => CROSS_SELL_COLOR,
        };
        let label_offset = match cross.side {
            Side::Buy => 12,
            Side::Sell => -24,
        };
        // A report from a different series may point past the end.
        if let (Some(&x), Some(&y)) = (xs.get(cross.index), request.prices.get(cross.index)) {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((x, y))
                        + Circle::new((0, 0), 6, color.filled())
                        + Text::new(
                            cross.side.as_str().to_uppercase(),
                            (-14, label_offset),
                            (FONT_FAMILY, 14).into_font().color(&color),
                        ),
                ))
                .map_err(draw_err)?;
        }
    }

    if let Some((alert, x)) = projection {
        let color = match alert.side {
            Side::Buy => ALERT_BUY_COLOR,
            Side::Sell => ALERT_SELL_COLOR,
        };
        chart
            .draw_series(LineSeries::new(
                vec![(x, y_min), (x, y_max)],
                color.mix(0.6).stroke_width(1),
            ))
            .map_err(draw_err)?;
        chart
            .draw_series(std::iter::once(
                EmptyElement::at((x, y_max))
                    + Text::new(
                        format!(
                            "Pre-alert {} ~{:.1} bars",
                            alert.side.as_str().to_uppercase(),
                            alert.bars_ahead
                        ),
                        (-190, 6),
                        (FONT_FAMILY, 12).into_font().color(&color),
                    ),
            ))
            .map_err(draw_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
