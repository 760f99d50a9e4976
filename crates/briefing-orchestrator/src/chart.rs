use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::Engine;
use briefing_core::Bar;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use technical_analysis::ChartOverlays;
use thiserror::Error;

use crate::format::{format_compact, format_thousands};

/// Number of trailing bars drawn.
pub const CHART_WINDOW: usize = 150;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 700;
const FONT_FAMILY: &str = "sans-serif";

const BACKGROUND: RGBColor = RGBColor(0x0a, 0x0a, 0x0a);
const GRID: RGBColor = RGBColor(0x44, 0x44, 0x44);
const LABEL: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);
const LEGEND_BG: RGBColor = RGBColor(0x33, 0x33, 0x33);
const UP: RGBColor = RGBColor(0x00, 0xff, 0x00);
const DOWN: RGBColor = RGBColor(0xff, 0x33, 0x33);
const LONG_SMA: RGBColor = RGBColor(0xff, 0xa5, 0x00);
const SUPPORT: RGBColor = RGBColor(0x00, 0xff, 0xff);
const SHORT_SMA: RGBColor = RGBColor(0xff, 0xff, 0xff);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no bars to chart")]
    NoData,

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

fn render_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register the TrueType font used for titles, labels and the legend.
///
/// Tries `custom` first, then common system locations. Only the first call has an effect.
/// Returns whether text can be drawn; without a font the chart is rendered shapes-only.
pub fn init_font(custom: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = custom
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            // registered fonts must live for the whole process
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Chart font loaded");
                    return true;
                }
                Err(_) => tracing::warn!(path = %path.display(), "Invalid chart font"),
            }
        }

        tracing::warn!("No chart font found, charts will be drawn without text");
        false
    })
}

fn price_bounds(bars: &[Bar], overlays: &ChartOverlays) -> (f64, f64) {
    let overlay_values = overlays
        .short_sma
        .iter()
        .chain(overlays.long_sma.iter())
        .flatten()
        .copied();

    let lows = bars.iter().map(|b| b.low).chain(std::iter::once(overlays.range_low));
    let highs = bars.iter().map(|b| b.high);

    let min = lows.chain(overlay_values.clone()).fold(f64::INFINITY, f64::min);
    let max = highs.chain(overlay_values).fold(f64::NEG_INFINITY, f64::max);

    let pad = ((max - min) * 0.03).max(max.abs() * 0.001).max(1e-6);
    (min - pad, max + pad)
}

/// Candlestick chart with a volume panel, moving-average overlays and the support line, as PNG.
pub fn render_chart(bars: &[Bar], overlays: &ChartOverlays, title: &str) -> Result<Vec<u8>, ChartError> {
    if bars.is_empty() {
        return Err(ChartError::NoData);
    }

    let annotate = init_font(None);
    let n = bars.len();
    let x_range = -0.5f64..(n as f64 - 0.5);
    let (y_min, y_max) = price_bounds(bars, overlays);
    let candle_width = ((WIDTH as f64 - 100.0) / n as f64 * 0.7).clamp(1.0, 12.0) as u32;

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&BACKGROUND).map_err(render_err)?;

        let root = if annotate {
            root.titled(title, (FONT_FAMILY, 22).into_font().color(&SHORT_SMA))
                .map_err(render_err)?
        } else {
            root
        };
        let panel_split = root.dim_in_pixel().1 as i32 * 4 / 5;
        let (upper, lower) = root.split_vertically(panel_split);

        // price panel
        let mut builder = ChartBuilder::on(&upper);
        builder.margin(10);
        if annotate {
            builder.y_label_area_size(70);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), y_min..y_max)
            .map_err(render_err)?;

        if annotate {
            let price_label = |v: &f64| format_thousands(*v, 0);
            chart
                .configure_mesh()
                .x_labels(0)
                .y_labels(8)
                .bold_line_style(GRID.mix(0.5))
                .light_line_style(TRANSPARENT)
                .axis_style(GRID)
                .y_label_style((FONT_FAMILY, 12).into_font().color(&LABEL))
                .y_label_formatter(&price_label)
                .draw()
                .map_err(render_err)?;
        }

        chart
            .draw_series(bars.iter().enumerate().map(|(i, b)| {
                CandleStick::new(
                    i as f64,
                    b.open,
                    b.high,
                    b.low,
                    b.close,
                    UP.filled(),
                    DOWN.filled(),
                    candle_width,
                )
            }))
            .map_err(render_err)?;

        if overlays.has_long_sma() {
            chart
                .draw_series(LineSeries::new(
                    defined_points(&overlays.long_sma),
                    LONG_SMA.stroke_width(2),
                ))
                .map_err(render_err)?
                .label("SMA 2Y")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LONG_SMA.stroke_width(2)));
        }

        // dashed: one unit drawn, one skipped
        let low = overlays.range_low;
        chart
            .draw_series((0..n).step_by(2).map(|i| {
                PathElement::new(vec![(i as f64 - 0.5, low), (i as f64 + 0.5, low)], SUPPORT.stroke_width(1))
            }))
            .map_err(render_err)?
            .label("Support")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 8, y), (x + 12, y), (x + 20, y)], SUPPORT));

        chart
            .draw_series(LineSeries::new(defined_points(&overlays.short_sma), SHORT_SMA))
            .map_err(render_err)?
            .label("SMA 20")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SHORT_SMA));

        if annotate {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(LEGEND_BG.mix(0.9))
                .border_style(GRID)
                .label_font((FONT_FAMILY, 11).into_font().color(&SHORT_SMA))
                .draw()
                .map_err(render_err)?;
        }

        // volume panel
        let max_volume = bars.iter().map(|b| b.volume).fold(0.0, f64::max).max(1.0);
        let mut builder = ChartBuilder::on(&lower);
        builder.margin(10);
        if annotate {
            builder.y_label_area_size(70).x_label_area_size(24);
        }
        let mut volume_chart = builder
            .build_cartesian_2d(x_range, 0.0..max_volume * 1.1)
            .map_err(render_err)?;

        if annotate {
            let date_label = |x: &f64| {
                bars.get(x.round().max(0.0) as usize)
                    .map(|b| b.timestamp.format("%b %d").to_string())
                    .unwrap_or_default()
            };
            let volume_label = |v: &f64| format_compact(*v);
            volume_chart
                .configure_mesh()
                .x_labels(6)
                .y_labels(3)
                .disable_x_mesh()
                .bold_line_style(GRID.mix(0.5))
                .light_line_style(TRANSPARENT)
                .axis_style(GRID)
                .label_style((FONT_FAMILY, 12).into_font().color(&LABEL))
                .x_label_formatter(&date_label)
                .y_label_formatter(&volume_label)
                .draw()
                .map_err(render_err)?;
        }

        volume_chart
            .draw_series(bars.iter().enumerate().map(|(i, b)| {
                let color = if b.close >= b.open { UP } else { DOWN };
                let x = i as f64;
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, b.volume)], color.mix(0.7).filled())
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&buffer, WIDTH, HEIGHT, ExtendedColorType::Rgb8)
        .map_err(|e| ChartError::Encode(e.to_string()))?;
    Ok(png)
}

pub fn render_chart_base64(bars: &[Bar], overlays: &ChartOverlays, title: &str) -> Result<String, ChartError> {
    let png = render_chart(bars, overlays, title)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

fn defined_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect()
}
