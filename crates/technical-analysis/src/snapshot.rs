use briefing_core::{DerivedIndicators, PriceSeries};

use crate::indicators::*;

pub const RSI_PERIOD: usize = 14;
/// Two years of daily bars.
pub const LONG_SMA_PERIOD: usize = 730;
pub const SHORT_SMA_PERIOD: usize = 20;
pub const RANGE_LOW_LOOKBACK: usize = 60;

/// Compute the indicator snapshot for the latest bar of `series`.
pub fn derive_indicators(series: &PriceSeries) -> DerivedIndicators {
    let bars = series.bars();
    let closes = series.closes();
    let latest = series.latest();
    let price = latest.close;

    let change_pct = if bars.len() >= 2 {
        pct_change(price, bars[bars.len() - 2].close)
    } else {
        None
    };

    // both are defined for any non-empty series
    let ath = all_time_high(bars).unwrap_or(latest.high);
    let range_low = range_low(bars, RANGE_LOW_LOOKBACK).unwrap_or(latest.low);

    DerivedIndicators {
        price,
        change_pct,
        ath,
        ath_distance_pct: ath_distance_pct(price, ath),
        rsi: rsi(&closes, RSI_PERIOD).last().copied(),
        long_sma: latest_sma(&closes, LONG_SMA_PERIOD),
        range_low,
    }
}

/// Overlay lines for the chart, aligned with the last `window` bars.
#[derive(Debug, Clone, Default)]
pub struct ChartOverlays {
    pub short_sma: Vec<Option<f64>>,
    pub long_sma: Vec<Option<f64>>,
    pub range_low: f64,
}

impl ChartOverlays {
    pub fn has_long_sma(&self) -> bool {
        self.long_sma.iter().any(Option::is_some)
    }
}

/// Moving averages are computed over the full history, then cut down to the tail,
/// so the overlay is defined from the first visible bar when history allows.
pub fn chart_overlays(series: &PriceSeries, indicators: &DerivedIndicators, window: usize) -> ChartOverlays {
    let closes = series.closes();
    let visible = series.tail(window).len();
    let skip = closes.len() - visible;

    // Only the visible tail plus the warm-up of each average is needed.
    let overlay = |period: usize| -> Vec<Option<f64>> {
        let start = skip.saturating_sub(period.saturating_sub(1));
        let values = rolling_sma(&closes[start..], period);
        values[skip - start..].to_vec()
    };

    ChartOverlays {
        short_sma: overlay(SHORT_SMA_PERIOD),
        long_sma: overlay(LONG_SMA_PERIOD),
        range_low: indicators.range_low,
    }
}
