use briefing_core::Bar;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Simple Moving Average aligned with its input: `None` until `period` values exist.
pub fn rolling_sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let defined = sma(data, period);
    let warmup = data.len() - defined.len();
    std::iter::repeat(None)
        .take(warmup)
        .chain(defined.into_iter().map(Some))
        .collect()
}

/// Latest value of the trailing simple mean, if enough history exists.
pub fn latest_sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Relative Strength Index over simple rolling averages of gains and losses.
///
/// The first close contributes a zero change, so the first value is available once
/// `period` closes exist. Output starts at index `period - 1` of the input.
/// A window with gains but no losses yields 100; a completely flat window yields 50.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len());
    let mut losses = Vec::with_capacity(data.len());
    gains.push(0.0);
    losses.push(0.0);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let avg_gains = sma(&gains, period);
    let avg_losses = sma(&losses, period);

    avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(&avg_gain, &avg_loss)| rsi_from_averages(avg_gain, avg_loss))
        .collect()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}

/// Percentage change from `previous` to `current`.
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Distance of `current` below (negative) or at the all-time high, in percent.
pub fn ath_distance_pct(current: f64, ath: f64) -> Option<f64> {
    pct_change(current, ath)
}

/// Highest `high` across all bars.
pub fn all_time_high(bars: &[Bar]) -> Option<f64> {
    bars.iter().map(|b| b.high).reduce(f64::max)
}

/// Lowest `low` across the most recent `lookback` bars.
pub fn range_low(bars: &[Bar], lookback: usize) -> Option<f64> {
    if lookback == 0 {
        return None;
    }
    let recent = &bars[bars.len().saturating_sub(lookback)..];
    recent.iter().map(|b| b.low).reduce(f64::min)
}
