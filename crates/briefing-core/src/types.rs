use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SeriesError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Chronologically ordered daily bars. Never empty once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        if let Some(i) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(SeriesError::OutOfOrder { index: i + 1 });
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> &Bar {
        // non-empty by construction
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The most recent `n` bars (or all of them when the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}

/// Scalar indicator snapshot for the latest bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndicators {
    pub price: f64,
    /// Day-over-day change; undefined with a single bar or a zero previous close.
    pub change_pct: Option<f64>,
    pub ath: f64,
    pub ath_distance_pct: Option<f64>,
    pub rsi: Option<f64>,
    /// Long rolling mean (730 bars); undefined until enough history exists.
    pub long_sma: Option<f64>,
    pub range_low: f64,
}

/// An instrument quoted alongside BTC in the briefing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Upstream ticker, e.g. `ETH-USD` or `^GSPC`
    pub symbol: String,
    /// Label printed in the report
    pub label: String,
    /// Decimal places used when printing the price
    #[serde(default)]
    pub price_decimals: usize,
    /// Prefix the price with `$`
    #[serde(default = "default_true")]
    pub currency: bool,
    #[serde(default = "default_true")]
    pub show_change: bool,
}

fn default_true() -> bool {
    true
}

impl Instrument {
    pub fn new(symbol: &str, label: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            label: label.to_string(),
            price_decimals: 0,
            currency: true,
            show_change: true,
        }
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.price_decimals = decimals;
        self
    }

    pub fn without_currency(mut self) -> Self {
        self.currency = false;
        self
    }

    pub fn without_change(mut self) -> Self {
        self.show_change = false;
        self
    }
}

/// Last price for one instrument, or an explicit marker when it could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Quote {
    Available {
        price: f64,
        /// Change vs previous close; `None` when the previous close is unknown or zero
        change_pct: Option<f64>,
    },
    Unavailable { reason: String },
}

impl Quote {
    pub fn is_available(&self) -> bool {
        matches!(self, Quote::Available { .. })
    }
}

/// Quotes in profile order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub entries: Vec<(Instrument, Quote)>,
}

impl QuoteSnapshot {
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.entries
            .iter()
            .find(|(instrument, _)| instrument.symbol == symbol)
            .map(|(_, quote)| quote)
    }

    pub fn available_count(&self) -> usize {
        self.entries.iter().filter(|(_, q)| q.is_available()).count()
    }
}

/// News headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

/// The `/briefing` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub message: String,
    pub image_base64: String,
}

impl Report {
    /// Error-flagged report: message only, no image.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            image_base64: String::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.image_base64.is_empty()
    }
}
