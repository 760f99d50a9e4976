//! Outbound market data: BTC daily history and per-instrument quotes.

use async_trait::async_trait;
use briefing_core::{FetchError, Instrument, PriceSeries, Quote, QuoteSnapshot};

pub mod cryptocompare;
pub mod http;
pub mod yahoo;

pub use cryptocompare::CryptoCompareClient;
pub use http::build_http_client;
pub use yahoo::YahooQuoteClient;

/// Source of the daily OHLCV history the briefing is built on.
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn fetch_history(&self) -> Result<PriceSeries, FetchError>;
}

/// Last price and previous close for one upstream symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuote {
    pub price: f64,
    pub previous_close: Option<f64>,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, FetchError>;
}

/// Fetch every instrument one after another. A failure only marks that instrument unavailable.
pub async fn fetch_quotes<Q>(source: &Q, instruments: &[Instrument]) -> QuoteSnapshot
where
    Q: QuoteSource + ?Sized,
{
    let mut entries = Vec::with_capacity(instruments.len());

    for instrument in instruments {
        let quote = match source.fetch_quote(&instrument.symbol).await {
            Ok(raw) => Quote::Available {
                price: raw.price,
                change_pct: raw
                    .previous_close
                    .and_then(|prev| technical_analysis::pct_change(raw.price, prev)),
            },
            Err(e) => {
                tracing::warn!(symbol = %instrument.symbol, error = %e, "Quote unavailable");
                Quote::Unavailable { reason: e.to_string() }
            }
        };
        entries.push((instrument.clone(), quote));
    }

    QuoteSnapshot { entries }
}
