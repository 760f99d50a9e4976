use std::time::Duration;

use async_trait::async_trait;
use briefing_core::{Bar, FetchError, PriceSeries};
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::http::get_text;
use crate::PriceHistorySource;

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";
const HISTORY_TIMEOUT: Duration = Duration::from_secs(10);
/// Enough for the 730-day mean plus a visible chart window.
const HISTORY_LIMIT: u32 = 800;

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data")]
    bars: Vec<HistoBar>,
}

#[derive(Debug, Deserialize)]
struct HistoBar {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "volumefrom")]
    volume_from: f64,
}

/// Daily history from the CryptoCompare `histoday` endpoint.
#[derive(Clone)]
pub struct CryptoCompareClient {
    client: Client,
    base_url: String,
    from_symbol: String,
    to_symbol: String,
}

impl CryptoCompareClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            from_symbol: "BTC".to_string(),
            to_symbol: "USD".to_string(),
        }
    }
}

#[async_trait]
impl PriceHistorySource for CryptoCompareClient {
    async fn fetch_history(&self) -> Result<PriceSeries, FetchError> {
        let url = format!("{}/data/v2/histoday", self.base_url);
        let limit = HISTORY_LIMIT.to_string();
        let request = self.client.get(&url).query(&[
            ("fsym", self.from_symbol.as_str()),
            ("tsym", self.to_symbol.as_str()),
            ("limit", limit.as_str()),
        ]);

        let body = get_text(request, HISTORY_TIMEOUT).await?;
        let series = parse_histoday(&body)?;

        tracing::debug!(bars = series.len(), "Fetched {} history", self.from_symbol);
        Ok(series)
    }
}

/// Decode a `histoday` payload into a validated series.
pub fn parse_histoday(body: &str) -> Result<PriceSeries, FetchError> {
    let response: HistoResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if !response.response.eq_ignore_ascii_case("success") {
        return Err(FetchError::Upstream(response.message));
    }

    let data = response
        .data
        .ok_or_else(|| FetchError::Malformed("missing Data".to_string()))?;
    let data: HistoData =
        serde_json::from_value(data).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let bars = data
        .bars
        .into_iter()
        .map(|b| {
            let timestamp = DateTime::from_timestamp(b.time, 0)
                .ok_or_else(|| FetchError::Malformed(format!("bad timestamp {}", b.time)))?;
            Ok(Bar {
                timestamp,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume_from,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(PriceSeries::new(bars)?)
}
