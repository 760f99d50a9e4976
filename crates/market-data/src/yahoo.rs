use std::time::Duration;

use async_trait::async_trait;
use briefing_core::FetchError;
use reqwest::Client;

use crate::http::get_text;
use crate::{QuoteSource, RawQuote};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Last price / previous close from the Yahoo Finance chart endpoint.
///
/// Uses a one-day range, where `meta.previousClose` is the prior session's close.
#[derive(Clone)]
pub struct YahooQuoteClient {
    client: Client,
    base_url: String,
}

impl YahooQuoteClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        let request = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")]);

        let body = get_text(request, QUOTE_TIMEOUT).await?;
        parse_chart_quote(&body)
    }
}

/// Extract `regularMarketPrice` and the previous close from a chart payload.
pub fn parse_chart_quote(body: &str) -> Result<RawQuote, FetchError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let chart = json
        .get("chart")
        .ok_or_else(|| FetchError::Malformed("missing chart".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(FetchError::Upstream(description.to_string()));
    }

    let result = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(FetchError::Empty)?;
    let meta = result.get("meta").ok_or(FetchError::Empty)?;

    let price = meta
        .get("regularMarketPrice")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| FetchError::Malformed("missing regularMarketPrice".to_string()))?;

    let previous_close = meta
        .get("previousClose")
        .and_then(|v| v.as_f64())
        .or_else(|| prior_session_close(result))
        .or_else(|| meta.get("chartPreviousClose").and_then(|v| v.as_f64()));

    Ok(RawQuote { price, previous_close })
}

/// Second-to-last daily close of a multi-day payload, skipping null sessions.
fn prior_session_close(result: &serde_json::Value) -> Option<f64> {
    let closes: Vec<f64> = result
        .get("indicators")?
        .get("quote")?
        .get(0)?
        .get("close")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_f64())
        .collect();
    closes.len().checked_sub(2).map(|i| closes[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        routing::get,
        Router,
    };
    use std::collections::HashMap;

    #[test]
    fn test_parse_chart_quote() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"MSTR","regularMarketPrice":412.5,"previousClose":400.0,"chartPreviousClose":400.0}}],"error":null}}"#;
        let quote = parse_chart_quote(body).unwrap();

        assert_eq!(quote, RawQuote { price: 412.5, previous_close: Some(400.0) });
    }

    #[test]
    fn test_previous_close_preferred_over_window_start() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":10.0,"previousClose":8.0,"chartPreviousClose":5.0}}],"error":null}}"#;
        assert_eq!(parse_chart_quote(body).unwrap().previous_close, Some(8.0));
    }

    #[test]
    fn test_multi_day_payload_uses_prior_session_close() {
        let body = r#"{"chart":{"result":[{
            "meta":{"regularMarketPrice":110.0,"chartPreviousClose":80.0},
            "indicators":{"quote":[{"close":[90.0,95.0,100.0,null,105.0,110.0]}]}
        }],"error":null}}"#;
        let quote = parse_chart_quote(body).unwrap();

        assert_eq!(quote.previous_close, Some(105.0));
        let change = technical_analysis::pct_change(quote.price, 105.0).unwrap();
        assert!((change - 4.761_904_761_904_762).abs() < 1e-9);
    }

    #[test]
    fn test_single_session_falls_back_to_chart_previous_close() {
        let body = r#"{"chart":{"result":[{
            "meta":{"regularMarketPrice":3000.0,"chartPreviousClose":2400.0},
            "indicators":{"quote":[{"close":[3000.0]}]}
        }],"error":null}}"#;
        assert_eq!(parse_chart_quote(body).unwrap().previous_close, Some(2400.0));
    }

    #[test]
    fn test_parse_upstream_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(
            parse_chart_quote(body).unwrap_err(),
            FetchError::Upstream("No data found, symbol may be delisted".to_string())
        );
    }

    #[test]
    fn test_parse_missing_price_is_malformed() {
        let body = r#"{"chart":{"result":[{"meta":{"chartPreviousClose":1.0}}],"error":null}}"#;
        assert!(matches!(parse_chart_quote(body), Err(FetchError::Malformed(_))));

        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert_eq!(parse_chart_quote(body).unwrap_err(), FetchError::Empty);
    }

    #[tokio::test]
    async fn test_fetch_quote_requests_single_day() {
        let app = Router::new().route(
            "/v8/finance/chart/:symbol",
            get(|Path(symbol): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                let previous = match q.get("range").map(String::as_str) {
                    Some("1d") => 4000.0,
                    _ => 1.0,
                };
                format!(
                    r#"{{"chart":{{"result":[{{"meta":{{"symbol":"{}","regularMarketPrice":5000.0,"previousClose":{}}}}}],"error":null}}}}"#,
                    symbol, previous
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = YahooQuoteClient::new(Client::new(), format!("http://{}", addr));
        let quote = client.fetch_quote("^GSPC").await.unwrap();
        assert_eq!(quote, RawQuote { price: 5000.0, previous_close: Some(4000.0) });
    }
}
