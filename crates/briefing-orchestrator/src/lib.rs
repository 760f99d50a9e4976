//! Briefing pipeline: gathers market data, derives indicators, writes the
//! text report and renders the chart.

use std::sync::Arc;

use briefing_core::{Bar, BriefingProfile, FetchError, Headline, Report};
use chrono::{DateTime, Utc};
use market_data::{fetch_quotes, PriceHistorySource, QuoteSource};
use news_feed::HeadlineSource;
use technical_analysis::{chart_overlays, derive_indicators};
use thiserror::Error;

pub mod chart;
pub mod format;
pub mod narrative;

pub use chart::{render_chart, render_chart_base64, ChartError, CHART_WINDOW};
pub use narrative::compose_report;
pub use technical_analysis::ChartOverlays;

/// Renders the chart for the visible bars and returns it base64-encoded.
pub type RenderFn = fn(&[Bar], &ChartOverlays, &str) -> Result<String, ChartError>;

#[derive(Error, Debug)]
pub enum BriefingError {
    #[error("price history unavailable: {0}")]
    History(FetchError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("chart task failed: {0}")]
    Task(String),
}

pub struct BriefingPipeline {
    profile: BriefingProfile,
    history: Arc<dyn PriceHistorySource>,
    quotes: Arc<dyn QuoteSource>,
    news: Option<Arc<dyn HeadlineSource>>,
    renderer: RenderFn,
}

impl BriefingPipeline {
    pub fn new(
        profile: BriefingProfile,
        history: Arc<dyn PriceHistorySource>,
        quotes: Arc<dyn QuoteSource>,
    ) -> Self {
        Self {
            profile,
            history,
            quotes,
            news: None,
            renderer: render_chart_base64,
        }
    }

    pub fn with_news(mut self, news: Arc<dyn HeadlineSource>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn with_renderer(mut self, renderer: RenderFn) -> Self {
        self.renderer = renderer;
        self
    }

    async fn headlines(&self) -> Option<Vec<Headline>> {
        let news = self.news.as_ref()?;
        match news.fetch_headlines().await {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(error = %e, "Headlines unavailable");
                None
            }
        }
    }

    /// Build one briefing as of `now`.
    ///
    /// Only a missing price history or a failed chart is fatal; quote and
    /// headline failures degrade to placeholders in the text.
    pub async fn generate(&self, now: DateTime<Utc>) -> Result<Report, BriefingError> {
        let series = self
            .history
            .fetch_history()
            .await
            .map_err(BriefingError::History)?;
        tracing::debug!(bars = series.len(), "Fetched price history");

        let indicators = derive_indicators(&series);
        let quotes = fetch_quotes(self.quotes.as_ref(), &self.profile.instruments).await;
        let headlines = self.headlines().await;

        let date = now.date_naive();
        let message = compose_report(&self.profile, date, &indicators, &quotes, headlines.as_deref());

        let overlays = chart_overlays(&series, &indicators, CHART_WINDOW);
        let bars = series.tail(CHART_WINDOW).to_vec();
        let title = format!("BTC/USD | {}", date.format("%d %b"));
        let renderer = self.renderer;

        let image_base64 = tokio::task::spawn_blocking(move || renderer(&bars, &overlays, &title))
            .await
            .map_err(|e| BriefingError::Task(e.to_string()))??;

        tracing::info!(
            price = indicators.price,
            quotes = quotes.available_count(),
            headlines = headlines.as_ref().map_or(0, Vec::len),
            "Briefing generated"
        );

        Ok(Report {
            message,
            image_base64,
        })
    }

    /// Like [`generate`](Self::generate), but a fatal error becomes a report whose
    /// message carries the reason and whose image is empty.
    pub async fn briefing(&self, now: DateTime<Utc>) -> Report {
        match self.generate(now).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Briefing failed");
                Report::failure(format!("Briefing error: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use briefing_core::PriceSeries;
    use chrono::{Duration, TimeZone};
    use market_data::RawQuote;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedHistory(Result<Vec<Bar>, FetchError>);

    #[async_trait]
    impl PriceHistorySource for FixedHistory {
        async fn fetch_history(&self) -> Result<PriceSeries, FetchError> {
            let bars = self.0.clone()?;
            Ok(PriceSeries::new(bars)?)
        }
    }

    struct FixedQuotes;

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, FetchError> {
            match symbol {
                "ETH-USD" => Ok(RawQuote { price: 3_000.0, previous_close: Some(2_400.0) }),
                "MSTR" => Err(FetchError::Status(500)),
                "^GSPC" => Ok(RawQuote { price: 5_000.0, previous_close: Some(5_000.0) }),
                _ => Ok(RawQuote { price: 2_400.0, previous_close: None }),
            }
        }
    }

    struct FixedHeadlines(Result<Vec<Headline>, FetchError>);

    #[async_trait]
    impl HeadlineSource for FixedHeadlines {
        async fn fetch_headlines(&self) -> Result<Vec<Headline>, FetchError> {
            self.0.clone()
        }
    }

    fn zigzag(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 1_000.0 + 10.0 * i as f64 + if i % 2 == 1 { 12.0 } else { 0.0 };
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close - 5.0,
                    high: close + 50.0,
                    low: close - 50.0,
                    close,
                    volume: 100.0,
                }
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    fn fake_render(bars: &[Bar], overlays: &ChartOverlays, title: &str) -> Result<String, ChartError> {
        assert_eq!(bars.len(), overlays.short_sma.len());
        Ok(format!("{}:{}", title, bars.len()))
    }

    fn pipeline(bars: Result<Vec<Bar>, FetchError>) -> BriefingPipeline {
        BriefingPipeline::new(
            BriefingProfile::v16(),
            Arc::new(FixedHistory(bars)),
            Arc::new(FixedQuotes),
        )
        .with_renderer(fake_render)
    }

    #[tokio::test]
    async fn test_generate_full_report() {
        let news = FixedHeadlines(Ok(vec![Headline {
            title: "Bitcoin tops 9K".to_string(),
            link: "https://example.com/btc".to_string(),
        }]));
        let pipeline = pipeline(Ok(zigzag(800))).with_news(Arc::new(news));

        let report = pipeline.generate(now()).await.unwrap();
        let text = &report.message;

        assert!(text.starts_with("🦅 *BRIEFING V16 – 10 Mar*\n"));
        assert!(text.contains("⚠️ OVERBOUGHT: correction risk. 2Y trend: BULLISH 🐂"));
        assert!(text.contains("• ₿ BTC: $9,002 (+0.24%)\n"));
        assert!(text.contains("• ETH: $3,000 (+25.00%)\n"));
        assert!(text.contains("• MSTR: n/a\n"));
        assert!(text.contains("• SP500: 5,000 (+0.00%)\n"));
        assert!(text.contains("• GOLD: $2,400\n"));
        assert!(text.contains("• RSI (14): 91.7\n"));
        assert!(text.contains("• 2Y mean: $5,351\n"));
        assert!(text.contains("• Support: $8,350\n"));
        assert!(text.contains("• From ATH: -0.55%\n"));
        assert!(text.ends_with("📰 Bitcoin tops 9K\n🔗 https://example.com/btc\n"));

        assert_eq!(report.image_base64, "BTC/USD | 10 Mar:150");
    }

    #[tokio::test]
    async fn test_short_history_still_reports() {
        let report = pipeline(Ok(zigzag(10))).generate(now()).await.unwrap();

        assert!(report.message.contains("❔ NO SIGNAL: RSI unavailable. 2Y trend: UNDETERMINED"));
        assert!(report.message.contains("• 2Y mean: n/a\n"));
        assert!(report.message.ends_with("No headlines available.\n"));
        assert_eq!(report.image_base64, "BTC/USD | 10 Mar:10");
    }

    static EMPTY_RENDERS: AtomicUsize = AtomicUsize::new(0);

    fn counting_render(_: &[Bar], _: &ChartOverlays, _: &str) -> Result<String, ChartError> {
        EMPTY_RENDERS.fetch_add(1, Ordering::SeqCst);
        Ok(String::new())
    }

    #[tokio::test]
    async fn test_empty_history_is_fatal_without_rendering() {
        let pipeline = pipeline(Ok(Vec::new())).with_renderer(counting_render);

        let err = pipeline.generate(now()).await.unwrap_err();
        assert!(matches!(err, BriefingError::History(FetchError::Empty)));

        let report = pipeline.briefing(now()).await;
        assert!(report.is_failure());
        assert_eq!(report.message, "Briefing error: price history unavailable: no data returned");
        assert!(report.image_base64.is_empty());
        assert_eq!(EMPTY_RENDERS.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_failure_reason_reported() {
        let report = pipeline(Err(FetchError::Timeout)).briefing(now()).await;

        assert_eq!(report.message, "Briefing error: price history unavailable: request timed out");
        assert!(report.image_base64.is_empty());
    }

    #[tokio::test]
    async fn test_headline_failure_degrades() {
        let news = FixedHeadlines(Err(FetchError::Status(503)));
        let pipeline = pipeline(Ok(zigzag(100))).with_news(Arc::new(news));

        let report = pipeline.generate(now()).await.unwrap();
        assert!(report.message.ends_with("4️⃣ *HEADLINES*\nNo headlines available.\n"));
    }

    fn failing_render(_: &[Bar], _: &ChartOverlays, _: &str) -> Result<String, ChartError> {
        Err(ChartError::Render("backend gone".to_string()))
    }

    #[tokio::test]
    async fn test_chart_failure_is_fatal() {
        let pipeline = pipeline(Ok(zigzag(100))).with_renderer(failing_render);

        let report = pipeline.briefing(now()).await;
        assert_eq!(report.message, "Briefing error: chart rendering failed: backend gone");
    }

    #[tokio::test]
    async fn test_real_chart_is_png() {
        let pipeline = BriefingPipeline::new(
            BriefingProfile::compact(),
            Arc::new(FixedHistory(Ok(zigzag(200)))),
            Arc::new(FixedQuotes),
        );

        let report = pipeline.generate(now()).await.unwrap();
        assert!(report.image_base64.starts_with("iVBORw0KGgo"));
    }
}
