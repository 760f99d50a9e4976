//! HTTP surface for the BTC briefing.

use std::sync::Arc;

use axum::{extract::Request, middleware, Router};
use briefing_orchestrator::{chart, BriefingPipeline};
use market_data::{build_http_client, CryptoCompareClient, YahooQuoteClient};
use news_feed::NewsFetcher;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod briefing_routes;
pub mod config;
pub mod request_id;

pub use config::BriefingConfig;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BriefingPipeline>,
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    briefing_routes::briefing_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                    tracing::info_span!(
                        "http",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = tracing::field::Empty,
                    )
                }))
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(cors),
        )
        .with_state(state)
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

/// Wire the live sources for `config` into a pipeline.
pub fn build_pipeline(config: &BriefingConfig) -> anyhow::Result<BriefingPipeline> {
    let client = build_http_client()?;

    let history = CryptoCompareClient::new(client.clone(), config.cryptocompare_base_url.clone());
    let quotes = YahooQuoteClient::new(client.clone(), config.yahoo_base_url.clone());
    let news = NewsFetcher::new(client, config.profile.news.clone());

    Ok(
        BriefingPipeline::new(config.profile.clone(), Arc::new(history), Arc::new(quotes))
            .with_news(Arc::new(news)),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = BriefingConfig::from_env()?;
    chart::init_font(config.chart_font.as_deref());

    let pipeline = build_pipeline(&config)?;
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        profile = %config.profile.name,
        instruments = config.profile.instruments.len(),
        "Briefing server listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
