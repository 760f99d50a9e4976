//! Headline fetching: RSS download, parsing, title clean-up and optional link shortening.

use std::time::Duration;

use async_trait::async_trait;
use briefing_core::{FetchError, Headline, NewsConfig};
use market_data::http::get_bytes;
use reqwest::Client;

pub mod rss;
pub mod shortener;

pub use rss::{parse_feed, truncate_title};
pub use shortener::LinkShortener;

const FEED_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_headlines(&self) -> Result<Vec<Headline>, FetchError>;
}

pub struct NewsFetcher {
    client: Client,
    config: NewsConfig,
    shortener: Option<LinkShortener>,
}

impl NewsFetcher {
    pub fn new(client: Client, config: NewsConfig) -> Self {
        let shortener = config
            .shortener_url
            .as_ref()
            .map(|url| LinkShortener::new(client.clone(), url.clone()));
        Self {
            client,
            config,
            shortener,
        }
    }
}

#[async_trait]
impl HeadlineSource for NewsFetcher {
    async fn fetch_headlines(&self) -> Result<Vec<Headline>, FetchError> {
        let body = get_bytes(self.client.get(&self.config.feed_url), FEED_TIMEOUT).await?;
        let xml = String::from_utf8_lossy(&body);
        let items = parse_feed(&xml, self.config.headline_count)?;

        let delimiter = self.config.title_delimiter.as_deref();
        let mut headlines = Vec::with_capacity(items.len());
        for item in items {
            let link = match &self.shortener {
                Some(shortener) => shortener.shorten(&item.link).await,
                None => item.link,
            };
            headlines.push(Headline {
                title: truncate_title(&item.title, delimiter),
                link,
            });
        }

        tracing::debug!(count = headlines.len(), feed = %self.config.feed_url, "Fetched headlines");
        Ok(headlines)
    }
}
