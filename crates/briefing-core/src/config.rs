use serde::{Deserialize, Serialize};

use crate::{ConfigError, Instrument};

pub const MAX_HEADLINES: usize = 10;

/// Where headlines come from and how they are post-processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsConfig {
    pub feed_url: String,
    pub headline_count: usize,
    /// Titles are cut at the first occurrence of this string (e.g. `" - "` before a source name)
    pub title_delimiter: Option<String>,
    /// Plain-text shortening endpoint; the link is appended as the `url` query parameter
    pub shortener_url: Option<String>,
}

/// One variant of the briefing: which instruments to quote, which feed to read, how to title it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingProfile {
    pub name: String,
    pub title: String,
    pub instruments: Vec<Instrument>,
    pub news: NewsConfig,
}

impl BriefingProfile {
    /// Ethereum, MicroStrategy, S&P 500 and gold, with four Yahoo Finance headlines.
    pub fn v16() -> Self {
        Self {
            name: "v16".to_string(),
            title: "BRIEFING V16".to_string(),
            instruments: vec![
                Instrument::new("ETH-USD", "ETH"),
                Instrument::new("MSTR", "MSTR").with_decimals(2),
                Instrument::new("^GSPC", "SP500").without_currency(),
                Instrument::new("GC=F", "GOLD").without_change(),
            ],
            news: NewsConfig {
                feed_url: "https://finance.yahoo.com/news/rssindex".to_string(),
                headline_count: 4,
                title_delimiter: None,
                shortener_url: None,
            },
        }
    }

    /// Crypto-focused variant: three CoinDesk headlines with shortened links.
    pub fn compact() -> Self {
        Self {
            name: "compact".to_string(),
            title: "BTC BRIEFING".to_string(),
            instruments: vec![
                Instrument::new("ETH-USD", "ETH"),
                Instrument::new("MSTR", "MSTR").with_decimals(2),
                Instrument::new("^IXIC", "NASDAQ").without_currency(),
            ],
            news: NewsConfig {
                feed_url: "https://www.coindesk.com/arc/outboundfeeds/rss/".to_string(),
                headline_count: 3,
                title_delimiter: Some(" - ".to_string()),
                shortener_url: Some("https://is.gd/create.php?format=simple".to_string()),
            },
        }
    }

    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "v16" | "default" => Ok(Self::v16()),
            "compact" => Ok(Self::compact()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}
