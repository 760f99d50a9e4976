use std::net::SocketAddr;
use std::path::PathBuf;

use briefing_core::{BriefingProfile, ConfigError, MAX_HEADLINES};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_PROFILE: &str = "v16";

/// Server configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct BriefingConfig {
    pub bind_addr: SocketAddr,
    pub profile: BriefingProfile,
    pub cryptocompare_base_url: String,
    pub yahoo_base_url: String,
    /// TrueType font for chart text; common system fonts are tried when unset
    pub chart_font: Option<PathBuf>,
}

impl BriefingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = get("BRIEFING_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BRIEFING_BIND_ADDR",
            value: bind.clone(),
        })?;

        let mut profile =
            BriefingProfile::by_name(&get("BRIEFING_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.to_string()))?;

        if let Some(feed_url) = get("NEWS_FEED_URL") {
            profile.news.feed_url = feed_url;
        }

        if let Some(shortener) = get("URL_SHORTENER_URL") {
            profile.news.shortener_url = if shortener.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(shortener)
            };
        }

        if let Some(count) = get("HEADLINE_COUNT") {
            profile.news.headline_count = count
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_HEADLINES).contains(n))
                .ok_or(ConfigError::InvalidValue {
                    key: "HEADLINE_COUNT",
                    value: count,
                })?;
        }

        Ok(Self {
            bind_addr,
            profile,
            cryptocompare_base_url: get("CRYPTOCOMPARE_BASE_URL")
                .unwrap_or_else(|| market_data::cryptocompare::DEFAULT_BASE_URL.to_string()),
            yahoo_base_url: get("YAHOO_BASE_URL")
                .unwrap_or_else(|| market_data::yahoo::DEFAULT_BASE_URL.to_string()),
            chart_font: get("BRIEFING_CHART_FONT").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<BriefingConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BriefingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.profile.name, "v16");
        assert_eq!(config.profile.news.headline_count, 4);
        assert_eq!(config.cryptocompare_base_url, "https://min-api.cryptocompare.com");
        assert_eq!(config.yahoo_base_url, "https://query1.finance.yahoo.com");
        assert!(config.chart_font.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("BRIEFING_BIND_ADDR", "127.0.0.1:9000"),
            ("BRIEFING_PROFILE", "compact"),
            ("NEWS_FEED_URL", "http://localhost/feed.xml"),
            ("HEADLINE_COUNT", "10"),
            ("URL_SHORTENER_URL", "none"),
            ("BRIEFING_CHART_FONT", "/opt/fonts/Inter.ttf"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.profile.name, "compact");
        assert_eq!(config.profile.news.feed_url, "http://localhost/feed.xml");
        assert_eq!(config.profile.news.headline_count, 10);
        assert_eq!(config.profile.news.shortener_url, None);
        assert_eq!(config.chart_font, Some(PathBuf::from("/opt/fonts/Inter.ttf")));
    }

    #[test]
    fn test_shortener_enabled_on_default_profile() {
        let config = from_pairs(&[("URL_SHORTENER_URL", "http://short.local/api")]).unwrap();
        assert_eq!(
            config.profile.news.shortener_url.as_deref(),
            Some("http://short.local/api")
        );
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = from_pairs(&[("BRIEFING_PROFILE", ""), ("HEADLINE_COUNT", "  ")]).unwrap();
        assert_eq!(config.profile.name, "v16");
        assert_eq!(config.profile.news.headline_count, 4);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            from_pairs(&[("HEADLINE_COUNT", "0")]),
            Err(ConfigError::InvalidValue { key: "HEADLINE_COUNT", .. })
        ));
        assert!(matches!(
            from_pairs(&[("HEADLINE_COUNT", "11")]),
            Err(ConfigError::InvalidValue { key: "HEADLINE_COUNT", .. })
        ));
        assert!(matches!(
            from_pairs(&[("BRIEFING_BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidValue { key: "BRIEFING_BIND_ADDR", .. })
        ));
        assert!(matches!(
            from_pairs(&[("BRIEFING_PROFILE", "v15")]),
            Err(ConfigError::UnknownProfile(_))
        ));
    }
}
