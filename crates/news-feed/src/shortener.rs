use std::time::Duration;

use market_data::http::get_text;
use reqwest::Client;

const SHORTEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Plain-text URL shortener (is.gd style: `GET endpoint&url=<link>` → short URL body).
#[derive(Clone)]
pub struct LinkShortener {
    client: Client,
    endpoint: String,
}

impl LinkShortener {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the shortened link, or the original one if the service does not answer
    /// with a usable URL in time.
    pub async fn shorten(&self, link: &str) -> String {
        let request = self.client.get(&self.endpoint).query(&[("url", link)]);

        match get_text(request, SHORTEN_TIMEOUT).await {
            Ok(body) => {
                let short = body.trim();
                if short.starts_with("http://") || short.starts_with("https://") {
                    short.to_string()
                } else {
                    tracing::debug!(link, response = short, "Shortener returned no URL");
                    link.to_string()
                }
            }
            Err(e) => {
                tracing::debug!(link, error = %e, "Shortener failed, keeping original link");
                link.to_string()
            }
        }
    }
}
