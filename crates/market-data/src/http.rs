use std::time::Duration;

use briefing_core::FetchError;
use reqwest::{Client, RequestBuilder};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Shared client for every outbound call. Per-request timeouts are set by each caller;
/// the connect timeout here bounds DNS/TCP setup for all of them.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
}

pub fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Send the request with `timeout` and return the body of a 2xx response.
pub async fn get_text(request: RequestBuilder, timeout: Duration) -> Result<String, FetchError> {
    let response = request.timeout(timeout).send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    response.text().await.map_err(map_reqwest_error)
}

pub async fn get_bytes(request: RequestBuilder, timeout: Duration) -> Result<Vec<u8>, FetchError> {
    let response = request.timeout(timeout).send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(body.to_vec())
}
