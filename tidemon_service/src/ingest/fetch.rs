/// HTTP client for the forecast pages.
///
/// The collector only depends on the `PageFetcher` trait, so tests can feed
/// it scripted page text without touching the network.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

use crate::model::FetchError;

pub const DEFAULT_USER_AGENT: &str = "NavWatch/1.0 (+tide and weather monitor)";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en;q=0.7";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

/// Retrieves the body of a page as text.
///
/// Implementations are shared between collector worker threads.
pub trait PageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking `reqwest` client with the identifying header set.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, accept_language: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, header_value(accept_language)?);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(HttpFetcher { client })
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw).map_err(|e| FetchError::Transport(format!("invalid header value '{}': {}", raw, e)))
}

/// Maps a `reqwest` failure onto the collector's error vocabulary.
fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if let Some(status) = err.status() {
        FetchError::HttpError(status.as_u16())
    } else if err.is_body() || err.is_decode() {
        FetchError::Body(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpError(response.status().as_u16()));
        }

        response.text().map_err(map_reqwest_error)
    }
}
