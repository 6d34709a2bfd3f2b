//! Page retrieval.
//!
//! Provides:
//! - `PageFetcher`: the fetch capability the scheduler depends on.
//! - `HttpFetcher`: reqwest-backed implementation with a browser identity,
//!   redirect following, a per-request timeout and charset-aware decoding.

pub mod decode;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::error::{FetchError, Result};

/// Desktop Chrome identity; some sites serve a different page to unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Fetches a page and returns its decoded text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// HTTP implementation of [`PageFetcher`].
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Size of the page in bytes.
    ///
    /// Tries `HEAD` and trusts a numeric `Content-Length`; otherwise downloads
    /// the body with `GET` and measures it.
    pub async fn page_size(&self, url: &str) -> std::result::Result<u64, FetchError> {
        match self.head_content_length(url).await {
            Some(len) => Ok(len),
            None => {
                let body = self.get_bytes(url).await?.1;
                Ok(body.len() as u64)
            }
        }
    }

    async fn head_content_length(&self, url: &str) -> Option<u64> {
        let response = self
            .client
            .head(url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;

        let length = response
            .headers()
            .get(CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .to_string();
        if length.is_empty() || !length.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        length.parse().ok()
    }

    /// GET the URL and return (content-type, body bytes).
    async fn get_bytes(
        &self,
        url: &str,
    ) -> std::result::Result<(Option<String>, Vec<u8>), FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        debug!(url, bytes = body.len(), "fetched page");
        Ok((content_type, body.to_vec()))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let (content_type, body) = self.get_bytes(url).await?;
        Ok(decode::decode_body(content_type.as_deref(), &body))
    }
}
