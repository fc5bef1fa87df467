//! `reqwest`-backed [`Fetcher`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::{Duration, Instant};

use super::config::FetchConfig;
use super::protocols::{FetchResult, Fetcher};
use crate::errors::{ScoutError, TransportError};

/// HTTP fetcher over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Builds a client from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, ScoutError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScoutError::Config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScoutError::Config(format!("invalid value for header '{key}': {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ScoutError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Other(err.to_string())
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn head(&self, url: &str, timeout: Duration) -> Result<FetchResult, TransportError> {
        let start = Instant::now();
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        Ok(FetchResult {
            status_code: response.status().as_u16(),
            content_type: content_type(&response),
            body: Vec::new(),
            final_url: response.url().to_string(),
            duration_ms: elapsed_ms(start),
        })
    }

    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<FetchResult, TransportError> {
        let start = Instant::now();
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        if response
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(TransportError::TooLarge(max_bytes));
        }

        let status_code = response.status().as_u16();
        let content_type = content_type(&response);
        let final_url = response.url().to_string();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(&e))? {
            if body.len() + chunk.len() > max_bytes {
                return Err(TransportError::TooLarge(max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResult {
            status_code,
            content_type,
            body,
            final_url,
            duration_ms: elapsed_ms(start),
        })
    }
}
