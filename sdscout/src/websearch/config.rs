//! Configuration types for searching and fetching.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ScoutError;

/// Converts a configured timeout, rejecting values that are not positive or
/// do not fit a [`Duration`].
pub fn timeout_from_secs(name: &str, seconds: f64) -> Result<Duration, ScoutError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        Ok(_) => Err(ScoutError::Config(format!("{name} must be positive"))),
        Err(e) => Err(ScoutError::Config(format!("{name} = {seconds} is not a usable timeout: {e}"))),
    }
}

fn saturating_timeout(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

/// Configuration for HTTP probing and downloading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for the metadata-only probe, in seconds.
    #[serde(default = "default_timeout")]
    pub probe_timeout_seconds: f64,
    /// Timeout for the document download, in seconds.
    #[serde(default = "default_timeout")]
    pub fetch_timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum document size in bytes.
    #[serde(default = "default_max_size")]
    pub max_response_size: usize,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    concat!("sdscout/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_size() -> usize {
    25 * 1024 * 1024 // 25MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            probe_timeout_seconds: default_timeout(),
            fetch_timeout_seconds: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_response_size: default_max_size(),
            headers: std::collections::HashMap::new(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both the probe and the download timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.probe_timeout_seconds = seconds;
        self.fetch_timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the maximum document size.
    #[must_use]
    pub fn with_max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Probe timeout as Duration. Out-of-range values saturate.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        saturating_timeout(self.probe_timeout_seconds)
    }

    /// Download timeout as Duration. Out-of-range values saturate.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        saturating_timeout(self.fetch_timeout_seconds)
    }

    /// Checks both timeouts.
    pub fn validate(&self) -> Result<(), ScoutError> {
        timeout_from_secs("fetch.probe_timeout_seconds", self.probe_timeout_seconds)?;
        timeout_from_secs("fetch.fetch_timeout_seconds", self.fetch_timeout_seconds)?;
        Ok(())
    }
}

/// Configuration for the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of results requested per query.
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    /// URL template of a JSON search API, with `{query}` and `{count}` placeholders.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Timeout for the search request, in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: f64,
}

fn default_num_results() -> usize {
    50
}

fn default_search_timeout() -> f64 {
    30.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
            endpoint: None,
            timeout_seconds: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    /// Sets the search endpoint template.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the number of requested results.
    #[must_use]
    pub fn with_num_results(mut self, count: usize) -> Self {
        self.num_results = count;
        self
    }

    /// Search timeout as Duration. Out-of-range values saturate.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        saturating_timeout(self.timeout_seconds)
    }

    /// Checks the timeout and the endpoint template.
    pub fn validate(&self) -> Result<(), ScoutError> {
        timeout_from_secs("search.timeout_seconds", self.timeout_seconds)?;
        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.contains("{query}") {
                return Err(ScoutError::Config(format!(
                    "search.endpoint '{endpoint}' lacks a {{query}} placeholder"
                )));
            }
        }
        Ok(())
    }
}
