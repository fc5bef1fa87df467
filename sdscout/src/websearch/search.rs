//! [`SearchProvider`] implementations.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::config::SearchConfig;
use super::protocols::SearchProvider;
use crate::errors::ScoutError;

/// Serves fixed result lists, optionally keyed by query.
///
/// Useful when candidate URLs come from somewhere other than a live search
/// engine, and in tests. Every query is recorded.
#[derive(Debug, Default)]
pub struct StaticSearchProvider {
    fallback: Vec<String>,
    by_query: HashMap<String, Vec<String>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearchProvider {
    /// Returns `urls` for every query.
    #[must_use]
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fallback: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Returns `urls` for this exact query instead of the fallback list.
    #[must_use]
    pub fn with_results<I, S>(mut self, query: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_query
            .insert(query.into(), urls.into_iter().map(Into::into).collect());
        self
    }

    /// Queries received so far, with the requested count.
    #[must_use]
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    async fn search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<BoxStream<'static, String>, ScoutError> {
        self.queries.lock().push((query.to_string(), count));
        let urls = self
            .by_query
            .get(query)
            .unwrap_or(&self.fallback)
            .iter()
            .take(count)
            .cloned()
            .collect::<Vec<_>>();
        Ok(stream::iter(urls).boxed())
    }
}

/// Calls a JSON search API described by a URL template.
///
/// The template carries `{query}` and optionally `{count}` placeholders, e.g.
/// `https://search.internal/api?q={query}&num={count}`. The response is either
/// a JSON array of URL strings or an object whose `results` (or `items`) array
/// holds strings or objects with a `url` or `link` field.
#[derive(Debug, Clone)]
pub struct EndpointSearchProvider {
    client: reqwest::Client,
    template: String,
    config: SearchConfig,
}

impl EndpointSearchProvider {
    /// Creates a provider from the search configuration.
    pub fn new(config: SearchConfig, user_agent: &str) -> Result<Self, ScoutError> {
        config.validate()?;
        let template = config
            .endpoint
            .clone()
            .ok_or_else(|| ScoutError::Config("search.endpoint is not set".into()))?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScoutError::Client(e.to_string()))?;
        Ok(Self {
            client,
            template,
            config,
        })
    }

    fn request_url(&self, query: &str, count: usize) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.template
            .replace("{query}", &encoded)
            .replace("{count}", &count.to_string())
    }
}

/// Pulls result URLs out of a search API response.
#[must_use]
pub fn parse_search_response(value: &serde_json::Value) -> Vec<String> {
    let items: &[serde_json::Value] = match value {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => map
            .get("results")
            .or_else(|| map.get("items"))
            .and_then(serde_json::Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(url) => Some(url.clone()),
            serde_json::Value::Object(obj) => obj
                .get("url")
                .or_else(|| obj.get("link"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl SearchProvider for EndpointSearchProvider {
    async fn search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<BoxStream<'static, String>, ScoutError> {
        let url = self.request_url(query, count);
        let response = self
            .client
            .get(&url)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| ScoutError::Search(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoutError::Search(format!(
                "search endpoint answered {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScoutError::Search(format!("unreadable search response: {e}")))?;

        let mut urls = parse_search_response(&value);
        urls.truncate(count);
        tracing::debug!(query, results = urls.len(), "Search completed");
        Ok(stream::iter(urls).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_static_provider_fallback_and_per_query() {
        let provider = StaticSearchProvider::new(["https://a.example/1.pdf", "https://a.example/2.pdf"])
            .with_results("special", ["https://b.example/x.pdf"]);

        let all: Vec<String> = provider.search("anything", 50).await.unwrap().collect().await;
        assert_eq!(all.len(), 2);

        let limited: Vec<String> = provider.search("anything", 1).await.unwrap().collect().await;
        assert_eq!(limited, vec!["https://a.example/1.pdf".to_string()]);

        let special: Vec<String> = provider.search("special", 50).await.unwrap().collect().await;
        assert_eq!(special, vec!["https://b.example/x.pdf".to_string()]);

        assert_eq!(provider.queries().len(), 3);
        assert_eq!(provider.queries()[1], ("anything".to_string(), 1));
    }

    #[test]
    fn test_parse_array_of_strings() {
        let value = serde_json::json!(["https://a.example/1.pdf", 3, "https://a.example/2.pdf"]);
        assert_eq!(
            parse_search_response(&value),
            vec!["https://a.example/1.pdf", "https://a.example/2.pdf"]
        );
    }

    #[test]
    fn test_parse_results_objects() {
        let value = serde_json::json!({
            "results": [
                {"url": "https://a.example/1.pdf", "title": "SDS"},
                {"link": "https://b.example/2.pdf"},
                {"title": "no url"}
            ]
        });
        assert_eq!(
            parse_search_response(&value),
            vec!["https://a.example/1.pdf", "https://b.example/2.pdf"]
        );
    }

    #[test]
    fn test_parse_items_and_garbage() {
        let value = serde_json::json!({"items": ["https://a.example/1.pdf"]});
        assert_eq!(parse_search_response(&value).len(), 1);
        assert!(parse_search_response(&serde_json::json!({"other": 1})).is_empty());
        assert!(parse_search_response(&serde_json::json!("text")).is_empty());
    }

    #[test]
    fn test_endpoint_requires_template() {
        let err = EndpointSearchProvider::new(SearchConfig::default(), "test").unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[test]
    fn test_endpoint_rejects_negative_timeout() {
        let config = SearchConfig {
            timeout_seconds: -1.0,
            ..SearchConfig::default().with_endpoint("https://search.local/api?q={query}")
        };
        let err = EndpointSearchProvider::new(config, "test").unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[tokio::test]
    async fn test_endpoint_search() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "\"50-00-0\" filetype:pdf".into()),
                mockito::Matcher::UrlEncoded("num".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"url": "https://a.example/1.pdf"}, {"url": "https://a.example/2.pdf"}, {"url": "https://a.example/3.pdf"}]}"#)
            .create_async()
            .await;

        let config = SearchConfig::default()
            .with_endpoint(format!("{}/search?q={{query}}&num={{count}}", server.url()));
        let provider = EndpointSearchProvider::new(config, "test").unwrap();

        let urls: Vec<String> = provider
            .search("\"50-00-0\" filetype:pdf", 2)
            .await
            .unwrap()
            .collect()
            .await;

        mock.assert_async().await;
        assert_eq!(urls, vec!["https://a.example/1.pdf", "https://a.example/2.pdf"]);
    }

    #[tokio::test]
    async fn test_endpoint_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let config = SearchConfig::default().with_endpoint(format!("{}/search?q={{query}}", server.url()));
        let provider = EndpointSearchProvider::new(config, "test").unwrap();

        let result = provider.search("acetone", 10).await;
        assert!(matches!(result, Err(ScoutError::Search(_))));
    }
}
