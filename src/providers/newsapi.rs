//! NewsAPI search provider.
//!
//! Queries the `everything` endpoint for the configured topic, newest first.

use reqwest::Client;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::SearchProvider;
use crate::error::{PipelineError, Result};
use crate::models::{RawSearchResult, SearchResponse};
use crate::utils::truncate_for_log;

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Clone)]
pub struct NewsApiProvider {
    client: Client,
    endpoint: String,
    language: String,
    sort_by: String,
    api_key: Option<String>,
}

impl NewsApiProvider {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        language: impl Into<String>,
        sort_by: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            language: language.into(),
            sort_by: sort_by.into(),
            api_key,
        }
    }
}

/// Interpret a NewsAPI response body.
///
/// NewsAPI reports failures as `{"status": "error", "code", "message"}`,
/// usually alongside a 4xx status.
fn parse_response(http_ok: bool, http_status: &str, body: &str) -> Result<Vec<RawSearchResult>> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::Parse(format!(
            "unexpected search response ({e}): {}",
            truncate_for_log(body, 200)
        ))
    })?;

    if parsed.status.as_deref() == Some("error") || !http_ok {
        let reason = parsed
            .message
            .or(parsed.code)
            .unwrap_or_else(|| format!("HTTP {http_status}"));
        return Err(PipelineError::Provider(reason));
    }

    Ok(parsed.articles)
}

impl SearchProvider for NewsApiProvider {
    #[instrument(level = "info", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_articles(&self, query: &str, count: usize) -> Result<Vec<RawSearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PipelineError::Provider("missing NEWS_API_KEY".to_string()))?;

        let t0 = Instant::now();
        let page_size = count.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("language", self.language.as_str()),
                ("pageSize", page_size.as_str()),
                ("sortBy", self.sort_by.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await
            // The URL carries the API key.
            .map_err(|e| PipelineError::Provider(format!("request failed: {}", e.without_url())))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::Provider(format!("could not read response: {}", e.without_url())))?;

        match parse_response(status.is_success(), status.as_str(), &body) {
            Ok(articles) => {
                info!(
                    count = articles.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Fetched search results"
                );
                Ok(articles)
            }
            Err(e) => {
                warn!(%status, error = %e, "Search request rejected");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_response() {
        let body = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"source": {"id": null, "name": "Wired"}, "title": "A", "url": "https://a"},
                {"source": {"id": null, "name": "Verge"}, "title": "B", "url": "https://b", "description": "d"}
            ]
        }"#;
        let articles = parse_response(true, "200", body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].description.as_deref(), Some("d"));
    }

    #[test]
    fn test_parse_error_envelope_is_provider_error() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        let err = parse_response(false, "401", body).unwrap_err();
        match err {
            PipelineError::Provider(m) => assert_eq!(m, "Your API key is invalid."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_success_without_message() {
        let err = parse_response(false, "500", "{}").unwrap_err();
        match err {
            PipelineError::Provider(m) => assert_eq!(m, "HTTP 500"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        let err = parse_response(true, "200", "<html>gateway</html>").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client = Client::new();
        let provider = NewsApiProvider::new(client, "http://127.0.0.1:9/unused", "en", "publishedAt", None);
        let err = provider.fetch_articles("decentralized AI", 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::Provider(ref m) if m.contains("NEWS_API_KEY")));
    }
}
