//! Page fetcher for single-article ingestion.

use reqwest::Client;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use super::PageFetcher;
use crate::error::{PipelineError, Result};
use crate::normalize::page_text;

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "Page request returned non-success status");
            return Err(PipelineError::Fetch(format!("Could not fetch URL: {status}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| PipelineError::Fetch(format!("could not read body: {e}")))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        page_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        // Port 9 (discard) on loopback refuses connections on CI machines.
        let fetcher = HttpPageFetcher::new(Client::new());
        let err = fetcher.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
    }
}
