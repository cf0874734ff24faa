//! Hugging Face inference API summarizer.
//!
//! Posts article text to a hosted summarization model (BART family by
//! default) and returns the first `summary_text` of the response.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::Summarizer;
use crate::error::{PipelineError, Result};
use crate::utils::truncate_for_log;

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "sshleifer/distilbart-cnn-12-6";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    #[serde(default)]
    summary_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    parameters: InferenceParameters,
}

impl HuggingFaceSummarizer {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        max_length: u32,
        min_length: u32,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            parameters: InferenceParameters {
                max_length,
                min_length,
            },
        }
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.model)
    }
}

/// Pull the summary out of an inference response body.
///
/// A successful call returns `[{"summary_text": "..."}]`; anything else,
/// including a blank summary, is a [`PipelineError::Summarization`].
fn parse_summary(body: &str) -> Result<String> {
    let outputs: Vec<SummaryOutput> = serde_json::from_str(body).map_err(|_| {
        PipelineError::Summarization(format!(
            "Unexpected HF response: {}",
            truncate_for_log(body, 200)
        ))
    })?;

    outputs
        .into_iter()
        .next()
        .and_then(|o| o.summary_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::Summarization("Missing summary".to_string()))
}

impl Summarizer for HuggingFaceSummarizer {
    #[instrument(level = "info", skip_all, fields(model = %self.model, input_chars = text.chars().count()))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PipelineError::Summarization("missing HF_API_KEY".to_string()))?;

        let t0 = Instant::now();
        let resp = self
            .client
            .post(self.model_url())
            .bearer_auth(api_key)
            .json(&InferenceRequest {
                inputs: text,
                parameters: self.parameters,
            })
            .send()
            .await
            .map_err(|e| PipelineError::Summarization(format!("request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::Summarization(format!("could not read response: {e}")))?;

        if !status.is_success() {
            warn!(%status, body = %truncate_for_log(&body, 300), "Hugging Face returned an error");
            return Err(PipelineError::Summarization(format!(
                "HF inference failed: {status}"
            )));
        }

        let summary = parse_summary(&body)?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            summary_chars = summary.chars().count(),
            "Summarized article"
        );
        Ok(summary)
    }
}
