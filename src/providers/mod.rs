//! External collaborators of the pipeline.
//!
//! The controller only talks to the outside world through the four traits
//! defined here. Each has one HTTP implementation:
//!
//! | Trait | Implementation | Upstream |
//! |-------|----------------|----------|
//! | [`SearchProvider`] | [`newsapi::NewsApiProvider`] | NewsAPI `/v2/everything` |
//! | [`PageFetcher`] | [`page::HttpPageFetcher`] | arbitrary article URLs |
//! | [`Summarizer`] | [`huggingface::HuggingFaceSummarizer`], [`awful::AwfulSummarizer`] | HF inference API, OpenAI-compatible model |
//! | [`DeliverySink`] | [`telegram::TelegramSink`] | Telegram Bot API |
//!
//! None of the implementations retry. Transport timeouts are configured on
//! the shared [`reqwest::Client`].

use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::models::{Article, RawSearchResult};

pub mod awful;
pub mod huggingface;
pub mod newsapi;
pub mod page;
pub mod telegram;

pub use awful::AwfulSummarizer;
pub use huggingface::HuggingFaceSummarizer;
pub use newsapi::NewsApiProvider;
pub use page::HttpPageFetcher;
pub use telegram::TelegramSink;

/// Source of candidate articles.
pub trait SearchProvider {
    async fn fetch_articles(&self, query: &str, count: usize) -> Result<Vec<RawSearchResult>>;
}

/// Retrieves the raw HTML of a page.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Turns article text into a short summary.
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Delivers summarized articles to readers.
pub trait DeliverySink {
    async fn send(&self, articles: &[Article]) -> Result<()>;
}

/// Summarizer chosen at startup from configuration.
#[derive(Debug)]
pub enum SummarizerBackend {
    HuggingFace(HuggingFaceSummarizer),
    Awful(AwfulSummarizer),
}

impl Summarizer for SummarizerBackend {
    async fn summarize(&self, text: &str) -> Result<String> {
        match self {
            SummarizerBackend::HuggingFace(s) => s.summarize(text).await,
            SummarizerBackend::Awful(s) => s.summarize(text).await,
        }
    }
}

/// Build the HTTP client shared by all collaborators.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(default_user_agent())
        .redirect(Policy::limited(10))
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("could not build HTTP client: {e}")))
}

fn default_user_agent() -> String {
    format!(
        "newsbrief/{} (rust; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}
