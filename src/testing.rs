//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::models::{Article, RawSearchResult};
use crate::normalize::{ExtractionStrategy, Extractor};
use crate::pipeline::{Controller, IngestSettings, SessionState};
use crate::providers::{DeliverySink, PageFetcher, SearchProvider, Summarizer};

#[derive(Default)]
pub struct FakeSearch {
    pub results: Vec<RawSearchResult>,
    pub fail: bool,
}

impl SearchProvider for FakeSearch {
    async fn fetch_articles(&self, _query: &str, count: usize) -> Result<Vec<RawSearchResult>> {
        if self.fail {
            return Err(PipelineError::Provider("missing NEWS_API_KEY".to_string()));
        }
        Ok(self.results.iter().take(count).cloned().collect())
    }
}

#[derive(Default)]
pub struct FakePages {
    pub pages: HashMap<String, String>,
}

impl PageFetcher for FakePages {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PipelineError::Fetch("Could not fetch URL: 404 Not Found".to_string()))
    }
}

/// Answers `sum:<text>`; fails or answers blank for the configured inputs.
#[derive(Default)]
pub struct FakeSummarizer {
    pub calls: Cell<usize>,
    pub fail_on: Option<String>,
    pub blank_on: Option<String>,
}

impl Summarizer for FakeSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on.as_deref() == Some(text) {
            return Err(PipelineError::Summarization("HF inference failed: 503".to_string()));
        }
        if self.blank_on.as_deref() == Some(text) {
            return Ok("  ".to_string());
        }
        Ok(format!("sum:{text}"))
    }
}

#[derive(Default)]
pub struct FakeSink {
    pub fail: Cell<bool>,
    pub deliveries: RefCell<Vec<Vec<Article>>>,
}

impl DeliverySink for FakeSink {
    async fn send(&self, articles: &[Article]) -> Result<()> {
        if self.fail.get() {
            return Err(PipelineError::Delivery("TG error [400]: chat not found".to_string()));
        }
        self.deliveries.borrow_mut().push(articles.to_vec());
        Ok(())
    }
}

pub type TestController = Controller<FakeSearch, FakePages, FakeSummarizer, FakeSink>;

pub fn raw(title: &str, url: &str, description: &str) -> RawSearchResult {
    RawSearchResult {
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        description: Some(description.to_string()),
        ..Default::default()
    }
}

/// Search results `One`, `Two`, `Three` at `http://1..3` with descriptions
/// `first`, `second`, `third`.
pub fn three_results() -> FakeSearch {
    FakeSearch {
        results: vec![
            raw("One", "http://1", "first"),
            raw("Two", "http://2", "second"),
            raw("Three", "http://3", "third"),
        ],
        fail: false,
    }
}

pub fn controller_with(search: FakeSearch, summarizer: FakeSummarizer) -> TestController {
    controller_from(search, FakePages::default(), summarizer, SessionState::default())
}

pub fn controller_from(
    search: FakeSearch,
    pages: FakePages,
    summarizer: FakeSummarizer,
    state: SessionState,
) -> TestController {
    Controller::new(
        search,
        pages,
        summarizer,
        FakeSink::default(),
        Extractor::from(ExtractionStrategy::Pattern),
        IngestSettings::default(),
        state,
    )
}
