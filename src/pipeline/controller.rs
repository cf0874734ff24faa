//! Draft pipeline controller.
//!
//! Owns the [`SessionState`] and drives it through two modes:
//!
//! - **Review**: [`ingest_batch`](Controller::ingest_batch),
//!   [`ingest_by_url`](Controller::ingest_by_url),
//!   [`edit_draft`](Controller::edit_draft), [`remove`](Controller::remove),
//!   [`toggle_select`](Controller::toggle_select), and the transition
//!   [`generate_summaries`](Controller::generate_summaries).
//! - **Summary**: [`edit_summary`](Controller::edit_summary),
//!   [`remove`](Controller::remove), [`send_one`](Controller::send_one),
//!   [`send_all`](Controller::send_all), and the transition
//!   [`back`](Controller::back).
//!
//! Every method takes `&mut self`, so two structural mutations can never be
//! in flight at once. Collaborator failures are logged here and returned
//! unchanged; an operation that fails leaves the state as it found it.

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::state::{Mode, SessionState};
use crate::error::{PipelineError, Result};
use crate::models::{Article, ArticleDraft};
use crate::normalize::{Extractor, normalize_from_html, normalize_from_search_result};
use crate::providers::{DeliverySink, PageFetcher, SearchProvider, Summarizer};

/// What batch ingestion asks the search provider for, and how many
/// summaries may be requested at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub query: String,
    pub count: usize,
    pub concurrency: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            query: "decentralized AI".to_string(),
            count: 5,
            concurrency: 4,
        }
    }
}

pub struct Controller<S, F, Z, D> {
    search: S,
    fetcher: F,
    summarizer: Z,
    sink: D,
    extractor: Extractor,
    settings: IngestSettings,
    state: SessionState,
}

/// Log a failed operation at the controller boundary and pass the error on.
fn surface(operation: &'static str, e: PipelineError) -> PipelineError {
    if e.is_collaborator() {
        error!(operation, error = %e, "Operation failed");
    } else {
        debug!(operation, reason = %e, "Operation rejected");
    }
    e
}

impl<S, F, Z, D> Controller<S, F, Z, D>
where
    S: SearchProvider,
    F: PageFetcher,
    Z: Summarizer,
    D: DeliverySink,
{
    pub fn new(
        search: S,
        fetcher: F,
        summarizer: Z,
        sink: D,
        extractor: Extractor,
        settings: IngestSettings,
        state: SessionState,
    ) -> Self {
        Self {
            search,
            fetcher,
            summarizer,
            sink,
            extractor,
            settings,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn drafts(&self) -> &[ArticleDraft] {
        &self.state.drafts
    }

    pub fn articles(&self) -> &[Article] {
        &self.state.articles
    }

    pub fn sent(&self) -> &[Article] {
        &self.state.sent
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.state.selected
    }

    fn ensure_mode(&self, expected: Mode, operation: &str) -> Result<()> {
        if self.state.mode == expected {
            Ok(())
        } else {
            Err(PipelineError::validation(format!(
                "{operation} is only available in {expected} mode"
            )))
        }
    }

    /// Replace the drafts with a fresh batch from the search provider.
    ///
    /// Results without a url are dropped, urls already in the sent-archive
    /// are filtered out, and duplicate urls keep their first occurrence.
    #[instrument(level = "info", skip(self), fields(query = %self.settings.query, count = self.settings.count))]
    pub async fn ingest_batch(&mut self) -> Result<usize> {
        self.ensure_mode(Mode::Review, "Fetching news")?;

        let raw = self
            .search
            .fetch_articles(&self.settings.query, self.settings.count)
            .await
            .map_err(|e| surface("ingest_batch", e))?;
        let fetched = raw.len();

        let drafts: Vec<ArticleDraft> = raw
            .iter()
            .filter_map(|r| match r.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
                Some(url) => Some(normalize_from_search_result(r, url)),
                None => {
                    warn!(title = ?r.title, "Search result has no url; dropping");
                    None
                }
            })
            .filter(|d| {
                let sent = self.state.was_sent(&d.url);
                if sent {
                    debug!(url = %d.url, "Already sent; skipping");
                }
                !sent
            })
            .unique_by(|d| d.url.clone())
            .collect();

        info!(fetched, kept = drafts.len(), "Ingested batch");
        self.state.drafts = drafts;
        self.state.selected.clear();
        Ok(self.state.drafts.len())
    }

    /// Fetch one page and append it as a draft. Returns the new draft's index.
    #[instrument(level = "info", skip(self))]
    pub async fn ingest_by_url(&mut self, url: &str) -> Result<usize> {
        self.ensure_mode(Mode::Review, "Adding an article")?;

        let url = url.trim();
        if url.is_empty() {
            return Err(PipelineError::validation("Please paste a URL first."));
        }
        let parsed = Url::parse(url)
            .map_err(|e| PipelineError::validation(format!("Not a valid URL ({e}): {url}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PipelineError::validation(format!(
                "Only http and https URLs can be fetched: {url}"
            )));
        }
        if self.state.has_draft(url) {
            return Err(PipelineError::validation(format!(
                "Already in the draft list: {url}"
            )));
        }
        if self.state.was_sent(url) {
            return Err(PipelineError::validation(format!("Already sent: {url}")));
        }

        let html = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| surface("ingest_by_url", e))?;
        let draft = normalize_from_html(&self.extractor, &html, url);
        info!(title = %draft.title, source = %draft.source, "Added draft");
        self.state.drafts.push(draft);
        Ok(self.state.drafts.len() - 1)
    }

    /// Replace a draft's description. Any carried summary is discarded
    /// since it no longer matches the text.
    pub fn edit_draft(&mut self, index: usize, text: &str) -> Result<()> {
        self.ensure_mode(Mode::Review, "Editing a description")?;
        let draft = self
            .state
            .drafts
            .get_mut(index)
            .ok_or_else(|| PipelineError::validation(format!("No draft at index {index}")))?;
        draft.desc = text.trim().to_string();
        draft.summary = None;
        Ok(())
    }

    /// Remove the entry at `index` from the current mode's list.
    #[instrument(level = "info", skip(self), fields(mode = %self.state.mode))]
    pub fn remove(&mut self, index: usize) -> Result<()> {
        match self.state.mode {
            Mode::Review => {
                if index >= self.state.drafts.len() {
                    return Err(PipelineError::validation(format!("No draft at index {index}")));
                }
                let removed = self.state.remove_draft(index);
                info!(url = %removed.url, "Removed draft");
            }
            Mode::Summary => {
                if index >= self.state.articles.len() {
                    return Err(PipelineError::validation(format!(
                        "No article at index {index}"
                    )));
                }
                let removed = self.state.articles.remove(index);
                info!(url = %removed.url, "Removed article");
            }
        }
        Ok(())
    }

    /// Flip whether draft `index` is selected. Returns the new state.
    pub fn toggle_select(&mut self, index: usize) -> Result<bool> {
        self.ensure_mode(Mode::Review, "Selecting")?;
        if index >= self.state.drafts.len() {
            return Err(PipelineError::validation(format!("No draft at index {index}")));
        }
        let selected = if self.state.selected.remove(&index) {
            false
        } else {
            self.state.selected.insert(index)
        };
        Ok(selected)
    }

    /// Summarize the selected drafts and switch to summary mode.
    ///
    /// Drafts carrying a summary from an earlier round reuse it. The batch
    /// is all-or-nothing: if any summary fails, one aggregate error is
    /// returned and the controller stays in review mode untouched.
    #[instrument(level = "info", skip(self, selected), fields(selected_count = selected.len()))]
    pub async fn generate_summaries(&mut self, selected: &[usize]) -> Result<usize> {
        self.ensure_mode(Mode::Review, "Generating summaries")?;
        if selected.is_empty() {
            return Err(surface(
                "generate_summaries",
                PipelineError::validation("select at least one article"),
            ));
        }

        let mut indices: Vec<usize> = Vec::with_capacity(selected.len());
        for &i in selected {
            if i >= self.state.drafts.len() {
                return Err(PipelineError::validation(format!("No draft at index {i}")));
            }
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
        let chosen: Vec<&ArticleDraft> = indices.iter().map(|&i| &self.state.drafts[i]).collect();

        let jobs: Vec<(String, String)> = chosen
            .iter()
            .filter(|d| d.reusable_summary().is_none())
            .map(|d| (d.url.clone(), d.desc.clone()))
            .collect();
        let requested = jobs.len();

        let t0 = Instant::now();
        let summarizer = &self.summarizer;
        let mut outcomes: HashMap<String, Result<String>> = stream::iter(jobs)
            .map(|(url, text)| async move {
                let res = summarizer.summarize(&text).await.and_then(|s| {
                    let s = s.trim();
                    if s.is_empty() {
                        Err(PipelineError::Summarization(
                            "model returned an empty summary".to_string(),
                        ))
                    } else {
                        Ok(s.to_string())
                    }
                });
                (url, res)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut articles = Vec::with_capacity(chosen.len());
        let mut failures = Vec::new();
        for draft in &chosen {
            if let Some(summary) = draft.reusable_summary() {
                articles.push(draft.promote(summary.to_string()));
                continue;
            }
            match outcomes.remove(&draft.url) {
                Some(Ok(summary)) => articles.push(draft.promote(summary)),
                Some(Err(e)) => {
                    warn!(url = %draft.url, error = %e, "Summary failed");
                    failures.push(format!("{}: {e}", draft.url));
                }
                None => failures.push(format!("{}: no result", draft.url)),
            }
        }

        if !failures.is_empty() {
            let e = PipelineError::Summarization(format!(
                "{} of {} summaries failed ({})",
                failures.len(),
                chosen.len(),
                failures.join("; ")
            ));
            return Err(surface("generate_summaries", e));
        }

        info!(
            articles = articles.len(),
            requested,
            reused = articles.len() - requested,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Generated summaries"
        );
        let count = articles.len();
        self.state.articles = articles;
        self.state.mode = Mode::Summary;
        self.state.selected.clear();
        Ok(count)
    }

    /// Replace the summary of article `index`.
    pub fn edit_summary(&mut self, index: usize, text: &str) -> Result<()> {
        self.ensure_mode(Mode::Summary, "Editing a summary")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::validation("Summary cannot be empty."));
        }
        let article = self
            .state
            .articles
            .get_mut(index)
            .ok_or_else(|| PipelineError::validation(format!("No article at index {index}")))?;
        article.summary = text.to_string();
        Ok(())
    }

    /// Deliver one active article, matched by url, and archive it.
    ///
    /// The stored copy is sent so the latest edit goes out.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn send_one(&mut self, article: &Article) -> Result<()> {
        self.ensure_mode(Mode::Summary, "Sending")?;
        if self.state.was_sent(&article.url) {
            return Err(PipelineError::validation(format!(
                "Already sent: {}",
                article.url
            )));
        }
        let current = self
            .state
            .articles
            .iter()
            .find(|a| a.url == article.url)
            .cloned()
            .ok_or_else(|| {
                PipelineError::validation(format!("Not in the summary list: {}", article.url))
            })?;

        self.sink
            .send(std::slice::from_ref(&current))
            .await
            .map_err(|e| surface("send_one", e))?;

        self.state.archive(&[current.url]);
        info!(sent_total = self.state.sent.len(), "Sent article");
        Ok(())
    }

    /// Deliver every active article in one message and archive them.
    #[instrument(level = "info", skip(self))]
    pub async fn send_all(&mut self) -> Result<usize> {
        self.ensure_mode(Mode::Summary, "Sending")?;
        if self.state.articles.is_empty() {
            return Err(PipelineError::validation("Nothing to send."));
        }

        let batch = self.state.articles.clone();
        self.sink
            .send(&batch)
            .await
            .map_err(|e| surface("send_all", e))?;

        let urls: Vec<String> = batch.into_iter().map(|a| a.url).collect();
        self.state.archive(&urls);
        info!(count = urls.len(), sent_total = self.state.sent.len(), "Sent articles");
        Ok(urls.len())
    }

    /// Return to review mode, carrying summary-mode edits back onto the
    /// drafts with the same url. A no-op in review mode.
    #[instrument(level = "info", skip(self))]
    pub fn back(&mut self) -> Result<()> {
        if self.state.mode == Mode::Review {
            return Ok(());
        }

        let articles = std::mem::take(&mut self.state.articles);
        let mut merged = 0usize;
        for article in articles {
            if let Some(draft) = self.state.drafts.iter_mut().find(|d| d.url == article.url) {
                draft.summary = Some(article.summary);
                merged += 1;
            }
        }
        let sent = &self.state.sent;
        self.state
            .drafts
            .retain(|d| !sent.iter().any(|a| a.url == d.url));

        self.state.mode = Mode::Review;
        self.state.selected.clear();
        info!(merged, drafts = self.state.drafts.len(), "Back to review");
        Ok(())
    }
}
