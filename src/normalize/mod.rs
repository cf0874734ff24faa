//! Article normalization.
//!
//! Turns heterogeneous upstream representations into one canonical
//! [`ArticleDraft`]:
//!
//! - [`normalize_from_search_result`]: a structured search API record
//! - [`normalize_from_html`]: a raw HTML page plus the URL it came from
//!
//! Neither operation fails. Every field has a terminal fallback so an
//! article is never rejected just because metadata is missing. Field
//! extraction from markup goes through the [`HtmlExtractor`] trait; the
//! tolerant [`PatternExtractor`] is the default and [`DomExtractor`] runs a
//! real HTML parser.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{ArticleDraft, RawSearchResult, RawSource, UNKNOWN_SOURCE};
use crate::utils::truncate_chars;

pub mod dom;
pub mod pattern;

pub use dom::DomExtractor;
pub use pattern::PatternExtractor;

/// Maximum length, in characters, of a description taken from a `<p>`.
pub const PARAGRAPH_DESC_LIMIT: usize = 200;

/// Raw field values pulled out of an HTML document.
///
/// Values are untrimmed candidates; the normalizer decides which one wins.
/// `first_paragraph` is already stripped of inner tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlFields {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub first_paragraph: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub time_datetime: Option<String>,
}

/// Strategy for pulling [`HtmlFields`] out of a document.
pub trait HtmlExtractor {
    fn extract(&self, html: &str) -> HtmlFields;
}

/// Which extractor to use, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    Pattern,
    Dom,
}

/// Runtime-selected extractor.
#[derive(Debug, Clone)]
pub enum Extractor {
    Pattern(PatternExtractor),
    Dom(DomExtractor),
}

impl From<ExtractionStrategy> for Extractor {
    fn from(strategy: ExtractionStrategy) -> Self {
        match strategy {
            ExtractionStrategy::Pattern => Extractor::Pattern(PatternExtractor),
            ExtractionStrategy::Dom => Extractor::Dom(DomExtractor),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        ExtractionStrategy::default().into()
    }
}

impl HtmlExtractor for Extractor {
    fn extract(&self, html: &str) -> HtmlFields {
        match self {
            Extractor::Pattern(e) => e.extract(html),
            Extractor::Dom(e) => e.extract(html),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty_owned(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build a draft from one search API record.
///
/// `fallback_url` stands in for a missing title and for a missing `url`.
pub fn normalize_from_search_result(raw: &RawSearchResult, fallback_url: &str) -> ArticleDraft {
    let title = non_empty(raw.title.as_deref()).unwrap_or(fallback_url);

    let desc = non_empty(raw.description.as_deref())
        .or_else(|| non_empty(raw.content.as_deref()))
        .or_else(|| non_empty(raw.title.as_deref()))
        .unwrap_or_default();

    let source = match &raw.source {
        Some(RawSource::Named { name, .. }) => non_empty(name.as_deref()),
        Some(RawSource::Plain(s)) => non_empty(Some(s.as_str())),
        Some(RawSource::Other(_)) | None => None,
    }
    .unwrap_or(UNKNOWN_SOURCE);

    let url = non_empty(raw.url.as_deref()).unwrap_or(fallback_url);

    ArticleDraft {
        title: title.to_string(),
        desc: desc.to_string(),
        url: url.to_string(),
        source: source.to_string(),
        published_at: raw.publishedAt.clone().unwrap_or_default(),
        summary: None,
    }
}

/// Build a draft from a fetched HTML page.
pub fn normalize_from_html<E>(extractor: &E, html: &str, url: &str) -> ArticleDraft
where
    E: HtmlExtractor + ?Sized,
{
    let fields = extractor.extract(html);

    let title = non_empty_owned(fields.title).unwrap_or_else(|| url.to_string());

    let desc = non_empty_owned(fields.meta_description)
        .or_else(|| {
            non_empty_owned(fields.first_paragraph)
                .map(|p| truncate_chars(&p, PARAGRAPH_DESC_LIMIT).trim_end().to_string())
        })
        .unwrap_or_default();

    let source = non_empty_owned(fields.author)
        .or_else(|| non_empty_owned(fields.site_name))
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let published_at = non_empty_owned(fields.published_time)
        .or_else(|| non_empty_owned(fields.time_datetime))
        .unwrap_or_default();

    debug!(%url, %title, desc_chars = desc.chars().count(), %source, "Normalized HTML page");

    ArticleDraft {
        title,
        desc,
        url: url.to_string(),
        source,
        published_at,
        summary: None,
    }
}

/// Decode a fetched page body into text.
///
/// Fails with [`PipelineError::Parse`] when the body is not UTF-8.
pub fn page_text(body: &[u8]) -> Result<String> {
    String::from_utf8(body.to_vec())
        .map_err(|e| PipelineError::Parse(format!("page body is not valid UTF-8: {e}")))
}
