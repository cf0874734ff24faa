//! Data models for raw search results, drafts, and summarized articles.
//!
//! This module defines the records that flow through the pipeline:
//! - [`RawSearchResult`]: one entry of the news search API response
//! - [`ArticleDraft`]: canonical pre-summarization candidate
//! - [`Article`]: a draft promoted with a model-generated summary
//!
//! Persisted records use camelCase field names to stay compatible with the
//! JSON shapes exchanged with the search API and earlier state files.

use serde::{Deserialize, Serialize};

/// Sentinel used when no publisher name can be determined.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// The `source` field of a search result.
///
/// NewsAPI sends `{ "id": ..., "name": ... }`, other feeds send a bare
/// string. The ambiguity is resolved by the normalizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawSource {
    Named {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Plain(String),
    /// Anything else (numbers, arrays); treated as absent.
    Other(serde_json::Value),
}

/// A raw article as returned by the search provider.
///
/// Every field is optional; absence degrades to documented defaults.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub publishedAt: Option<String>,
}

/// Envelope of a search API response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<RawSearchResult>,
}

/// A pre-summarization candidate.
///
/// `url` is the natural key: non-empty and unique within the active draft
/// set. `summary` is only present after a round-trip through summary mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub url: String,
    #[serde(default = "unknown_source")]
    pub source: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

fn unknown_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

impl ArticleDraft {
    /// Promote this draft into an [`Article`] carrying `summary`.
    pub fn promote(&self, summary: String) -> Article {
        Article {
            title: self.title.clone(),
            url: self.url.clone(),
            summary,
        }
    }

    /// A summary carried over from a previous round, if it is usable.
    pub fn reusable_summary(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A summarized article ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub summary: String,
}
