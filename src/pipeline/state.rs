//! Session state owned by the controller.

use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

use crate::models::{Article, ArticleDraft};

/// Which list the controller is operating on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Curating drafts before summarization.
    #[default]
    Review,
    /// Editing and sending summarized articles.
    Summary,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Review => write!(f, "review"),
            Mode::Summary => write!(f, "summary"),
        }
    }
}

/// Everything one interactive session works on.
///
/// `selected` holds draft indices and is re-aligned whenever a draft is
/// removed. It is advisory and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub drafts: Vec<ArticleDraft>,
    pub selected: BTreeSet<usize>,
    pub articles: Vec<Article>,
    pub sent: Vec<Article>,
}

impl SessionState {
    /// Rebuild a session from the three persisted lists.
    ///
    /// Summary mode is resumed when there are active articles. Drafts with a
    /// repeated url keep their first occurrence.
    pub fn from_slots(drafts: Vec<ArticleDraft>, articles: Vec<Article>, sent: Vec<Article>) -> Self {
        let loaded = drafts.len();
        let drafts: Vec<ArticleDraft> = drafts.into_iter().unique_by(|d| d.url.clone()).collect();
        if drafts.len() < loaded {
            warn!(dropped = loaded - drafts.len(), "Dropped drafts with duplicate urls");
        }
        let mode = if articles.is_empty() {
            Mode::Review
        } else {
            Mode::Summary
        };
        Self {
            mode,
            drafts,
            selected: BTreeSet::new(),
            articles,
            sent,
        }
    }

    pub fn was_sent(&self, url: &str) -> bool {
        self.sent.iter().any(|a| a.url == url)
    }

    pub fn has_draft(&self, url: &str) -> bool {
        self.drafts.iter().any(|d| d.url == url)
    }

    /// Remove draft `index` and shift selection indices above it down.
    pub(crate) fn remove_draft(&mut self, index: usize) -> ArticleDraft {
        let removed = self.drafts.remove(index);
        self.selected = self
            .selected
            .iter()
            .filter(|&&i| i != index)
            .map(|&i| if i > index { i - 1 } else { i })
            .collect();
        removed
    }

    /// Move the active articles with these urls into the sent-archive and
    /// drop their drafts from the working set.
    pub(crate) fn archive(&mut self, urls: &[String]) {
        let (sent, kept): (Vec<Article>, Vec<Article>) = std::mem::take(&mut self.articles)
            .into_iter()
            .partition(|a| urls.contains(&a.url));
        self.articles = kept;
        self.drafts.retain(|d| !urls.contains(&d.url));
        self.selected.clear();
        for article in sent {
            if !self.was_sent(&article.url) {
                self.sent.push(article);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_SOURCE;

    fn draft(url: &str) -> ArticleDraft {
        ArticleDraft {
            title: url.to_string(),
            desc: String::new(),
            url: url.to_string(),
            source: UNKNOWN_SOURCE.to_string(),
            published_at: String::new(),
            summary: None,
        }
    }

    fn article(url: &str) -> Article {
        Article {
            title: url.to_string(),
            url: url.to_string(),
            summary: "s".to_string(),
        }
    }

    #[test]
    fn test_from_slots_picks_mode() {
        assert_eq!(SessionState::from_slots(vec![draft("a")], vec![], vec![]).mode, Mode::Review);
        assert_eq!(SessionState::from_slots(vec![], vec![article("a")], vec![]).mode, Mode::Summary);
    }

    #[test]
    fn test_from_slots_drops_duplicate_draft_urls() {
        let mut second = draft("a");
        second.title = "second copy".to_string();
        let state = SessionState::from_slots(vec![draft("a"), draft("b"), second], vec![], vec![]);
        assert_eq!(state.drafts, vec![draft("a"), draft("b")]);
    }

    #[test]
    fn test_remove_draft_realigns_selection() {
        let mut state = SessionState::from_slots(vec![draft("a"), draft("b"), draft("c"), draft("d")], vec![], vec![]);
        state.selected = BTreeSet::from([0, 1, 3]);
        let removed = state.remove_draft(1);
        assert_eq!(removed.url, "b");
        assert_eq!(state.selected, BTreeSet::from([0, 2]));
        assert_eq!(state.drafts[2].url, "d");
    }

    #[test]
    fn test_archive_moves_only_named_urls() {
        let mut state = SessionState::from_slots(vec![draft("a"), draft("b")], vec![article("a"), article("b")], vec![]);
        state.archive(&["b".to_string()]);
        assert_eq!(state.articles, vec![article("a")]);
        assert_eq!(state.drafts, vec![draft("a")]);
        assert_eq!(state.sent, vec![article("b")]);
        assert!(state.was_sent("b"));
        assert!(!state.was_sent("a"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Review.to_string(), "review");
        assert_eq!(Mode::Summary.to_string(), "summary");
    }
}
