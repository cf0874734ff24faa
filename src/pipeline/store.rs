//! File-backed persistence for a [`SessionState`].
//!
//! Three independent slots live in the state directory, each a JSON array:
//!
//! ```text
//! state_dir/
//! ├── drafts.json    # Vec<ArticleDraft>
//! ├── articles.json  # Vec<Article> (active summary list)
//! └── sent.json      # Vec<Article> (sent-archive)
//! ```
//!
//! A slot that is missing or malformed loads as an empty list; one bad slot
//! never takes the others down with it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use super::state::SessionState;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Drafts,
    Articles,
    Sent,
}

impl Slot {
    pub fn file_name(self) -> &'static str {
        match self {
            Slot::Drafts => "drafts.json",
            Slot::Articles => "articles.json",
            Slot::Sent => "sent.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }

    async fn read_slot<T: DeserializeOwned>(&self, slot: Slot) -> Vec<T> {
        let path = self.path(slot);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read state slot; starting empty");
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed state slot; resetting to empty");
                Vec::new()
            }
        }
    }

    async fn write_slot<T: Serialize>(&self, slot: Slot, items: &[T]) -> Result<()> {
        let path = self.path(slot);
        let json = serde_json::to_string_pretty(items).map_err(std::io::Error::other)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), count = items.len(), "Wrote state slot");
        Ok(())
    }

    /// Load the session. Never fails; unusable slots come back empty.
    #[instrument(level = "debug", skip_all, fields(dir = %self.dir.display()))]
    pub async fn load(&self) -> SessionState {
        let drafts = self.read_slot(Slot::Drafts).await;
        let articles = self.read_slot(Slot::Articles).await;
        let sent = self.read_slot(Slot::Sent).await;
        let state = SessionState::from_slots(drafts, articles, sent);
        info!(
            mode = %state.mode,
            drafts = state.drafts.len(),
            articles = state.articles.len(),
            sent = state.sent.len(),
            "Loaded session"
        );
        state
    }

    #[instrument(level = "debug", skip_all, fields(dir = %self.dir.display()))]
    pub async fn save(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        self.write_slot(Slot::Drafts, &state.drafts).await?;
        self.write_slot(Slot::Articles, &state.articles).await?;
        self.write_slot(Slot::Sent, &state.sent).await?;
        Ok(())
    }
}
