//! # newsbrief
//!
//! An editorial pipeline for a Telegram news channel: fetch candidate
//! articles from a news search API (or paste a URL), curate them as drafts,
//! summarize the chosen ones with a hosted model, edit the summaries, and
//! deliver them to a Telegram chat.
//!
//! ## Architecture
//!
//! 1. **Ingestion**: [`providers::SearchProvider`] results and fetched pages
//!    are normalized into [`models::ArticleDraft`]s by [`normalize`].
//! 2. **Review**: the [`pipeline::Controller`] lets the editor remove,
//!    edit and select drafts.
//! 3. **Summary**: selected drafts are summarized concurrently through a
//!    [`providers::Summarizer`] and promoted to [`models::Article`]s.
//! 4. **Delivery**: articles go out through a [`providers::DeliverySink`]
//!    and move into the sent-archive, which keeps them from being ingested
//!    again.
//!
//! State survives restarts through [`pipeline::StateStore`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
