//! Utility functions for string shaping, timestamps, and file system checks.
//!
//! This module provides helpers used throughout the application:
//! - Character-safe truncation for previews, descriptions, and logs
//! - Whitespace collapsing for text scraped out of markup
//! - Human rendering of `publishedAt` timestamps
//! - File system validation for the state directory

use chrono::{DateTime, Local};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;

/// Truncate `s` to at most `max` characters.
///
/// Counts Unicode scalar values, never splitting a multi-byte character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for display, appending `…` when something was cut.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(preview("short", 100), "short");
/// assert_eq!(preview("abcdef", 3), "abc…");
/// ```
pub fn preview(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}…", truncate_chars(s, max))
    } else {
        s.to_string()
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        let rest = s.len() - kept.len();
        format!("{kept}…(+{rest} bytes)")
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a `publishedAt` value for listings.
///
/// RFC 3339 timestamps are shown in local time; anything else is returned
/// unchanged, and an empty value renders as `-`.
pub fn display_published(published_at: &str) -> String {
    if published_at.is_empty() {
        return "-".to_string();
    }
    match DateTime::parse_from_rfc3339(published_at) {
        Ok(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => published_at.to_string(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("State directory is writable");
    Ok(())
}
