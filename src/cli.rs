//! Command-line interface definitions for newsbrief.
//!
//! Secrets can be passed as flags but are normally read from the environment
//! (or a `.env` file). Everything else lives in the YAML configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Curate news drafts, summarize them, and deliver them to Telegram.
///
/// # Examples
///
/// ```sh
/// # Fetch a batch, summarize two drafts and send them
/// newsbrief ingest
/// newsbrief summarize 0 2
/// newsbrief send --all
///
/// # Interactively, picking drafts with `select`
/// newsbrief session
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file [default: newsbrief.yaml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for persisted drafts, articles and sent history
    #[arg(short, long)]
    pub state_dir: Option<PathBuf>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Hugging Face inference API key
    #[arg(long, env = "HF_API_KEY", hide_env_values = true)]
    pub hf_api_key: Option<String>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat to deliver to
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Action(Action),

    /// Read commands from stdin until `quit`, keeping the selection in memory
    Session,
}

/// One operation on the session, usable from the command line or inside
/// `newsbrief session`.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the drafts with a fresh batch from the news search API
    Ingest,

    /// Fetch a page and add it as a draft
    Add { url: String },

    /// Show the current list
    #[command(alias = "ls")]
    List,

    /// Show what has already been sent
    Sent,

    /// Remove an entry from the current list
    #[command(alias = "rm")]
    Remove { index: usize },

    /// Toggle selection of a draft (session only)
    Select { index: usize },

    /// Summarize the given drafts, or the current selection
    Summarize { indices: Vec<usize> },

    /// Replace a draft's description, or an article's summary
    Edit {
        index: usize,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Send one article, or every article with --all
    Send {
        index: Option<usize>,
        #[arg(long, conflicts_with = "index")]
        all: bool,
    },

    /// Leave summary mode and return to the drafts
    Back,
}

/// A line typed inside `newsbrief session`.
#[derive(Parser, Debug)]
#[command(name = "newsbrief", no_binary_name = true, disable_version_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    #[command(flatten)]
    Action(Action),

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

impl SessionLine {
    /// Parse one input line. Words are split on whitespace; quoting is not
    /// interpreted.
    pub fn parse_line(line: &str) -> Result<SessionCommand, clap::Error> {
        Self::try_parse_from(line.split_whitespace()).map(|l| l.command)
    }
}
