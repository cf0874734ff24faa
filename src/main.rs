//! # newsbrief
//!
//! Command-line front end for the newsbrief pipeline.
//!
//! ## Usage
//!
//! ```sh
//! newsbrief ingest            # fetch a batch of drafts
//! newsbrief summarize 0 2     # summarize drafts 0 and 2
//! newsbrief send --all        # deliver to Telegram
//! newsbrief session           # interactive, with `select` and `summarize`
//! ```
//!
//! Every command loads the session from the state directory first and saves
//! it again if the command changed anything.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio::io::BufReader;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use newsbrief::cli::{Cli, Command};
use newsbrief::commands::{execute_once, run_session};
use newsbrief::config::{AppConfig, DEFAULT_CONFIG_FILE, SummarizerKind};
use newsbrief::error::Result;
use newsbrief::normalize::Extractor;
use newsbrief::pipeline::{Controller, StateStore};
use newsbrief::providers::{
    AwfulSummarizer, HttpPageFetcher, HuggingFaceSummarizer, NewsApiProvider, SummarizerBackend,
    TelegramSink, http_client,
};
use newsbrief::utils::ensure_writable_dir;

type AppController = Controller<NewsApiProvider, HttpPageFetcher, SummarizerBackend, TelegramSink>;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    // Logs go to stderr; stdout carries command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    debug!(config = ?args.config, state_dir = ?args.state_dir, command = ?args.command, "Parsed CLI arguments");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let start_time = Instant::now();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = AppConfig::load(&config_path, args.config.is_some()).await?;

    let state_dir = args.state_dir.clone().unwrap_or_else(|| config.state_dir.clone());
    if let Err(e) = ensure_writable_dir(&state_dir).await {
        error!(
            path = %state_dir.display(),
            error = %e,
            "State directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let store = StateStore::new(&state_dir);

    let mut controller = build_controller(&args, &config, &store).await?;

    match &args.command {
        Command::Action(action) => {
            let outcome = execute_once(&mut controller, action).await?;
            println!("{}", outcome.message);
            if outcome.mutated {
                store.save(controller.state()).await?;
            }
        }
        Command::Session => {
            let input = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_session(&mut controller, &store, input, &mut stdout).await?;
            stdout.flush()?;
        }
    }

    debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Done");
    Ok(())
}

#[instrument(level = "debug", skip_all, fields(backend = ?config.summarizer.backend))]
async fn build_controller(args: &Cli, config: &AppConfig, store: &StateStore) -> Result<AppController> {
    let client = http_client(Duration::from_secs(config.http.timeout_secs))?;

    let search = NewsApiProvider::new(
        client.clone(),
        &config.search.endpoint,
        &config.search.language,
        &config.search.sort_by,
        args.news_api_key.clone(),
    );
    let fetcher = HttpPageFetcher::new(client.clone());

    let summarizer = match config.summarizer.backend {
        SummarizerKind::HuggingFace => SummarizerBackend::HuggingFace(HuggingFaceSummarizer::new(
            client.clone(),
            &config.summarizer.endpoint,
            &config.summarizer.model,
            args.hf_api_key.clone(),
            config.summarizer.max_length,
            config.summarizer.min_length,
        )),
        SummarizerKind::AwfulAj => SummarizerBackend::Awful(
            AwfulSummarizer::load(
                config.summarizer.awful_config.as_deref(),
                &config.summarizer.template,
            )
            .await?,
        ),
    };

    let sink = TelegramSink::new(
        client,
        &config.telegram.endpoint,
        args.telegram_bot_token.clone(),
        args.telegram_chat_id.clone(),
        &config.telegram.header,
    );

    let state = store.load().await;
    info!(mode = %state.mode, "Session ready");

    Ok(Controller::new(
        search,
        fetcher,
        summarizer,
        sink,
        Extractor::from(config.extraction),
        config.ingest_settings(),
        state,
    ))
}
