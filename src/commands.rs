//! Runs CLI actions against a [`Controller`] and renders the results.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::cli::{Action, SessionCommand, SessionLine};
use crate::error::{PipelineError, Result};
use crate::pipeline::{Controller, Mode, SessionState, StateStore};
use crate::providers::{DeliverySink, PageFetcher, SearchProvider, Summarizer};
use crate::utils::{display_published, preview};

/// Characters of description or summary shown per entry in `list`.
pub const PREVIEW_CHARS: usize = 100;

const PROMPT: &str = "newsbrief> ";

/// What a successful action printed and whether it changed the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub mutated: bool,
}

impl Outcome {
    fn changed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mutated: true,
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mutated: false,
        }
    }
}

pub async fn execute<S, F, Z, D>(controller: &mut Controller<S, F, Z, D>, action: &Action) -> Result<Outcome>
where
    S: SearchProvider,
    F: PageFetcher,
    Z: Summarizer,
    D: DeliverySink,
{
    debug!(?action, mode = %controller.mode(), "Executing");
    let outcome = match action {
        Action::Ingest => {
            let count = controller.ingest_batch().await?;
            Outcome::changed(format!("Fetched {count} drafts.\n{}", render_list(controller.state())))
        }
        Action::Add { url } => {
            let index = controller.ingest_by_url(url).await?;
            let title = &controller.drafts()[index].title;
            Outcome::changed(format!("Added [{index}] {title}"))
        }
        Action::List => Outcome::unchanged(render_list(controller.state())),
        Action::Sent => Outcome::unchanged(render_sent(controller.state())),
        Action::Remove { index } => {
            controller.remove(*index)?;
            Outcome::changed(format!("Removed [{index}].\n{}", render_list(controller.state())))
        }
        Action::Select { index } => {
            let selected = controller.toggle_select(*index)?;
            let verb = if selected { "Selected" } else { "Deselected" };
            Outcome::unchanged(format!(
                "{verb} [{index}] ({} selected)",
                controller.selected().len()
            ))
        }
        Action::Summarize { indices } => {
            let indices: Vec<usize> = if indices.is_empty() {
                controller.selected().iter().copied().collect()
            } else {
                indices.clone()
            };
            let count = controller.generate_summaries(&indices).await?;
            Outcome::changed(format!("Summarized {count} articles.\n{}", render_list(controller.state())))
        }
        Action::Edit { index, text } => {
            let text = text.join(" ");
            match controller.mode() {
                Mode::Review => controller.edit_draft(*index, &text)?,
                Mode::Summary => controller.edit_summary(*index, &text)?,
            }
            Outcome::changed(format!("Updated [{index}]"))
        }
        Action::Send { all: true, .. } => {
            let count = controller.send_all().await?;
            Outcome::changed(format!("Sent {count} articles."))
        }
        Action::Send {
            index: Some(index),
            all: false,
        } => {
            let article = controller
                .articles()
                .get(*index)
                .cloned()
                .ok_or_else(|| PipelineError::validation(format!("No article at index {index}")))?;
            controller.send_one(&article).await?;
            Outcome::changed(format!("Sent: {}", article.title))
        }
        Action::Send { index: None, all: false } => {
            return Err(PipelineError::validation("Pass an article index or --all."));
        }
        Action::Back => {
            controller.back()?;
            Outcome::changed(render_list(controller.state()))
        }
    };
    Ok(outcome)
}

/// Run a single command-line action.
///
/// The selection lives only as long as the process, so `select` is refused
/// here; `summarize <INDEX>...` names the drafts directly instead.
pub async fn execute_once<S, F, Z, D>(controller: &mut Controller<S, F, Z, D>, action: &Action) -> Result<Outcome>
where
    S: SearchProvider,
    F: PageFetcher,
    Z: Summarizer,
    D: DeliverySink,
{
    if let Action::Select { .. } = action {
        return Err(PipelineError::validation(
            "`select` only works inside `newsbrief session`; use `newsbrief summarize <INDEX>...` instead.",
        ));
    }
    execute(controller, action).await
}

/// Render the list for the session's current mode.
pub fn render_list(state: &SessionState) -> String {
    let mut out = String::new();
    match state.mode {
        Mode::Review => {
            if state.drafts.is_empty() {
                return "No drafts. Run `ingest` or `add <URL>`.".to_string();
            }
            out.push_str(&format!(
                "Review: {} drafts, {} selected\n",
                state.drafts.len(),
                state.selected.len()
            ));
            for (i, draft) in state.drafts.iter().enumerate() {
                let mark = if state.selected.contains(&i) { '*' } else { ' ' };
                let carried = if draft.summary.is_some() { " (summarized)" } else { "" };
                out.push_str(&format!("[{i}]{mark} {}{carried}\n", draft.title));
                out.push_str(&format!(
                    "     {} | {} | {}\n",
                    draft.source,
                    display_published(&draft.published_at),
                    draft.url
                ));
                if !draft.desc.is_empty() {
                    out.push_str(&format!("     {}\n", preview(&draft.desc, PREVIEW_CHARS)));
                }
            }
        }
        Mode::Summary => {
            out.push_str(&format!("Summary: {} articles ready to send\n", state.articles.len()));
            for (i, article) in state.articles.iter().enumerate() {
                out.push_str(&format!("[{i}] {}\n", article.title));
                out.push_str(&format!("    {}\n", article.url));
                out.push_str(&format!("    {}\n", preview(&article.summary, PREVIEW_CHARS)));
            }
        }
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn render_sent(state: &SessionState) -> String {
    if state.sent.is_empty() {
        return "Nothing sent yet.".to_string();
    }
    let mut out = format!("Sent: {} articles\n", state.sent.len());
    for article in &state.sent {
        out.push_str(&format!("- {} ({})\n", article.title, article.url));
    }
    out.truncate(out.trim_end().len());
    out
}

/// Read commands line by line until `quit` or end of input.
///
/// Failed commands are reported and the session continues. The session is
/// saved after every command that changed it.
pub async fn run_session<S, F, Z, D, R, W>(
    controller: &mut Controller<S, F, Z, D>,
    store: &StateStore,
    input: R,
    out: &mut W,
) -> Result<()>
where
    S: SearchProvider,
    F: PageFetcher,
    Z: Summarizer,
    D: DeliverySink,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{}", render_list(controller.state()))?;
    write!(out, "{PROMPT}")?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            match SessionLine::parse_line(&line) {
                Ok(SessionCommand::Quit) => break,
                Ok(SessionCommand::Action(action)) => match execute(controller, &action).await {
                    Ok(outcome) => {
                        writeln!(out, "{}", outcome.message)?;
                        if outcome.mutated {
                            if let Err(e) = store.save(controller.state()).await {
                                warn!(error = %e, "Could not save session");
                                writeln!(out, "❌ {}", e.user_message())?;
                            }
                        }
                    }
                    Err(e) => writeln!(out, "❌ {}", e.user_message())?,
                },
                Err(e) => write!(out, "{e}")?,
            }
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleDraft;
    use crate::testing::*;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_review_to_send_flow() {
        let mut c = controller_with(three_results(), FakeSummarizer::default());

        let out = execute(&mut c, &Action::Ingest).await.unwrap();
        assert!(out.mutated);
        assert!(out.message.starts_with("Fetched 3 drafts."));

        execute(&mut c, &Action::Select { index: 0 }).await.unwrap();
        let out = execute(&mut c, &Action::Select { index: 2 }).await.unwrap();
        assert_eq!(out.message, "Selected [2] (2 selected)");

        let out = execute(&mut c, &Action::Summarize { indices: vec![] }).await.unwrap();
        assert!(out.message.contains("Summarized 2 articles."));
        assert_eq!(c.mode(), Mode::Summary);
        assert_eq!(c.articles()[1].summary, "sum:third");

        let out = execute(&mut c, &Action::Send { index: Some(1), all: false }).await.unwrap();
        assert_eq!(out.message, "Sent: Three");
        let out = execute(&mut c, &Action::Send { index: None, all: true }).await.unwrap();
        assert_eq!(out.message, "Sent 1 articles.");
        assert_eq!(c.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_follows_mode() {
        let mut c = controller_with(three_results(), FakeSummarizer::default());
        execute(&mut c, &Action::Ingest).await.unwrap();

        let edit = |index: usize, words: &[&str]| Action::Edit {
            index,
            text: words.iter().map(|w| w.to_string()).collect(),
        };
        execute(&mut c, &edit(1, &["new", "desc"])).await.unwrap();
        assert_eq!(c.drafts()[1].desc, "new desc");

        execute(&mut c, &Action::Summarize { indices: vec![1] }).await.unwrap();
        execute(&mut c, &edit(0, &["tighter"])).await.unwrap();
        assert_eq!(c.articles()[0].summary, "tighter");
    }

    #[tokio::test]
    async fn test_validation_errors_leave_state() {
        let mut c = controller_with(three_results(), FakeSummarizer::default());
        execute(&mut c, &Action::Ingest).await.unwrap();
        let before = c.state().clone();

        let err = execute(&mut c, &Action::Summarize { indices: vec![] }).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        let err = execute(&mut c, &Action::Send { index: None, all: false }).await.unwrap_err();
        assert_eq!(err.user_message(), "Pass an article index or --all.");
        let err = execute(&mut c, &Action::Send { index: Some(0), all: false }).await.unwrap_err();
        assert_eq!(err.user_message(), "No article at index 0");

        assert_eq!(c.state(), &before);
    }

    #[tokio::test]
    async fn test_selection_is_not_carried_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path());

        let mut first = controller_with(three_results(), FakeSummarizer::default());
        execute_once(&mut first, &Action::Ingest).await.unwrap();
        let out = execute(&mut first, &Action::Select { index: 0 }).await.unwrap();
        assert!(!out.mutated);
        store.save(first.state()).await.unwrap();

        let mut second = controller_from(three_results(), FakePages::default(), FakeSummarizer::default(), store.load().await);
        assert!(second.selected().is_empty());

        let err = execute_once(&mut second, &Action::Select { index: 0 }).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.user_message().contains("summarize <INDEX>"));
        assert!(second.selected().is_empty());

        let out = execute_once(&mut second, &Action::Summarize { indices: vec![0, 2] }).await.unwrap();
        assert!(out.mutated);
        assert_eq!(second.mode(), Mode::Summary);
        assert_eq!(second.articles().len(), 2);
    }

    #[tokio::test]
    async fn test_sent_archive_survives_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path());

        let mut first = controller_with(three_results(), FakeSummarizer::default());
        execute_once(&mut first, &Action::Ingest).await.unwrap();
        execute_once(&mut first, &Action::Summarize { indices: vec![1] }).await.unwrap();
        execute_once(&mut first, &Action::Send { index: Some(0), all: false }).await.unwrap();
        store.save(first.state()).await.unwrap();

        let mut second = controller_from(three_results(), FakePages::default(), FakeSummarizer::default(), store.load().await);
        assert!(second.state().was_sent("http://2"));
        second.back().unwrap();
        assert_eq!(second.ingest_batch().await.unwrap(), 2);
        assert!(second.drafts().iter().all(|d| d.url != "http://2"));
        assert_eq!(second.sent().len(), 1);
    }

    #[test]
    fn test_render_review_list() {
        let mut state = SessionState::default();
        state.drafts.push(ArticleDraft {
            title: "Title".to_string(),
            desc: "d".repeat(150),
            url: "https://example.com/a".to_string(),
            source: "Example".to_string(),
            published_at: "not a date".to_string(),
            summary: None,
        });
        state.selected.insert(0);

        let rendered = render_list(&state);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Review: 1 drafts, 1 selected");
        assert_eq!(lines[1], "[0]* Title");
        assert_eq!(lines[2], "     Example | not a date | https://example.com/a");
        assert_eq!(lines[3], format!("     {}…", "d".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_render_empty_lists() {
        let state = SessionState::default();
        assert_eq!(render_list(&state), "No drafts. Run `ingest` or `add <URL>`.");
        assert_eq!(render_sent(&state), "Nothing sent yet.");
    }

    #[tokio::test]
    async fn test_session_saves_and_survives_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path());
        let mut c = controller_with(three_results(), FakeSummarizer::default());

        let input: &[u8] = b"ingest\nselect 9\nbogus\n\nselect 1\nsummarize\nquit\nlist\n";
        let mut buf = Vec::new();
        run_session(&mut c, &store, input, &mut buf).await.unwrap();
        let printed = output(buf);

        assert!(printed.contains("Fetched 3 drafts."));
        assert!(printed.contains("❌ No draft at index 9"));
        assert!(printed.contains("unrecognized subcommand"));
        assert!(printed.contains("Summarized 1 articles."));
        assert_eq!(c.mode(), Mode::Summary);

        let saved = store.load().await;
        assert_eq!(saved.mode, Mode::Summary);
        assert_eq!(saved.drafts.len(), 3);
        assert_eq!(saved.articles[0].url, "http://2");
    }

    #[tokio::test]
    async fn test_session_ends_at_eof() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path());
        let mut c = controller_with(FakeSearch::default(), FakeSummarizer::default());

        let input: &[u8] = b"list";
        let mut buf = Vec::new();
        run_session(&mut c, &store, input, &mut buf).await.unwrap();
        assert!(output(buf).contains("No drafts."));
        assert!(!tmp.path().join("drafts.json").exists());
    }
}
