//! Summarizer backed by an OpenAI-compatible model through `awful_aj`.
//!
//! The model endpoint, key, and sampling settings come from an `awful_aj`
//! `config.yaml`; the prompt comes from a named chat template. The template
//! is expected to make the model answer with the summary text only.

use awful_aj::api::ask;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::Summarizer;
use crate::error::{PipelineError, Result};
use crate::utils::truncate_for_log;

pub struct AwfulSummarizer {
    /// LLM configuration (API endpoint, key, model settings).
    config: AwfulJadeConfig,
    /// Chat template defining the summarization prompt.
    template: ChatTemplate,
    template_name: String,
}

impl fmt::Debug for AwfulSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwfulSummarizer")
            .field("template", &self.template_name)
            .finish()
    }
}

impl AwfulSummarizer {
    /// Load the model configuration and chat template.
    ///
    /// `config_path` defaults to `config.yaml` in the `awful_aj` config
    /// directory.
    #[instrument(level = "info", skip(config_path))]
    pub async fn load(config_path: Option<&Path>, template_name: &str) -> Result<Self> {
        let conf_file = match config_path {
            Some(p) => p.to_path_buf(),
            None => config_dir()
                .map_err(|e| PipelineError::Config(format!("no awful_aj config dir: {e}")))?
                .join("config.yaml"),
        };
        let path = conf_file
            .to_str()
            .ok_or_else(|| PipelineError::Config("not a valid config filename".to_string()))?;

        let config = config::load_config(path)
            .map_err(|e| PipelineError::Config(format!("could not load {path}: {e:?}")))?;
        info!(config_path = path, "Loaded model configuration");

        let template = template::load_template(template_name)
            .await
            .map_err(|e| PipelineError::Config(format!("could not load template {template_name}: {e}")))?;
        info!(template = template_name, "Loaded template");

        Ok(Self {
            config,
            template,
            template_name: template_name.to_string(),
        })
    }
}

/// Clean a raw model answer into a summary.
fn clean_answer(answer: &str) -> Result<String> {
    let summary = answer.trim().trim_matches('"').trim();
    if summary.is_empty() {
        return Err(PipelineError::Summarization(
            "model returned an empty answer".to_string(),
        ));
    }
    Ok(summary.to_string())
}

impl Summarizer for AwfulSummarizer {
    #[instrument(level = "info", skip_all, fields(template = %self.template_name))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match res {
            Ok(answer) => {
                info!(elapsed_ms = dt.as_millis() as u64, "Model answered");
                clean_answer(&answer).inspect_err(|_| {
                    warn!(answer = %truncate_for_log(&answer, 300), "Model answer unusable");
                })
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "API call failed");
                Err(PipelineError::Summarization(e.to_string()))
            }
        }
    }
}
