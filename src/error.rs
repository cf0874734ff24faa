//! Error taxonomy for the ingestion pipeline.
//!
//! Every collaborator failure maps onto one variant so the controller can
//! turn it into a single user-facing line without inspecting transport
//! details.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Search upstream unavailable or misconfigured (e.g. missing API key).
    #[error("search provider error: {0}")]
    Provider(String),

    /// Target page unreachable or answered with a non-success status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Input handed to the normalizer boundary was not usable text/JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model returned no usable summary.
    #[error("summarization error: {0}")]
    Summarization(String),

    /// The messaging sink rejected the payload.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// A precondition of a controller operation was not met.
    #[error("{0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Render the error as a single line suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(m) => format!("Failed to fetch news: {m}"),
            Self::Fetch(m) => format!("Failed to fetch the URL: {m}"),
            Self::Parse(m) => format!("Could not read the response: {m}"),
            Self::Summarization(m) => format!("Summarization failed: {m}"),
            Self::Delivery(m) => format!("Failed to send to Telegram: {m}"),
            Self::Validation(m) => m.clone(),
            Self::Config(m) => format!("Configuration problem: {m}"),
            Self::Io(e) => format!("Storage problem: {e}"),
        }
    }

    /// Whether this error came from one of the external collaborators.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Provider(_)
                | Self::Fetch(_)
                | Self::Parse(_)
                | Self::Summarization(_)
                | Self::Delivery(_)
        )
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}
