use thiserror::Error;

use crate::types::SummarizationMethod;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported summarization method: {0}")]
    UnsupportedMethod(SummarizationMethod),

    #[error("Invalid {method} configuration: {reason}")]
    ConfigValidation {
        method: SummarizationMethod,
        reason: String,
    },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(method: SummarizationMethod, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            method,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
