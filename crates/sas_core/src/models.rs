use std::fmt;

use async_trait::async_trait;

use crate::params::{ConfigSchema, ResolvedParams};
use crate::text::WordBudget;
use crate::Result;

/// Network collaborator of the page cache.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Downloads `url`. Any non-success status is an error.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// A text-to-text summarization capability.
#[async_trait]
pub trait SummarizationBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Keys, kinds and defaults this backend accepts.
    fn schema(&self) -> &ConfigSchema;

    /// Largest chunk the backend should receive in one call.
    fn word_budget(&self) -> WordBudget {
        WordBudget::Unlimited
    }

    /// Summarize `text`. `params` have already been validated against
    /// [`SummarizationBackend::schema`].
    async fn summarize(&self, text: &str, params: &ResolvedParams) -> Result<String>;
}
