use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sas_core::{Error, Result, SummarizationBackend};
use url::Url;

use crate::Config;

pub mod huggingface;
pub mod lead;
pub mod openai;
pub mod textrank;

pub use huggingface::HuggingFaceModel;
pub use lead::LeadModel;
pub use openai::Gpt3Model;
pub use textrank::TextRankModel;

pub(crate) fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(Error::Http)
}

/// Checks that `base_url` parses and returns it without a trailing slash.
pub(crate) fn base_url(base_url: &str) -> Result<String> {
    Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
    Ok(base_url.trim_end_matches('/').to_string())
}

/// Every backend `config` supports. GPT3 needs an OpenAI API key.
pub fn create_backends(config: &Config) -> Result<Vec<Arc<dyn SummarizationBackend>>> {
    let client = http_client(config)?;
    let mut backends: Vec<Arc<dyn SummarizationBackend>> = vec![
        Arc::new(TextRankModel::new()),
        Arc::new(LeadModel::new()),
        Arc::new(HuggingFaceModel::bart(client.clone(), config)?),
        Arc::new(HuggingFaceModel::t5(client.clone(), config)?),
        Arc::new(HuggingFaceModel::pegasus(client.clone(), config)?),
    ];
    if let Some(api_key) = &config.openai_api_key {
        backends.push(Arc::new(Gpt3Model::new(client, &config.openai_base_url, api_key)?));
    }
    Ok(backends)
}
