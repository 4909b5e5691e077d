use std::env;
use std::fmt;
use std::sync::Arc;

use sas_core::Result;
use tracing::{info, warn};

pub mod dispatcher;
pub mod models;

pub use dispatcher::Dispatcher;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Credentials and endpoints for the remote backends.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub huggingface_api_token: Option<String>,
    pub huggingface_base_url: String,
    /// Per-request timeout for remote backends, in seconds.
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            huggingface_api_token: None,
            huggingface_base_url: DEFAULT_HUGGINGFACE_BASE_URL.to_string(),
            timeout: 120,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &self.openai_api_key.as_deref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field(
                "huggingface_api_token",
                &self.huggingface_api_token.as_deref().map(|_| "<redacted>"),
            )
            .field("huggingface_base_url", &self.huggingface_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `HUGGINGFACE_API_TOKEN`
    /// and `HUGGINGFACE_BASE_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            huggingface_api_token: non_empty("HUGGINGFACE_API_TOKEN"),
            huggingface_base_url: non_empty("HUGGINGFACE_BASE_URL")
                .unwrap_or(defaults.huggingface_base_url),
            timeout: defaults.timeout,
        }
    }
}

/// Builds a dispatcher with every backend `config` allows.
pub fn create_dispatcher(config: &Config) -> Result<Arc<Dispatcher>> {
    let mut dispatcher = Dispatcher::new();
    for backend in models::create_backends(config)? {
        dispatcher.register(backend);
    }
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, GPT3 summarization is unavailable");
    }
    info!(
        "🧠 Summarization backends: {}",
        dispatcher
            .methods()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(Arc::new(dispatcher))
}

pub mod prelude {
    pub use super::dispatcher::Dispatcher;
    pub use super::{create_dispatcher, Config};
    pub use sas_core::{Error, Result, SummarizationBackend, SummarizationConfig, SummarizationMethod};
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::SummarizationMethod;

    #[test]
    fn test_debug_redacts_credentials() {
        let config = Config {
            openai_api_key: Some("sk-secret".to_string()),
            ..Config::default()
        };
        let shown = format!("{:?}", config);
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_dispatcher_without_openai_key() {
        let dispatcher = create_dispatcher(&Config::default()).unwrap();
        let methods = dispatcher.methods();
        assert!(methods.contains(&SummarizationMethod::Textrank));
        assert!(methods.contains(&SummarizationMethod::Bart));
        assert!(methods.contains(&SummarizationMethod::Lead));
        assert!(!methods.contains(&SummarizationMethod::Gpt3));
    }

    #[test]
    fn test_dispatcher_with_openai_key() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        let dispatcher = create_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.methods().len(), SummarizationMethod::ALL.len());
    }
}
