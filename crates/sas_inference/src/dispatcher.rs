//! Routes text to the registered summarization backend for a method.
//!
//! The dispatcher validates parameters against the backend's schema before
//! every call and never alters the text or the backend output.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sas_core::{
    Error, ParamValue, ResolvedParams, Result, SummarizationBackend, SummarizationConfig,
    SummarizationMethod, WordBudget,
};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Dispatcher {
    backends: HashMap<SummarizationMethod, Arc<dyn SummarizationBackend>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under the method its schema declares, returning
    /// the backend it replaced.
    pub fn register(
        &mut self,
        backend: Arc<dyn SummarizationBackend>,
    ) -> Option<Arc<dyn SummarizationBackend>> {
        let method = backend.schema().method();
        self.backends.insert(method, backend)
    }

    pub fn with_backend(mut self, backend: Arc<dyn SummarizationBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn backend(&self, method: SummarizationMethod) -> Result<&Arc<dyn SummarizationBackend>> {
        self.backends
            .get(&method)
            .ok_or(Error::UnsupportedMethod(method))
    }

    /// Registered methods, in declaration order.
    pub fn methods(&self) -> Vec<SummarizationMethod> {
        let mut methods: Vec<_> = self.backends.keys().copied().collect();
        methods.sort();
        methods
    }

    pub fn validate(&self, config: &SummarizationConfig) -> Result<ResolvedParams> {
        self.backend(config.method)?.schema().resolve(&config.params)
    }

    pub fn word_budget(&self, method: SummarizationMethod) -> Result<WordBudget> {
        Ok(self.backend(method)?.word_budget())
    }

    /// Parameters of `config` that differ from the backend defaults, in key
    /// order.
    pub fn non_default_params(&self, config: &SummarizationConfig) -> Result<Vec<(String, ParamValue)>> {
        self.backend(config.method)?.schema().non_default(&config.params)
    }

    pub async fn summarize(
        &self,
        text: &str,
        method: SummarizationMethod,
        params: &BTreeMap<String, ParamValue>,
    ) -> Result<String> {
        let backend = self.backend(method)?;
        let resolved = backend.schema().resolve(params)?;
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        debug!("Dispatching {} words to {}", sas_core::word_count(text), backend.name());
        backend.summarize(text, &resolved).await
    }

    pub async fn summarize_with(&self, text: &str, config: &SummarizationConfig) -> Result<String> {
        self.summarize(text, config.method, &config.params).await
    }
}
