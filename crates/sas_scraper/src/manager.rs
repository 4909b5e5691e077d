//! Runs every (article, configuration) pair through
//! fetch → parse → preprocess → summarize → persist.

use std::fmt;
use std::sync::Arc;

use sas_core::{
    compress, ArticleText, Document, NestedText, ParamValue, Result, SummarizationConfig,
    SummarizationMethod, SummarizedDocument, SummaryStore, WordBudget,
};
use sas_inference::Dispatcher;
use serde::Serialize;

use crate::extract::SectionExtractor;
use crate::fetch::PageCache;
use crate::logging::Logger;

/// Furthest step a pair completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Pending,
    Fetched,
    Parsed,
    Preprocessed,
    Summarized,
    Persisted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Fetched => "fetched",
            PipelineStage::Parsed => "parsed",
            PipelineStage::Preprocessed => "preprocessed",
            PipelineStage::Summarized => "summarized",
            PipelineStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PairState {
    Persisted,
    /// A result already existed under the key and `force` was off.
    Skipped,
    Failed { reached: PipelineStage, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub url: String,
    pub title: Option<String>,
    pub config: SummarizationConfig,
    pub key: Option<String>,
    pub state: PairState,
}

impl fmt::Display for PairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.title.as_deref().unwrap_or(&self.url);
        match &self.state {
            PairState::Persisted => write!(f, "✅ {} [{}]", name, self.config),
            PairState::Skipped => write!(f, "⏭️  {} [{}] already summarized", name, self.config),
            PairState::Failed { reached, error } => {
                write!(f, "❌ {} [{}] failed after {}: {}", name, self.config, reached, error)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub documents: Vec<SummarizedDocument>,
    pub outcomes: Vec<PairOutcome>,
}

impl RunReport {
    fn count(&self, matches: impl Fn(&PairState) -> bool) -> usize {
        self.outcomes.iter().filter(|o| matches(&o.state)).count()
    }

    pub fn persisted(&self) -> usize {
        self.count(|s| matches!(s, PairState::Persisted))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PairState::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PairState::Failed { .. }))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}", outcome)?;
        }
        write!(
            f,
            "{} persisted, {} skipped, {} failed",
            self.persisted(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Longest key, in bytes, that still leaves room for a file extension
/// within the usual 255-byte file name limit.
pub const MAX_KEY_LEN: usize = 240;

/// Storage key for a result: `{title}_{method}` followed by `_{key}-{value}`
/// for every non-default parameter, in key order. Path separators in the
/// title are replaced so the key is usable as a file name, and the title is
/// shortened when the key would exceed [`MAX_KEY_LEN`].
pub fn result_key(title: &str, method: SummarizationMethod, params: &[(String, ParamValue)]) -> String {
    let mut suffix = format!("_{}", method);
    for (name, value) in params {
        suffix.push_str(&format!("_{}-{}", name, value));
    }

    let budget = MAX_KEY_LEN.saturating_sub(suffix.len());
    let mut key = String::with_capacity(MAX_KEY_LEN);
    for c in title
        .trim()
        .trim_start_matches('.')
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
    {
        if key.len() + c.len_utf8() > budget {
            break;
        }
        key.push(c);
    }
    key.truncate(key.trim_end().len());
    key.push_str(&suffix);
    key
}

/// Keeps the summarized regions and merges their paragraphs up to `budget`.
/// Nested regions are merged per sub-section.
pub fn preprocess(text: &ArticleText, budget: WordBudget) -> ArticleText {
    ArticleText {
        introduction: compress(&text.introduction, budget),
        results: text
            .results
            .iter()
            .map(|(title, paragraphs)| (title.clone(), compress(paragraphs, budget)))
            .collect(),
        discussion: compress(&text.discussion, budget),
        ..ArticleText::default()
    }
}

pub struct PipelineManager {
    cache: Arc<PageCache>,
    extractor: SectionExtractor,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn SummaryStore>,
    force: bool,
}

impl PipelineManager {
    pub fn new(
        cache: Arc<PageCache>,
        extractor: SectionExtractor,
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn SummaryStore>,
    ) -> Self {
        Self {
            cache,
            extractor,
            dispatcher,
            store,
            force: false,
        }
    }

    /// Re-summarize pairs that already have a stored result.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn fetch_document(&self, url: &str) -> Result<Document> {
        let page = self.cache.fetch(url).await?;
        self.extractor.extract(&page)
    }

    /// Processes every pair, one at a time. Failures are recorded in the
    /// report and never stop the batch.
    pub async fn run(&self, urls: &[String], configs: &[SummarizationConfig]) -> RunReport {
        let mut report = RunReport::default();
        let logger = Logger::new();

        let validation: Vec<std::result::Result<(), String>> = configs
            .iter()
            .map(|config| {
                self.dispatcher
                    .validate(config)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .collect();
        for (config, result) in configs.iter().zip(&validation) {
            if let Err(error) = result {
                logger.warn(&format!("Configuration {} is invalid: {}", config, error));
            }
        }

        for url in urls {
            let logger = logger.clone().with_new_prefixes(url.clone());
            let failed = |reached: PipelineStage, error: String| -> Vec<PairOutcome> {
                configs
                    .iter()
                    .map(|config| PairOutcome {
                        url: url.clone(),
                        title: None,
                        config: config.clone(),
                        key: None,
                        state: PairState::Failed {
                            reached,
                            error: error.clone(),
                        },
                    })
                    .collect()
            };

            let page = match self.cache.fetch(url).await {
                Ok(page) => page,
                Err(e) => {
                    logger.error(&format!("Fetch failed: {}", e));
                    report.outcomes.extend(failed(PipelineStage::Pending, e.to_string()));
                    continue;
                }
            };
            let document = match self.extractor.extract(&page) {
                Ok(document) => document,
                Err(e) => {
                    logger.error(&format!("Parse failed: {}", e));
                    report.outcomes.extend(failed(PipelineStage::Fetched, e.to_string()));
                    continue;
                }
            };
            logger.info(&format!("📰 Parsed '{}'", document.title));

            for (config, valid) in configs.iter().zip(&validation) {
                let outcome = match valid {
                    Ok(()) => self.run_pair(&document, config, &mut report.documents).await,
                    Err(error) => PairOutcome {
                        url: document.url.clone(),
                        title: Some(document.title.clone()),
                        config: config.clone(),
                        key: None,
                        state: PairState::Failed {
                            reached: PipelineStage::Parsed,
                            error: error.clone(),
                        },
                    },
                };
                report.outcomes.push(outcome);
            }
        }

        logger.info(&format!(
            "🏁 {} persisted, {} skipped, {} failed",
            report.persisted(),
            report.skipped(),
            report.failed()
        ));
        report
    }

    async fn run_pair(
        &self,
        document: &Document,
        config: &SummarizationConfig,
        documents: &mut Vec<SummarizedDocument>,
    ) -> PairOutcome {
        let logger = Logger::new()
            .with_prefix(document.title.clone())
            .with_prefix(config.to_string());
        let mut outcome = PairOutcome {
            url: document.url.clone(),
            title: Some(document.title.clone()),
            config: config.clone(),
            key: None,
            state: PairState::Persisted,
        };
        let fail = |outcome: &mut PairOutcome, reached: PipelineStage, error: String| {
            logger.error(&format!("Failed after {} ({}): {}", reached, document.url, error));
            outcome.state = PairState::Failed { reached, error };
        };

        let key = match self.dispatcher.non_default_params(config) {
            Ok(params) => result_key(&document.title, config.method, &params),
            Err(e) => {
                fail(&mut outcome, PipelineStage::Parsed, e.to_string());
                return outcome;
            }
        };
        logger.debug(&format!("Result key '{}'", key));
        outcome.key = Some(key.clone());

        if !self.force {
            match self.store.exists(&key).await {
                Ok(true) => {
                    logger.info(&format!("⏭️  '{}' exists, skipping", key));
                    outcome.state = PairState::Skipped;
                    return outcome;
                }
                Ok(false) => {}
                Err(e) => {
                    fail(&mut outcome, PipelineStage::Parsed, e.to_string());
                    return outcome;
                }
            }
        }

        logger.info("🤖 Summarizing");
        let summarized = match self.summarize_article(document, config).await {
            Ok(summarized) => summarized,
            Err(e) => {
                fail(&mut outcome, PipelineStage::Preprocessed, e.to_string());
                return outcome;
            }
        };

        if summarized.summary.is_empty() {
            logger.warn("Every summarized region came back empty");
        }

        if let Err(e) = self.store.store(&key, &summarized).await {
            fail(&mut outcome, PipelineStage::Summarized, e.to_string());
            return outcome;
        }
        logger.info(&format!("💾 Stored as '{}'", key));
        documents.push(summarized);
        outcome
    }

    /// Preprocesses and summarizes `document` without persisting it.
    pub async fn summarize_article(
        &self,
        document: &Document,
        config: &SummarizationConfig,
    ) -> Result<SummarizedDocument> {
        let budget = self.dispatcher.word_budget(config.method)?;
        let text = preprocess(&document.text, budget);

        let mut results = NestedText::new();
        for (title, chunks) in text.results.iter() {
            let joined = self.summarize_chunks(chunks, config).await?;
            if !joined.is_empty() {
                results.insert(title.clone(), vec![joined]);
            }
        }
        let summary = ArticleText {
            introduction: self.summarize_flat(&text.introduction, config).await?,
            results,
            discussion: self.summarize_flat(&text.discussion, config).await?,
            ..ArticleText::default()
        };

        Ok(SummarizedDocument::new(document.clone(), config.clone(), summary))
    }

    async fn summarize_flat(&self, chunks: &[String], config: &SummarizationConfig) -> Result<Vec<String>> {
        let joined = self.summarize_chunks(chunks, config).await?;
        Ok(if joined.is_empty() { Vec::new() } else { vec![joined] })
    }

    /// Summarizes each chunk in order and joins the non-empty outputs.
    async fn summarize_chunks(&self, chunks: &[String], config: &SummarizationConfig) -> Result<String> {
        let mut outputs = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let output = self.dispatcher.summarize_with(chunk, config).await?;
            let output = output.trim();
            if !output.is_empty() {
                outputs.push(output.to_string());
            }
        }
        Ok(outputs.join(" "))
    }
}
