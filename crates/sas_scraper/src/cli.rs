use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand};
use sas_core::{Error, Region, Result, Section, SummarizationConfig, SummaryStore};
use sas_inference::{create_dispatcher, Config, Dispatcher};
use sas_storage::{create_page_store, create_summary_store, StorageKind};
use serde::de::DeserializeOwned;

use crate::defaults;
use crate::extract::{ExtractorConfig, SectionExtractor};
use crate::fetch::{FetchConfig, HttpFetcher, PageCache};
use crate::manager::PipelineManager;

#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Directory holding downloaded pages
    #[arg(long, default_value = ".cache/pages")]
    pub cache_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory holding summarized articles
    #[arg(long, default_value = "summaries")]
    pub output_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = StorageKind::Json)]
    pub storage: StorageKind,
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommands {
    /// Summarize every article under every configuration
    Summarize {
        /// JSON array of article URLs (defaults to the built-in list)
        #[arg(long)]
        urls: Option<PathBuf>,
        /// JSON array of {"method": ..., "params": {...}} objects
        /// (defaults to the built-in grid)
        #[arg(long)]
        configs: Option<PathBuf>,
        /// Re-summarize pairs that already have a stored result
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        cache: CacheArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fetch and parse one article
    Parse {
        url: String,
        /// Print the parsed article as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// List summarization methods and their parameters
    Methods,
    /// Print a stored summary
    Show {
        key: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))
}

pub async fn load_urls(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(defaults::urls()),
    }
}

pub async fn load_configs(path: Option<&Path>) -> Result<Vec<SummarizationConfig>> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(defaults::configurations()),
    }
}

async fn page_cache(cache: &CacheArgs) -> Result<Arc<PageCache>> {
    let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default())?);
    let store = create_page_store(Some(cache.cache_dir.as_path())).await?;
    Ok(Arc::new(PageCache::new(fetcher, store)))
}

fn extractor() -> Result<SectionExtractor> {
    SectionExtractor::new(&ExtractorConfig::default())
}

pub fn describe_methods(dispatcher: &Dispatcher) -> Result<String> {
    let mut out = String::new();
    for method in dispatcher.methods() {
        let backend = dispatcher.backend(method)?;
        out.push_str(&format!(
            "{} ({}, input budget: {})\n",
            method,
            backend.name(),
            backend.word_budget()
        ));
        for spec in backend.schema().specs() {
            out.push_str(&format!("    {:<22} {:<18} default {}\n", spec.name, spec.kind.to_string(), spec.default));
        }
    }
    Ok(out)
}

async fn show(store: Arc<dyn SummaryStore>, key: &str) -> Result<()> {
    let Some(document) = store.load(key).await? else {
        let keys = store.list_keys().await?;
        let similar: Vec<_> = keys
            .iter()
            .filter(|k| k.to_lowercase().contains(&key.to_lowercase()))
            .collect();
        println!("No summary stored under '{}'", key);
        if !similar.is_empty() {
            println!("Did you mean:");
            for k in similar {
                println!("  {}", k);
            }
        }
        return Ok(());
    };

    println!("{}", document.title);
    println!("{}", document.url);
    println!("{}", document.config);
    for (region, section) in document.summary.sections() {
        if section.is_empty() {
            continue;
        }
        println!("\n{}\n{}", region.name(), "-".repeat(region.name().len()));
        match section {
            Section::Flat(paragraphs) => println!("{}", paragraphs.join("\n")),
            Section::Nested(nested) => {
                for (title, paragraphs) in nested.iter() {
                    println!("[{}] {}", title, paragraphs.join("\n"));
                }
            }
        }
    }
    Ok(())
}

pub async fn handle_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Summarize {
            urls,
            configs,
            force,
            cache,
            output,
        } => {
            let urls = load_urls(urls.as_deref()).await?;
            let configs = load_configs(configs.as_deref()).await?;
            let manager = PipelineManager::new(
                page_cache(&cache).await?,
                extractor()?,
                create_dispatcher(config)?,
                create_summary_store(output.storage, &output.output_dir).await?,
            )
            .with_force(force);

            let report = manager.run(&urls, &configs).await;
            println!("{}", report);
            if report.failed() > 0 && report.persisted() + report.skipped() == 0 {
                return Err(Error::External(anyhow::anyhow!("every summarization failed")));
            }
        }
        PipelineCommands::Parse { url, json, cache } => {
            let page = page_cache(&cache).await?.fetch(&url).await?;
            let document = extractor()?.extract(&page)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("{}", document);
                if let Section::Nested(results) = document.text.section(Region::Results) {
                    for title in results.titles() {
                        println!("    - {}", title);
                    }
                }
            }
        }
        PipelineCommands::Methods => {
            let dispatcher = create_dispatcher(config)?;
            print!("{}", describe_methods(&dispatcher)?);
        }
        PipelineCommands::Show { key, output } => {
            show(create_summary_store(output.storage, &output.output_dir).await?, &key).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::SummarizationMethod;

    #[tokio::test]
    async fn test_load_inputs_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let urls_path = dir.path().join("urls.json");
        let configs_path = dir.path().join("configs.json");
        tokio::fs::write(&urls_path, r#"["https://www.nature.com/articles/x"]"#).await.unwrap();
        tokio::fs::write(
            &configs_path,
            r#"[{"method": "TEXTRANK", "params": {"ratio": 0.1}}, {"method": "BART", "config_kwargs": {"num_beams": 2}}, {"method": "LEAD"}]"#,
        )
        .await
        .unwrap();

        assert_eq!(load_urls(Some(urls_path.as_path())).await.unwrap().len(), 1);
        let configs = load_configs(Some(configs_path.as_path())).await.unwrap();
        assert_eq!(configs[0].method, SummarizationMethod::Textrank);
        assert_eq!(configs[1].params.len(), 1);
        assert!(configs[2].params.is_empty());
    }

    #[tokio::test]
    async fn test_defaults_without_files() {
        assert_eq!(load_urls(None).await.unwrap(), defaults::urls());
        assert_eq!(load_configs(None).await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");
        tokio::fs::write(&path, r#"[{"method": "WORD2VEC"}]"#).await.unwrap();
        assert!(matches!(load_configs(Some(path.as_path())).await, Err(Error::Parse(_))));
    }

    #[test]
    fn test_describe_methods_lists_parameters() {
        let dispatcher = create_dispatcher(&Config::default()).unwrap();
        let listing = describe_methods(&dispatcher).unwrap();
        assert!(listing.contains("TEXTRANK"));
        assert!(listing.contains("no_repeat_ngram_size"));
        assert!(listing.contains("650 words"));
        assert!(!listing.contains("GPT3"));
    }

    #[tokio::test]
    async fn test_methods_command_runs() {
        handle_command(PipelineCommands::Methods, &Config::default())
            .await
            .unwrap();
    }
}
