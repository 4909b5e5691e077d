pub mod cli;
pub mod defaults;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod manager;

pub use cli::{handle_command, PipelineCommands};
pub use extract::{ExtractorConfig, SectionExtractor};
pub use fetch::{cache_key, FetchConfig, HttpFetcher, PageCache};
pub use logging::{init_logging, Logger};
pub use manager::{PairOutcome, PairState, PipelineManager, PipelineStage, RunReport};

pub mod prelude {
    pub use super::extract::SectionExtractor;
    pub use super::fetch::PageCache;
    pub use super::manager::{PipelineManager, RunReport};
    pub use sas_core::{Document, Error, Result, SummarizationConfig, SummarizedDocument};
}
