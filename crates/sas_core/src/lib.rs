pub mod error;
pub mod models;
pub mod params;
pub mod storage;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use models::{PageFetcher, SummarizationBackend};
pub use params::{ConfigSchema, ParamKind, ParamSpec, ResolvedParams};
pub use storage::{PageStore, SummaryStore};
pub use text::{compress, word_count, WordBudget};
pub use types::{
    ArticleText, Document, NestedText, ParamValue, RawPage, Region, Section, SummarizationConfig,
    SummarizationMethod, SummarizedDocument,
};
