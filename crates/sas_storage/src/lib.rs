use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use sas_core::{Error, PageStore, Result, SummaryStore};

pub mod backends;

pub use backends::*;

/// Where summarized articles are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StorageKind {
    /// One JSON file per result in the output directory.
    #[default]
    Json,
    /// Process memory only; nothing survives the run.
    Memory,
    /// A `summaries.db` SQLite database in the output directory.
    Sqlite,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Json => f.write_str("json"),
            StorageKind::Memory => f.write_str("memory"),
            StorageKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StorageKind::Json),
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

pub async fn create_summary_store(kind: StorageKind, output_dir: &Path) -> Result<Arc<dyn SummaryStore>> {
    match kind {
        StorageKind::Json => Ok(Arc::new(JsonSummaryStore::new(output_dir).await?)),
        StorageKind::Memory => Ok(Arc::new(MemorySummaryStore::new())),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Ok(Arc::new(
            SqliteSummaryStore::new_with_path(&output_dir.join("summaries.db")).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::Storage(
            "SQLite storage requires the `sqlite` feature".to_string(),
        )),
    }
}

pub async fn create_page_store(cache_dir: Option<&Path>) -> Result<Arc<dyn PageStore>> {
    match cache_dir {
        Some(dir) => Ok(Arc::new(FilePageStore::new(dir).await?)),
        None => Ok(Arc::new(MemoryPageStore::new())),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_page_store, create_summary_store, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind_from_str() {
        assert_eq!("JSON".parse::<StorageKind>().unwrap(), StorageKind::Json);
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("postgres".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_stores() {
        let store = create_summary_store(StorageKind::Memory, Path::new("unused")).await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());

        let pages = create_page_store(None).await.unwrap();
        assert!(pages.get("missing").await.unwrap().is_none());
    }
}
