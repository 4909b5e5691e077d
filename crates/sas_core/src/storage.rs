use async_trait::async_trait;

use crate::types::SummarizedDocument;
use crate::Result;

/// Durable key-value byte storage backing the page cache.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Returns the stored bytes, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `content` under `key`. Readers never observe a partial write.
    async fn put(&self, key: &str, content: &[u8]) -> Result<()>;
}

/// Storage for summarized articles, keyed by result name.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    async fn store(&self, key: &str, document: &SummarizedDocument) -> Result<()>;

    async fn load(&self, key: &str) -> Result<Option<SummarizedDocument>>;

    /// All stored keys, sorted.
    async fn list_keys(&self) -> Result<Vec<String>>;
}
