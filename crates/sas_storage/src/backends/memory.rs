use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use sas_core::{PageStore, Result, SummarizedDocument, SummaryStore};
use tokio::sync::RwLock;

/// Page cache storage that lives as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryPageStore {
    pages: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.pages.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        self.pages.write().await.insert(key.to_string(), content.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySummaryStore {
    documents: Arc<RwLock<BTreeMap<String, SummarizedDocument>>>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.documents.read().await.contains_key(key))
    }

    async fn store(&self, key: &str, document: &SummarizedDocument) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<SummarizedDocument>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }
}
