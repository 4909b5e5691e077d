use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sas_core::{Error, PageStore, Result, SummarizedDocument, SummaryStore};
use tokio::fs;
use tracing::debug;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes `content` to a temporary sibling of `path` and renames it into
/// place.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Storage(format!("Invalid storage path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(
        ".{}.{}-{}.tmp",
        file_name,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::write(&tmp, content).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
        return Err(Error::Storage(format!("Key is not a safe file name: {:?}", key)));
    }
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Page cache storage with one file per key.
#[derive(Debug, Clone)]
pub struct FilePageStore {
    dir: PathBuf,
}

impl FilePageStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!("Failed to create cache directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PageStore for FilePageStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        read_optional(&self.dir.join(key)).await
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        check_key(key)?;
        let path = self.dir.join(key);
        debug!("Caching {} bytes at {}", content.len(), path.display());
        write_atomic(&path, content).await
    }
}

/// Summaries stored as pretty-printed `{key}.json` files.
#[derive(Debug, Clone)]
pub struct JsonSummaryStore {
    dir: PathBuf,
}

impl JsonSummaryStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!("Failed to create output directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SummaryStore for JsonSummaryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(key)?).await?)
    }

    async fn store(&self, key: &str, document: &SummarizedDocument) -> Result<()> {
        let json = serde_json::to_vec_pretty(document)?;
        write_atomic(&self.path_for(key)?, &json).await
    }

    async fn load(&self, key: &str) -> Result<Option<SummarizedDocument>> {
        match read_optional(&self.path_for(key)?).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::{ArticleText, Document, SummarizationConfig, SummarizationMethod};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_page_store_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = FilePageStore::new(temp_dir.path().join("pages")).await.unwrap();

        assert!(store.get("httpswwwnaturecomarticles1").await.unwrap().is_none());
        store.put("httpswwwnaturecomarticles1", b"<html>1</html>").await.unwrap();
        store.put("httpswwwnaturecomarticles1", b"<html>2</html>").await.unwrap();
        assert_eq!(
            store.get("httpswwwnaturecomarticles1").await.unwrap().unwrap(),
            b"<html>2</html>"
        );

        // no temporary files are left behind
        let mut entries = std::fs::read_dir(store.dir()).unwrap();
        assert_eq!(entries.next().unwrap().unwrap().file_name(), "httpswwwnaturecomarticles1");
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn test_unsafe_keys_are_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = FilePageStore::new(temp_dir.path()).await.unwrap();
        assert!(store.put("../escape", b"x").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_json_summary_store() {
        let temp_dir = tempdir().unwrap();
        let store = JsonSummaryStore::new(temp_dir.path()).await.unwrap();
        let document = SummarizedDocument::new(
            Document {
                title: "Test Article".to_string(),
                url: "http://example.com".to_string(),
                text: ArticleText::default(),
            },
            SummarizationConfig::new(SummarizationMethod::Textrank).with_param("ratio", 0.1),
            ArticleText {
                introduction: vec!["Short.".to_string()],
                ..ArticleText::default()
            },
        );

        let key = "Test-Article_TEXTRANK_ratio-0.1";
        assert!(!store.exists(key).await.unwrap());
        store.store(key, &document).await.unwrap();
        assert!(store.exists(key).await.unwrap());
        assert_eq!(store.load(key).await.unwrap().unwrap(), document);
        assert!(store.load("other").await.unwrap().is_none());
        assert_eq!(store.list_keys().await.unwrap(), vec![key.to_string()]);
    }
}
