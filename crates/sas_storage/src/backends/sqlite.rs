use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sas_core::{Error, Result, SummarizedDocument, SummaryStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS summaries (
        key TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        method TEXT NOT NULL,
        summarized_at TEXT NOT NULL,
        document TEXT NOT NULL
    )
    "#,
];

fn storage_error(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

pub struct SqliteSummaryStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteSummaryStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl SummaryStore for SqliteSummaryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM summaries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to look up summary", e))?;
        Ok(row.is_some())
    }

    async fn store(&self, key: &str, document: &SummarizedDocument) -> Result<()> {
        let json = serde_json::to_string(document)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO summaries
            (key, title, url, method, summarized_at, document)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(&document.title)
        .bind(&document.url)
        .bind(document.config.method.as_str())
        .bind(document.summarized_at.to_rfc3339())
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to store summary", e))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<SummarizedDocument>> {
        let row = sqlx::query("SELECT document FROM summaries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to load summary", e))?;
        match row {
            Some(row) => {
                let json: String = row.get("document");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM summaries ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list summaries", e))?;
        Ok(rows.iter().map(|row| row.get::<String, _>("key")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::{ArticleText, Document, SummarizationConfig, SummarizationMethod};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_summary_store() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");
        let store = SqliteSummaryStore::new_with_path(&db_path).await.unwrap();
        assert!(store.db_path().exists());

        let document = SummarizedDocument::new(
            Document {
                title: "Test Article".to_string(),
                url: "http://example.com".to_string(),
                text: ArticleText::default(),
            },
            SummarizationConfig::new(SummarizationMethod::Bart).with_param("max_ratio", 0.2),
            ArticleText::default(),
        );

        assert!(!store.exists("k").await.unwrap());
        store.store("k", &document).await.unwrap();
        store.store("k", &document).await.unwrap();
        assert!(store.exists("k").await.unwrap());
        assert_eq!(store.load("k").await.unwrap().unwrap(), document);
        assert_eq!(store.list_keys().await.unwrap(), vec!["k".to_string()]);
    }
}
