//! Cached webpage retrieval.
//!
//! [`PageCache`] sits between the pipeline and the network: a page is
//! downloaded at most once per cache key and served from the store after
//! that, across runs when the store is file-backed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sas_core::{Error, PageFetcher, PageStore, RawPage, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("sas/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Plain HTTP GET. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("page request failed ({})", status)));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Cache key for `url`: the URL with every non-alphanumeric character removed.
pub fn cache_key(url: &str) -> String {
    url.chars().filter(|c| c.is_alphanumeric()).collect()
}

pub struct PageCache {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PageStore>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PageCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn PageStore>) -> Self {
        Self {
            fetcher,
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the page for `url`, downloading and storing it on a miss.
    /// Concurrent callers for the same key share a single download.
    pub async fn fetch(&self, url: &str) -> Result<RawPage> {
        let key = cache_key(url);
        if key.is_empty() {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        let slot = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.clone()).or_default().clone()
        };
        let page = {
            let _guard = slot.lock().await;
            self.fetch_locked(&key, url).await
        };

        let mut in_flight = self.in_flight.lock().await;
        // Only the map and this call still hold the slot: nobody is waiting.
        if Arc::strong_count(&slot) == 2 {
            in_flight.remove(&key);
        }
        page
    }

    async fn fetch_locked(&self, key: &str, url: &str) -> Result<RawPage> {
        if let Some(content) = self.store.get(key).await? {
            debug!("Cache hit for {}", url);
            return Ok(RawPage::new(url, content));
        }

        info!("🌐 Downloading {}", url);
        let content = self.fetcher.fetch(url).await?;
        self.store.put(key, &content).await?;
        Ok(RawPage::new(url, content))
    }
}
