use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::{DocumentSource, FetchError};
use crate::config::CrawlConfig;

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, url: &str, _wait_for: Option<&str>) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.text().await?)
    }
}
