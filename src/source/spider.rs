use std::time::Instant;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::debug;

use super::{DocumentSource, FetchError};

/// Rendered HTML via spider.cloud.
pub struct SpiderSource {
    spider: Spider,
}

impl SpiderSource {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .map_err(|_| anyhow!("SPIDER_API_KEY environment variable must be set"))?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow!("Failed to create Spider client: {}", e))?;
        Ok(Self { spider })
    }
}

#[async_trait]
impl DocumentSource for SpiderSource {
    async fn fetch(&self, url: &str, _wait_for: Option<&str>) -> Result<String, FetchError> {
        let params = RequestParams {
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
            ..Default::default()
        };

        let start = Instant::now();
        let response = self
            .spider
            .scrape_url(url, Some(params), "application/json")
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        debug!("spider {} in {}ms", url, start.elapsed().as_millis());

        parse_response(response)
    }
}

/// The API answers with `[{ "content": ..., "status": ... }]`, sometimes as a JSON string.
fn parse_response(value: serde_json::Value) -> Result<String, FetchError> {
    let parsed: serde_json::Value = match value.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
        None => value,
    };

    let first = parsed.as_array().and_then(|arr| arr.first());

    let status = first
        .and_then(|obj| obj.get("status"))
        .and_then(|s| s.as_u64())
        .map(|s| s as u16);
    if let Some(s) = status.filter(|s| *s >= 400) {
        return Err(FetchError::Status(s));
    }

    first
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| FetchError::Request("No content in spider response".into()))
}
