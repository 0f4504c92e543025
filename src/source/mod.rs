//! Document acquisition. The crawler only sees `DocumentSource`; which transport
//! backs it is a CLI choice.

pub mod browser;
pub mod http;
pub mod spider;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;

use crate::config::CrawlConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("`{selector}` did not appear within {waited:?}")]
    RenderTimeout { selector: String, waited: Duration },
    #[error("driver error: {0}")]
    Driver(String),
}

impl FetchError {
    pub fn is_render_timeout(&self) -> bool {
        matches!(self, FetchError::RenderTimeout { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(s) => FetchError::Status(s.as_u16()),
            None => FetchError::Request(e.to_string()),
        }
    }
}

/// Fetch a URL and return its HTML. One instance is owned by one crawl.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// `wait_for` names a CSS selector whose presence marks the page as rendered.
    /// Transports that return final HTML may ignore it.
    async fn fetch(&self, url: &str, wait_for: Option<&str>) -> Result<String, FetchError>;

    /// Release the underlying session. Safe to call more than once.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Plain HTTP fetch
    Http,
    /// Headless Chrome over WebDriver
    Browser,
    /// spider.cloud rendering API
    Spider,
}

impl SourceKind {
    pub async fn open(self, config: &CrawlConfig) -> Result<Box<dyn DocumentSource>> {
        Ok(match self {
            SourceKind::Http => Box::new(http::HttpSource::new(config)?),
            SourceKind::Browser => Box::new(browser::BrowserSource::connect(config).await?),
            SourceKind::Spider => Box::new(spider::SpiderSource::from_env()?),
        })
    }
}
