use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thirtyfour::{prelude::*, ChromiumLikeCapabilities};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{DocumentSource, FetchError};
use crate::config::CrawlConfig;

const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// A headless Chrome session. Navigation is serialized: one tab, one page at a time.
pub struct BrowserSource {
    driver: Mutex<Option<WebDriver>>,
    settle: Duration,
    content_timeout: Duration,
    scroll_settle: Duration,
}

impl BrowserSource {
    pub async fn connect(config: &CrawlConfig) -> Result<Self> {
        let server =
            std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string());

        let mut caps = DesiredCapabilities::chrome();
        for arg in [
            "--headless",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
        ] {
            caps.add_arg(arg)?;
        }
        caps.add_arg(&format!("--user-agent={}", config.user_agent))?;

        info!("Starting browser session via {}", server);
        let driver = WebDriver::new(server.as_str(), caps)
            .await
            .with_context(|| format!("Failed to start WebDriver session at {}", server))?;

        Ok(Self {
            driver: Mutex::new(Some(driver)),
            settle: config.page_settle,
            content_timeout: config.content_timeout,
            scroll_settle: config.scroll_settle,
        })
    }
}

fn driver_err(e: WebDriverError) -> FetchError {
    FetchError::Driver(e.to_string())
}

#[async_trait]
impl DocumentSource for BrowserSource {
    async fn fetch(&self, url: &str, wait_for: Option<&str>) -> Result<String, FetchError> {
        let guard = self.driver.lock().await;
        let driver = guard
            .as_ref()
            .ok_or_else(|| FetchError::Driver("session already closed".into()))?;

        debug!("Navigating to {}", url);
        driver.goto(url).await.map_err(driver_err)?;
        tokio::time::sleep(self.settle).await;

        if let Some(selector) = wait_for {
            driver
                .query(By::Css(selector))
                .wait(self.content_timeout, POLL_INTERVAL)
                .first()
                .await
                .map_err(|_| FetchError::RenderTimeout {
                    selector: selector.to_string(),
                    waited: self.content_timeout,
                })?;
        }

        // Listings lazy-load further down the page.
        driver
            .execute(SCROLL_TO_BOTTOM, Vec::new())
            .await
            .map_err(driver_err)?;
        tokio::time::sleep(self.scroll_settle).await;

        driver.source().await.map_err(driver_err)
    }

    async fn close(&self) -> Result<()> {
        if let Some(driver) = self.driver.lock().await.take() {
            info!("Closing browser session");
            if let Err(e) = driver.quit().await {
                warn!("Browser session did not quit cleanly: {}", e);
            }
        }
        Ok(())
    }
}
