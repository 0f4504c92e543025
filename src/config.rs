use std::time::Duration;

use clap::ValueEnum;

pub const BASE_URL: &str = "https://www.justdial.com";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
/// Present once a listing page has rendered its result titles.
pub const CONTENT_MARKER: &str = "h3";
/// Present on any rendered detail page.
pub const DETAIL_CONTENT_MARKER: &str = "body";

const PAGE_SETTLE_MS: u64 = 3000;
const CONTENT_TIMEOUT_MS: u64 = 10_000;
const SCROLL_SETTLE_MS: u64 = 2000;
const DETAIL_DELAY_MS: u64 = 1000;
const PAGE_DELAY_MS: u64 = 2000;
const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// What to do when a page's content marker never shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RenderTimeoutPolicy {
    /// Skip the page and move on to the next one
    #[default]
    Skip,
    /// Stop the crawl, keeping what was gathered
    Abort,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub user_agent: String,
    pub page_settle: Duration,
    pub content_timeout: Duration,
    pub scroll_settle: Duration,
    /// Pause after each detail-page fetch.
    pub detail_delay: Duration,
    /// Pause between listing pages.
    pub page_delay: Duration,
    pub request_timeout: Duration,
    pub on_render_timeout: RenderTimeoutPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            page_settle: Duration::from_millis(PAGE_SETTLE_MS),
            content_timeout: Duration::from_millis(CONTENT_TIMEOUT_MS),
            scroll_settle: Duration::from_millis(SCROLL_SETTLE_MS),
            detail_delay: Duration::from_millis(DETAIL_DELAY_MS),
            page_delay: Duration::from_millis(PAGE_DELAY_MS),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            on_render_timeout: RenderTimeoutPolicy::Skip,
        }
    }
}

/// Lowercase, trimmed, whitespace runs collapsed to single hyphens.
pub fn slug(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl CrawlConfig {
    pub fn page_url(&self, location: &str, search_term: &str, page: u32) -> String {
        let base = self.base_url.trim_end_matches('/');
        match page {
            0 | 1 => format!("{}/{}/{}", base, slug(location), slug(search_term)),
            n => format!("{}/{}/{}/page-{}", base, slug(location), slug(search_term), n),
        }
    }
}
