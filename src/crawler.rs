use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{CrawlConfig, RenderTimeoutPolicy, CONTENT_MARKER};
use crate::dedup::dedupe;
use crate::enrich::Enricher;
use crate::parser::{self, identifier::is_detail_url};
use crate::progress::{PageBudget, ProgressReporter, ProgressTracker};
use crate::record::{CrawlRequest, CrawlResult, Record, StopReason};
use crate::source::{DocumentSource, SourceKind};

/// Acquire a source, crawl, and release the source. Only acquisition can fail.
pub async fn scrape(
    request: &CrawlRequest,
    kind: SourceKind,
    config: &CrawlConfig,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<CrawlResult> {
    let source = kind
        .open(config)
        .await
        .with_context(|| format!("Failed to open {:?} document source", kind))?;
    Ok(run(source.as_ref(), request, config, progress, cancel).await)
}

/// Crawl with an already-acquired source, closing it afterwards whatever happened.
pub async fn run(
    source: &dyn DocumentSource,
    request: &CrawlRequest,
    config: &CrawlConfig,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> CrawlResult {
    let result = crawl(source, request, config, progress, cancel).await;
    if let Err(e) = source.close().await {
        warn!("Failed to close document source: {}", e);
    }
    result
}

async fn crawl(
    source: &dyn DocumentSource,
    request: &CrawlRequest,
    config: &CrawlConfig,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> CrawlResult {
    let tracker = ProgressTracker::new(progress);
    let enricher = Enricher::new(source, config.detail_delay);
    let max_pages = request.max_pages;

    let mut records: Vec<Record> = Vec::new();
    let mut pages_visited = 0;
    let mut stop = StopReason::MaxPages;

    'pages: for page in 1..=max_pages {
        if cancel.is_cancelled() {
            stop = StopReason::Cancelled { page };
            break;
        }

        let budget = PageBudget { page, max_pages };
        let url = config.page_url(&request.location, &request.search_term, page);
        tracker.report(
            &format!("Scraping page {}/{}...", page, max_pages),
            budget.fetch_start(),
        );
        info!("Fetching page {}/{}: {}", page, max_pages, url);

        let html = match source.fetch(&url, Some(CONTENT_MARKER)).await {
            Ok(html) => html,
            Err(e)
                if e.is_render_timeout()
                    && config.on_render_timeout == RenderTimeoutPolicy::Skip =>
            {
                warn!("Skipping page {}: {}", page, e);
                tracker.report(
                    &format!("Page {} took too long to load", page),
                    budget.page_done(),
                );
                continue;
            }
            Err(e) => {
                warn!("Stopping on page {}: {}", page, e);
                tracker.report(&format!("Error on page {}: {}", page, e), budget.fetch_start());
                stop = StopReason::Aborted {
                    page,
                    reason: e.to_string(),
                };
                break;
            }
        };
        pages_visited += 1;

        let scan = parser::scan_page(&html, &url);
        if scan.blocks == 0 {
            info!("No listings on page {}, stopping", page);
            tracker.report(&format!("No listings found on page {}", page), budget.page_done());
            stop = StopReason::NoResults { page };
            break;
        }
        info!(
            "Page {}: {} blocks, {} with a name",
            page,
            scan.blocks,
            scan.listings.len()
        );
        tracker.report(
            &format!("Found {} listings on page {}", scan.listings.len(), page),
            budget.scanned(),
        );

        let total = scan.listings.len();
        for (idx, listing) in scan.listings.into_iter().enumerate() {
            let detail_url = listing
                .detail_url
                .as_deref()
                .filter(|u| request.include_enrichment && is_detail_url(u));

            let gstin = match detail_url {
                Some(detail_url) => {
                    if cancel.is_cancelled() {
                        stop = StopReason::Cancelled { page };
                        break 'pages;
                    }
                    let short: String = listing.name.chars().take(30).collect();
                    tracker.report(
                        &format!("Fetching GSTIN for {}...", short),
                        budget.enriched(idx, total),
                    );
                    Some(enricher.enrich(detail_url).await)
                }
                None => None,
            };

            records.push(Record::new(
                &listing.name,
                listing.phone.as_deref(),
                gstin.as_deref(),
                listing.address.as_deref(),
                request,
            ));
        }
        tracker.report(&format!("Finished page {}/{}", page, max_pages), budget.page_done());

        if page < max_pages {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(config.page_delay) => {}
            }
        }
    }

    let extracted = records.len();
    let records = dedupe(records);
    info!(
        "Crawl finished ({}): {} extracted, {} unique",
        stop,
        extracted,
        records.len()
    );
    tracker.report("Scraping completed", 1.0);

    CrawlResult {
        records,
        extracted,
        pages_visited,
        stop,
    }
}
