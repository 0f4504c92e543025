use std::time::Duration;

use tracing::{debug, warn};

use crate::config::DETAIL_CONTENT_MARKER;
use crate::parser::identifier::{extract_gstin, Found};
use crate::record::NA;
use crate::source::DocumentSource;

/// Recovers a GSTIN from a listing's detail page. Never fails the caller.
pub struct Enricher<'a> {
    source: &'a dyn DocumentSource,
    delay: Duration,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn DocumentSource, delay: Duration) -> Self {
        Self { source, delay }
    }

    /// The GSTIN, or `N/A` if the page had none or could not be fetched.
    /// Paces itself with a fixed delay after every attempt.
    pub async fn enrich(&self, detail_url: &str) -> String {
        let gstin = match self.source.fetch(detail_url, Some(DETAIL_CONTENT_MARKER)).await {
            Ok(html) => match extract_gstin(&html) {
                Some((v, found)) => {
                    debug!(
                        "GSTIN {} via {}",
                        v,
                        match found {
                            Found::Label => "label",
                            Found::PageSource => "page source",
                        }
                    );
                    v
                }
                None => NA.to_string(),
            },
            Err(e) => {
                warn!("Detail fetch failed for {}: {}", detail_url, e);
                NA.to_string()
            }
        };
        tokio::time::sleep(self.delay).await;
        gstin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use async_trait::async_trait;

    struct Fixed(Result<&'static str, u16>);

    #[async_trait]
    impl DocumentSource for Fixed {
        async fn fetch(&self, _url: &str, _wait_for: Option<&str>) -> Result<String, FetchError> {
            self.0.map(str::to_string).map_err(FetchError::Status)
        }
    }

    #[tokio::test]
    async fn labelled_gstin() {
        let src = Fixed(Ok(r#"<div><div>GSTIN</div><div class="dtl_infotext">07AAACB1234C1Z5</div></div>"#));
        let e = Enricher::new(&src, Duration::ZERO);
        assert_eq!(e.enrich("https://x/BZDET").await, "07AAACB1234C1Z5");
    }

    #[tokio::test]
    async fn no_gstin_on_page() {
        let src = Fixed(Ok("<html><body>Acme</body></html>"));
        let e = Enricher::new(&src, Duration::ZERO);
        assert_eq!(e.enrich("https://x/BZDET").await, NA);
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_sentinel() {
        let src = Fixed(Err(503));
        let e = Enricher::new(&src, Duration::ZERO);
        assert_eq!(e.enrich("https://x/BZDET").await, NA);
    }
}
