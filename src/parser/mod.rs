pub mod blocks;
pub mod chain;
pub mod fields;
pub mod identifier;

use rayon::prelude::*;
use scraper::Html;
use tracing::debug;

use blocks::RawBlock;

/// Fields pulled from one record block, before sentinel filling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub detail_url: Option<String>,
}

pub struct PageScan {
    /// Candidate blocks found, including ones later dropped for lacking a name.
    pub blocks: usize,
    pub listings: Vec<Listing>,
}

/// Two-pass scan: page → owned block fragments → listings (in parallel, order kept).
pub fn scan_page(html: &str, page_url: &str) -> PageScan {
    let raw = {
        let doc = Html::parse_document(html);
        blocks::locate(&doc, page_url)
    };
    let listings = raw.par_iter().filter_map(extract_listing).collect();
    PageScan {
        blocks: raw.len(),
        listings,
    }
}

/// Blocks without a derivable name are dropped.
pub fn extract_listing(block: &RawBlock) -> Option<Listing> {
    let fragment = Html::parse_fragment(&block.html);
    let root = fragment.root_element();

    let name = fields::extract_name(root);
    let phone = fields::extract_phone(root);
    let address = fields::extract_address(root);
    debug!(
        name_from = ?name.origin,
        phone_from = ?phone.origin,
        address_from = ?address.origin,
        "block fields"
    );

    Some(Listing {
        name: name.value?,
        phone: phone.value,
        address: address.value,
        detail_url: block.detail_url.clone(),
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.justdial.com/new-delhi/timber-suppliers";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn listing_fixture() {
        let scan = scan_page(&fixture("listing_page"), PAGE);
        assert_eq!(scan.blocks, 4);
        // one block has no name anywhere
        assert_eq!(scan.listings.len(), 3);

        let names: Vec<&str> = scan.listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Shree Balaji Timber Traders", "Gupta Plywood & Timber", "Delhi Wood Depot"]);

        assert_eq!(scan.listings[0].phone.as_deref(), Some("+91 98110 12345"));
        assert_eq!(scan.listings[1].phone.as_deref(), Some("9876543210"));
        assert_eq!(scan.listings[2].phone, None);

        assert_eq!(scan.listings[0].address.as_deref(), Some("Kirti Nagar, New Delhi"));
        assert_eq!(scan.listings[2].address, None);

        assert!(scan.listings[0]
            .detail_url
            .as_deref()
            .is_some_and(identifier::is_detail_url));
        assert!(scan.listings[1]
            .detail_url
            .as_deref()
            .is_some_and(|u| !identifier::is_detail_url(u)));
    }

    #[test]
    fn fields_outside_the_title_box() {
        let html = r#"<ul><li><div class="resultbox_info"><a href="/x-BZDET"><h3 class="resultbox_title_anchor">Acme</h3></a></div><div class="actions"><span class="callcontent">9811012345</span><span class="resultbox_address">Karol Bagh</span></div></li></ul>"#;
        let scan = scan_page(html, PAGE);
        assert_eq!(scan.listings.len(), 1);
        let l = &scan.listings[0];
        assert_eq!(l.name, "Acme");
        assert_eq!(l.phone.as_deref(), Some("9811012345"));
        assert_eq!(l.address.as_deref(), Some("Karol Bagh"));
        assert_eq!(l.detail_url.as_deref(), Some("https://www.justdial.com/x-BZDET"));
    }

    #[test]
    fn nameless_block_is_dropped() {
        let block = RawBlock {
            html: r#"<li><span class="callcontent">9811012345</span></li>"#.into(),
            detail_url: None,
        };
        assert_eq!(extract_listing(&block), None);
    }

    #[test]
    fn empty_results_page() {
        let scan = scan_page(&fixture("empty_page"), PAGE);
        assert_eq!(scan.blocks, 0);
        assert!(scan.listings.is_empty());
    }
}
