use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::chain::text_of;

/// GSTIN shape: 2 digits, 5 letters, 4 digits, letter, alnum, literal `Z`, alnum.
static GSTIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{2}[A-Z]{5}\d{4}[A-Z][A-Z\d]Z[A-Z\d]\b").unwrap()
});
static DIV_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static INFOTEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='dtl_infotext']").unwrap());

const LABEL: &str = "GSTIN";
const DETAIL_URL_MARKER: &str = "BZDET";

pub fn find_gstin(text: &str) -> Option<&str> {
    GSTIN_RE.find(text).map(|m| m.as_str())
}

/// Only listing detail pages are worth dereferencing.
pub fn is_detail_url(url: &str) -> bool {
    url.contains(DETAIL_URL_MARKER)
}

/// Where a GSTIN was found on a detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Label,
    PageSource,
}

/// Labelled value first, then a scan of the whole page source.
pub fn extract_gstin(source: &str) -> Option<(String, Found)> {
    let doc = Html::parse_document(source);
    if let Some(v) = from_label(&doc) {
        return Some((v, Found::Label));
    }
    find_gstin(source).map(|m| (m.to_string(), Found::PageSource))
}

fn from_label(doc: &Html) -> Option<String> {
    let label = doc.select(&DIV_SEL).find(|el| own_text(*el).contains(LABEL))?;
    let parent = label.parent().and_then(ElementRef::wrap)?;
    let value = parent.select(&INFOTEXT_SEL).next().map(text_of)?;
    find_gstin(&value).map(str::to_string)
}

/// Text of the element's direct text children only.
fn own_text(el: ElementRef) -> String {
    el.children()
        .filter_map(|c| c.value().as_text())
        .map(|t| &**t)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_gstin(s: &str) -> bool {
        find_gstin(s).is_some_and(|m| m == s.trim())
    }

    #[test]
    fn pattern_accepts_and_rejects() {
        assert!(is_gstin("07AAACB1234C1Z5"));
        assert!(is_gstin("27ABCDE1234F2ZA"));
        // missing literal Z
        assert!(!is_gstin("07AAACB1234C1X5"));
        assert!(!is_gstin("7AAACB1234C1Z5"));
        assert!(!is_gstin("07aaacb1234c1z5"));
        assert!(!is_gstin("N/A"));
    }

    #[test]
    fn finds_embedded_identifier() {
        assert_eq!(find_gstin("GSTIN: 07AAACB1234C1Z5 (verified)"), Some("07AAACB1234C1Z5"));
        assert_eq!(find_gstin("X07AAACB1234C1Z5"), None);
    }

    #[test]
    fn detail_url_shape() {
        assert!(is_detail_url("https://www.justdial.com/Delhi/Acme-Karol-Bagh/011PXX11-XX11-BZDET"));
        assert!(!is_detail_url("https://www.justdial.com/Delhi/Timber-Merchants"));
    }

    #[test]
    fn labelled_value_wins() {
        let html = r#"<div class="dtl_row"><div>GSTIN</div>
            <div class="dtl_infotext"> 07AAACB1234C1Z5 </div></div>
            <script>var other = "29AAACB1234C1Z9";</script>"#;
        let (v, found) = extract_gstin(html).unwrap();
        assert_eq!(v, "07AAACB1234C1Z5");
        assert_eq!(found, Found::Label);
    }

    #[test]
    fn falls_back_to_page_source() {
        let html = r#"<div><div>GSTIN</div><div class="dtl_infotext">Not registered</div></div>
            <meta data-gst="29AAACB1234C1Z9">"#;
        let (v, found) = extract_gstin(html).unwrap();
        assert_eq!(v, "29AAACB1234C1Z9");
        assert_eq!(found, Found::PageSource);
    }

    #[test]
    fn label_must_be_a_div() {
        let html = r#"<html><head><title>GSTIN lookup</title></head><body>
            <div class="dtl_infotext">27ABCDE1234F2ZA</div>
            <div class="dtl_row"><div>GSTIN</div><div class="dtl_infotext">07AAACB1234C1Z5</div></div>
            </body></html>"#;
        let (v, found) = extract_gstin(html).unwrap();
        assert_eq!(v, "07AAACB1234C1Z5");
        assert_eq!(found, Found::Label);
    }

    #[test]
    fn script_mention_is_not_a_label() {
        let html = r#"<html><body><div class="dtl_infotext">27ABCDE1234F2ZA</div>
            <script>window.__DATA__ = {"label":"GSTIN"};</script></body></html>"#;
        let (_, found) = extract_gstin(html).unwrap();
        assert_eq!(found, Found::PageSource);
    }

    #[test]
    fn nothing_found() {
        assert_eq!(extract_gstin("<html><body>Acme Timber</body></html>"), None);
    }

    #[test]
    fn detail_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/detail_page.html").unwrap();
        let (v, found) = extract_gstin(&html).unwrap();
        assert_eq!(v, "07AAACB1234C1Z5");
        assert_eq!(found, Found::Label);
    }
}
