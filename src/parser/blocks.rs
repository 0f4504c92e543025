use std::collections::HashSet;
use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Anchor selectors tried in order; the first one with any hit defines the blocks.
static ANCHOR_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["h3[class*='resultbox_title_anchor']", "[class*='resultbox_title']"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static HREF_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// An owned snapshot of one record block, detached from the page document.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub html: String,
    pub detail_url: Option<String>,
}

/// Enumerate candidate record blocks on a listing page.
pub fn locate(doc: &Html, page_url: &str) -> Vec<RawBlock> {
    let base = Url::parse(page_url).ok();

    for sel in ANCHOR_SELS.iter() {
        let anchors: Vec<ElementRef> = doc.select(sel).collect();
        if anchors.is_empty() {
            continue;
        }

        let mut seen = HashSet::new();
        let mut blocks = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let container = container_of(anchor);
            if !seen.insert(container.id()) {
                continue;
            }
            blocks.push(RawBlock {
                html: container.html(),
                detail_url: detail_href(anchor).and_then(|h| resolve(base.as_ref(), h)),
            });
        }
        return blocks;
    }

    Vec::new()
}

/// The outer of the nearest `li` and the nearest `div.*resultbox*` ancestor, else the
/// anchor's parent.
fn container_of(anchor: ElementRef<'_>) -> ElementRef<'_> {
    let ancestors: Vec<ElementRef> = anchor.ancestors().filter_map(ElementRef::wrap).collect();
    let item = ancestors.iter().position(|el| el.value().name() == "li");
    let resultbox = ancestors.iter().position(|el| {
        el.value().name() == "div"
            && el.value().attr("class").is_some_and(|c| c.contains("resultbox"))
    });

    // Ancestors run inside-out, so the larger index is the outer element.
    match item.max(resultbox) {
        Some(i) => ancestors[i],
        None => anchor
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|p| p.value().name() != "html")
            .unwrap_or(anchor),
    }
}

fn detail_href<'a>(anchor: ElementRef<'a>) -> Option<&'a str> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .or_else(|| anchor.select(&HREF_SEL).find_map(|a| a.value().attr("href")))
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(b) => b.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.justdial.com/new-delhi/timber-suppliers";

    #[test]
    fn one_block_per_list_item() {
        let html = r#"<ul>
            <li class="cntanr"><a href="/Delhi/Acme-BZDET"><h3 class="resultbox_title_anchor">Acme</h3></a></li>
            <li class="cntanr"><h3 class="resultbox_title_anchor">Beta</h3></li>
        </ul>"#;
        let doc = Html::parse_document(html);
        let blocks = locate(&doc, PAGE);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].html.starts_with("<li"));
        assert_eq!(
            blocks[0].detail_url.as_deref(),
            Some("https://www.justdial.com/Delhi/Acme-BZDET")
        );
        assert_eq!(blocks[1].detail_url, None);
    }

    #[test]
    fn resultbox_container_without_list() {
        let html = r#"<div class="resultbox jsx-1"><div class="resultbox_info">
            <h3 class="resultbox_title_anchor"><a href="https://www.justdial.com/x/BZDET">Gamma</a></h3>
            <span class="callcontent">9811012345</span></div></div>"#;
        let doc = Html::parse_document(html);
        let blocks = locate(&doc, PAGE);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].html.contains("callcontent"));
        assert_eq!(blocks[0].detail_url.as_deref(), Some("https://www.justdial.com/x/BZDET"));
    }

    #[test]
    fn list_item_wins_over_inner_resultbox() {
        let html = r#"<ul><li><div class="resultbox_info"><a href="/x-BZDET"><h3 class="resultbox_title_anchor">Acme</h3></a></div><div class="actions"><span class="callcontent">9811012345</span><span class="resultbox_address">Karol Bagh</span></div></li></ul>"#;
        let doc = Html::parse_document(html);
        let blocks = locate(&doc, PAGE);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].html.starts_with("<li"));
        assert!(blocks[0].html.contains("callcontent"));
        assert!(blocks[0].html.contains("Karol Bagh"));
    }

    #[test]
    fn bare_parent_when_no_container() {
        let html = r#"<section><div class="card"><h3 class="resultbox_title_anchor">Solo</h3></div></section>"#;
        let doc = Html::parse_document(html);
        let blocks = locate(&doc, PAGE);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].html.starts_with(r#"<div class="card">"#));
    }

    #[test]
    fn falls_back_to_loose_title_selector() {
        let html = r#"<ul><li><h2 class="resultbox_title_v2">Delta</h2></li></ul>"#;
        let doc = Html::parse_document(html);
        assert_eq!(locate(&doc, PAGE).len(), 1);
    }

    #[test]
    fn shared_container_is_not_repeated() {
        let html = r#"<ul><li>
            <h3 class="resultbox_title_anchor">Acme</h3>
            <h3 class="resultbox_title_anchor">Acme (branch)</h3>
        </li></ul>"#;
        let doc = Html::parse_document(html);
        assert_eq!(locate(&doc, PAGE).len(), 1);
    }

    #[test]
    fn empty_page_has_no_blocks() {
        let doc = Html::parse_document("<html><body><p>No results</p></body></html>");
        assert!(locate(&doc, PAGE).is_empty());
    }
}
