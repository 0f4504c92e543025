use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::chain::{first_hit, text_of, Field, Strategy};
use crate::record::NA;

static TITLE_ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3[class*='resultbox_title_anchor']").unwrap());
static TITLE_LOOSE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='resultbox_title']").unwrap());
static TITLED_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[title]").unwrap());

static CALL_CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='callcontent']").unwrap());
static CALL_ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='callNowAnchor']").unwrap());
static TEL_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href^='tel:']").unwrap());
static TEN_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{10}\b").unwrap());
static NOT_DIGIT_OR_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d,]").unwrap());

static ADDRESS_SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='address']").unwrap());
static MREHOVER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='mrehover']").unwrap());
static ADDRESS_TAG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("address").unwrap());

const NAME_CHAIN: &[Strategy] = &[
    Strategy { name: "title_anchor", run: |el| first_text(el, &TITLE_ANCHOR_SEL) },
    Strategy { name: "title_loose", run: |el| first_text(el, &TITLE_LOOSE_SEL) },
    Strategy { name: "link_title", run: |el| first_attr(el, &TITLED_LINK_SEL, "title") },
];

const PHONE_CHAIN: &[Strategy] = &[
    Strategy { name: "callcontent", run: |el| first_text(el, &CALL_CONTENT_SEL) },
    Strategy { name: "call_now_anchor", run: |el| first_text(el, &CALL_ANCHOR_SEL) },
    Strategy {
        name: "tel_link",
        run: |el| {
            first_attr(el, &TEL_LINK_SEL, "href").map(|h| h.trim_start_matches("tel:").to_string())
        },
    },
    Strategy {
        name: "ten_digit_text",
        run: |el| TEN_DIGITS_RE.find(&text_of(el)).map(|m| m.as_str().to_string()),
    },
];

const ADDRESS_CHAIN: &[Strategy] = &[
    Strategy { name: "address_span", run: |el| first_text(el, &ADDRESS_SPAN_SEL) },
    Strategy { name: "mrehover", run: |el| first_text(el, &MREHOVER_SEL) },
    Strategy { name: "address_tag", run: |el| first_text(el, &ADDRESS_TAG_SEL) },
];

/// Text of the first match only; later matches are lower-confidence duplicates.
fn first_text(el: ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(text_of)
}

fn first_attr(el: ElementRef, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .find_map(|e| e.value().attr(attr))
        .map(str::to_string)
}

pub fn extract_name(block: ElementRef) -> Field {
    first_hit(NAME_CHAIN, block)
}

pub fn extract_phone(block: ElementRef) -> Field {
    first_hit(PHONE_CHAIN, block)
}

pub fn extract_address(block: ElementRef) -> Field {
    first_hit(ADDRESS_CHAIN, block)
}

/// Keep digits and commas only. Idempotent.
pub fn clean_phone(raw: Option<&str>) -> String {
    let cleaned = NOT_DIGIT_OR_COMMA_RE.replace_all(raw.unwrap_or(""), "");
    if cleaned.is_empty() {
        NA.to_string()
    } else {
        cleaned.into_owned()
    }
}
