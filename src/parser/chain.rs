use scraper::ElementRef;

/// One ranked way of pulling a value out of a block.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(ElementRef) -> Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Strategy(&'static str),
    Exhausted,
}

/// A value (or its absence) together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub value: Option<String>,
    pub origin: Origin,
}

/// Try each strategy in order; the first non-blank value wins.
pub fn first_hit(chain: &[Strategy], el: ElementRef) -> Field {
    for strategy in chain {
        if let Some(v) = (strategy.run)(el).map(|v| collapse_ws(&v)) {
            if !v.is_empty() {
                return Field {
                    value: Some(v),
                    origin: Origin::Strategy(strategy.name),
                };
            }
        }
    }
    Field {
        value: None,
        origin: Origin::Exhausted,
    }
}

pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapsed text content of an element. Text nodes are kept apart so
/// adjacent tags in minified markup do not run together.
pub fn text_of(el: ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn never(_: ElementRef) -> Option<String> {
        None
    }
    fn blank(_: ElementRef) -> Option<String> {
        Some("   ".into())
    }
    fn first(_: ElementRef) -> Option<String> {
        Some(" one\n  two ".into())
    }
    fn second(_: ElementRef) -> Option<String> {
        Some("second".into())
    }

    const NEVER: Strategy = Strategy { name: "never", run: never };
    const BLANK: Strategy = Strategy { name: "blank", run: blank };
    const FIRST: Strategy = Strategy { name: "first", run: first };
    const SECOND: Strategy = Strategy { name: "second", run: second };

    #[test]
    fn order_decides_the_winner() {
        let doc = Html::parse_fragment("<div></div>");
        let f = first_hit(&[NEVER, BLANK, FIRST, SECOND], doc.root_element());
        assert_eq!(f.value.as_deref(), Some("one two"));
        assert_eq!(f.origin, Origin::Strategy("first"));

        let f = first_hit(&[SECOND, FIRST], doc.root_element());
        assert_eq!(f.origin, Origin::Strategy("second"));
    }

    #[test]
    fn text_nodes_stay_separate() {
        let doc = Html::parse_fragment("<div><p>Open now</p><p>9811012345</p><b>A</b>\n <i>B</i></div>");
        assert_eq!(text_of(doc.root_element()), "Open now 9811012345 A B");
    }

    #[test]
    fn exhausted_chain() {
        let doc = Html::parse_fragment("<div></div>");
        let f = first_hit(&[NEVER, BLANK], doc.root_element());
        assert_eq!(f, Field { value: None, origin: Origin::Exhausted });
    }
}
