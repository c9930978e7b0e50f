// src/extract/html.rs
// =============================================================================
// Finds anchor hrefs in HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model), tolerating broken markup
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Bodies are bytes off the wire; anything that isn't valid UTF-8 is replaced
// rather than rejected, so a single odd byte doesn't hide a page's links.
// =============================================================================

use scraper::{Html, Selector};

use super::Tokenizer;

#[derive(Debug, Clone)]
pub struct HtmlTokenizer {
    anchors: Selector,
}

impl HtmlTokenizer {
    pub fn new() -> Self {
        // "a[href]" means "all <a> tags that have an href attribute". It is a
        // constant selector, so parsing it cannot fail.
        let anchors = Selector::parse("a[href]").expect("a[href] is a valid selector");
        Self { anchors }
    }
}

impl Default for HtmlTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for HtmlTokenizer {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
