//! Thin adapter over the HTML parser.
//!
//! Wraps `html_scraper` behind the small query surface the extraction pipeline
//! needs: select-first, select-all, attributes, normalized text, and the same
//! operations scoped to a subtree. Malformed input produces an empty document
//! rather than an error; the pipeline treats an empty document as "no data".

use html_scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Canonical cleanup for text lifted out of a document or its metadata: HTML
/// entities decoded, Unicode NFC applied, and every whitespace run (nbsp
/// included) collapsed to a single space in one pass.
pub fn clean_text(raw: &str) -> String {
    use std::borrow::Cow;
    use unicode_normalization::UnicodeNormalization;

    let decoded: Cow<'_, str> = if raw.contains('&') {
        htmlize::unescape(raw)
    } else {
        Cow::Borrowed(raw)
    };

    let mut cleaned = String::with_capacity(decoded.len());
    let mut gap_pending = false;
    for ch in decoded.nfc() {
        if ch.is_whitespace() {
            gap_pending = !cleaned.is_empty();
        } else {
            if gap_pending {
                cleaned.push(' ');
                gap_pending = false;
            }
            cleaned.push(ch);
        }
    }
    cleaned
}

/// Cleaned text content of an element's subtree.
fn text_of(e: ElementRef) -> String {
    clean_text(&e.text().collect::<String>())
}

/// Parse a CSS selector, logging and returning `None` on syntax errors.
///
/// Selector lists are data; a bad entry must skip, not panic.
fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(selector, error = %e, "invalid CSS selector, skipping");
            None
        }
    }
}

/// A parsed document, queryable by CSS selector.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse raw bytes into a document. Invalid UTF-8 is replaced lossily and
    /// malformed markup is recovered by the parser; neither is an error here.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        Self {
            html: Html::parse_document(&text),
        }
    }

    /// True when the document carries no usable content: nothing inside
    /// `<head>` or `<body>` and no body text. Metadata-only documents (a lone
    /// structured-data script) still count as content.
    pub fn is_empty(&self) -> bool {
        if self.first("head *, body *").is_some() {
            return false;
        }
        self.body_text().is_empty()
    }

    fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let parsed = parse_selector(selector)?;
        self.html.select(&parsed).next()
    }

    /// First element matching `selector`, as a queryable node.
    pub fn select_first(&self, selector: &str) -> Option<Node<'_>> {
        self.first(selector).map(Node)
    }

    /// All elements matching `selector`, in document order.
    pub fn select_all(&self, selector: &str) -> Vec<Node<'_>> {
        let Some(parsed) = parse_selector(selector) else {
            return Vec::new();
        };
        self.html.select(&parsed).map(Node).collect()
    }

    /// The same query operations, anchored to the subtree under the first
    /// match of `selector`. `None` when the anchor is absent.
    pub fn scoped(&self, selector: &str) -> Option<Section<'_>> {
        self.first(selector).map(Section)
    }

    /// Normalized text of the whole `<body>`, empty string when absent.
    pub fn body_text(&self) -> String {
        self.first("body").map(text_of).unwrap_or_default()
    }
}

/// A single element, exposing trimmed text and attribute access.
#[derive(Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Cleaned, whitespace-collapsed text content.
    pub fn text(&self) -> String {
        text_of(self.0)
    }

    /// Concatenated text content with no cleanup at all. For machine-readable
    /// payloads (embedded JSON) where entity decoding or whitespace collapse
    /// would corrupt the data.
    pub fn raw_text(&self) -> String {
        self.0.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.attr(name)
    }
}

/// A subtree anchored at a selector match. Queries never escape the anchor,
/// which is what keeps neighboring-entity text out of scoped decisions.
#[derive(Clone, Copy)]
pub struct Section<'a>(ElementRef<'a>);

impl<'a> Section<'a> {
    pub fn select_first(&self, selector: &str) -> Option<Node<'a>> {
        let parsed = parse_selector(selector)?;
        self.0.select(&parsed).next().map(Node)
    }

    pub fn select_all(&self, selector: &str) -> Vec<Node<'a>> {
        let Some(parsed) = parse_selector(selector) else {
            return Vec::new();
        };
        self.0.select(&parsed).map(Node).collect()
    }

    /// Normalized text of the whole subtree.
    pub fn text(&self) -> String {
        text_of(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_first_and_text() {
        let html = "<html><body><h1 class=\"profile\">Lincoln  High\u{00A0}School</h1></body></html>";
        let doc = Document::parse(html.as_bytes());
        let node = doc.select_first("h1.profile").unwrap();
        assert_eq!(node.text(), "Lincoln High School");
    }

    #[test]
    fn test_clean_text_decodes_and_collapses() {
        assert_eq!(clean_text("Lewis &amp; Clark   High"), "Lewis & Clark High");
        assert_eq!(clean_text("  \t\n  "), "");
        assert_eq!(clean_text("A\u{00A0}B"), "A B");
    }

    #[test]
    fn test_raw_text_preserves_payload() {
        let doc = Document::parse(
            b"<script type=\"module\">{\n \"a\": \"&amp;\"\n}</script>",
        );
        let raw = doc.select_first("script").unwrap().raw_text();
        assert!(raw.contains("&amp;"));
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_malformed_input_yields_document_not_error() {
        // Invalid UTF-8 and broken markup both recover into a queryable tree.
        let doc = Document::parse(&[0xFF, 0xFE, 0x00]);
        assert!(doc.select_first("div").is_none());

        let doc = Document::parse(b"<div><p>unclosed");
        assert_eq!(doc.select_first("p").unwrap().text(), "unclosed");
    }

    #[test]
    fn test_scoped_queries_do_not_escape_anchor() {
        let doc = Document::parse(
            b"<div id=\"rankings\"><strong>Unranked</strong></div>\
              <div id=\"nearby\"><strong>#54</strong></div>",
        );
        let section = doc.scoped("#rankings").unwrap();
        assert_eq!(section.select_all("strong").len(), 1);
        assert_eq!(section.text(), "Unranked");
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let doc = Document::parse(b"<p>hello</p>");
        assert!(doc.select_first("p[[").is_none());
        assert!(doc.select_all("p[[").is_empty());
    }

    #[test]
    fn test_attr_access() {
        let doc = Document::parse(b"<a href=\"https://example.org\">site</a>");
        let node = doc.select_first("a").unwrap();
        assert_eq!(node.attr("href"), Some("https://example.org"));
    }

    #[test]
    fn test_empty_document_detection() {
        assert!(Document::parse(b"").is_empty());
        assert!(Document::parse(b"   \n  ").is_empty());
        assert!(!Document::parse(b"<p>x</p>").is_empty());
    }
}
