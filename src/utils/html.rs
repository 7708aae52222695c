//! HTML reading helpers built on `scraper`.
//!
//! All text returned from here is whitespace-normalized.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::utils::normalize_whitespace;

/// Parse a CSS selector, mapping failures to a selector error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Parse every selector in `list`.
pub fn parse_selectors(list: &[String]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

/// All text under `element`.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Only the text nodes that are direct children of `element`.
pub fn own_text(element: ElementRef<'_>) -> String {
    let raw: String = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect();
    normalize_whitespace(&raw)
}

/// Text of the first match of `selector` under `scope`, or empty.
pub fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Text of the first match of `selector` in the whole document, or empty.
pub fn document_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Text of `element`, skipping any subtree matched by `strip`.
pub fn text_without(element: ElementRef<'_>, strip: &[Selector]) -> String {
    let mut raw = String::new();
    collect_text(element, strip, &mut raw);
    normalize_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, strip: &[Selector], out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if strip.iter().any(|sel| sel.matches(&child_el)) {
                continue;
            }
            collect_text(child_el, strip, out);
        }
    }
}

/// Locate a text section by its heading.
///
/// The section is the first element sibling after the first heading whose
/// text contains `heading`, and it must match `content`. Returns `None` when
/// either is missing.
pub fn section_text(
    document: &Html,
    headings: &Selector,
    content: &Selector,
    heading: &str,
    strip: &[Selector],
) -> Option<String> {
    let heading_el = document
        .select(headings)
        .find(|h| element_text(*h).contains(heading))?;
    let body = heading_el.next_siblings().find_map(ElementRef::wrap)?;
    if !content.matches(&body) {
        return None;
    }
    Some(text_without(body, strip))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="title"> Senior
             Engineer <span>(remote)</span></div>
          <h3>About Us</h3>
          <div class="job-content">
            We build <b>tools</b>.
            <script>var ad = 1;</script>
            <ins class="adsbygoogle">AD</ins>
            <div class="autors-widget">widget</div>
            Join us.
          </div>
          <h3>Requirements</h3>
          <p>Not a content div</p>
        </body></html>
    "#;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("tr:has(a)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_own_text_skips_children() {
        let doc = Html::parse_document(PAGE);
        let sel = parse_selector(".title").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(own_text(el), "Senior Engineer");
        assert_eq!(element_text(el), "Senior Engineer (remote)");
    }

    #[test]
    fn test_section_text_strips_noise() {
        let doc = Html::parse_document(PAGE);
        let headings = parse_selector("h3").unwrap();
        let content = parse_selector("div.job-content").unwrap();
        let strip = parse_selectors(&[
            "script".to_string(),
            "ins".to_string(),
            ".autors-widget".to_string(),
        ])
        .unwrap();

        let about = section_text(&doc, &headings, &content, "About", &strip).unwrap();
        assert_eq!(about, "We build tools. Join us.");
    }

    #[test]
    fn test_section_text_missing() {
        let doc = Html::parse_document(PAGE);
        let headings = parse_selector("h3").unwrap();
        let content = parse_selector("div.job-content").unwrap();

        assert!(section_text(&doc, &headings, &content, "Requirements", &[]).is_none());
        assert!(section_text(&doc, &headings, &content, "Benefits", &[]).is_none());
    }
}
