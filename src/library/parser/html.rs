//! Markup-to-text normalizer using the `scraper` crate.
//!
//! Walks the parsed DOM, dropping script, style, media and embedded-object
//! subtrees, breaking lines at block elements and collapsing whitespace.
//! Named and numeric character references are decoded by the html5ever
//! tokenizer during parsing.

use scraper::{ElementRef, Html, Node};

use crate::library::error::LibraryResult;
use crate::library::parser::{ContentDecoder, DecodedText};

/// Elements whose whole subtree is discarded.
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "img", "svg", "video", "audio", "iframe",
    "object", "embed", "picture", "source", "track", "canvas", "math",
];

/// Elements that start and end on their own line.
const BLOCKS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table", "section",
    "article", "aside", "header", "footer", "nav", "blockquote", "pre", "figure", "figcaption",
    "dt", "dd", "hr", "body",
];

/// Standalone HTML file decoder.
pub struct HtmlDecoder;

impl ContentDecoder for HtmlDecoder {
    fn decode(&self, data: &[u8]) -> LibraryResult<DecodedText> {
        let markup = String::from_utf8_lossy(data);
        Ok(DecodedText::plain(normalize_markup(&markup)))
    }
}

/// Convert raw (X)HTML markup into collapsed, line-oriented text.
pub fn normalize_markup(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut raw = String::new();
    walk(document.root_element(), false, &mut raw);
    collapse(&raw)
}

fn walk(element: ElementRef<'_>, in_pre: bool, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    let block = BLOCKS.contains(&name);
    let in_pre = in_pre || name == "pre";

    if block {
        out.push('\n');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if in_pre {
                    out.push_str(text);
                } else {
                    out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                }
            }
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    walk(child_el, in_pre, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    }
}

/// Collapse space runs within lines and blank-line runs between them.
fn collapse(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let collapsed = line
            .split(|c: char| c.is_whitespace() || c == '\u{a0}')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if collapsed.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(collapsed);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
