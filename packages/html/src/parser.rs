//! Tolerant HTML tree builder.
//!
//! Never fails: stray end tags are ignored, unclosed elements are closed at
//! the end of input, and the few implied end tags pasted markup relies on
//! (`p`, `li`, `td`/`th`, `tr`) are closed the way browsers do.

use crate::dom::{DomElement, DomNode};
use crate::tokenizer::{tokenize, HtmlToken};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{instrument, trace};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parse a document or fragment into top-level DOM nodes
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_html(source: &str) -> Vec<DomNode> {
    let mut builder = TreeBuilder::default();
    for (token, span) in tokenize(source) {
        trace!(token = %token, ?span, "html token");
        match token {
            HtmlToken::StartTag {
                name,
                attributes,
                self_closing,
            } => builder.start(name, attributes, self_closing),
            HtmlToken::EndTag(name) => builder.end(&name),
            HtmlToken::Text(text) => builder.text(text),
            HtmlToken::Comment(_) => {}
        }
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<DomNode>,
    open: Vec<DomElement>,
}

impl TreeBuilder {
    fn start(&mut self, name: String, attributes: Vec<(String, String)>, self_closing: bool) {
        self.close_implied(&name);

        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key, decode_entities(&value)))
            .collect();
        let element = DomElement {
            tag: name,
            attributes,
            children: Vec::new(),
        };

        if self_closing || is_void(&element.tag) {
            self.push(DomNode::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn close_implied(&mut self, name: &str) {
        let Some(current) = self.open.last().map(|e| e.tag.as_str()) else {
            return;
        };
        let implied = match name {
            _ if current == "p" && BLOCK_TAGS.contains(&name) => Some("p"),
            "li" => Some("li"),
            "td" | "th" => self.innermost_of(&["td", "th"], &["table", "tr"]),
            "tr" => self.innermost_of(&["tr"], &["table"]),
            _ => None,
        };
        if let Some(tag) = implied {
            if name == "li" && !self.is_open_within("li", &["ul", "ol"]) {
                return;
            }
            self.end(tag);
        }
    }

    /// The innermost open tag among `tags`, if no `boundary` tag is opened after it
    fn innermost_of(&self, tags: &[&'static str], boundary: &[&str]) -> Option<&'static str> {
        for element in self.open.iter().rev() {
            if let Some(tag) = tags.iter().find(|t| **t == element.tag) {
                return Some(*tag);
            }
            if boundary.contains(&element.tag.as_str()) {
                return None;
            }
        }
        None
    }

    fn is_open_within(&self, tag: &str, boundary: &[&str]) -> bool {
        for element in self.open.iter().rev() {
            if element.tag == tag {
                return true;
            }
            if boundary.contains(&element.tag.as_str()) {
                return false;
            }
        }
        false
    }

    fn end(&mut self, name: &str) {
        let Some(position) = self.open.iter().rposition(|e| e.tag == name) else {
            trace!(tag = name, "ignoring stray end tag");
            return;
        };
        while self.open.len() > position {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.push(DomNode::Element(element));
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.push(DomNode::Text(decode_entities(raw)));
    }

    fn push(&mut self, node: DomNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.open.is_empty() {
            self.close_top();
        }
        self.roots
    }
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
            .unwrap_or_else(|_| unreachable!("entity pattern is valid"))
    })
}

/// Decode character references; unknown named references are kept verbatim
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    entity_pattern()
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let body = caps.get(1).map_or("", |m| m.as_str());
            decode_reference(body).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

fn decode_reference(body: &str) -> Option<String> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "©",
        "reg" => "®",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &DomElement {
        node.as_element().expect("Expected element")
    }

    #[test]
    fn test_nested_structure() {
        let nodes = parse_html("<div><p>Hello <b>world</b></p></div>");
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        let p = element(&div.children[0]);
        assert_eq!(p.tag, "p");
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.text_content(), "Hello world");
    }

    #[test]
    fn test_implied_paragraph_close() {
        let nodes = parse_html("<p>one<p>two<ul><li>a<li>b</ul>");
        let tags: Vec<&str> = nodes
            .iter()
            .filter_map(DomNode::as_element)
            .map(|e| e.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["p", "p", "ul"]);
        let list = element(&nodes[2]);
        assert_eq!(list.child_elements().count(), 2);
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let nodes = parse_html("<p>a</span>b</p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text_content(), "ab");
    }

    #[test]
    fn test_unclosed_elements_closed_at_end() {
        let nodes = parse_html("<blockquote><i>open");
        assert_eq!(element(&nodes[0]).tag, "blockquote");
        assert_eq!(nodes[0].text_content(), "open");
    }

    #[test]
    fn test_void_elements() {
        let nodes = parse_html("<p>a<br>b<img src=\"x.png\">c</p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 5);
        assert_eq!(element(&p.children[3]).attr("src"), Some("x.png"));
    }

    #[test]
    fn test_table_cells_close() {
        let nodes = parse_html("<table><tr><td>a<td>b<tr><td>c</table>");
        let table = element(&nodes[0]);
        let rows: Vec<&DomElement> = table.child_elements().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].child_elements().count(), 2);
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
        let nodes = parse_html("<a title=\"x &quot;y&quot;\">t</a>");
        assert_eq!(element(&nodes[0]).attr("title"), Some("x \"y\""));
    }
}
