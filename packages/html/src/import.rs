//! # DOM → Node import
//!
//! A [`ConversionMap`] maps a tag name to the conversions that claim it.
//! Several node types may claim the same tag (a generic paragraph and a
//! YouTube embed both claim `div`); candidates are tried by priority, highest
//! first, ties broken by node type name, so declaration order never matters.
//! The first conversion that accepts the element wins. Elements nobody
//! claims are dropped and their children lifted into the parent.

use crate::dom::{DomElement, DomNode};
use crate::export::YOUTUBE_EMBED_BASE;
use crate::parser::parse_html;
use quire_model::{
    Dimension, ElementKind, ElementNode, Fragment, HeadingLevel, ImageNode, LinkAttributes,
    ListType, NodeKind, TextFormat, TextNode,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// What an accepted element turns into
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// A node; element nodes receive the converted children
    Node(NodeKind),
    /// No node; the format and style apply to descendant text
    Format {
        format: TextFormat,
        style: Option<String>,
    },
    /// Literal text, e.g. a line break
    Text(String),
    /// Drop the element and its content
    Ignore,
}

pub type ConvertFn = fn(&DomElement) -> Option<Conversion>;

#[derive(Clone, Copy)]
pub struct DomConversion {
    pub node_type: &'static str,
    pub priority: u8,
    pub convert: ConvertFn,
}

#[derive(Clone)]
pub struct ConversionMap {
    by_tag: HashMap<String, Vec<DomConversion>>,
}

impl ConversionMap {
    pub fn empty() -> Self {
        Self {
            by_tag: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: &str, node_type: &'static str, priority: u8, convert: ConvertFn) {
        let candidates = self.by_tag.entry(tag.to_ascii_lowercase()).or_default();
        candidates.push(DomConversion {
            node_type,
            priority,
            convert,
        });
        candidates.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.node_type.cmp(b.node_type))
        });
    }

    pub fn candidates(&self, tag: &str) -> &[DomConversion] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resolve(&self, element: &DomElement) -> Option<Conversion> {
        self.candidates(&element.tag)
            .iter()
            .find_map(|candidate| (candidate.convert)(element))
    }
}

impl Default for ConversionMap {
    fn default() -> Self {
        let mut map = Self::empty();

        map.register("p", "paragraph", 0, |_| Some(Conversion::Node(NodeKind::paragraph())));
        map.register("div", "paragraph", 0, |_| Some(Conversion::Node(NodeKind::paragraph())));
        for tag in ["h1", "h2", "h3", "h4", "h5", "h6"] {
            map.register(tag, "heading", 0, convert_heading);
        }
        map.register("blockquote", "quote", 0, |_| Some(Conversion::Node(NodeKind::quote())));
        map.register("ul", "list", 0, convert_list);
        map.register("ol", "list", 0, convert_list);
        map.register("li", "listitem", 0, |_| Some(Conversion::Node(NodeKind::list_item(1))));
        map.register("pre", "code", 0, convert_code);
        map.register("table", "table", 0, |_| Some(Conversion::Node(NodeKind::table())));
        map.register("tr", "tablerow", 0, |_| Some(Conversion::Node(NodeKind::table_row())));
        map.register("td", "tablecell", 0, convert_table_cell);
        map.register("th", "tablecell", 0, convert_table_cell);
        map.register("a", "link", 0, convert_link);
        map.register("img", "image", 0, convert_image);
        map.register("hr", "horizontal-rule", 0, |_| Some(Conversion::Node(NodeKind::divider())));
        map.register("iframe", "youtube", 1, convert_youtube);
        map.register("div", "youtube", 1, convert_youtube);

        for tag in [
            "strong", "b", "em", "i", "u", "s", "strike", "del", "code", "sub", "sup", "mark",
        ] {
            map.register(tag, "text", 0, convert_format_tag);
        }
        map.register("span", "text", 0, convert_span);
        map.register("br", "linebreak", 0, |_| Some(Conversion::Text("\n".to_string())));
        for tag in ["script", "style", "head", "template", "noscript"] {
            map.register(tag, "ignored", 0, |_| Some(Conversion::Ignore));
        }
        map
    }
}

fn convert_format_tag(element: &DomElement) -> Option<Conversion> {
    let format = match element.tag.as_str() {
        "strong" | "b" => TextFormat::BOLD,
        "em" | "i" => TextFormat::ITALIC,
        "u" => TextFormat::UNDERLINE,
        "s" | "strike" | "del" => TextFormat::STRIKETHROUGH,
        "code" => TextFormat::CODE,
        "sub" => TextFormat::SUBSCRIPT,
        "sup" => TextFormat::SUPERSCRIPT,
        "mark" => TextFormat::HIGHLIGHT,
        _ => return None,
    };
    Some(Conversion::Format {
        format,
        style: None,
    })
}

fn convert_heading(element: &DomElement) -> Option<Conversion> {
    HeadingLevel::from_tag(&element.tag).map(|level| Conversion::Node(NodeKind::heading(level)))
}

fn convert_list(element: &DomElement) -> Option<Conversion> {
    let list_type = if element.tag == "ol" {
        ListType::Number
    } else {
        ListType::Bullet
    };
    let start = element
        .attr("start")
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(1);
    Some(Conversion::Node(NodeKind::Element(ElementNode::new(
        ElementKind::List { list_type, start },
    ))))
}

fn convert_code(element: &DomElement) -> Option<Conversion> {
    let language = element
        .attr("data-language")
        .or_else(|| element.attr("data-highlight-language"))
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    Some(Conversion::Node(NodeKind::code(language)))
}

fn convert_table_cell(element: &DomElement) -> Option<Conversion> {
    let span = |name: &str| {
        element
            .attr(name)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    };
    Some(Conversion::Node(NodeKind::Element(ElementNode::new(
        ElementKind::TableCell {
            header: element.tag == "th",
            col_span: span("colspan"),
            row_span: span("rowspan"),
        },
    ))))
}

fn convert_link(element: &DomElement) -> Option<Conversion> {
    let href = element.attr("href")?;
    let link = LinkAttributes {
        url: href.to_string(),
        target: element.attr("target").map(str::to_string),
        rel: element.attr("rel").map(str::to_string),
        title: element.attr("title").map(str::to_string),
    };
    Some(Conversion::Node(NodeKind::Element(ElementNode::new(
        ElementKind::Link(link),
    ))))
}

/// Scheme of `src` before its first `:`, unless a path, query or fragment
/// starts earlier
fn media_scheme(src: &str) -> Option<String> {
    let end = src.find(|c: char| matches!(c, ':' | '/' | '?' | '#'))?;
    (src[end..].starts_with(':') && end > 0).then(|| src[..end].trim().to_ascii_lowercase())
}

/// Media may only point at http(s) or relative sources
pub fn is_allowed_media_source(src: &str) -> bool {
    match media_scheme(src) {
        Some(scheme) => scheme == "http" || scheme == "https",
        None => true,
    }
}

fn convert_image(element: &DomElement) -> Option<Conversion> {
    let src = element.attr("src").filter(|s| !s.is_empty())?;
    if !is_allowed_media_source(src) {
        debug!(src, "rejecting image source");
        return None;
    }
    let dimension = |name: &str| {
        element
            .attr(name)
            .and_then(|s| s.trim().trim_end_matches("px").parse::<u32>().ok())
            .map(Dimension::from_persisted)
            .unwrap_or_default()
    };
    let image = ImageNode::new(src, element.attr("alt").unwrap_or_default())
        .with_size(dimension("width"), dimension("height"));
    Some(Conversion::Node(NodeKind::image(image)))
}

fn convert_youtube(element: &DomElement) -> Option<Conversion> {
    let id = element
        .attr("data-lexical-youtube")
        .map(str::to_string)
        .or_else(|| {
            let src = element.attr("src")?;
            let rest = src
                .strip_prefix(YOUTUBE_EMBED_BASE)
                .or_else(|| src.split_once("youtube.com/embed/").map(|(_, id)| id))?;
            Some(rest.split(['?', '&', '#']).next().unwrap_or_default().to_string())
        })
        .filter(|id| !id.is_empty())?;
    Some(Conversion::Node(NodeKind::youtube(id)))
}

fn convert_span(element: &DomElement) -> Option<Conversion> {
    let mut format = TextFormat::empty();
    if let Some(weight) = element.style_property("font-weight") {
        if weight == "bold" || weight.parse::<u32>().is_ok_and(|w| w >= 600) {
            format |= TextFormat::BOLD;
        }
    }
    if element.style_property("font-style").as_deref() == Some("italic") {
        format |= TextFormat::ITALIC;
    }
    if let Some(decoration) = element.style_property("text-decoration") {
        if decoration.contains("underline") {
            format |= TextFormat::UNDERLINE;
        }
        if decoration.contains("line-through") {
            format |= TextFormat::STRIKETHROUGH;
        }
    }
    let style = element
        .style_property("color")
        .map(|color| format!("color: {};", color));
    Some(Conversion::Format { format, style })
}

#[derive(Debug, Clone, Default)]
struct ImportContext {
    format: TextFormat,
    style: String,
    preformatted: bool,
}

/// Parse HTML and import it as a root fragment
#[instrument(skip_all, fields(len = source.len()))]
pub fn import_html(source: &str, map: &ConversionMap) -> Fragment {
    let nodes = parse_html(source);
    Fragment::root().with_children(import_dom(&nodes, map))
}

/// Convert DOM nodes into top-level block fragments
pub fn import_dom(nodes: &[DomNode], map: &ConversionMap) -> Vec<Fragment> {
    let converted = convert_nodes(nodes, map, &ImportContext::default());
    normalize_children(&ElementKind::Root, converted)
}

fn convert_nodes(nodes: &[DomNode], map: &ConversionMap, ctx: &ImportContext) -> Vec<Fragment> {
    nodes
        .iter()
        .flat_map(|node| convert_node(node, map, ctx))
        .collect()
}

fn convert_node(node: &DomNode, map: &ConversionMap, ctx: &ImportContext) -> Vec<Fragment> {
    let element = match node {
        DomNode::Text(text) => return text_fragment(text, ctx).into_iter().collect(),
        DomNode::Element(element) => element,
    };

    match map.resolve(element) {
        Some(Conversion::Node(kind)) => {
            let Some(element_kind) = element_kind(&kind) else {
                return vec![Fragment::new(kind)];
            };
            let mut child_ctx = ctx.clone();
            if matches!(element_kind, ElementKind::Code { .. }) {
                child_ctx.preformatted = true;
            }
            let children = convert_nodes(&element.children, map, &child_ctx);
            let children = normalize_children(&element_kind, children);
            vec![Fragment { kind, children }]
        }
        Some(Conversion::Format { format, style }) => {
            let mut child_ctx = ctx.clone();
            child_ctx.format |= format;
            if let Some(style) = style {
                if !child_ctx.style.is_empty() {
                    child_ctx.style.push(' ');
                }
                child_ctx.style.push_str(&style);
            }
            convert_nodes(&element.children, map, &child_ctx)
        }
        Some(Conversion::Text(text)) => text_fragment(&text, &ImportContext {
            preformatted: true,
            ..ctx.clone()
        })
        .into_iter()
        .collect(),
        Some(Conversion::Ignore) => Vec::new(),
        None => convert_nodes(&element.children, map, ctx),
    }
}

fn element_kind(kind: &NodeKind) -> Option<ElementKind> {
    match kind {
        NodeKind::Element(element) => Some(element.kind.clone()),
        _ => None,
    }
}

fn is_list_item(fragment: &Fragment) -> bool {
    matches!(&fragment.kind, NodeKind::Element(e) if matches!(e.kind, ElementKind::ListItem { .. }))
}

fn text_fragment(raw: &str, ctx: &ImportContext) -> Option<Fragment> {
    let text = if ctx.preformatted {
        raw.to_string()
    } else {
        collapse_whitespace(raw)
    };
    if text.is_empty() {
        return None;
    }
    let mut format = ctx.format;
    if ctx.preformatted {
        format.remove(TextFormat::CODE);
    }
    Some(Fragment::styled_text(
        TextNode::new(text)
            .with_format(format)
            .with_style(ctx.style.clone()),
    ))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn is_whitespace_text(fragment: &Fragment) -> bool {
    matches!(&fragment.kind, NodeKind::Text(text) if text.text.trim().is_empty())
}

/// Leaves and links that must sit inside a block
fn needs_block(fragment: &Fragment) -> bool {
    match &fragment.kind {
        NodeKind::Text(_) | NodeKind::Decorator(_) => true,
        NodeKind::Element(element) => matches!(element.kind, ElementKind::Link(_)),
    }
}

/// Decorators laid out as blocks get a paragraph of their own
fn is_block_decorator(fragment: &Fragment) -> bool {
    fragment.kind.type_name() == "horizontal-rule" || fragment.kind.type_name() == "youtube"
}

fn normalize_children(kind: &ElementKind, children: Vec<Fragment>) -> Vec<Fragment> {
    match kind {
        ElementKind::Root | ElementKind::TableCell { .. } => group_into_blocks(children),
        ElementKind::List { start, .. } => {
            let start = *start;
            let mut items = Vec::new();
            for child in children {
                if is_whitespace_text(&child) {
                    continue;
                }
                let item = if is_list_item(&child) {
                    child
                } else {
                    Fragment::list_item(1).with_children(flatten_inline(vec![child]))
                };
                items.push(item);
            }
            for (index, item) in items.iter_mut().enumerate() {
                if let NodeKind::Element(element) = &mut item.kind {
                    element.kind = ElementKind::ListItem {
                        value: start.saturating_add(index as u32),
                    };
                }
            }
            items
        }
        ElementKind::Table => children
            .into_iter()
            .filter(|c| c.type_name() == "tablerow")
            .collect(),
        ElementKind::TableRow => children
            .into_iter()
            .filter(|c| c.type_name() == "tablecell")
            .collect(),
        ElementKind::Code { .. } => merge_texts(flatten_inline(children)),
        ElementKind::ListItem { .. } => {
            // nested lists stay blocks inside the item
            let mut out = Vec::new();
            let mut run = Vec::new();
            for child in children {
                if child.type_name() == "list" {
                    out.extend(trim_inline(merge_texts(flatten_inline(std::mem::take(&mut run)))));
                    out.push(child);
                } else {
                    run.push(child);
                }
            }
            out.extend(trim_inline(merge_texts(flatten_inline(run))));
            out
        }
        _ => trim_inline(merge_texts(flatten_inline(children))),
    }
}

fn group_into_blocks(children: Vec<Fragment>) -> Vec<Fragment> {
    let mut blocks = Vec::new();
    let mut run: Vec<Fragment> = Vec::new();

    let flush = |run: &mut Vec<Fragment>, blocks: &mut Vec<Fragment>| {
        let inline = trim_inline(merge_texts(std::mem::take(run)));
        if !inline.is_empty() {
            blocks.push(Fragment::paragraph().with_children(inline));
        }
    };

    for child in children {
        if is_block_decorator(&child) {
            flush(&mut run, &mut blocks);
            blocks.push(Fragment::paragraph().with_child(child));
        } else if needs_block(&child) {
            run.push(child);
        } else if is_list_item(&child) {
            flush(&mut run, &mut blocks);
            blocks.push(Fragment::list(ListType::Bullet).with_child(child));
        } else {
            flush(&mut run, &mut blocks);
            blocks.push(child);
        }
    }
    flush(&mut run, &mut blocks);
    blocks
}

/// Replace block children of an inline container with their content
fn flatten_inline(children: Vec<Fragment>) -> Vec<Fragment> {
    let mut out = Vec::new();
    for child in children {
        if needs_block(&child) {
            out.push(child);
        } else {
            out.extend(flatten_inline(child.children));
        }
    }
    out
}

/// Join adjacent text runs with equal format and style
fn merge_texts(children: Vec<Fragment>) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = Vec::new();
    for child in children {
        if let (Some(last), NodeKind::Text(next)) = (out.last_mut(), &child.kind) {
            if let NodeKind::Text(previous) = &mut last.kind {
                if previous.format == next.format && previous.style == next.style {
                    previous.text.push_str(&next.text);
                    continue;
                }
            }
        }
        out.push(child);
    }
    out
}

/// Drop edge whitespace of a block's inline content
fn trim_inline(mut children: Vec<Fragment>) -> Vec<Fragment> {
    if let Some(NodeKind::Text(text)) = children.first_mut().map(|f| &mut f.kind) {
        text.text = text.text.trim_start().to_string();
    }
    if let Some(NodeKind::Text(text)) = children.last_mut().map(|f| &mut f.kind) {
        text.text = text.text.trim_end().to_string();
    }
    // a lone line break only keeps an empty block open
    if children.len() == 1
        && matches!(&children[0].kind, NodeKind::Text(t) if t.text.is_empty() || t.text == "\n")
    {
        return Vec::new();
    }
    children.retain(|child| !matches!(&child.kind, NodeKind::Text(t) if t.text.is_empty()));
    children
}
