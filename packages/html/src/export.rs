//! # Node → DOM export
//!
//! Each node type has one `export_dom` rule. The output is used for
//! clipboard copy and for the read-only HTML of published documents, so
//! class names come from an [`HtmlTheme`] and alignment is inlined as style.

use crate::dom::{DomElement, DomNode};
use crate::error::ExportError;
use crate::render::{render, RenderOptions};
use quire_model::{
    Alignment, DecoratorNode, Direction, ElementKind, ElementNode, ListType, NodeKey, NodeKind,
    TextFormat, TextNode, Tree,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

pub const YOUTUBE_EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";

/// Node type (or `text.<format>`) → CSS class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HtmlTheme {
    classes: HashMap<String, String>,
}

impl HtmlTheme {
    pub fn new(classes: HashMap<String, String>) -> Self {
        Self { classes }
    }

    pub fn with_class(mut self, key: impl Into<String>, class: impl Into<String>) -> Self {
        self.classes.insert(key.into(), class.into());
        self
    }

    pub fn class(&self, key: &str) -> Option<&str> {
        self.classes.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Outermost first
const FORMAT_TAGS: &[(TextFormat, &str, &str)] = &[
    (TextFormat::BOLD, "strong", "text.bold"),
    (TextFormat::ITALIC, "em", "text.italic"),
    (TextFormat::STRIKETHROUGH, "s", "text.strikethrough"),
    (TextFormat::UNDERLINE, "u", "text.underline"),
    (TextFormat::CODE, "code", "text.code"),
    (TextFormat::SUBSCRIPT, "sub", "text.subscript"),
    (TextFormat::SUPERSCRIPT, "sup", "text.superscript"),
    (TextFormat::HIGHLIGHT, "mark", "text.highlight"),
];

/// Export the top-level blocks of a tree
#[instrument(skip_all, fields(nodes = tree.len()))]
pub fn export_tree(tree: &Tree, theme: &HtmlTheme) -> Result<Vec<DomNode>, ExportError> {
    tree.children(tree.root())
        .iter()
        .map(|key| export_dom(tree, *key, theme))
        .collect()
}

pub fn render_html(
    tree: &Tree,
    theme: &HtmlTheme,
    options: &RenderOptions,
) -> Result<String, ExportError> {
    Ok(render(&export_tree(tree, theme)?, options))
}

/// Export one node and its subtree
pub fn export_dom(tree: &Tree, key: NodeKey, theme: &HtmlTheme) -> Result<DomNode, ExportError> {
    let node = tree.get(key).ok_or(ExportError::MissingNode(key))?;
    match node.kind() {
        NodeKind::Text(text) => Ok(export_text(text, theme)),
        NodeKind::Decorator(decorator) => Ok(export_decorator(decorator)),
        NodeKind::Element(element) => {
            let mut dom = element_shell(tree, key, element, theme);
            for child in element.children() {
                dom.children.push(export_dom(tree, *child, theme)?);
            }
            if dom.children.is_empty() && is_empty_block(&element.kind) {
                dom.children.push(DomElement::new("br").into());
            }
            Ok(dom.into())
        }
    }
}

fn is_empty_block(kind: &ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::ListItem { .. }
    )
}

pub fn export_text(text: &TextNode, theme: &HtmlTheme) -> DomNode {
    let mut node = DomNode::Text(text.text.clone());
    for (flag, tag, theme_key) in FORMAT_TAGS.iter().rev() {
        if text.format.contains(*flag) {
            let mut element = DomElement::new(*tag);
            if let Some(class) = theme.class(theme_key) {
                element.add_class(class);
            }
            node = element.with_child(node).into();
        }
    }
    if !text.style.is_empty() {
        node = DomElement::new("span")
            .with_attr("style", text.style.clone())
            .with_child(node)
            .into();
    }
    node
}

fn element_shell(tree: &Tree, key: NodeKey, element: &ElementNode, theme: &HtmlTheme) -> DomElement {
    let (tag, theme_key): (&str, &str) = match &element.kind {
        ElementKind::Root => ("div", "root"),
        ElementKind::Paragraph => ("p", "paragraph"),
        ElementKind::Heading { level } => (level.tag(), level.tag()),
        ElementKind::Quote => ("blockquote", "quote"),
        ElementKind::List { list_type, .. } => (list_type.tag(), list_type.tag()),
        ElementKind::ListItem { .. } => ("li", "listitem"),
        ElementKind::Code { .. } => ("pre", "code"),
        ElementKind::Table => ("table", "table"),
        ElementKind::TableRow => ("tr", "tableRow"),
        ElementKind::TableCell { header: true, .. } => ("th", "tableCellHeader"),
        ElementKind::TableCell { header: false, .. } => ("td", "tableCell"),
        ElementKind::Link(_) => ("a", "link"),
    };

    let mut dom = DomElement::new(tag);
    match &element.kind {
        ElementKind::List {
            list_type: ListType::Number,
            start,
        } if *start != 1 => {
            dom.set_attr("start", start.to_string());
        }
        ElementKind::ListItem { value } => {
            let numbered = tree
                .parent(key)
                .and_then(|parent| tree.get(parent))
                .and_then(|parent| parent.element_kind())
                .is_some_and(|kind| {
                    matches!(kind, ElementKind::List { list_type: ListType::Number, .. })
                });
            if numbered {
                dom.set_attr("value", value.to_string());
            }
        }
        ElementKind::Code { language } => {
            dom.set_attr("spellcheck", "false");
            if let Some(language) = language {
                dom.set_attr("data-language", language.clone());
            }
        }
        ElementKind::TableCell {
            col_span, row_span, ..
        } => {
            if *col_span > 1 {
                dom.set_attr("colspan", col_span.to_string());
            }
            if *row_span > 1 {
                dom.set_attr("rowspan", row_span.to_string());
            }
        }
        ElementKind::Link(link) => {
            dom.set_attr("href", link.url.clone());
            if let Some(target) = &link.target {
                dom.set_attr("target", target.clone());
            }
            if let Some(rel) = &link.rel {
                dom.set_attr("rel", rel.clone());
            }
            if let Some(title) = &link.title {
                dom.set_attr("title", title.clone());
            }
        }
        _ => {}
    }

    if let Some(class) = theme.class(theme_key) {
        dom.add_class(class);
    }
    if element.format != Alignment::Left {
        dom.add_style("text-align", element.format.as_str());
    }
    if element.indent > 0 {
        dom.add_style("padding-inline-start", &format!("{}px", element.indent * 40));
    }
    if let Some(direction) = element.direction {
        dom.set_attr(
            "dir",
            match direction {
                Direction::Ltr => "ltr",
                Direction::Rtl => "rtl",
            },
        );
    }
    dom
}

pub fn export_decorator(decorator: &DecoratorNode) -> DomNode {
    match decorator {
        DecoratorNode::Image(image) => {
            let mut img = DomElement::new("img")
                .with_attr("src", image.src.clone())
                .with_attr("alt", image.alt_text.clone());
            if let Some(width) = image.width.pixels() {
                img.set_attr("width", width.to_string());
            }
            if let Some(height) = image.height.pixels() {
                img.set_attr("height", height.to_string());
            }
            img.into()
        }
        DecoratorNode::Divider => DomElement::new("hr").into(),
        DecoratorNode::YouTube { video_id } => DomElement::new("iframe")
            .with_attr("data-lexical-youtube", video_id.clone())
            .with_attr("width", "560")
            .with_attr("height", "315")
            .with_attr("src", format!("{}{}", YOUTUBE_EMBED_BASE, video_id))
            .with_attr("frameborder", "0")
            .with_attr(
                "allow",
                "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture",
            )
            .with_attr("allowfullscreen", "true")
            .with_attr("title", "YouTube video")
            .into(),
    }
}
