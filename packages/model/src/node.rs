//! Document node variants.
//!
//! The variant set is closed: every node is a [`TextNode`], an
//! [`ElementNode`] or a [`DecoratorNode`]. Type guards match exact variants.

use crate::format::{Alignment, Direction, HeadingLevel, ListType, TextFormat, TextFormatType};
use crate::key::NodeKey;

/// A node stored in the tree arena.
///
/// `Clone` keeps the key: cloning is the copy-on-write step, not a change of
/// identity. The parent is a lookup-only back reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    key: NodeKey,
    pub(crate) parent: Option<NodeKey>,
    kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            key: NodeKey::next(),
            parent: None,
            kind,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Children of an element; empty for leaves
    pub fn children(&self) -> &[NodeKey] {
        match &self.kind {
            NodeKind::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeKey>> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_decorator(&self) -> bool {
        matches!(self.kind, NodeKind::Decorator(_))
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_element()
    }

    pub fn is_root(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Root))
    }

    pub fn is_paragraph(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Paragraph))
    }

    pub fn is_heading(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Heading { .. }))
    }

    pub fn is_quote(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Quote))
    }

    pub fn is_list(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::List { .. }))
    }

    pub fn is_list_item(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::ListItem { .. }))
    }

    pub fn is_code(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Code { .. }))
    }

    pub fn is_table(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Table))
    }

    pub fn is_table_row(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::TableRow))
    }

    pub fn is_table_cell(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::TableCell { .. }))
    }

    pub fn is_link(&self) -> bool {
        self.element_kind().is_some_and(|kind| matches!(kind, ElementKind::Link(_)))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, NodeKind::Decorator(DecoratorNode::Image(_)))
    }

    pub fn is_divider(&self) -> bool {
        matches!(self.kind, NodeKind::Decorator(DecoratorNode::Divider))
    }

    pub fn is_youtube(&self) -> bool {
        matches!(self.kind, NodeKind::Decorator(DecoratorNode::YouTube { .. }))
    }

    /// Inline nodes may sit inside a block next to text
    pub fn is_inline(&self) -> bool {
        self.kind.is_inline()
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_decorator(&self) -> Option<&DecoratorNode> {
        match &self.kind {
            NodeKind::Decorator(decorator) => Some(decorator),
            _ => None,
        }
    }

    pub fn as_decorator_mut(&mut self) -> Option<&mut DecoratorNode> {
        match &mut self.kind {
            NodeKind::Decorator(decorator) => Some(decorator),
            _ => None,
        }
    }

    pub fn element_kind(&self) -> Option<&ElementKind> {
        self.as_element().map(|element| &element.kind)
    }

    /// Whether the rendered DOM must be patched after `prev` became `self`.
    ///
    /// Decorators always answer `false`: their rendering belongs to the host.
    pub fn update_dom(&self, prev: &Node) -> bool {
        match (&self.kind, &prev.kind) {
            (NodeKind::Decorator(_), _) => false,
            (NodeKind::Element(next), NodeKind::Element(prev)) => {
                next.kind != prev.kind
                    || next.format != prev.format
                    || next.indent != prev.indent
                    || next.direction != prev.direction
            }
            (next, prev) => next != prev,
        }
    }
}

/// The payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(TextNode),
    Element(ElementNode),
    Decorator(DecoratorNode),
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(TextNode::new(text))
    }

    pub fn paragraph() -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Paragraph))
    }

    pub fn heading(level: HeadingLevel) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Heading { level }))
    }

    pub fn quote() -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Quote))
    }

    pub fn list(list_type: ListType) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::List {
            list_type,
            start: 1,
        }))
    }

    pub fn list_item(value: u32) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::ListItem { value }))
    }

    pub fn code(language: Option<String>) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Code { language }))
    }

    pub fn table() -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Table))
    }

    pub fn table_row() -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::TableRow))
    }

    pub fn table_cell(header: bool) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::TableCell {
            header,
            col_span: 1,
            row_span: 1,
        }))
    }

    pub fn link(url: impl Into<String>) -> Self {
        NodeKind::Element(ElementNode::new(ElementKind::Link(LinkAttributes::new(url))))
    }

    pub fn image(image: ImageNode) -> Self {
        NodeKind::Decorator(DecoratorNode::Image(image))
    }

    pub fn divider() -> Self {
        NodeKind::Decorator(DecoratorNode::Divider)
    }

    pub fn youtube(video_id: impl Into<String>) -> Self {
        NodeKind::Decorator(DecoratorNode::YouTube {
            video_id: video_id.into(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Text(_) => "text",
            NodeKind::Element(element) => element.kind.type_name(),
            NodeKind::Decorator(decorator) => decorator.type_name(),
        }
    }

    pub fn is_inline(&self) -> bool {
        match self {
            NodeKind::Text(_) => true,
            NodeKind::Element(element) => matches!(element.kind, ElementKind::Link(_)),
            NodeKind::Decorator(decorator) => matches!(decorator, DecoratorNode::Image(_)),
        }
    }

    /// Whether a node of this kind may sit directly under the root
    pub fn is_top_level_block(&self) -> bool {
        match self {
            NodeKind::Element(element) => matches!(
                element.kind,
                ElementKind::Paragraph
                    | ElementKind::Heading { .. }
                    | ElementKind::Quote
                    | ElementKind::List { .. }
                    | ElementKind::Code { .. }
                    | ElementKind::Table
            ),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextNode {
    pub text: String,
    pub format: TextFormat,
    /// Inline CSS, e.g. `color: #ff0000;`
    pub style: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::empty(),
            style: String::new(),
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn has_format(&self, format: TextFormatType) -> bool {
        self.format.contains(format.flag())
    }

    /// Length in characters; selection offsets count characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte index of a character offset, clamped to the end
    pub fn byte_index(&self, offset: usize) -> usize {
        char_to_byte(&self.text, offset)
    }
}

pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub kind: ElementKind,
    pub format: Alignment,
    pub indent: u32,
    pub direction: Option<Direction>,
    pub(crate) children: Vec<NodeKey>,
}

impl ElementNode {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            format: Alignment::default(),
            indent: 0,
            direction: None,
            children: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: Alignment) -> Self {
        self.format = format;
        self
    }

    pub fn with_indent(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Same element without children, used when building fragments
    pub fn shallow(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Root,
    Paragraph,
    Heading { level: HeadingLevel },
    Quote,
    List { list_type: ListType, start: u32 },
    ListItem { value: u32 },
    Code { language: Option<String> },
    Table,
    TableRow,
    TableCell { header: bool, col_span: u32, row_span: u32 },
    Link(LinkAttributes),
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Root => "root",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Heading { .. } => "heading",
            ElementKind::Quote => "quote",
            ElementKind::List { .. } => "list",
            ElementKind::ListItem { .. } => "listitem",
            ElementKind::Code { .. } => "code",
            ElementKind::Table => "table",
            ElementKind::TableRow => "tablerow",
            ElementKind::TableCell { .. } => "tablecell",
            ElementKind::Link(_) => "link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttributes {
    pub url: String,
    pub target: Option<String>,
    pub rel: Option<String>,
    pub title: Option<String>,
}

impl LinkAttributes {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: None,
            rel: None,
            title: None,
        }
    }
}

/// Leaf whose rendering is delegated to the host
#[derive(Debug, Clone, PartialEq)]
pub enum DecoratorNode {
    Image(ImageNode),
    Divider,
    YouTube { video_id: String },
}

impl DecoratorNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            DecoratorNode::Image(_) => "image",
            DecoratorNode::Divider => "horizontal-rule",
            DecoratorNode::YouTube { .. } => "youtube",
        }
    }
}

pub const DEFAULT_IMAGE_MAX_WIDTH: u32 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub src: String,
    pub alt_text: String,
    pub caption: String,
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: u32,
}

impl ImageNode {
    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            caption: String::new(),
            width: Dimension::Inherit,
            height: Dimension::Inherit,
            max_width: DEFAULT_IMAGE_MAX_WIDTH,
        }
    }

    pub fn with_size(mut self, width: Dimension, height: Dimension) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// Image width or height; `Inherit` persists as 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Inherit,
    Pixels(u32),
}

impl Dimension {
    pub fn from_persisted(value: u32) -> Self {
        if value == 0 {
            Dimension::Inherit
        } else {
            Dimension::Pixels(value)
        }
    }

    pub fn to_persisted(self) -> u32 {
        match self {
            Dimension::Inherit => 0,
            Dimension::Pixels(value) => value,
        }
    }

    pub fn pixels(self) -> Option<u32> {
        match self {
            Dimension::Inherit => None,
            Dimension::Pixels(value) => Some(value),
        }
    }
}
