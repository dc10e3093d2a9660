//! # JSON Snapshots
//!
//! Every node type exports a `{ "type": .., "version": 1, ..fields }` record.
//! Import goes through a [`NodeRegistry`] that maps the `type` tag to an
//! import function, so the set of readable types is explicit.
//!
//! Unknown types are skipped with a warning and reported in
//! [`ImportReport::skipped`]; they never abort the document load.

use crate::error::JsonError;
use crate::format::{Alignment, Direction, HeadingLevel, ListType, TextFormat};
use crate::fragment::Fragment;
use crate::key::NodeKey;
use crate::node::{
    DecoratorNode, Dimension, ElementKind, ElementNode, ImageNode, LinkAttributes, NodeKind,
    TextNode, DEFAULT_IMAGE_MAX_WIDTH,
};
use crate::tree::Tree;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{instrument, warn};

pub const SNAPSHOT_VERSION: u64 = 1;

type Record = Map<String, Value>;

/// Reads the type-specific fields of one record
pub type ImportFn = fn(&Record) -> Result<NodeKind, JsonError>;

pub struct NodeRegistry {
    importers: HashMap<&'static str, ImportFn>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            importers: HashMap::new(),
        };
        registry.register("text", import_text);
        registry.register("paragraph", |_| Ok(NodeKind::paragraph()));
        registry.register("heading", import_heading);
        registry.register("quote", |_| Ok(NodeKind::quote()));
        registry.register("list", import_list);
        registry.register("listitem", import_list_item);
        registry.register("code", import_code);
        registry.register("table", |_| Ok(NodeKind::table()));
        registry.register("tablerow", |_| Ok(NodeKind::table_row()));
        registry.register("tablecell", import_table_cell);
        registry.register("link", import_link);
        registry.register("image", import_image);
        registry.register("horizontal-rule", |_| Ok(NodeKind::divider()));
        registry.register("youtube", import_youtube);
        registry
    }
}

/// Result of loading a snapshot
#[derive(Debug)]
pub struct ImportReport {
    pub tree: Tree,
    /// Type tags of skipped records, in document order
    pub skipped: Vec<String>,
}

impl NodeRegistry {
    pub fn register(&mut self, node_type: &'static str, import: ImportFn) {
        self.importers.insert(node_type, import);
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.importers.contains_key(node_type)
    }

    pub fn import_str(&self, source: &str) -> Result<ImportReport, JsonError> {
        let value: Value = serde_json::from_str(source)?;
        self.import(&value)
    }

    #[instrument(skip_all)]
    pub fn import(&self, snapshot: &Value) -> Result<ImportReport, JsonError> {
        let root = snapshot
            .get("root")
            .and_then(Value::as_object)
            .ok_or(JsonError::MissingRoot)?;
        if type_of(root)? != "root" {
            return Err(invalid("root", "the root record must have type \"root\""));
        }

        let mut skipped = Vec::new();
        let mut fragment = Fragment::root();
        if let NodeKind::Element(element) = &mut fragment.kind {
            read_element_fields(root, element)?;
        }
        fragment.children = self.import_children(root, &mut skipped)?;

        let tree = Tree::from_fragment(&fragment)?;
        Ok(ImportReport { tree, skipped })
    }

    /// Import a single record and its children as a fragment
    pub fn import_node(
        &self,
        record: &Record,
        skipped: &mut Vec<String>,
    ) -> Result<Option<Fragment>, JsonError> {
        let node_type = type_of(record)?;
        let Some(import) = self.importers.get(node_type) else {
            warn!(node_type, "skipping record of unknown type");
            skipped.push(node_type.to_string());
            return Ok(None);
        };
        let mut kind = import(record)?;
        if let NodeKind::Element(element) = &mut kind {
            read_element_fields(record, element)?;
        }
        let children = if matches!(kind, NodeKind::Element(_)) {
            self.import_children(record, skipped)?
        } else {
            Vec::new()
        };
        Ok(Some(Fragment { kind, children }))
    }

    fn import_children(
        &self,
        record: &Record,
        skipped: &mut Vec<String>,
    ) -> Result<Vec<Fragment>, JsonError> {
        let Some(children) = record.get("children") else {
            return Ok(Vec::new());
        };
        let children = children.as_array().ok_or_else(|| {
            invalid(
                type_of(record).unwrap_or("element"),
                "children must be an array",
            )
        })?;
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let child = child
                .as_object()
                .ok_or_else(|| invalid("child", "expected an object"))?;
            if let Some(fragment) = self.import_node(child, skipped)? {
                out.push(fragment);
            }
        }
        Ok(out)
    }
}

/// Load a snapshot with the default registry
pub fn from_json_str(source: &str) -> Result<ImportReport, JsonError> {
    NodeRegistry::default().import_str(source)
}

/// `{"root": ..}` snapshot of the whole tree
pub fn to_json(tree: &Tree) -> Value {
    json!({ "root": export_node(tree, tree.root()) })
}

pub fn to_json_string(tree: &Tree, pretty: bool) -> Result<String, JsonError> {
    let value = to_json(tree);
    let out = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(out)
}

/// Export the record of one node and its subtree
pub fn export_node(tree: &Tree, key: NodeKey) -> Value {
    let Some(node) = tree.get(key) else {
        return Value::Null;
    };
    let mut record = Record::new();
    record.insert("type".into(), json!(node.type_name()));
    record.insert("version".into(), json!(SNAPSHOT_VERSION));

    match node.kind() {
        NodeKind::Text(text) => export_text(text, &mut record),
        NodeKind::Element(element) => {
            export_element(element, &mut record);
            let children: Vec<Value> = element
                .children()
                .iter()
                .map(|child| export_node(tree, *child))
                .collect();
            record.insert("children".into(), Value::Array(children));
        }
        NodeKind::Decorator(decorator) => export_decorator(decorator, &mut record),
    }
    Value::Object(record)
}

fn export_text(text: &TextNode, record: &mut Record) {
    record.insert("text".into(), json!(text.text));
    record.insert("format".into(), json!(text.format.bits()));
    record.insert("style".into(), json!(text.style));
    record.insert("detail".into(), json!(0));
    record.insert("mode".into(), json!("normal"));
}

fn export_element(element: &ElementNode, record: &mut Record) {
    record.insert("format".into(), json!(element.format.as_str()));
    record.insert("indent".into(), json!(element.indent));
    record.insert("direction".into(), json!(element.direction));

    match &element.kind {
        ElementKind::Root
        | ElementKind::Paragraph
        | ElementKind::Quote
        | ElementKind::Table
        | ElementKind::TableRow => {}
        ElementKind::Heading { level } => {
            record.insert("tag".into(), json!(level.tag()));
        }
        ElementKind::List { list_type, start } => {
            record.insert("listType".into(), json!(list_type));
            record.insert("start".into(), json!(start));
            record.insert("tag".into(), json!(list_type.tag()));
        }
        ElementKind::ListItem { value } => {
            record.insert("value".into(), json!(value));
        }
        ElementKind::Code { language } => {
            record.insert("language".into(), json!(language));
        }
        ElementKind::TableCell {
            header,
            col_span,
            row_span,
        } => {
            record.insert("headerState".into(), json!(u32::from(*header)));
            record.insert("colSpan".into(), json!(col_span));
            record.insert("rowSpan".into(), json!(row_span));
        }
        ElementKind::Link(link) => {
            record.insert("url".into(), json!(link.url));
            record.insert("target".into(), json!(link.target));
            record.insert("rel".into(), json!(link.rel));
            record.insert("title".into(), json!(link.title));
        }
    }
}

fn export_decorator(decorator: &DecoratorNode, record: &mut Record) {
    match decorator {
        DecoratorNode::Image(image) => {
            record.insert("src".into(), json!(image.src));
            record.insert("altText".into(), json!(image.alt_text));
            record.insert("caption".into(), json!(image.caption));
            record.insert("width".into(), json!(image.width.to_persisted()));
            record.insert("height".into(), json!(image.height.to_persisted()));
            record.insert("maxWidth".into(), json!(image.max_width));
        }
        DecoratorNode::Divider => {}
        DecoratorNode::YouTube { video_id } => {
            record.insert("videoID".into(), json!(video_id));
        }
    }
}

fn invalid(node_type: &str, reason: impl Into<String>) -> JsonError {
    JsonError::InvalidNode {
        node_type: node_type.to_string(),
        reason: reason.into(),
    }
}

fn type_of(record: &Record) -> Result<&str, JsonError> {
    record
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("unknown", "record has no string \"type\""))
}

fn str_field<'a>(record: &'a Record, name: &str) -> Result<&'a str, JsonError> {
    record.get(name).and_then(Value::as_str).ok_or_else(|| {
        invalid(
            type_of(record).unwrap_or("unknown"),
            format!("missing string field \"{}\"", name),
        )
    })
}

fn opt_str_field(record: &Record, name: &str) -> Option<String> {
    record.get(name).and_then(Value::as_str).map(str::to_string)
}

fn u32_field(record: &Record, name: &str, default: u32) -> u32 {
    record
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(default)
}

fn read_element_fields(record: &Record, element: &mut ElementNode) -> Result<(), JsonError> {
    if let Some(format) = record.get("format") {
        element.format = match format {
            Value::String(value) => Alignment::parse(value).ok_or_else(|| {
                invalid(
                    type_of(record).unwrap_or("element"),
                    format!("unknown alignment \"{}\"", value),
                )
            })?,
            _ => Alignment::default(),
        };
    }
    element.indent = u32_field(record, "indent", 0);
    element.direction = match record.get("direction").and_then(Value::as_str) {
        Some("ltr") => Some(Direction::Ltr),
        Some("rtl") => Some(Direction::Rtl),
        _ => None,
    };
    Ok(())
}

fn import_text(record: &Record) -> Result<NodeKind, JsonError> {
    let text = str_field(record, "text")?;
    let format = TextFormat::from_bits_truncate(u32_field(record, "format", 0));
    let style = opt_str_field(record, "style").unwrap_or_default();
    Ok(NodeKind::Text(
        TextNode::new(text).with_format(format).with_style(style),
    ))
}

fn import_heading(record: &Record) -> Result<NodeKind, JsonError> {
    let tag = str_field(record, "tag")?;
    let level = HeadingLevel::from_tag(tag)
        .ok_or_else(|| invalid("heading", format!("unknown heading tag \"{}\"", tag)))?;
    Ok(NodeKind::heading(level))
}

fn import_list(record: &Record) -> Result<NodeKind, JsonError> {
    let list_type = match record.get("listType").and_then(Value::as_str) {
        Some("number") => ListType::Number,
        Some("bullet") | None => ListType::Bullet,
        Some(other) => {
            return Err(invalid("list", format!("unknown list type \"{}\"", other)));
        }
    };
    let start = u32_field(record, "start", 1);
    Ok(NodeKind::Element(ElementNode::new(ElementKind::List {
        list_type,
        start,
    })))
}

fn import_list_item(record: &Record) -> Result<NodeKind, JsonError> {
    Ok(NodeKind::list_item(u32_field(record, "value", 1)))
}

fn import_code(record: &Record) -> Result<NodeKind, JsonError> {
    Ok(NodeKind::code(opt_str_field(record, "language")))
}

fn import_table_cell(record: &Record) -> Result<NodeKind, JsonError> {
    let header = record
        .get("header")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| u32_field(record, "headerState", 0) != 0);
    Ok(NodeKind::Element(ElementNode::new(ElementKind::TableCell {
        header,
        col_span: u32_field(record, "colSpan", 1).max(1),
        row_span: u32_field(record, "rowSpan", 1).max(1),
    })))
}

fn import_link(record: &Record) -> Result<NodeKind, JsonError> {
    let link = LinkAttributes {
        url: str_field(record, "url")?.to_string(),
        target: opt_str_field(record, "target"),
        rel: opt_str_field(record, "rel"),
        title: opt_str_field(record, "title"),
    };
    Ok(NodeKind::Element(ElementNode::new(ElementKind::Link(link))))
}

fn import_image(record: &Record) -> Result<NodeKind, JsonError> {
    let image = ImageNode {
        src: str_field(record, "src")?.to_string(),
        alt_text: opt_str_field(record, "altText").unwrap_or_default(),
        caption: opt_str_field(record, "caption").unwrap_or_default(),
        width: read_dimension(record, "width"),
        height: read_dimension(record, "height"),
        max_width: u32_field(record, "maxWidth", DEFAULT_IMAGE_MAX_WIDTH),
    };
    Ok(NodeKind::image(image))
}

fn read_dimension(record: &Record, name: &str) -> Dimension {
    match record.get(name) {
        Some(Value::String(value)) if value == "inherit" => Dimension::Inherit,
        _ => Dimension::from_persisted(u32_field(record, name, 0)),
    }
}

fn import_youtube(record: &Record) -> Result<NodeKind, JsonError> {
    Ok(NodeKind::youtube(str_field(record, "videoID")?))
}
