//! # Quire HTML
//!
//! HTML export and import for document trees.
//!
//! ```text
//! Tree ── export_dom ──▶ DomNode ── render ──▶ String
//! String ── tokenize/parse_html ──▶ DomNode ── ConversionMap ──▶ Fragment
//! ```
//!
//! Export is used for clipboard copy and for read-only rendering; the
//! output is owned but untrusted markup and must be sanitized by whoever
//! displays it. Import is the paste path.

mod dom;
mod error;
mod export;
mod import;
mod parser;
mod render;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use dom::{style_property, DomElement, DomNode};
pub use error::ExportError;
pub use export::{
    export_decorator, export_dom, export_text, export_tree, render_html, HtmlTheme,
    YOUTUBE_EMBED_BASE,
};
pub use import::{
    import_dom, import_html, is_allowed_media_source, Conversion, ConversionMap, ConvertFn,
    DomConversion,
};
pub use parser::{decode_entities, parse_html};
pub use render::{escape_html, render, render_node, RenderOptions};
pub use tokenizer::{tokenize, HtmlToken};
