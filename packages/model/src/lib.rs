//! # Quire Model
//!
//! The document tree of the editor: typed nodes addressed by key, a
//! copy-on-write arena, selection values and JSON snapshots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ json: snapshot ⇄ Fragment                   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: arena of Arc<Node> by NodeKey         │
//! │  - copy-on-write writes, dirty keys         │
//! │  - auto-wrap of leaves under the root       │
//! │  - garbage collection and validation        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node: Text | Element | Decorator            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_model::{Fragment, HeadingLevel, Tree, json};
//!
//! let tree = Tree::from_fragment(
//!     &Fragment::root().with_child(
//!         Fragment::heading(HeadingLevel::H2).with_child(Fragment::text("Title")),
//!     ),
//! )?;
//! let snapshot = json::to_json_string(&tree, false)?;
//! let reloaded = json::from_json_str(&snapshot)?.tree;
//! ```

pub mod error;
pub mod format;
pub mod fragment;
pub mod json;
pub mod key;
pub mod node;
pub mod selection;
pub mod tree;

#[cfg(test)]
mod tests_json;
#[cfg(test)]
mod tests_tree;

pub use error::{JsonError, TreeError};
pub use format::{Alignment, Direction, HeadingLevel, ListType, TextFormat, TextFormatType};
pub use fragment::Fragment;
pub use json::{ImportReport, NodeRegistry};
pub use key::NodeKey;
pub use node::{
    DecoratorNode, Dimension, ElementKind, ElementNode, ImageNode, LinkAttributes, Node,
    NodeKind, TextNode, DEFAULT_IMAGE_MAX_WIDTH,
};
pub use selection::{NodeSelection, Point, PointKind, RangeSelection, Selection};
pub use tree::Tree;
