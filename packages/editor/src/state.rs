//! # Editor State
//!
//! An immutable `(tree, selection)` snapshot. Committing a transaction
//! replaces the editor's state wholesale; older states stay valid because
//! the tree is shared behind an `Arc` and every node is copy-on-write.

use crate::errors::EditorError;
use quire_html::{render_html, HtmlTheme, RenderOptions};
use quire_model::{json, NodeKey, Selection, Tree};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    tree: Arc<Tree>,
    selection: Option<Selection>,
}

impl EditorState {
    pub fn new(tree: Tree, selection: Option<Selection>) -> Self {
        Self {
            tree: Arc::new(tree),
            selection,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Whether both states hold the very same tree
    pub fn same_tree(&self, other: &EditorState) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }

    pub(crate) fn tree_arc(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub(crate) fn with_selection(&self, selection: Option<Selection>) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
            selection,
        }
    }

    pub fn to_json(&self) -> Value {
        json::to_json(&self.tree)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String, EditorError> {
        Ok(json::to_json_string(&self.tree, pretty)?)
    }

    /// Load a snapshot. Unknown node types are skipped and returned by name.
    pub fn from_json_str(source: &str) -> Result<(Self, Vec<String>), EditorError> {
        let report = json::from_json_str(source)?;
        Ok((Self::new(report.tree, None), report.skipped))
    }

    pub fn to_html(&self, theme: &HtmlTheme, options: &RenderOptions) -> Result<String, EditorError> {
        Ok(render_html(&self.tree, theme, options)?)
    }

    pub fn text_content(&self) -> String {
        self.tree.text_content(self.tree.root())
    }
}

/// What update listeners receive after every commit
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub prev_state: EditorState,
    pub state: EditorState,
    /// Keys of nodes created, removed or changed; empty for selection moves
    pub dirty: HashSet<NodeKey>,
    pub tags: BTreeSet<String>,
}

impl UpdateEvent {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_selection_only(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn selection_changed(&self) -> bool {
        self.prev_state.selection() != self.state.selection()
    }
}
