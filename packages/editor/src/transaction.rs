//! # Transactions
//!
//! A transaction owns a pending copy of the tree and the selection. The
//! copy shares every node with the committed state until a node is first
//! written, so a dropped transaction leaves no trace and a committed one
//! costs only the nodes it touched.
//!
//! The text primitives here keep the selection valid: whenever a node the
//! selection points into is split, merged or removed, the points are moved
//! to where the same characters now live.

use crate::errors::EditorError;
use crate::range::{
    adjacent_block, alignment_target, block_of, common_format, is_block, nearest_link, next_leaf_in_block,
    point_node, previous_leaf_in_block, selected_blocks, selected_leaves, text_len,
};
use crate::state::EditorState;
use quire_model::{
    Alignment, ElementKind, Fragment, ListType, Node, NodeKey, NodeKind, Point, PointKind,
    RangeSelection, Selection, TextFormatType, TextNode, Tree,
};
use std::collections::BTreeSet;
use tracing::trace;

pub struct Transaction {
    tree: Tree,
    selection: Option<Selection>,
    tags: BTreeSet<String>,
}

impl Transaction {
    pub(crate) fn new(state: &EditorState) -> Self {
        Self {
            tree: state.tree().clone(),
            selection: state.selection().cloned(),
            tags: BTreeSet::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (Tree, Option<Selection>, BTreeSet<String>) {
        (self.tree, self.selection, self.tags)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Direct access to the pending tree; selection upkeep is up to the caller
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn range(&self) -> Option<&RangeSelection> {
        self.selection.as_ref().and_then(Selection::as_range)
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    // ------------------------------------------------------------------
    // Selection placement
    // ------------------------------------------------------------------

    /// Collapse the selection at `offset` inside `key`.
    ///
    /// On a text node the typing format follows the text; on an element the
    /// offset counts children.
    pub fn select_caret(&mut self, key: NodeKey, offset: usize) -> Result<(), EditorError> {
        let node = self.tree.node(key)?;
        let point = if node.is_text() {
            Point::text(key, offset.min(text_len(&self.tree, key)))
        } else {
            Point::element(key, offset.min(node.children().len()))
        };
        self.select_range(point, point)
    }

    pub fn select_range(&mut self, anchor: Point, focus: Point) -> Result<(), EditorError> {
        for point in [anchor, focus] {
            if !self.tree.contains(point.key) {
                return Err(EditorError::StaleNode(point.key));
            }
        }
        let mut range = RangeSelection::new(anchor, focus);
        if let Some(text) = self.tree.get(anchor.key).and_then(Node::as_text) {
            range.format = text.format;
            range.style = text.style.clone();
        }
        self.selection = Some(Selection::Range(range));
        Ok(())
    }

    /// Caret before the first leaf under `key`
    pub fn select_start(&mut self, key: NodeKey) -> Result<(), EditorError> {
        let point = match self.tree.first_leaf(key).filter(|leaf| *leaf != key) {
            Some(leaf) => self.leaf_point(leaf, false)?,
            None => self.leaf_point(key, false)?,
        };
        self.select_range(point, point)
    }

    /// Caret after the last leaf under `key`
    pub fn select_end(&mut self, key: NodeKey) -> Result<(), EditorError> {
        let point = match self.tree.last_leaf(key).filter(|leaf| *leaf != key) {
            Some(leaf) => self.leaf_point(leaf, true)?,
            None => self.leaf_point(key, true)?,
        };
        self.select_range(point, point)
    }

    pub fn select_nodes(&mut self, keys: impl IntoIterator<Item = NodeKey>) {
        self.selection = Some(Selection::nodes(keys));
    }

    fn leaf_point(&self, key: NodeKey, at_end: bool) -> Result<Point, EditorError> {
        let node = self.tree.node(key)?;
        if let Some(text) = node.as_text() {
            return Ok(Point::text(key, if at_end { text.len() } else { 0 }));
        }
        if node.is_element() {
            let len = node.children().len();
            return Ok(Point::element(key, if at_end { len } else { 0 }));
        }
        let parent = self.tree.parent(key).ok_or(EditorError::StaleNode(key))?;
        let index = self.tree.index_in_parent(key).unwrap_or(0);
        Ok(Point::element(parent, if at_end { index + 1 } else { index }))
    }

    // ------------------------------------------------------------------
    // Text editing
    // ------------------------------------------------------------------

    /// Replace the selection with `text` using the typing format
    pub fn insert_text(&mut self, text: &str) -> Result<bool, EditorError> {
        if self.range().is_none() {
            return Ok(false);
        }
        self.remove_selected()?;
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        if text.is_empty() {
            return Ok(true);
        }
        let inserted = text.chars().count();
        let point = range.anchor;

        match point.kind {
            PointKind::Text => {
                let current = self.tree.node(point.key)?.as_text().cloned().unwrap_or_default();
                if current.format == range.format && current.style == range.style {
                    if let Some(node) = self.tree.writable(point.key)?.as_text_mut() {
                        let byte = node.byte_index(point.offset);
                        node.text.insert_str(byte, text);
                    }
                    self.place_caret(range, Point::text(point.key, point.offset + inserted));
                } else {
                    let node = self.create_text(text, &range);
                    if point.offset == 0 {
                        self.tree.insert_before(point.key, node)?;
                    } else {
                        self.tree.split_text(point.key, point.offset)?;
                        self.tree.insert_after(point.key, node)?;
                    }
                    self.place_caret(range, Point::text(node, inserted));
                }
            }
            PointKind::Element => {
                let node = self.create_text(text, &range);
                self.tree.insert_child(point.key, point.offset, node)?;
                self.place_caret(range, Point::text(node, inserted));
            }
        }
        trace!(len = inserted, "insert text");
        Ok(true)
    }

    fn create_text(&mut self, text: &str, range: &RangeSelection) -> NodeKey {
        self.tree.create(NodeKind::Text(
            TextNode::new(text)
                .with_format(range.format)
                .with_style(range.style.clone()),
        ))
    }

    /// Collapse to `point` and keep the typing format of `range`
    fn place_caret(&mut self, range: RangeSelection, point: Point) {
        self.selection = Some(Selection::Range(RangeSelection {
            anchor: point,
            focus: point,
            ..range
        }));
    }

    /// Insert an inline node (an image, a link) at the caret
    pub fn insert_inline(&mut self, kind: NodeKind) -> Result<NodeKey, EditorError> {
        self.remove_selected()?;
        let node = self.tree.create(kind);
        let anchor = self.range().map(|range| range.anchor);
        match anchor {
            Some(point) if point.kind == PointKind::Text => {
                if point.offset == 0 {
                    self.tree.insert_before(point.key, node)?;
                } else {
                    self.tree.split_text(point.key, point.offset)?;
                    self.tree.insert_after(point.key, node)?;
                }
            }
            Some(point) => {
                self.tree.insert_child(point.key, point.offset, node)?;
            }
            None => {
                let root = self.tree.root();
                self.tree.append(root, node)?;
            }
        }
        let point = self.leaf_point(node, true)?;
        self.selection = Some(Selection::Range(RangeSelection::caret(self.settle_point(point))));
        Ok(node)
    }

    /// Insert a block after the top-level block holding the caret.
    ///
    /// An empty paragraph at the caret stays behind the new block and keeps
    /// the caret; otherwise a paragraph is added when the block ends the
    /// document.
    pub fn insert_block(&mut self, kind: NodeKind) -> Result<NodeKey, EditorError> {
        let root = self.tree.root();
        let node = self.tree.create(kind);
        let top = self
            .range()
            .map(|range| point_node(&self.tree, &range.anchor))
            .and_then(|key| self.tree.top_level_element(key));

        let attached = match top {
            Some(top) if self.is_empty_paragraph(top) => self.tree.insert_before(top, node)?,
            Some(top) => self.tree.insert_after(top, node)?,
            None => self.tree.append(root, node)?,
        };
        let follower = match self.tree.next_sibling(attached) {
            Some(next) => next,
            None => {
                let paragraph = self.tree.create(NodeKind::paragraph());
                self.tree.insert_after(attached, paragraph)?
            }
        };
        self.select_start(follower)?;
        Ok(node)
    }

    /// Insert top-level blocks at the caret, e.g. pasted content
    pub fn insert_fragments(&mut self, blocks: &[Fragment]) -> Result<Vec<NodeKey>, EditorError> {
        self.remove_selected()?;
        let root = self.tree.root();
        let top = self
            .range()
            .map(|range| point_node(&self.tree, &range.anchor))
            .and_then(|key| self.tree.top_level_element(key));
        let (mut index, replace) = match top {
            Some(top) => {
                let index = self.tree.index_in_parent(top).unwrap_or(0);
                if self.is_empty_paragraph(top) {
                    (index, Some(top))
                } else {
                    (index + 1, None)
                }
            }
            None => (self.tree.children(root).len(), None),
        };

        let mut inserted = Vec::with_capacity(blocks.len());
        for block in blocks {
            let key = self.tree.insert_fragment(root, index, block)?;
            inserted.push(key);
            index += 1;
        }
        if let Some(empty) = replace {
            if !inserted.is_empty() {
                self.tree.remove(empty)?;
            }
        }
        if let Some(last) = inserted.last() {
            self.select_end(*last)?;
        }
        Ok(inserted)
    }

    fn is_empty_paragraph(&self, key: NodeKey) -> bool {
        self.tree
            .get(key)
            .is_some_and(|node| node.is_paragraph() && node.children().is_empty())
    }

    /// Delete whatever the range covers and collapse it to the start
    pub fn remove_selected(&mut self) -> Result<bool, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        if range.is_collapsed() {
            return Ok(false);
        }
        let leaves = self.split_selection()?;
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        let (start, _) = range.ordered(&self.tree);
        let blocks = selected_blocks(&self.tree, &range);
        let Some(&first_block) = blocks.first() else {
            return Ok(false);
        };

        let caret = match leaves.first() {
            Some(first) => match previous_leaf_in_block(&self.tree, *first) {
                Some(before) => self.leaf_point(before, true)?,
                None => Point::element(first_block, 0),
            },
            None => start,
        };
        for leaf in &leaves {
            if self.tree.contains(*leaf) {
                self.tree.remove(*leaf)?;
            }
        }

        if let Some((&last_block, middle)) = blocks[1..].split_last() {
            for block in middle {
                self.remove_block(*block)?;
            }
            self.merge_into(first_block, last_block)?;
        }
        self.prune_empty_links(first_block)?;

        let caret = if self.tree.contains(caret.key) {
            caret
        } else {
            Point::element(first_block, 0)
        };
        self.place_caret(range, self.settle_point(caret));
        self.normalize_block(first_block)?;
        self.sync_caret_format();
        Ok(true)
    }

    /// Split the edge text nodes so the range covers whole leaves only.
    ///
    /// Rewrites the selection to the split nodes, direction preserved, and
    /// returns the covered leaves in document order.
    fn split_selection(&mut self) -> Result<Vec<NodeKey>, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(Vec::new());
        };
        if range.is_collapsed() {
            return Ok(Vec::new());
        }
        let backward = range.is_backward(&self.tree);
        let (mut start, mut end) = range.ordered(&self.tree);

        if end.kind == PointKind::Text {
            self.tree.split_text(end.key, end.offset)?;
        }
        if start.kind == PointKind::Text && start.offset > 0 {
            if let Some(right) = self.tree.split_text(start.key, start.offset)? {
                if end.kind == PointKind::Text && end.key == start.key {
                    end = Point::text(right, end.offset - start.offset);
                }
                start = Point::text(right, 0);
            }
        }

        let mut next = RangeSelection {
            anchor: start,
            focus: end,
            ..range
        };
        if backward {
            std::mem::swap(&mut next.anchor, &mut next.focus);
        }
        let mut leaves = selected_leaves(&self.tree, &next);
        self.selection = Some(Selection::Range(next));

        if start.kind == PointKind::Text
            && leaves.first() == Some(&start.key)
            && start.offset >= text_len(&self.tree, start.key)
        {
            leaves.remove(0);
        }
        if end.kind == PointKind::Text && leaves.last() == Some(&end.key) && end.offset == 0 {
            leaves.pop();
        }
        Ok(leaves)
    }

    /// Texts fully covered by the range after splitting its edges
    fn split_texts(&mut self) -> Result<Vec<NodeKey>, EditorError> {
        let leaves = self.split_selection()?;
        Ok(leaves
            .into_iter()
            .filter(|key| self.tree.get(*key).is_some_and(Node::is_text))
            .collect())
    }

    /// Delete one character next to the caret, or the whole range.
    ///
    /// At a block edge the neighbouring block is merged in, a heading or
    /// quote or list item at its start turns into a paragraph, and a
    /// neighbouring block decorator becomes node-selected.
    pub fn delete_character(&mut self, backward: bool) -> Result<bool, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        if !range.is_collapsed() {
            return self.remove_selected();
        }
        let point = range.anchor;
        let Some(block) = block_of(&self.tree, point_node(&self.tree, &point)) else {
            return Ok(false);
        };

        if point.kind == PointKind::Text {
            let len = text_len(&self.tree, point.key);
            if backward && point.offset > 0 {
                self.remove_chars(point.key, point.offset - 1)?;
                self.place_caret(range, Point::text(point.key, point.offset - 1));
                self.normalize_block(block)?;
                return Ok(true);
            }
            if !backward && point.offset < len {
                self.remove_chars(point.key, point.offset)?;
                self.normalize_block(block)?;
                return Ok(true);
            }
        }

        let neighbour = match point.kind {
            PointKind::Text if backward => previous_leaf_in_block(&self.tree, point.key),
            PointKind::Text => next_leaf_in_block(&self.tree, point.key),
            PointKind::Element => {
                let children = self.tree.children(point.key);
                let child = if backward {
                    point.offset.checked_sub(1).and_then(|i| children.get(i))
                } else {
                    children.get(point.offset)
                };
                child.and_then(|child| {
                    if backward {
                        self.tree.last_leaf(*child)
                    } else {
                        self.tree.first_leaf(*child)
                    }
                })
            }
        };

        if let Some(leaf) = neighbour {
            let len = text_len(&self.tree, leaf);
            if self.tree.node(leaf)?.is_text() && len > 0 {
                let offset = if backward { len - 1 } else { 0 };
                self.remove_chars(leaf, offset)?;
                self.place_caret(range, Point::text(leaf, offset));
            } else {
                let parent = self.tree.parent(leaf).ok_or(EditorError::StaleNode(leaf))?;
                let index = self.tree.index_in_parent(leaf).unwrap_or(0);
                self.tree.remove(leaf)?;
                let caret = self.settle_point(Point::element(parent, index));
                self.place_caret(range, caret);
            }
            self.prune_empty_links(block)?;
            self.normalize_block(block)?;
            self.sync_caret_format();
            return Ok(true);
        }

        if backward {
            self.collapse_block_start(block)
        } else {
            self.collapse_block_end(block)
        }
    }

    fn remove_chars(&mut self, key: NodeKey, offset: usize) -> Result<(), EditorError> {
        if let Some(text) = self.tree.writable(key)?.as_text_mut() {
            let from = text.byte_index(offset);
            let to = text.byte_index(offset + 1);
            text.text.replace_range(from..to, "");
        }
        Ok(())
    }

    /// Remove the character at `offset` of a text node; points behind it
    /// move back by one
    pub fn remove_char_at(&mut self, key: NodeKey, offset: usize) -> Result<bool, EditorError> {
        if offset >= text_len(&self.tree, key) {
            return Ok(false);
        }
        self.remove_chars(key, offset)?;
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            for point in [&mut range.anchor, &mut range.focus] {
                if point.key == key && point.kind == PointKind::Text && point.offset > offset {
                    point.offset -= 1;
                }
            }
        }
        Ok(true)
    }

    fn collapse_block_start(&mut self, block: NodeKey) -> Result<bool, EditorError> {
        let node = self.tree.node(block)?;
        let empty = node.children().is_empty();
        let becomes_paragraph = node.is_quote()
            || node.is_list_item()
            || (node.is_heading() && empty)
            || (node.is_code() && empty);
        if becomes_paragraph {
            self.set_block_kind(block, NodeKind::paragraph())?;
            return Ok(true);
        }

        let Some(previous) = adjacent_block(&self.tree, block, true) else {
            return Ok(false);
        };
        if let Some(decorator) = self.block_decorator(previous) {
            if empty {
                self.remove_block(block)?;
            }
            self.select_nodes([decorator]);
            return Ok(true);
        }
        let caret = match self.tree.last_leaf(previous).filter(|leaf| *leaf != previous) {
            Some(leaf) => self.leaf_point(leaf, true)?,
            None => Point::element(previous, 0),
        };
        self.merge_into(previous, block)?;
        self.select_range(caret, caret)?;
        self.normalize_block(previous)?;
        Ok(true)
    }

    fn collapse_block_end(&mut self, block: NodeKey) -> Result<bool, EditorError> {
        let Some(next) = adjacent_block(&self.tree, block, false) else {
            return Ok(false);
        };
        if let Some(decorator) = self.block_decorator(next) {
            if self.tree.children(block).is_empty() {
                self.remove_block(block)?;
            }
            self.select_nodes([decorator]);
            return Ok(true);
        }
        self.merge_into(block, next)?;
        self.normalize_block(block)?;
        Ok(true)
    }

    /// The decorator of a block holding a single non-inline decorator
    fn block_decorator(&self, block: NodeKey) -> Option<NodeKey> {
        match self.tree.children(block) {
            [only] => self
                .tree
                .get(*only)
                .filter(|node| node.is_decorator() && !node.is_inline())
                .map(|_| *only),
            _ => None,
        }
    }

    /// Move the children of `source` to the end of `target`, then drop `source`
    fn merge_into(&mut self, target: NodeKey, source: NodeKey) -> Result<(), EditorError> {
        if target == source || !self.tree.contains(source) {
            return Ok(());
        }
        let children: Vec<NodeKey> = self
            .tree
            .children(source)
            .iter()
            .copied()
            .filter(|child| self.tree.get(*child).is_some_and(Node::is_inline))
            .collect();
        for child in children {
            self.tree.append(target, child)?;
        }
        let end = self.tree.children(target).len();
        self.remap_element(source, Point::element(target, end));
        self.remove_block(source)
    }

    /// Remove a block and any list, row or table it leaves empty
    fn remove_block(&mut self, block: NodeKey) -> Result<(), EditorError> {
        let mut parent = self.tree.parent(block);
        self.tree.remove(block)?;
        let root = self.tree.root();
        while let Some(key) = parent {
            let Some(node) = self.tree.get(key) else { break };
            if key == root || !node.children().is_empty() || is_block(node) {
                break;
            }
            parent = self.tree.parent(key);
            self.tree.remove(key)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------

    /// Toggle a format over the covered text.
    ///
    /// The format is removed only when every covered text carries it. A
    /// collapsed range toggles the typing format instead.
    pub fn toggle_format(&mut self, format: TextFormatType) -> Result<bool, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        if range.is_collapsed() {
            if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
                range.format = range.format.toggled(format);
            }
            return Ok(true);
        }

        let texts = self.split_texts()?;
        if texts.is_empty() {
            return Ok(false);
        }
        let remove = texts.iter().all(|key| {
            self.tree
                .get(*key)
                .and_then(Node::as_text)
                .is_some_and(|text| text.has_format(format))
        });
        for key in &texts {
            if let Some(text) = self.tree.writable(*key)?.as_text_mut() {
                if remove {
                    text.format.remove(format.flag());
                } else if !text.has_format(format) {
                    text.format = text.format.toggled(format);
                }
            }
        }
        self.normalize_blocks_of(&texts)?;
        self.refresh_range_format();
        Ok(true)
    }

    /// Set one CSS property on the covered text, or on the typing style
    pub fn patch_style(&mut self, property: &str, value: Option<&str>) -> Result<bool, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };
        if range.is_collapsed() {
            if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
                range.style = patch_style(&range.style, property, value);
            }
            return Ok(true);
        }

        let texts = self.split_texts()?;
        if texts.is_empty() {
            return Ok(false);
        }
        for key in &texts {
            if let Some(text) = self.tree.writable(*key)?.as_text_mut() {
                text.style = patch_style(&text.style, property, value);
            }
        }
        self.normalize_blocks_of(&texts)?;
        let style = patch_style(&range.style, property, value);
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            range.style = style;
        }
        Ok(true)
    }

    fn refresh_range_format(&mut self) {
        let Some(range) = self.range().cloned() else { return };
        let format = common_format(&self.tree, &range);
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            range.format = format;
        }
    }

    /// Typing format of a caret follows the text it sits in
    fn sync_caret_format(&mut self) {
        let Some(range) = self.range().cloned() else { return };
        if !range.is_collapsed() {
            return;
        }
        if let Some(text) = self.tree.get(range.anchor.key).and_then(Node::as_text) {
            let (format, style) = (text.format, text.style.clone());
            if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
                range.format = format;
                range.style = style;
            }
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Blocks the selection touches, in document order
    pub fn selected_blocks(&self) -> Vec<NodeKey> {
        match self.selection.as_ref() {
            Some(Selection::Range(range)) => selected_blocks(&self.tree, range),
            Some(Selection::Node(nodes)) => {
                let mut blocks = Vec::new();
                for key in &nodes.keys {
                    if let Some(block) = block_of(&self.tree, *key) {
                        if !blocks.contains(&block) {
                            blocks.push(block);
                        }
                    }
                }
                blocks
            }
            None => Vec::new(),
        }
    }

    /// Give every selected block a new element type, keeping its content
    pub fn set_blocks_type(&mut self, make: impl Fn() -> NodeKind) -> Result<bool, EditorError> {
        let blocks = self.selected_blocks();
        if blocks.is_empty() {
            return Ok(false);
        }
        for block in blocks {
            self.set_block_kind(block, make())?;
        }
        Ok(true)
    }

    /// Replace a block, lifting list items out of their list first
    fn set_block_kind(&mut self, block: NodeKey, kind: NodeKind) -> Result<NodeKey, EditorError> {
        let node = self.tree.node(block)?;
        if node.is_list_item() {
            return self.lift_list_item(block, kind);
        }
        let old = node.as_element().cloned();
        let replacement = self.tree.create(kind);
        if let (Some(old), Some(new)) = (old, self.tree.writable(replacement)?.as_element_mut()) {
            new.format = old.format;
            new.indent = old.indent;
            new.direction = old.direction;
        }
        self.tree.replace(block, replacement, true)?;
        self.remap_element_key(block, replacement);
        Ok(replacement)
    }

    /// Turn a list item into a block next to its list, splitting the list
    /// when the item sits in the middle
    fn lift_list_item(&mut self, item: NodeKey, kind: NodeKind) -> Result<NodeKey, EditorError> {
        let list = self.tree.parent(item).ok_or(EditorError::StaleNode(item))?;
        let items = self.tree.children(list).to_vec();
        let index = items.iter().position(|k| *k == item).unwrap_or(0);

        let block = self.tree.create(kind);
        for child in self.tree.children(item).to_vec() {
            if self.tree.get(child).is_some_and(Node::is_inline) {
                self.tree.append(block, child)?;
            }
        }

        if index == 0 {
            self.tree.insert_before(list, block)?;
        } else if index + 1 == items.len() {
            self.tree.insert_after(list, block)?;
        } else {
            let tail_kind = match self.tree.node(list)?.as_element() {
                Some(element) => NodeKind::Element(element.shallow()),
                None => return Err(EditorError::StaleNode(list)),
            };
            let tail = self.tree.create(tail_kind);
            for moved in &items[index + 1..] {
                self.tree.append(tail, *moved)?;
            }
            self.tree.insert_after(list, tail)?;
            self.tree.insert_after(list, block)?;
            self.renumber(tail)?;
        }

        self.remap_element_key(item, block);
        self.remove_block(item)?;
        if self.tree.contains(list) {
            self.renumber(list)?;
        }
        Ok(block)
    }

    /// Renumber list items from the list's start value
    fn renumber(&mut self, list: NodeKey) -> Result<(), EditorError> {
        let start = match self.tree.node(list)?.element_kind() {
            Some(ElementKind::List { start, .. }) => *start,
            _ => return Ok(()),
        };
        for (index, item) in self.tree.children(list).to_vec().into_iter().enumerate() {
            let value = start.saturating_add(index as u32);
            let current = match self.tree.node(item)?.element_kind() {
                Some(ElementKind::ListItem { value }) => Some(*value),
                _ => None,
            };
            if current.is_some_and(|current| current != value) {
                if let Some(element) = self.tree.writable(item)?.as_element_mut() {
                    element.kind = ElementKind::ListItem { value };
                }
            }
        }
        Ok(())
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> Result<bool, EditorError> {
        let blocks = self.selected_blocks();
        if blocks.is_empty() {
            return Ok(false);
        }
        let mut targets: Vec<NodeKey> = Vec::new();
        for block in blocks {
            let target = alignment_target(&self.tree, block);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        for target in targets {
            if let Some(element) = self.tree.writable(target)?.as_element_mut() {
                element.format = alignment;
            }
        }
        Ok(true)
    }

    /// Wrap the selected blocks into list items, merging consecutive ones
    /// into one list; items of another list type switch their list
    pub fn insert_list(&mut self, list_type: ListType) -> Result<bool, EditorError> {
        let blocks = self.selected_blocks();
        if blocks.is_empty() {
            return Ok(false);
        }
        let mut current: Option<NodeKey> = None;
        for block in blocks {
            let node = self.tree.node(block)?;
            if node.is_list_item() {
                let Some(list) = node.parent() else { continue };
                if let Some(element) = self.tree.writable(list)?.as_element_mut() {
                    if let ElementKind::List { list_type: kind, .. } = &mut element.kind {
                        *kind = list_type;
                    }
                }
                continue;
            }
            if !is_block(node) || node.is_code() {
                continue;
            }

            let list = match current {
                Some(list) if self.tree.previous_sibling(block) == Some(list) => list,
                _ => {
                    let list = self.tree.create(NodeKind::list(list_type));
                    self.tree.insert_before(block, list)?;
                    list
                }
            };
            let item = self.tree.create(NodeKind::list_item(1));
            for child in self.tree.children(block).to_vec() {
                self.tree.append(item, child)?;
            }
            self.tree.append(list, item)?;
            self.remap_element_key(block, item);
            self.tree.remove(block)?;
            self.renumber(list)?;
            current = Some(list);
        }
        Ok(true)
    }

    /// Turn every item of the lists the selection touches into a paragraph
    pub fn remove_list(&mut self) -> Result<bool, EditorError> {
        let mut lists: Vec<NodeKey> = Vec::new();
        for block in self.selected_blocks() {
            let node = self.tree.node(block)?;
            if let (true, Some(list)) = (node.is_list_item(), node.parent()) {
                if !lists.contains(&list) {
                    lists.push(list);
                }
            }
        }
        if lists.is_empty() {
            return Ok(false);
        }
        for list in lists {
            for item in self.tree.children(list).to_vec() {
                let paragraph = self.tree.create(NodeKind::paragraph());
                for child in self.tree.children(item).to_vec() {
                    if self.tree.get(child).is_some_and(Node::is_inline) {
                        self.tree.append(paragraph, child)?;
                    }
                }
                self.tree.insert_before(list, paragraph)?;
                self.remap_element_key(item, paragraph);
            }
            self.remove_block(list)?;
        }
        Ok(true)
    }

    /// Wrap the covered inline nodes in a link, update the link around
    /// them, or with `None` unwrap every link the selection touches
    pub fn toggle_link(&mut self, url: Option<&str>) -> Result<bool, EditorError> {
        let Some(range) = self.range().cloned() else {
            return Ok(false);
        };

        let Some(url) = url else {
            let mut links: Vec<NodeKey> = Vec::new();
            let touched = if range.is_collapsed() {
                vec![point_node(&self.tree, &range.anchor)]
            } else {
                selected_leaves(&self.tree, &range)
            };
            for key in touched {
                if let Some(link) = nearest_link(&self.tree, key) {
                    if !links.contains(&link) {
                        links.push(link);
                    }
                }
            }
            if links.is_empty() {
                return Ok(false);
            }
            let blocks: Vec<NodeKey> = links
                .iter()
                .filter_map(|link| block_of(&self.tree, *link))
                .collect();
            for link in links {
                let parent = self.tree.parent(link);
                let index = self.tree.index_in_parent(link).unwrap_or(0);
                self.tree.unwrap_element(link)?;
                if let Some(parent) = parent {
                    self.remap_element(link, Point::element(parent, index));
                }
            }
            for block in blocks {
                self.normalize_block(block)?;
            }
            return Ok(true);
        };

        if range.is_collapsed() {
            let Some(link) = nearest_link(&self.tree, point_node(&self.tree, &range.anchor)) else {
                return Ok(false);
            };
            self.set_link_url(link, url)?;
            return Ok(true);
        }

        let leaves: Vec<NodeKey> = self
            .split_selection()?
            .into_iter()
            .filter(|key| self.tree.get(*key).is_some_and(Node::is_inline))
            .collect();
        if leaves.is_empty() {
            return Ok(false);
        }
        let links: Vec<Option<NodeKey>> = leaves
            .iter()
            .map(|key| nearest_link(&self.tree, *key))
            .collect();
        if let Some(Some(first)) = links.first() {
            let whole = links.iter().all(|link| *link == Some(*first))
                && self.tree.leaves(*first).len() == leaves.len();
            if whole {
                self.set_link_url(*first, url)?;
                return Ok(true);
            }
        }

        let mut unwrapped: Vec<NodeKey> = Vec::new();
        for link in links.into_iter().flatten() {
            if !unwrapped.contains(&link) && self.tree.contains(link) {
                self.tree.unwrap_element(link)?;
                unwrapped.push(link);
            }
        }

        // consecutive siblings share one link
        let mut groups: Vec<Vec<NodeKey>> = Vec::new();
        for leaf in &leaves {
            let parent = self.tree.parent(*leaf);
            let index = self.tree.index_in_parent(*leaf);
            let joins = groups.last().and_then(|group| group.last()).is_some_and(|last| {
                self.tree.parent(*last) == parent
                    && self.tree.index_in_parent(*last).map(|i| i + 1) == index
            });
            match groups.last_mut() {
                Some(group) if joins => group.push(*leaf),
                _ => groups.push(vec![*leaf]),
            }
        }
        for group in groups {
            let link = self.tree.create(NodeKind::link(url));
            self.tree.insert_before(group[0], link)?;
            for leaf in group {
                self.tree.append(link, leaf)?;
            }
        }
        Ok(true)
    }

    fn set_link_url(&mut self, link: NodeKey, url: &str) -> Result<(), EditorError> {
        if let Some(element) = self.tree.writable(link)?.as_element_mut() {
            if let ElementKind::Link(attributes) = &mut element.kind {
                attributes.url = url.to_string();
            }
        }
        Ok(())
    }

    /// Remove nodes and put the caret where the first one was
    pub fn remove_nodes(&mut self, keys: &[NodeKey]) -> Result<bool, EditorError> {
        let mut caret = None;
        for key in keys {
            if !self.tree.contains(*key) {
                continue;
            }
            if caret.is_none() {
                if let (Some(parent), Some(index)) =
                    (self.tree.parent(*key), self.tree.index_in_parent(*key))
                {
                    caret = Some(Point::element(parent, index));
                }
            }
            self.tree.remove(*key)?;
        }
        let Some(caret) = caret else {
            return Ok(false);
        };
        if self.tree.contains(caret.key) {
            let caret = self.settle_point(caret);
            self.select_range(caret, caret)?;
        } else {
            self.selection = None;
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------

    fn normalize_blocks_of(&mut self, keys: &[NodeKey]) -> Result<(), EditorError> {
        let mut blocks: Vec<NodeKey> = Vec::new();
        for key in keys {
            if let Some(block) = block_of(&self.tree, *key) {
                if !blocks.contains(&block) {
                    blocks.push(block);
                }
            }
        }
        for block in blocks {
            self.normalize_block(block)?;
        }
        Ok(())
    }

    /// Merge neighbouring texts of equal format and style, drop empty texts
    /// and empty links; selection points follow the characters
    pub fn normalize_block(&mut self, block: NodeKey) -> Result<(), EditorError> {
        if !self.tree.contains(block) {
            return Ok(());
        }
        let mut parents = vec![block];
        parents.extend(
            self.tree
                .descendants(block)
                .into_iter()
                .filter(|key| self.tree.get(*key).is_some_and(Node::is_link)),
        );

        for parent in parents {
            let mut index = 0;
            while index < self.tree.children(parent).len() {
                let key = self.tree.children(parent)[index];
                let Some(text) = self.tree.get(key).and_then(Node::as_text).cloned() else {
                    index += 1;
                    continue;
                };
                if text.is_empty() {
                    self.tree.remove(key)?;
                    self.remap_text(key, |_| Point::element(parent, index));
                    continue;
                }
                let previous = index
                    .checked_sub(1)
                    .map(|i| self.tree.children(parent)[i])
                    .and_then(|prev| {
                        let prev_text = self.tree.get(prev).and_then(Node::as_text)?;
                        (prev_text.format == text.format && prev_text.style == text.style)
                            .then(|| (prev, prev_text.len()))
                    });
                if let Some((prev, shift)) = previous {
                    if let Some(prev_text) = self.tree.writable(prev)?.as_text_mut() {
                        prev_text.text.push_str(&text.text);
                    }
                    self.tree.remove(key)?;
                    self.remap_text(key, |offset| Point::text(prev, shift + offset));
                    continue;
                }
                index += 1;
            }
        }
        self.prune_empty_links(block)?;
        self.settle_selection();
        Ok(())
    }

    fn prune_empty_links(&mut self, block: NodeKey) -> Result<(), EditorError> {
        if !self.tree.contains(block) {
            return Ok(());
        }
        let empty: Vec<NodeKey> = self
            .tree
            .descendants(block)
            .into_iter()
            .filter(|key| {
                self.tree
                    .get(*key)
                    .is_some_and(|node| node.is_link() && node.children().is_empty())
            })
            .collect();
        for link in empty {
            if let (Some(parent), Some(index)) =
                (self.tree.parent(link), self.tree.index_in_parent(link))
            {
                self.tree.remove(link)?;
                self.remap_element(link, Point::element(parent, index));
            }
        }
        Ok(())
    }

    fn remap_text(&mut self, key: NodeKey, to: impl Fn(usize) -> Point) {
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            for point in [&mut range.anchor, &mut range.focus] {
                if point.kind == PointKind::Text && point.key == key {
                    *point = to(point.offset);
                }
            }
        }
    }

    fn remap_element(&mut self, key: NodeKey, to: Point) {
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            for point in [&mut range.anchor, &mut range.focus] {
                if point.kind == PointKind::Element && point.key == key {
                    *point = to;
                }
            }
        }
    }

    fn remap_element_key(&mut self, from: NodeKey, to: NodeKey) {
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            for point in [&mut range.anchor, &mut range.focus] {
                if point.kind == PointKind::Element && point.key == from {
                    point.key = to;
                }
            }
        }
    }

    /// Prefer a text point next to an element point
    fn settle_point(&self, point: Point) -> Point {
        if point.kind != PointKind::Element {
            return point;
        }
        let children = self.tree.children(point.key);
        let before = point.offset.checked_sub(1).and_then(|i| children.get(i));
        if let Some(text) = before.and_then(|k| self.tree.get(*k)).and_then(Node::as_text) {
            return Point::text(children[point.offset - 1], text.len());
        }
        match children.get(point.offset) {
            Some(after) if self.tree.get(*after).is_some_and(Node::is_text) => {
                Point::text(*after, 0)
            }
            _ => point,
        }
    }

    fn settle_selection(&mut self) {
        let Some(range) = self.range().cloned() else { return };
        let anchor = self.settle_point(range.anchor);
        let focus = self.settle_point(range.focus);
        if let Some(range) = self.selection.as_mut().and_then(Selection::as_range_mut) {
            range.anchor = anchor;
            range.focus = focus;
        }
    }
}

/// Set (or with `None` remove) one property of a CSS declaration list
pub fn patch_style(style: &str, property: &str, value: Option<&str>) -> String {
    let mut declarations: Vec<(String, String)> = style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect();
    declarations.retain(|(name, _)| !name.eq_ignore_ascii_case(property));
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        declarations.push((property.to_string(), value.to_string()));
    }
    declarations
        .iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{ElementNode, HeadingLevel, TextFormat};

    fn transaction(fragment: Fragment) -> Transaction {
        let tree = Tree::from_fragment(&fragment).unwrap();
        Transaction::new(&EditorState::new(tree, None))
    }

    fn paragraph(text: &str) -> Fragment {
        Fragment::paragraph().with_child(Fragment::text(text))
    }

    fn first_text(tx: &Transaction) -> NodeKey {
        tx.tree().leaves(tx.tree().root())[0]
    }

    #[test]
    fn test_insert_text_at_caret() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("helo")));
        let text = first_text(&tx);
        tx.select_caret(text, 3).unwrap();
        assert!(tx.insert_text("l").unwrap());
        assert_eq!(tx.tree().text_content(tx.tree().root()), "hello");
        assert_eq!(tx.range().unwrap().anchor, Point::text(text, 4));
    }

    #[test]
    fn test_insert_text_with_typing_format_splits() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("ab")));
        let text = first_text(&tx);
        tx.select_caret(text, 1).unwrap();
        tx.toggle_format(TextFormatType::Bold).unwrap();
        tx.insert_text("X").unwrap();

        let leaves = tx.tree().leaves(tx.tree().root());
        assert_eq!(leaves.len(), 3);
        let bold = tx.tree().node(leaves[1]).unwrap().as_text().unwrap();
        assert_eq!(bold.text, "X");
        assert_eq!(bold.format, TextFormat::BOLD);
    }

    #[test]
    fn test_toggle_format_on_partial_range() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("hello world")));
        let text = first_text(&tx);
        tx.select_range(Point::text(text, 6), Point::text(text, 11)).unwrap();
        tx.toggle_format(TextFormatType::Italic).unwrap();

        let leaves = tx.tree().leaves(tx.tree().root());
        assert_eq!(leaves.len(), 2);
        let italic = tx.tree().node(leaves[1]).unwrap().as_text().unwrap();
        assert_eq!(italic.text, "world");
        assert!(italic.has_format(TextFormatType::Italic));
        assert_eq!(tx.range().unwrap().format, TextFormat::ITALIC);

        // toggling again removes and merges back
        tx.toggle_format(TextFormatType::Italic).unwrap();
        let leaves = tx.tree().leaves(tx.tree().root());
        assert_eq!(leaves.len(), 1);
        assert_eq!(tx.range().unwrap().focus, Point::text(leaves[0], 11));
    }

    #[test]
    fn test_toggle_format_adds_when_mixed() {
        let mut tx = transaction(
            Fragment::root().with_child(
                Fragment::paragraph()
                    .with_child(Fragment::styled_text(
                        TextNode::new("a").with_format(TextFormat::BOLD),
                    ))
                    .with_child(Fragment::text("b")),
            ),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_range(Point::text(leaves[0], 0), Point::text(leaves[1], 1)).unwrap();
        tx.toggle_format(TextFormatType::Bold).unwrap();

        let leaves = tx.tree().leaves(tx.tree().root());
        assert_eq!(leaves.len(), 1);
        let text = tx.tree().node(leaves[0]).unwrap().as_text().unwrap();
        assert_eq!(text.text, "ab");
        assert_eq!(text.format, TextFormat::BOLD);
    }

    #[test]
    fn test_remove_selected_across_blocks() {
        let mut tx = transaction(
            Fragment::root()
                .with_child(paragraph("first"))
                .with_child(Fragment::paragraph())
                .with_child(paragraph("third")),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_range(Point::text(leaves[1], 2), Point::text(leaves[0], 2)).unwrap();
        assert!(tx.remove_selected().unwrap());

        let root = tx.tree().root();
        assert_eq!(tx.tree().children(root).len(), 1);
        assert_eq!(tx.tree().text_content(root), "fiird");
        let range = tx.range().unwrap();
        assert!(range.is_collapsed());
        assert_eq!(range.anchor, Point::text(leaves[0], 2));
    }

    #[test]
    fn test_backspace_merges_blocks() {
        let mut tx = transaction(
            Fragment::root()
                .with_child(paragraph("ab"))
                .with_child(paragraph("cd")),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_caret(leaves[1], 0).unwrap();
        assert!(tx.delete_character(true).unwrap());

        let root = tx.tree().root();
        assert_eq!(tx.tree().children(root).len(), 1);
        assert_eq!(tx.tree().text_content(root), "abcd");
        assert_eq!(tx.range().unwrap().anchor, Point::text(leaves[0], 2));
    }

    #[test]
    fn test_backspace_at_quote_start_keeps_text() {
        let mut tx = transaction(
            Fragment::root()
                .with_child(Fragment::quote().with_child(Fragment::text("q"))),
        );
        let text = first_text(&tx);
        tx.select_caret(text, 0).unwrap();
        tx.delete_character(true).unwrap();

        let root = tx.tree().root();
        let block = tx.tree().children(root)[0];
        assert!(tx.tree().node(block).unwrap().is_paragraph());
        assert_eq!(tx.tree().text_content(root), "q");
    }

    #[test]
    fn test_delete_forward_inside_text() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("héllo")));
        let text = first_text(&tx);
        tx.select_caret(text, 1).unwrap();
        tx.delete_character(false).unwrap();
        assert_eq!(tx.tree().text_content(tx.tree().root()), "hllo");
    }

    #[test]
    fn test_set_blocks_type_keeps_children() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("Title")));
        let text = first_text(&tx);
        tx.select_caret(text, 0).unwrap();
        tx.set_blocks_type(|| NodeKind::heading(HeadingLevel::H2)).unwrap();

        let root = tx.tree().root();
        let block = tx.tree().children(root)[0];
        assert!(tx.tree().node(block).unwrap().is_heading());
        assert_eq!(tx.tree().children(block), &[text]);
    }

    #[test]
    fn test_lift_middle_list_item_splits_list() {
        let mut tx = transaction(
            Fragment::root().with_child(
                Fragment::list(ListType::Number)
                    .with_child(Fragment::list_item(1).with_child(Fragment::text("a")))
                    .with_child(Fragment::list_item(2).with_child(Fragment::text("b")))
                    .with_child(Fragment::list_item(3).with_child(Fragment::text("c"))),
            ),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_caret(leaves[1], 0).unwrap();
        tx.set_blocks_type(NodeKind::paragraph).unwrap();

        let root = tx.tree().root();
        let blocks = tx.tree().children(root).to_vec();
        assert_eq!(blocks.len(), 3);
        assert!(tx.tree().node(blocks[0]).unwrap().is_list());
        assert!(tx.tree().node(blocks[1]).unwrap().is_paragraph());
        assert!(tx.tree().node(blocks[2]).unwrap().is_list());
        let tail_item = tx.tree().children(blocks[2])[0];
        assert_eq!(
            tx.tree().node(tail_item).unwrap().element_kind(),
            Some(&ElementKind::ListItem { value: 1 })
        );
    }

    #[test]
    fn test_lift_item_from_list_starting_at_max() {
        let list = NodeKind::Element(ElementNode::new(ElementKind::List {
            list_type: ListType::Number,
            start: u32::MAX,
        }));
        let mut tx = transaction(
            Fragment::root().with_child(
                Fragment::new(list)
                    .with_child(Fragment::list_item(u32::MAX).with_child(Fragment::text("a")))
                    .with_child(Fragment::list_item(u32::MAX).with_child(Fragment::text("b")))
                    .with_child(Fragment::list_item(u32::MAX).with_child(Fragment::text("c"))),
            ),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_caret(leaves[2], 0).unwrap();
        tx.set_blocks_type(NodeKind::paragraph).unwrap();

        let root = tx.tree().root();
        let list = tx.tree().children(root)[0];
        let values: Vec<_> = tx
            .tree()
            .children(list)
            .iter()
            .map(|item| tx.tree().node(*item).unwrap().element_kind().cloned())
            .collect();
        assert_eq!(
            values,
            vec![Some(ElementKind::ListItem { value: u32::MAX }); 2]
        );
    }

    #[test]
    fn test_insert_and_remove_list() {
        let mut tx = transaction(
            Fragment::root()
                .with_child(paragraph("one"))
                .with_child(paragraph("two")),
        );
        let leaves = tx.tree().leaves(tx.tree().root());
        tx.select_range(Point::text(leaves[0], 0), Point::text(leaves[1], 3)).unwrap();
        tx.insert_list(ListType::Bullet).unwrap();

        let root = tx.tree().root();
        let blocks = tx.tree().children(root).to_vec();
        assert_eq!(blocks.len(), 1);
        assert_eq!(tx.tree().children(blocks[0]).len(), 2);

        tx.remove_list().unwrap();
        let blocks = tx.tree().children(root).to_vec();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| tx.tree().node(*b).unwrap().is_paragraph()));
        assert_eq!(tx.tree().text_content(root), "one\n\ntwo");
    }

    #[test]
    fn test_toggle_link_wraps_and_unwraps() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("see docs")));
        let text = first_text(&tx);
        tx.select_range(Point::text(text, 4), Point::text(text, 8)).unwrap();
        tx.toggle_link(Some("https://example.com")).unwrap();

        let block = tx.tree().children(tx.tree().root())[0];
        let children = tx.tree().children(block).to_vec();
        assert_eq!(children.len(), 2);
        assert!(tx.tree().node(children[1]).unwrap().is_link());

        tx.toggle_link(None).unwrap();
        let children = tx.tree().children(block).to_vec();
        assert_eq!(children.len(), 1);
        assert_eq!(tx.tree().text_content(block), "see docs");
    }

    #[test]
    fn test_insert_block_adds_trailing_paragraph() {
        let mut tx = transaction(Fragment::root().with_child(paragraph("x")));
        let text = first_text(&tx);
        tx.select_caret(text, 1).unwrap();
        let divider = tx.insert_block(NodeKind::divider()).unwrap();

        let root = tx.tree().root();
        let blocks = tx.tree().children(root).to_vec();
        assert_eq!(blocks.len(), 3);
        assert_eq!(tx.tree().parent(divider), Some(blocks[1]));
        assert_eq!(tx.range().unwrap().anchor, Point::element(blocks[2], 0));
    }

    #[test]
    fn test_patch_style() {
        assert_eq!(patch_style("", "color", Some("#ff0000")), "color: #ff0000;");
        assert_eq!(
            patch_style("color: #000000; font-size: 12px;", "color", Some("#00ff00")),
            "font-size: 12px; color: #00ff00;"
        );
        assert_eq!(patch_style("color: red;", "color", None), "");
    }
}
