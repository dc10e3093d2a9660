//! # Node Tree
//!
//! Arena of nodes addressed by [`NodeKey`], with copy-on-write sharing.
//!
//! ## Design
//!
//! - Every node lives behind an `Arc`; cloning a tree copies pointers only
//! - The first write to a node through [`Tree::writable`] clones it with
//!   `Arc::make_mut`; later writes reuse the pending clone
//! - Children are stored as keys, so a cloned node needs no rewiring in its
//!   parent and older snapshots keep their own `Arc`s untouched
//! - Every written, created or removed key lands in the dirty set
//!
//! ```text
//! snapshot S1:  root ─ p(Arc a) ─ text(Arc b)
//! snapshot S2:  root'─ p(Arc a) ─ text'(Arc c)     (root' holds same keys)
//! ```

use crate::error::TreeError;
use crate::fragment::Fragment;
use crate::key::NodeKey;
use crate::node::{char_to_byte, ElementKind, ElementNode, Node, NodeKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeKey, Arc<Node>>,
    root: NodeKey,
    dirty: HashSet<NodeKey>,
}

impl Default for Tree {
    /// An empty document: a root holding one empty paragraph
    fn default() -> Self {
        let mut paragraph = Node::new(NodeKind::paragraph());
        let mut root_element = ElementNode::new(ElementKind::Root);
        root_element.children.push(paragraph.key());
        let root = Node::new(NodeKind::Element(root_element));
        paragraph.parent = Some(root.key());

        let key = root.key();
        let mut nodes = HashMap::new();
        nodes.insert(paragraph.key(), Arc::new(paragraph));
        nodes.insert(key, Arc::new(root));
        Self {
            nodes,
            root: key,
            dirty: HashSet::new(),
        }
    }
}

impl Tree {
    /// A tree holding only the root
    pub fn empty() -> Self {
        let root = Node::new(NodeKind::Element(ElementNode::new(ElementKind::Root)));
        let key = root.key();
        let mut nodes = HashMap::new();
        nodes.insert(key, Arc::new(root));
        Self {
            nodes,
            root: key,
            dirty: HashSet::new(),
        }
    }

    pub fn from_fragment(fragment: &Fragment) -> Result<Self, TreeError> {
        let mut tree = Self::empty();
        {
            let root = tree.writable(tree.root)?;
            if let (Some(element), NodeKind::Element(source)) =
                (root.as_element_mut(), &fragment.kind)
            {
                element.format = source.format;
                element.indent = source.indent;
                element.direction = source.direction;
            }
        }
        for child in &fragment.children {
            let root = tree.root;
            tree.insert_fragment(root, usize::MAX, child)?;
        }
        tree.collect_garbage();
        tree.dirty.clear();
        Ok(tree)
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key).map(Arc::as_ref)
    }

    pub fn node(&self, key: NodeKey) -> Result<&Node, TreeError> {
        self.get(key).ok_or(TreeError::NodeNotFound(key))
    }

    /// Shared handle to a node, for identity comparison across snapshots
    pub fn shared(&self, key: NodeKey) -> Option<&Arc<Node>> {
        self.nodes.get(&key)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key).and_then(Node::parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key).map(Node::children).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|child| *child == key)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let index = self.index_in_parent(key)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let index = self.index_in_parent(key)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut current = self.parent(key);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// The node itself or the ancestor that sits directly under the root
    pub fn top_level_element(&self, key: NodeKey) -> Option<NodeKey> {
        if key == self.root {
            return None;
        }
        let mut current = key;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// The node itself or its closest ancestor matching `predicate`
    pub fn nearest(&self, key: NodeKey, predicate: impl Fn(&Node) -> bool) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.get(k)?;
            if predicate(node) {
                return Some(k);
            }
            current = node.parent();
        }
        None
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        key == self.root || self.ancestors(key).last() == Some(&self.root)
    }

    /// Descendants in document order, excluding `key`
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every attached node in document order, root first
    pub fn preorder(&self) -> Vec<NodeKey> {
        let mut out = vec![self.root];
        out.extend(self.descendants(self.root));
        out
    }

    /// Text and decorator leaves under `key` in document order
    pub fn leaves(&self, key: NodeKey) -> Vec<NodeKey> {
        if self.get(key).is_some_and(Node::is_leaf) {
            return vec![key];
        }
        self.descendants(key)
            .into_iter()
            .filter(|k| self.get(*k).is_some_and(Node::is_leaf))
            .collect()
    }

    pub fn first_leaf(&self, key: NodeKey) -> Option<NodeKey> {
        self.leaves(key).first().copied()
    }

    pub fn last_leaf(&self, key: NodeKey) -> Option<NodeKey> {
        self.leaves(key).last().copied()
    }

    /// Position of every attached node in document order
    pub fn document_order(&self) -> HashMap<NodeKey, usize> {
        self.preorder()
            .into_iter()
            .enumerate()
            .map(|(index, key)| (key, index))
            .collect()
    }

    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.write_text(key, &mut out);
        out
    }

    fn write_text(&self, key: NodeKey, out: &mut String) {
        let Some(node) = self.get(key) else {
            return;
        };
        match node.kind() {
            NodeKind::Text(text) => out.push_str(&text.text),
            NodeKind::Element(element) => {
                let count = element.children.len();
                for (index, child) in element.children.iter().enumerate() {
                    self.write_text(*child, out);
                    let block = self.get(*child).is_some_and(|c| !c.is_inline());
                    if block && index + 1 < count {
                        out.push_str("\n\n");
                    }
                }
            }
            NodeKind::Decorator(_) => {}
        }
    }

    /// Add a detached node to the arena
    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        let node = Node::new(kind);
        let key = node.key();
        trace!(key = %key, node_type = node.type_name(), "create node");
        self.nodes.insert(key, Arc::new(node));
        self.dirty.insert(key);
        key
    }

    /// Pending version of a node, cloned on the first write
    pub fn writable(&mut self, key: NodeKey) -> Result<&mut Node, TreeError> {
        let node = self.nodes.get_mut(&key).ok_or(TreeError::NodeNotFound(key))?;
        self.dirty.insert(key);
        Ok(Arc::make_mut(node))
    }

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<NodeKey, TreeError> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Attach `child` at `index` (clamped), detaching it from its old parent.
    ///
    /// Leaves and links inserted directly under the root are wrapped in a
    /// new paragraph. Returns the key that was attached to `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<NodeKey, TreeError> {
        if child == self.root {
            return Err(TreeError::RootImmutable);
        }
        if !self.node(parent)?.is_element() {
            return Err(TreeError::NotAnElement(parent));
        }
        let child_node = self.node(child)?;
        let needs_wrap = parent == self.root && (child_node.is_leaf() || child_node.is_link());
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(TreeError::CycleDetected {
                node: child,
                parent,
            });
        }

        let mut index = index;
        if let Some(old_parent) = self.parent(child) {
            if old_parent == parent {
                if let Some(old_index) = self.index_in_parent(child) {
                    if old_index < index {
                        index -= 1;
                    }
                }
            }
            self.detach(child)?;
        }

        if needs_wrap {
            let wrapper = self.create(NodeKind::paragraph());
            self.link_child(wrapper, usize::MAX, child)?;
            self.link_child(parent, index, wrapper)?;
            debug!(child = %child, wrapper = %wrapper, "wrapped root child in paragraph");
            Ok(wrapper)
        } else {
            self.link_child(parent, index, child)?;
            Ok(child)
        }
    }

    pub fn insert_after(&mut self, sibling: NodeKey, node: NodeKey) -> Result<NodeKey, TreeError> {
        let (parent, index) = self.slot_of(sibling)?;
        self.insert_child(parent, index + 1, node)
    }

    pub fn insert_before(&mut self, sibling: NodeKey, node: NodeKey) -> Result<NodeKey, TreeError> {
        let (parent, index) = self.slot_of(sibling)?;
        self.insert_child(parent, index, node)
    }

    fn slot_of(&self, key: NodeKey) -> Result<(NodeKey, usize), TreeError> {
        if key == self.root {
            return Err(TreeError::RootImmutable);
        }
        let parent = self
            .parent(key)
            .ok_or_else(|| TreeError::InvariantViolation(format!("node {} is detached", key)))?;
        let index = self
            .index_in_parent(key)
            .ok_or_else(|| TreeError::InvariantViolation(format!("node {} missing from parent", key)))?;
        Ok((parent, index))
    }

    fn link_child(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<(), TreeError> {
        let children = self
            .writable(parent)?
            .children_mut()
            .ok_or(TreeError::NotAnElement(parent))?;
        let index = index.min(children.len());
        children.insert(index, child);
        self.writable(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent; the node and its subtree stay in the arena
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::RootImmutable);
        }
        let Some(parent) = self.node(key)?.parent() else {
            return Ok(());
        };
        if let Some(children) = self.writable(parent)?.children_mut() {
            children.retain(|child| *child != key);
        }
        self.writable(key)?.parent = None;
        Ok(())
    }

    /// Remove a node together with its whole subtree
    pub fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.detach(key)?;
        let mut removed = self.descendants(key);
        removed.push(key);
        for k in removed {
            self.nodes.remove(&k);
            self.dirty.insert(k);
        }
        Ok(())
    }

    /// Move the children of `key` into its parent at its position, then remove it
    pub fn unwrap_element(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let (parent, index) = self.slot_of(key)?;
        let children = self.children(key).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child)?;
        }
        self.remove(key)
    }

    /// Put `replacement` where `key` is, optionally moving the children over
    pub fn replace(
        &mut self,
        key: NodeKey,
        replacement: NodeKey,
        transfer_children: bool,
    ) -> Result<NodeKey, TreeError> {
        let (parent, index) = self.slot_of(key)?;
        if transfer_children {
            if !self.node(replacement)?.is_element() {
                return Err(TreeError::NotAnElement(replacement));
            }
            for child in self.children(key).to_vec() {
                self.append(replacement, child)?;
            }
        }
        self.remove(key)?;
        self.insert_child(parent, index, replacement)
    }

    /// Split a text node at a character offset.
    ///
    /// Returns the new right-hand node, or `None` when the offset is at
    /// either edge and nothing was split.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> Result<Option<NodeKey>, TreeError> {
        let text = self
            .node(key)?
            .as_text()
            .ok_or_else(|| TreeError::InvariantViolation(format!("node {} is not text", key)))?;
        if offset == 0 || offset >= text.len() {
            return Ok(None);
        }
        let byte = char_to_byte(&text.text, offset);
        let mut right = text.clone();
        right.text = text.text[byte..].to_string();

        if let Some(left) = self.writable(key)?.as_text_mut() {
            left.text.truncate(byte);
        }
        let right = self.create(NodeKind::Text(right));
        self.insert_after(key, right)?;
        Ok(Some(right))
    }

    /// Build a fragment into the tree under `parent` at `index`
    pub fn insert_fragment(
        &mut self,
        parent: NodeKey,
        index: usize,
        fragment: &Fragment,
    ) -> Result<NodeKey, TreeError> {
        let key = self.build_fragment(fragment)?;
        self.insert_child(parent, index, key)?;
        Ok(key)
    }

    fn build_fragment(&mut self, fragment: &Fragment) -> Result<NodeKey, TreeError> {
        let kind = match &fragment.kind {
            NodeKind::Element(element) => NodeKind::Element(element.shallow()),
            other => other.clone(),
        };
        if matches!(kind, NodeKind::Element(ElementNode { kind: ElementKind::Root, .. })) {
            return Err(TreeError::InvariantViolation(
                "a root cannot be nested".to_string(),
            ));
        }
        let key = self.create(kind);
        for child in &fragment.children {
            let child_key = self.build_fragment(child)?;
            self.append(key, child_key)?;
        }
        Ok(key)
    }

    /// Owned copy of the subtree at `key`
    pub fn to_fragment(&self, key: NodeKey) -> Result<Fragment, TreeError> {
        let node = self.node(key)?;
        let kind = match node.kind() {
            NodeKind::Element(element) => NodeKind::Element(element.shallow()),
            other => other.clone(),
        };
        let children = node
            .children()
            .iter()
            .map(|child| self.to_fragment(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fragment { kind, children })
    }

    /// Keep an empty document editable by giving the root a paragraph
    pub fn ensure_block(&mut self) -> Result<(), TreeError> {
        if self.children(self.root).is_empty() {
            let paragraph = self.create(NodeKind::paragraph());
            self.append(self.root, paragraph)?;
        }
        Ok(())
    }

    pub fn mark_dirty(&mut self, key: NodeKey) {
        self.dirty.insert(key);
    }

    pub fn dirty(&self) -> &HashSet<NodeKey> {
        &self.dirty
    }

    pub fn take_dirty(&mut self) -> HashSet<NodeKey> {
        std::mem::take(&mut self.dirty)
    }

    /// Keys whose node differs by identity between two trees
    pub fn diff(&self, other: &Tree) -> HashSet<NodeKey> {
        let mut changed = HashSet::new();
        for (key, node) in &self.nodes {
            match other.nodes.get(key) {
                Some(theirs) if Arc::ptr_eq(node, theirs) => {}
                _ => {
                    changed.insert(*key);
                }
            }
        }
        for key in other.nodes.keys() {
            if !self.nodes.contains_key(key) {
                changed.insert(*key);
            }
        }
        changed
    }

    /// Drop nodes no longer reachable from the root
    pub fn collect_garbage(&mut self) -> usize {
        let reachable: HashSet<NodeKey> = self.preorder().into_iter().collect();
        let before = self.nodes.len();
        self.nodes.retain(|key, _| reachable.contains(key));
        let collected = before - self.nodes.len();
        if collected > 0 {
            debug!(collected, "collected detached nodes");
        }
        collected
    }

    /// Check parent links and root-child rules over the whole arena
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self.node(self.root)?;
        if root.parent().is_some() || !root.is_root() {
            return Err(TreeError::InvariantViolation("malformed root".to_string()));
        }

        let mut seen = HashSet::new();
        seen.insert(self.root);
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            for child in self.children(key) {
                let node = self.node(*child)?;
                if node.parent() != Some(key) {
                    return Err(TreeError::InvariantViolation(format!(
                        "node {} lists {} as child but its parent is {:?}",
                        key,
                        child,
                        node.parent()
                    )));
                }
                if !seen.insert(*child) {
                    return Err(TreeError::InvariantViolation(format!(
                        "node {} has more than one parent",
                        child
                    )));
                }
                if key == self.root && (node.is_leaf() || node.is_link()) {
                    return Err(TreeError::InvariantViolation(format!(
                        "{} {} sits directly under the root",
                        node.type_name(),
                        child
                    )));
                }
                stack.push(*child);
            }
        }

        if seen.len() != self.nodes.len() {
            return Err(TreeError::InvariantViolation(format!(
                "{} detached nodes left in the arena",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }
}
