//! Selection values.
//!
//! A selection is either a directional range of two points or a set of whole
//! nodes. "No selection" is `Option::<Selection>::None`.

use crate::format::TextFormat;
use crate::key::NodeKey;
use crate::tree::Tree;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// Offset counts characters of a text node
    Text,
    /// Offset counts children of an element
    Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    pub kind: PointKind,
}

impl Point {
    pub fn text(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Text,
        }
    }

    pub fn element(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Element,
        }
    }

    /// Document-order comparison against another point of the same tree
    pub fn compare(&self, other: &Point, order: &HashMap<NodeKey, usize>, tree: &Tree) -> Ordering {
        if self.key == other.key {
            return self.offset.cmp(&other.offset);
        }
        self.position(order, tree).cmp(&other.position(order, tree))
    }

    fn position(&self, order: &HashMap<NodeKey, usize>, tree: &Tree) -> (usize, usize) {
        let base = order.get(&self.key).copied().unwrap_or(usize::MAX);
        match self.kind {
            PointKind::Text => (base, self.offset),
            PointKind::Element => {
                let children = tree.children(self.key);
                match children.get(self.offset) {
                    Some(child) => (order.get(child).copied().unwrap_or(base), 0),
                    None => {
                        let last = tree
                            .descendants(self.key)
                            .last()
                            .and_then(|k| order.get(k).copied())
                            .unwrap_or(base);
                        (last, usize::MAX)
                    }
                }
            }
        }
    }
}

/// Anchor is where the selection started, focus where it was extended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    /// Format applied to text typed at a collapsed caret
    pub format: TextFormat,
    pub style: String,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::empty(),
            style: String::new(),
        }
    }

    pub fn caret(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self, tree: &Tree) -> bool {
        let order = tree.document_order();
        self.focus.compare(&self.anchor, &order, tree) == Ordering::Less
    }

    /// (start, end) in document order
    pub fn ordered(&self, tree: &Tree) -> (Point, Point) {
        if self.is_backward(tree) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSelection {
    pub keys: BTreeSet<NodeKey>,
}

impl NodeSelection {
    pub fn single(key: NodeKey) -> Self {
        let mut keys = BTreeSet::new();
        keys.insert(key);
        Self { keys }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.keys.contains(&key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Range(RangeSelection),
    Node(NodeSelection),
}

impl Selection {
    pub fn caret(key: NodeKey, offset: usize) -> Self {
        Selection::Range(RangeSelection::caret(Point::text(key, offset)))
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn nodes(keys: impl IntoIterator<Item = NodeKey>) -> Self {
        Selection::Node(NodeSelection {
            keys: keys.into_iter().collect(),
        })
    }

    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node(_) => None,
        }
    }

    pub fn as_range_mut(&mut self) -> Option<&mut RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node(_) => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&NodeSelection> {
        match self {
            Selection::Node(nodes) => Some(nodes),
            Selection::Range(_) => None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            Selection::Range(range) => range.is_collapsed(),
            Selection::Node(_) => false,
        }
    }

    /// Whether every key the selection refers to exists in `tree`
    pub fn is_valid_in(&self, tree: &Tree) -> bool {
        match self {
            Selection::Range(range) => {
                tree.contains(range.anchor.key) && tree.contains(range.focus.key)
            }
            Selection::Node(nodes) => nodes.keys.iter().all(|key| tree.contains(*key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn two_paragraphs() -> (Tree, NodeKey, NodeKey) {
        let tree = Tree::from_fragment(
            &Fragment::root()
                .with_child(Fragment::paragraph().with_child(Fragment::text("one")))
                .with_child(Fragment::paragraph().with_child(Fragment::text("two"))),
        )
        .unwrap();
        let leaves = tree.leaves(tree.root());
        (tree, leaves[0], leaves[1])
    }

    #[test]
    fn test_collapsed() {
        let (_, first, _) = two_paragraphs();
        assert!(Selection::caret(first, 1).is_collapsed());
        assert!(!Selection::range(Point::text(first, 0), Point::text(first, 2)).is_collapsed());
        assert!(!Selection::nodes([first]).is_collapsed());
    }

    #[test]
    fn test_backward_range() {
        let (tree, first, second) = two_paragraphs();
        let forward = RangeSelection::new(Point::text(first, 1), Point::text(second, 2));
        let backward = RangeSelection::new(Point::text(second, 2), Point::text(first, 1));

        assert!(!forward.is_backward(&tree));
        assert!(backward.is_backward(&tree));
        assert_eq!(backward.ordered(&tree), (Point::text(first, 1), Point::text(second, 2)));
    }

    #[test]
    fn test_element_point_order() {
        let (tree, first, _) = two_paragraphs();
        let root = tree.root();
        let order = tree.document_order();

        let before_all = Point::element(root, 0);
        let after_all = Point::element(root, 2);
        let inside = Point::text(first, 1);

        assert_eq!(before_all.compare(&inside, &order, &tree), Ordering::Less);
        assert_eq!(after_all.compare(&inside, &order, &tree), Ordering::Greater);
    }
}
