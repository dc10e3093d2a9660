//! Owned, key-less node trees.
//!
//! Importers build fragments and insert them into a [`Tree`](crate::Tree);
//! extracting a fragment is how two documents are compared structurally,
//! since keys never take part in fragment equality.

use crate::format::{Alignment, HeadingLevel, ListType};
use crate::node::{ElementKind, ElementNode, ImageNode, NodeKind, TextNode};

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: NodeKind,
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn element(kind: ElementKind) -> Self {
        Self::new(NodeKind::Element(ElementNode::new(kind)))
    }

    pub fn root() -> Self {
        Self::element(ElementKind::Root)
    }

    pub fn paragraph() -> Self {
        Self::new(NodeKind::paragraph())
    }

    pub fn heading(level: HeadingLevel) -> Self {
        Self::new(NodeKind::heading(level))
    }

    pub fn quote() -> Self {
        Self::new(NodeKind::quote())
    }

    pub fn list(list_type: ListType) -> Self {
        Self::new(NodeKind::list(list_type))
    }

    pub fn list_item(value: u32) -> Self {
        Self::new(NodeKind::list_item(value))
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self::new(NodeKind::link(url))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::text(text))
    }

    pub fn styled_text(text: TextNode) -> Self {
        Self::new(NodeKind::Text(text))
    }

    pub fn image(image: ImageNode) -> Self {
        Self::new(NodeKind::image(image))
    }

    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Fragment>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the alignment if this is an element
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        if let NodeKind::Element(element) = &mut self.kind {
            element.format = alignment;
        }
        self
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Number of nodes in this fragment, itself included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Fragment::count).sum::<usize>()
    }

    /// Concatenated text of every text leaf
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        if let NodeKind::Text(text) = &self.kind {
            out.push_str(&text.text);
        }
        for child in &self.children {
            child.write_text(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let fragment = Fragment::root().with_child(
            Fragment::heading(HeadingLevel::H2)
                .with_alignment(Alignment::Center)
                .with_child(Fragment::text("Title")),
        );

        assert_eq!(fragment.count(), 3);
        assert_eq!(fragment.text_content(), "Title");
        assert_eq!(fragment.children[0].type_name(), "heading");
    }
}
