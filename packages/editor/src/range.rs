//! Read-only queries of a range selection against a tree.

use quire_model::{ElementKind, Node, NodeKey, Point, PointKind, RangeSelection, TextFormat, Tree};

/// The node a point sits in: its text node, or the child an element point
/// sits before (the element itself when it is empty)
pub fn point_node(tree: &Tree, point: &Point) -> NodeKey {
    match point.kind {
        PointKind::Text => point.key,
        PointKind::Element => {
            let children = tree.children(point.key);
            children
                .get(point.offset)
                .or_else(|| children.last())
                .copied()
                .unwrap_or(point.key)
        }
    }
}

/// Leaves covered by the range in document order, both edges included
pub fn selected_leaves(tree: &Tree, range: &RangeSelection) -> Vec<NodeKey> {
    let (start, end) = range.ordered(tree);
    let first = point_node(tree, &start);
    let last = point_node(tree, &end);
    let last = tree.descendants(last).last().copied().unwrap_or(last);

    let order = tree.preorder();
    let (Some(from), Some(to)) = (
        order.iter().position(|k| *k == first),
        order.iter().position(|k| *k == last),
    ) else {
        return Vec::new();
    };
    if from > to {
        return Vec::new();
    }
    order[from..=to]
        .iter()
        .copied()
        .filter(|k| tree.get(*k).is_some_and(Node::is_leaf))
        .collect()
}

/// Text nodes holding at least one selected character.
///
/// A collapsed range yields the text node of its anchor, if any.
pub fn covered_texts(tree: &Tree, range: &RangeSelection) -> Vec<NodeKey> {
    let (start, end) = range.ordered(tree);
    let mut texts: Vec<NodeKey> = selected_leaves(tree, range)
        .into_iter()
        .filter(|k| tree.get(*k).is_some_and(Node::is_text))
        .collect();
    if range.is_collapsed() || texts.len() < 2 {
        return texts;
    }
    if start.kind == PointKind::Text && texts.first() == Some(&start.key) && start.offset >= text_len(tree, start.key) {
        texts.remove(0);
    }
    if end.kind == PointKind::Text && texts.last() == Some(&end.key) && end.offset == 0 && texts.len() > 1 {
        texts.pop();
    }
    texts
}

/// Formats shared by every covered text node
pub fn common_format(tree: &Tree, range: &RangeSelection) -> TextFormat {
    if range.is_collapsed() {
        return range.format;
    }
    let texts = covered_texts(tree, range);
    if texts.is_empty() {
        return TextFormat::empty();
    }
    texts
        .iter()
        .filter_map(|k| tree.get(*k).and_then(Node::as_text))
        .fold(TextFormat::all(), |acc, text| acc & text.format)
}

pub fn text_len(tree: &Tree, key: NodeKey) -> usize {
    tree.get(key)
        .and_then(Node::as_text)
        .map(|text| text.len())
        .unwrap_or(0)
}

/// Elements that hold inline content directly
pub fn is_block(node: &Node) -> bool {
    matches!(
        node.element_kind(),
        Some(
            ElementKind::Paragraph
                | ElementKind::Heading { .. }
                | ElementKind::Quote
                | ElementKind::Code { .. }
                | ElementKind::ListItem { .. }
        )
    )
}

/// The block containing `key`, itself included
pub fn block_of(tree: &Tree, key: NodeKey) -> Option<NodeKey> {
    tree.nearest(key, is_block)
}

/// Blocks touched by the range, in document order
pub fn selected_blocks(tree: &Tree, range: &RangeSelection) -> Vec<NodeKey> {
    let (start, end) = range.ordered(tree);
    let mut blocks = Vec::new();
    let mut push = |block: Option<NodeKey>| {
        if let Some(block) = block {
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
    };

    push(block_of(tree, point_node(tree, &start)));
    for leaf in selected_leaves(tree, range) {
        push(block_of(tree, leaf));
    }
    push(block_of(tree, point_node(tree, &end)));

    // empty blocks strictly between the edges hold no leaves
    let order = tree.document_order();
    if let (Some(first), Some(last)) = (blocks.first().copied(), blocks.last().copied()) {
        let (from, to) = (order.get(&first), order.get(&last));
        if let (Some(from), Some(to)) = (from, to) {
            let mut between: Vec<NodeKey> = tree
                .preorder()
                .into_iter()
                .filter(|k| {
                    order.get(k).is_some_and(|i| i > from && i < to)
                        && tree.get(*k).is_some_and(is_block)
                        && !blocks.contains(k)
                })
                .collect();
            if !between.is_empty() {
                blocks.append(&mut between);
                blocks.sort_by_key(|k| order.get(k).copied().unwrap_or(usize::MAX));
            }
        }
    }
    blocks
}

/// Previous leaf inside the same block
pub fn previous_leaf_in_block(tree: &Tree, key: NodeKey) -> Option<NodeKey> {
    let block = block_of(tree, key)?;
    let leaves = tree.leaves(block);
    let index = leaves.iter().position(|k| *k == key)?;
    index.checked_sub(1).map(|i| leaves[i])
}

/// Next leaf inside the same block
pub fn next_leaf_in_block(tree: &Tree, key: NodeKey) -> Option<NodeKey> {
    let block = block_of(tree, key)?;
    let leaves = tree.leaves(block);
    let index = leaves.iter().position(|k| *k == key)?;
    leaves.get(index + 1).copied()
}

/// Element a block's alignment lives on: its top-level element, or the
/// block itself inside a table
pub fn alignment_target(tree: &Tree, block: NodeKey) -> NodeKey {
    match tree.top_level_element(block) {
        Some(top) if !tree.get(top).is_some_and(Node::is_table) => top,
        _ => block,
    }
}

/// Neighbouring block in document order
pub fn adjacent_block(tree: &Tree, block: NodeKey, backward: bool) -> Option<NodeKey> {
    let blocks: Vec<NodeKey> = tree
        .preorder()
        .into_iter()
        .filter(|k| tree.get(*k).is_some_and(is_block))
        .collect();
    let index = blocks.iter().position(|k| *k == block)?;
    if backward {
        index.checked_sub(1).map(|i| blocks[i])
    } else {
        blocks.get(index + 1).copied()
    }
}

/// Nearest link around `key`, the node itself included
pub fn nearest_link(tree: &Tree, key: NodeKey) -> Option<NodeKey> {
    tree.nearest(key, Node::is_link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Fragment, TextNode};

    fn doc() -> (Tree, Vec<NodeKey>) {
        let tree = Tree::from_fragment(
            &Fragment::root()
                .with_child(
                    Fragment::paragraph()
                        .with_child(Fragment::text("plain"))
                        .with_child(Fragment::styled_text(
                            TextNode::new("bold").with_format(TextFormat::BOLD),
                        )),
                )
                .with_child(Fragment::paragraph())
                .with_child(Fragment::paragraph().with_child(Fragment::text("last"))),
        )
        .unwrap();
        let leaves = tree.leaves(tree.root());
        (tree, leaves)
    }

    #[test]
    fn test_covered_texts_skip_empty_edges() {
        let (tree, leaves) = doc();
        let range = RangeSelection::new(Point::text(leaves[0], 5), Point::text(leaves[1], 4));
        assert_eq!(covered_texts(&tree, &range), vec![leaves[1]]);
        assert_eq!(common_format(&tree, &range), TextFormat::BOLD);

        let range = RangeSelection::new(Point::text(leaves[0], 2), Point::text(leaves[1], 2));
        assert_eq!(common_format(&tree, &range), TextFormat::empty());
    }

    #[test]
    fn test_selected_blocks_include_empty_middle() {
        let (tree, leaves) = doc();
        let range = RangeSelection::new(Point::text(leaves[2], 1), Point::text(leaves[0], 0));
        let blocks = selected_blocks(&tree, &range);
        assert_eq!(blocks, tree.children(tree.root()).to_vec());
    }

    #[test]
    fn test_leaf_neighbours_stay_in_block() {
        let (tree, leaves) = doc();
        assert_eq!(next_leaf_in_block(&tree, leaves[0]), Some(leaves[1]));
        assert_eq!(next_leaf_in_block(&tree, leaves[1]), None);
        assert_eq!(previous_leaf_in_block(&tree, leaves[2]), None);

        let blocks = tree.children(tree.root());
        assert_eq!(adjacent_block(&tree, blocks[2], true), Some(blocks[1]));
        assert_eq!(adjacent_block(&tree, blocks[0], true), None);
    }
}
