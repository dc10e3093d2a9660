/// Tree mutation tests
/// Covers copy-on-write sharing, insertion rules and removal
use crate::*;

#[cfg(test)]
mod tree_tests {
    use super::*;
    use std::sync::Arc;

    fn document() -> Tree {
        Tree::from_fragment(
            &Fragment::root()
                .with_child(
                    Fragment::paragraph()
                        .with_child(Fragment::text("hello "))
                        .with_child(Fragment::link("https://a.dev").with_child(Fragment::text("link"))),
                )
                .with_child(Fragment::quote().with_child(Fragment::text("quoted"))),
        )
        .expect("Failed to build tree")
    }

    #[test]
    fn test_default_document_has_one_paragraph() {
        let tree = Tree::default();
        let children = tree.children(tree.root());
        assert_eq!(children.len(), 1);
        assert!(tree.node(children[0]).unwrap().is_paragraph());
        assert_eq!(tree.parent(children[0]), Some(tree.root()));
        assert!(tree.dirty().is_empty());
        tree.validate().expect("default tree is valid");
    }

    #[test]
    fn test_copy_on_write_isolation() {
        let s1 = document();
        let text = s1.leaves(s1.root())[0];
        let paragraph = s1.parent(text).unwrap();
        let quote = s1.children(s1.root())[1];

        let mut s2 = s1.clone();
        s2.writable(text).unwrap().as_text_mut().unwrap().text = "changed".into();
        let extra = s2.create(NodeKind::text("!"));
        s2.append(paragraph, extra).unwrap();

        assert_eq!(s1.text_content(text), "hello ");
        assert_eq!(s1.children(paragraph).len(), 2);
        assert_eq!(s2.text_content(text), "changed");
        assert_eq!(s2.children(paragraph).len(), 3);

        // untouched subtrees are shared between snapshots
        assert!(Arc::ptr_eq(s1.shared(quote).unwrap(), s2.shared(quote).unwrap()));
        assert!(!Arc::ptr_eq(s1.shared(text).unwrap(), s2.shared(text).unwrap()));
    }

    #[test]
    fn test_dirty_set_tracks_writes() {
        let mut tree = document();
        let text = tree.leaves(tree.root())[0];
        let paragraph = tree.parent(text).unwrap();

        tree.writable(text).unwrap();
        let dirty = tree.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert!(dirty.contains(&text));

        let extra = tree.create(NodeKind::text("x"));
        tree.append(paragraph, extra).unwrap();
        let dirty = tree.take_dirty();
        assert!(dirty.contains(&extra));
        assert!(dirty.contains(&paragraph));
        assert!(tree.dirty().is_empty());
    }

    #[test]
    fn test_text_under_root_is_wrapped() {
        let mut tree = Tree::empty();
        let root = tree.root();
        let text = tree.create(NodeKind::text("bare"));
        let attached = tree.append(root, text).unwrap();

        assert_ne!(attached, text);
        assert!(tree.node(attached).unwrap().is_paragraph());
        assert_eq!(tree.parent(text), Some(attached));
        tree.validate().unwrap();
    }

    #[test]
    fn test_decorator_under_root_is_wrapped() {
        let mut tree = Tree::default();
        let first = tree.children(tree.root())[0];
        let divider = tree.create(NodeKind::divider());
        let attached = tree.insert_after(first, divider).unwrap();

        assert!(tree.node(attached).unwrap().is_paragraph());
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert_eq!(tree.children(attached), &[divider]);
    }

    #[test]
    fn test_insert_moves_node() {
        let mut tree = document();
        let root = tree.root();
        let paragraph = tree.children(root)[0];
        let quote = tree.children(root)[1];
        let hello = tree.children(paragraph)[0];

        tree.append(quote, hello).unwrap();

        assert_eq!(tree.children(paragraph).len(), 1);
        assert_eq!(tree.parent(hello), Some(quote));
        assert_eq!(tree.text_content(quote), "quotedhello ");
        tree.validate().unwrap();
    }

    #[test]
    fn test_reorder_within_parent() {
        let mut tree = document();
        let root = tree.root();
        let paragraph = tree.children(root)[0];
        let quote = tree.children(root)[1];

        tree.insert_child(root, 2, paragraph).unwrap();
        assert_eq!(tree.children(root), &[quote, paragraph]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = document();
        let paragraph = tree.children(tree.root())[0];
        let link = tree.children(paragraph)[1];

        let err = tree.append(link, paragraph).unwrap_err();
        assert!(matches!(err, TreeError::CycleDetected { .. }));
        assert_eq!(tree.append(paragraph, paragraph).unwrap_err(), TreeError::CycleDetected {
            node: paragraph,
            parent: paragraph,
        });
    }

    #[test]
    fn test_leaf_parent_rejected() {
        let mut tree = document();
        let text = tree.leaves(tree.root())[0];
        let extra = tree.create(NodeKind::text("x"));
        assert_eq!(tree.append(text, extra).unwrap_err(), TreeError::NotAnElement(text));
    }

    #[test]
    fn test_root_is_immutable() {
        let mut tree = document();
        let root = tree.root();
        assert_eq!(tree.remove(root).unwrap_err(), TreeError::RootImmutable);
        let paragraph = tree.children(root)[0];
        assert_eq!(tree.append(paragraph, root).unwrap_err(), TreeError::RootImmutable);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = document();
        let paragraph = tree.children(tree.root())[0];
        let descendants = tree.descendants(paragraph);
        let before = tree.len();

        tree.remove(paragraph).unwrap();

        assert_eq!(tree.len(), before - descendants.len() - 1);
        for key in descendants {
            assert!(!tree.contains(key));
            assert!(tree.dirty().contains(&key));
        }
        tree.validate().unwrap();
    }

    #[test]
    fn test_unwrap_reparents_children() {
        let mut tree = document();
        let paragraph = tree.children(tree.root())[0];
        let link = tree.children(paragraph)[1];
        let link_text = tree.children(link)[0];

        tree.unwrap_element(link).unwrap();

        assert!(!tree.contains(link));
        assert_eq!(tree.parent(link_text), Some(paragraph));
        assert_eq!(tree.index_in_parent(link_text), Some(1));
        tree.validate().unwrap();
    }

    #[test]
    fn test_replace_transfers_children() {
        let mut tree = document();
        let root = tree.root();
        let quote = tree.children(root)[1];
        let heading = tree.create(NodeKind::heading(HeadingLevel::H1));

        tree.replace(quote, heading, true).unwrap();

        assert_eq!(tree.children(root)[1], heading);
        assert_eq!(tree.text_content(heading), "quoted");
        assert!(!tree.contains(quote));
        tree.validate().unwrap();
    }

    #[test]
    fn test_split_text() {
        let mut tree = document();
        let text = tree.leaves(tree.root())[0];

        let right = tree.split_text(text, 2).unwrap().unwrap();
        assert_eq!(tree.text_content(text), "he");
        assert_eq!(tree.text_content(right), "llo ");
        assert_eq!(tree.next_sibling(text), Some(right));

        assert_eq!(tree.split_text(text, 0).unwrap(), None);
        assert_eq!(tree.split_text(text, 2).unwrap(), None);
    }

    #[test]
    fn test_garbage_collection_and_validation() {
        let mut tree = document();
        let orphan = tree.create(NodeKind::paragraph());
        assert!(tree.validate().is_err());

        assert_eq!(tree.collect_garbage(), 1);
        assert!(!tree.contains(orphan));
        tree.validate().unwrap();
    }

    #[test]
    fn test_diff_by_identity() {
        let s1 = document();
        let mut s2 = s1.clone();
        assert!(s1.diff(&s2).is_empty());

        let text = s2.leaves(s2.root())[1];
        s2.writable(text).unwrap();
        let removed = s2.children(s2.root())[1];
        let removed_text = s2.children(removed)[0];
        s2.remove(removed).unwrap();

        let diff = s1.diff(&s2);
        assert!(diff.contains(&text));
        assert!(diff.contains(&removed));
        assert!(diff.contains(&removed_text));
        assert!(diff.contains(&s1.root()));
    }

    #[test]
    fn test_navigation() {
        let tree = document();
        let root = tree.root();
        let paragraph = tree.children(root)[0];
        let link = tree.children(paragraph)[1];
        let link_text = tree.children(link)[0];

        assert_eq!(tree.ancestors(link_text), vec![link, paragraph, root]);
        assert_eq!(tree.top_level_element(link_text), Some(paragraph));
        assert_eq!(tree.nearest(link_text, Node::is_link), Some(link));
        assert_eq!(tree.nearest(link, Node::is_link), Some(link));
        assert_eq!(tree.previous_sibling(link), Some(tree.children(paragraph)[0]));
        assert_eq!(tree.text_content(root), "hello link\n\nquoted");
        assert!(tree.is_attached(link_text));
    }

    #[test]
    fn test_fragment_round_trip_ignores_keys() {
        let tree = document();
        let fragment = tree.to_fragment(tree.root()).unwrap();
        let rebuilt = Tree::from_fragment(&fragment).unwrap();

        assert_ne!(rebuilt.root(), tree.root());
        assert_eq!(rebuilt.to_fragment(rebuilt.root()).unwrap(), fragment);
    }
}
