//! Floating link editor
//!
//! The editor opens when the caret sits inside a link, or when the host
//! dispatches `SHOW_FLOATING_LINK_EDITOR` with coordinates. Submitting a
//! URL normalizes and sanitizes it before toggling the link.

use super::Popover;
use crate::commands::{
    CommandPriority, Disposer, LinkEditorRequest, SHOW_FLOATING_LINK_EDITOR, TOGGLE_LINK,
};
use crate::editor::Editor;
use crate::range::{nearest_link, text_len};
use crate::state::EditorState;
use crate::url::{ensure_url_protocol, sanitize_url};
use quire_model::{ElementKind, PointKind};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LinkEditor {
    popover: Popover<LinkEditorRequest>,
}

/// URL of the link holding a collapsed caret, unless the caret sits at the
/// very end of the link text
fn caret_link_url(state: &EditorState) -> Option<String> {
    let range = state.selection()?.as_range()?;
    if !range.is_collapsed() || range.anchor.kind != PointKind::Text {
        return None;
    }
    let tree = state.tree();
    let link = nearest_link(tree, range.anchor.key)?;
    if range.anchor.offset >= text_len(tree, range.anchor.key) {
        return None;
    }
    match tree.get(link)?.element_kind()? {
        ElementKind::Link(attributes) => Some(attributes.url.clone()),
        _ => None,
    }
}

impl LinkEditor {
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let link_editor = Self::default();

        let show = {
            let popover = link_editor.popover.clone();
            let priority = CommandPriority::High;
            editor.register_command(SHOW_FLOATING_LINK_EDITOR, priority, move |_, request| {
                if request.coordinates.is_some() {
                    popover.open(request.clone());
                } else {
                    popover.close();
                }
                false
            })
        };

        let listener = {
            let popover = link_editor.popover.clone();
            editor.register_update_listener(move |_, event| {
                match caret_link_url(&event.state) {
                    Some(url) => {
                        let same = popover.current().is_some_and(|open| open.url == url);
                        if !same {
                            debug!(url = %url, "caret entered link");
                            popover.open(LinkEditorRequest {
                                url,
                                coordinates: None,
                            });
                        }
                    }
                    None if event.selection_changed() => {
                        popover.close();
                    }
                    None => {}
                }
            })
        };

        (link_editor, Disposer::merge([show, listener]))
    }

    pub fn is_open(&self) -> bool {
        self.popover.is_open()
    }

    pub fn request(&self) -> Option<LinkEditorRequest> {
        self.popover.current()
    }

    /// Link the selection to `url` and close the editor; a blank URL only
    /// closes it
    pub fn submit(&self, editor: &mut Editor, url: &str) -> bool {
        let url = url.trim();
        let handled = if url.is_empty() {
            false
        } else {
            let allowed = &editor.config().links.allowed_protocols;
            let url = sanitize_url(&ensure_url_protocol(url), allowed);
            editor.dispatch(TOGGLE_LINK, Some(url))
        };
        self.popover.close();
        handled
    }

    pub fn dismiss(&self) -> bool {
        self.popover.close().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_rich_text;
    use quire_model::{Fragment, Node, NodeKey, Point, Selection, Tree};

    fn editor() -> (Editor, Vec<NodeKey>) {
        let tree = Tree::from_fragment(
            &Fragment::root().with_child(
                Fragment::paragraph()
                    .with_child(Fragment::text("see "))
                    .with_child(Fragment::link("https://a.dev").with_child(Fragment::text("docs"))),
            ),
        )
        .unwrap();
        let leaves = tree.leaves(tree.root());
        (
            Editor::with_state(Default::default(), EditorState::new(tree, None)),
            leaves,
        )
    }

    fn link_urls(editor: &Editor) -> Vec<String> {
        let tree = editor.state().tree();
        tree.preorder()
            .into_iter()
            .filter_map(|key| match tree.get(key).and_then(Node::element_kind)? {
                ElementKind::Link(attributes) => Some(attributes.url.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_caret_inside_link_opens_editor() {
        let (mut editor, leaves) = editor();
        let (link_editor, _d) = LinkEditor::register(&editor);

        editor.set_selection(Some(Selection::caret(leaves[1], 1))).unwrap();
        assert_eq!(link_editor.request().map(|r| r.url), Some("https://a.dev".to_string()));

        editor.set_selection(Some(Selection::caret(leaves[1], 4))).unwrap();
        assert!(!link_editor.is_open());

        editor.set_selection(Some(Selection::caret(leaves[0], 1))).unwrap();
        assert!(!link_editor.is_open());
    }

    #[test]
    fn test_show_command_follows_coordinates() {
        let (mut editor, _) = editor();
        let (link_editor, _d) = LinkEditor::register(&editor);

        let request = LinkEditorRequest {
            url: "https://".to_string(),
            coordinates: Some((10.0, 20.0)),
        };
        assert!(!editor.dispatch(SHOW_FLOATING_LINK_EDITOR, request.clone()));
        assert_eq!(link_editor.request(), Some(request));

        editor.dispatch(
            SHOW_FLOATING_LINK_EDITOR,
            LinkEditorRequest {
                url: String::new(),
                coordinates: None,
            },
        );
        assert!(!link_editor.is_open());
        assert!(!link_editor.dismiss());
    }

    #[test]
    fn test_submit_adds_protocol() {
        let (mut editor, leaves) = editor();
        let _rich = register_rich_text(&editor);
        let (link_editor, _d) = LinkEditor::register(&editor);

        let range = Selection::range(Point::text(leaves[0], 0), Point::text(leaves[0], 3));
        editor.set_selection(Some(range)).unwrap();
        assert!(link_editor.submit(&mut editor, "  example.com "));
        assert!(!link_editor.is_open());
        assert!(link_urls(&editor).contains(&"https://example.com".to_string()));

        assert!(!link_editor.submit(&mut editor, "   "));
    }
}
