//! Image insertion and the insert-image popover

use super::{caret_block, Popover};
use crate::builtins::run;
use crate::commands::{
    CommandPriority, Disposer, ImagePayload, INSERT_IMAGE, SHOW_INSERT_IMAGE_DIALOG,
};
use crate::editor::Editor;
use crate::palette::{PaletteCategory, PaletteCommand};
use crate::url::{sanitize_url, BLANK_URL};
use quire_model::{Dimension, ImageNode, NodeKey, NodeKind};
use tracing::warn;

/// The popover the host shows to pick an image, anchored to a top-level
/// block
#[derive(Debug, Clone, Default)]
pub struct ImageDialog {
    popover: Popover<NodeKey>,
}

impl ImageDialog {
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let dialog = Self::default();

        let insert =
            editor.register_command(INSERT_IMAGE, CommandPriority::Editor, |editor, payload| {
                let Some(image) = image_node(editor, payload) else {
                    return false;
                };
                run(editor, move |tx| {
                    tx.insert_inline(NodeKind::image(image))?;
                    Ok(true)
                })
            });

        let show = {
            let popover = dialog.popover.clone();
            let priority = CommandPriority::Low;
            editor.register_command(SHOW_INSERT_IMAGE_DIALOG, priority, move |editor, _| {
                match caret_block(editor) {
                    Some(block) => {
                        popover.open(block);
                        true
                    }
                    None => false,
                }
            })
        };

        let palette = editor.palette().register(
            PaletteCommand::new("insert-image", "Image", |editor| {
                editor.dispatch(SHOW_INSERT_IMAGE_DIALOG, ());
                Ok(())
            })
            .with_description("Insert an image from a URL or an upload")
            .with_keywords(&["image", "photo", "picture", "/image"])
            .with_icon("image")
            .with_category(PaletteCategory::Media),
        );

        (dialog, Disposer::merge([insert, show, palette]))
    }

    pub fn is_open(&self) -> bool {
        self.popover.is_open()
    }

    pub fn anchor_block(&self) -> Option<NodeKey> {
        self.popover.current()
    }

    /// Close the popover and insert the picked image
    pub fn submit(&self, editor: &mut Editor, payload: ImagePayload) -> bool {
        self.popover.close();
        editor.dispatch(INSERT_IMAGE, payload)
    }

    pub fn dismiss(&self) -> bool {
        self.popover.close().is_some()
    }
}

/// Image node for a payload; sources with a disallowed protocol are refused
fn image_node(editor: &Editor, payload: &ImagePayload) -> Option<ImageNode> {
    if sanitize_url(&payload.src, &editor.config().links.allowed_protocols) == BLANK_URL {
        warn!(src = %payload.src, "refusing image source");
        return None;
    }
    let mut image = ImageNode::new(payload.src.clone(), payload.alt_text.clone()).with_size(
        Dimension::from_persisted(payload.width.unwrap_or(0)),
        Dimension::from_persisted(payload.height.unwrap_or(0)),
    );
    if let Some(caption) = &payload.caption {
        image = image.with_caption(caption.clone());
    }
    image.max_width = editor.config().image.max_width;
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Point, Selection};

    fn editor() -> Editor {
        let mut editor = Editor::default();
        let first = editor.state().tree().children(editor.state().tree().root())[0];
        let caret = Point::element(first, 0);
        editor.set_selection(Some(Selection::range(caret, caret))).unwrap();
        editor
    }

    fn images(editor: &Editor) -> Vec<ImageNode> {
        let tree = editor.state().tree();
        tree.preorder()
            .into_iter()
            .filter_map(|key| match tree.get(key)?.as_decorator()? {
                quire_model::DecoratorNode::Image(image) => Some(image.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_insert_image_inside_paragraph() {
        let mut editor = editor();
        let (_dialog, _d) = ImageDialog::register(&editor);

        let mut payload = ImagePayload::new("https://example.com/a.png", "a");
        payload.width = Some(320);
        assert!(editor.dispatch(INSERT_IMAGE, payload));

        let found = images(&editor);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].width, Dimension::Pixels(320));
        assert_eq!(found[0].height, Dimension::Inherit);
        let tree = editor.state().tree();
        let image = tree
            .preorder()
            .into_iter()
            .find(|k| tree.get(*k).is_some_and(|n| n.is_image()));
        let parent = image.and_then(|k| tree.parent(k)).unwrap();
        assert!(tree.node(parent).unwrap().is_paragraph());
    }

    #[test]
    fn test_disallowed_source_is_refused() {
        let mut editor = editor();
        let (_dialog, _d) = ImageDialog::register(&editor);
        assert!(!editor.dispatch(INSERT_IMAGE, ImagePayload::new("javascript:alert(1)", "x")));
        assert!(images(&editor).is_empty());
    }

    #[test]
    fn test_dialog_opens_and_submits() {
        let mut editor = editor();
        let (dialog, _d) = ImageDialog::register(&editor);

        assert!(editor.dispatch(SHOW_INSERT_IMAGE_DIALOG, ()));
        assert!(dialog.is_open());
        assert!(dialog.submit(&mut editor, ImagePayload::new("/uploads/b.png", "b")));
        assert!(!dialog.is_open());
        assert!(!dialog.dismiss());
        assert_eq!(images(&editor).len(), 1);
    }
}
