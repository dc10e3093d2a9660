//! # Plugins
//!
//! Optional features built only on the public command bus, update
//! listeners and the palette registry. Each `register` returns a
//! [`Disposer`] that removes every handler and palette entry it added.
//!
//! ```text
//! image   INSERT_IMAGE, SHOW_INSERT_IMAGE_DIALOG, palette "Image"
//! divider INSERT_HORIZONTAL_RULE, palette "Divider"
//! embed   INSERT_YOUTUBE, INSERT_EMBED, SHOW_EMBED_DIALOG, palette "Youtube"
//! table   INSERT_TABLE, row/column insert and delete, palette "Table"
//! link    SHOW_FLOATING_LINK_EDITOR, floating editor state
//! code    SET_CODE_LANGUAGE
//! ```

pub mod code;
pub mod divider;
pub mod embed;
pub mod image;
pub mod link;
pub mod table;

use crate::commands::Disposer;
use crate::editor::Editor;
use crate::range::point_node;
use quire_model::NodeKey;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Open/closed state of a host-rendered popover; closing a closed popover
/// does nothing
pub struct Popover<T> {
    state: Rc<RefCell<Option<T>>>,
}

impl<T> Clone for Popover<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> Default for Popover<T> {
    fn default() -> Self {
        Self {
            state: Rc::new(RefCell::new(None)),
        }
    }
}

impl<T: Clone> Popover<T> {
    pub fn open(&self, value: T) {
        *self.state.borrow_mut() = Some(value);
    }

    /// Returns what the popover was open with
    pub fn close(&self) -> Option<T> {
        self.state.borrow_mut().take()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn current(&self) -> Option<T> {
        self.state.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Popover<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Popover").field(&self.state.borrow()).finish()
    }
}

/// Top-level block holding the caret
pub(crate) fn caret_block(editor: &Editor) -> Option<NodeKey> {
    let state = editor.state();
    let range = state.selection()?.as_range()?;
    state
        .tree()
        .top_level_element(point_node(state.tree(), &range.anchor))
}

/// Handles to the popovers of the registered plugins
#[derive(Debug, Clone)]
pub struct Plugins {
    pub image: image::ImageDialog,
    pub embed: embed::EmbedDialog,
    pub link: link::LinkEditor,
}

/// Register every plugin on `editor`
pub fn register_all(editor: &Editor) -> (Plugins, Disposer) {
    let (image, image_disposer) = image::ImageDialog::register(editor);
    let (embed, embed_disposer) = embed::EmbedDialog::register(editor);
    let (link, link_disposer) = link::LinkEditor::register(editor);
    let disposer = Disposer::merge([
        image_disposer,
        embed_disposer,
        link_disposer,
        divider::register(editor),
        table::register(editor),
        code::register(editor),
    ]);
    (Plugins { image, embed, link }, disposer)
}
