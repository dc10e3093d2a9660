//! Handlers for the built-in commands.
//!
//! They sit in the `Editor` bucket like any plugin handler would, so a
//! plugin registered at a higher priority can take a command over.

use crate::commands::{
    CommandPriority, Disposer, CLICK_DECORATOR, DELETE_CHARACTER, FORMAT_ELEMENT, FORMAT_TEXT,
    INSERT_ORDERED_LIST, INSERT_TEXT, INSERT_UNORDERED_LIST, KEY_BACKSPACE, KEY_DELETE,
    PASTE_HTML, REMOVE_LIST, TOGGLE_LINK,
};
use crate::editor::Editor;
use crate::errors::EditorError;
use crate::transaction::Transaction;
use quire_model::{ListType, Selection};
use tracing::warn;

/// Run `f` in a transaction; a failure is logged and counts as unhandled
pub(crate) fn run(
    editor: &mut Editor,
    f: impl FnOnce(&mut Transaction) -> Result<bool, EditorError>,
) -> bool {
    match editor.update_with(f) {
        Ok(handled) => handled,
        Err(err) => {
            warn!(%err, "command failed");
            false
        }
    }
}

/// Text input, formatting, deletion, decorator clicks and paste
pub fn register_rich_text(editor: &Editor) -> Disposer {
    let priority = CommandPriority::Editor;
    Disposer::merge([
        editor.register_command(FORMAT_TEXT, priority, |editor, format| {
            let format = *format;
            run(editor, move |tx| tx.toggle_format(format))
        }),
        editor.register_command(FORMAT_ELEMENT, priority, |editor, alignment| {
            let alignment = *alignment;
            run(editor, move |tx| tx.set_alignment(alignment))
        }),
        editor.register_command(INSERT_TEXT, priority, |editor, text| {
            run(editor, |tx| tx.insert_text(text))
        }),
        editor.register_command(DELETE_CHARACTER, priority, |editor, backward| {
            let backward = *backward;
            run(editor, move |tx| tx.delete_character(backward))
        }),
        editor.register_command(KEY_BACKSPACE, priority, |editor, _| {
            run(editor, |tx| delete(tx, true))
        }),
        editor.register_command(KEY_DELETE, priority, |editor, _| {
            run(editor, |tx| delete(tx, false))
        }),
        editor.register_command(CLICK_DECORATOR, priority, |editor, click| {
            let click = *click;
            run(editor, move |tx| {
                if !tx.tree().get(click.key).is_some_and(|node| node.is_decorator()) {
                    return Ok(false);
                }
                let mut keys = match (click.extend, tx.selection().and_then(Selection::as_nodes)) {
                    (true, Some(nodes)) => nodes.keys.clone(),
                    _ => Default::default(),
                };
                keys.insert(click.key);
                tx.select_nodes(keys);
                Ok(true)
            })
        }),
        editor.register_command(PASTE_HTML, priority, |editor, html| {
            match editor.paste_html(html) {
                Ok(handled) => handled,
                Err(err) => {
                    warn!(%err, "paste failed");
                    false
                }
            }
        }),
        editor.register_command(TOGGLE_LINK, priority, |editor, url| {
            let url = url.clone();
            run(editor, move |tx| tx.toggle_link(url.as_deref()))
        }),
    ])
}

/// Backspace and delete: a node selection removes its nodes, a range
/// deletes one character
fn delete(tx: &mut Transaction, backward: bool) -> Result<bool, EditorError> {
    match tx.selection().cloned() {
        Some(Selection::Node(nodes)) => {
            let keys: Vec<_> = nodes.keys.into_iter().collect();
            tx.remove_nodes(&keys)
        }
        Some(Selection::Range(_)) => tx.delete_character(backward),
        None => Ok(false),
    }
}

pub fn register_list(editor: &Editor) -> Disposer {
    let priority = CommandPriority::Editor;
    Disposer::merge([
        editor.register_command(INSERT_UNORDERED_LIST, priority, |editor, _| {
            run(editor, |tx| tx.insert_list(ListType::Bullet))
        }),
        editor.register_command(INSERT_ORDERED_LIST, priority, |editor, _| {
            run(editor, |tx| tx.insert_list(ListType::Number))
        }),
        editor.register_command(REMOVE_LIST, priority, |editor, _| {
            run(editor, Transaction::remove_list)
        }),
    ])
}
