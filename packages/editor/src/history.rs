//! # Undo/Redo History
//!
//! Records committed editor states and restores them through the command
//! bus.
//!
//! ## Design
//!
//! - Every content change pushes the state it replaced onto the undo stack
//! - Edits to one text node within the merge delay coalesce into one entry
//! - Selection-only updates refresh the current entry without pushing
//! - `historic` updates (undo/redo themselves) are never recorded
//! - `history-merge` updates fold into the current entry
//! - New entries clear the redo stack
//!
//! ## Example
//!
//! ```rust,ignore
//! let (history, _disposer) = History::register(&editor);
//! editor.update(|tx| { tx.insert_text("a")?; Ok(()) })?;
//!
//! editor.dispatch(UNDO, ());
//! editor.dispatch(REDO, ());
//! assert!(history.can_undo());
//! ```

use crate::commands::{CommandPriority, Disposer, CAN_REDO, CAN_UNDO, REDO, UNDO};
use crate::config::HistoryConfig;
use crate::editor::Editor;
use crate::state::{EditorState, UpdateEvent};
use quire_model::NodeKey;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const HISTORIC_TAG: &str = "historic";
pub const HISTORY_MERGE_TAG: &str = "history-merge";

/// Undo and redo stacks of editor states
#[derive(Debug)]
pub struct HistoryStack {
    /// Older states (most recent last)
    undo_stack: Vec<EditorState>,

    /// Undone states (most recent last)
    redo_stack: Vec<EditorState>,

    /// The state currently shown by the editor
    current: EditorState,

    /// Text node and time of the last coalescable edit
    last_edit: Option<(NodeKey, Instant)>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    merge_delay: Duration,

    /// Availability last announced through CAN_UNDO / CAN_REDO
    reported: (bool, bool),
}

impl HistoryStack {
    pub fn new(current: EditorState, config: &HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current,
            last_edit: None,
            max_levels: config.max_levels,
            merge_delay: Duration::from_millis(config.merge_delay_ms),
            reported: (false, false),
        }
    }

    /// Record a committed update observed at `now`
    pub fn record(&mut self, event: &UpdateEvent, now: Instant) {
        if event.has_tag(HISTORIC_TAG)
            || event.has_tag(HISTORY_MERGE_TAG)
            || event.is_selection_only()
        {
            self.current = event.state.clone();
            return;
        }

        let edited = single_text_edit(event);
        let merge = match (edited, self.last_edit) {
            (Some(key), Some((last_key, at))) => {
                key == last_key && now.saturating_duration_since(at) < self.merge_delay
            }
            _ => false,
        };
        if !merge {
            let replaced = std::mem::replace(&mut self.current, event.state.clone());
            self.push(replaced);
        } else {
            self.current = event.state.clone();
        }
        self.last_edit = edited.map(|key| (key, now));
    }

    /// Push a state to the undo stack
    fn push(&mut self, state: EditorState) {
        self.undo_stack.push(state);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New edits invalidate the undone future
        self.redo_stack.clear();
    }

    /// Step back; returns the state to show
    pub fn undo(&mut self) -> Option<EditorState> {
        let previous = self.undo_stack.pop()?;
        let current = std::mem::replace(&mut self.current, previous.clone());
        self.redo_stack.push(current);
        self.last_edit = None;
        Some(previous)
    }

    /// Step forward again; returns the state to show
    pub fn redo(&mut self) -> Option<EditorState> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.current, next.clone());
        self.undo_stack.push(current);
        self.last_edit = None;
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_edit = None;
    }

    /// Availability if it changed since it was last reported
    fn availability_change(&mut self) -> Option<(bool, bool)> {
        let now = (self.can_undo(), self.can_redo());
        if now == self.reported {
            return None;
        }
        let before = std::mem::replace(&mut self.reported, now);
        debug!(?before, ?now, "history availability changed");
        Some(now)
    }
}

/// The text node an update changed, when it changed exactly one and no
/// structure
fn single_text_edit(event: &UpdateEvent) -> Option<NodeKey> {
    if event.dirty.len() != 1 {
        return None;
    }
    let key = *event.dirty.iter().next()?;
    let before = event.prev_state.tree().get(key)?;
    let after = event.state.tree().get(key)?;
    (before.is_text() && after.is_text()).then_some(key)
}

/// Shared handle to an editor's history
#[derive(Clone)]
pub struct History {
    stack: Rc<RefCell<HistoryStack>>,
}

impl History {
    /// Record every commit of `editor` and handle UNDO / REDO
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let stack = Rc::new(RefCell::new(HistoryStack::new(
            editor.state().clone(),
            &editor.config().history,
        )));
        let history = Self {
            stack: Rc::clone(&stack),
        };

        let listener = {
            let stack = Rc::clone(&stack);
            editor.register_update_listener(move |editor, event| {
                let change = {
                    let mut stack = stack.borrow_mut();
                    stack.record(event, Instant::now());
                    stack.availability_change()
                };
                if let Some((can_undo, can_redo)) = change {
                    editor.dispatch(CAN_UNDO, can_undo);
                    editor.dispatch(CAN_REDO, can_redo);
                }
            })
        };

        let undo = {
            let stack = Rc::clone(&stack);
            editor.register_command(UNDO, CommandPriority::Editor, move |editor, _| {
                if editor.is_committing() {
                    return false;
                }
                let previous = stack.borrow_mut().undo();
                previous.is_some_and(|state| restore(editor, state))
            })
        };

        let redo = {
            let stack = Rc::clone(&stack);
            editor.register_command(REDO, CommandPriority::Editor, move |editor, _| {
                if editor.is_committing() {
                    return false;
                }
                let next = stack.borrow_mut().redo();
                next.is_some_and(|state| restore(editor, state))
            })
        };

        (history, Disposer::merge([listener, undo, redo]))
    }

    pub fn can_undo(&self) -> bool {
        self.stack.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.borrow().can_redo()
    }

    pub fn undo_levels(&self) -> usize {
        self.stack.borrow().undo_levels()
    }

    pub fn redo_levels(&self) -> usize {
        self.stack.borrow().redo_levels()
    }

    pub fn clear(&self) {
        self.stack.borrow_mut().clear();
    }
}

fn restore(editor: &mut Editor, state: EditorState) -> bool {
    match editor.set_editor_state(state, &[HISTORIC_TAG]) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "could not restore history entry");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use quire_model::{Fragment, Tree};
    use std::cell::Cell;

    fn editor(merge_delay_ms: u64, max_levels: usize) -> (Editor, NodeKey) {
        let tree = Tree::from_fragment(
            &Fragment::root().with_child(Fragment::paragraph().with_child(Fragment::text(""))),
        )
        .unwrap();
        let text = tree.leaves(tree.root())[0];
        let mut config = EditorConfig::default();
        config.history.merge_delay_ms = merge_delay_ms;
        config.history.max_levels = max_levels;
        let mut editor = Editor::with_state(config, EditorState::new(tree, None));
        editor
            .set_selection(Some(quire_model::Selection::caret(text, 0)))
            .unwrap();
        (editor, text)
    }

    fn type_text(editor: &mut Editor, text: &'static str) {
        editor
            .update(move |tx| {
                tx.insert_text(text)?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_undo_redo_restores_states() {
        let (mut editor, _) = editor(0, 100);
        let (history, _disposer) = History::register(&editor);

        type_text(&mut editor, "a");
        type_text(&mut editor, "b");
        assert_eq!(editor.state().text_content(), "ab");
        assert_eq!(history.undo_levels(), 2);

        assert!(editor.dispatch(UNDO, ()));
        assert_eq!(editor.state().text_content(), "a");
        assert!(editor.dispatch(REDO, ()));
        assert_eq!(editor.state().text_content(), "ab");
        assert!(!editor.dispatch(REDO, ()));
    }

    #[test]
    fn test_fast_edits_to_one_node_coalesce() {
        let (mut editor, _) = editor(60_000, 100);
        let (history, _disposer) = History::register(&editor);

        type_text(&mut editor, "a");
        type_text(&mut editor, "b");
        type_text(&mut editor, "c");
        assert_eq!(history.undo_levels(), 1);

        editor.dispatch(UNDO, ());
        assert_eq!(editor.state().text_content(), "");
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (mut editor, _) = editor(0, 100);
        let (history, _disposer) = History::register(&editor);

        type_text(&mut editor, "a");
        editor.dispatch(UNDO, ());
        assert!(history.can_redo());

        type_text(&mut editor, "b");
        assert!(!history.can_redo());
        assert_eq!(editor.state().text_content(), "b");
    }

    #[test]
    fn test_max_levels_trims_oldest() {
        let (mut editor, _) = editor(0, 2);
        let (history, _disposer) = History::register(&editor);

        for text in ["a", "b", "c", "d"] {
            type_text(&mut editor, text);
        }
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_selection_moves_are_not_recorded() {
        let (mut editor, text) = editor(0, 100);
        let (history, _disposer) = History::register(&editor);

        type_text(&mut editor, "ab");
        editor
            .set_selection(Some(quire_model::Selection::caret(text, 1)))
            .unwrap();
        assert_eq!(history.undo_levels(), 1);
    }

    #[test]
    fn test_availability_is_dispatched_on_change() {
        let (mut editor, _) = editor(0, 100);
        let (_history, _disposer) = History::register(&editor);
        let seen = Rc::new(Cell::new(None));
        let _listener = {
            let seen = Rc::clone(&seen);
            editor.register_command(CAN_UNDO, CommandPriority::Critical, move |_, can| {
                seen.set(Some(*can));
                false
            })
        };

        type_text(&mut editor, "a");
        assert_eq!(seen.get(), Some(true));
        editor.dispatch(UNDO, ());
        assert_eq!(seen.get(), Some(false));
    }
}
