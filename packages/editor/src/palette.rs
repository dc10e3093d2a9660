//! # Command Palette
//!
//! Slash-menu commands and the `/` trigger that opens the menu.
//!
//! ## Design
//!
//! - The registry belongs to one editor and keeps registration order
//! - A second registration of an id is ignored and gets an inert disposer
//! - Search ranks by fuzzy score over label and keywords; ties keep
//!   registration order
//! - Closing the palette removes the triggering `/` in an update tagged
//!   [`PALETTE_DISMISS_TAG`], which the trigger listener ignores
//!
//! ## Example
//!
//! ```rust,ignore
//! let _defaults = register_default_commands(&editor);
//! let (trigger, _disposer) = PaletteTrigger::register(&editor);
//!
//! editor.dispatch(INSERT_TEXT, "/".to_string());
//! assert!(trigger.is_open());
//! trigger.execute(&mut editor, "heading2-command")?;
//! ```

use crate::commands::Disposer;
use crate::editor::Editor;
use crate::errors::EditorError;
use crate::state::EditorState;
use indexmap::IndexMap;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher};
use quire_model::{HeadingLevel, NodeKey, NodeKind, PointKind};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Updates carrying this tag never open the palette
pub const PALETTE_DISMISS_TAG: &str = "palette-dismiss";

/// Block changes made from the palette keep the host's focus where it is
pub const SKIP_SELECTION_FOCUS_TAG: &str = "skip-selection-focus";

pub type PaletteAction = Rc<dyn Fn(&mut Editor) -> Result<(), EditorError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteCategory {
    #[default]
    Basic,
    Media,
    Advanced,
}

#[derive(Clone)]
pub struct PaletteCommand {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    /// Icon name for the host to resolve
    pub icon: Option<String>,
    pub category: PaletteCategory,
    pub execute: PaletteAction,
}

impl PaletteCommand {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        execute: impl Fn(&mut Editor) -> Result<(), EditorError> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            icon: None,
            category: PaletteCategory::Basic,
            execute: Rc::new(execute),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_category(mut self, category: PaletteCategory) -> Self {
        self.category = category;
        self
    }

    fn search_text(&self) -> String {
        let mut text = self.label.clone();
        for keyword in &self.keywords {
            text.push(' ');
            text.push_str(keyword);
        }
        text
    }
}

impl fmt::Debug for PaletteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteCommand")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Order-preserving set of palette commands keyed by id
#[derive(Clone)]
pub struct PaletteRegistry {
    commands: Rc<RefCell<IndexMap<String, PaletteCommand>>>,
    max_results: usize,
}

impl PaletteRegistry {
    pub fn new(max_results: usize) -> Self {
        Self {
            commands: Rc::new(RefCell::new(IndexMap::new())),
            max_results,
        }
    }

    pub fn register(&self, command: PaletteCommand) -> Disposer {
        let id = command.id.clone();
        {
            let mut commands = self.commands.borrow_mut();
            if commands.contains_key(&id) {
                debug!(id, "palette command already registered");
                return Disposer::noop();
            }
            commands.insert(id.clone(), command);
        }
        let commands = Rc::downgrade(&self.commands);
        Disposer::new(move || {
            if let Some(commands) = commands.upgrade() {
                commands.borrow_mut().shift_remove(&id);
            }
        })
    }

    pub fn get(&self, id: &str) -> Option<PaletteCommand> {
        self.commands.borrow().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    /// Every command in registration order
    pub fn commands(&self) -> Vec<PaletteCommand> {
        self.commands.borrow().values().cloned().collect()
    }

    /// Best matches first, at most `max_results` of them
    pub fn search(&self, query: &str) -> Vec<PaletteCommand> {
        let commands = self.commands.borrow();
        let query = query.trim();
        if query.is_empty() {
            return commands.values().take(self.max_results).cloned().collect();
        }

        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        let mut matcher = Matcher::new(Config::DEFAULT);
        let texts: Vec<String> = commands.values().map(PaletteCommand::search_text).collect();
        let mut scored: Vec<(usize, u32)> = texts
            .iter()
            .enumerate()
            .filter_map(|(index, text)| {
                let candidates = [text.as_str()];
                pattern
                    .match_list(candidates, &mut matcher)
                    .first()
                    .map(|(_, score)| (index, *score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        trace!(query, matches = scored.len(), "palette search");

        scored
            .into_iter()
            .take(self.max_results)
            .filter_map(|(index, _)| commands.get_index(index).map(|(_, c)| c.clone()))
            .collect()
    }
}

// ----------------------------------------------------------------------
// Default commands
// ----------------------------------------------------------------------

fn set_blocks(editor: &mut Editor, make: fn() -> NodeKind) -> Result<(), EditorError> {
    editor.update_with(|tx| {
        tx.add_tag(SKIP_SELECTION_FOCUS_TAG);
        tx.set_blocks_type(make)?;
        Ok(())
    })
}

fn heading_command(level: u8, description: &str, make: fn() -> NodeKind) -> PaletteCommand {
    let tag = format!("h{}", level);
    let name = format!("heading{}", level);
    let slash_tag = format!("/{}", tag);
    let slash_name = format!("/{}", name);
    PaletteCommand::new(
        format!("heading{}-command", level),
        format!("Heading {}", level),
        move |editor| set_blocks(editor, make),
    )
    .with_description(description)
    .with_keywords(&[
        tag.as_str(),
        name.as_str(),
        slash_tag.as_str(),
        slash_name.as_str(),
    ])
    .with_icon(format!("heading-{}", level))
}

pub fn default_commands() -> Vec<PaletteCommand> {
    vec![
        heading_command(1, "Large section heading", || {
            NodeKind::heading(HeadingLevel::H1)
        }),
        heading_command(2, "Medium section heading", || {
            NodeKind::heading(HeadingLevel::H2)
        }),
        heading_command(3, "Small section heading", || {
            NodeKind::heading(HeadingLevel::H3)
        }),
        PaletteCommand::new("quote-command", "Quote", |editor| {
            set_blocks(editor, NodeKind::quote)
        })
        .with_description("Change block to a quote")
        .with_keywords(&["quote", "/quote"])
        .with_icon("quote"),
    ]
}

pub fn register_default_commands(editor: &Editor) -> Disposer {
    Disposer::merge(
        default_commands()
            .into_iter()
            .map(|command| editor.palette().register(command)),
    )
}

// ----------------------------------------------------------------------
// Trigger
// ----------------------------------------------------------------------

/// Char offset of the `/` just before `caret` in `text`, when that `/`
/// starts the text or follows whitespace
pub fn trigger_offset(text: &str, caret: usize) -> Option<usize> {
    let slash = caret.checked_sub(1)?;
    let mut before = text.chars().skip(slash.saturating_sub(1));
    if slash == 0 {
        return (before.next()? == '/').then_some(0);
    }
    let previous = before.next()?;
    (previous.is_whitespace() && before.next()? == '/').then_some(slash)
}

/// Text node, caret offset and text under a collapsed text caret
fn caret_text(state: &EditorState) -> Option<(NodeKey, usize, String)> {
    let range = state.selection()?.as_range()?;
    if !range.is_collapsed() || range.anchor.kind != PointKind::Text {
        return None;
    }
    let text = state.tree().get(range.anchor.key)?.as_text()?;
    Some((range.anchor.key, range.anchor.offset, text.text.clone()))
}

#[derive(Debug, Default)]
struct TriggerState {
    /// Top-level block the palette is anchored to
    open: Option<NodeKey>,
    /// Text node and char offset of the `/` that opened the palette
    slash: Option<(NodeKey, usize)>,
}

/// Opens the palette when a `/` is typed at the start of a text or after
/// whitespace
#[derive(Clone)]
pub struct PaletteTrigger {
    state: Rc<RefCell<TriggerState>>,
}

impl PaletteTrigger {
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let trigger = Self {
            state: Rc::new(RefCell::new(TriggerState::default())),
        };
        let listener = {
            let state = Rc::clone(&trigger.state);
            editor.register_update_listener(move |_, event| {
                if event.has_tag(PALETTE_DISMISS_TAG)
                    || event.is_selection_only()
                    || state.borrow().open.is_some()
                {
                    return;
                }
                let Some((key, caret, text)) = caret_text(&event.state) else {
                    return;
                };
                let Some(offset) = trigger_offset(&text, caret) else {
                    return;
                };
                let block = event.state.tree().top_level_element(key);
                debug!(?block, offset, "open palette");
                let mut state = state.borrow_mut();
                state.open = block;
                state.slash = block.map(|_| (key, offset));
            })
        };
        (trigger, listener)
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open.is_some()
    }

    /// Top-level block the host positions the palette against
    pub fn anchor_block(&self) -> Option<NodeKey> {
        self.state.borrow().open
    }

    /// Close the palette and remove the `/` that opened it, if it is still
    /// there; closing a closed palette does nothing
    pub fn close(&self, editor: &mut Editor) -> Result<bool, EditorError> {
        let (open, slash) = {
            let mut state = self.state.borrow_mut();
            (state.open.take(), state.slash.take())
        };
        if open.is_none() {
            return Ok(false);
        }
        let Some((key, offset)) = slash else {
            return Ok(true);
        };
        editor.update_tagged(&[PALETTE_DISMISS_TAG], move |tx| {
            let still_slash = tx
                .tree()
                .get(key)
                .and_then(|node| node.as_text())
                .is_some_and(|text| text.text.chars().nth(offset) == Some('/'));
            if still_slash {
                tx.remove_char_at(key, offset)?;
            } else {
                trace!(?key, offset, "trigger slash already gone");
            }
            Ok(())
        })?;
        Ok(true)
    }

    /// Close the palette, then run the command with `id`
    pub fn execute(&self, editor: &mut Editor, id: &str) -> Result<bool, EditorError> {
        let Some(command) = editor.palette().get(id) else {
            warn!(id, "unknown palette command");
            return Ok(false);
        };
        self.close(editor)?;
        (command.execute)(editor)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn noop(id: &str, label: &str, keywords: &[&str]) -> PaletteCommand {
        PaletteCommand::new(id, label, |_| Ok(())).with_keywords(keywords)
    }

    #[test]
    fn test_duplicate_id_is_ignored() {
        let registry = PaletteRegistry::new(10);
        let first = registry.register(noop("a", "First", &[]));
        let second = registry.register(noop("a", "Second", &[]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().label, "First");

        second.dispose();
        assert_eq!(registry.len(), 1);
        first.dispose();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_query_keeps_order_and_cap() {
        let registry = PaletteRegistry::new(2);
        let _d = Disposer::merge([
            registry.register(noop("a", "A", &[])),
            registry.register(noop("b", "B", &[])),
            registry.register(noop("c", "C", &[])),
        ]);
        let ids: Vec<String> = registry.search("").into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_search_matches_keywords() {
        let registry = PaletteRegistry::new(10);
        let _d = Disposer::merge(default_commands().into_iter().map(|c| registry.register(c)));
        let found = registry.search("quote");
        assert_eq!(found[0].id, "quote-command");
        assert!(registry.search("zzzz").is_empty());
    }

    #[test]
    fn test_trigger_offset() {
        assert_eq!(trigger_offset("/", 1), Some(0));
        assert_eq!(trigger_offset("/h1", 1), Some(0));
        assert_eq!(trigger_offset("hello /", 7), Some(6));
        assert_eq!(trigger_offset("héllo  /x", 8), Some(7));
        assert_eq!(trigger_offset("see /usr and /", 14), Some(13));
        assert_eq!(trigger_offset("see /usr", 8), None);
        assert_eq!(trigger_offset("see /usr", 5), Some(4));
        assert_eq!(trigger_offset("a/b", 2), None);
        assert_eq!(trigger_offset("/", 0), None);
        assert_eq!(trigger_offset("plain", 9), None);
    }

    #[test]
    fn test_execute_unknown_id() {
        let mut editor = Editor::default();
        let (trigger, _d) = PaletteTrigger::register(&editor);
        assert!(!trigger.execute(&mut editor, "missing").unwrap());
    }

    #[test]
    fn test_command_runs_after_close() {
        let mut editor = Editor::default();
        let ran = Rc::new(Cell::new(false));
        let _d = {
            let ran = Rc::clone(&ran);
            editor.palette().register(PaletteCommand::new("mark", "Mark", move |_| {
                ran.set(true);
                Ok(())
            }))
        };
        let (trigger, _t) = PaletteTrigger::register(&editor);
        assert!(trigger.execute(&mut editor, "mark").unwrap());
        assert!(ran.get());
        assert!(!trigger.is_open());
    }
}
