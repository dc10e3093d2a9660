//! # Commands
//!
//! Typed command identifiers, priorities and the built-in command set.
//!
//! A command is a name plus a payload type. Handlers registered for a
//! command run from the highest priority down; within one priority the
//! handler registered first runs first. The first handler returning `true`
//! stops the dispatch.

use quire_model::{Alignment, NodeKey, TextFormatType};
use std::fmt;
use std::marker::PhantomData;

/// A typed command identifier
pub struct Command<P> {
    name: &'static str,
    payload: PhantomData<fn(&P)>,
}

impl<P> Command<P> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<P> Clone for Command<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Command<P> {}

impl<P> fmt::Debug for Command<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.name)
    }
}

/// Handler priority, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandPriority {
    Editor = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl CommandPriority {
    pub const ALL: [CommandPriority; 5] = [
        CommandPriority::Editor,
        CommandPriority::Low,
        CommandPriority::Normal,
        CommandPriority::High,
        CommandPriority::Critical,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Undoes a registration when disposed.
///
/// Disposing twice is impossible by construction; disposing after the
/// registration is already gone does nothing.
#[must_use = "dropping a Disposer keeps the registration alive forever"]
pub struct Disposer {
    actions: Vec<Box<dyn FnOnce()>>,
}

impl Disposer {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            actions: vec![Box::new(action)],
        }
    }

    /// A disposer that does nothing
    pub fn noop() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// One disposer for several registrations
    pub fn merge(disposers: impl IntoIterator<Item = Disposer>) -> Self {
        Self {
            actions: disposers
                .into_iter()
                .flat_map(|disposer| disposer.actions)
                .collect(),
        }
    }

    pub fn dispose(self) {
        for action in self.actions {
            action();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("actions", &self.actions.len())
            .finish()
    }
}

// ----------------------------------------------------------------------
// Payloads
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSize {
    pub rows: usize,
    pub columns: usize,
}

impl Default for TableSize {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratorClick {
    pub key: NodeKey,
    /// Add to the node selection instead of replacing it
    pub extend: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub src: String,
    pub alt_text: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
}

impl ImagePayload {
    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            width: None,
            height: None,
            caption: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkEditorRequest {
    pub url: String,
    /// Where the host should place the floating editor
    pub coordinates: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLanguage {
    pub key: NodeKey,
    pub language: String,
}

// ----------------------------------------------------------------------
// Built-in commands
// ----------------------------------------------------------------------

pub const SELECTION_CHANGE: Command<()> = Command::new("SELECTION_CHANGE");
pub const FORMAT_TEXT: Command<TextFormatType> = Command::new("FORMAT_TEXT");
pub const FORMAT_ELEMENT: Command<Alignment> = Command::new("FORMAT_ELEMENT");
pub const INSERT_TEXT: Command<String> = Command::new("INSERT_TEXT");
/// `true` deletes backward
pub const DELETE_CHARACTER: Command<bool> = Command::new("DELETE_CHARACTER");
pub const KEY_BACKSPACE: Command<()> = Command::new("KEY_BACKSPACE");
pub const KEY_DELETE: Command<()> = Command::new("KEY_DELETE");
pub const CLICK_DECORATOR: Command<DecoratorClick> = Command::new("CLICK_DECORATOR");
pub const PASTE_HTML: Command<String> = Command::new("PASTE_HTML");

pub const UNDO: Command<()> = Command::new("UNDO");
pub const REDO: Command<()> = Command::new("REDO");
pub const CAN_UNDO: Command<bool> = Command::new("CAN_UNDO");
pub const CAN_REDO: Command<bool> = Command::new("CAN_REDO");

pub const INSERT_UNORDERED_LIST: Command<()> = Command::new("INSERT_UNORDERED_LIST");
pub const INSERT_ORDERED_LIST: Command<()> = Command::new("INSERT_ORDERED_LIST");
pub const REMOVE_LIST: Command<()> = Command::new("REMOVE_LIST");

/// `None` removes the link
pub const TOGGLE_LINK: Command<Option<String>> = Command::new("TOGGLE_LINK");
pub const SHOW_FLOATING_LINK_EDITOR: Command<LinkEditorRequest> =
    Command::new("SHOW_FLOATING_LINK_EDITOR");

pub const INSERT_IMAGE: Command<ImagePayload> = Command::new("INSERT_IMAGE");
pub const SHOW_INSERT_IMAGE_DIALOG: Command<()> = Command::new("SHOW_INSERT_IMAGE_DIALOG");
pub const INSERT_DIVIDER: Command<()> = Command::new("INSERT_HORIZONTAL_RULE");
/// Payload is a video id
pub const INSERT_YOUTUBE: Command<String> = Command::new("INSERT_YOUTUBE");
/// Payload is a URL; handled when an embed provider recognises it
pub const INSERT_EMBED: Command<String> = Command::new("INSERT_EMBED");
/// Payload is an embed type such as `youtube-video`
pub const SHOW_EMBED_DIALOG: Command<String> = Command::new("SHOW_EMBED_DIALOG");

pub const INSERT_TABLE: Command<TableSize> = Command::new("INSERT_TABLE");
/// `true` inserts after the current row
pub const INSERT_TABLE_ROW: Command<bool> = Command::new("INSERT_TABLE_ROW");
/// `true` inserts after the current column
pub const INSERT_TABLE_COLUMN: Command<bool> = Command::new("INSERT_TABLE_COLUMN");
pub const DELETE_TABLE_ROW: Command<()> = Command::new("DELETE_TABLE_ROW");
pub const DELETE_TABLE_COLUMN: Command<()> = Command::new("DELETE_TABLE_COLUMN");

pub const SET_CODE_LANGUAGE: Command<CodeLanguage> = Command::new("SET_CODE_LANGUAGE");
