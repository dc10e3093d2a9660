//! # Quire Editor
//!
//! Editing engine for Quire documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: node tree, selection, JSON snapshots │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: state lifecycle + command bus       │
//! │  - Transactions over copy-on-write trees    │
//! │  - Update listeners with dirty sets         │
//! │  - Priority-bucketed commands               │
//! │  - History, selection record, palette       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ html: export, render, import                │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **States are immutable**: every change goes through a transaction and
//!    produces a new [`EditorState`]
//! 2. **One command bus**: built-ins and plugins register the same way
//! 3. **Disposers undo registrations**: every `register*` call returns one
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_editor::{commands::FORMAT_TEXT, Editor, EditorConfig, History};
//! use quire_model::TextFormatType;
//!
//! let mut editor = Editor::new(EditorConfig::default());
//! let _rich_text = quire_editor::register_rich_text(&editor);
//! let (_history, _h) = History::register(&editor);
//!
//! editor.update(|tx| {
//!     tx.select_start(tx.tree().root())?;
//!     tx.insert_text("Hello")?;
//!     Ok(())
//! })?;
//! editor.dispatch(FORMAT_TEXT, TextFormatType::Bold);
//!
//! let html = editor.render_html(&Default::default())?;
//! ```

mod builtins;
mod config;
mod editor;
mod errors;
mod history;
mod range;
mod selection_state;
mod state;
mod transaction;

pub mod commands;
pub mod decorators;
pub mod image_cache;
pub mod palette;
pub mod plugins;
pub mod tools;
pub mod url;

pub use builtins::{register_list, register_rich_text};
pub use commands::{Command, CommandPriority, Disposer};
pub use config::{
    EditorConfig, HistoryConfig, ImageConfig, LinkConfig, PaletteConfig, DEFAULT_CONFIG_NAME,
};
pub use editor::Editor;
pub use errors::EditorError;
pub use history::{History, HistoryStack, HISTORIC_TAG, HISTORY_MERGE_TAG};
pub use range::{common_format, covered_texts, nearest_link, selected_blocks, text_len};
pub use selection_state::{
    block_kind, text_color, BlockKind, FormatState, SelectionState, SelectionTracker,
    DEFAULT_TEXT_COLOR,
};
pub use state::{EditorState, UpdateEvent};
pub use transaction::{patch_style, Transaction};

// Re-export common types for convenience
pub use quire_html::{HtmlTheme, RenderOptions};
pub use quire_model::{NodeKey, Selection, Tree};
