//! # Selection State
//!
//! What the toolbar shows for the current selection: active formats,
//! alignment, text color, block kind and link state. Derived from an
//! [`EditorState`] on every update; a [`SelectionTracker`] keeps the last
//! record and only notifies subscribers when a field changed.

use crate::commands::Disposer;
use crate::editor::Editor;
use crate::range::{alignment_target, block_of, common_format, nearest_link, point_node};
use crate::state::EditorState;
use quire_model::{
    Alignment, ElementKind, HeadingLevel, ListType, Node, NodeKey, RangeSelection, Selection,
    TextFormat, Tree,
};
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;
use tracing::trace;

pub const DEFAULT_TEXT_COLOR: &str = "#000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
}

impl From<TextFormat> for FormatState {
    fn from(format: TextFormat) -> Self {
        Self {
            bold: format.contains(TextFormat::BOLD),
            italic: format.contains(TextFormat::ITALIC),
            underline: format.contains(TextFormat::UNDERLINE),
            strikethrough: format.contains(TextFormat::STRIKETHROUGH),
            code: format.contains(TextFormat::CODE),
        }
    }
}

/// Kind of the top-level block holding the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    List(ListType),
    Code,
    Quote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub format: FormatState,
    pub alignment: Alignment,
    pub text_color: String,
    pub element: Option<BlockKind>,
    pub is_link_active: bool,
    pub link_url: Option<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            format: FormatState::default(),
            alignment: Alignment::Left,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            element: None,
            is_link_active: false,
            link_url: None,
        }
    }
}

impl SelectionState {
    /// Derive the record for a state; anything but a range selection gives
    /// the default record
    pub fn derive(state: &EditorState) -> Self {
        match state.selection() {
            Some(Selection::Range(range)) => Self::from_range(state.tree(), range),
            _ => Self::default(),
        }
    }

    pub fn from_range(tree: &Tree, range: &RangeSelection) -> Self {
        let (start, _) = range.ordered(tree);
        let first = point_node(tree, &start);
        let (is_link_active, link_url) = link_state(tree, range);
        Self {
            format: common_format(tree, range).into(),
            alignment: alignment_of(tree, first),
            text_color: text_color(&range.style),
            element: block_kind(tree, first),
            is_link_active,
            link_url,
        }
    }
}

fn alignment_of(tree: &Tree, key: NodeKey) -> Alignment {
    block_of(tree, key)
        .map(|block| alignment_target(tree, block))
        .and_then(|target| tree.get(target))
        .and_then(Node::as_element)
        .map(|element| element.format)
        .unwrap_or_default()
}

/// Classify the top-level element around `key`; tables count as paragraphs
pub fn block_kind(tree: &Tree, key: NodeKey) -> Option<BlockKind> {
    let top = tree.top_level_element(key)?;
    let kind = match tree.get(top)?.element_kind()? {
        ElementKind::Heading { level } => BlockKind::Heading(*level),
        ElementKind::List { list_type, .. } => BlockKind::List(*list_type),
        ElementKind::Code { .. } => BlockKind::Code,
        ElementKind::Quote => BlockKind::Quote,
        _ => BlockKind::Paragraph,
    };
    Some(kind)
}

/// A caret is in a link when any ancestor is one; a range only when both
/// ends sit in the very same link node
fn link_state(tree: &Tree, range: &RangeSelection) -> (bool, Option<String>) {
    let anchor = nearest_link(tree, point_node(tree, &range.anchor));
    let link = if range.is_collapsed() {
        anchor
    } else {
        let focus = nearest_link(tree, point_node(tree, &range.focus));
        anchor.filter(|anchor| focus == Some(*anchor))
    };
    let url = link
        .and_then(|key| tree.get(key))
        .and_then(Node::element_kind)
        .and_then(|kind| match kind {
            ElementKind::Link(attributes) => Some(attributes.url.clone()),
            _ => None,
        });
    (link.is_some(), url)
}

fn color_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"color:\s*(#[0-9a-fA-F]{6})").ok())
        .as_ref()
}

/// `#rrggbb` color of an inline style, black when absent or malformed
pub fn text_color(style: &str) -> String {
    color_pattern()
        .and_then(|pattern| pattern.captures(style))
        .and_then(|captures| captures.get(1))
        .map(|color| color.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string())
}

type Subscriber = Box<dyn Fn(&SelectionState)>;

/// Keeps the selection record of an editor up to date
#[derive(Clone)]
pub struct SelectionTracker {
    inner: Rc<RefCell<TrackerState>>,
}

struct TrackerState {
    current: SelectionState,
    subscribers: Vec<(u64, Rc<Subscriber>)>,
    next_id: u64,
}

impl SelectionTracker {
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let tracker = Self {
            inner: Rc::new(RefCell::new(TrackerState {
                current: SelectionState::derive(editor.state()),
                subscribers: Vec::new(),
                next_id: 0,
            })),
        };
        let listener = {
            let tracker = tracker.clone();
            editor.register_update_listener(move |_, event| {
                tracker.refresh(&event.state);
            })
        };
        (tracker, listener)
    }

    pub fn current(&self) -> SelectionState {
        self.inner.borrow().current.clone()
    }

    /// Call `f` with each new record
    pub fn subscribe(&self, f: impl Fn(&SelectionState) + 'static) -> Disposer {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            let subscriber: Subscriber = Box::new(f);
            inner.subscribers.push((id, Rc::new(subscriber)));
            id
        };
        let inner = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.borrow_mut().subscribers.retain(|(sub_id, _)| *sub_id != id);
            }
        })
    }

    /// Re-derive the record; returns whether it changed
    pub fn refresh(&self, state: &EditorState) -> bool {
        let next = SelectionState::derive(state);
        let subscribers: Vec<Rc<Subscriber>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.current == next {
                return false;
            }
            inner.current = next.clone();
            inner.subscribers.iter().map(|(_, s)| Rc::clone(s)).collect()
        };
        trace!(?next, "selection state changed");
        for subscriber in subscribers {
            subscriber(&next);
        }
        true
    }
}
