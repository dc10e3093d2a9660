//! # Editor
//!
//! One editor instance: the committed state, the command bus, update
//! listeners and the palette registry. Nothing here is process-wide; two
//! editors never see each other's handlers.
//!
//! ## Commit cycle
//!
//! ```text
//! update(f) ─► Transaction (pending tree, COW) ─► f(tx)
//!                                                  │
//!   collect garbage ◄─────────────────────────────┘
//!   ensure a block under the root
//!   validate (debug builds)
//!   dirty set = keys written in the transaction
//!   swap state ─► listeners(prev, next, dirty, tags) ─► queued updates
//! ```

use crate::commands::{Command, CommandPriority, Disposer};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::palette::PaletteRegistry;
use crate::state::{EditorState, UpdateEvent};
use crate::transaction::Transaction;
use crate::url::sanitize_fragment_links;
use quire_html::{import_html, ConversionMap, RenderOptions};
use quire_model::Selection;
use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use tracing::{debug, error, instrument, trace};

type Handler = Rc<dyn Fn(&mut Editor, &dyn Any) -> bool>;
type Listener = Rc<dyn Fn(&mut Editor, &UpdateEvent)>;
type UpdateFn = Box<dyn FnOnce(&mut Transaction) -> Result<(), EditorError>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    commands: HashMap<&'static str, [Vec<(u64, Handler)>; 5]>,
    listeners: Vec<(u64, Listener)>,
}

impl Registry {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_handler(&mut self, name: &'static str, id: u64) {
        if let Some(buckets) = self.commands.get_mut(name) {
            for bucket in buckets.iter_mut() {
                bucket.retain(|(handler_id, _)| *handler_id != id);
            }
            if buckets.iter().all(Vec::is_empty) {
                self.commands.remove(name);
            }
        }
    }
}

struct PendingUpdate {
    update: UpdateFn,
    tags: Vec<String>,
}

pub struct Editor {
    state: EditorState,
    config: EditorConfig,
    registry: Rc<RefCell<Registry>>,
    palette: PaletteRegistry,
    conversions: ConversionMap,
    pending: VecDeque<PendingUpdate>,
    committing: bool,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_state(config, EditorState::default())
    }

    pub fn with_state(config: EditorConfig, state: EditorState) -> Self {
        debug!(namespace = %config.namespace, "create editor");
        Self {
            state,
            palette: PaletteRegistry::new(config.palette.max_results),
            config,
            registry: Rc::new(RefCell::new(Registry::default())),
            conversions: ConversionMap::default(),
            pending: VecDeque::new(),
            committing: false,
        }
    }

    /// Editor over a JSON snapshot, with the names of skipped unknown nodes
    pub fn from_json_str(
        config: EditorConfig,
        source: &str,
    ) -> Result<(Self, Vec<String>), EditorError> {
        let (state, skipped) = EditorState::from_json_str(source)?;
        Ok((Self::with_state(config, state), skipped))
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn palette(&self) -> &PaletteRegistry {
        &self.palette
    }

    /// HTML conversions used by paste
    pub fn conversions_mut(&mut self) -> &mut ConversionMap {
        &mut self.conversions
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Run `f` in a transaction and commit it.
    ///
    /// Called from an update listener, the update is queued and runs after
    /// the current commit has notified every listener.
    pub fn update(
        &mut self,
        f: impl FnOnce(&mut Transaction) -> Result<(), EditorError> + 'static,
    ) -> Result<(), EditorError> {
        self.update_tagged(&[], f)
    }

    pub fn update_tagged(
        &mut self,
        tags: &[&str],
        f: impl FnOnce(&mut Transaction) -> Result<(), EditorError> + 'static,
    ) -> Result<(), EditorError> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        if self.committing {
            trace!("queue update during commit");
            self.pending.push_back(PendingUpdate {
                update: Box::new(f),
                tags,
            });
            return Ok(());
        }
        self.run_update(Box::new(f), tags)
    }

    /// Run `f` in a transaction and return its result.
    ///
    /// Unlike [`Editor::update`] this cannot be deferred, so it fails while
    /// a commit is notifying listeners.
    pub fn update_with<R>(
        &mut self,
        f: impl FnOnce(&mut Transaction) -> Result<R, EditorError>,
    ) -> Result<R, EditorError> {
        if self.committing {
            return Err(EditorError::TransactionInProgress);
        }
        let mut tx = Transaction::new(&self.state);
        let result = f(&mut tx)?;
        self.commit(tx)?;
        Ok(result)
    }

    fn run_update(&mut self, update: UpdateFn, tags: Vec<String>) -> Result<(), EditorError> {
        let mut tx = Transaction::new(&self.state);
        for tag in tags {
            tx.add_tag(tag);
        }
        update(&mut tx)?;
        self.commit(tx)
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) -> Result<(), EditorError> {
        self.update(move |tx| {
            tx.set_selection(selection);
            Ok(())
        })
    }

    /// Replace the whole state, e.g. restoring a history entry
    pub fn set_editor_state(&mut self, state: EditorState, tags: &[&str]) -> Result<(), EditorError> {
        if self.committing {
            return Err(EditorError::TransactionInProgress);
        }
        let dirty = self.state.tree().diff(state.tree());
        let prev = std::mem::replace(&mut self.state, state.clone());
        self.notify(UpdateEvent {
            prev_state: prev,
            state,
            dirty,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        Ok(())
    }

    #[instrument(skip_all, fields(namespace = %self.config.namespace))]
    fn commit(&mut self, tx: Transaction) -> Result<(), EditorError> {
        let (mut tree, selection, tags) = tx.into_parts();
        tree.collect_garbage();
        tree.ensure_block()?;
        if cfg!(debug_assertions) {
            if let Err(err) = tree.validate() {
                error!(%err, "refusing to commit an invalid tree");
                return Err(EditorError::InvariantViolation(err.to_string()));
            }
        }
        let selection = selection.filter(|selection| selection.is_valid_in(&tree));
        let dirty = tree.take_dirty();

        let next = if dirty.is_empty() {
            self.state.with_selection(selection)
        } else {
            EditorState::new(tree, selection)
        };
        if dirty.is_empty() && next.selection() == self.state.selection() && tags.is_empty() {
            trace!("nothing to commit");
            return Ok(());
        }
        debug!(dirty = dirty.len(), tags = ?tags, "commit");
        let prev = std::mem::replace(&mut self.state, next.clone());
        self.notify(UpdateEvent {
            prev_state: prev,
            state: next,
            dirty,
            tags,
        });
        Ok(())
    }

    fn notify(&mut self, event: UpdateEvent) {
        let listeners: Vec<Listener> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        let was_committing = std::mem::replace(&mut self.committing, true);
        for listener in listeners {
            listener(self, &event);
        }
        self.committing = was_committing;
        if !self.committing {
            self.flush_pending();
        }
    }

    fn flush_pending(&mut self) {
        while let Some(pending) = self.pending.pop_front() {
            if let Err(err) = self.run_update(pending.update, pending.tags) {
                error!(%err, "deferred update failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Listeners and commands
    // ------------------------------------------------------------------

    pub fn register_update_listener(
        &self,
        listener: impl Fn(&mut Editor, &UpdateEvent) + 'static,
    ) -> Disposer {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.allocate();
            registry.listeners.push((id, Rc::new(listener)));
            id
        };
        let registry = Rc::downgrade(&self.registry);
        Disposer::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .borrow_mut()
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    pub fn register_command<P: 'static>(
        &self,
        command: Command<P>,
        priority: CommandPriority,
        handler: impl Fn(&mut Editor, &P) -> bool + 'static,
    ) -> Disposer {
        let name = command.name();
        let handler: Handler = Rc::new(move |editor: &mut Editor, payload: &dyn Any| {
            payload
                .downcast_ref::<P>()
                .is_some_and(|payload| handler(editor, payload))
        });
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.allocate();
            registry.commands.entry(name).or_default()[priority.index()].push((id, handler));
            id
        };
        trace!(command = name, ?priority, id, "register command");
        let registry: Weak<RefCell<Registry>> = Rc::downgrade(&self.registry);
        Disposer::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove_handler(name, id);
            }
        })
    }

    /// Run the handlers of `command`, highest priority first, until one
    /// returns `true`
    #[instrument(skip_all, fields(command = command.name()))]
    pub fn dispatch<P: 'static>(&mut self, command: Command<P>, payload: P) -> bool {
        let handlers: Vec<Handler> = {
            let registry = self.registry.borrow();
            let Some(buckets) = registry.commands.get(command.name()) else {
                trace!("no handlers");
                return false;
            };
            buckets
                .iter()
                .rev()
                .flat_map(|bucket| bucket.iter().map(|(_, handler)| Rc::clone(handler)))
                .collect()
        };
        for handler in handlers {
            if handler(self, &payload) {
                trace!("handled");
                return true;
            }
        }
        false
    }

    pub fn has_handlers<P>(&self, command: Command<P>) -> bool {
        self.registry.borrow().commands.contains_key(command.name())
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    pub fn serialize(&self) -> Value {
        self.state.to_json()
    }

    pub fn serialize_string(&self, pretty: bool) -> Result<String, EditorError> {
        self.state.to_json_string(pretty)
    }

    /// HTML of the committed state using the configured theme
    pub fn render_html(&self, options: &RenderOptions) -> Result<String, EditorError> {
        self.state.to_html(&self.config.theme, options)
    }

    /// Import clipboard HTML and insert its blocks at the selection; link
    /// URLs outside the allowed protocols become `about:blank`
    pub fn paste_html(&mut self, html: &str) -> Result<bool, EditorError> {
        let mut fragment = import_html(html, &self.conversions);
        if fragment.children.is_empty() {
            return Ok(false);
        }
        sanitize_fragment_links(&mut fragment, &self.config.links.allowed_protocols);
        let blocks = fragment.children;
        self.update_with(move |tx| Ok(!tx.insert_fragments(&blocks)?.is_empty()))
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
