//! The runtime: one explicit context owning the document, the widget tree,
//! the reconciler, layout, routing and the render pipeline.
//!
//! The methods under "DOM contract" are what compiled component code calls.
//! Each mutates the [`Document`] synchronously and queues the matching
//! widget operation; in [`FlushMode::Eager`] the operation is applied before
//! the call returns. Repaints are requested, not performed: they happen on
//! the next [`Runtime::run_tick`], at most once per tick.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::DomError;
use crate::event::{
    BindingAction, DomEvent, EventKind, EventTable, FocusChange, FocusContext, InputEvent, InputParser, Key,
    KeyBindingRegistry, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent, MouseRouter,
};
use crate::geometry::Region;
use crate::layout::{widget_region, LayoutBridge};
use crate::reconciler::{element_props, FlushMode, FlushReport, PendingOperation, QueueOutcome, Reconciler};
use crate::render::{paint_tree, Compositor, Driver};
use crate::scheduler::{RenderScheduler, TickQueue};
use crate::widget::{adapter, controls, KindState, PropBag, TerminalElement, Theme, Widget, WidgetId, WidgetKind, WidgetTree};

/// Tick cap for [`Runtime::run_until_idle`], so self-rescheduling work
/// cannot spin forever.
const MAX_IDLE_TICKS: usize = 1_000;

// ---------------------------------------------------------------------------
// RuntimeOptions
// ---------------------------------------------------------------------------

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub flush_mode: FlushMode,
    pub theme: Theme,
    /// Viewport columns.
    pub width: u16,
    /// Viewport rows.
    pub height: u16,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            flush_mode: FlushMode::Eager,
            theme: Theme::default(),
            width: 80,
            height: 24,
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Deferred work run by [`Runtime::run_tick`].
enum Task {
    Flush,
    Render,
    Call(Box<dyn FnOnce(&mut Runtime)>),
}

pub struct Runtime {
    document: Document,
    widgets: WidgetTree,
    reconciler: Reconciler,
    layout: LayoutBridge,
    router: MouseRouter,
    focus: FocusContext,
    listeners: EventTable,
    bindings: KeyBindingRegistry,
    parser: InputParser,
    scheduler: RenderScheduler,
    tasks: TickQueue<Task>,
    /// Last painted frame.
    frame: Compositor,
    driver: Option<Driver>,
    root: NodeId,
    width: u16,
    height: u16,
    frames: u64,
    /// Layout or hit targets may have changed since the last geometry pass.
    geometry_dirty: bool,
    /// The next frame is written in full.
    full_repaint: bool,
    quit: bool,
    actions: Vec<String>,
}

impl Runtime {
    /// A runtime with an empty root `box` that fills the viewport.
    pub fn new(options: RuntimeOptions) -> Self {
        let mut document = Document::new();
        let mut widgets = WidgetTree::new();
        let mut reconciler = Reconciler::new(options.flush_mode, options.theme);
        let root = document.create_element("box");
        document.set_root(root);
        reconciler.queue_operation(PendingOperation::Create { node: root });
        reconciler.force_flush(&mut document, &mut widgets);

        Self {
            document,
            widgets,
            reconciler,
            layout: LayoutBridge::new(),
            router: MouseRouter::new(options.width, options.height),
            focus: FocusContext::new(),
            listeners: EventTable::new(),
            bindings: KeyBindingRegistry::with_defaults(),
            parser: InputParser::new(),
            scheduler: RenderScheduler::new(),
            tasks: TickQueue::new(),
            frame: Compositor::new(options.width, options.height),
            driver: None,
            root,
            width: options.width,
            height: options.height,
            frames: 0,
            geometry_dirty: true,
            full_repaint: true,
            quit: false,
            actions: Vec::new(),
        }
    }

    /// Headless runtime of the given size with default options.
    pub fn headless(width: u16, height: u16) -> Self {
        Self::new(RuntimeOptions::new().with_size(width, height))
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The screen element everything is mounted under.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn widgets(&self) -> &WidgetTree {
        &self.widgets
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn router(&self) -> &MouseRouter {
        &self.router
    }

    pub fn focus_context(&self) -> &FocusContext {
        &self.focus
    }

    pub fn listeners(&self) -> &EventTable {
        &self.listeners
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindingRegistry {
        &mut self.bindings
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The materialized widget of `node`, if it has one.
    pub fn widget(&self, node: NodeId) -> Option<&TerminalElement> {
        self.widget_id(node).and_then(|id| self.widgets.get(id))
    }

    /// Absolute geometry of `node` from the last layout pass.
    pub fn region(&self, node: NodeId) -> Option<Region> {
        self.widget_id(node).and_then(|id| widget_region(&self.widgets, id))
    }

    /// The last painted frame.
    pub fn frame(&self) -> &Compositor {
        &self.frame
    }

    /// Physical repaints so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn set_flush_mode(&mut self, mode: FlushMode) {
        self.reconciler.set_mode(mode);
    }

    /// Install a terminal driver; the next frame is written in full.
    pub fn attach_driver(&mut self, driver: Driver) {
        self.driver = Some(driver);
        self.full_repaint = true;
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Write the whole next frame instead of a diff.
    pub fn force_full_repaint(&mut self) {
        self.full_repaint = true;
        self.request_render();
    }

    pub fn driver_mut(&mut self) -> Option<&mut Driver> {
        self.driver.as_mut()
    }

    fn widget_id(&self, node: NodeId) -> Option<WidgetId> {
        self.document
            .element(node)
            .and_then(|e| e.widget)
            .filter(|&id| self.widgets.contains(id))
    }

    fn root_widget(&self) -> Option<WidgetId> {
        self.widget_id(self.root)
    }

    // ── DOM contract ─────────────────────────────────────────────────

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.document.create_element(tag);
        self.enqueue(PendingOperation::Create { node });
        node
    }

    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.document.create_text_node(text)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.document.create_comment(text)
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.document.create_document_fragment()
    }

    /// Insert `node` into `parent` before `anchor`, or append when `anchor`
    /// is `None`. A node with another parent is moved.
    pub fn insert_node(&mut self, parent: NodeId, node: NodeId, anchor: Option<NodeId>) -> Result<NodeId, DomError> {
        let previous = self
            .document
            .parent(node)
            .filter(|&p| p != parent && self.document.element(p).is_some() && self.is_text(node))
            .map(|p| (p, element_props(&self.document, p)));

        let inserted = self.document.insert_before(parent, node, anchor)?;

        if let Some((old_parent, old)) = previous {
            self.enqueue_update(old_parent, old);
        }
        for child in inserted {
            let op = match anchor {
                None => PendingOperation::Append { parent, child },
                Some(before) => PendingOperation::Insert { parent, child, before: Some(before) },
            };
            self.enqueue(op);
        }
        Ok(node)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.insert_node(parent, child, None)
    }

    /// Detach `child` from `parent`. Unless it is reattached before the next
    /// flush, that flush tears down the widgets of its subtree and drops their
    /// focus registration. The node stays valid and can be inserted again; use
    /// [`Runtime::dispose`] to free it. A `child` that is not a child of
    /// `parent` is logged and ignored (`Ok(false)`).
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, DomError> {
        if !self.document.remove_child(parent, child)? {
            warn!(parent = ?parent, child = ?child, "removeChild: node is not a child of parent");
            return Ok(false);
        }
        self.enqueue(PendingOperation::Delete { node: child, parent });
        Ok(true)
    }

    /// Put `new` in place of `old` under `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<NodeId, DomError> {
        let inserted = self.document.replace_child(parent, new, old)?;
        if inserted == [new] {
            self.enqueue(PendingOperation::Replace { parent, old, new });
        } else if new != old {
            self.enqueue(PendingOperation::Delete { node: old, parent });
            for child in inserted.into_iter().rev() {
                let before = self.document.next_sibling(child);
                self.enqueue(PendingOperation::Insert { parent, child, before });
            }
        }
        Ok(old)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let old = element_props(&self.document, node);
        self.document.set_attribute(node, name, value)?;
        self.enqueue_update(node, old);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let old = element_props(&self.document, node);
        if self.document.remove_attribute(node, name)?.is_some() {
            self.enqueue_update(node, old);
        }
        Ok(())
    }

    /// Set the value of a text or comment node. On an element this sets its
    /// `content` attribute instead.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        if self.document.element(node).is_some() {
            return self.set_attribute(node, "content", text);
        }
        let parent = self.document.parent(node).filter(|&p| self.document.element(p).is_some());
        let old = parent.map(|p| element_props(&self.document, p));
        self.document.set_text(node, text)?;
        if let (Some(parent), Some(old)) = (parent, old) {
            if self.is_text(node) {
                self.enqueue_update(parent, old);
            }
        }
        Ok(())
    }

    /// Install `handler` for `event` on `node`, replacing any previous one.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: impl Fn(&mut Runtime, &DomEvent) + 'static,
    ) -> Result<(), DomError> {
        if !self.document.contains(node) {
            return Err(DomError::UnknownNode { op: "addEventListener", node });
        }
        let kind = EventKind::from_name(event);
        trace!(node = ?node, event = %kind, "listener added");
        self.listeners.add(node, kind, Rc::new(handler));
        self.geometry_dirty = true;
        Ok(())
    }

    pub fn remove_event_listener(&mut self, node: NodeId, event: &str) -> bool {
        let removed = self.listeners.remove(node, &EventKind::from_name(event));
        if removed {
            self.geometry_dirty = true;
        }
        removed
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.document.get(node), Some(NodeKind::Text(_)))
    }

    fn enqueue_update(&mut self, node: NodeId, old: PropBag) {
        let new = element_props(&self.document, node);
        if old != new {
            self.enqueue(PendingOperation::Update { node, old, new });
        }
    }

    fn enqueue(&mut self, op: PendingOperation) {
        match self.reconciler.queue_operation(op) {
            QueueOutcome::FlushNow => {
                self.flush();
            }
            QueueOutcome::Schedule => self.tasks.push(Task::Flush),
            QueueOutcome::AlreadyScheduled | QueueOutcome::Dropped => {}
        }
        self.geometry_dirty = true;
        self.request_render();
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Apply every queued operation now and clean up after unmounted nodes.
    pub fn flush(&mut self) -> FlushReport {
        let report = self.reconciler.force_flush(&mut self.document, &mut self.widgets);
        for &node in &report.unmounted {
            self.router.forget(node);
            if let Some(change) = self.focus.unregister(node) {
                self.apply_focus_change(change);
            }
        }
        if report.applied + report.failed > 0 {
            self.sync_focus();
        }
        report
    }

    /// Free `node` and its subtree from the document, detaching it first if
    /// needed. Listeners and focus entries go with it. Returns the number of
    /// freed nodes; the root is never disposed.
    pub fn dispose(&mut self, node: NodeId) -> Result<usize, DomError> {
        if !self.document.contains(node) {
            return Err(DomError::UnknownNode { op: "dispose", node });
        }
        if node == self.root {
            warn!(node = ?node, "dispose: the root cannot be disposed");
            return Ok(0);
        }
        if let Some(parent) = self.document.parent(node) {
            self.remove_child(parent, node)?;
        }
        self.flush();
        let freed = self.document.destroy(node);
        for (id, kind) in &freed {
            if let NodeKind::Element(data) = kind {
                if let Some(widget) = data.widget {
                    self.widgets.destroy(widget);
                }
            }
            self.listeners.remove_all(*id);
            self.router.forget(*id);
            if let Some(change) = self.focus.unregister(*id) {
                self.apply_focus_change(change);
            }
        }
        debug!(node = ?node, freed = freed.len(), "disposed");
        self.geometry_dirty = true;
        Ok(freed.len())
    }

    /// Discard queued operations and refuse new ones. Returns how many were
    /// discarded.
    pub fn stop(&mut self) -> usize {
        self.reconciler.stop()
    }

    pub fn start(&mut self) {
        self.reconciler.start();
    }

    /// Register every focusable widget in tree order and drop focus from a
    /// node that can no longer hold it.
    fn sync_focus(&mut self) {
        let Some(root) = self.root_widget() else {
            return;
        };
        for id in self.widgets.walk(root) {
            let Some((node, focusable, tab_index)) = self
                .widgets
                .get(id)
                .map(|e| (e.node, e.widget.common.focusable, e.widget.common.tab_index))
            else {
                continue;
            };
            if focusable {
                self.focus.register(node, tab_index);
            } else if let Some(change) = self.focus.unregister(node) {
                self.apply_focus_change(change);
            }
        }
        let (document, widgets) = (&self.document, &self.widgets);
        if let Some(change) = self.focus.validate(|node| can_focus(document, widgets, node)) {
            self.apply_focus_change(change);
        }
    }

    // ── Focus ────────────────────────────────────────────────────────

    pub fn focused(&self) -> Option<NodeId> {
        self.focus.focused()
    }

    /// Whether `node` is focusable, enabled and shown.
    pub fn can_focus(&self, node: NodeId) -> bool {
        can_focus(&self.document, &self.widgets, node)
    }

    /// Focus `node`. Returns `false` when it cannot take focus.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.can_focus(node) {
            return false;
        }
        if let Some(change) = self.focus.focus(node) {
            self.apply_focus_change(change);
        }
        true
    }

    pub fn blur(&mut self) {
        if let Some(change) = self.focus.blur() {
            self.apply_focus_change(change);
        }
    }

    pub fn focus_next(&mut self) -> Option<NodeId> {
        let (document, widgets) = (&self.document, &self.widgets);
        let next = self.focus.next_focusable(|node| can_focus(document, widgets, node))?;
        self.focus(next);
        Some(next)
    }

    pub fn focus_previous(&mut self) -> Option<NodeId> {
        let (document, widgets) = (&self.document, &self.widgets);
        let previous = self.focus.previous_focusable(|node| can_focus(document, widgets, node))?;
        self.focus(previous);
        Some(previous)
    }

    /// Restyle both widgets, then fire `blur` and `focus` in that order.
    fn apply_focus_change(&mut self, change: FocusChange) {
        debug!(blurred = ?change.blurred, focused = ?change.focused, "focus changed");
        if let Some(node) = change.blurred {
            self.set_widget_focused(node, false);
        }
        if let Some(node) = change.focused {
            self.set_widget_focused(node, true);
        }
        if let Some(node) = change.blurred {
            self.deliver(DomEvent::new(EventKind::Blur, node));
        }
        if let Some(node) = change.focused {
            self.deliver(DomEvent::new(EventKind::Focus, node));
        }
        self.geometry_dirty = true;
        self.request_render();
    }

    fn set_widget_focused(&mut self, node: NodeId, focused: bool) {
        let Some(id) = self.widget_id(node) else {
            return;
        };
        let theme = self.reconciler.theme();
        if let Some(element) = self.widgets.get_mut(id) {
            adapter::set_focused(&mut element.widget, focused, theme);
        }
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Fire a named event on `node`. Returns whether a listener ran.
    pub fn emit(&mut self, node: NodeId, event: &str, value: Option<String>) -> bool {
        let mut dom_event = DomEvent::new(EventKind::from_name(event), node);
        dom_event.value = value;
        self.deliver(dom_event)
    }

    /// Run the listener for the event on its target, or for a bubbling event
    /// on the nearest ancestor that has one.
    fn deliver(&mut self, mut event: DomEvent) -> bool {
        let mut current = Some(event.target).filter(|&n| self.document.contains(n));
        while let Some(node) = current {
            if let Some(handler) = self.listeners.get(node, &event.kind) {
                event.current_target = node;
                trace!(event = %event.kind, target = ?event.target, current = ?node, "dispatching");
                handler(self, &event);
                return true;
            }
            if !event.kind.bubbles() {
                break;
            }
            current = self.document.parent(node);
        }
        false
    }

    /// Feed raw terminal bytes (the SGR mouse path).
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        for event in self.parser.feed(bytes) {
            self.handle_input(event);
        }
    }

    /// Resolve a lone buffered ESC once no more bytes are coming.
    pub fn flush_input(&mut self) {
        for event in self.parser.flush_pending() {
            self.handle_input(event);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Resize { width, height } => self.resize(width, height),
            InputEvent::Paste(text) => {
                for ch in text.chars() {
                    self.input_key(KeyEvent::new(Key::Char(ch), Modifiers::NONE));
                }
            }
            InputEvent::FocusGained | InputEvent::FocusLost => {}
        }
    }

    /// Key bindings first; otherwise `keypress` on the focused node and its
    /// built-in interaction.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(action) = self.bindings.resolve(&key).cloned() {
            trace!(?action, "binding matched");
            match action {
                BindingAction::Quit => self.quit = true,
                BindingAction::FocusNext => {
                    self.focus_next();
                }
                BindingAction::FocusPrevious => {
                    self.focus_previous();
                }
                BindingAction::Custom(name) => self.actions.push(name),
            }
            return;
        }
        self.input_key(key);
    }

    fn input_key(&mut self, key: KeyEvent) {
        let Some(target) = self.focus.focused() else {
            return;
        };
        self.deliver(DomEvent::new(EventKind::KeyPress, target).with_key(key));
        if self.document.contains(target) {
            self.key_interaction(target, key);
        }
    }

    /// Route one mouse event against the current geometry.
    pub fn handle_mouse(&mut self, event: MouseEvent) {
        self.flush();
        self.refresh_geometry();
        for dispatch in self.router.dispatch(event) {
            let target = dispatch.target;
            if !self.document.contains(target) {
                continue;
            }
            if dispatch.kind == EventKind::MouseDown && self.can_focus(target) {
                self.focus(target);
            }
            let kind = dispatch.kind.clone();
            self.deliver(DomEvent::new(dispatch.kind, target).with_mouse(dispatch.event));
            if !self.document.contains(target) {
                continue;
            }
            match kind {
                EventKind::Click if dispatch.event.button == MouseButton::Left => self.click_interaction(target, dispatch.event),
                EventKind::Wheel => {
                    let delta = if dispatch.event.action == MouseAction::WheelUp { -1 } else { 1 };
                    self.move_selection(target, delta);
                }
                _ => {}
            }
        }
    }

    /// Custom binding actions fired since the last call.
    pub fn take_actions(&mut self) -> Vec<String> {
        std::mem::take(&mut self.actions)
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    // ── Built-in interactions ────────────────────────────────────────

    fn kind_of(&self, node: NodeId) -> Option<WidgetKind> {
        self.widget(node).filter(|e| !e.widget.common.disabled).map(|e| e.widget.kind)
    }

    fn key_interaction(&mut self, node: NodeId, key: KeyEvent) {
        let Some(kind) = self.kind_of(node) else {
            return;
        };
        let activate = matches!(key.code, Key::Enter | Key::Char(' ')) && key.modifiers.is_empty();
        match (kind, key.code) {
            (WidgetKind::Checkbox, _) if activate => self.toggle_checkbox(node),
            (WidgetKind::Button, _) if activate => {
                self.deliver(DomEvent::new(EventKind::Click, node).with_key(key));
            }
            (WidgetKind::Select, Key::Enter) => self.toggle_select(node),
            (WidgetKind::Select | WidgetKind::List, Key::Up) => self.move_selection(node, -1),
            (WidgetKind::Select | WidgetKind::List, Key::Down) => self.move_selection(node, 1),
            (WidgetKind::Input, Key::Backspace) => self.edit_input(node, None),
            (WidgetKind::Input, Key::Char(ch))
                if !key.modifiers.contains(Modifiers::CTRL) && !key.modifiers.contains(Modifiers::ALT) =>
            {
                self.edit_input(node, Some(ch))
            }
            _ => {}
        }
    }

    fn click_interaction(&mut self, node: NodeId, mouse: MouseEvent) {
        let Some(kind) = self.kind_of(node) else {
            return;
        };
        match kind {
            WidgetKind::Checkbox => self.toggle_checkbox(node),
            WidgetKind::Select => {
                let open = self
                    .widget(node)
                    .is_some_and(|e| matches!(e.widget.state, KindState::Select { open: true, .. }));
                if open {
                    if let Some(row) = self.content_row(node, mouse.y) {
                        self.select_row(node, row, EventKind::Change);
                    }
                }
                self.toggle_select(node);
            }
            WidgetKind::List => {
                if let Some(row) = self.content_row(node, mouse.y) {
                    self.select_row(node, row, EventKind::Select);
                }
            }
            _ => {}
        }
    }

    /// Row of screen line `y` inside the content box of `node`.
    fn content_row(&self, node: NodeId, y: u16) -> Option<usize> {
        let common = &self.widget(node)?.widget.common;
        let row = y as i32 - (common.top + common.inset.top);
        (row >= 0).then_some(row as usize)
    }

    fn with_widget<R>(&mut self, node: NodeId, f: impl FnOnce(&mut Widget) -> Option<R>) -> Option<R> {
        let id = self.widget_id(node)?;
        f(&mut self.widgets.get_mut(id)?.widget)
    }

    fn toggle_checkbox(&mut self, node: NodeId) {
        let was_indeterminate = self
            .document
            .element(node)
            .and_then(|e| e.attribute("indeterminate"))
            .is_some();
        let Some(checked) = self.with_widget(node, controls::toggle_checkbox) else {
            return;
        };
        if was_indeterminate {
            self.commit(node, "indeterminate", "false".into());
        }
        self.commit(node, "checked", checked.to_string());
        self.fire_value(node, EventKind::Change);
    }

    fn toggle_select(&mut self, node: NodeId) {
        if let Some(open) = self.with_widget(node, controls::toggle_open) {
            self.commit(node, "open", open.to_string());
        }
    }

    fn move_selection(&mut self, node: NodeId, delta: i32) {
        let event = match self.kind_of(node) {
            Some(WidgetKind::Select) => EventKind::Change,
            Some(WidgetKind::List) => EventKind::Select,
            _ => return,
        };
        if let Some(index) = self.with_widget(node, |w| controls::move_selection(w, delta)) {
            self.commit(node, "selected", index.to_string());
            self.fire_value(node, event);
        }
    }

    fn select_row(&mut self, node: NodeId, row: usize, event: EventKind) {
        if let Some(index) = self.with_widget(node, |w| controls::select_index(w, row)) {
            self.commit(node, "selected", index.to_string());
            self.fire_value(node, event);
        }
    }

    fn edit_input(&mut self, node: NodeId, ch: Option<char>) {
        if let Some(value) = self.with_widget(node, |w| controls::edit_input(w, ch)) {
            self.commit(node, "value", value);
            self.fire_value(node, EventKind::Input);
        }
    }

    fn fire_value(&mut self, node: NodeId, kind: EventKind) {
        let value = self.widget(node).map(|e| controls::current_value(&e.widget)).unwrap_or_default();
        self.deliver(DomEvent::new(kind, node).with_value(value));
    }

    /// Record a value an interaction already applied to the widget, in both
    /// the DOM and the applied props, so later diffs do not undo it.
    fn commit(&mut self, node: NodeId, key: &str, value: String) {
        if let Err(err) = self.document.set_attribute(node, key, value.clone()) {
            warn!(node = ?node, error = %err, "interaction state not recorded");
            return;
        }
        if let Some(id) = self.widget_id(node) {
            if let Some(element) = self.widgets.get_mut(id) {
                element.props.insert(key.to_owned(), value);
            }
        }
        self.geometry_dirty = true;
        self.request_render();
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Ask for a repaint on the next tick. Any number of requests before
    /// that tick produce one repaint.
    pub fn request_render(&mut self) {
        if self.scheduler.request_render() {
            self.tasks.push(Task::Render);
        }
    }

    pub fn pause_rendering(&mut self) {
        self.scheduler.pause();
    }

    pub fn resume_rendering(&mut self) {
        if self.scheduler.resume() {
            self.tasks.push(Task::Render);
        }
    }

    /// Repaint now, bypassing coalescing.
    pub fn render_immediate(&mut self) {
        self.scheduler.render_immediate();
        self.render_frame();
    }

    /// Run `f` on the next tick.
    pub fn next_tick(&mut self, f: impl FnOnce(&mut Runtime) + 'static) {
        self.tasks.push(Task::Call(Box::new(f)));
    }

    /// Run the tasks due this tick. Returns how many ran.
    pub fn run_tick(&mut self) -> usize {
        let due = self.tasks.begin_tick();
        let count = due.len();
        for task in due {
            match task {
                Task::Flush => {
                    if self.reconciler.is_scheduled() {
                        self.flush();
                    }
                }
                Task::Render => {
                    if self.scheduler.take_due() {
                        self.render_frame();
                    }
                }
                Task::Call(f) => f(self),
            }
        }
        count
    }

    /// Run ticks until no task is left. Returns the number of ticks run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        while !self.tasks.is_empty() {
            if ticks == MAX_IDLE_TICKS {
                warn!(pending = self.tasks.len(), "tasks still pending after {MAX_IDLE_TICKS} ticks");
                break;
            }
            self.run_tick();
            ticks += 1;
        }
        ticks
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    // ── Geometry and paint ───────────────────────────────────────────

    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        debug!(width, height, "viewport resized");
        self.width = width;
        self.height = height;
        self.router.resize(width, height);
        self.geometry_dirty = true;
        self.full_repaint = true;
        self.request_render();
    }

    /// Flush and lay out so geometry reflects every mutation so far.
    pub fn layout_now(&mut self) {
        self.flush();
        self.geometry_dirty = true;
        self.refresh_geometry();
    }

    fn refresh_geometry(&mut self) {
        if !self.geometry_dirty {
            return;
        }
        let Some(root) = self.root_widget() else {
            return;
        };
        self.layout
            .apply_layout(&self.document, &mut self.widgets, root, self.width as i32, self.height as i32);
        self.rebuild_hit_grid(root);
        self.geometry_dirty = false;
    }

    /// Interactive nodes in paint order: any pointer listener, focusable, or
    /// an interactive kind.
    fn rebuild_hit_grid(&mut self, root: WidgetId) {
        let mut targets = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(element) = self.widgets.get(id) else {
                continue;
            };
            let widget = &element.widget;
            if !widget.is_displayed() || widget.common.style.is_invisible() {
                continue;
            }
            let interactive = self.listeners.has_pointer_listener(element.node)
                || widget.common.focusable
                || widget.kind.interactive_by_default();
            if interactive {
                if let Some(region) = widget_region(&self.widgets, id) {
                    targets.push((element.node, region));
                }
            }
            stack.extend(element.children.iter().rev().copied());
        }
        self.router.rebuild(targets);
    }

    /// Flush, lay out, paint a fresh frame and write the difference.
    fn render_frame(&mut self) {
        self.flush();
        self.refresh_geometry();
        let mut frame = Compositor::new(self.width, self.height);
        if let Some(root) = self.root_widget() {
            paint_tree(&self.widgets, root, &mut frame);
        }
        let updates = if self.full_repaint { frame.full() } else { frame.diff(&self.frame) };
        if let Some(driver) = self.driver.as_mut() {
            if let Err(err) = driver.apply_updates(&updates) {
                warn!(error = %err, "terminal write failed");
            }
        }
        trace!(cells = updates.len(), frame = self.frames + 1, "frame rendered");
        self.frame = frame;
        self.frames += 1;
        self.full_repaint = false;
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeOptions::default())
    }
}

/// A node is shown when every widget from it up to the root widget is
/// displayed and visible.
fn is_shown(document: &Document, widgets: &WidgetTree, node: NodeId) -> bool {
    let Some(root) = document.root().and_then(|r| document.element(r)).and_then(|e| e.widget) else {
        return false;
    };
    let mut current = document.element(node).and_then(|e| e.widget);
    while let Some(id) = current {
        let Some(element) = widgets.get(id) else {
            return false;
        };
        if !element.widget.is_displayed() || element.widget.common.style.is_invisible() {
            return false;
        }
        if id == root {
            return true;
        }
        current = element.parent;
    }
    false
}

fn can_focus(document: &Document, widgets: &WidgetTree, node: NodeId) -> bool {
    document
        .element(node)
        .and_then(|e| e.widget)
        .and_then(|id| widgets.get(id))
        .is_some_and(|e| e.widget.can_focus())
        && is_shown(document, widgets, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn runtime() -> Runtime {
        Runtime::headless(20, 5)
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&mut Runtime, &DomEvent) + Clone) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let handler = move |_: &mut Runtime, e: &DomEvent| {
            sink.borrow_mut().push(format!("{}:{}", e.kind, e.value.clone().unwrap_or_default()));
        };
        (log, handler)
    }

    // ── Contract ─────────────────────────────────────────────────────

    #[test]
    fn eager_mutations_apply_before_returning() {
        let mut rt = runtime();
        let el = rt.create_element("text");
        rt.append_child(rt.root(), el).unwrap();
        rt.set_attribute(el, "content", "hi").unwrap();
        let widget = rt.widget(el).unwrap();
        assert_eq!(widget.widget.common.content, "hi");
        assert_eq!(rt.reconciler().pending(), 0);
    }

    #[test]
    fn batched_mutations_wait_for_the_tick() {
        let mut rt = Runtime::new(RuntimeOptions::new().with_flush_mode(FlushMode::Batched));
        let el = rt.create_element("box");
        rt.append_child(rt.root(), el).unwrap();
        assert!(rt.widget(el).is_none());
        rt.run_tick();
        assert!(rt.widget(el).is_some());
    }

    #[test]
    fn removing_a_non_child_is_soft() {
        let mut rt = runtime();
        let a = rt.create_element("box");
        assert_eq!(rt.remove_child(rt.root(), a), Ok(false));
    }

    #[test]
    fn set_text_refolds_parent_content() {
        let mut rt = runtime();
        let el = rt.create_element("text");
        let t = rt.create_text_node("one");
        rt.append_child(el, t).unwrap();
        rt.append_child(rt.root(), el).unwrap();
        rt.set_text(t, "two").unwrap();
        assert_eq!(rt.widget(el).unwrap().widget.common.content, "two");
    }

    #[test]
    fn moving_text_refolds_old_parent() {
        let mut rt = runtime();
        let a = rt.create_element("text");
        let b = rt.create_element("text");
        rt.append_child(rt.root(), a).unwrap();
        rt.append_child(rt.root(), b).unwrap();
        let t = rt.create_text_node("x");
        rt.append_child(a, t).unwrap();
        rt.append_child(b, t).unwrap();
        assert_eq!(rt.widget(a).unwrap().widget.common.content, "");
        assert_eq!(rt.widget(b).unwrap().widget.common.content, "x");
    }

    #[test]
    fn removed_node_can_be_appended_again() {
        let mut rt = runtime();
        let a = rt.create_element("text");
        rt.set_attribute(a, "content", "again").unwrap();
        rt.append_child(rt.root(), a).unwrap();
        assert!(rt.remove_child(rt.root(), a).unwrap());
        assert!(rt.widget(a).is_none());
        assert!(rt.document().contains(a));

        assert_eq!(rt.append_child(rt.root(), a), Ok(a));
        assert_eq!(rt.widget(a).unwrap().widget.common.content, "again");
        let root_widget = rt.widget(rt.root()).unwrap();
        assert_eq!(root_widget.children.len(), 1);
    }

    #[test]
    fn removed_node_can_be_inserted_elsewhere() {
        let mut rt = runtime();
        let holder = rt.create_element("box");
        let a = rt.create_element("button");
        rt.append_child(rt.root(), holder).unwrap();
        rt.append_child(rt.root(), a).unwrap();
        rt.remove_child(rt.root(), a).unwrap();
        rt.insert_node(holder, a, None).unwrap();
        assert!(rt.widget(a).is_some());
        assert!(rt.focus_context().is_registered(a));
    }

    #[test]
    fn listener_on_unknown_node_fails_fast() {
        let mut rt = runtime();
        let el = rt.create_element("box");
        rt.append_child(rt.root(), el).unwrap();
        assert_eq!(rt.dispose(el), Ok(1));
        let err = rt.add_event_listener(el, "click", |_, _| {}).unwrap_err();
        assert_eq!(err, DomError::UnknownNode { op: "addEventListener", node: el });
    }

    #[test]
    fn removed_listener_no_longer_runs() {
        let mut rt = runtime();
        let el = rt.create_element("box");
        rt.append_child(rt.root(), el).unwrap();
        let (log, handler) = recorder();
        rt.add_event_listener(el, "onCustom", handler).unwrap();
        assert!(rt.emit(el, "onCustom", Some("1".into())));
        assert!(rt.remove_event_listener(el, "onCustom"));
        assert!(!rt.emit(el, "onCustom", None));
        assert_eq!(*log.borrow(), vec!["onCustom:1".to_string()]);
    }

    // ── Rendering ────────────────────────────────────────────────────

    #[test]
    fn many_mutations_one_repaint_per_tick() {
        let mut rt = runtime();
        for i in 0..5 {
            let el = rt.create_element("text");
            rt.append_child(rt.root(), el).unwrap();
            rt.set_attribute(el, "content", &i.to_string()).unwrap();
        }
        rt.run_until_idle();
        assert_eq!(rt.frames_rendered(), 1);
    }

    #[test]
    fn paused_rendering_resumes_with_pending_request() {
        let mut rt = runtime();
        rt.pause_rendering();
        let el = rt.create_element("box");
        rt.append_child(rt.root(), el).unwrap();
        rt.run_until_idle();
        assert_eq!(rt.frames_rendered(), 0);
        rt.resume_rendering();
        rt.run_until_idle();
        assert_eq!(rt.frames_rendered(), 1);
    }

    #[test]
    fn next_tick_runs_later() {
        let mut rt = runtime();
        let (log, _) = recorder();
        let sink = Rc::clone(&log);
        rt.next_tick(move |_| sink.borrow_mut().push("ran".into()));
        assert!(log.borrow().is_empty());
        rt.run_tick();
        assert_eq!(*log.borrow(), vec!["ran".to_string()]);
    }

    // ── Focus ────────────────────────────────────────────────────────

    #[test]
    fn tab_cycles_focusable_widgets() {
        let mut rt = runtime();
        let a = rt.create_element("button");
        let b = rt.create_element("input");
        rt.append_child(rt.root(), a).unwrap();
        rt.append_child(rt.root(), b).unwrap();
        rt.handle_key(KeyEvent::new(Key::Tab, Modifiers::NONE));
        assert_eq!(rt.focused(), Some(a));
        rt.handle_key(KeyEvent::new(Key::Tab, Modifiers::NONE));
        assert_eq!(rt.focused(), Some(b));
        rt.handle_key(KeyEvent::new(Key::Tab, Modifiers::NONE));
        assert_eq!(rt.focused(), Some(a));
        assert!(rt.widget(a).unwrap().widget.common.focused);
        assert!(!rt.widget(b).unwrap().widget.common.focused);
    }

    #[test]
    fn removing_focused_node_clears_focus() {
        let mut rt = runtime();
        let a = rt.create_element("button");
        rt.append_child(rt.root(), a).unwrap();
        assert!(rt.focus(a));
        rt.remove_child(rt.root(), a).unwrap();
        assert_eq!(rt.focused(), None);
        assert!(rt.focus_context().is_empty());
    }

    #[test]
    fn dispose_frees_subtree_and_listeners() {
        let mut rt = runtime();
        let outer = rt.create_element("box");
        let inner = rt.create_element("button");
        rt.append_child(outer, inner).unwrap();
        rt.append_child(rt.root(), outer).unwrap();
        rt.add_event_listener(inner, "click", |_, _| {}).unwrap();
        assert_eq!(rt.dispose(outer), Ok(2));
        assert!(!rt.document().contains(inner));
        assert!(rt.listeners().get(inner, &EventKind::Click).is_none());
        assert_eq!(rt.dispose(outer), Err(DomError::UnknownNode { op: "dispose", node: outer }));
    }

    #[test]
    fn hiding_focused_node_blurs_it() {
        let mut rt = runtime();
        let a = rt.create_element("input");
        rt.append_child(rt.root(), a).unwrap();
        rt.focus(a);
        rt.set_attribute(a, "hidden", "true").unwrap();
        assert_eq!(rt.focused(), None);
    }

    #[test]
    fn display_attribute_survives_style_change() {
        let mut rt = runtime();
        let a = rt.create_element("box");
        rt.append_child(rt.root(), a).unwrap();
        rt.set_attribute(a, "display", "none").unwrap();
        rt.set_attribute(a, "style", "color: red").unwrap();
        assert!(!rt.widget(a).unwrap().widget.is_displayed());
    }

    #[test]
    fn focus_and_blur_events_fire_in_order() {
        let mut rt = runtime();
        let a = rt.create_element("button");
        let b = rt.create_element("button");
        rt.append_child(rt.root(), a).unwrap();
        rt.append_child(rt.root(), b).unwrap();
        let (log, handler) = recorder();
        rt.add_event_listener(a, "blur", handler.clone()).unwrap();
        rt.add_event_listener(b, "focus", handler).unwrap();
        rt.focus(a);
        rt.focus(b);
        assert_eq!(*log.borrow(), vec!["blur:".to_string(), "focus:".to_string()]);
    }

    // ── Keys ─────────────────────────────────────────────────────────

    #[test]
    fn typing_into_focused_input() {
        let mut rt = runtime();
        let input = rt.create_element("input");
        rt.append_child(rt.root(), input).unwrap();
        let (log, handler) = recorder();
        rt.add_event_listener(input, "input", handler).unwrap();
        rt.focus(input);
        rt.feed_bytes(b"ok\x7f!");
        assert_eq!(rt.document().element(input).and_then(|e| e.attribute("value")), Some("o!"));
        assert_eq!(log.borrow().last().map(String::as_str), Some("input:o!"));
    }

    #[test]
    fn space_toggles_checkbox() {
        let mut rt = runtime();
        let cb = rt.create_element("checkbox");
        rt.append_child(rt.root(), cb).unwrap();
        let (log, handler) = recorder();
        rt.add_event_listener(cb, "change", handler).unwrap();
        rt.focus(cb);
        rt.handle_key(KeyEvent::new(Key::Char(' '), Modifiers::NONE));
        assert_eq!(*log.borrow(), vec!["change:true".to_string()]);
        // A later unrelated update must not revert the toggle.
        rt.set_attribute(cb, "label", "Agree").unwrap();
        assert_eq!(rt.widget(cb).unwrap().widget.rendered, "[x] Agree");
    }

    #[test]
    fn custom_binding_is_reported() {
        let mut rt = runtime();
        rt.bindings_mut().bind(Key::Char('s'), Modifiers::CTRL, BindingAction::Custom("save".into()));
        rt.handle_key(KeyEvent::new(Key::Char('s'), Modifiers::CTRL));
        assert_eq!(rt.take_actions(), vec!["save".to_string()]);
        rt.handle_key(KeyEvent::new(Key::Char('c'), Modifiers::CTRL));
        assert!(rt.should_quit());
    }

    // ── Mouse ────────────────────────────────────────────────────────

    #[test]
    fn click_bubbles_to_listening_ancestor() {
        let mut rt = runtime();
        let outer = rt.create_element("box");
        rt.set_attribute(outer, "height", "3").unwrap();
        let inner = rt.create_element("button");
        rt.set_attribute(inner, "label", "ok").unwrap();
        rt.append_child(outer, inner).unwrap();
        rt.append_child(rt.root(), outer).unwrap();
        let (log, handler) = recorder();
        rt.add_event_listener(outer, "click", handler).unwrap();
        rt.layout_now();
        let region = rt.region(inner).unwrap();
        let (x, y) = (region.x as u16, region.y as u16);
        rt.handle_mouse(MouseEvent::press(MouseButton::Left, x, y));
        rt.handle_mouse(MouseEvent::release(MouseButton::Left, x, y));
        assert_eq!(*log.borrow(), vec!["click:".to_string()]);
        assert_eq!(rt.focused(), Some(inner));
    }
}
