//! Reconciler: queues widget operations and applies them to the widget tree.
//!
//! DOM mutations happen synchronously in [`Document`]; the widget side is
//! brought up to date by [`Reconciler::flush`], which drains the queue in
//! FIFO order. A failing operation is logged and skipped, the rest of the
//! batch still applies.

pub mod operation;

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace, warn};

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::ReconcileError;
use crate::widget::{adapter, PropBag, TerminalElement, Theme, WidgetId, WidgetKind, WidgetTree};

pub use operation::{element_props, PendingOperation};

/// When queued operations are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushMode {
    /// Every queued operation is flushed before the mutation call returns.
    #[default]
    Eager,
    /// Operations collect until the next tick.
    Batched,
}

/// What the caller should do after queueing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Flush synchronously now.
    FlushNow,
    /// A flush must be scheduled for the next tick.
    Schedule,
    /// A flush is already scheduled.
    AlreadyScheduled,
    /// The reconciler is stopped; the operation was discarded.
    Dropped,
}

/// Counts from one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: usize,
    pub failed: usize,
    /// Nodes whose widgets were torn down during this flush. The nodes
    /// themselves stay in the document.
    pub unmounted: Vec<NodeId>,
}

pub struct Reconciler {
    queue: VecDeque<PendingOperation>,
    mode: FlushMode,
    scheduled: bool,
    stopped: bool,
    // Cleared after every flush. Nothing reads it yet.
    memo: HashMap<NodeId, PropBag>,
    theme: Theme,
}

impl Reconciler {
    pub fn new(mode: FlushMode, theme: Theme) -> Self {
        Self {
            queue: VecDeque::new(),
            mode,
            scheduled: false,
            stopped: false,
            memo: HashMap::new(),
            theme,
        }
    }

    pub fn mode(&self) -> FlushMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FlushMode) {
        self.mode = mode;
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    // ── Queue ────────────────────────────────────────────────────────

    /// Append an operation to the queue.
    pub fn queue_operation(&mut self, op: PendingOperation) -> QueueOutcome {
        if self.stopped {
            trace!(op = op.name(), node = ?op.target(), "reconciler stopped, operation dropped");
            return QueueOutcome::Dropped;
        }
        self.queue.push_back(op);
        match self.mode {
            FlushMode::Eager => QueueOutcome::FlushNow,
            FlushMode::Batched if self.scheduled => QueueOutcome::AlreadyScheduled,
            FlushMode::Batched => {
                self.scheduled = true;
                QueueOutcome::Schedule
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Discard every queued operation and refuse new ones until [`start`].
    /// Returns the number of discarded operations.
    ///
    /// [`start`]: Reconciler::start
    pub fn stop(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.scheduled = false;
        self.stopped = true;
        debug!(discarded, "reconciler stopped");
        discarded
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // ── Flush ────────────────────────────────────────────────────────

    /// Apply every queued operation in FIFO order.
    pub fn flush(&mut self, document: &mut Document, widgets: &mut WidgetTree) -> FlushReport {
        self.scheduled = false;
        let mut report = FlushReport::default();
        while let Some(op) = self.queue.pop_front() {
            let quiet = is_text_kind(document, op.target());
            match self.apply(document, widgets, &op, &mut report.unmounted) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    report.failed += 1;
                    if quiet {
                        trace!(op = op.name(), node = ?op.target(), error = %err, "text operation skipped");
                    } else {
                        warn!(op = op.name(), node = ?op.target(), error = %err, "operation failed, continuing");
                    }
                }
            }
        }
        self.memo.clear();
        if report.applied + report.failed > 0 {
            trace!(applied = report.applied, failed = report.failed, "flush complete");
        }
        report
    }

    /// Flush synchronously regardless of any scheduled flush. Afterwards the
    /// widget tree reflects every mutation made so far.
    pub fn force_flush(&mut self, document: &mut Document, widgets: &mut WidgetTree) -> FlushReport {
        self.flush(document, widgets)
    }

    fn apply(
        &mut self,
        document: &mut Document,
        widgets: &mut WidgetTree,
        op: &PendingOperation,
        unmounted: &mut Vec<NodeId>,
    ) -> Result<(), ReconcileError> {
        match op {
            PendingOperation::Create { node } => self.materialize(document, widgets, *node).map(|_| ()),
            PendingOperation::Update { node, old, new } => self.update(document, widgets, *node, old, new),
            PendingOperation::Delete { node, parent } => self.delete(document, widgets, *node, *parent, unmounted),
            PendingOperation::Append { parent, child } | PendingOperation::Insert { parent, child, .. } => {
                self.attach(document, widgets, *parent, *child)
            }
            PendingOperation::Replace { parent, old, new } => {
                self.delete(document, widgets, *old, *parent, unmounted)?;
                self.attach(document, widgets, *parent, *new)
            }
        }
    }

    /// Build the widget for `node` if it is an element without one.
    fn materialize(
        &mut self,
        document: &mut Document,
        widgets: &mut WidgetTree,
        node: NodeId,
    ) -> Result<Option<WidgetId>, ReconcileError> {
        let data = match document.get(node) {
            Some(NodeKind::Element(data)) => data,
            Some(_) => return Ok(None),
            None => return Err(ReconcileError::StaleNode(node)),
        };
        if let Some(id) = data.widget.filter(|&id| widgets.contains(id)) {
            return Ok(Some(id));
        }
        let kind = WidgetKind::from_tag(&data.tag);
        let props = element_props(document, node);
        let widget = adapter::create(kind, &props, &self.theme)?;
        let id = widgets.insert(TerminalElement::new(node, widget, props));
        if let Some(data) = document.element_mut(node) {
            data.widget = Some(id);
        }
        trace!(node = ?node, kind = %kind, "materialized");
        Ok(Some(id))
    }

    /// Materialize every element below `node` and link each to its parent's
    /// widget. Failures below the top are logged; the failed widget and its
    /// descendants stay unmaterialized.
    fn materialize_subtree(
        &mut self,
        document: &mut Document,
        widgets: &mut WidgetTree,
        node: NodeId,
    ) -> Result<(), ReconcileError> {
        self.materialize(document, widgets, node)?;
        for descendant in document.walk_depth_first(node).into_iter().skip(1) {
            if document.element(descendant).is_none() {
                continue;
            }
            let Some(parent) = document.parent(descendant) else {
                continue;
            };
            let linked = self
                .materialize(document, widgets, descendant)
                .and_then(|_| link_in_order(document, widgets, parent, descendant));
            if let Err(err) = linked {
                if is_text_kind(document, descendant) {
                    trace!(node = ?descendant, error = %err, "descendant left unmaterialized");
                } else {
                    warn!(node = ?descendant, error = %err, "descendant left unmaterialized");
                }
            }
        }
        Ok(())
    }

    fn attach(
        &mut self,
        document: &mut Document,
        widgets: &mut WidgetTree,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), ReconcileError> {
        if !document.contains(child) {
            return Err(ReconcileError::StaleNode(child));
        }
        if document.parent(child) != Some(parent) {
            // Moved again before this flush; a later operation places it.
            trace!(node = ?child, "child moved since queueing");
            return Ok(());
        }
        if document.element(child).is_none() {
            return self.sync_content(document, widgets, parent);
        }
        // Children of a fragment or an unmaterialized parent are linked when
        // that parent itself is attached.
        let parent_materialized = document
            .element(parent)
            .and_then(|e| e.widget)
            .is_some_and(|w| widgets.contains(w));
        if !parent_materialized {
            if document.element(parent).is_some() {
                return Err(ReconcileError::MissingParentWidget(parent));
            }
            return Ok(());
        }
        self.materialize_subtree(document, widgets, child)?;
        link_in_order(document, widgets, parent, child)
    }

    fn update(
        &mut self,
        document: &Document,
        widgets: &mut WidgetTree,
        node: NodeId,
        old: &PropBag,
        new: &PropBag,
    ) -> Result<(), ReconcileError> {
        if !document.contains(node) {
            return Err(ReconcileError::StaleNode(node));
        }
        let id = document
            .element(node)
            .and_then(|e| e.widget)
            .ok_or(ReconcileError::MissingWidget(node))?;
        let element = widgets.get_mut(id).ok_or(ReconcileError::MissingWidget(node))?;
        let changes = adapter::diff(&element.props, new);
        if changes.is_empty() {
            return Ok(());
        }
        let changed = adapter::update(&mut element.widget, &changes, &self.theme)?;
        element.props = new.clone();
        trace!(node = ?node, changed, previous = old.len(), "widget updated");
        Ok(())
    }

    /// Re-fold the text children of `parent` into its widget's content.
    fn sync_content(
        &mut self,
        document: &Document,
        widgets: &mut WidgetTree,
        parent: NodeId,
    ) -> Result<(), ReconcileError> {
        let Some(data) = document.element(parent) else {
            return Ok(());
        };
        if data.widget.is_none() {
            return Ok(());
        }
        let props = element_props(document, parent);
        self.update(document, widgets, parent, &PropBag::new(), &props)
    }

    /// Tear down the widgets of a detached subtree. The DOM nodes survive,
    /// so the subtree can be inserted again and is rematerialized on attach.
    fn delete(
        &mut self,
        document: &mut Document,
        widgets: &mut WidgetTree,
        node: NodeId,
        parent: NodeId,
        unmounted: &mut Vec<NodeId>,
    ) -> Result<(), ReconcileError> {
        if !document.contains(node) {
            trace!(node = ?node, "already disposed");
            return Ok(());
        }
        if document.parent(node).is_some() || document.root() == Some(node) {
            // Reattached before this flush; the attach operation relinks it.
            return Ok(());
        }
        if let Some(widget) = document.element(node).and_then(|e| e.widget) {
            widgets.destroy(widget);
        }
        for descendant in document.walk_depth_first(node) {
            let Some(data) = document.element_mut(descendant) else {
                continue;
            };
            if data.widget.take().is_some() {
                unmounted.push(descendant);
            }
        }
        self.sync_content(document, widgets, parent)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(FlushMode::default(), Theme::default())
    }
}

/// Link the widget of `child` under the widget of `parent`, at the position
/// matching DOM order among the parent's materialized children.
fn link_in_order(
    document: &Document,
    widgets: &mut WidgetTree,
    parent: NodeId,
    child: NodeId,
) -> Result<(), ReconcileError> {
    let parent_widget = document
        .element(parent)
        .and_then(|e| e.widget)
        .filter(|&w| widgets.contains(w))
        .ok_or(ReconcileError::MissingParentWidget(parent))?;
    let child_widget = document
        .element(child)
        .and_then(|e| e.widget)
        .filter(|&w| widgets.contains(w))
        .ok_or(ReconcileError::MissingWidget(child))?;
    let index = document
        .children(parent)
        .iter()
        .take_while(|&&c| c != child)
        .filter_map(|&c| document.element(c).and_then(|e| e.widget))
        .filter(|&w| widgets.parent(w) == Some(parent_widget))
        .count();
    widgets.link(parent_widget, child_widget, index);
    Ok(())
}

/// Text nodes and text-kind elements fail routinely during teardown.
fn is_text_kind(document: &Document, node: NodeId) -> bool {
    match document.get(node) {
        Some(NodeKind::Text(_)) => true,
        Some(NodeKind::Element(data)) => WidgetKind::from_tag(&data.tag) == WidgetKind::Text,
        _ => false,
    }
}
