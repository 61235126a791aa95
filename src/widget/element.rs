//! Materialized widgets and the widget tree that mirrors the DOM.

use std::collections::BTreeMap;

use slotmap::{new_key_type, SlotMap};

use super::kind::WidgetKind;
use super::props::{CommonProps, PropBag};
use crate::dom::NodeId;

new_key_type! {
    /// Handle to a materialized widget.
    pub struct WidgetId;
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// Kind-specific widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindState {
    Box,
    Text,
    List {
        items: Vec<String>,
        selected: usize,
    },
    Input {
        value: String,
        placeholder: String,
    },
    Button {
        label: Option<String>,
    },
    Checkbox {
        checked: bool,
        indeterminate: bool,
        label: Option<String>,
    },
    Select {
        options: Vec<String>,
        selected: usize,
        open: bool,
    },
}

impl KindState {
    pub fn initial(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Box => KindState::Box,
            WidgetKind::Text => KindState::Text,
            WidgetKind::List => KindState::List { items: Vec::new(), selected: 0 },
            WidgetKind::Input => KindState::Input { value: String::new(), placeholder: String::new() },
            WidgetKind::Button => KindState::Button { label: None },
            WidgetKind::Checkbox => KindState::Checkbox { checked: false, indeterminate: false, label: None },
            WidgetKind::Select => KindState::Select { options: Vec::new(), selected: 0, open: false },
        }
    }
}

/// A widget: typed common properties, kind state, and a side map for every
/// property the kind does not interpret (layout keys, `id`, `class`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub kind: WidgetKind,
    pub common: CommonProps,
    pub state: KindState,
    pub extra: BTreeMap<String, String>,
    /// Text painted inside the widget's content area. Recomputed by the
    /// adapter after every property or focus change.
    pub rendered: String,
}

impl Widget {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            common: CommonProps {
                focusable: kind.focusable_by_default(),
                ..CommonProps::default()
            },
            state: KindState::initial(kind),
            extra: BTreeMap::new(),
            rendered: String::new(),
        }
    }

    /// Whether the widget takes part in layout, painting and hit-testing.
    pub fn is_displayed(&self) -> bool {
        !self.common.hidden && !self.common.display_none
    }

    /// Whether the widget can currently receive focus.
    pub fn can_focus(&self) -> bool {
        self.common.focusable && !self.common.disabled && self.is_displayed()
    }
}

// ---------------------------------------------------------------------------
// TerminalElement
// ---------------------------------------------------------------------------

/// Wrapper pairing a widget with its tree links and the props last applied.
#[derive(Debug, Clone)]
pub struct TerminalElement {
    pub widget: Widget,
    /// Full property bag as of the last create/update.
    pub props: PropBag,
    pub children: Vec<WidgetId>,
    pub parent: Option<WidgetId>,
    /// The DOM element this widget materializes.
    pub node: NodeId,
}

impl TerminalElement {
    pub fn new(node: NodeId, widget: Widget, props: PropBag) -> Self {
        Self {
            widget,
            props,
            children: Vec::new(),
            parent: None,
            node,
        }
    }
}

// ---------------------------------------------------------------------------
// WidgetTree
// ---------------------------------------------------------------------------

/// Arena of materialized widgets.
///
/// Invariant: for every element `e` and every `c` in `e.children`,
/// `tree[c].parent == Some(e)`, and a widget is listed under at most one parent.
#[derive(Debug, Default)]
pub struct WidgetTree {
    elements: SlotMap<WidgetId, TerminalElement>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: TerminalElement) -> WidgetId {
        self.elements.insert(element)
    }

    pub fn get(&self, id: WidgetId) -> Option<&TerminalElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut TerminalElement> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.elements.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.elements.get(id).and_then(|e| e.parent)
    }

    /// Place `child` under `parent` at `index` (clamped), detaching it from
    /// any previous parent first. Returns `false` if either handle is stale.
    pub fn link(&mut self, parent: WidgetId, child: WidgetId, index: usize) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        self.unlink(child);
        let Some(p) = self.elements.get_mut(parent) else {
            return false;
        };
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        if let Some(c) = self.elements.get_mut(child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detach `child` from its parent, if any.
    pub fn unlink(&mut self, child: WidgetId) {
        let Some(old_parent) = self.elements.get_mut(child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(p) = self.elements.get_mut(old_parent) {
            p.children.retain(|&c| c != child);
        }
    }

    /// Destroy a widget and every widget below it. Returns the DOM nodes whose
    /// widgets were destroyed.
    pub fn destroy(&mut self, id: WidgetId) -> Vec<NodeId> {
        self.unlink(id);
        let mut released = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(element) = self.elements.remove(current) {
                released.push(element.node);
                stack.extend(element.children);
            }
        }
        released
    }

    /// Pre-order walk from `start`.
    pub fn walk(&self, start: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap as NodeArena;

    fn nodes(n: usize) -> Vec<NodeId> {
        let mut arena: NodeArena<NodeId, ()> = NodeArena::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn element(node: NodeId, kind: WidgetKind) -> TerminalElement {
        TerminalElement::new(node, Widget::new(kind), PropBag::new())
    }

    fn assert_links(tree: &WidgetTree) {
        for (id, element) in tree.elements.iter() {
            for &child in &element.children {
                assert_eq!(tree.parent(child), Some(id));
            }
            if let Some(parent) = element.parent {
                let count = tree.children(parent).iter().filter(|&&c| c == id).count();
                assert_eq!(count, 1);
            }
        }
    }

    // ── linking ──────────────────────────────────────────────────────

    #[test]
    fn link_sets_back_reference() {
        let ids = nodes(3);
        let mut tree = WidgetTree::new();
        let root = tree.insert(element(ids[0], WidgetKind::Box));
        let a = tree.insert(element(ids[1], WidgetKind::Text));
        let b = tree.insert(element(ids[2], WidgetKind::Text));
        assert!(tree.link(root, a, 0));
        assert!(tree.link(root, b, 0));
        assert_eq!(tree.children(root), &[b, a]);
        assert_links(&tree);
    }

    #[test]
    fn relink_moves_between_parents() {
        let ids = nodes(3);
        let mut tree = WidgetTree::new();
        let p1 = tree.insert(element(ids[0], WidgetKind::Box));
        let p2 = tree.insert(element(ids[1], WidgetKind::Box));
        let c = tree.insert(element(ids[2], WidgetKind::Text));
        tree.link(p1, c, 0);
        tree.link(p2, c, 99);
        assert!(tree.children(p1).is_empty());
        assert_eq!(tree.children(p2), &[c]);
        assert_links(&tree);
    }

    #[test]
    fn link_to_self_is_refused() {
        let ids = nodes(1);
        let mut tree = WidgetTree::new();
        let a = tree.insert(element(ids[0], WidgetKind::Box));
        assert!(!tree.link(a, a, 0));
    }

    // ── destruction ──────────────────────────────────────────────────

    #[test]
    fn destroy_releases_subtree() {
        let ids = nodes(4);
        let mut tree = WidgetTree::new();
        let root = tree.insert(element(ids[0], WidgetKind::Box));
        let mid = tree.insert(element(ids[1], WidgetKind::Box));
        let leaf = tree.insert(element(ids[2], WidgetKind::Text));
        let other = tree.insert(element(ids[3], WidgetKind::Text));
        tree.link(root, mid, 0);
        tree.link(mid, leaf, 0);
        tree.link(root, other, 1);

        let mut released = tree.destroy(mid);
        released.sort();
        let mut expected = vec![ids[1], ids[2]];
        expected.sort();
        assert_eq!(released, expected);
        assert_eq!(tree.children(root), &[other]);
        assert_eq!(tree.len(), 2);
        assert!(tree.destroy(mid).is_empty());
    }

    #[test]
    fn walk_is_preorder() {
        let ids = nodes(4);
        let mut tree = WidgetTree::new();
        let root = tree.insert(element(ids[0], WidgetKind::Box));
        let a = tree.insert(element(ids[1], WidgetKind::Box));
        let a1 = tree.insert(element(ids[2], WidgetKind::Text));
        let b = tree.insert(element(ids[3], WidgetKind::Text));
        tree.link(root, a, 0);
        tree.link(a, a1, 0);
        tree.link(root, b, 1);
        assert_eq!(tree.walk(root), vec![root, a, a1, b]);
    }

    // ── widget ───────────────────────────────────────────────────────

    #[test]
    fn widget_defaults_follow_kind() {
        assert!(Widget::new(WidgetKind::Button).can_focus());
        assert!(!Widget::new(WidgetKind::Text).can_focus());
        let mut w = Widget::new(WidgetKind::Input);
        w.common.disabled = true;
        assert!(!w.can_focus());
    }

    #[test]
    fn display_none_hides_widget() {
        let mut w = Widget::new(WidgetKind::Box);
        assert!(w.is_displayed());
        w.common.display_none = true;
        assert!(!w.is_displayed());
    }
}
