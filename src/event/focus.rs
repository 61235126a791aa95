//! Focus ring over registered focusable nodes.

use slotmap::SecondaryMap;

use crate::dom::NodeId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    order: Option<i32>,
    /// Registration sequence, the tie-breaker for Tab order.
    seq: u64,
}

/// A focus transition: the node that lost focus and the node that gained it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub blurred: Option<NodeId>,
    pub focused: Option<NodeId>,
}

/// Registered focusable nodes and the single focused one.
///
/// Tab order: nodes with a positive order hint first, ascending, then every
/// node without a hint (or with `0`) in registration order. Negative hints
/// are focusable by pointer but skipped by Tab. Visibility is judged by the
/// caller through the `can_focus` predicate.
#[derive(Debug, Default)]
pub struct FocusContext {
    entries: SecondaryMap<NodeId, Entry>,
    next_seq: u64,
    focused: Option<NodeId>,
}

impl FocusContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`, or update its order hint if already registered.
    pub fn register(&mut self, node: NodeId, order: Option<i32>) {
        if let Some(entry) = self.entries.get_mut(node) {
            entry.order = order;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(node, Entry { order, seq });
    }

    /// Remove `node`. If it held focus, focus is cleared and the change is
    /// returned; focus does not move on to another node.
    pub fn unregister(&mut self, node: NodeId) -> Option<FocusChange> {
        self.entries.remove(node);
        if self.focused == Some(node) {
            self.focused = None;
            return Some(FocusChange { blurred: Some(node), focused: None });
        }
        None
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.entries.contains_key(node)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Focusable nodes in tab order.
    pub fn tab_order(&self, can_focus: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        let mut ordered: Vec<(NodeId, Entry)> = self
            .entries
            .iter()
            .filter(|(node, e)| e.order.map_or(true, |o| o >= 0) && can_focus(*node))
            .map(|(node, e)| (node, *e))
            .collect();
        ordered.sort_by_key(|(_, e)| match e.order {
            Some(o) if o > 0 => (0, o, e.seq),
            _ => (1, 0, e.seq),
        });
        ordered.into_iter().map(|(node, _)| node).collect()
    }

    /// Node after the focused one, wrapping around. The first node when
    /// nothing (or an unlisted node) is focused.
    pub fn next_focusable(&self, can_focus: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let order = self.tab_order(can_focus);
        let current = self.focused.and_then(|f| order.iter().position(|&n| n == f));
        match current {
            Some(i) => order.get((i + 1) % order.len()).copied(),
            None => order.first().copied(),
        }
    }

    /// Node before the focused one, wrapping around. The last node when
    /// nothing is focused.
    pub fn previous_focusable(&self, can_focus: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let order = self.tab_order(can_focus);
        let current = self.focused.and_then(|f| order.iter().position(|&n| n == f));
        match current {
            Some(i) => order.get((i + order.len() - 1) % order.len()).copied(),
            None => order.last().copied(),
        }
    }

    /// Focus `node` if it is registered. Returns the change, or `None` when
    /// it was already focused or is not registered.
    pub fn focus(&mut self, node: NodeId) -> Option<FocusChange> {
        if self.focused == Some(node) || !self.is_registered(node) {
            return None;
        }
        let blurred = self.focused.replace(node);
        Some(FocusChange { blurred, focused: Some(node) })
    }

    /// Clear focus.
    pub fn blur(&mut self) -> Option<FocusChange> {
        let blurred = self.focused.take()?;
        Some(FocusChange { blurred: Some(blurred), focused: None })
    }

    /// Drop focus from a node that can no longer hold it (hidden, disabled).
    pub fn validate(&mut self, can_focus: impl Fn(NodeId) -> bool) -> Option<FocusChange> {
        match self.focused {
            Some(node) if !can_focus(node) => self.blur(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slotmap::SlotMap;

    fn nodes(n: usize) -> Vec<NodeId> {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn all(_: NodeId) -> bool {
        true
    }

    // ── Tab order ────────────────────────────────────────────────────

    #[test]
    fn registration_order_is_tab_order() {
        let n = nodes(3);
        let mut ctx = FocusContext::new();
        for &id in &n {
            ctx.register(id, None);
        }
        assert_eq!(ctx.tab_order(all), n);
    }

    #[test]
    fn positive_hints_come_first() {
        let n = nodes(4);
        let mut ctx = FocusContext::new();
        ctx.register(n[0], None);
        ctx.register(n[1], Some(2));
        ctx.register(n[2], Some(1));
        ctx.register(n[3], Some(-1));
        assert_eq!(ctx.tab_order(all), vec![n[2], n[1], n[0]]);
    }

    #[test]
    fn reregistering_keeps_position() {
        let n = nodes(3);
        let mut ctx = FocusContext::new();
        for &id in &n {
            ctx.register(id, None);
        }
        ctx.register(n[0], None);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.tab_order(all), n);

        ctx.unregister(n[0]);
        ctx.register(n[0], None);
        assert_eq!(ctx.tab_order(all), vec![n[1], n[2], n[0]]);
    }

    #[test]
    fn many_registrations_stay_ordered() {
        let n = nodes(500);
        let mut ctx = FocusContext::new();
        for &id in n.iter().rev() {
            ctx.register(id, None);
        }
        for &id in &n {
            ctx.register(id, None);
        }
        let expected: Vec<NodeId> = n.iter().rev().copied().collect();
        assert_eq!(ctx.tab_order(all), expected);
    }

    #[test]
    fn invisible_nodes_are_skipped() {
        let n = nodes(3);
        let mut ctx = FocusContext::new();
        for &id in &n {
            ctx.register(id, None);
        }
        let hidden = n[1];
        assert_eq!(ctx.tab_order(|id| id != hidden), vec![n[0], n[2]]);
    }

    // ── Navigation ───────────────────────────────────────────────────

    #[test]
    fn next_and_previous_wrap() {
        let n = nodes(3);
        let mut ctx = FocusContext::new();
        for &id in &n {
            ctx.register(id, None);
        }
        assert_eq!(ctx.next_focusable(all), Some(n[0]));
        assert_eq!(ctx.previous_focusable(all), Some(n[2]));

        ctx.focus(n[2]);
        assert_eq!(ctx.next_focusable(all), Some(n[0]));
        ctx.focus(n[0]);
        assert_eq!(ctx.previous_focusable(all), Some(n[2]));
    }

    #[test]
    fn empty_ring_has_no_next() {
        let ctx = FocusContext::new();
        assert_eq!(ctx.next_focusable(all), None);
        assert_eq!(ctx.previous_focusable(all), None);
    }

    #[test]
    fn focus_reports_change() {
        let n = nodes(2);
        let mut ctx = FocusContext::new();
        ctx.register(n[0], None);
        ctx.register(n[1], None);
        assert_eq!(ctx.focus(n[0]), Some(FocusChange { blurred: None, focused: Some(n[0]) }));
        assert_eq!(ctx.focus(n[0]), None);
        assert_eq!(ctx.focus(n[1]), Some(FocusChange { blurred: Some(n[0]), focused: Some(n[1]) }));
    }

    #[test]
    fn unregistered_node_cannot_take_focus() {
        let n = nodes(1);
        let mut ctx = FocusContext::new();
        assert_eq!(ctx.focus(n[0]), None);
        assert_eq!(ctx.focused(), None);
    }

    // ── Removal ──────────────────────────────────────────────────────

    #[test]
    fn unregistering_focused_clears_focus() {
        let n = nodes(3);
        let mut ctx = FocusContext::new();
        for &id in &n {
            ctx.register(id, None);
        }
        ctx.focus(n[1]);
        let change = ctx.unregister(n[1]);
        assert_eq!(change, Some(FocusChange { blurred: Some(n[1]), focused: None }));
        assert_eq!(ctx.focused(), None);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn unregistering_other_keeps_focus() {
        let n = nodes(2);
        let mut ctx = FocusContext::new();
        ctx.register(n[0], None);
        ctx.register(n[1], None);
        ctx.focus(n[0]);
        assert_eq!(ctx.unregister(n[1]), None);
        assert_eq!(ctx.focused(), Some(n[0]));
    }

    #[test]
    fn validate_drops_hidden_focus() {
        let n = nodes(1);
        let mut ctx = FocusContext::new();
        ctx.register(n[0], None);
        ctx.focus(n[0]);
        assert!(ctx.validate(|_| true).is_none());
        assert!(ctx.validate(|_| false).is_some());
        assert_eq!(ctx.focused(), None);
    }
}
