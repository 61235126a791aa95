//! DOM event names, event payloads and the per-node listener side table.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::input::{KeyEvent, MouseEvent};
use crate::dom::NodeId;
use crate::runtime::Runtime;

/// Events delivered to DOM listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseEnter,
    MouseLeave,
    MouseDown,
    MouseUp,
    Click,
    MouseMove,
    Drag,
    Wheel,
    Focus,
    Blur,
    KeyPress,
    Change,
    Input,
    Select,
    /// Any other name; only delivered through [`Runtime::emit`].
    Custom(String),
}

impl EventKind {
    /// Parse a listener name. A leading `on` (`onclick`, `on:click`) is
    /// accepted; matching is case-insensitive.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let bare = lower
            .strip_prefix("on:")
            .or_else(|| lower.strip_prefix("on").filter(|rest| Self::known(rest).is_some()))
            .unwrap_or(lower.as_str());
        Self::known(bare).unwrap_or_else(|| EventKind::Custom(name.to_owned()))
    }

    fn known(name: &str) -> Option<Self> {
        let kind = match name {
            "mouseenter" | "mouseover" => Self::MouseEnter,
            "mouseleave" | "mouseout" => Self::MouseLeave,
            "mousedown" => Self::MouseDown,
            "mouseup" => Self::MouseUp,
            "click" => Self::Click,
            "mousemove" => Self::MouseMove,
            "drag" => Self::Drag,
            "wheel" | "scroll" => Self::Wheel,
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            "keypress" | "keydown" => Self::KeyPress,
            "change" => Self::Change,
            "input" => Self::Input,
            "select" => Self::Select,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::Click => "click",
            Self::MouseMove => "mousemove",
            Self::Drag => "drag",
            Self::Wheel => "wheel",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::KeyPress => "keypress",
            Self::Change => "change",
            Self::Input => "input",
            Self::Select => "select",
            Self::Custom(name) => name,
        }
    }

    /// Whether an unhandled event travels up to the nearest ancestor that
    /// listens for it.
    pub fn bubbles(&self) -> bool {
        matches!(self, Self::Click | Self::Wheel)
    }

    /// Whether a listener for this event makes its node a hit-test target.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Self::MouseEnter
                | Self::MouseLeave
                | Self::MouseDown
                | Self::MouseUp
                | Self::Click
                | Self::MouseMove
                | Self::Drag
                | Self::Wheel
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Node the event originated on.
    pub target: NodeId,
    /// Node whose listener is running (differs from `target` after bubbling).
    pub current_target: NodeId,
    pub mouse: Option<MouseEvent>,
    pub key: Option<KeyEvent>,
    /// New value for `change`, `input` and `select`.
    pub value: Option<String>,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            mouse: None,
            key: None,
            value: None,
        }
    }

    pub fn with_mouse(mut self, mouse: MouseEvent) -> Self {
        self.mouse = Some(mouse);
        self
    }

    pub fn with_key(mut self, key: KeyEvent) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A listener. It receives the runtime, so it may mutate the DOM; those
/// mutations go through the normal reconcile path.
pub type Handler = Rc<dyn Fn(&mut Runtime, &DomEvent)>;

/// Listener side table: node identity to one handler per event kind.
/// Entries are dropped when their node is disposed.
#[derive(Default)]
pub struct EventTable {
    listeners: HashMap<NodeId, HashMap<EventKind, Handler>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previous one for the same event.
    pub fn add(&mut self, node: NodeId, kind: EventKind, handler: Handler) {
        self.listeners.entry(node).or_default().insert(kind, handler);
    }

    pub fn remove(&mut self, node: NodeId, kind: &EventKind) -> bool {
        let Some(map) = self.listeners.get_mut(&node) else {
            return false;
        };
        let removed = map.remove(kind).is_some();
        if map.is_empty() {
            self.listeners.remove(&node);
        }
        removed
    }

    /// Drop every listener of `node`.
    pub fn remove_all(&mut self, node: NodeId) -> usize {
        self.listeners.remove(&node).map_or(0, |map| map.len())
    }

    pub fn get(&self, node: NodeId, kind: &EventKind) -> Option<Handler> {
        self.listeners.get(&node)?.get(kind).cloned()
    }

    pub fn has(&self, node: NodeId, kind: &EventKind) -> bool {
        self.listeners.get(&node).is_some_and(|map| map.contains_key(kind))
    }

    /// Whether `node` listens for any pointer event.
    pub fn has_pointer_listener(&self, node: NodeId) -> bool {
        self.listeners
            .get(&node)
            .is_some_and(|map| map.keys().any(EventKind::is_pointer))
    }

    /// Number of nodes with at least one listener.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.listeners.iter().map(|(node, map)| {
                let names: Vec<&str> = map.keys().map(EventKind::as_str).collect();
                (node, names)
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn node() -> NodeId {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        arena.insert(())
    }

    fn noop() -> Handler {
        Rc::new(|_: &mut Runtime, _: &DomEvent| {})
    }

    // ── EventKind ────────────────────────────────────────────────────

    #[test]
    fn names_parse() {
        assert_eq!(EventKind::from_name("click"), EventKind::Click);
        assert_eq!(EventKind::from_name("onclick"), EventKind::Click);
        assert_eq!(EventKind::from_name("on:mouseenter"), EventKind::MouseEnter);
        assert_eq!(EventKind::from_name("Change"), EventKind::Change);
        assert_eq!(EventKind::from_name("submit"), EventKind::Custom("submit".into()));
        // "one" is not "on" + "e".
        assert_eq!(EventKind::from_name("one"), EventKind::Custom("one".into()));
    }

    #[test]
    fn bubbling_events() {
        assert!(EventKind::Click.bubbles());
        assert!(EventKind::Wheel.bubbles());
        assert!(!EventKind::MouseEnter.bubbles());
        assert!(!EventKind::Change.bubbles());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(EventKind::MouseDown.to_string(), "mousedown");
        assert_eq!(EventKind::Custom("x".into()).to_string(), "x");
    }

    // ── EventTable ───────────────────────────────────────────────────

    #[test]
    fn add_get_remove() {
        let n = node();
        let mut table = EventTable::new();
        table.add(n, EventKind::Click, noop());
        assert!(table.has(n, &EventKind::Click));
        assert!(table.get(n, &EventKind::Click).is_some());
        assert!(table.has_pointer_listener(n));
        assert!(table.remove(n, &EventKind::Click));
        assert!(!table.remove(n, &EventKind::Click));
        assert!(table.is_empty());
    }

    #[test]
    fn non_pointer_listener_is_not_a_hit_target() {
        let n = node();
        let mut table = EventTable::new();
        table.add(n, EventKind::Change, noop());
        assert!(!table.has_pointer_listener(n));
    }

    #[test]
    fn remove_all_drops_node() {
        let n = node();
        let mut table = EventTable::new();
        table.add(n, EventKind::Click, noop());
        table.add(n, EventKind::Focus, noop());
        assert_eq!(table.remove_all(n), 2);
        assert_eq!(table.len(), 0);
    }
}
