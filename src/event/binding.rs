//! Global key bindings, resolved before a key reaches the focused node.

use std::collections::HashMap;

use super::input::{Key, KeyEvent, Modifiers};

/// What a matched binding does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAction {
    Quit,
    FocusNext,
    FocusPrevious,
    /// Reported to the embedding application by name.
    Custom(String),
}

/// Maps key + modifiers to an action.
#[derive(Debug, Default)]
pub struct KeyBindingRegistry {
    bindings: HashMap<(Key, Modifiers), BindingAction>,
}

impl KeyBindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ctrl+C` quits, `Tab` and `Shift+Tab` move focus.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.bind(Key::Char('c'), Modifiers::CTRL, BindingAction::Quit);
        registry.bind(Key::Tab, Modifiers::NONE, BindingAction::FocusNext);
        registry.bind(Key::BackTab, Modifiers::NONE, BindingAction::FocusPrevious);
        registry
    }

    /// Register a binding, replacing any previous one for the same keys.
    pub fn bind(&mut self, key: Key, modifiers: Modifiers, action: BindingAction) {
        self.bindings.insert((key, modifiers), action);
    }

    pub fn unbind(&mut self, key: Key, modifiers: Modifiers) -> Option<BindingAction> {
        self.bindings.remove(&(key, modifiers))
    }

    /// Action bound to `event`, if any.
    ///
    /// Terminals report Shift+Tab as `BackTab` with or without the shift bit,
    /// so `BackTab` also matches with shift removed.
    pub fn resolve(&self, event: &KeyEvent) -> Option<&BindingAction> {
        self.bindings.get(&(event.code, event.modifiers)).or_else(|| match event.code {
            Key::BackTab => {
                let without_shift = Modifiers(event.modifiers.0 & !Modifiers::SHIFT.0);
                self.bindings.get(&(Key::BackTab, without_shift))
            }
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: Key, modifiers: Modifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    // ── Registry ─────────────────────────────────────────────────────

    #[test]
    fn new_registry_is_empty() {
        let reg = KeyBindingRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(KeyBindingRegistry::with_defaults().len(), 3);
    }

    #[test]
    fn modifiers_must_match() {
        let mut reg = KeyBindingRegistry::new();
        reg.bind(Key::Char('s'), Modifiers::CTRL, BindingAction::Custom("save".into()));
        assert_eq!(reg.resolve(&press(Key::Char('s'), Modifiers::NONE)), None);
        assert_eq!(
            reg.resolve(&press(Key::Char('s'), Modifiers::CTRL)),
            Some(&BindingAction::Custom("save".into()))
        );
    }

    #[test]
    fn bind_replaces_and_unbind_removes() {
        let mut reg = KeyBindingRegistry::new();
        reg.bind(Key::F(1), Modifiers::NONE, BindingAction::Custom("first".into()));
        reg.bind(Key::F(1), Modifiers::NONE, BindingAction::Custom("second".into()));
        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.unbind(Key::F(1), Modifiers::NONE),
            Some(BindingAction::Custom("second".into()))
        );
        assert!(reg.unbind(Key::F(1), Modifiers::NONE).is_none());
    }

    // ── Defaults ─────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let reg = KeyBindingRegistry::with_defaults();
        assert_eq!(reg.resolve(&press(Key::Char('c'), Modifiers::CTRL)), Some(&BindingAction::Quit));
        assert_eq!(reg.resolve(&press(Key::Tab, Modifiers::NONE)), Some(&BindingAction::FocusNext));
        assert_eq!(reg.resolve(&press(Key::BackTab, Modifiers::NONE)), Some(&BindingAction::FocusPrevious));
    }

    #[test]
    fn backtab_with_shift_bit_matches() {
        let reg = KeyBindingRegistry::with_defaults();
        assert_eq!(
            reg.resolve(&press(Key::BackTab, Modifiers::SHIFT)),
            Some(&BindingAction::FocusPrevious)
        );
    }
}
