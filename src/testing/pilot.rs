//! Pilot: scripted input against a headless runtime.
//!
//! Input goes through the same paths as terminal input: keys through the
//! binding registry and the focused node, mouse events through the hit grid.
//! Text and raw bytes can also be fed to the SGR parser.

use crate::dom::NodeId;
use crate::event::{InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent};
use crate::runtime::{Runtime, RuntimeOptions};

/// A headless runtime driver for tests.
///
/// ```
/// use termweave::testing::Pilot;
///
/// let mut pilot = Pilot::new(20, 3);
/// let root = pilot.runtime().root();
/// let rt = pilot.runtime_mut();
/// let label = rt.create_element("text");
/// rt.set_attribute(label, "content", "hello").unwrap();
/// rt.append_child(root, label).unwrap();
/// assert!(pilot.screen().starts_with("hello"));
/// ```
pub struct Pilot {
    runtime: Runtime,
}

impl Pilot {
    pub fn new(width: u16, height: u16) -> Self {
        Self { runtime: Runtime::headless(width, height) }
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self { runtime: Runtime::new(options) }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    // ── Input simulation ─────────────────────────────────────────────

    pub fn press_key(&mut self, key: Key) {
        self.press_key_with(key, Modifiers::NONE);
    }

    pub fn press_key_with(&mut self, key: Key, modifiers: Modifiers) {
        self.runtime.handle_input(InputEvent::Key(KeyEvent::new(key, modifiers)));
    }

    /// One key press per character.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press_key(Key::Char(ch));
        }
    }

    /// Raw terminal bytes, as a terminal would send them.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.runtime.feed_bytes(bytes);
        self.runtime.flush_input();
    }

    /// Left press and release at `(x, y)`.
    pub fn click(&mut self, x: u16, y: u16) {
        self.mouse(MouseEvent::press(MouseButton::Left, x, y));
        self.mouse(MouseEvent::release(MouseButton::Left, x, y));
    }

    /// Left click in the middle of the first row of `node`. Returns `false`
    /// when the node has no geometry.
    pub fn click_node(&mut self, node: NodeId) -> bool {
        self.runtime.layout_now();
        let Some(region) = self.runtime.region(node).filter(|r| !r.is_empty()) else {
            return false;
        };
        let x = (region.x + region.width / 2).max(0) as u16;
        let y = region.y.max(0) as u16;
        self.click(x, y);
        true
    }

    pub fn hover(&mut self, x: u16, y: u16) {
        self.mouse(MouseEvent::move_to(x, y));
    }

    pub fn scroll(&mut self, x: u16, y: u16, down: bool) {
        let action = if down { MouseAction::WheelDown } else { MouseAction::WheelUp };
        self.mouse(MouseEvent::new(action, MouseButton::None, x, y));
    }

    pub fn mouse(&mut self, event: MouseEvent) {
        self.runtime.handle_input(InputEvent::Mouse(event));
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.runtime.handle_input(InputEvent::Resize { width, height });
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Run every queued task, including the coalesced render.
    pub fn settle(&mut self) -> usize {
        self.runtime.run_until_idle()
    }

    /// Settle, then return the painted screen.
    pub fn screen(&mut self) -> String {
        self.settle();
        if self.runtime.frames_rendered() == 0 {
            self.runtime.render_immediate();
        }
        super::snapshot::screen_to_string(self.runtime.frame())
    }

    pub fn is_running(&self) -> bool {
        !self.runtime.should_quit()
    }
}
