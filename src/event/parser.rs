//! Byte-stream input parser: SGR mouse reports and the keys the event loop
//! needs.
//!
//! Bytes are buffered across calls, so a sequence split between two reads is
//! parsed once the rest arrives. A malformed sequence is consumed and
//! reported as nothing; parsing resumes at the next byte.

use tracing::debug;

use super::input::{InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent};

/// Longest sequence kept while waiting for a terminator.
const MAX_SEQUENCE: usize = 32;

enum Step {
    Event(InputEvent),
    /// A complete sequence that maps to nothing.
    Skip,
    /// More bytes are needed.
    Incomplete,
}

/// Incremental parser over raw terminal input.
#[derive(Debug, Default)]
pub struct InputParser {
    buf: Vec<u8>,
}

impl InputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every event they complete.
    pub fn feed(&mut self, data: &[u8]) -> Vec<InputEvent> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        while !self.buf.is_empty() {
            match self.step() {
                Step::Event(event) => events.push(event),
                Step::Skip => {}
                Step::Incomplete => {
                    if self.buf.len() > MAX_SEQUENCE {
                        debug!(len = self.buf.len(), "unterminated escape sequence dropped");
                        self.consume(1);
                        continue;
                    }
                    break;
                }
            }
        }
        events
    }

    /// Whether bytes are waiting for the rest of a sequence.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve buffered bytes once no more input is coming: a lone `ESC` is
    /// the Escape key, anything else is dropped.
    pub fn flush_pending(&mut self) -> Vec<InputEvent> {
        let pending = std::mem::take(&mut self.buf);
        match pending.as_slice() {
            [] => Vec::new(),
            [0x1B] => vec![key(Key::Escape, Modifiers::NONE)],
            rest => {
                debug!(len = rest.len(), "incomplete input discarded");
                Vec::new()
            }
        }
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n.min(self.buf.len()));
    }

    fn step(&mut self) -> Step {
        let first = self.buf[0];
        match first {
            0x1B => self.escape(),
            b'\r' | b'\n' => self.single(Key::Enter, Modifiers::NONE),
            b'\t' => self.single(Key::Tab, Modifiers::NONE),
            0x08 | 0x7F => self.single(Key::Backspace, Modifiers::NONE),
            0x01..=0x1A => self.single(Key::Char((first - 1 + b'a') as char), Modifiers::CTRL),
            0x20..=0x7E => self.single(Key::Char(first as char), Modifiers::NONE),
            0x80..=0xFF => self.utf8(),
            _ => {
                self.consume(1);
                Step::Skip
            }
        }
    }

    fn single(&mut self, code: Key, modifiers: Modifiers) -> Step {
        self.consume(1);
        Step::Event(key(code, modifiers))
    }

    fn utf8(&mut self) -> Step {
        let width = match self.buf[0] {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => {
                self.consume(1);
                return Step::Skip;
            }
        };
        if self.buf.len() < width {
            return Step::Incomplete;
        }
        let decoded = std::str::from_utf8(&self.buf[..width])
            .ok()
            .and_then(|s| s.chars().next());
        match decoded {
            Some(ch) => {
                self.consume(width);
                Step::Event(key(Key::Char(ch), Modifiers::NONE))
            }
            None => {
                self.consume(1);
                Step::Skip
            }
        }
    }

    fn escape(&mut self) -> Step {
        let Some(&second) = self.buf.get(1) else {
            return Step::Incomplete;
        };
        match second {
            b'[' => self.csi(),
            b'O' => self.ss3(),
            0x1B => {
                self.consume(1);
                Step::Event(key(Key::Escape, Modifiers::NONE))
            }
            0x20..=0x7E => {
                self.consume(2);
                Step::Event(key(Key::Char(second as char), Modifiers::ALT))
            }
            _ => {
                self.consume(1);
                Step::Event(key(Key::Escape, Modifiers::NONE))
            }
        }
    }

    fn ss3(&mut self) -> Step {
        let Some(&code) = self.buf.get(2) else {
            return Step::Incomplete;
        };
        self.consume(3);
        match code {
            b'A' => Step::Event(key(Key::Up, Modifiers::NONE)),
            b'B' => Step::Event(key(Key::Down, Modifiers::NONE)),
            b'C' => Step::Event(key(Key::Right, Modifiers::NONE)),
            b'D' => Step::Event(key(Key::Left, Modifiers::NONE)),
            b'H' => Step::Event(key(Key::Home, Modifiers::NONE)),
            b'F' => Step::Event(key(Key::End, Modifiers::NONE)),
            b'P'..=b'S' => Step::Event(key(Key::F(code - b'P' + 1), Modifiers::NONE)),
            _ => Step::Skip,
        }
    }

    fn csi(&mut self) -> Step {
        if self.buf.get(2) == Some(&b'<') {
            return self.sgr_mouse();
        }
        // Final byte of a CSI sequence is in 0x40..=0x7E.
        let Some(end) = self.buf.iter().skip(2).position(|b| (0x40..=0x7E).contains(b)).map(|p| p + 2) else {
            return Step::Incomplete;
        };
        let final_byte = self.buf[end];
        let params: Vec<u32> = std::str::from_utf8(&self.buf[2..end])
            .unwrap_or("")
            .split(';')
            .map(|p| p.parse().unwrap_or(0))
            .collect();
        self.consume(end + 1);

        let modifiers = params.get(1).copied().map(decode_modifier).unwrap_or(Modifiers::NONE);
        let code = match final_byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'Z' => return Step::Event(key(Key::BackTab, Modifiers::SHIFT)),
            b'I' => return Step::Event(InputEvent::FocusGained),
            b'O' => return Step::Event(InputEvent::FocusLost),
            b'~' => match params.first().copied().unwrap_or(0) {
                1 | 7 => Key::Home,
                2 => Key::Insert,
                3 => Key::Delete,
                4 | 8 => Key::End,
                5 => Key::PageUp,
                6 => Key::PageDown,
                n @ 11..=15 => Key::F((n - 10) as u8),
                n @ 17..=21 => Key::F((n - 11) as u8),
                n @ 23..=24 => Key::F((n - 12) as u8),
                _ => return Step::Skip,
            },
            _ => {
                debug!(final_byte, "unhandled CSI sequence");
                return Step::Skip;
            }
        };
        Step::Event(key(code, modifiers))
    }

    /// `ESC [ < Cb ; Cx ; Cy (M|m)`
    fn sgr_mouse(&mut self) -> Step {
        let Some(end) = self.buf.iter().skip(3).position(|&b| b == b'M' || b == b'm').map(|p| p + 3) else {
            // A byte that cannot appear in the parameters ends the sequence.
            if self.buf[3..].iter().any(|&b| !(b.is_ascii_digit() || b == b';')) {
                debug!("malformed SGR mouse sequence");
                self.consume(3);
                return Step::Skip;
            }
            return Step::Incomplete;
        };
        let release = self.buf[end] == b'm';
        let params = std::str::from_utf8(&self.buf[3..end]).ok().and_then(parse_sgr_params);
        self.consume(end + 1);
        match params {
            Some((cb, x, y)) => Step::Event(InputEvent::Mouse(decode_sgr(cb, x, y, release))),
            None => {
                debug!("malformed SGR mouse parameters");
                Step::Skip
            }
        }
    }
}

fn key(code: Key, modifiers: Modifiers) -> InputEvent {
    InputEvent::Key(KeyEvent::new(code, modifiers))
}

/// xterm modifier parameter: 1 + (shift | alt << 1 | ctrl << 2).
fn decode_modifier(param: u32) -> Modifiers {
    let bits = param.saturating_sub(1);
    let mut out = Modifiers::NONE;
    if bits & 1 != 0 {
        out = out | Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        out = out | Modifiers::ALT;
    }
    if bits & 4 != 0 {
        out = out | Modifiers::CTRL;
    }
    out
}

fn parse_sgr_params(params: &str) -> Option<(u16, u16, u16)> {
    let mut parts = params.split(';').map(|p| p.parse::<u16>().ok());
    let cb = parts.next()??;
    let x = parts.next()??;
    let y = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some((cb, x, y))
}

/// Decode an SGR button byte. Coordinates are 1-based on the wire.
pub fn decode_sgr(cb: u16, x: u16, y: u16, release: bool) -> MouseEvent {
    let mut modifiers = Modifiers::NONE;
    if cb & 4 != 0 {
        modifiers = modifiers | Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers = modifiers | Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers = modifiers | Modifiers::CTRL;
    }

    let base = cb & 3;
    let button = match base {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    };
    let (action, button) = if cb & 64 != 0 {
        let action = if base == 0 { MouseAction::WheelUp } else { MouseAction::WheelDown };
        (action, MouseButton::None)
    } else if release {
        (MouseAction::Release, button)
    } else if cb & 32 != 0 {
        if button == MouseButton::None {
            (MouseAction::Move, button)
        } else {
            (MouseAction::Drag, button)
        }
    } else {
        (MouseAction::Press, button)
    };

    MouseEvent {
        action,
        button,
        x: x.saturating_sub(1),
        y: y.saturating_sub(1),
        modifiers,
    }
}
