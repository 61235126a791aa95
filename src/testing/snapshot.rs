//! Snapshot rendering helpers.
//!
//! Turn painted frames and loose strips into plain text for snapshot tests.
//! Rows are right-trimmed and joined with `'\n'`, without a trailing newline.

use crate::render::{Compositor, Strip};
use crate::runtime::Runtime;

/// Repaint `runtime` now and return the screen as text.
pub fn render_to_string(runtime: &mut Runtime) -> String {
    runtime.render_immediate();
    screen_to_string(runtime.frame())
}

/// Every row of a frame.
pub fn screen_to_string(frame: &Compositor) -> String {
    (0..frame.height()).map(|y| frame.row_text(y)).collect::<Vec<_>>().join("\n")
}

/// Overlay strips on a blank `width` x `height` grid.
pub fn strips_to_string(strips: &[Strip], width: i32, height: i32) -> String {
    if width <= 0 || height <= 0 {
        return String::new();
    }
    let mut grid = vec![vec![' '; width as usize]; height as usize];
    for strip in strips {
        let Some(row) = usize::try_from(strip.y).ok().and_then(|y| grid.get_mut(y)) else {
            continue;
        };
        for (i, cell) in strip.cells.iter().enumerate() {
            let x = strip.x + i as i32;
            if let Some(slot) = usize::try_from(x).ok().and_then(|x| row.get_mut(x)) {
                *slot = cell.ch;
            }
        }
    }
    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CellStyle;
    use pretty_assertions::assert_eq;

    // ── strips_to_string ─────────────────────────────────────────────

    #[test]
    fn strips_overlay_in_order() {
        let style = CellStyle::new();
        let strips = vec![Strip::text(0, 0, "hello", &style), Strip::text(1, 0, "EL", &style), Strip::text(2, 1, "x", &style)];
        assert_eq!(strips_to_string(&strips, 6, 2), "hELlo\n  x");
    }

    #[test]
    fn strips_outside_are_dropped() {
        let style = CellStyle::new();
        let strips = vec![Strip::text(-2, 0, "abcd", &style), Strip::text(0, 5, "gone", &style)];
        assert_eq!(strips_to_string(&strips, 3, 1), "cd");
        assert_eq!(strips_to_string(&strips, 0, 1), "");
    }

    // ── Runtime screens ──────────────────────────────────────────────

    #[test]
    fn runtime_screen_text() {
        let mut rt = Runtime::headless(10, 2);
        let root = rt.root();
        let text = rt.create_element("text");
        rt.set_attribute(text, "content", "hi").unwrap();
        rt.append_child(root, text).unwrap();
        assert_eq!(render_to_string(&mut rt), "hi\n");
    }
}
