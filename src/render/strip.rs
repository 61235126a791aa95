//! Cells and strips: the painting primitives.
//!
//! A [`Strip`] is one row of styled cells at an absolute screen position.
//! The painter turns widgets into strips; the [`Compositor`](super::Compositor)
//! clips and places them.

use crate::geometry::Region;
use crate::widget::WidgetStyle;

// ---------------------------------------------------------------------------
// CellStyle
// ---------------------------------------------------------------------------

/// Resolved style of one terminal cell. Colors stay as strings (`"red"`,
/// `"#ff8800"`) until the driver parses them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a merged widget style; unset flags are off.
    pub fn from_widget_style(style: &WidgetStyle) -> Self {
        CellStyle {
            fg: style.fg.clone(),
            bg: style.bg.clone(),
            bold: style.bold.unwrap_or(false),
            italic: style.italic.unwrap_or(false),
            underline: style.underline.unwrap_or(false),
        }
    }

    /// Same style with a different foreground, keeping the background.
    pub fn with_fg(&self, fg: Option<String>) -> Self {
        CellStyle { fg, ..self.clone() }
    }

    /// Fill in an unset background from the layer underneath.
    pub fn over(mut self, below: &CellStyle) -> Self {
        if self.bg.is_none() {
            self.bg = below.bg.clone();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// StyledCell
// ---------------------------------------------------------------------------

/// One character with its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledCell {
    pub ch: char,
    pub style: CellStyle,
}

impl StyledCell {
    pub fn new(ch: char, style: CellStyle) -> Self {
        Self { ch, style }
    }

    pub fn blank() -> Self {
        Self::new(' ', CellStyle::default())
    }

    pub fn blank_styled(style: CellStyle) -> Self {
        Self::new(' ', style)
    }
}

impl Default for StyledCell {
    fn default() -> Self {
        Self::blank()
    }
}

// ---------------------------------------------------------------------------
// Strip
// ---------------------------------------------------------------------------

/// A run of cells on row `y`, starting at column `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strip {
    pub y: i32,
    pub x: i32,
    pub cells: Vec<StyledCell>,
}

impl Strip {
    pub fn new(x: i32, y: i32) -> Self {
        Self { y, x, cells: Vec::new() }
    }

    /// A strip of `text` in one style.
    pub fn text(x: i32, y: i32, text: &str, style: &CellStyle) -> Self {
        let mut strip = Self::new(x, y);
        strip.push_str(text, style);
        strip
    }

    /// `width` copies of `ch`.
    pub fn repeat(x: i32, y: i32, ch: char, width: i32, style: &CellStyle) -> Self {
        let cells = (0..width.max(0)).map(|_| StyledCell::new(ch, style.clone())).collect();
        Self { y, x, cells }
    }

    pub fn push(&mut self, ch: char, style: CellStyle) {
        self.cells.push(StyledCell::new(ch, style));
    }

    pub fn push_str(&mut self, text: &str, style: &CellStyle) {
        self.cells.extend(text.chars().map(|ch| StyledCell::new(ch, style.clone())));
    }

    pub fn width(&self) -> i32 {
        self.cells.len() as i32
    }

    /// Exclusive end column.
    pub fn right(&self) -> i32 {
        self.x + self.width()
    }

    /// The part of this strip inside `clip`, or `None` when nothing is left.
    pub fn clip(&self, clip: &Region) -> Option<Strip> {
        if clip.is_empty() || self.y < clip.y || self.y >= clip.bottom() {
            return None;
        }
        let start = self.x.max(clip.x);
        let end = self.right().min(clip.right());
        if start >= end {
            return None;
        }
        let from = (start - self.x) as usize;
        let to = (end - self.x) as usize;
        Some(Strip {
            y: self.y,
            x: start,
            cells: self.cells[from..to].to_vec(),
        })
    }

    /// The characters, without styles.
    pub fn plain(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── CellStyle ────────────────────────────────────────────────────

    #[test]
    fn widget_style_flattens() {
        let style = WidgetStyle {
            fg: Some("red".into()),
            bold: Some(true),
            italic: Some(false),
            ..WidgetStyle::default()
        };
        let cell = CellStyle::from_widget_style(&style);
        assert_eq!(cell.fg.as_deref(), Some("red"));
        assert_eq!(cell.bg, None);
        assert!(cell.bold);
        assert!(!cell.italic);
        assert!(!cell.underline);
    }

    #[test]
    fn over_inherits_background_only_when_unset() {
        let below = CellStyle { bg: Some("blue".into()), ..CellStyle::new() };
        let plain = CellStyle::new().over(&below);
        assert_eq!(plain.bg.as_deref(), Some("blue"));
        let own = CellStyle { bg: Some("red".into()), ..CellStyle::new() }.over(&below);
        assert_eq!(own.bg.as_deref(), Some("red"));
    }

    // ── Strip ────────────────────────────────────────────────────────

    #[test]
    fn text_strip_width() {
        let strip = Strip::text(2, 0, "héllo", &CellStyle::new());
        assert_eq!(strip.width(), 5);
        assert_eq!(strip.right(), 7);
        assert_eq!(strip.plain(), "héllo");
    }

    #[test]
    fn clip_trims_both_sides() {
        let strip = Strip::text(0, 1, "abcdefgh", &CellStyle::new());
        let clipped = strip.clip(&Region::new(2, 0, 3, 5)).map(|s| (s.x, s.plain()));
        assert_eq!(clipped, Some((2, "cde".to_string())));
    }

    #[test]
    fn clip_outside_is_none() {
        let strip = Strip::text(0, 4, "abc", &CellStyle::new());
        assert_eq!(strip.clip(&Region::new(0, 0, 10, 4)), None);
        assert_eq!(strip.clip(&Region::new(5, 4, 3, 1)), None);
        assert_eq!(strip.clip(&Region::new(0, 4, 0, 1)), None);
    }

    #[test]
    fn repeat_negative_width_is_empty() {
        assert_eq!(Strip::repeat(0, 0, '─', -3, &CellStyle::new()).width(), 0);
    }
}
