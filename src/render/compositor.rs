//! Frame buffer and frame diffing.
//!
//! Each render paints a fresh [`Compositor`] frame; [`Compositor::diff`]
//! against the previous frame yields the [`CellUpdate`]s the driver writes.

use std::fmt;

use super::strip::{CellStyle, Strip, StyledCell};
use crate::geometry::Region;

// ---------------------------------------------------------------------------
// CellUpdate
// ---------------------------------------------------------------------------

/// One cell that differs from the previous frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: u16,
    pub y: u16,
    pub cell: StyledCell,
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// A full screen of cells. `screen[y][x]` is column x of row y.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compositor {
    screen: Vec<Vec<StyledCell>>,
    width: u16,
    height: u16,
}

impl Compositor {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            screen: blank_screen(width, height),
            width,
            height,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Whole-screen region.
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Resize and blank every cell.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = blank_screen(width, height);
    }

    /// Write `strip` into the frame, clipped to `clip` and the screen.
    pub fn place(&mut self, strip: &Strip, clip: &Region) {
        let clip = clip.intersection(self.bounds());
        let Some(visible) = strip.clip(&clip) else {
            return;
        };
        let row = &mut self.screen[visible.y as usize];
        for (i, cell) in visible.cells.into_iter().enumerate() {
            row[visible.x as usize + i] = cell;
        }
    }

    /// Blank `region` with `style`'s background.
    pub fn fill_region(&mut self, region: &Region, style: &CellStyle) {
        let area = region.intersection(self.bounds());
        if area.is_empty() {
            return;
        }
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.screen[y as usize][x as usize] = StyledCell::blank_styled(style.clone());
            }
        }
    }

    pub fn get_cell(&self, x: u16, y: u16) -> Option<&StyledCell> {
        self.screen.get(y as usize).and_then(|row| row.get(x as usize))
    }

    /// Cells that changed since `previous`. A size change repaints everything.
    pub fn diff(&self, previous: &Compositor) -> Vec<CellUpdate> {
        if self.width != previous.width || self.height != previous.height {
            return self.full();
        }
        let mut updates = Vec::new();
        for (y, (row, prev_row)) in self.screen.iter().zip(&previous.screen).enumerate() {
            for (x, (cell, prev)) in row.iter().zip(prev_row).enumerate() {
                if cell != prev {
                    updates.push(CellUpdate { x: x as u16, y: y as u16, cell: cell.clone() });
                }
            }
        }
        updates
    }

    /// Every cell, for the first frame after entering the screen.
    pub fn full(&self) -> Vec<CellUpdate> {
        self.screen
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter().enumerate().map(move |(x, cell)| CellUpdate {
                    x: x as u16,
                    y: y as u16,
                    cell: cell.clone(),
                })
            })
            .collect()
    }

    /// Characters of row `y`, trailing blanks trimmed.
    pub fn row_text(&self, y: u16) -> String {
        self.screen
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect::<String>().trim_end().to_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Compositor {
    /// Plain-text dump, one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            writeln!(f, "{}", self.row_text(y))?;
        }
        Ok(())
    }
}

fn blank_screen(width: u16, height: u16) -> Vec<Vec<StyledCell>> {
    (0..height).map(|_| vec![StyledCell::blank(); width as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain() -> CellStyle {
        CellStyle::new()
    }

    // ── Placement ────────────────────────────────────────────────────

    #[test]
    fn place_writes_cells() {
        let mut frame = Compositor::new(10, 2);
        frame.place(&Strip::text(2, 1, "hi", &plain()), &frame.bounds());
        assert_eq!(frame.row_text(1), "  hi");
        assert_eq!(frame.get_cell(3, 1).map(|c| c.ch), Some('i'));
    }

    #[test]
    fn place_clips_to_region_and_screen() {
        let mut frame = Compositor::new(6, 1);
        frame.place(&Strip::text(-2, 0, "abcdefghij", &plain()), &Region::new(1, 0, 100, 1));
        assert_eq!(frame.row_text(0), " defgh");
    }

    #[test]
    fn fill_region_sets_background() {
        let mut frame = Compositor::new(4, 2);
        let bg = CellStyle { bg: Some("blue".into()), ..plain() };
        frame.fill_region(&Region::new(1, 1, 10, 10), &bg);
        assert_eq!(frame.get_cell(0, 1).and_then(|c| c.style.bg.clone()), None);
        assert_eq!(frame.get_cell(3, 1).and_then(|c| c.style.bg.clone()).as_deref(), Some("blue"));
    }

    // ── Diff ─────────────────────────────────────────────────────────

    #[test]
    fn identical_frames_diff_empty() {
        let a = Compositor::new(5, 5);
        assert!(a.diff(&a.clone()).is_empty());
    }

    #[test]
    fn diff_reports_changed_cells_only() {
        let previous = Compositor::new(5, 1);
        let mut next = previous.clone();
        next.place(&Strip::text(1, 0, "x", &plain()), &next.bounds());
        let updates = next.diff(&previous);
        assert_eq!(updates.len(), 1);
        assert_eq!((updates[0].x, updates[0].y, updates[0].cell.ch), (1, 0, 'x'));
    }

    #[test]
    fn resized_frame_diffs_fully() {
        let previous = Compositor::new(2, 2);
        let next = Compositor::new(3, 2);
        assert_eq!(next.diff(&previous).len(), 6);
    }

    #[test]
    fn display_dumps_rows() {
        let mut frame = Compositor::new(4, 2);
        frame.place(&Strip::text(0, 0, "ab", &plain()), &frame.bounds());
        assert_eq!(frame.to_string(), "ab\n\n");
    }
}
