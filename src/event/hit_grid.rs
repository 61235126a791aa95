//! Per-cell hit-test grid.

use crate::geometry::Region;

/// Marker for a cell no interactive node covers.
pub const EMPTY: i32 = -1;

/// Screen-sized grid mapping each cell to the index of the topmost
/// interactive node covering it, or [`EMPTY`].
///
/// Later writes win, so filling nodes in paint order leaves the topmost one
/// in every cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<i32>,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn offset(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Set a single cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, index: i32) {
        if let Some(offset) = self.offset(x, y) {
            self.cells[offset] = index;
        }
    }

    /// Fill `region`, clipped to the grid.
    pub fn fill_rect(&mut self, region: Region, index: i32) {
        let clipped = region.intersection(Region::new(0, 0, self.width as i32, self.height as i32));
        if clipped.is_empty() {
            return;
        }
        let stride = self.width as usize;
        for y in clipped.y..clipped.bottom() {
            let row = y as usize * stride;
            self.cells[row + clipped.x as usize..row + clipped.right() as usize].fill(index);
        }
    }

    /// Index at a cell; [`EMPTY`] outside the grid.
    pub fn get(&self, x: u16, y: u16) -> i32 {
        self.offset(x, y).map_or(EMPTY, |offset| self.cells[offset])
    }

    /// Change the grid size, keeping the content of the overlapping area.
    /// New cells are empty.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        let mut cells = vec![EMPTY; width as usize * height as usize];
        let keep_w = width.min(self.width) as usize;
        for y in 0..height.min(self.height) as usize {
            let from = y * self.width as usize;
            let to = y * width as usize;
            cells[to..to + keep_w].copy_from_slice(&self.cells[from..from + keep_w]);
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }
}
