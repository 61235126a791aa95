//! Cell geometry: Offset, Size, Region, Spacing.
//!
//! Every coordinate in termweave is an integer terminal cell. Layout results,
//! hit-grid rectangles and paint clipping all speak these types.

use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// A position or displacement in terminal cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    /// The origin.
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Offset {
    type Output = Offset;
    #[inline]
    fn add(self, rhs: Offset) -> Offset {
        Offset { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Offset {
    type Output = Offset;
    #[inline]
    fn sub(self, rhs: Offset) -> Offset {
        Offset { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// A width x height extent in terminal cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero or negative.
    #[inline]
    pub const fn is_degenerate(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle in terminal cells.
///
/// `right()` and `bottom()` are exclusive edges.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const EMPTY: Region = Region { x: 0, y: 0, width: 0, height: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub const fn offset(self) -> Offset {
        Offset { x: self.x, y: self.y }
    }

    #[inline]
    pub const fn size(self) -> Size {
        Size { width: self.width, height: self.height }
    }

    /// Whether the point (x, y) lies inside this region.
    #[inline]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` overlaps this region (non-zero intersection area).
    #[inline]
    pub const fn overlaps(self, other: Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The overlapping part of two regions, or [`Region::EMPTY`].
    #[inline]
    pub const fn intersection(self, other: Region) -> Region {
        let x1 = if self.x > other.x { self.x } else { other.x };
        let y1 = if self.y > other.y { self.y } else { other.y };
        let x2 = if self.right() < other.right() { self.right() } else { other.right() };
        let y2 = if self.bottom() < other.bottom() { self.bottom() } else { other.bottom() };
        if x2 - x1 <= 0 || y2 - y1 <= 0 {
            Region::EMPTY
        } else {
            Region { x: x1, y: y1, width: x2 - x1, height: y2 - y1 }
        }
    }

    #[inline]
    pub const fn translate(self, offset: Offset) -> Region {
        Region { x: self.x + offset.x, y: self.y + offset.y, width: self.width, height: self.height }
    }

    /// Contract the region inward. Width and height clamp at zero.
    #[inline]
    pub const fn shrink(self, spacing: Spacing) -> Region {
        let w = self.width - spacing.left - spacing.right;
        let h = self.height - spacing.top - spacing.bottom;
        Region {
            x: self.x + spacing.left,
            y: self.y + spacing.top,
            width: if w > 0 { w } else { 0 },
            height: if h > 0 { h } else { 0 },
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Four-sided spacing (padding, margin, border widths), CSS order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Spacing {
    pub const ZERO: Spacing = Spacing { top: 0, right: 0, bottom: 0, left: 0 };

    #[inline]
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    #[inline]
    pub const fn all(value: i32) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    /// Expand CSS shorthand: 1 value (all), 2 (vertical, horizontal),
    /// 3 (top, horizontal, bottom) or 4 (top, right, bottom, left).
    pub fn from_shorthand(values: &[i32]) -> Option<Self> {
        match *values {
            [a] => Some(Self::all(a)),
            [v, h] => Some(Self::new(v, h, v, h)),
            [t, h, b] => Some(Self::new(t, h, b, h)),
            [t, r, b, l] => Some(Self::new(t, r, b, l)),
            _ => None,
        }
    }

    /// Total horizontal spacing: `left + right`.
    #[inline]
    pub const fn width(self) -> i32 {
        self.left + self.right
    }

    /// Total vertical spacing: `top + bottom`.
    #[inline]
    pub const fn height(self) -> i32 {
        self.top + self.bottom
    }
}

impl Add for Spacing {
    type Output = Spacing;
    #[inline]
    fn add(self, rhs: Spacing) -> Spacing {
        Spacing {
            top: self.top + rhs.top,
            right: self.right + rhs.right,
            bottom: self.bottom + rhs.bottom,
            left: self.left + rhs.left,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── Offset ───────────────────────────────────────────────────────

    #[test]
    fn offset_arithmetic() {
        assert_eq!(Offset::new(1, 2) + Offset::new(3, 4), Offset::new(4, 6));
        assert_eq!(Offset::new(5, 5) - Offset::new(2, 3), Offset::new(3, 2));
    }

    // ── Region ───────────────────────────────────────────────────────

    #[test]
    fn region_edges_exclusive() {
        let r = Region::new(5, 2, 10, 3);
        assert_eq!(r.right(), 15);
        assert_eq!(r.bottom(), 5);
        assert!(r.contains(5, 2));
        assert!(r.contains(14, 4));
        assert!(!r.contains(15, 4));
        assert!(!r.contains(4, 2));
    }

    #[test]
    fn region_intersection() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(5, 5, 10, 10);
        assert_eq!(a.intersection(b), Region::new(5, 5, 5, 5));
        assert!(a.overlaps(b));
        let c = Region::new(20, 20, 1, 1);
        assert_eq!(a.intersection(c), Region::EMPTY);
        assert!(!a.overlaps(c));
    }

    #[test]
    fn region_shrink_clamps() {
        let r = Region::new(0, 0, 4, 2);
        let inner = r.shrink(Spacing::all(3));
        assert_eq!(inner.width, 0);
        assert_eq!(inner.height, 0);
        assert!(inner.is_empty());
    }

    #[test]
    fn region_translate() {
        let r = Region::new(1, 1, 2, 2).translate(Offset::new(3, 4));
        assert_eq!(r, Region::new(4, 5, 2, 2));
    }

    // ── Spacing ──────────────────────────────────────────────────────

    #[test]
    fn spacing_shorthand() {
        assert_eq!(Spacing::from_shorthand(&[1]), Some(Spacing::all(1)));
        assert_eq!(Spacing::from_shorthand(&[1, 2]), Some(Spacing::new(1, 2, 1, 2)));
        assert_eq!(Spacing::from_shorthand(&[1, 2, 3]), Some(Spacing::new(1, 2, 3, 2)));
        assert_eq!(Spacing::from_shorthand(&[1, 2, 3, 4]), Some(Spacing::new(1, 2, 3, 4)));
        assert_eq!(Spacing::from_shorthand(&[]), None);
    }

    #[test]
    fn spacing_totals() {
        let s = Spacing::new(1, 2, 3, 4);
        assert_eq!(s.width(), 6);
        assert_eq!(s.height(), 4);
        assert_eq!(s + Spacing::all(1), Spacing::new(2, 3, 4, 5));
    }
}
