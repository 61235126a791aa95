//! Layout scalar values: cells, percentages and sizing keywords.

use std::fmt;

/// A sizing value for width/height and their min/max variants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Size from content (or stretch, depending on the strategy).
    #[default]
    Auto,
    /// Absolute cell count.
    Cells(f32),
    /// Percentage of the parent's content box, 0..=100.
    Percent(f32),
    MaxContent,
    FitContent,
    /// Fill the parent's cross axis.
    Stretch,
}

impl Dimension {
    /// Parse a dimension. Accepts plain numbers, an optional `px`/`ch`
    /// suffix, `NN%`, and the keywords `auto`, `half`, `full`,
    /// `max-content`, `fit-content`, `stretch`.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        match s {
            "auto" => return Some(Dimension::Auto),
            "half" => return Some(Dimension::Percent(50.0)),
            "full" => return Some(Dimension::Percent(100.0)),
            "max-content" | "maxContent" => return Some(Dimension::MaxContent),
            "fit-content" | "fitContent" => return Some(Dimension::FitContent),
            "stretch" => return Some(Dimension::Stretch),
            _ => {}
        }
        if let Some(pct) = s.strip_suffix('%') {
            return parse_number(pct).map(Dimension::Percent);
        }
        let number = s.strip_suffix("px").or_else(|| s.strip_suffix("ch")).unwrap_or(s);
        parse_number(number).map(Dimension::Cells)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// Resolve against a parent size. Keywords resolve to `None`; percentages
    /// floor to whole cells.
    pub fn resolve(&self, parent: i32) -> Option<i32> {
        match *self {
            Dimension::Cells(n) => Some(n.round() as i32),
            Dimension::Percent(p) => Some((parent as f32 * p / 100.0).floor() as i32),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Auto => write!(f, "auto"),
            Dimension::Cells(n) => write!(f, "{n}"),
            Dimension::Percent(p) => write!(f, "{p}%"),
            Dimension::MaxContent => write!(f, "max-content"),
            Dimension::FitContent => write!(f, "fit-content"),
            Dimension::Stretch => write!(f, "stretch"),
        }
    }
}

/// A length for padding, margin and gap: cells or a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Cells(f32),
    Percent(f32),
}

impl Default for Length {
    fn default() -> Self {
        Length::Cells(0.0)
    }
}

impl Length {
    pub fn parse(input: &str) -> Option<Self> {
        match Dimension::parse(input)? {
            Dimension::Cells(n) => Some(Length::Cells(n)),
            Dimension::Percent(p) => Some(Length::Percent(p)),
            _ => None,
        }
    }

    pub fn resolve(&self, parent: i32) -> i32 {
        match *self {
            Length::Cells(n) => n.round() as i32,
            Length::Percent(p) => (parent as f32 * p / 100.0).floor() as i32,
        }
    }
}

/// Four-sided lengths (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Edges {
    pub fn all(v: Length) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }

    /// CSS shorthand with 1 to 4 whitespace-separated values.
    pub fn parse_shorthand(input: &str) -> Option<Self> {
        let parts = input
            .split_whitespace()
            .map(Length::parse)
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [a] => Some(Self::all(*a)),
            [v, h] => Some(Self { top: *v, right: *h, bottom: *v, left: *h }),
            [t, h, b] => Some(Self { top: *t, right: *h, bottom: *b, left: *h }),
            [t, r, b, l] => Some(Self { top: *t, right: *r, bottom: *b, left: *l }),
            _ => None,
        }
    }

    /// Resolve to cells. Percentages resolve against the parent width, as in CSS.
    pub fn resolve(&self, parent_width: i32) -> crate::geometry::Spacing {
        crate::geometry::Spacing::new(
            self.top.resolve(parent_width),
            self.right.resolve(parent_width),
            self.bottom.resolve(parent_width),
            self.left.resolve(parent_width),
        )
    }
}

fn parse_number(s: &str) -> Option<f32> {
    let value: f32 = s.trim().parse().ok()?;
    value.is_finite().then_some(value)
}
