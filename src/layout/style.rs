//! Layout properties of one element, read from its attributes and inline style.

use std::collections::BTreeMap;

use tracing::debug;

use super::value::{Dimension, Edges, Length};
use crate::dom::style::{camel_case, InlineStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    Row,
    #[default]
    Column,
    RowReverse,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Start,
    Center,
    End,
    #[default]
    Stretch,
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
}

/// Which strategy lays out a container's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Solver,
    Flex,
}

/// Resolved layout properties. Unset properties keep their CSS defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyle {
    pub display_none: bool,
    pub position: Position,
    pub direction: FlexDirection,
    pub rtl: bool,
    pub wrap: bool,
    pub justify: Justify,
    pub align_items: Align,
    pub align_self: Option<Align>,
    pub align_content: Option<Align>,
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    pub padding: Edges,
    pub margin: Edges,
    pub gap: Length,
    pub grow: f32,
    pub shrink: f32,
    pub basis: Dimension,
    pub inset_left: Option<Dimension>,
    pub inset_top: Option<Dimension>,
    pub inset_right: Option<Dimension>,
    pub inset_bottom: Option<Dimension>,
    pub overflow: Overflow,
    /// One-cell border on every side.
    pub border: bool,
    /// Explicit strategy selection; `None` inherits from the parent.
    pub strategy: Option<StrategyKind>,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            position: Position::Relative,
            direction: FlexDirection::Column,
            rtl: false,
            wrap: false,
            justify: Justify::Start,
            align_items: Align::Stretch,
            align_self: None,
            align_content: None,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            padding: Edges::default(),
            margin: Edges::default(),
            gap: Length::default(),
            grow: 0.0,
            shrink: 1.0,
            basis: Dimension::Auto,
            inset_left: None,
            inset_top: None,
            inset_right: None,
            inset_bottom: None,
            overflow: Overflow::Visible,
            border: false,
            strategy: None,
        }
    }
}

impl LayoutStyle {
    /// Build from element attributes. Declarations in the `style` attribute
    /// apply first; plain attributes of the same name override them.
    /// Unparseable values are ignored.
    pub fn from_attributes(attributes: &BTreeMap<String, String>, border: bool) -> Self {
        let mut style = LayoutStyle { border, ..LayoutStyle::default() };
        if let Some(inline) = attributes.get("style") {
            for (key, value) in InlineStyle::parse(inline).iter() {
                style.apply(key, value);
            }
        }
        for (key, value) in attributes {
            if key != "style" {
                style.apply(&camel_case(key), value);
            }
        }
        style
    }

    /// Apply one declaration. Returns whether the key was a layout key with a
    /// valid value.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        let ok = match key {
            "display" => {
                self.display_none = value == "none";
                true
            }
            "layout" => match value {
                "flex" => set(&mut self.strategy, Some(StrategyKind::Flex)),
                "solver" => set(&mut self.strategy, Some(StrategyKind::Solver)),
                _ => false,
            },
            "width" => dim(&mut self.width, value),
            "height" => dim(&mut self.height, value),
            "minWidth" => dim(&mut self.min_width, value),
            "minHeight" => dim(&mut self.min_height, value),
            "maxWidth" => dim(&mut self.max_width, value),
            "maxHeight" => dim(&mut self.max_height, value),
            "flexBasis" => dim(&mut self.basis, value),
            "flexGrow" | "flex" => num(&mut self.grow, value),
            "flexShrink" => num(&mut self.shrink, value),
            "flexDirection" => match value {
                "row" => set(&mut self.direction, FlexDirection::Row),
                "column" => set(&mut self.direction, FlexDirection::Column),
                "row-reverse" => set(&mut self.direction, FlexDirection::RowReverse),
                "column-reverse" => set(&mut self.direction, FlexDirection::ColumnReverse),
                _ => false,
            },
            "flexWrap" => match value {
                "wrap" | "wrap-reverse" => set(&mut self.wrap, true),
                "nowrap" => set(&mut self.wrap, false),
                _ => false,
            },
            "justifyContent" => match value {
                "flex-start" | "start" => set(&mut self.justify, Justify::Start),
                "center" => set(&mut self.justify, Justify::Center),
                "flex-end" | "end" => set(&mut self.justify, Justify::End),
                "space-between" => set(&mut self.justify, Justify::SpaceBetween),
                "space-around" => set(&mut self.justify, Justify::SpaceAround),
                "space-evenly" => set(&mut self.justify, Justify::SpaceEvenly),
                _ => false,
            },
            "alignItems" => parse_align(value).map(|a| self.align_items = a).is_some(),
            "alignSelf" => match value {
                "auto" => set(&mut self.align_self, None),
                other => parse_align(other).map(|a| self.align_self = Some(a)).is_some(),
            },
            "alignContent" => parse_align(value).map(|a| self.align_content = Some(a)).is_some(),
            "position" => match value {
                "absolute" => set(&mut self.position, Position::Absolute),
                "relative" | "static" => set(&mut self.position, Position::Relative),
                _ => false,
            },
            "overflow" => match value {
                "visible" => set(&mut self.overflow, Overflow::Visible),
                "hidden" => set(&mut self.overflow, Overflow::Hidden),
                "scroll" | "auto" => set(&mut self.overflow, Overflow::Scroll),
                _ => false,
            },
            "direction" => match value {
                "ltr" => set(&mut self.rtl, false),
                "rtl" => set(&mut self.rtl, true),
                _ => false,
            },
            "left" => inset(&mut self.inset_left, value),
            "top" => inset(&mut self.inset_top, value),
            "right" => inset(&mut self.inset_right, value),
            "bottom" => inset(&mut self.inset_bottom, value),
            "gap" => Length::parse(value).map(|g| self.gap = g).is_some(),
            "padding" => Edges::parse_shorthand(value).map(|e| self.padding = e).is_some(),
            "margin" => Edges::parse_shorthand(value).map(|e| self.margin = e).is_some(),
            "paddingTop" => side(&mut self.padding.top, value),
            "paddingRight" => side(&mut self.padding.right, value),
            "paddingBottom" => side(&mut self.padding.bottom, value),
            "paddingLeft" => side(&mut self.padding.left, value),
            "marginTop" => side(&mut self.margin.top, value),
            "marginRight" => side(&mut self.margin.right, value),
            "marginBottom" => side(&mut self.margin.bottom, value),
            "marginLeft" => side(&mut self.margin.left, value),
            _ => return false,
        };
        if !ok {
            debug!(key, value, "ignoring invalid layout value");
        }
        ok
    }

    /// Main-axis direction with `direction: rtl` applied to rows.
    pub fn effective_direction(&self) -> FlexDirection {
        match (self.direction, self.rtl) {
            (FlexDirection::Row, true) => FlexDirection::RowReverse,
            (FlexDirection::RowReverse, true) => FlexDirection::Row,
            (d, _) => d,
        }
    }
}

fn set<T>(slot: &mut T, value: T) -> bool {
    *slot = value;
    true
}

fn dim(slot: &mut Dimension, value: &str) -> bool {
    Dimension::parse(value).map(|d| *slot = d).is_some()
}

fn inset(slot: &mut Option<Dimension>, value: &str) -> bool {
    match Dimension::parse(value) {
        Some(Dimension::Auto) => set(slot, None),
        Some(d) => set(slot, Some(d)),
        None => false,
    }
}

fn side(slot: &mut Length, value: &str) -> bool {
    Length::parse(value).map(|l| *slot = l).is_some()
}

fn num(slot: &mut f32, value: &str) -> bool {
    match value.parse::<f32>() {
        Ok(n) if n.is_finite() && n >= 0.0 => set(slot, n),
        _ => false,
    }
}

fn parse_align(value: &str) -> Option<Align> {
    match value {
        "flex-start" | "start" => Some(Align::Start),
        "center" => Some(Align::Center),
        "flex-end" | "end" => Some(Align::End),
        "stretch" => Some(Align::Stretch),
        "baseline" => Some(Align::Baseline),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_are_column_stretch() {
        let s = LayoutStyle::default();
        assert_eq!(s.direction, FlexDirection::Column);
        assert_eq!(s.align_items, Align::Stretch);
        assert_eq!(s.shrink, 1.0);
    }

    #[test]
    fn reads_inline_style() {
        let s = LayoutStyle::from_attributes(
            &attrs(&[("style", "flex-direction: row; width: 50%; padding: 1 2")]),
            false,
        );
        assert_eq!(s.direction, FlexDirection::Row);
        assert_eq!(s.width, Dimension::Percent(50.0));
        assert_eq!(s.padding.left, Length::Cells(2.0));
    }

    #[test]
    fn attribute_wins_over_style() {
        let s = LayoutStyle::from_attributes(&attrs(&[("style", "width: 10"), ("width", "half")]), false);
        assert_eq!(s.width, Dimension::Percent(50.0));
    }

    #[test]
    fn kebab_case_attributes_are_normalized() {
        let s = LayoutStyle::from_attributes(&attrs(&[("justify-content", "space-between")]), false);
        assert_eq!(s.justify, Justify::SpaceBetween);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut s = LayoutStyle::default();
        assert!(!s.apply("width", "wide"));
        assert!(!s.apply("flexDirection", "diagonal"));
        assert!(!s.apply("unknownKey", "1"));
        assert_eq!(s, LayoutStyle::default());
    }

    #[test]
    fn strategy_selection() {
        let s = LayoutStyle::from_attributes(&attrs(&[("layout", "flex")]), false);
        assert_eq!(s.strategy, Some(StrategyKind::Flex));
        assert_eq!(LayoutStyle::default().strategy, None);
    }

    #[test]
    fn rtl_reverses_rows_only() {
        let mut s = LayoutStyle::default();
        s.apply("direction", "rtl");
        assert_eq!(s.effective_direction(), FlexDirection::Column);
        s.apply("flexDirection", "row");
        assert_eq!(s.effective_direction(), FlexDirection::RowReverse);
    }

    #[test]
    fn display_none_and_insets() {
        let s = LayoutStyle::from_attributes(
            &attrs(&[("display", "none"), ("position", "absolute"), ("left", "3"), ("top", "auto")]),
            true,
        );
        assert!(s.display_none);
        assert!(s.border);
        assert_eq!(s.position, Position::Absolute);
        assert_eq!(s.inset_left, Some(Dimension::Cells(3.0)));
        assert_eq!(s.inset_top, None);
    }
}
