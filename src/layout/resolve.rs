//! LayoutStyle -> taffy Style conversion.
//!
//! Maps the crate's layout types ([`Dimension`], [`Length`], [`Edges`],
//! [`LayoutStyle`]) onto taffy's ([`taffy::Style`], [`LengthPercentageAuto`], ...).

use taffy::geometry::{Point, Rect, Size};
use taffy::prelude::{FromLength, FromPercent, TaffyAuto, TaffyZero};
use taffy::style::{
    AlignContent, AlignItems, Display, FlexWrap, JustifyContent, LengthPercentage,
    LengthPercentageAuto,
};

use super::style::{Align, FlexDirection, Justify, LayoutStyle, Overflow, Position};
use super::value::{Dimension, Edges, Length};

/// Convert a [`Dimension`] for sizing contexts (width, height, min/max, basis).
///
/// - `Cells` -> length
/// - `Percent` -> percent (0..100 mapped to 0..1)
/// - keywords -> auto; the solver sizes auto nodes from content and
///   stretches them through `align-items`
pub fn resolve_dimension(dim: &Dimension) -> taffy::style::Dimension {
    match *dim {
        Dimension::Cells(n) => taffy::style::Dimension::from_length(n),
        Dimension::Percent(p) => taffy::style::Dimension::from_percent(p / 100.0),
        Dimension::Auto | Dimension::MaxContent | Dimension::FitContent | Dimension::Stretch => {
            taffy::style::Dimension::AUTO
        }
    }
}

/// Convert a [`Length`] for contexts that do not allow auto (padding, gap).
pub fn resolve_length(length: &Length) -> LengthPercentage {
    match *length {
        Length::Cells(n) => LengthPercentage::from_length(n),
        Length::Percent(p) => LengthPercentage::from_percent(p / 100.0),
    }
}

/// Convert a [`Length`] for contexts that allow auto (margin).
fn resolve_length_auto(length: &Length) -> LengthPercentageAuto {
    match *length {
        Length::Cells(n) => LengthPercentageAuto::from_length(n),
        Length::Percent(p) => LengthPercentageAuto::from_percent(p / 100.0),
    }
}

fn resolve_inset(inset: Option<&Dimension>) -> LengthPercentageAuto {
    match inset {
        Some(Dimension::Cells(n)) => LengthPercentageAuto::from_length(*n),
        Some(Dimension::Percent(p)) => LengthPercentageAuto::from_percent(*p / 100.0),
        _ => LengthPercentageAuto::AUTO,
    }
}

fn resolve_edges(edges: &Edges) -> Rect<LengthPercentage> {
    Rect {
        top: resolve_length(&edges.top),
        right: resolve_length(&edges.right),
        bottom: resolve_length(&edges.bottom),
        left: resolve_length(&edges.left),
    }
}

fn resolve_edges_auto(edges: &Edges) -> Rect<LengthPercentageAuto> {
    Rect {
        top: resolve_length_auto(&edges.top),
        right: resolve_length_auto(&edges.right),
        bottom: resolve_length_auto(&edges.bottom),
        left: resolve_length_auto(&edges.left),
    }
}

fn resolve_align(align: Align) -> AlignItems {
    match align {
        Align::Start => AlignItems::FlexStart,
        Align::Center => AlignItems::Center,
        Align::End => AlignItems::FlexEnd,
        Align::Stretch => AlignItems::Stretch,
        Align::Baseline => AlignItems::Baseline,
    }
}

fn resolve_align_content(align: Align) -> AlignContent {
    match align {
        Align::Start | Align::Baseline => AlignContent::FlexStart,
        Align::Center => AlignContent::Center,
        Align::End => AlignContent::FlexEnd,
        Align::Stretch => AlignContent::Stretch,
    }
}

fn resolve_justify(justify: Justify) -> JustifyContent {
    match justify {
        Justify::Start => JustifyContent::FlexStart,
        Justify::Center => JustifyContent::Center,
        Justify::End => JustifyContent::FlexEnd,
        Justify::SpaceBetween => JustifyContent::SpaceBetween,
        Justify::SpaceAround => JustifyContent::SpaceAround,
        Justify::SpaceEvenly => JustifyContent::SpaceEvenly,
    }
}

fn resolve_overflow(overflow: Overflow) -> taffy::style::Overflow {
    match overflow {
        Overflow::Visible => taffy::style::Overflow::Visible,
        Overflow::Hidden => taffy::style::Overflow::Hidden,
        Overflow::Scroll => taffy::style::Overflow::Scroll,
    }
}

/// Convert a full [`LayoutStyle`] into a [`taffy::Style`].
///
/// Mapping summary:
/// - `display: none` -> `Display::None`, otherwise flex
/// - `flexDirection` (with `direction: rtl` applied) -> `flex_direction`
/// - `width/height`, `min*`, `max*` -> `size`, `min_size`, `max_size`
/// - `padding`, `margin`, `gap` -> the matching taffy rects
/// - `position: absolute` with `left/top/right/bottom` -> `inset`
/// - `border` -> 1 cell border on each side
pub fn resolve_style(style: &LayoutStyle) -> taffy::Style {
    let mut out = taffy::Style {
        display: if style.display_none { Display::None } else { Display::Flex },
        ..taffy::Style::default()
    };

    out.flex_direction = match style.effective_direction() {
        FlexDirection::Row => taffy::style::FlexDirection::Row,
        FlexDirection::Column => taffy::style::FlexDirection::Column,
        FlexDirection::RowReverse => taffy::style::FlexDirection::RowReverse,
        FlexDirection::ColumnReverse => taffy::style::FlexDirection::ColumnReverse,
    };
    out.flex_wrap = if style.wrap { FlexWrap::Wrap } else { FlexWrap::NoWrap };
    out.flex_grow = style.grow;
    out.flex_shrink = style.shrink;
    out.flex_basis = resolve_dimension(&style.basis);

    out.size = Size {
        width: resolve_dimension(&style.width),
        height: resolve_dimension(&style.height),
    };
    out.min_size = Size {
        width: resolve_dimension(&style.min_width),
        height: resolve_dimension(&style.min_height),
    };
    out.max_size = Size {
        width: resolve_dimension(&style.max_width),
        height: resolve_dimension(&style.max_height),
    };

    out.margin = resolve_edges_auto(&style.margin);
    out.padding = resolve_edges(&style.padding);
    let gap = resolve_length(&style.gap);
    out.gap = Size { width: gap, height: gap };

    out.justify_content = Some(resolve_justify(style.justify));
    out.align_items = Some(resolve_align(style.align_items));
    out.align_self = style.align_self.map(resolve_align);
    out.align_content = style.align_content.map(resolve_align_content);

    if style.position == Position::Absolute {
        out.position = taffy::style::Position::Absolute;
        out.inset = Rect {
            left: resolve_inset(style.inset_left.as_ref()),
            top: resolve_inset(style.inset_top.as_ref()),
            right: resolve_inset(style.inset_right.as_ref()),
            bottom: resolve_inset(style.inset_bottom.as_ref()),
        };
    }

    let overflow = resolve_overflow(style.overflow);
    out.overflow = Point { x: overflow, y: overflow };

    if style.border {
        let one = LengthPercentage::from_length(1.0);
        out.border = Rect { top: one, right: one, bottom: one, left: one };
    } else {
        out.border = Rect {
            top: LengthPercentage::ZERO,
            right: LengthPercentage::ZERO,
            bottom: LengthPercentage::ZERO,
            left: LengthPercentage::ZERO,
        };
    }

    out
}
