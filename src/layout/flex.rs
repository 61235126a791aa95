//! Analytic flex layout: row/column distribution without an external solver.
//!
//! Items whose main size is fixed (cells, percentage, content keywords, or
//! measured text) keep it; the remaining space is shared between flexible
//! items by weight. Integer cells throughout: percentages floor, and the
//! cells left over after flooring go one each to the first flexible items,
//! so a line always sums to the available space.

use std::collections::HashSet;

use tracing::debug;

use super::style::{Align, Justify, LayoutStyle, Position, StrategyKind};
use super::value::Dimension;
use super::{LayoutOutput, LayoutStrategy, LayoutTree};
use crate::dom::NodeId;
use crate::error::LayoutError;
use crate::geometry::{Region, Spacing};

/// Stateless analytic strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlexStrategy;

impl FlexStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutStrategy for FlexStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Flex
    }

    fn begin_pass(&mut self, _live: &HashSet<NodeId>) {}

    fn layout(&mut self, tree: &LayoutTree, container: usize, rect: Region) -> Result<LayoutOutput, LayoutError> {
        let mut output = LayoutOutput::default();
        layout_children(tree, container, rect, &mut output);
        Ok(output)
    }
}

/// Border plus padding of a box, in cells.
pub fn inner_spacing(style: &LayoutStyle, width: i32) -> Spacing {
    let border = if style.border { Spacing::all(1) } else { Spacing::ZERO };
    style.padding.resolve(width) + border
}

/// One item on a flex line, in main/cross terms.
struct Item {
    index: usize,
    main: i32,
    cross: i32,
    /// Flex weight; zero for fixed items.
    weight: f32,
    margin_before: i32,
    margin_after: i32,
    margin_cross_before: i32,
    margin_cross_after: i32,
    stretch: bool,
    align: Align,
}

fn layout_children(tree: &LayoutTree, container: usize, rect: Region, out: &mut LayoutOutput) {
    let parent = &tree.boxes[container];
    if parent.children.is_empty() {
        return;
    }
    let style = &parent.style;
    let spacing = inner_spacing(style, rect.width);
    let content_w = rect.width - spacing.width();
    let content_h = rect.height - spacing.height();
    if content_w <= 0 || content_h <= 0 {
        debug!(node = ?parent.node, content_w, content_h, "no space for children, keeping previous geometry");
        out.skipped.push(parent.node);
        return;
    }
    let content = Region::new(rect.x + spacing.left, rect.y + spacing.top, content_w, content_h);

    let direction = style.effective_direction();
    let is_row = direction.is_row();
    let main_size = if is_row { content_w } else { content_h };
    let cross_size = if is_row { content_h } else { content_w };
    let gap = style.gap.resolve(main_size).max(0);

    let (flow, absolute): (Vec<usize>, Vec<usize>) = parent
        .children
        .iter()
        .copied()
        .partition(|&c| tree.boxes[c].style.position != Position::Absolute);

    // Step 1: measure items and break them into lines.
    let items: Vec<Item> = flow
        .iter()
        .map(|&c| measure_item(tree, c, style, is_row, main_size, cross_size, content_w))
        .collect();
    let lines = break_lines(&items, style.wrap, main_size, gap);
    let line_cross = cross_size / lines.len().max(1) as i32;

    // Step 2: distribute free space per line, then position.
    let mut placed: Vec<(usize, Region)> = Vec::with_capacity(items.len());
    for (line_index, line) in lines.iter().enumerate() {
        let line_items = &items[line.clone()];
        let fixed: i32 = line_items
            .iter()
            .map(|i| i.margin_before + i.margin_after + if i.weight > 0.0 { 0 } else { i.main })
            .sum::<i32>()
            + gap * (line_items.len() as i32 - 1).max(0);
        let free = main_size - fixed;
        let total_weight: f32 = line_items.iter().map(|i| i.weight).sum();
        if free < 0 || (free == 0 && total_weight > 0.0) {
            debug!(node = ?parent.node, free, "fixed items exhaust the container, keeping previous geometry");
            out.skipped.push(parent.node);
            return;
        }

        let mains = distribute(line_items, free, total_weight, tree, main_size, is_row);
        let used: i32 = mains.iter().sum::<i32>()
            + line_items.iter().map(|i| i.margin_before + i.margin_after).sum::<i32>()
            + gap * (line_items.len() as i32 - 1).max(0);
        let remaining = (main_size - used).max(0);
        let count = line_items.len() as i32;
        let (mut offset, spacing_between, mut extra) = match style.justify {
            Justify::Start => (0, gap, 0),
            Justify::Center => (remaining / 2, gap, 0),
            Justify::End => (remaining, gap, 0),
            Justify::SpaceBetween if count > 1 => (0, gap + remaining / (count - 1), remaining % (count - 1)),
            Justify::SpaceBetween => (0, gap, 0),
            Justify::SpaceAround => {
                let around = remaining / count;
                (around / 2, gap + around, 0)
            }
            Justify::SpaceEvenly => {
                let even = remaining / (count + 1);
                (even, gap + even, 0)
            }
        };

        let cross_origin = line_cross * line_index as i32;
        for (item, &main) in line_items.iter().zip(&mains) {
            let avail_cross = line_cross - item.margin_cross_before - item.margin_cross_after;
            let cross = if item.stretch { avail_cross.max(0) } else { item.cross.min(avail_cross.max(0)) };
            let cross_pos = cross_origin
                + item.margin_cross_before
                + match item.align {
                    Align::Center => (avail_cross - cross).max(0) / 2,
                    Align::End => (avail_cross - cross).max(0),
                    _ => 0,
                };
            let main_pos = offset + item.margin_before;
            let main_pos = if direction.is_reverse() { main_size - main_pos - main } else { main_pos };

            let region = if is_row {
                Region::new(content.x + main_pos, content.y + cross_pos, main, cross)
            } else {
                Region::new(content.x + cross_pos, content.y + main_pos, cross, main)
            };
            placed.push((item.index, region));

            offset += item.margin_before + main + item.margin_after + spacing_between;
            if extra > 0 {
                offset += 1;
                extra -= 1;
            }
        }
    }

    for index in absolute {
        placed.push((index, place_absolute(tree, index, content)));
    }

    for (index, region) in placed {
        out.placed.push((index, region));
        let child = &tree.boxes[index];
        if !child.children.is_empty() && child.strategy == StrategyKind::Flex {
            layout_children(tree, index, region, out);
        }
    }
}

fn measure_item(
    tree: &LayoutTree,
    index: usize,
    parent: &LayoutStyle,
    is_row: bool,
    main_size: i32,
    cross_size: i32,
    content_w: i32,
) -> Item {
    let child = &tree.boxes[index];
    let style = &child.style;
    let spacing = inner_spacing(style, content_w);
    let (intrinsic_main, intrinsic_cross) = if is_row {
        (child.intrinsic.width + spacing.width(), child.intrinsic.height + spacing.height())
    } else {
        (child.intrinsic.height + spacing.height(), child.intrinsic.width + spacing.width())
    };
    let (main_dim, cross_dim) = if is_row { (style.width, style.height) } else { (style.height, style.width) };
    let main_dim = if style.basis.is_auto() { main_dim } else { style.basis };

    let (main, weight) = match main_dim {
        Dimension::Cells(_) | Dimension::Percent(_) => (main_dim.resolve(main_size).unwrap_or(0).max(0), 0.0),
        Dimension::MaxContent | Dimension::FitContent => (intrinsic_main.min(main_size.max(0)), 0.0),
        Dimension::Stretch => (0, style.grow.max(1.0)),
        Dimension::Auto if style.grow > 0.0 => (0, style.grow),
        Dimension::Auto if intrinsic_main > 0 => (intrinsic_main, 0.0),
        Dimension::Auto => (0, 1.0),
    };

    let align = style.align_self.unwrap_or(parent.align_items);
    let (cross, stretch) = match cross_dim {
        Dimension::Cells(_) | Dimension::Percent(_) => (cross_dim.resolve(cross_size).unwrap_or(0).max(0), false),
        Dimension::Stretch => (0, true),
        Dimension::MaxContent | Dimension::FitContent => (intrinsic_cross, false),
        Dimension::Auto => (intrinsic_cross, align == Align::Stretch),
    };

    let margin = style.margin.resolve(content_w);
    let (margin_before, margin_after, margin_cross_before, margin_cross_after) = if is_row {
        (margin.left, margin.right, margin.top, margin.bottom)
    } else {
        (margin.top, margin.bottom, margin.left, margin.right)
    };

    Item {
        index,
        main,
        cross,
        weight,
        margin_before,
        margin_after,
        margin_cross_before,
        margin_cross_after,
        stretch,
        align,
    }
}

/// Split items into lines. Without wrap everything is one line.
fn break_lines(items: &[Item], wrap: bool, main_size: i32, gap: i32) -> Vec<std::ops::Range<usize>> {
    if items.is_empty() {
        return Vec::new();
    }
    if !wrap {
        return vec![0..items.len()];
    }
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (i, item) in items.iter().enumerate() {
        let size = item.main + item.margin_before + item.margin_after;
        if i > start && used + gap + size > main_size {
            lines.push(start..i);
            start = i;
            used = size;
        } else {
            used += if i > start { gap + size } else { size };
        }
    }
    lines.push(start..items.len());
    lines
}

/// Main sizes for one line: fixed items keep theirs, flexible items share
/// `free` by weight. Min/max constraints clamp the result.
fn distribute(
    items: &[Item],
    free: i32,
    total_weight: f32,
    tree: &LayoutTree,
    main_size: i32,
    is_row: bool,
) -> Vec<i32> {
    let mut sizes: Vec<i32> = items
        .iter()
        .map(|item| {
            if item.weight > 0.0 && total_weight > 0.0 {
                (free as f32 * item.weight / total_weight).floor() as i32
            } else {
                item.main
            }
        })
        .collect();

    if total_weight > 0.0 {
        let given: i32 = items
            .iter()
            .zip(&sizes)
            .filter(|(item, _)| item.weight > 0.0)
            .map(|(_, size)| *size)
            .sum();
        let mut leftover = free - given;
        for (item, size) in items.iter().zip(sizes.iter_mut()) {
            if leftover <= 0 {
                break;
            }
            if item.weight > 0.0 {
                *size += 1;
                leftover -= 1;
            }
        }
    }

    for (item, size) in items.iter().zip(sizes.iter_mut()) {
        let style = &tree.boxes[item.index].style;
        let (min, max) = if is_row { (style.min_width, style.max_width) } else { (style.min_height, style.max_height) };
        if let Some(min) = min.resolve(main_size) {
            *size = (*size).max(min);
        }
        if let Some(max) = max.resolve(main_size) {
            if max > 0 {
                *size = (*size).min(max);
            }
        }
        *size = (*size).max(0);
    }
    sizes
}

/// Position an out-of-flow child against the container's content box.
fn place_absolute(tree: &LayoutTree, index: usize, content: Region) -> Region {
    let child = &tree.boxes[index];
    let style = &child.style;
    let spacing = inner_spacing(style, content.width);
    let width = style
        .width
        .resolve(content.width)
        .unwrap_or(child.intrinsic.width + spacing.width())
        .max(0);
    let height = style
        .height
        .resolve(content.height)
        .unwrap_or(child.intrinsic.height + spacing.height())
        .max(0);
    let resolve = |d: Option<Dimension>, parent: i32| d.and_then(|d| d.resolve(parent));
    let x = match (resolve(style.inset_left, content.width), resolve(style.inset_right, content.width)) {
        (Some(left), _) => content.x + left,
        (None, Some(right)) => content.right() - right - width,
        (None, None) => content.x,
    };
    let y = match (resolve(style.inset_top, content.height), resolve(style.inset_bottom, content.height)) {
        (Some(top), _) => content.y + top,
        (None, Some(bottom)) => content.bottom() - bottom - height,
        (None, None) => content.y,
    };
    Region::new(x, y, width, height)
}
