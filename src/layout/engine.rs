//! TaffyTree-backed layout strategy.
//!
//! [`SolverStrategy`] mirrors the part of the layout tree it owns into a
//! taffy tree, runs the solver once per domain root, and reads results
//! back as absolute [`Region`]s. Taffy nodes are cached per DOM node across
//! passes; nodes that left the tree are released at the start of a pass.

use std::collections::{HashMap, HashSet};

use taffy::geometry::{Rect, Size};
use taffy::prelude::{AvailableSpace, FromLength, NodeId as TaffyNodeId, TaffyAuto, TaffyTree, TaffyZero};
use taffy::style::{Dimension as TaffyDimension, LengthPercentageAuto};

use super::resolve::resolve_style;
use super::style::{Position, StrategyKind};
use super::{LayoutBox, LayoutOutput, LayoutStrategy, LayoutTree};
use crate::dom::NodeId;
use crate::error::LayoutError;
use crate::geometry::Region;

/// Measured content size attached to leaf taffy nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureContext {
    pub width: f32,
    pub height: f32,
}

/// Wraps a [`TaffyTree`] and maintains a mapping from DOM [`NodeId`]s to
/// taffy node ids.
pub struct SolverStrategy {
    tree: TaffyTree<MeasureContext>,
    node_map: HashMap<NodeId, TaffyNodeId>,
}

impl SolverStrategy {
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            node_map: HashMap::new(),
        }
    }

    /// Number of cached solver nodes.
    pub fn cached_nodes(&self) -> usize {
        self.node_map.len()
    }

    /// Create or update the taffy node for one layout box.
    fn sync_node(
        &mut self,
        tree: &LayoutTree,
        index: usize,
        domain_root: Option<Region>,
        parent_is_row: Option<bool>,
    ) -> Result<TaffyNodeId, LayoutError> {
        let layout_box = &tree.boxes[index];
        let mut style = resolve_style(&layout_box.style);
        if parent_is_row.is_some_and(|is_row| grows_by_default(layout_box, is_row)) {
            style.flex_grow = 1.0;
        }
        if let Some(rect) = domain_root {
            // The domain root was already placed by its parent.
            style.size = Size {
                width: TaffyDimension::from_length(rect.width as f32),
                height: TaffyDimension::from_length(rect.height as f32),
            };
            style.min_size = Size { width: TaffyDimension::AUTO, height: TaffyDimension::AUTO };
            style.max_size = Size { width: TaffyDimension::AUTO, height: TaffyDimension::AUTO };
            style.position = taffy::style::Position::Relative;
            style.margin = Rect {
                left: LengthPercentageAuto::ZERO,
                right: LengthPercentageAuto::ZERO,
                top: LengthPercentageAuto::ZERO,
                bottom: LengthPercentageAuto::ZERO,
            };
        }
        let context = layout_box.children.is_empty().then_some(MeasureContext {
            width: layout_box.intrinsic.width as f32,
            height: layout_box.intrinsic.height as f32,
        });

        match self.node_map.get(&layout_box.node) {
            Some(&id) => {
                self.tree.set_style(id, style)?;
                self.tree.set_node_context(id, context)?;
                Ok(id)
            }
            None => {
                let id = match context {
                    Some(ctx) => self.tree.new_leaf_with_context(style, ctx)?,
                    None => self.tree.new_leaf(style)?,
                };
                self.node_map.insert(layout_box.node, id);
                Ok(id)
            }
        }
    }
}

/// An unsized leaf with no content shares the free main-axis space, as it
/// does under the flex strategy.
fn grows_by_default(layout_box: &LayoutBox, is_row: bool) -> bool {
    let style = &layout_box.style;
    let (main, intrinsic) = if is_row {
        (style.width, layout_box.intrinsic.width)
    } else {
        (style.height, layout_box.intrinsic.height)
    };
    layout_box.children.is_empty()
        && style.position != Position::Absolute
        && style.grow <= 0.0
        && style.basis.is_auto()
        && main.is_auto()
        && intrinsic == 0
}

impl Default for SolverStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStrategy for SolverStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Solver
    }

    fn begin_pass(&mut self, live: &HashSet<NodeId>) {
        let stale: Vec<NodeId> = self.node_map.keys().filter(|k| !live.contains(k)).copied().collect();
        for key in stale {
            if let Some(taffy_id) = self.node_map.remove(&key) {
                let _ = self.tree.remove(taffy_id);
            }
        }
    }

    fn layout(&mut self, tree: &LayoutTree, container: usize, rect: Region) -> Result<LayoutOutput, LayoutError> {
        // Domain: the container plus descendants laid out by this strategy.
        // Children of a node owned by another strategy are not mirrored.
        // (box, main axis of its parent is horizontal)
        let mut order: Vec<(usize, Option<bool>)> = Vec::new();
        let mut stack = vec![(container, None)];
        while let Some((index, parent_is_row)) = stack.pop() {
            order.push((index, parent_is_row));
            let layout_box = &tree.boxes[index];
            if index == container || layout_box.strategy == StrategyKind::Solver {
                let is_row = layout_box.style.effective_direction().is_row();
                stack.extend(layout_box.children.iter().rev().map(|&c| (c, Some(is_row))));
            }
        }

        let mut taffy_ids = HashMap::with_capacity(order.len());
        for &(index, parent_is_row) in &order {
            let root_rect = (index == container).then_some(rect);
            let id = self.sync_node(tree, index, root_rect, parent_is_row)?;
            taffy_ids.insert(index, id);
        }
        for &(index, _) in &order {
            let owns_children = index == container || tree.boxes[index].strategy == StrategyKind::Solver;
            let children: Vec<TaffyNodeId> = if owns_children {
                tree.boxes[index]
                    .children
                    .iter()
                    .filter_map(|c| taffy_ids.get(c).copied())
                    .collect()
            } else {
                Vec::new()
            };
            if let Some(&id) = taffy_ids.get(&index) {
                self.tree.set_children(id, &children)?;
            }
        }

        let Some(&root_id) = taffy_ids.get(&container) else {
            return Ok(LayoutOutput::default());
        };
        self.tree.compute_layout_with_measure(
            root_id,
            Size {
                width: AvailableSpace::Definite(rect.width as f32),
                height: AvailableSpace::Definite(rect.height as f32),
            },
            |known: Size<Option<f32>>,
             _available: Size<AvailableSpace>,
             _id: TaffyNodeId,
             context: Option<&mut MeasureContext>,
             _style: &taffy::Style| {
                let intrinsic = context.map(|c| *c).unwrap_or(MeasureContext { width: 0.0, height: 0.0 });
                Size {
                    width: known.width.unwrap_or(intrinsic.width),
                    height: known.height.unwrap_or(intrinsic.height),
                }
            },
        )?;

        // Walk the solver tree accumulating absolute offsets.
        let mut output = LayoutOutput::default();
        let mut stack = vec![(container, rect.x, rect.y)];
        while let Some((index, origin_x, origin_y)) = stack.pop() {
            let layout_box = &tree.boxes[index];
            let owns_children = index == container || layout_box.strategy == StrategyKind::Solver;
            if !owns_children || layout_box.children.is_empty() {
                continue;
            }
            let Some(&id) = taffy_ids.get(&index) else {
                continue;
            };
            let layout = self.tree.layout(id)?;
            let content_w = layout.size.width
                - layout.padding.left
                - layout.padding.right
                - layout.border.left
                - layout.border.right;
            let content_h = layout.size.height
                - layout.padding.top
                - layout.padding.bottom
                - layout.border.top
                - layout.border.bottom;
            if content_w <= 0.0 || content_h <= 0.0 {
                output.skipped.push(layout_box.node);
                continue;
            }
            for &child in &layout_box.children {
                let Some(&child_id) = taffy_ids.get(&child) else {
                    continue;
                };
                let child_layout = self.tree.layout(child_id)?;
                let x = origin_x + child_layout.location.x.round() as i32;
                let y = origin_y + child_layout.location.y.round() as i32;
                let region = Region::new(
                    x,
                    y,
                    child_layout.size.width.round() as i32,
                    child_layout.size.height.round() as i32,
                );
                output.placed.push((child, region));
                stack.push((child, x, y));
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size as CellSize;
    use crate::layout::style::{FlexDirection, LayoutStyle};
    use crate::layout::value::Dimension;
    use crate::layout::LayoutBox;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn layout_box(node: NodeId, style: LayoutStyle, children: Vec<usize>) -> LayoutBox {
        LayoutBox {
            node,
            style,
            intrinsic: CellSize::ZERO,
            children,
            strategy: StrategyKind::Solver,
        }
    }

    fn find(output: &LayoutOutput, index: usize) -> Region {
        output.placed.iter().find(|(i, _)| *i == index).map(|(_, r)| *r).unwrap()
    }

    #[test]
    fn column_stack_of_fixed_heights() {
        let n = ids(3);
        let row_h = |h: f32| LayoutStyle { height: Dimension::Cells(h), ..LayoutStyle::default() };
        let tree = LayoutTree {
            boxes: vec![
                layout_box(n[0], LayoutStyle::default(), vec![1, 2]),
                layout_box(n[1], row_h(2.0), vec![]),
                layout_box(n[2], row_h(3.0), vec![]),
            ],
        };
        let mut solver = SolverStrategy::new();
        let out = solver.layout(&tree, 0, Region::new(0, 0, 20, 10)).unwrap();
        assert_eq!(find(&out, 1), Region::new(0, 0, 20, 2));
        assert_eq!(find(&out, 2), Region::new(0, 2, 20, 3));
        assert_eq!(solver.cached_nodes(), 3);
    }

    #[test]
    fn offsets_are_absolute() {
        let n = ids(2);
        let tree = LayoutTree {
            boxes: vec![
                layout_box(n[0], LayoutStyle::default(), vec![1]),
                layout_box(n[1], LayoutStyle { height: Dimension::Cells(1.0), ..LayoutStyle::default() }, vec![]),
            ],
        };
        let mut solver = SolverStrategy::new();
        let out = solver.layout(&tree, 0, Region::new(5, 2, 10, 3)).unwrap();
        assert_eq!(find(&out, 1), Region::new(5, 2, 10, 1));
    }

    #[test]
    fn text_leaves_measure_to_content() {
        let n = ids(2);
        let mut leaf = layout_box(n[1], LayoutStyle::default(), vec![]);
        leaf.intrinsic = CellSize::new(5, 2);
        let row = LayoutStyle {
            direction: FlexDirection::Row,
            align_items: crate::layout::style::Align::Start,
            ..LayoutStyle::default()
        };
        let tree = LayoutTree { boxes: vec![layout_box(n[0], row, vec![1]), leaf] };
        let mut solver = SolverStrategy::new();
        let out = solver.layout(&tree, 0, Region::new(0, 0, 40, 10)).unwrap();
        assert_eq!(find(&out, 1), Region::new(0, 0, 5, 2));
    }

    #[test]
    fn empty_leaves_share_a_row() {
        let n = ids(4);
        let row = LayoutStyle { direction: FlexDirection::Row, ..LayoutStyle::default() };
        let tree = LayoutTree {
            boxes: vec![
                layout_box(n[0], row, vec![1, 2, 3]),
                layout_box(n[1], LayoutStyle::default(), vec![]),
                layout_box(n[2], LayoutStyle::default(), vec![]),
                layout_box(n[3], LayoutStyle::default(), vec![]),
            ],
        };
        let mut solver = SolverStrategy::new();
        let out = solver.layout(&tree, 0, Region::new(0, 0, 100, 3)).unwrap();
        let widths: Vec<i32> = (1..4).map(|i| find(&out, i).width).collect();
        assert_eq!(widths.iter().sum::<i32>(), 100);
        assert!(widths.iter().all(|&w| w == 33 || w == 34), "{widths:?}");
    }

    #[test]
    fn zero_content_area_skips_children() {
        let n = ids(2);
        let padded = LayoutStyle {
            padding: crate::layout::value::Edges::all(crate::layout::value::Length::Cells(5.0)),
            ..LayoutStyle::default()
        };
        let tree = LayoutTree {
            boxes: vec![layout_box(n[0], padded, vec![1]), layout_box(n[1], LayoutStyle::default(), vec![])],
        };
        let mut solver = SolverStrategy::new();
        let out = solver.layout(&tree, 0, Region::new(0, 0, 6, 6)).unwrap();
        assert!(out.placed.is_empty());
        assert_eq!(out.skipped, vec![n[0]]);
    }

    #[test]
    fn begin_pass_releases_stale_nodes() {
        let n = ids(2);
        let tree = LayoutTree {
            boxes: vec![
                layout_box(n[0], LayoutStyle::default(), vec![1]),
                layout_box(n[1], LayoutStyle::default(), vec![]),
            ],
        };
        let mut solver = SolverStrategy::new();
        solver.layout(&tree, 0, Region::new(0, 0, 10, 10)).unwrap();
        assert_eq!(solver.cached_nodes(), 2);
        solver.begin_pass(&HashSet::from([n[0]]));
        assert_eq!(solver.cached_nodes(), 1);
    }

    #[test]
    fn nodes_are_reused_across_passes() {
        let n = ids(2);
        let tree = LayoutTree {
            boxes: vec![
                layout_box(n[0], LayoutStyle::default(), vec![1]),
                layout_box(n[1], LayoutStyle::default(), vec![]),
            ],
        };
        let mut solver = SolverStrategy::new();
        solver.layout(&tree, 0, Region::new(0, 0, 10, 10)).unwrap();
        let first = solver.node_map[&n[1]];
        solver.layout(&tree, 0, Region::new(0, 0, 12, 10)).unwrap();
        assert_eq!(solver.node_map[&n[1]], first);
    }
}
