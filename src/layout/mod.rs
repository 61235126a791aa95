//! Layout engine bridge: layout properties, two interchangeable strategies
//! (taffy solver and analytic flex), and the pass that writes absolute
//! geometry back onto widgets.

pub mod engine;
pub mod flex;
pub mod resolve;
pub mod style;
pub mod value;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::dom::{Document, NodeId};
use crate::error::LayoutError;
use crate::geometry::{Region, Size};
use crate::widget::{WidgetId, WidgetTree};

pub use engine::SolverStrategy;
pub use flex::FlexStrategy;
pub use style::{LayoutStyle, StrategyKind};
pub use value::Dimension;

/// One displayed element, as seen by a layout strategy.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub node: NodeId,
    pub style: LayoutStyle,
    /// Measured content size (text), excluding padding and border.
    pub intrinsic: Size,
    /// Indices into [`LayoutTree::boxes`], in DOM order.
    pub children: Vec<usize>,
    /// Strategy that lays out this box's children.
    pub strategy: StrategyKind,
}

/// Snapshot of the displayed widget tree for one layout pass. Index 0 is the
/// root.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    pub boxes: Vec<LayoutBox>,
}

/// Result of laying out one container's domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutOutput {
    /// Absolute regions, indexed into the layout tree.
    pub placed: Vec<(usize, Region)>,
    /// Containers whose children were not laid out for lack of space.
    pub skipped: Vec<NodeId>,
}

/// A layout backend.
///
/// `layout` places every descendant of `container` that this strategy owns:
/// the container's children, and recursively the children of every
/// descendant whose [`LayoutBox::strategy`] is this strategy. Descendants
/// owned by another strategy get a region but their children are left to
/// the bridge.
pub trait LayoutStrategy {
    fn kind(&self) -> StrategyKind;

    /// Called once per pass with every node in the layout tree.
    fn begin_pass(&mut self, live: &HashSet<NodeId>);

    fn layout(&mut self, tree: &LayoutTree, container: usize, rect: Region) -> Result<LayoutOutput, LayoutError>;
}

/// Summary of one layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub placed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Width of the longest line and the line count of `text`.
pub fn measure_text(text: &str) -> Size {
    if text.is_empty() {
        return Size::ZERO;
    }
    let (width, height) = text
        .lines()
        .fold((0usize, 0usize), |(w, h), line| (w.max(line.chars().count()), h + 1));
    Size::new(width as i32, height.max(1) as i32)
}

/// Owns both strategies and runs layout passes over the widget tree.
#[derive(Default)]
pub struct LayoutBridge {
    solver: SolverStrategy,
    flex: FlexStrategy,
}

impl LayoutBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the displayed part of the widget tree below `root`.
    pub fn build_tree(document: &Document, widgets: &WidgetTree, root: WidgetId) -> LayoutTree {
        let mut tree = LayoutTree::default();
        if widgets.get(root).is_none() {
            return tree;
        }
        // (widget, parent box index, inherited strategy)
        let mut stack: Vec<(WidgetId, Option<usize>, StrategyKind)> = vec![(root, None, StrategyKind::Solver)];
        while let Some((id, parent, inherited)) = stack.pop() {
            let Some(element) = widgets.get(id) else {
                continue;
            };
            if !element.widget.is_displayed() {
                continue;
            }
            let Some(data) = document.element(element.node) else {
                continue;
            };
            let style = LayoutStyle::from_attributes(&data.attributes, element.widget.common.style.has_border());
            let strategy = style.strategy.unwrap_or(inherited);
            let index = tree.boxes.len();
            tree.boxes.push(LayoutBox {
                node: element.node,
                style,
                intrinsic: measure_text(&element.widget.rendered),
                children: Vec::new(),
                strategy,
            });
            if let Some(parent) = parent {
                tree.boxes[parent].children.push(index);
            }
            for &child in element.children.iter().rev() {
                stack.push((child, Some(index), strategy));
            }
        }
        tree
    }

    /// Compute geometry for the tree below `root` in a `width` x `height`
    /// viewport and write absolute regions onto each widget.
    ///
    /// Strategy errors and exhausted containers are logged; the affected
    /// subtrees keep the geometry of the previous pass.
    pub fn apply_layout(
        &mut self,
        document: &Document,
        widgets: &mut WidgetTree,
        root: WidgetId,
        width: i32,
        height: i32,
    ) -> LayoutReport {
        let tree = Self::build_tree(document, widgets, root);
        let mut report = LayoutReport::default();
        if tree.boxes.is_empty() {
            return report;
        }

        let live: HashSet<NodeId> = tree.boxes.iter().map(|b| b.node).collect();
        self.solver.begin_pass(&live);
        self.flex.begin_pass(&live);

        let mut regions: Vec<Option<Region>> = vec![None; tree.boxes.len()];
        let viewport = Region::new(0, 0, width.max(0), height.max(0));
        regions[0] = Some(viewport);

        let mut pending = vec![(0usize, viewport)];
        while let Some((container, rect)) = pending.pop() {
            let kind = tree.boxes[container].strategy;
            let strategy: &mut dyn LayoutStrategy = match kind {
                StrategyKind::Solver => &mut self.solver,
                StrategyKind::Flex => &mut self.flex,
            };
            match strategy.layout(&tree, container, rect) {
                Ok(output) => {
                    report.skipped += output.skipped.len();
                    for (index, region) in output.placed {
                        regions[index] = Some(region);
                        let placed = &tree.boxes[index];
                        if placed.strategy != kind && !placed.children.is_empty() {
                            pending.push((index, region));
                        }
                    }
                }
                Err(err) => {
                    warn!(node = ?tree.boxes[container].node, error = %err, "layout failed, keeping previous geometry");
                    report.failed += 1;
                }
            }
        }

        for (layout_box, region) in tree.boxes.iter().zip(regions) {
            let Some(region) = region else {
                continue;
            };
            let Some(widget_id) = document.element(layout_box.node).and_then(|e| e.widget) else {
                continue;
            };
            if let Some(element) = widgets.get_mut(widget_id) {
                let common = &mut element.widget.common;
                common.left = region.x;
                common.top = region.y;
                common.width = region.width;
                common.height = region.height;
                common.inset = flex::inner_spacing(&layout_box.style, region.width);
                common.placed = true;
                report.placed += 1;
            }
        }
        debug!(placed = report.placed, skipped = report.skipped, "layout pass complete");
        report
    }
}

/// Region last written onto a widget, if layout ever placed it.
pub fn widget_region(widgets: &WidgetTree, id: WidgetId) -> Option<Region> {
    let common = &widgets.get(id)?.widget.common;
    common
        .placed
        .then(|| Region::new(common.left, common.top, common.width, common.height))
}
