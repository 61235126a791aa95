//! Painting the widget tree into a frame.
//!
//! Widgets paint in tree pre-order, so later siblings and descendants land
//! on top. Each widget fills its background, draws its border, then its
//! rendered text inside the content box. Descendants are clipped to the
//! inside of every ancestor border.

use tracing::trace;

use super::compositor::Compositor;
use super::strip::{CellStyle, Strip};
use crate::geometry::{Region, Spacing};
use crate::widget::{BorderStyle, WidgetId, WidgetTree};

const TOP_LEFT: char = '┌';
const TOP_RIGHT: char = '┐';
const BOTTOM_LEFT: char = '└';
const BOTTOM_RIGHT: char = '┘';
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

/// Paint the displayed, placed widgets below `root`. Returns how many
/// widgets were painted.
pub fn paint_tree(widgets: &WidgetTree, root: WidgetId, frame: &mut Compositor) -> usize {
    let mut painted = 0;
    let mut stack = vec![(root, frame.bounds(), CellStyle::new())];
    while let Some((id, clip, inherited)) = stack.pop() {
        let Some(element) = widgets.get(id) else {
            continue;
        };
        let widget = &element.widget;
        let common = &widget.common;
        if !widget.is_displayed() || !common.placed || common.style.is_invisible() {
            continue;
        }
        let region = Region::new(common.left, common.top, common.width, common.height);
        let style = CellStyle::from_widget_style(&common.style).over(&inherited);

        if common.style.bg.is_some() {
            frame.fill_region(&region, &style);
        }
        let mut inner_clip = clip.intersection(region);
        if let Some(BorderStyle::Line { fg }) = &common.style.border {
            paint_border(frame, region, clip, &style.with_fg(fg.clone().or_else(|| style.fg.clone())));
            inner_clip = inner_clip.intersection(region.shrink(Spacing::all(1)));
        }

        let content = region.shrink(common.inset);
        let text_clip = inner_clip.intersection(content);
        for (row, line) in widget.rendered.lines().enumerate() {
            let strip = Strip::text(content.x, content.y + row as i32, line, &style);
            frame.place(&strip, &text_clip);
        }
        painted += 1;

        if inner_clip.is_empty() {
            continue;
        }
        let background = CellStyle { bg: style.bg.clone(), ..CellStyle::new() };
        for &child in element.children.iter().rev() {
            stack.push((child, inner_clip, background.clone()));
        }
    }
    trace!(painted, "tree painted");
    painted
}

fn paint_border(frame: &mut Compositor, region: Region, clip: Region, style: &CellStyle) {
    if region.width < 2 || region.height < 2 {
        return;
    }
    let inner = region.width - 2;
    let mut top = Strip::new(region.x, region.y);
    top.push(TOP_LEFT, style.clone());
    top.cells.extend(Strip::repeat(0, 0, HORIZONTAL, inner, style).cells);
    top.push(TOP_RIGHT, style.clone());
    let mut bottom = Strip::new(region.x, region.bottom() - 1);
    bottom.push(BOTTOM_LEFT, style.clone());
    bottom.cells.extend(Strip::repeat(0, 0, HORIZONTAL, inner, style).cells);
    bottom.push(BOTTOM_RIGHT, style.clone());
    frame.place(&top, &clip);
    frame.place(&bottom, &clip);
    for y in region.y + 1..region.bottom() - 1 {
        frame.place(&Strip::text(region.x, y, &VERTICAL.to_string(), style), &clip);
        frame.place(&Strip::text(region.right() - 1, y, &VERTICAL.to_string(), style), &clip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::widget::{TerminalElement, Widget, WidgetKind};
    use pretty_assertions::assert_eq;
    use slotmap::SlotMap;

    struct Scene {
        nodes: SlotMap<NodeId, ()>,
        widgets: WidgetTree,
    }

    impl Scene {
        fn new() -> Self {
            Self { nodes: SlotMap::with_key(), widgets: WidgetTree::new() }
        }

        fn add(&mut self, parent: Option<WidgetId>, region: Region, text: &str, border: bool) -> WidgetId {
            let mut widget = Widget::new(WidgetKind::Box);
            widget.rendered = text.to_owned();
            let common = &mut widget.common;
            common.left = region.x;
            common.top = region.y;
            common.width = region.width;
            common.height = region.height;
            common.placed = true;
            if border {
                common.style.border = Some(BorderStyle::Line { fg: None });
                common.inset = Spacing::all(1);
            }
            let node = self.nodes.insert(());
            let id = self.widgets.insert(TerminalElement::new(node, widget, Default::default()));
            if let Some(parent) = parent {
                let index = self.widgets.children(parent).len();
                self.widgets.link(parent, id, index);
            }
            id
        }
    }

    // ── Text and borders ─────────────────────────────────────────────

    #[test]
    fn bordered_box_with_text() {
        let mut scene = Scene::new();
        let root = scene.add(None, Region::new(0, 0, 8, 3), "hi", true);
        let mut frame = Compositor::new(8, 3);
        assert_eq!(paint_tree(&scene.widgets, root, &mut frame), 1);
        insta::assert_snapshot!(frame.to_string(), @r"
        ┌──────┐
        │hi    │
        └──────┘
        ");
    }

    #[test]
    fn child_text_is_clipped_by_parent_border() {
        let mut scene = Scene::new();
        let root = scene.add(None, Region::new(0, 0, 6, 3), "", true);
        scene.add(Some(root), Region::new(1, 1, 10, 1), "overflowing", false);
        let mut frame = Compositor::new(10, 3);
        paint_tree(&scene.widgets, root, &mut frame);
        assert_eq!(frame.row_text(1), "│over│");
    }

    #[test]
    fn later_sibling_paints_on_top() {
        let mut scene = Scene::new();
        let root = scene.add(None, Region::new(0, 0, 6, 1), "", false);
        scene.add(Some(root), Region::new(0, 0, 6, 1), "aaaaaa", false);
        scene.add(Some(root), Region::new(2, 0, 2, 1), "bb", false);
        let mut frame = Compositor::new(6, 1);
        paint_tree(&scene.widgets, root, &mut frame);
        assert_eq!(frame.row_text(0), "aabbaa");
    }

    // ── Skipped widgets ──────────────────────────────────────────────

    #[test]
    fn hidden_and_unplaced_widgets_are_skipped() {
        let mut scene = Scene::new();
        let root = scene.add(None, Region::new(0, 0, 6, 2), "", false);
        let hidden = scene.add(Some(root), Region::new(0, 0, 6, 1), "hidden", false);
        let unplaced = scene.add(Some(root), Region::new(0, 1, 6, 1), "nope", false);
        if let Some(e) = scene.widgets.get_mut(hidden) {
            e.widget.common.hidden = true;
        }
        if let Some(e) = scene.widgets.get_mut(unplaced) {
            e.widget.common.placed = false;
        }
        let mut frame = Compositor::new(6, 2);
        assert_eq!(paint_tree(&scene.widgets, root, &mut frame), 1);
        assert_eq!(frame.to_string(), "\n\n");
    }

    #[test]
    fn background_is_inherited_by_text() {
        let mut scene = Scene::new();
        let root = scene.add(None, Region::new(0, 0, 4, 1), "", false);
        if let Some(e) = scene.widgets.get_mut(root) {
            e.widget.common.style.bg = Some("blue".into());
        }
        scene.add(Some(root), Region::new(0, 0, 4, 1), "ab", false);
        let mut frame = Compositor::new(4, 1);
        paint_tree(&scene.widgets, root, &mut frame);
        let cell = frame.get_cell(0, 0).map(|c| (c.ch, c.style.bg.clone()));
        assert_eq!(cell, Some(('a', Some("blue".to_string()))));
    }
}
