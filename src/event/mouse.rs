//! Mouse routing: hit-testing and the enter/leave/press/release/click state
//! machine.
//!
//! The router decides which node gets which event; delivery to listeners
//! (and bubbling) is the runtime's job.

use tracing::trace;

use super::handlers::EventKind;
use super::hit_grid::{HitGrid, EMPTY};
use super::input::{MouseAction, MouseButton, MouseEvent};
use crate::dom::NodeId;
use crate::geometry::Region;

/// One event the router wants delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseDispatch {
    pub kind: EventKind,
    pub target: NodeId,
    pub event: MouseEvent,
}

/// Hit grid plus hover and press tracking.
#[derive(Debug)]
pub struct MouseRouter {
    grid: HitGrid,
    /// Grid index to node, in paint order.
    targets: Vec<NodeId>,
    hovered: Option<NodeId>,
    pressed: Option<(NodeId, MouseButton)>,
}

impl MouseRouter {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: HitGrid::new(width, height),
            targets: Vec::new(),
            hovered: None,
            pressed: None,
        }
    }

    pub fn grid(&self) -> &HitGrid {
        &self.grid
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.grid.resize(width, height);
    }

    /// Repaint the grid from interactive nodes and their regions, in paint
    /// order (later entries are on top).
    pub fn rebuild(&mut self, targets: impl IntoIterator<Item = (NodeId, Region)>) {
        self.grid.clear();
        self.targets.clear();
        for (node, region) in targets {
            let index = self.targets.len() as i32;
            self.targets.push(node);
            self.grid.fill_rect(region, index);
        }
        trace!(targets = self.targets.len(), "hit grid rebuilt");
    }

    /// Grid index assigned to `node` by the last rebuild.
    pub fn index_of(&self, node: NodeId) -> Option<i32> {
        self.targets.iter().position(|&n| n == node).map(|i| i as i32)
    }

    pub fn hit_test(&self, x: u16, y: u16) -> Option<NodeId> {
        match self.grid.get(x, y) {
            EMPTY => None,
            index => self.targets.get(index as usize).copied(),
        }
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn pressed(&self) -> Option<(NodeId, MouseButton)> {
        self.pressed
    }

    /// Forget an unmounted node so no leave or click is ever sent to it.
    pub fn forget(&mut self, node: NodeId) {
        if self.hovered == Some(node) {
            self.hovered = None;
        }
        if self.pressed.is_some_and(|(n, _)| n == node) {
            self.pressed = None;
        }
        if let Some(i) = self.targets.iter().position(|&n| n == node) {
            // Keep indices stable until the next rebuild; the cell just
            // stops resolving.
            self.grid_forget(i as i32);
        }
    }

    fn grid_forget(&mut self, index: i32) {
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                if self.grid.get(x, y) == index {
                    self.grid.set(x, y, EMPTY);
                }
            }
        }
    }

    /// Route one mouse event. Hover changes come first (leave, then enter),
    /// then the action itself.
    pub fn dispatch(&mut self, event: MouseEvent) -> Vec<MouseDispatch> {
        let target = self.hit_test(event.x, event.y);
        let mut out = Vec::new();
        let mut emit = |kind: EventKind, node: NodeId| {
            out.push(MouseDispatch { kind, target: node, event });
        };

        if target != self.hovered {
            if let Some(previous) = self.hovered {
                emit(EventKind::MouseLeave, previous);
            }
            if let Some(next) = target {
                emit(EventKind::MouseEnter, next);
            }
            self.hovered = target;
        }

        match event.action {
            MouseAction::Press => {
                self.pressed = target.map(|node| (node, event.button));
                if let Some(node) = target {
                    emit(EventKind::MouseDown, node);
                }
            }
            MouseAction::Release => {
                if let Some(node) = target {
                    emit(EventKind::MouseUp, node);
                }
                let pressed = self.pressed.take();
                if let (Some(node), Some((down_node, down_button))) = (target, pressed) {
                    if node == down_node && event.button == down_button {
                        emit(EventKind::Click, node);
                    }
                }
            }
            MouseAction::Move => {
                if let Some(node) = target {
                    emit(EventKind::MouseMove, node);
                }
            }
            MouseAction::Drag => {
                // A drag belongs to the node the press started on.
                if let Some(node) = self.pressed.map(|(n, _)| n).or(target) {
                    emit(EventKind::Drag, node);
                }
            }
            MouseAction::WheelUp | MouseAction::WheelDown => {
                if let Some(node) = target {
                    emit(EventKind::Wheel, node);
                }
            }
        }
        out
    }
}
