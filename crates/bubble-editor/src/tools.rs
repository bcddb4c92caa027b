//! Pointer gestures.
//!
//! A pointer-down on a bubble starts a node drag; on empty canvas it starts
//! a pan. The gesture owns only the bookkeeping; the engine applies the
//! resulting targets and pan deltas to the graph and viewport.
//!
//! ## Modifier behaviors
//!
//! | Input | Effect |
//! |-------|--------|
//! | **Ctrl** | Descendants move along with the dragged bubble |
//! | **Secondary button** | Angle around the parent snaps to 15° steps |

use crate::input::{Modifiers, PointerButton};
use bubble_core::{BubbleId, Vec2};

/// A bubble being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrag {
    pub id: BubbleId,
    /// Screen point where the drag began.
    origin: Vec2,
    /// Bubble position when the drag began.
    start: Vec2,
    /// Move the whole subtree.
    pub group: bool,
    /// Snap the angle around the parent.
    pub snap_angle: bool,
}

impl NodeDrag {
    pub fn new(id: BubbleId, pointer: Vec2, start: Vec2, button: PointerButton, modifiers: Modifiers) -> Self {
        Self {
            id,
            origin: pointer,
            start,
            group: modifiers.ctrl,
            snap_angle: button == PointerButton::Secondary,
        }
    }

    /// Target for the dragged bubble with the pointer at `pointer` (screen).
    pub fn target(&self, pointer: Vec2, scale: f32, parent: Option<Vec2>, snap: &AngleSnap) -> Vec2 {
        let raw = self.start + (pointer - self.origin) * (1.0 / scale);
        match parent {
            Some(parent) if self.snap_angle => snap.apply(parent, raw),
            _ => raw,
        }
    }
}

/// Angle snapping around a parent bubble.
#[derive(Debug, Clone, Copy)]
pub struct AngleSnap {
    pub step_deg: f32,
    pub tolerance_deg: f32,
}

impl AngleSnap {
    /// Rotate `point` around `pivot` onto the nearest step if it is already
    /// within tolerance of it. The distance to the pivot is kept.
    pub fn apply(&self, pivot: Vec2, point: Vec2) -> Vec2 {
        let offset = point - pivot;
        let dist = offset.length();
        if dist == 0.0 || self.step_deg <= 0.0 {
            return point;
        }
        let deg = offset.y.atan2(offset.x).to_degrees();
        let snapped = (deg / self.step_deg).round() * self.step_deg;
        if (deg - snapped).abs() >= self.tolerance_deg {
            return point;
        }
        let rad = snapped.to_radians();
        pivot + Vec2::new(rad.cos(), rad.sin()) * dist
    }
}

/// What the pointer is doing right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// Panning the canvas; `last` is the previous screen point.
    Pan { last: Vec2 },
    Drag(NodeDrag),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn dragged(&self) -> Option<BubbleId> {
        match self {
            Gesture::Drag(drag) => Some(drag.id),
            _ => None,
        }
    }
}
