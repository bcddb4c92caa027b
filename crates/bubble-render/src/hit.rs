//! Hit testing: world point → bubble lookup.
//!
//! Bubbles paint in index order, so the walk goes in reverse to find the
//! topmost one first.

use bubble_core::model::{SceneGraph, Vec2};
use bubble_core::{BubbleId, NodeIndex};

/// Topmost bubble whose resting shape contains `world`.
/// Returns `None` on empty canvas.
pub fn hit_test(graph: &SceneGraph, world: Vec2) -> Option<NodeIndex> {
    let indices: Vec<NodeIndex> = graph.iter().map(|(idx, _)| idx).collect();
    indices
        .into_iter()
        .rev()
        .find(|idx| graph.get(*idx).is_some_and(|b| b.contains(world)))
}

pub fn hit_test_id(graph: &SceneGraph, world: Vec2) -> Option<BubbleId> {
    hit_test(graph, world).and_then(|idx| graph.id_of(idx))
}

/// Every bubble within `distance` of `world`, measured rim to point.
pub fn bubbles_near(graph: &SceneGraph, world: Vec2, distance: f32) -> Vec<NodeIndex> {
    graph
        .iter()
        .filter(|(_, b)| b.position.distance(world) - b.radius() <= distance)
        .map(|(idx, _)| idx)
        .collect()
}
