//! Subtree arrangement.
//!
//! Each algorithm is a pure function from the graph to new target positions
//! for every bubble under an anchor. The anchor stays where it is. Nothing is
//! moved directly: `apply_targets` only rewrites `target`, and the spring in
//! `physics` animates bubbles there.
//!
//! - **Mind map**: children split into a right half and a left half, each
//!   side stacked vertically by subtree height.
//! - **Tree**: all children laid out left-to-right below the parent, each
//!   centred in its subtree-width slot.
//! - **Orbit**: children spread over concentric rings, each subtree keeping
//!   its parent's angular wedge.

use crate::model::{SceneGraph, Vec2};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Which arrangement to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    MindMap,
    Tree,
    Orbit,
}

impl LayoutKind {
    /// Host-facing name (`"mindmap"`, `"tree"`, `"orbit"`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mindmap" | "mind-map" | "mind_map" => Some(LayoutKind::MindMap),
            "tree" => Some(LayoutKind::Tree),
            "orbit" | "radial" => Some(LayoutKind::Orbit),
            _ => None,
        }
    }
}

/// Gaps and ring spacing.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Mind map: horizontal gap between a parent's rim and a child's rim.
    pub mind_map_gap_x: f32,
    /// Mind map: vertical gap added to each leaf slot.
    pub mind_map_gap_y: f32,
    /// Tree: horizontal gap added to each leaf slot.
    pub tree_gap_x: f32,
    /// Tree: vertical gap between a parent's rim and a child's rim.
    pub tree_gap_y: f32,
    /// Orbit: distance between consecutive rings.
    pub ring_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mind_map_gap_x: 80.0,
            mind_map_gap_y: 20.0,
            tree_gap_x: 20.0,
            tree_gap_y: 80.0,
            ring_spacing: 180.0,
        }
    }
}

/// Compute targets for `anchor`'s subtree with the chosen algorithm.
/// The result includes the anchor, pinned at its current position.
pub fn compute_targets(
    graph: &SceneGraph,
    anchor: NodeIndex,
    kind: LayoutKind,
    config: &LayoutConfig,
) -> HashMap<NodeIndex, Vec2> {
    match kind {
        LayoutKind::MindMap => mind_map_targets(graph, anchor, config),
        LayoutKind::Tree => tree_targets(graph, anchor, config),
        LayoutKind::Orbit => orbit_targets(graph, anchor, config),
    }
}

/// Write computed targets into the graph. Returns how many bubbles changed.
pub fn apply_targets(graph: &mut SceneGraph, targets: &HashMap<NodeIndex, Vec2>) -> usize {
    let mut changed = 0;
    for (&idx, &target) in targets {
        if let Some(bubble) = graph.get_mut(idx)
            && bubble.target != target
        {
            bubble.target = target;
            bubble.mark_dirty();
            changed += 1;
        }
    }
    log::debug!("layout moved {changed} of {} targets", targets.len());
    changed
}

fn anchor_targets(graph: &SceneGraph, anchor: NodeIndex) -> Option<(HashMap<NodeIndex, Vec2>, Vec2)> {
    let origin = graph.get(anchor)?.position;
    if graph.children(anchor).is_empty() {
        return None;
    }
    let mut targets = HashMap::new();
    targets.insert(anchor, origin);
    Some((targets, origin))
}

fn radius(graph: &SceneGraph, idx: NodeIndex) -> f32 {
    graph.get(idx).map(|b| b.radius()).unwrap_or(0.0)
}

/// Slot size along the stacking axis: `2r + gap` for a leaf, the sum of the
/// children's slots for a parent, never less than its own leaf size.
fn subtree_extent(graph: &SceneGraph, idx: NodeIndex, gap: f32) -> f32 {
    let own = radius(graph, idx) * 2.0 + gap;
    let children: f32 = graph
        .children(idx)
        .iter()
        .map(|c| subtree_extent(graph, *c, gap))
        .sum();
    own.max(children)
}

// ─── Mind map ────────────────────────────────────────────────────────────

pub fn mind_map_targets(graph: &SceneGraph, anchor: NodeIndex, config: &LayoutConfig) -> HashMap<NodeIndex, Vec2> {
    let Some((mut targets, origin)) = anchor_targets(graph, anchor) else {
        return HashMap::new();
    };
    let children = graph.children(anchor);
    let half = children.len().div_ceil(2);
    let (right, left) = children.split_at(half);

    stack_side(graph, anchor, origin, right, 1.0, config, &mut targets);
    stack_side(graph, anchor, origin, left, -1.0, config, &mut targets);
    targets
}

/// Every level centres its children on their combined slots, the same rule
/// the anchor's two sides use, not on the parent's own extent. A lone small
/// child therefore lines up with its parent even when the parent is larger.
fn stack_side(
    graph: &SceneGraph,
    parent: NodeIndex,
    parent_target: Vec2,
    children: &[NodeIndex],
    direction: f32,
    config: &LayoutConfig,
    targets: &mut HashMap<NodeIndex, Vec2>,
) {
    let gap = config.mind_map_gap_y;
    let heights: Vec<f32> = children.iter().map(|c| subtree_extent(graph, *c, gap)).collect();
    let total: f32 = heights.iter().sum();
    let parent_r = radius(graph, parent);

    let mut y = parent_target.y - total / 2.0;
    for (&child, &h) in children.iter().zip(&heights) {
        let dx = (parent_r + radius(graph, child) + config.mind_map_gap_x) * direction;
        let target = Vec2::new(parent_target.x + dx, y + h / 2.0);
        targets.insert(child, target);
        stack_side(graph, child, target, graph.children(child), direction, config, targets);
        y += h;
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────

pub fn tree_targets(graph: &SceneGraph, anchor: NodeIndex, config: &LayoutConfig) -> HashMap<NodeIndex, Vec2> {
    let Some((mut targets, origin)) = anchor_targets(graph, anchor) else {
        return HashMap::new();
    };
    spread_below(graph, anchor, origin, config, &mut targets);
    targets
}

/// Same centring rule as `stack_side`, along the horizontal axis.
fn spread_below(
    graph: &SceneGraph,
    parent: NodeIndex,
    parent_target: Vec2,
    config: &LayoutConfig,
    targets: &mut HashMap<NodeIndex, Vec2>,
) {
    let gap = config.tree_gap_x;
    let children = graph.children(parent);
    let widths: Vec<f32> = children.iter().map(|c| subtree_extent(graph, *c, gap)).collect();
    let total: f32 = widths.iter().sum();
    let parent_r = radius(graph, parent);

    let mut x = parent_target.x - total / 2.0;
    for (&child, &w) in children.iter().zip(&widths) {
        let dy = parent_r + radius(graph, child) + config.tree_gap_y;
        let target = Vec2::new(x + w / 2.0, parent_target.y + dy);
        targets.insert(child, target);
        spread_below(graph, child, target, config, targets);
        x += w;
    }
}

// ─── Orbit ───────────────────────────────────────────────────────────────

pub fn orbit_targets(graph: &SceneGraph, anchor: NodeIndex, config: &LayoutConfig) -> HashMap<NodeIndex, Vec2> {
    let Some((mut targets, origin)) = anchor_targets(graph, anchor) else {
        return HashMap::new();
    };
    fill_wedge(graph, anchor, origin, 0.0, TAU, 1, config, &mut targets);
    targets
}

#[allow(clippy::too_many_arguments)]
fn fill_wedge(
    graph: &SceneGraph,
    parent: NodeIndex,
    center: Vec2,
    start: f32,
    end: f32,
    depth: u32,
    config: &LayoutConfig,
    targets: &mut HashMap<NodeIndex, Vec2>,
) {
    let children = graph.children(parent);
    if children.is_empty() {
        return;
    }
    let ring = depth as f32 * config.ring_spacing;
    let step = (end - start) / children.len() as f32;
    for (i, &child) in children.iter().enumerate() {
        let angle = start + step * (i as f32 + 0.5);
        targets.insert(child, center + Vec2::new(angle.cos(), angle.sin()) * ring);
        fill_wedge(
            graph,
            child,
            center,
            angle - step / 2.0,
            angle + step / 2.0,
            depth + 1,
            config,
            targets,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::BubbleId;
    use crate::model::{Bubble, BubbleKind};

    /// Root with `n` children, each child "abc" (radius 48).
    fn star(n: usize) -> (SceneGraph, NodeIndex, Vec<NodeIndex>) {
        let mut sg = SceneGraph::new();
        let root = sg
            .insert(Bubble::new(BubbleId(100), "root", BubbleKind::Root, Vec2::new(500.0, 400.0)))
            .unwrap();
        let kids = (0..n)
            .map(|i| {
                let b = Bubble::new(BubbleId(i as u64 + 1), "abc", BubbleKind::Branch, Vec2::ZERO);
                sg.insert_child(root, b).unwrap()
            })
            .collect();
        (sg, root, kids)
    }

    #[test]
    fn parses_host_names() {
        assert_eq!(LayoutKind::parse(" Mind-Map "), Some(LayoutKind::MindMap));
        assert_eq!(LayoutKind::parse("orbit"), Some(LayoutKind::Orbit));
        assert_eq!(LayoutKind::parse("grid"), None);
    }

    #[test]
    fn leaf_anchor_is_a_no_op() {
        let (sg, _, kids) = star(1);
        let config = LayoutConfig::default();
        for kind in [LayoutKind::MindMap, LayoutKind::Tree, LayoutKind::Orbit] {
            assert!(compute_targets(&sg, kids[0], kind, &config).is_empty());
        }
    }

    #[test]
    fn mind_map_gives_right_side_the_extra_child() {
        let (sg, root, kids) = star(3);
        let t = mind_map_targets(&sg, root, &LayoutConfig::default());
        assert_eq!(t[&root], Vec2::new(500.0, 400.0));
        assert!(t[&kids[0]].x > 500.0);
        assert!(t[&kids[1]].x > 500.0);
        assert!(t[&kids[2]].x < 500.0);
        // root r = 30 + 4*6 = 54, child r = 48, gap 80
        assert_eq!(t[&kids[0]].x, 500.0 + 54.0 + 48.0 + 80.0);
        assert_eq!(t[&kids[2]].x, 500.0 - (54.0 + 48.0 + 80.0));
        // lone left child is centred on the anchor
        assert_eq!(t[&kids[2]].y, 400.0);
        // right pair is symmetric around the anchor, one slot (2*48+20) apart
        assert_eq!(t[&kids[1]].y - t[&kids[0]].y, 116.0);
        assert_eq!(t[&kids[0]].y + t[&kids[1]].y, 800.0);
    }

    #[test]
    fn nested_children_centre_on_their_parent() {
        let (mut sg, root, kids) = star(3);
        let grandchild = sg
            .insert_child(kids[1], Bubble::new(BubbleId(9), "", BubbleKind::Branch, Vec2::ZERO))
            .unwrap();
        let config = LayoutConfig::default();

        let t = mind_map_targets(&sg, root, &config);
        assert_eq!(t[&kids[1]].y, 458.0);
        assert_eq!(t[&grandchild].y, t[&kids[1]].y);
        assert_eq!(t[&grandchild].x, t[&kids[1]].x + 48.0 + 30.0 + 80.0);

        let t = tree_targets(&sg, root, &config);
        assert_eq!(t[&grandchild].x, t[&kids[1]].x);
    }

    #[test]
    fn tree_centres_children_below() {
        let (sg, root, kids) = star(2);
        let t = tree_targets(&sg, root, &LayoutConfig::default());
        let y = 400.0 + 54.0 + 48.0 + 80.0;
        assert_eq!(t[&kids[0]].y, y);
        assert_eq!(t[&kids[1]].y, y);
        assert_eq!(t[&kids[0]].x + t[&kids[1]].x, 1000.0);
        assert_eq!(t[&kids[1]].x - t[&kids[0]].x, 116.0);
    }

    #[test]
    fn orbit_places_first_ring_at_spacing() {
        let (sg, root, kids) = star(4);
        let t = orbit_targets(&sg, root, &LayoutConfig::default());
        for k in kids {
            let d = t[&k].distance(Vec2::new(500.0, 400.0));
            assert!((d - 180.0).abs() < 1e-3);
        }
    }

    #[test]
    fn apply_only_touches_targets() {
        let (mut sg, root, kids) = star(2);
        let targets = tree_targets(&sg, root, &LayoutConfig::default());
        assert_eq!(apply_targets(&mut sg, &targets), 2);
        let child = sg.get(kids[0]).unwrap();
        assert_eq!(child.position, Vec2::ZERO);
        assert_eq!(child.target, targets[&kids[0]]);
        assert_eq!(apply_targets(&mut sg, &targets), 0);
    }
}
