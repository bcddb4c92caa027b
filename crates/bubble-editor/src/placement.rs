//! Spawn positions for new bubbles.

use crate::config::EditorConfig;
use crate::viewport::Viewport;
use bubble_core::{SceneGraph, Vec2};
use bubble_render::bubbles_near;
use rand::Rng;
use std::f32::consts::TAU;

/// Where a new root goes: the screen centre on an empty map, otherwise a
/// random point inside the padded visible area.
pub fn root_position(graph: &SceneGraph, viewport: &Viewport, rng: &mut impl Rng, config: &EditorConfig) -> Vec2 {
    if graph.is_empty() {
        return viewport.to_world(viewport.screen_center());
    }
    let pad = config.root_padding;
    let x = pad + rng.gen_range(0.0..1.0) * (viewport.width - pad * 2.0).max(0.0);
    let y = pad + rng.gen_range(0.0..1.0) * (viewport.height - pad * 2.0).max(0.0);
    viewport.to_world(Vec2::new(x, y))
}

/// Where a new child of the bubble at `parent` goes.
///
/// Tries random polar offsets around the parent and takes the first one that
/// is inside the visible area (minus a margin) and clear of every bubble by
/// its radius plus the clearance. Falls back to a fixed diagonal offset.
pub fn branch_position(
    graph: &SceneGraph,
    parent: Vec2,
    viewport: &Viewport,
    rng: &mut impl Rng,
    config: &EditorConfig,
) -> Vec2 {
    let (min, max) = viewport.visible_world();
    let margin = config.viewport_margin / viewport.scale;
    let span = (config.branch_max_distance - config.branch_min_distance).max(0.0);

    for attempt in 0..config.branch_attempts {
        let angle = rng.gen_range(0.0..TAU);
        let distance = config.branch_min_distance + rng.gen_range(0.0..=1.0) * span;
        let candidate = parent + Vec2::new(angle.cos(), angle.sin()) * distance;

        if candidate.x < min.x + margin
            || candidate.x > max.x - margin
            || candidate.y < min.y + margin
            || candidate.y > max.y - margin
        {
            continue;
        }
        if bubbles_near(graph, candidate, config.branch_clearance).is_empty() {
            log::trace!("branch placed after {} attempts", attempt + 1);
            return candidate;
        }
    }

    log::debug!("no free spot near parent, using fallback offset");
    parent + Vec2::new(config.branch_fallback_offset, config.branch_fallback_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{Bubble, BubbleId, BubbleKind, TEXTBOX_RADIUS};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn first_root_lands_mid_screen() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.pan = Vec2::new(100.0, 100.0);
        let mut rng = StdRng::seed_from_u64(1);
        let p = root_position(&SceneGraph::new(), &vp, &mut rng, &EditorConfig::default());
        assert_eq!(p, Vec2::new(300.0, 200.0));
    }

    #[test]
    fn branch_keeps_clear_of_others() {
        let config = EditorConfig::default();
        let vp = Viewport::new(1600.0, 1200.0);
        let mut sg = SceneGraph::new();
        let parent = Vec2::new(800.0, 600.0);
        sg.insert(Bubble::new(BubbleId(1), "parent", BubbleKind::Root, parent))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let p = branch_position(&sg, parent, &vp, &mut rng, &config);
            let d = p.distance(parent);
            assert!((config.branch_min_distance..=config.branch_max_distance + 1e-3).contains(&d));
            assert!(d >= sg.get_by_id(BubbleId(1)).unwrap().radius() + config.branch_clearance);
        }
    }

    #[test]
    fn textbox_clearance_uses_its_half_width() {
        let config = EditorConfig::default();
        let vp = Viewport::new(1600.0, 1200.0);
        let mut sg = SceneGraph::new();
        let parent = Vec2::new(800.0, 600.0);
        sg.insert(Bubble::new(BubbleId(1), "memo", BubbleKind::Textbox, parent))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let p = branch_position(&sg, parent, &vp, &mut rng, &config);
            assert!(p.distance(parent) > TEXTBOX_RADIUS + config.branch_clearance);
        }
    }

    #[test]
    fn crowded_parent_falls_back_to_diagonal() {
        let config = EditorConfig::default();
        // the parent sits in a corner, so every candidate is off screen
        let vp = Viewport::new(100.0, 100.0);
        let sg = SceneGraph::new();
        let mut rng = StdRng::seed_from_u64(3);
        let p = branch_position(&sg, Vec2::ZERO, &vp, &mut rng, &config);
        assert_eq!(p, Vec2::new(50.0, 50.0));
    }
}
