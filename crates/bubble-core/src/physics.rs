//! Per-frame bubble simulation.
//!
//! Two independent parts, both stepped once per frame per bubble:
//!
//! - **Position**: a damped spring pulls `position` toward `target`. Idle
//!   bubbles snap onto the target once they are slow and close enough, so the
//!   simulation comes to a full rest instead of jittering forever.
//! - **Deformation**: circular bubbles accumulate a bias vector from camera
//!   pan and nearby pointer motion. The bias is clamped, low-pass filtered,
//!   and stretches the outline toward the motion (see `outline_radius`).

use crate::model::{Bubble, Vec2};
use std::f32::consts::TAU;

/// Pointer state for one frame, in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerMotion {
    pub world: Vec2,
    pub velocity: Vec2,
}

/// Shared input context handed to every bubble in a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Interaction {
    pub pointer: PointerMotion,
    /// Camera pan velocity in world units per frame.
    pub pan_velocity: Vec2,
}

/// Tuning constants for the spring and the outline.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Spring stiffness while the bubble is being dragged.
    pub drag_stiffness: f32,
    /// Spring stiffness while idle.
    pub idle_stiffness: f32,
    /// Velocity multiplier applied every frame.
    pub damping: f32,
    /// Idle snap: velocity must be below this …
    pub snap_velocity: f32,
    /// … and distance to target below this.
    pub snap_distance: f32,
    /// Weight of camera pan velocity in the deformation bias.
    pub pan_bias: f32,
    /// Weight of pointer velocity in the deformation bias.
    pub pointer_bias: f32,
    /// Pointer influence reaches this far beyond the radius.
    pub pointer_reach: f32,
    /// Upper bound on the bias magnitude.
    pub max_deformation: f32,
    /// Low-pass factor pulling the rendered bias toward its target.
    pub bias_smoothing: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            drag_stiffness: 0.15,
            idle_stiffness: 0.08,
            damping: 0.8,
            snap_velocity: 0.01,
            snap_distance: 0.5,
            pan_bias: 0.6,
            pointer_bias: 0.8,
            pointer_reach: 120.0,
            max_deformation: 40.0,
            bias_smoothing: 0.12,
        }
    }
}

/// Advance one bubble by one frame.
pub fn step_bubble(bubble: &mut Bubble, interaction: &Interaction, config: &PhysicsConfig) {
    integrate_position(bubble, config);
    if bubble.is_circular() {
        let target_bias = target_bias(bubble, interaction, config);
        let bias = &mut bubble.blob.bias;
        *bias += (target_bias - *bias) * config.bias_smoothing;
    }
}

/// Whether the bubble is fully settled on its target.
pub fn is_at_rest(bubble: &Bubble) -> bool {
    bubble.velocity == Vec2::ZERO && bubble.position == bubble.target
}

fn integrate_position(bubble: &mut Bubble, config: &PhysicsConfig) {
    let stiffness = if bubble.dragging {
        config.drag_stiffness
    } else {
        config.idle_stiffness
    };
    let accel = (bubble.target - bubble.position) * stiffness;
    bubble.velocity = (bubble.velocity + accel) * config.damping;

    if !bubble.dragging {
        // Per-axis so a bubble sliding along one axis still settles on the other.
        if bubble.velocity.x.abs() < config.snap_velocity
            && (bubble.target.x - bubble.position.x).abs() < config.snap_distance
        {
            bubble.velocity.x = 0.0;
            bubble.position.x = bubble.target.x;
        }
        if bubble.velocity.y.abs() < config.snap_velocity
            && (bubble.target.y - bubble.position.y).abs() < config.snap_distance
        {
            bubble.velocity.y = 0.0;
            bubble.position.y = bubble.target.y;
        }
    }

    bubble.position += bubble.velocity;
}

fn target_bias(bubble: &Bubble, interaction: &Interaction, config: &PhysicsConfig) -> Vec2 {
    let mut bias = interaction.pan_velocity * config.pan_bias;

    let threshold = bubble.radius() + config.pointer_reach;
    let dist = interaction.pointer.world.distance(bubble.position);
    if dist < threshold {
        let falloff = (1.0 - dist / threshold).powi(2);
        bias += interaction.pointer.velocity * (falloff * config.pointer_bias);
    }

    bias.clamp_length(config.max_deformation)
}

// ─── Outline ─────────────────────────────────────────────────────────────

/// Distance from the centre to the outline at angle `theta`, `time` seconds in.
///
/// Base radius, plus three sine octaves phase-shifted by the bubble's seed,
/// plus a slow breathing term, plus the bias projected on the direction.
pub fn outline_radius(bubble: &Bubble, theta: f32, time: f32) -> f32 {
    let seed = bubble.blob.noise_seed;
    let noise = (theta * 3.0 + time * 2.0 + seed).sin() * 2.0
        + (theta * 5.0 - time * 1.5 + seed).sin() * 1.5
        + (theta * 2.0 + time * 3.0).sin();
    let breathing = (time + seed).sin() * 2.0;
    let dir = Vec2::new(theta.cos(), theta.sin());
    bubble.radius() + noise + breathing + dir.dot(bubble.blob.bias)
}

/// Closed outline of `segments` points in world space, starting at angle 0.
/// Textboxes are not deformed and yield an empty outline.
pub fn outline_points(bubble: &Bubble, time: f32, segments: usize) -> Vec<Vec2> {
    if !bubble.is_circular() || segments == 0 {
        return Vec::new();
    }
    (0..segments)
        .map(|i| {
            let theta = i as f32 / segments as f32 * TAU;
            let r = outline_radius(bubble, theta, time);
            bubble.position + Vec2::new(theta.cos(), theta.sin()) * r
        })
        .collect()
}
