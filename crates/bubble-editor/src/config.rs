//! Editor tuning.
//!
//! Every field has a default; a host may pass a partial JSON object and the
//! rest is filled in.

use bubble_core::{LayoutConfig, PhysicsConfig, Vec2};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Children allowed under a root bubble.
    pub max_root_branches: usize,
    /// Children allowed under any other bubble.
    pub max_branch_branches: usize,
    /// Pause between cascade-delete layers.
    pub cascade_layer_delay_ms: f64,
    /// How long a removed bubble stays in the fade list.
    pub fade_ms: f64,
    /// Snapshots kept on the undo stack.
    pub undo_depth: usize,
    /// Offset applied to imported bubbles, per axis.
    pub import_nudge: f32,

    /// Random placement attempts for a new branch.
    pub branch_attempts: usize,
    pub branch_min_distance: f32,
    pub branch_max_distance: f32,
    /// Extra space required beyond another bubble's radius.
    pub branch_clearance: f32,
    /// Candidates closer than this to the visible edge are rejected.
    pub viewport_margin: f32,
    /// Diagonal offset used when every attempt collides.
    pub branch_fallback_offset: f32,
    /// Inset of the random root spawn area.
    pub root_padding: f32,

    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,

    /// Secondary-button drags snap the angle around the parent to this step.
    pub angle_snap_step_deg: f32,
    /// Snap only when already within this many degrees of a step.
    pub angle_snap_tolerance_deg: f32,

    /// Seed for placement randomness.
    pub rng_seed: u64,

    #[serde(skip)]
    pub physics: PhysicsConfig,
    #[serde(skip)]
    pub layout: LayoutConfig,
}

impl EditorConfig {
    pub fn import_offset(&self) -> Vec2 {
        Vec2::new(self.import_nudge, self.import_nudge)
    }

    /// Parse a JSON override. Empty input yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_root_branches: 10,
            max_branch_branches: 5,
            cascade_layer_delay_ms: 80.0,
            fade_ms: 300.0,
            undo_depth: 50,
            import_nudge: 40.0,
            branch_attempts: 50,
            branch_min_distance: 100.0,
            branch_max_distance: 200.0,
            branch_clearance: 70.0,
            viewport_margin: 50.0,
            branch_fallback_offset: 50.0,
            root_padding: 100.0,
            zoom_in_factor: 1.11,
            zoom_out_factor: 0.9,
            min_scale: 0.2,
            max_scale: 3.0,
            angle_snap_step_deg: 15.0,
            angle_snap_tolerance_deg: 6.0,
            rng_seed: 0x5eed,
            physics: PhysicsConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}
