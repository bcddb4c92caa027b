//! Pan/zoom camera.
//!
//! `world = (screen − pan) / scale`. Pan is a screen-space offset; zoom is
//! multiplicative, clamped, and anchored so the world point under the
//! pointer stays put on screen.

use bubble_core::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Screen-space offset of the world origin.
    pub pan: Vec2,
    pub scale: f32,
    /// Canvas size in screen pixels.
    pub width: f32,
    pub height: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            width,
            height,
            min_scale: 0.2,
            max_scale: 3.0,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) * (1.0 / self.scale)
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world * self.scale + self.pan
    }

    pub fn screen_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// World-space corners `(min, max)` of the visible area.
    pub fn visible_world(&self) -> (Vec2, Vec2) {
        (
            self.to_world(Vec2::ZERO),
            self.to_world(Vec2::new(self.width, self.height)),
        )
    }

    pub fn pan_by(&mut self, delta_screen: Vec2) {
        self.pan += delta_screen;
    }

    /// Multiply the scale by `factor`, keeping `anchor` (screen) fixed.
    /// Returns `false` when the clamp leaves the scale unchanged.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) -> bool {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if new_scale == self.scale {
            return false;
        }
        let world = self.to_world(anchor);
        self.scale = new_scale;
        self.pan = anchor - world * new_scale;
        true
    }

    /// Pan so `world` sits at the centre of the screen.
    pub fn center_on(&mut self, world: Vec2) {
        self.pan = self.screen_center() - world * self.scale;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}
