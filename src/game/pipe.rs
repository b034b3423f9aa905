//! Pipe pairs and the scrolling floor.

use super::physics::PhysicsConfig;
use super::Rect;
use rand::Rng;

/// A top/bottom pipe pair sharing one gap
#[derive(Clone, Debug)]
pub struct Pipe {
    pub x: f64,
    /// Y of the gap top
    pub height: f64,
    /// Y of the top pipe's upper edge
    pub top: f64,
    /// Y of the gap bottom
    pub bottom: f64,
    pub passed: bool,
}

impl Pipe {
    pub fn new<R: Rng + ?Sized>(x: f64, physics: &PhysicsConfig, rng: &mut R) -> Self {
        let height = rng.gen_range(physics.gap_min..physics.gap_max) as f64;
        Self::with_height(x, height, physics)
    }

    pub fn with_height(x: f64, height: f64, physics: &PhysicsConfig) -> Self {
        Self {
            x,
            height,
            top: height - physics.pipe_height,
            bottom: height + physics.pipe_gap,
            passed: false,
        }
    }

    pub fn update_position(&mut self, physics: &PhysicsConfig) {
        self.x -= physics.scroll_speed;
    }

    pub fn top_rect(&self, physics: &PhysicsConfig) -> Rect {
        Rect::new(self.x, self.top, physics.pipe_width, physics.pipe_height)
    }

    pub fn bottom_rect(&self, physics: &PhysicsConfig) -> Rect {
        Rect::new(self.x, self.bottom, physics.pipe_width, physics.pipe_height)
    }

    pub fn collides_with(&self, hitbox: &Rect, physics: &PhysicsConfig) -> bool {
        hitbox.overlaps(&self.top_rect(physics)) || hitbox.overlaps(&self.bottom_rect(physics))
    }

    pub fn right_edge(&self, physics: &PhysicsConfig) -> f64 {
        self.x + physics.pipe_width
    }

    pub fn is_off_screen(&self, physics: &PhysicsConfig) -> bool {
        self.right_edge(physics) < 0.0
    }
}

/// Two floor segments scrolled side by side
#[derive(Clone, Debug)]
pub struct Base {
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
}

impl Base {
    pub fn new(y: f64, physics: &PhysicsConfig) -> Self {
        Self {
            y,
            x1: 0.0,
            x2: physics.base_width,
        }
    }

    pub fn update_position(&mut self, physics: &PhysicsConfig) {
        let width = physics.base_width;
        self.x1 -= physics.scroll_speed;
        self.x2 -= physics.scroll_speed;
        if self.x1 + width < 0.0 {
            self.x1 = self.x2 + width;
        }
        if self.x2 + width < 0.0 {
            self.x2 = self.x1 + width;
        }
    }
}
