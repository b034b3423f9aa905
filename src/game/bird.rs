//! The bird: parabolic flight, tilt and wing animation.

use super::physics::PhysicsConfig;
use super::Rect;

/// Upward tilt snaps to this angle while rising
pub const MAX_ROTATION: f64 = 25.0;
/// Degrees of downward tilt added per falling tick
pub const ROT_VEL: f64 = 20.0;
/// Ticks each wing frame is held
pub const ANIMATION_TIME: u32 = 5;

#[derive(Clone, Debug)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    /// Degrees, positive is nose up
    pub tilt: f64,
    /// Ticks since the last jump
    pub tick_count: u32,
    /// Y at the moment of the last jump
    pub height: f64,
    /// Wing animation counter
    pub img_count: u32,
    /// Sprite frame currently shown (0..3)
    pub frame: usize,
}

impl Bird {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            tilt: 0.0,
            tick_count: 0,
            height: y,
            img_count: 0,
            frame: 0,
        }
    }

    pub fn jump(&mut self, physics: &PhysicsConfig) {
        self.velocity = physics.jump_velocity;
        self.tick_count = 0;
        self.height = self.y;
    }

    /// Advance one tick of flight
    pub fn update_position(&mut self, physics: &PhysicsConfig) {
        if self.velocity > physics.terminal_velocity {
            let direction = if self.velocity >= 0.0 { 1.0 } else { -1.0 };
            self.y -= self.velocity * self.velocity * physics.displacement_factor * direction;
        } else {
            self.y += physics.terminal_drop;
        }
        self.velocity -= physics.gravity;
        self.tick_count += 1;

        if self.y < self.height {
            if self.tilt < MAX_ROTATION {
                self.tilt = MAX_ROTATION;
            }
        } else if self.tilt > -90.0 {
            self.tilt -= ROT_VEL;
        }

        self.animate();
    }

    /// Cycle wing frames 0, 1, 2, 1, 0; a nose-diving bird holds frame 1
    fn animate(&mut self) {
        self.img_count += 1;
        self.frame = if self.img_count <= ANIMATION_TIME {
            0
        } else if self.img_count <= ANIMATION_TIME * 2 {
            1
        } else if self.img_count <= ANIMATION_TIME * 3 {
            2
        } else if self.img_count <= ANIMATION_TIME * 4 {
            1
        } else {
            self.img_count = 0;
            0
        };

        if self.tilt <= -80.0 {
            self.frame = 1;
            self.img_count = ANIMATION_TIME * 2;
        }
    }

    /// Collision box, shrunk by the configured inset
    pub fn hitbox(&self, physics: &PhysicsConfig) -> Rect {
        let inset = physics.hitbox_inset;
        Rect::new(
            self.x + inset,
            self.y + inset,
            physics.bird_width - 2.0 * inset,
            physics.bird_height - 2.0 * inset,
        )
    }

    pub fn center_y(&self, physics: &PhysicsConfig) -> f64 {
        self.y + physics.bird_height / 2.0
    }

    pub fn center_x(&self, physics: &PhysicsConfig) -> f64 {
        self.x + physics.bird_width / 2.0
    }

    pub fn bottom(&self, physics: &PhysicsConfig) -> f64 {
        self.y + physics.bird_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_rises_then_falls() {
        let physics = PhysicsConfig::default();
        let mut bird = Bird::new(210.0, 350.0);
        bird.jump(&physics);

        bird.update_position(&physics);
        assert!(bird.y < 350.0);
        assert_eq!(bird.tilt, MAX_ROTATION);

        for _ in 0..30 {
            bird.update_position(&physics);
        }
        assert!(bird.y > 350.0);
        assert!(bird.tilt <= 0.0);
    }

    #[test]
    fn terminal_drop_is_constant() {
        let physics = PhysicsConfig::default();
        let mut bird = Bird::new(0.0, 0.0);
        bird.velocity = physics.terminal_velocity - 1.0;

        let before = bird.y;
        bird.update_position(&physics);
        assert_eq!(bird.y - before, physics.terminal_drop);
    }

    #[test]
    fn tilt_bottoms_out() {
        let physics = PhysicsConfig::default();
        let mut bird = Bird::new(0.0, 0.0);
        for _ in 0..20 {
            bird.update_position(&physics);
        }
        assert!(bird.tilt >= -90.0 - ROT_VEL);
        assert_eq!(bird.frame, 1, "nose-diving bird holds the middle frame");
    }

    #[test]
    fn wing_cycle() {
        let mut bird = Bird::new(0.0, 0.0);
        let mut frames = Vec::new();
        for _ in 0..(ANIMATION_TIME * 4 + 1) {
            bird.animate();
            frames.push(bird.frame);
        }
        assert_eq!(frames[0], 0);
        assert_eq!(frames[ANIMATION_TIME as usize], 1);
        assert_eq!(frames[(ANIMATION_TIME * 2) as usize], 2);
        assert_eq!(frames[(ANIMATION_TIME * 3) as usize], 1);
        assert_eq!(*frames.last().unwrap(), 0);
        assert_eq!(bird.img_count, 0);
    }
}
