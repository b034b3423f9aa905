//! Headless Flappy Bird.
//!
//! One [`Game`] is one episode: a bird, the pipes in front of it and the
//! scrolling floor. [`Game::step`] advances everything by a single tick
//! and reports pipe passes and crashes; nothing here draws to a window.

mod bird;
mod frame;
mod physics;
mod pipe;

pub use bird::{Bird, ANIMATION_TIME, MAX_ROTATION, ROT_VEL};
pub use frame::{Frame, Palette};
pub use physics::{PhysicsConfig, PhysicsPreset};
pub use pipe::{Base, Pipe};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen coordinates (y grows downwards)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Why an episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Pipe,
    Floor,
    Ceiling,
}

/// Result of a single tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Pipes passed during this tick
    pub pipes_passed: u32,
    pub crash: Option<CrashCause>,
}

/// Bird position relative to the pipe it is approaching
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distances {
    /// Horizontal distance from the bird's centre to the pipe's right edge
    pub to_pipe_end: f64,
    /// How far the bird's centre is below the gap top
    pub from_gap_top: f64,
    /// How far the bird's centre is above the gap bottom
    pub from_gap_bottom: f64,
}

/// A single episode of the game
#[derive(Clone, Debug)]
pub struct Game {
    pub physics: PhysicsConfig,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub base: Base,
    /// Ticks elapsed
    pub tick: u64,
    /// Pipes passed so far
    pub score: u32,
    pub crash: Option<CrashCause>,
    rng: ChaCha8Rng,
}

impl Game {
    pub fn new(physics: PhysicsConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bird = Bird::new(physics.bird_x, physics.bird_y);
        let base = Base::new(physics.floor_y, &physics);
        let pipes = vec![Pipe::new(physics.first_pipe_x, &physics, &mut rng)];

        Self {
            physics,
            bird,
            pipes,
            base,
            tick: 0,
            score: 0,
            crash: None,
            rng,
        }
    }

    pub fn is_over(&self) -> bool {
        self.crash.is_some()
    }

    /// Advance one tick, jumping first if requested
    pub fn step(&mut self, jump: bool) -> StepOutcome {
        if self.is_over() {
            return StepOutcome {
                pipes_passed: 0,
                crash: self.crash,
            };
        }

        let physics = &self.physics;
        if jump {
            self.bird.jump(physics);
        }
        self.bird.update_position(physics);
        self.base.update_position(physics);

        let hitbox = self.bird.hitbox(physics);
        let mut crash = None;
        let mut passed = 0;

        for pipe in &mut self.pipes {
            pipe.update_position(physics);
            if pipe.collides_with(&hitbox, physics) {
                crash = Some(CrashCause::Pipe);
            }
            if !pipe.passed && pipe.x < self.bird.x {
                pipe.passed = true;
                passed += 1;
            }
        }

        if passed > 0 {
            let pipe = Pipe::new(physics.win_width, physics, &mut self.rng);
            self.pipes.push(pipe);
        }
        self.pipes.retain(|p| !p.is_off_screen(physics));

        if crash.is_none() {
            if self.bird.bottom(physics) >= physics.floor_y {
                crash = Some(CrashCause::Floor);
            } else if self.bird.y < physics.ceiling_y {
                crash = Some(CrashCause::Ceiling);
            }
        }

        if crash.is_some() {
            passed = 0;
        }

        self.tick += 1;
        self.score += passed;
        self.crash = crash;

        StepOutcome {
            pipes_passed: passed,
            crash,
        }
    }

    /// The first pipe the bird has not yet fully cleared
    pub fn lead_pipe(&self) -> Option<&Pipe> {
        self.pipes
            .iter()
            .find(|p| self.bird.x <= p.right_edge(&self.physics))
            .or_else(|| self.pipes.last())
    }

    pub fn distances(&self) -> Option<Distances> {
        let pipe = self.lead_pipe()?;
        let center_y = self.bird.center_y(&self.physics);
        Some(Distances {
            to_pipe_end: pipe.right_edge(&self.physics) - self.bird.center_x(&self.physics),
            from_gap_top: center_y - pipe.height,
            from_gap_bottom: pipe.bottom - center_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_overlap_is_exclusive_at_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let inside = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn idle_bird_hits_the_floor() {
        let mut game = Game::new(PhysicsConfig::default(), 1);
        let mut outcome = StepOutcome::default();
        for _ in 0..200 {
            outcome = game.step(false);
            if game.is_over() {
                break;
            }
        }
        assert_eq!(outcome.crash, Some(CrashCause::Floor));
        assert_eq!(game.score, 0);
    }

    #[test]
    fn constant_flapping_hits_the_ceiling() {
        let mut game = Game::new(PhysicsConfig::preset(PhysicsPreset::Classic), 1);
        while !game.is_over() && game.tick < 500 {
            game.step(true);
        }
        assert_eq!(game.crash, Some(CrashCause::Ceiling));
    }

    #[test]
    fn step_after_crash_is_inert() {
        let mut game = Game::new(PhysicsConfig::default(), 3);
        while !game.is_over() {
            game.step(false);
        }
        let tick = game.tick;
        let y = game.bird.y;
        game.step(true);
        assert_eq!(game.tick, tick);
        assert_eq!(game.bird.y, y);
    }

    #[test]
    fn passing_a_pipe_spawns_the_next() {
        let physics = PhysicsConfig::default();
        let mut game = Game::new(physics.clone(), 5);
        // Hold the bird in a wide open gap so it survives the first pipe
        game.pipes[0] = Pipe::with_height(game.pipes[0].x, 0.0, &physics);
        game.physics.pipe_gap = 2000.0;
        game.pipes[0].bottom = 2000.0;
        game.physics.floor_y = 10_000.0;

        let mut passed = 0;
        for _ in 0..200 {
            let jump = game.bird.y > 350.0;
            passed += game.step(jump).pipes_passed;
            if passed > 0 {
                break;
            }
        }
        assert_eq!(passed, 1);
        assert_eq!(game.pipes.len(), 2);
        assert_eq!(game.pipes[1].x, physics.win_width);
    }

    #[test]
    fn distances_track_the_lead_pipe() {
        let game = Game::new(PhysicsConfig::default(), 9);
        let d = game.distances().unwrap();
        let pipe = &game.pipes[0];
        assert!(d.to_pipe_end > 0.0);
        assert_eq!(d.from_gap_top + d.from_gap_bottom, pipe.bottom - pipe.height);
    }
}
