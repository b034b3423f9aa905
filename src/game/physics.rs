//! Physics constants for the bird, pipes and scrolling floor.
//!
//! Every variant of the game shares one implementation; the differences
//! between them live entirely in a [`PhysicsConfig`].

use serde::{Deserialize, Serialize};

/// Named physics presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsPreset {
    /// Slower pipes, stronger terminal drop, ceiling at the top edge
    Classic,
    /// Faster pipes and a taller jump, ceiling well above the screen
    Revisit,
}

/// Physics and geometry configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Window width in pixels
    pub win_width: f64,
    /// Window height in pixels
    pub win_height: f64,
    /// Y coordinate of the floor surface
    pub floor_y: f64,
    /// The bird dies once its top edge is above this line
    pub ceiling_y: f64,
    /// Bird spawn position
    pub bird_x: f64,
    pub bird_y: f64,
    /// Bird hitbox size
    pub bird_width: f64,
    pub bird_height: f64,
    /// Pixels trimmed from each side of the bird hitbox
    pub hitbox_inset: f64,
    /// Velocity set by a jump
    pub jump_velocity: f64,
    /// Velocity lost per tick
    pub gravity: f64,
    /// Scale of the parabolic displacement
    pub displacement_factor: f64,
    /// Below this velocity the bird drops at a fixed rate
    pub terminal_velocity: f64,
    /// Pixels fallen per tick at terminal velocity
    pub terminal_drop: f64,
    /// Horizontal scroll speed of pipes and floor
    pub scroll_speed: f64,
    /// Pipe sprite size
    pub pipe_width: f64,
    pub pipe_height: f64,
    /// Vertical opening between the top and bottom pipe
    pub pipe_gap: f64,
    /// Gap top is drawn from [gap_min, gap_max)
    pub gap_min: i32,
    pub gap_max: i32,
    /// X of the first pipe of an episode
    pub first_pipe_x: f64,
    /// Width of one floor segment
    pub base_width: f64,
}

impl PhysicsConfig {
    pub fn preset(preset: PhysicsPreset) -> Self {
        match preset {
            PhysicsPreset::Classic => Self {
                floor_y: 700.0,
                ceiling_y: 0.0,
                bird_x: 230.0,
                jump_velocity: 7.0,
                gravity: 1.0,
                displacement_factor: 0.5,
                terminal_drop: 35.0,
                scroll_speed: 5.0,
                ..Self::base()
            },
            PhysicsPreset::Revisit => Self::base(),
        }
    }

    fn base() -> Self {
        Self {
            win_width: 600.0,
            win_height: 800.0,
            floor_y: 730.0,
            ceiling_y: -220.0,
            bird_x: 210.0,
            bird_y: 350.0,
            bird_width: 68.0,
            bird_height: 48.0,
            hitbox_inset: 4.0,
            jump_velocity: 7.7,
            gravity: 1.1,
            displacement_factor: 0.6,
            terminal_velocity: -7.0,
            terminal_drop: 25.0,
            scroll_speed: 8.0,
            pipe_width: 104.0,
            pipe_height: 640.0,
            pipe_gap: 200.0,
            gap_min: 50,
            gap_max: 450,
            first_pipe_x: 700.0,
            base_width: 672.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.gap_min >= self.gap_max {
            return Err("gap_min must be below gap_max".to_string());
        }
        if self.pipe_gap <= 0.0 {
            return Err("pipe_gap must be > 0".to_string());
        }
        if self.scroll_speed <= 0.0 {
            return Err("scroll_speed must be > 0".to_string());
        }
        if self.floor_y <= self.ceiling_y {
            return Err("floor_y must be below ceiling_y".to_string());
        }
        if self.win_width <= 0.0 || self.win_height <= 0.0 {
            return Err("window dimensions must be > 0".to_string());
        }
        if 2.0 * self.hitbox_inset >= self.bird_width.min(self.bird_height) {
            return Err("hitbox_inset leaves no bird hitbox".to_string());
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::preset(PhysicsPreset::Revisit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(PhysicsConfig::preset(PhysicsPreset::Classic).validate().is_ok());
        assert!(PhysicsConfig::preset(PhysicsPreset::Revisit).validate().is_ok());
    }

    #[test]
    fn classic_differs_from_revisit() {
        let classic = PhysicsConfig::preset(PhysicsPreset::Classic);
        let revisit = PhysicsConfig::preset(PhysicsPreset::Revisit);
        assert_eq!(classic.scroll_speed, 5.0);
        assert_eq!(revisit.scroll_speed, 8.0);
        assert_eq!(classic.pipe_gap, revisit.pipe_gap);
    }

    #[test]
    fn empty_gap_range_rejected() {
        let mut physics = PhysicsConfig::default();
        physics.gap_max = physics.gap_min;
        assert!(physics.validate().is_err());
    }
}
