//! Fitness accounting for a single episode.
//!
//! Two families of reward are supported. The shaped scheme scores how
//! well placed the bird is relative to the lead pipe on every tick and
//! cashes that in when pipes are passed and at the end. The counted
//! schemes only look at survival time and pipe passes.

use crate::game::Distances;
use serde::{Deserialize, Serialize};

/// Reward scheme for an episode
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessScheme {
    /// Two downward parabolas (distance to pipe end, offset from the gap
    /// centre) clipped at zero form a per-tick tracker
    Shaped {
        distance_peak: f64,
        distance_curvature: f64,
        height_peak: f64,
        height_curvature: f64,
        /// Tracker multiples awarded per pipe passed
        pipe_bonus: i64,
    },
    /// Flat reward per survived tick and per pipe
    Counted { per_tick: i64, per_pipe: i64 },
    /// Reward per survived tick; every pipe doubles the running score
    Doubling { per_tick: i64 },
}

impl Default for FitnessScheme {
    fn default() -> Self {
        FitnessScheme::Counted {
            per_tick: 1,
            per_pipe: 500,
        }
    }
}

impl FitnessScheme {
    pub fn shaped() -> Self {
        FitnessScheme::Shaped {
            distance_peak: 400.0,
            distance_curvature: 1.0 / 300.0,
            height_peak: 100.0,
            height_curvature: 1.0 / 4000.0,
            pipe_bonus: 2,
        }
    }
}

/// Parabolic placement score, truncated to an integer
pub fn placement_score(
    distances: &Distances,
    distance_peak: f64,
    distance_curvature: f64,
    height_peak: f64,
    height_curvature: f64,
) -> i64 {
    let d = distances.to_pipe_end;
    let h = distances.from_gap_top - distances.from_gap_bottom;
    let distance = (distance_peak - distance_curvature * d * d).max(0.0);
    let height = (height_peak - height_curvature * h * h).max(0.0);
    (distance + height) as i64
}

/// Running score of one episode
#[derive(Clone, Debug)]
pub struct FitnessTracker {
    scheme: FitnessScheme,
    score: i64,
    /// Latest shaped placement score
    tracker: i64,
}

impl FitnessTracker {
    pub fn new(scheme: FitnessScheme) -> Self {
        Self {
            scheme,
            score: 0,
            tracker: 0,
        }
    }

    /// Account for one tick.
    ///
    /// `survived` is false on the tick the bird crashed; `distances` is
    /// the bird's placement after the tick.
    pub fn record_tick(&mut self, survived: bool, pipes_passed: u32, distances: Option<&Distances>) {
        match self.scheme {
            FitnessScheme::Shaped {
                distance_peak,
                distance_curvature,
                height_peak,
                height_curvature,
                pipe_bonus,
            } => {
                // Pipe bonus uses the placement from before this tick
                let bonus = pipe_bonus.saturating_mul(self.tracker).saturating_mul(pipes_passed as i64);
                self.score = self.score.saturating_add(bonus);
                if survived {
                    if let Some(d) = distances {
                        self.tracker = placement_score(
                            d,
                            distance_peak,
                            distance_curvature,
                            height_peak,
                            height_curvature,
                        );
                    }
                }
            }
            FitnessScheme::Counted { per_tick, per_pipe } => {
                self.score = self.score.saturating_add(per_pipe.saturating_mul(pipes_passed as i64));
                if survived {
                    self.score = self.score.saturating_add(per_tick);
                }
            }
            FitnessScheme::Doubling { per_tick } => {
                for _ in 0..pipes_passed {
                    self.score = self.score.saturating_mul(2);
                }
                if survived {
                    self.score = self.score.saturating_add(per_tick);
                }
            }
        }
    }

    /// Score so far, without the end-of-episode settlement
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Final score of the episode
    pub fn finish(self) -> i64 {
        match self.scheme {
            FitnessScheme::Shaped { .. } => self.score.saturating_add(self.tracker),
            _ => self.score,
        }
    }
}
