//! State encoders: turn a game tick into the controller's input vector.

use crate::game::{Frame, Game, Palette};
use serde::{Deserialize, Serialize};

/// Something that reduces the game state to a fixed-size input vector
pub trait StateEncoder {
    /// Length of every vector produced by `encode`
    fn input_size(&self) -> usize;

    /// Overwrite `out` with the encoding of the current tick
    fn encode(&mut self, game: &Game, out: &mut Vec<f64>);
}

/// Which encoder a run uses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// Three distances to the lead pipe
    Distances,
    /// Downsampled grayscale screenshot
    Pixels {
        /// Side of the square tile averaged into one input
        block: usize,
        #[serde(default)]
        palette: Palette,
    },
}

impl EncoderKind {
    /// Inputs produced for a window of the given size
    pub fn input_size(&self, win_width: f64, win_height: f64) -> usize {
        match self {
            EncoderKind::Distances => 3,
            EncoderKind::Pixels { block, .. } => {
                let block = (*block).max(1);
                (win_width as usize / block) * (win_height as usize / block)
            }
        }
    }
}

impl Default for EncoderKind {
    fn default() -> Self {
        EncoderKind::Pixels {
            block: 10,
            palette: Palette::default(),
        }
    }
}

/// Horizontal distance to the lead pipe's end and vertical distances to
/// both edges of its gap, unscaled
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceEncoder;

impl StateEncoder for DistanceEncoder {
    fn input_size(&self) -> usize {
        3
    }

    fn encode(&mut self, game: &Game, out: &mut Vec<f64>) {
        out.clear();
        match game.distances() {
            Some(d) => out.extend([d.to_pipe_end, d.from_gap_top, d.from_gap_bottom]),
            None => out.extend([0.0; 3]),
        }
    }
}

/// Rasterises the scene and averages it down to one input per tile
#[derive(Clone, Debug)]
pub struct PixelEncoder {
    frame: Frame,
    block: usize,
}

impl PixelEncoder {
    pub fn new(width: usize, height: usize, block: usize, palette: &Palette) -> Self {
        Self {
            frame: Frame::new(width, height, palette),
            block: block.max(1),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl StateEncoder for PixelEncoder {
    fn input_size(&self) -> usize {
        (self.frame.width() / self.block) * (self.frame.height() / self.block)
    }

    fn encode(&mut self, game: &Game, out: &mut Vec<f64>) {
        self.frame.render(game);
        self.frame.downsample_into(self.block, out);
    }
}

/// Encoder selected from configuration
#[derive(Clone, Debug)]
pub enum Encoder {
    Distances(DistanceEncoder),
    Pixels(PixelEncoder),
}

impl Encoder {
    pub fn from_kind(kind: &EncoderKind, win_width: f64, win_height: f64) -> Self {
        match kind {
            EncoderKind::Distances => Encoder::Distances(DistanceEncoder),
            EncoderKind::Pixels { block, palette } => Encoder::Pixels(PixelEncoder::new(
                win_width as usize,
                win_height as usize,
                *block,
                palette,
            )),
        }
    }
}

impl StateEncoder for Encoder {
    fn input_size(&self) -> usize {
        match self {
            Encoder::Distances(e) => e.input_size(),
            Encoder::Pixels(e) => e.input_size(),
        }
    }

    fn encode(&mut self, game: &Game, out: &mut Vec<f64>) {
        match self {
            Encoder::Distances(e) => e.encode(game, out),
            Encoder::Pixels(e) => e.encode(game, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PhysicsConfig;

    #[test]
    fn default_pixel_encoder_has_4800_inputs() {
        let physics = PhysicsConfig::default();
        let mut encoder =
            Encoder::from_kind(&EncoderKind::default(), physics.win_width, physics.win_height);
        assert_eq!(encoder.input_size(), 4800);

        let game = Game::new(physics, 1);
        let mut out = Vec::new();
        encoder.encode(&game, &mut out);
        assert_eq!(out.len(), 4800);
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn pixel_encoding_changes_as_the_bird_falls() {
        let physics = PhysicsConfig::default();
        let mut encoder = PixelEncoder::new(600, 800, 10, &Palette::default());
        assert_eq!((encoder.frame().width(), encoder.frame().height()), (600, 800));
        let mut game = Game::new(physics, 1);

        let mut before = Vec::new();
        encoder.encode(&game, &mut before);
        for _ in 0..5 {
            game.step(false);
        }
        let mut after = Vec::new();
        encoder.encode(&game, &mut after);
        assert_ne!(before, after);
    }

    #[test]
    fn distance_encoder_reports_three_values() {
        let game = Game::new(PhysicsConfig::default(), 2);
        let mut encoder = DistanceEncoder;
        let mut out = vec![9.0; 10];
        encoder.encode(&game, &mut out);

        let d = game.distances().unwrap();
        assert_eq!(out, vec![d.to_pipe_end, d.from_gap_top, d.from_gap_bottom]);
    }
}
