//! Software rasteriser producing a grayscale frame of the scene.
//!
//! Sprites are drawn as flat rectangles in painter's order (background,
//! pipes, floor, bird). Colours go through the usual luma weights
//! `0.299 R + 0.587 G + 0.114 B` so the frame looks like a grayscale
//! screenshot of the coloured game.

use super::{Game, Rect};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// RGB colours used when rasterising
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: [u8; 3],
    pub pipe: [u8; 3],
    pub base: [u8; 3],
    pub bird: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [78, 192, 202],
            pipe: [115, 191, 46],
            base: [222, 216, 149],
            bird: [247, 182, 45],
        }
    }
}

pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
}

/// Grayscale framebuffer, indexed `[row, column]`
#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: Array2<u8>,
    shades: [u8; 4],
}

impl Frame {
    pub fn new(width: usize, height: usize, palette: &Palette) -> Self {
        Self {
            pixels: Array2::zeros((height, width)),
            shades: [
                luma(palette.background),
                luma(palette.pipe),
                luma(palette.base),
                luma(palette.bird),
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Redraw the whole frame from the game state
    pub fn render(&mut self, game: &Game) {
        let [background, pipe_shade, base_shade, bird_shade] = self.shades;
        let physics = &game.physics;

        self.pixels.fill(background);

        for pipe in &game.pipes {
            self.fill_rect(&pipe.top_rect(physics), pipe_shade);
            self.fill_rect(&pipe.bottom_rect(physics), pipe_shade);
        }

        let floor_height = physics.win_height - game.base.y;
        for x in [game.base.x1, game.base.x2] {
            let segment = Rect::new(x, game.base.y, physics.base_width, floor_height);
            self.fill_rect(&segment, base_shade);
        }

        let bird = Rect::new(
            game.bird.x,
            game.bird.y,
            physics.bird_width,
            physics.bird_height,
        );
        self.fill_rect(&bird, bird_shade);
    }

    /// Fill a rectangle, clipped to the frame
    pub fn fill_rect(&mut self, rect: &Rect, shade: u8) {
        let clip = |v: f64, max: usize| -> usize { v.round().clamp(0.0, max as f64) as usize };
        let x0 = clip(rect.x, self.width());
        let x1 = clip(rect.x + rect.w, self.width());
        let y0 = clip(rect.y, self.height());
        let y1 = clip(rect.y + rect.h, self.height());
        if x0 < x1 && y0 < y1 {
            self.pixels.slice_mut(s![y0..y1, x0..x1]).fill(shade);
        }
    }

    /// Area-average `block`x`block` tiles into `out`, scaled to [0, 1].
    ///
    /// Tiles come out row by row; partial tiles at the right or bottom
    /// edge are dropped. A block of 0 is treated as 1.
    pub fn downsample_into(&self, block: usize, out: &mut Vec<f64>) {
        out.clear();
        let block = block.max(1);
        let area = (block * block) as f64 * 255.0;
        out.extend(
            self.pixels
                .exact_chunks((block, block))
                .into_iter()
                .map(|tile| tile.iter().map(|&p| p as u32).sum::<u32>() as f64 / area),
        );
    }
}
