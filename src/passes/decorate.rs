//! Noise-driven terrain decoration

use bracket_noise::prelude::{FastNoise, NoiseType};

use crate::artifact::DungeonState;
use crate::cell::CellType;
use crate::config::DecorTheme;
use crate::error::Result;
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};

/// Turn interior wall cells that edge open floor into water or lava
/// veins, gated by an FBM noise field seeded from the details stream.
///
/// Only wall cells with at least three floor neighbors are eligible, so
/// the floor graph, the border ring, spawns and room centers are never
/// touched and every validated invariant survives decoration.
pub struct DecoratePass;

impl Pass for DecoratePass {
    fn id(&self) -> &'static str {
        "decorate"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Details])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let decor = ctx.config.decor.clone();
        if !decor.enabled {
            return Ok(());
        }
        let cell = match decor.theme {
            DecorTheme::Water => CellType::Water,
            DecorTheme::Lava => CellType::Lava,
        };

        let mut noise = FastNoise::seeded(ctx.rng(Stream::Details)?.next_u64());
        noise.set_noise_type(NoiseType::SimplexFractal);
        noise.set_fractal_octaves(3);
        noise.set_frequency(decor.frequency);

        let (w, h) = (state.width, state.height);
        let mut themed = 0usize;
        for y in 1..h as i32 - 1 {
            for x in 1..w as i32 - 1 {
                if state.grid.get(x, y) != CellType::Wall {
                    continue;
                }
                if state.grid.count_neighbors8(x, y, CellType::Floor) < 3 {
                    continue;
                }
                let sample = (noise.get_noise(x as f32, y as f32) + 1.0) / 2.0;
                if sample > decor.threshold {
                    state.grid.set(x, y, cell);
                    themed += 1;
                }
            }
        }
        ctx.note(format!("{themed} cells themed"));
        Ok(())
    }
}
