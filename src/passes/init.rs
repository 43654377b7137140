//! Grid initialization and cellular-automata passes

use crate::algorithms::cellular::{self, CellularParams};
use crate::artifact::DungeonState;
use crate::cell::CellType;
use crate::config::CellularConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};
use crate::spatial::flood::extract_regions;

fn cellular_params(cfg: &CellularConfig) -> CellularParams {
    CellularParams {
        initial_fill_ratio: cfg.initial_fill_ratio,
        iterations: cfg.iterations,
        birth_min: cfg.birth_limit,
        survival_min: cfg.death_limit,
        min_region_size: cfg.min_region_size,
        connect_all_regions: cfg.connect_all_regions,
    }
}

/// Reset the working grid to solid wall.
pub struct InitGridPass;

impl Pass for InitGridPass {
    fn id(&self) -> &'static str {
        "initialize-grid"
    }

    fn run(&self, state: &mut DungeonState, _ctx: &mut PassContext<'_>) -> Result<()> {
        state.grid.fill(CellType::Wall);
        Ok(())
    }
}

/// Seed the interior with random floor noise from the layout stream.
pub struct NoiseFillPass;

impl Pass for NoiseFillPass {
    fn id(&self) -> &'static str {
        "initialize-grid-with-noise"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Layout])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        state.grid.fill(CellType::Wall);
        let ratio = ctx.config.cellular.initial_fill_ratio;
        let rng = ctx.rng(Stream::Layout)?;
        cellular::fill_noise(&mut state.grid, ratio, rng);
        Ok(())
    }
}

/// Run the configured number of smoothing sweeps, double-buffered, with
/// a cancellation checkpoint at every iteration boundary.
pub struct CaIteratePass;

impl Pass for CaIteratePass {
    fn id(&self) -> &'static str {
        "iterate-ca"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let params = cellular_params(&ctx.config.cellular);
        let mut scratch = Grid::new(state.width, state.height);
        for _ in 0..params.iterations {
            ctx.checkpoint()?;
            cellular::smooth_step(&mut state.grid, &mut scratch, &params);
        }
        Ok(())
    }
}

/// Enumerate the 4-connected floor regions into the working state.
pub struct ExtractRegionsPass;

impl Pass for ExtractRegionsPass {
    fn id(&self) -> &'static str {
        "extract-regions"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        state.regions = extract_regions(&state.grid);
        ctx.note(format!("{} regions found", state.regions.len()));
        Ok(())
    }
}

/// Re-wall regions that fall outside the configured thresholds, keeping
/// at least the largest.
pub struct KeepLargeRegionsPass;

impl Pass for KeepLargeRegionsPass {
    fn id(&self) -> &'static str {
        "keep-large-regions"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        if state.regions.is_empty() {
            return Err(ctx.fail("no floor regions after smoothing"));
        }
        let params = cellular_params(&ctx.config.cellular);
        let regions = std::mem::take(&mut state.regions);
        let keep = cellular::filter_regions(&mut state.grid, regions, &params);
        ctx.note(format!(
            "kept {} regions, re-walled {} cells",
            keep.kept.len(),
            keep.rewalled
        ));
        state.regions = keep.kept;
        Ok(())
    }
}
