//! Cellular automata cave synthesis

use crate::cell::CellType;
use crate::grid::Grid;
use crate::rng::Rng;
use crate::spatial::flood::Region;

/// Cave parameters, mirroring the cellular config surface.
#[derive(Debug, Clone)]
pub struct CellularParams {
    pub initial_fill_ratio: f64,
    pub iterations: usize,
    /// Wall neighbors at which a floor cell becomes wall.
    pub birth_min: usize,
    /// Wall neighbors a wall cell needs to survive.
    pub survival_min: usize,
    pub min_region_size: usize,
    pub connect_all_regions: bool,
}

/// Seed the interior with floor at `fill_ratio` probability; the border
/// ring stays wall.
pub fn fill_noise(grid: &mut Grid, fill_ratio: f64, rng: &mut Rng) {
    let (w, h) = (grid.width(), grid.height());
    if w < 3 || h < 3 {
        return;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if rng.chance(fill_ratio) {
                grid.set_at(x, y, CellType::Floor);
            }
        }
    }
}

/// One double-buffered smoothing sweep; `scratch` must match the grid's
/// dimensions and holds the previous generation afterwards.
pub fn smooth_step(grid: &mut Grid, scratch: &mut Grid, params: &CellularParams) {
    grid.apply_ca_into(params.survival_min, params.birth_min, scratch);
    std::mem::swap(grid, scratch);
}

/// Outcome of region filtering.
#[derive(Debug)]
pub struct RegionKeep {
    /// Surviving regions, largest first.
    pub kept: Vec<Region>,
    /// Cells returned to wall.
    pub rewalled: usize,
}

/// Re-wall the regions that don't qualify and return the survivors.
///
/// The largest region always survives. With `connect_all_regions`,
/// additional regions survive when their size reaches
/// `min_region_size` and stays under the dynamic cavern cap of 80% of
/// the total cell count; a fixed cap would empty large maps.
pub fn filter_regions(
    grid: &mut Grid,
    mut regions: Vec<Region>,
    params: &CellularParams,
) -> RegionKeep {
    let max_cavern_size = (grid.width() * grid.height()) * 4 / 5;
    // Largest first; ties resolved by discovery order, which is
    // row-major and therefore stable.
    regions.sort_by(|a, b| b.cells.len().cmp(&a.cells.len()));

    let mut kept = Vec::new();
    let mut rewalled = 0;
    for (i, region) in regions.into_iter().enumerate() {
        let size = region.cells.len();
        let survives = i == 0
            || (params.connect_all_regions
                && size >= params.min_region_size
                && size <= max_cavern_size);
        if survives {
            kept.push(region);
        } else {
            rewalled += size;
            for p in &region.cells {
                grid.set(p.x, p.y, CellType::Wall);
            }
        }
    }
    RegionKeep { kept, rewalled }
}
