//! Hybrid pipeline: zoned BSP rooms and cellular caverns stitched with
//! wide corridors

use crate::algorithms::bsp::{place_room_in_leaf, BspParams, BspTree};
use crate::algorithms::cellular::{self, CellularParams};
use crate::artifact::{DungeonState, Room, RoomKind, Zone, ZoneStyle};
use crate::cell::CellType;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{Bounds, Point, Rect};
use crate::grid::Grid;
use crate::passes::{
    CarveCorridorsPass, ConnectRegionsPass, ConnectivityGraphPass, CrossingScanPass, DecoratePass,
    EmitSpawnsPass, InitGridPass, PlaceDoorsPass, ResolveCentersPass, RoomKindsPass,
    ValidateInvariantsPass,
};
use crate::pipeline::{Pass, PassContext, Pipeline};
use crate::rng::{Stream, StreamSet};
use crate::spatial::flood::{extract_regions, resolve_region_center, Region};

const FLOOR_PENALTY: f32 = 3.0;

/// Split the interior into zones and assign each a fill style.
pub struct PartitionZonesPass;

impl Pass for PartitionZonesPass {
    fn id(&self) -> &'static str {
        "partition-zones"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Layout])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let interior = Rect::new(1, 1, state.width as i32 - 2, state.height as i32 - 2);
        let depth = if interior.area() >= 8000 { 2 } else { 1 };
        let params = BspParams {
            min_size: 12,
            max_depth: depth,
            split_ratio: 0.5,
            split_variance: 0.1,
            aspect_ratio_threshold: 1.25,
        };
        let rng = ctx.rng(Stream::Layout)?;
        let tree = BspTree::build(interior, &params, rng);
        let leaves = tree.leaves();

        let mut zones: Vec<Zone> = leaves
            .into_iter()
            .map(|rect| Zone {
                rect,
                style: if rng.chance(0.5) {
                    ZoneStyle::Caverns
                } else {
                    ZoneStyle::Rooms
                },
            })
            .collect();
        // A hybrid map should actually mix: if every zone drew the same
        // style, flip the last one.
        if zones.len() > 1 && zones.iter().all(|z| z.style == zones[0].style) {
            let last = zones.len() - 1;
            zones[last].style = match zones[last].style {
                ZoneStyle::Rooms => ZoneStyle::Caverns,
                ZoneStyle::Caverns => ZoneStyle::Rooms,
            };
        }
        ctx.note(format!("{} zones", zones.len()));
        state.zones = zones;
        Ok(())
    }
}

/// Fill each zone with its style: a reduced BSP room layout, or a
/// cellular cavern generated off-grid and blitted in.
pub struct FillZonesPass;

impl FillZonesPass {
    fn fill_rooms_zone(
        state: &mut DungeonState,
        ctx: &mut PassContext<'_>,
        zone: Rect,
        next_id: &mut u32,
    ) -> Result<()> {
        let bsp = ctx.config.bsp.clone();
        let params = BspParams::from_ratio_band(
            (bsp.min_room_size + 2 * bsp.room_padding) as i32,
            bsp.max_depth.saturating_sub(1).max(1),
            bsp.split_ratio_min,
            bsp.split_ratio_max,
            bsp.aspect_ratio_threshold,
        );
        let tree = BspTree::build(zone, &params, ctx.rng(Stream::Layout)?);
        for leaf in tree.leaves() {
            let rng = ctx.rng(Stream::Rooms)?;
            if !rng.chance(bsp.room_placement_chance) {
                continue;
            }
            let Some(rect) = place_room_in_leaf(
                leaf,
                bsp.min_room_size as i32,
                bsp.max_room_size as i32,
                bsp.room_padding.max(1) as i32,
                rng,
            ) else {
                continue;
            };
            let seed = rng.next_u32();
            state.grid.fill_rect(
                rect.x,
                rect.y,
                rect.width as usize,
                rect.height as usize,
                CellType::Floor,
            );
            state
                .rooms
                .push(Room::from_rect(*next_id, rect, RoomKind::Normal, seed));
            *next_id += 1;
        }
        Ok(())
    }

    fn fill_cavern_zone(
        state: &mut DungeonState,
        ctx: &mut PassContext<'_>,
        zone: Rect,
        next_id: &mut u32,
    ) -> Result<()> {
        let ca = &ctx.config.cellular;
        let params = CellularParams {
            initial_fill_ratio: ca.initial_fill_ratio,
            iterations: ca.iterations,
            birth_min: ca.birth_limit,
            survival_min: ca.death_limit,
            min_region_size: ca.min_region_size,
            connect_all_regions: false,
        };

        let (zw, zh) = (zone.width as usize, zone.height as usize);
        let mut temp = Grid::new(zw, zh);
        cellular::fill_noise(&mut temp, params.initial_fill_ratio, ctx.rng(Stream::Layout)?);
        let mut scratch = Grid::new(zw, zh);
        for _ in 0..params.iterations {
            ctx.checkpoint()?;
            cellular::smooth_step(&mut temp, &mut scratch, &params);
        }

        let mut regions = extract_regions(&temp);
        regions.sort_by(|a, b| b.cells.len().cmp(&a.cells.len()));
        let Some(largest) = regions.into_iter().next() else {
            return Ok(());
        };
        if largest.cells.len() < params.min_region_size {
            return Ok(());
        }

        // Blit the kept region into the main grid; the temp border ring
        // is wall, so zone edges stay sealed.
        let cells: Vec<Point> = largest
            .cells
            .iter()
            .map(|p| Point::new(p.x + zone.x, p.y + zone.y))
            .collect();
        for p in &cells {
            state.grid.set(p.x, p.y, CellType::Floor);
        }
        let bounds = Bounds {
            min_x: largest.bounds.min_x + zone.x,
            min_y: largest.bounds.min_y + zone.y,
            max_x: largest.bounds.max_x + zone.x,
            max_y: largest.bounds.max_y + zone.y,
        };
        let region = Region { cells, bounds };
        let center = resolve_region_center(&state.grid, &region);
        let seed = ctx.rng(Stream::Rooms)?.next_u32();
        state.rooms.push(Room {
            id: *next_id,
            x: bounds.min_x,
            y: bounds.min_y,
            width: bounds.max_x - bounds.min_x + 1,
            height: bounds.max_y - bounds.min_y + 1,
            center_x: center.x,
            center_y: center.y,
            kind: RoomKind::Cavern,
            seed,
            tags: Vec::new(),
        });
        *next_id += 1;
        Ok(())
    }
}

impl Pass for FillZonesPass {
    fn id(&self) -> &'static str {
        "fill-zones"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Layout, Stream::Rooms])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let zones = state.zones.clone();
        let mut next_id = state.next_room_id();
        for zone in zones {
            ctx.checkpoint()?;
            match zone.style {
                ZoneStyle::Rooms => Self::fill_rooms_zone(state, ctx, zone.rect, &mut next_id)?,
                ZoneStyle::Caverns => Self::fill_cavern_zone(state, ctx, zone.rect, &mut next_id)?,
            }
        }
        if state.rooms.is_empty() {
            return Err(ctx.fail("no zone produced a room"));
        }
        ctx.note(format!("{} rooms across zones", state.rooms.len()));
        Ok(())
    }
}

pub fn pipeline(config: &Config) -> Pipeline {
    Pipeline::new()
        .then(InitGridPass)
        .then(PartitionZonesPass)
        .then(FillZonesPass)
        .then(ConnectivityGraphPass)
        .then(CarveCorridorsPass {
            style: config.corridor_style,
            // Zone interfaces are stitched wide so caverns and room
            // wings meet through generous openings.
            width: config.bsp.corridor_width.max(2),
            floor_penalty: FLOOR_PENALTY,
        })
        .then(ConnectRegionsPass { width: 2 })
        .then(CrossingScanPass)
        .then(PlaceDoorsPass)
        .then(RoomKindsPass)
        .then(EmitSpawnsPass)
        .then(ResolveCentersPass)
        .then(DecoratePass)
        .then(ValidateInvariantsPass)
}
