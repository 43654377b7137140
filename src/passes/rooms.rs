//! Room placement, typing and center resolution passes

use crate::algorithms::bsp::{place_room_in_leaf, BspParams, BspTree};
use crate::artifact::{DungeonState, Room, RoomKind};
use crate::bitgrid::BitGrid;
use crate::cell::CellType;
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};
use crate::spatial::distance::{dijkstra_map, DistanceParams};
use crate::spatial::flood::{resolve_region_center, FifoQueue};

/// Partition the grid interior into BSP leaves.
pub struct BspPartitionPass;

impl Pass for BspPartitionPass {
    fn id(&self) -> &'static str {
        "bsp-partition"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Layout])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let bsp = &ctx.config.bsp;
        let params = BspParams::from_ratio_band(
            (bsp.min_room_size + 2 * bsp.room_padding) as i32,
            bsp.max_depth,
            bsp.split_ratio_min,
            bsp.split_ratio_max,
            bsp.aspect_ratio_threshold,
        );
        let area = Rect::new(1, 1, state.width as i32 - 2, state.height as i32 - 2);
        let rng = ctx.rng(Stream::Layout)?;
        let tree = BspTree::build(area, &params, rng);
        state.partitions = tree.leaves();
        ctx.note(format!("{} leaves", state.partitions.len()));
        Ok(())
    }
}

/// Place one room per leaf, subject to the placement chance and the
/// density-capped room count.
pub struct PlaceRoomsPass;

impl Pass for PlaceRoomsPass {
    fn id(&self) -> &'static str {
        "place-rooms-in-leaves"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Rooms])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let bsp = ctx.config.bsp.clone();
        let cap = ctx.config.room_count;
        let leaves = state.partitions.clone();
        let mut next_id = state.next_room_id();

        for leaf in leaves {
            if cap > 0 && state.rooms.len() >= cap {
                break;
            }
            ctx.checkpoint()?;
            let rng = ctx.rng(Stream::Rooms)?;
            if !rng.chance(bsp.room_placement_chance) {
                continue;
            }
            let Some(rect) = place_room_in_leaf(
                leaf,
                bsp.min_room_size as i32,
                bsp.max_room_size as i32,
                bsp.room_padding as i32,
                rng,
            ) else {
                continue;
            };
            let seed = rng.next_u32();
            state
                .rooms
                .push(Room::from_rect(next_id, rect, RoomKind::Normal, seed));
            next_id += 1;
        }

        if state.rooms.is_empty() {
            return Err(ctx.fail("no leaf could hold a room"));
        }
        ctx.note(format!("{} rooms", state.rooms.len()));
        Ok(())
    }
}

/// Carve every placed room into the grid.
pub struct CarveRoomsPass;

impl Pass for CarveRoomsPass {
    fn id(&self) -> &'static str {
        "carve-rooms"
    }

    fn run(&self, state: &mut DungeonState, _ctx: &mut PassContext<'_>) -> Result<()> {
        for room in &state.rooms {
            state.grid.fill_rect(
                room.x,
                room.y,
                room.width as usize,
                room.height as usize,
                CellType::Floor,
            );
        }
        Ok(())
    }
}

/// Wrap each kept cavern region in a room record with a BFS-resolved
/// walkable center.
pub struct SynthesizeRegionRoomsPass;

impl Pass for SynthesizeRegionRoomsPass {
    fn id(&self) -> &'static str {
        "synthesize-room-per-region"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Rooms])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let mut next_id = state.next_room_id();
        let regions = std::mem::take(&mut state.regions);
        for region in &regions {
            let b = region.bounds;
            let center = resolve_region_center(&state.grid, region);
            let seed = ctx.rng(Stream::Rooms)?.next_u32();
            state.rooms.push(Room {
                id: next_id,
                x: b.min_x,
                y: b.min_y,
                width: b.max_x - b.min_x + 1,
                height: b.max_y - b.min_y + 1,
                center_x: center.x,
                center_y: center.y,
                kind: RoomKind::Cavern,
                seed,
                tags: Vec::new(),
            });
            next_id += 1;
        }
        state.regions = regions;
        if state.rooms.is_empty() {
            return Err(ctx.fail("no cavern regions survived filtering"));
        }
        Ok(())
    }
}

/// Optionally carve a rectangular room inside each large cavern.
pub struct CavernRoomsPass;

impl Pass for CavernRoomsPass {
    fn id(&self) -> &'static str {
        "place-rooms-in-caverns"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Rooms])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let chance = ctx.config.cellular.room_in_cavern_chance;
        let [min_size, max_size] = ctx.config.room_size_range;
        let caverns: Vec<Rect> = state
            .rooms
            .iter()
            .filter(|r| r.kind == RoomKind::Cavern)
            .map(Room::rect)
            .collect();
        let mut next_id = state.next_room_id();

        for cavern in caverns {
            ctx.checkpoint()?;
            // Leave a two-cell margin so carving stays inside the cavern
            // footprint and clear of the map border.
            let usable = cavern.inset(2);
            if usable.width < min_size as i32 || usable.height < min_size as i32 {
                continue;
            }
            let rng = ctx.rng(Stream::Rooms)?;
            if !rng.chance(chance) {
                continue;
            }
            let w = rng.int_in(min_size as i32, usable.width.min(max_size as i32) + 1);
            let h = rng.int_in(min_size as i32, usable.height.min(max_size as i32) + 1);
            let x = usable.x + rng.int_in(0, usable.width - w + 1);
            let y = usable.y + rng.int_in(0, usable.height - h + 1);
            let rect = Rect::new(x, y, w, h);
            let seed = rng.next_u32();
            state
                .grid
                .fill_rect(rect.x, rect.y, rect.width as usize, rect.height as usize, CellType::Floor);
            state
                .rooms
                .push(Room::from_rect(next_id, rect, RoomKind::Normal, seed));
            next_id += 1;
        }
        Ok(())
    }
}

/// Assign entrance and exit from Dijkstra extremes, then sprinkle
/// flavor kinds over the remaining rooms.
pub struct RoomKindsPass;

impl Pass for RoomKindsPass {
    fn id(&self) -> &'static str {
        "tag-room-types"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Rooms])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        if state.rooms.is_empty() {
            return Err(ctx.fail("cannot tag room types without rooms"));
        }
        state.rooms.sort_by_key(|r| r.id);
        let entrance_id = state.rooms[0].id;
        let entrance_center = state.rooms[0].center();
        if let Some(room) = state.room_mut(entrance_id) {
            room.kind = RoomKind::Entrance;
        }

        let map = dijkstra_map(&state.grid, &[entrance_center], &DistanceParams::default());

        // Exit: the room whose center lies at maximal reachable
        // distance; ties keep the lowest id.
        let mut exit_id: Option<u32> = None;
        let mut best = 0.0f32;
        for room in state.rooms.iter().filter(|r| r.id != entrance_id) {
            let d = map.get(room.center_x, room.center_y);
            if d.is_finite() && d > best {
                best = d;
                exit_id = Some(room.id);
            }
        }
        if let Some(id) = exit_id {
            if let Some(room) = state.room_mut(id) {
                room.kind = RoomKind::Exit;
            }
        }

        // Flavor tags for the rest, drawn in id order.
        for room in state.rooms.iter_mut() {
            if room.id == entrance_id || Some(room.id) == exit_id {
                continue;
            }
            if room.kind != RoomKind::Normal {
                continue;
            }
            let roll = ctx.rng(Stream::Rooms)?.next_f64();
            room.kind = if roll < 0.10 {
                RoomKind::Boss
            } else if roll < 0.22 {
                RoomKind::Treasure
            } else if roll < 0.32 {
                RoomKind::Library
            } else {
                RoomKind::Normal
            };
        }
        Ok(())
    }
}

/// Ensure every room center sits on a floor cell, searching outward
/// from the geometric center when it does not.
pub struct ResolveCentersPass;

impl Pass for ResolveCentersPass {
    fn id(&self) -> &'static str {
        "resolve-room-centers"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        for i in 0..state.rooms.len() {
            let (room_id, center, search) = {
                let room = &state.rooms[i];
                (room.id, room.center(), room.rect().inset(-2))
            };
            if state.grid.get(center.x, center.y) == CellType::Floor {
                continue;
            }
            match nearest_floor(&state.grid, center, search) {
                Some(found) => {
                    state.rooms[i].center_x = found.x;
                    state.rooms[i].center_y = found.y;
                }
                None => {
                    return Err(ctx.fail(format!(
                        "room {room_id} has no walkable cell near its center"
                    )))
                }
            }
        }
        Ok(())
    }
}

/// BFS from `from` for the nearest floor cell within `search`.
fn nearest_floor(grid: &crate::grid::Grid, from: Point, search: Rect) -> Option<Point> {
    if !grid.contains_point(from) {
        return None;
    }
    let mut visited = BitGrid::new(grid.width(), grid.height());
    let mut queue = FifoQueue::with_capacity(grid.width() * grid.height());
    queue.push(from.x, from.y);
    visited.set(from.x, from.y, true);
    while let Some((x, y)) = queue.pop() {
        if grid.get(x, y) == CellType::Floor {
            return Some(Point::new(x, y));
        }
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if search.contains(Point::new(nx, ny)) && grid.in_bounds(nx, ny) && !visited.get(nx, ny)
            {
                visited.set(nx, ny, true);
                queue.push(nx, ny);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::{Pipeline, RunContext};
    use crate::rng::Streams;
    use crate::seed::Seed;
    use crate::trace::Trace;

    fn run_passes(
        pipeline: &Pipeline,
        state: &mut DungeonState,
        config: &Config,
        seed: u32,
    ) -> Result<()> {
        let resolved = Seed::from_numeric(seed);
        let mut streams = Streams::derive(seed);
        let mut trace = Trace::disabled();
        let mut run = RunContext {
            streams: &mut streams,
            config,
            seed: &resolved,
            trace: &mut trace,
            cancel: None,
            deadline: None,
            budget_ms: 0,
        };
        pipeline.run(state, &mut run)
    }

    fn bsp_rooms(seed: u32, w: usize, h: usize) -> DungeonState {
        let config = Config {
            width: w,
            height: h,
            ..Config::default()
        }
        .clamped();
        let mut state = DungeonState::new(w, h);
        let pipeline = Pipeline::new()
            .then(InitGridPassShim)
            .then(BspPartitionPass)
            .then(PlaceRoomsPass)
            .then(CarveRoomsPass);
        run_passes(&pipeline, &mut state, &config, seed).unwrap();
        state
    }

    struct InitGridPassShim;
    impl Pass for InitGridPassShim {
        fn id(&self) -> &'static str {
            "initialize-grid"
        }
        fn run(&self, state: &mut DungeonState, _ctx: &mut PassContext<'_>) -> Result<()> {
            state.grid.fill(CellType::Wall);
            Ok(())
        }
    }

    #[test]
    fn bsp_places_rooms_inside_interior() {
        let state = bsp_rooms(42, 80, 60);
        assert!(state.rooms.len() >= 3);
        for room in &state.rooms {
            assert!(room.x >= 1 && room.y >= 1);
            assert!(room.rect().right() <= 79);
            assert!(room.rect().bottom() <= 59);
            assert_eq!(
                state.grid.get(room.center_x, room.center_y),
                CellType::Floor
            );
        }
    }

    #[test]
    fn rooms_do_not_overlap() {
        let state = bsp_rooms(7, 80, 60);
        for (i, a) in state.rooms.iter().enumerate() {
            for b in &state.rooms[i + 1..] {
                assert!(!a.rect().intersects(&b.rect()));
            }
        }
    }

    #[test]
    fn resolve_centers_moves_off_wall_centers() {
        let mut state = DungeonState::new(12, 12);
        // A room whose geometric center was hollowed out.
        state.grid.fill_rect(2, 2, 5, 5, CellType::Floor);
        state.grid.set(4, 4, CellType::Wall);
        let mut room = Room::from_rect(0, Rect::new(2, 2, 5, 5), RoomKind::Normal, 1);
        room.center_x = 4;
        room.center_y = 4;
        state.rooms.push(room);

        let pipeline = Pipeline::new().then(ResolveCentersPass);
        run_passes(&pipeline, &mut state, &Config::default(), 1).unwrap();
        let room = &state.rooms[0];
        assert_eq!(state.grid.get(room.center_x, room.center_y), CellType::Floor);
    }
}
