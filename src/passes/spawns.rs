//! Spawn emission from the entrance distance field

use crate::artifact::{DungeonState, SpawnKind, SpawnPoint};
use crate::error::Result;
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};
use crate::spatial::distance::{dijkstra_map, DistanceParams};

/// Emit one spawn per room at its resolved walkable center, with the
/// true graph distance from the entrance.
///
/// The entrance room emits `entrance`; the exit room emits `exit`. When
/// a map has a single room (one kept cavern), the exit is placed at the
/// furthest reachable cell instead, so entrance and exit always exist.
pub struct EmitSpawnsPass;

impl Pass for EmitSpawnsPass {
    fn id(&self) -> &'static str {
        "emit-spawns"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Details])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        state.rooms.sort_by_key(|r| r.id);
        let entrance = state
            .entrance()
            .or_else(|| state.rooms.first())
            .ok_or_else(|| ctx.fail("no rooms to spawn into"))?;
        let entrance_id = entrance.id;
        let entrance_center = entrance.center();

        let map = dijkstra_map(&state.grid, &[entrance_center], &DistanceParams::default());
        let exit_id = state.exit().map(|r| r.id);

        state.spawns.clear();
        for room in &state.rooms {
            let center = room.center();
            let distance = map.get(center.x, center.y);
            if !distance.is_finite() {
                return Err(ctx.fail(format!(
                    "room {} center is unreachable from the entrance",
                    room.id
                )));
            }
            let kind = if room.id == entrance_id {
                SpawnKind::Entrance
            } else if Some(room.id) == exit_id {
                SpawnKind::Exit
            } else {
                SpawnKind::Spawn
            };
            state.spawns.push(SpawnPoint {
                position: center,
                room_id: room.id,
                kind,
                tags: room.tags.clone(),
                weight: 1.0,
                distance_from_start: distance,
            });
        }

        if exit_id.is_none() {
            // Single-room map: the exit is the furthest reachable cell.
            let (position, distance) = map
                .find_furthest()
                .ok_or_else(|| ctx.fail("no reachable cell for the exit"))?;
            state.spawns.push(SpawnPoint {
                position,
                room_id: entrance_id,
                kind: SpawnKind::Exit,
                tags: Vec::new(),
                weight: 1.0,
                distance_from_start: distance,
            });
        }
        ctx.note(format!("{} spawns", state.spawns.len()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Room, RoomKind};
    use crate::cell::CellType;
    use crate::config::Config;
    use crate::geometry::Rect;
    use crate::pipeline::{Pipeline, RunContext};
    use crate::rng::Streams;
    use crate::seed::Seed;
    use crate::trace::Trace;

    fn run_spawns(state: &mut DungeonState) {
        let config = Config::default();
        let seed = Seed::from_numeric(5);
        let mut streams = Streams::derive(5);
        let mut trace = Trace::disabled();
        let mut run = RunContext {
            streams: &mut streams,
            config: &config,
            seed: &seed,
            trace: &mut trace,
            cancel: None,
            deadline: None,
            budget_ms: 0,
        };
        Pipeline::new()
            .then(EmitSpawnsPass)
            .run(state, &mut run)
            .unwrap();
    }

    fn linked_rooms() -> DungeonState {
        let mut state = DungeonState::new(24, 9);
        state.grid.fill_rect(2, 2, 4, 4, CellType::Floor);
        state.grid.fill_rect(17, 2, 4, 4, CellType::Floor);
        for x in 5..=17 {
            state.grid.set(x, 3, CellType::Floor);
        }
        let mut entrance = Room::from_rect(0, Rect::new(2, 2, 4, 4), RoomKind::Entrance, 1);
        entrance.center_x = 4;
        entrance.center_y = 3;
        let exit = Room::from_rect(1, Rect::new(17, 2, 4, 4), RoomKind::Exit, 2);
        state.rooms.push(entrance);
        state.rooms.push(exit);
        state
    }

    #[test]
    fn emits_entrance_and_exit() {
        let mut state = linked_rooms();
        run_spawns(&mut state);
        assert_eq!(state.spawns.len(), 2);
        let entrance = state
            .spawns
            .iter()
            .find(|s| s.kind == SpawnKind::Entrance)
            .unwrap();
        assert_eq!(entrance.distance_from_start, 0.0);
        let exit = state
            .spawns
            .iter()
            .find(|s| s.kind == SpawnKind::Exit)
            .unwrap();
        assert!(exit.distance_from_start > 10.0);
    }

    #[test]
    fn single_room_gets_furthest_cell_exit() {
        let mut state = DungeonState::new(20, 8);
        state.grid.fill_rect(1, 1, 18, 6, CellType::Floor);
        let mut cavern = Room::from_rect(0, Rect::new(1, 1, 18, 6), RoomKind::Entrance, 1);
        cavern.center_x = 2;
        cavern.center_y = 2;
        state.rooms.push(cavern);
        run_spawns(&mut state);

        assert_eq!(state.spawns.len(), 2);
        let exit = state
            .spawns
            .iter()
            .find(|s| s.kind == SpawnKind::Exit)
            .unwrap();
        assert!(exit.distance_from_start > 0.0);
        assert_eq!(
            state.grid.get(exit.position.x, exit.position.y),
            CellType::Floor
        );
    }
}
