//! Door placement along carved corridors

use crate::artifact::{ConnectionKind, DungeonState};
use crate::cell::CellType;
use crate::config::DoorPosition;
use crate::error::Result;
use crate::geometry::Point;
use crate::grid::Grid;
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};

/// Index of the chokepoint: the interior path cell (excluding the two
/// cells nearest each endpoint) with the fewest 8-neighbor floor cells;
/// ties break to the lowest path index.
fn chokepoint_index(grid: &Grid, path: &[Point]) -> Option<usize> {
    if path.len() < 5 {
        return None;
    }
    let mut best: Option<(usize, usize)> = None;
    for (i, p) in path.iter().enumerate().take(path.len() - 2).skip(2) {
        let floors = grid.count_neighbors8(p.x, p.y, CellType::Floor);
        if best.map_or(true, |(bf, _)| floors < bf) {
            best = Some((floors, i));
        }
    }
    best.map(|(_, i)| i)
}

/// Place doors on qualifying connections with probability `door_ratio`.
///
/// The chosen cell must be floor and must not be any room's center, so
/// a door can never break the room-center walkability invariant; when
/// the preferred cell is unusable the nearest usable interior cell
/// takes its place.
pub struct PlaceDoorsPass;

impl PlaceDoorsPass {
    fn usable(state: &DungeonState, p: Point) -> bool {
        state.grid.get(p.x, p.y) == CellType::Floor
            && !state
                .rooms
                .iter()
                .any(|r| r.center_x == p.x && r.center_y == p.y)
    }

    /// Interior index nearest `preferred` whose cell is usable.
    fn pick_index(state: &DungeonState, path: &[Point], preferred: usize) -> Option<usize> {
        let last_interior = path.len().checked_sub(2)?;
        if last_interior < 1 {
            return None;
        }
        let preferred = preferred.clamp(1, last_interior);
        for offset in 0..path.len() {
            for candidate in [preferred.saturating_sub(offset), preferred + offset] {
                if (1..=last_interior).contains(&candidate)
                    && Self::usable(state, path[candidate])
                {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl Pass for PlaceDoorsPass {
    fn id(&self) -> &'static str {
        "place-doors"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Details])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let doors = ctx.config.doors.clone();
        let mut placed = 0usize;

        for i in 0..state.connections.len() {
            ctx.checkpoint()?;
            let path = state.connections[i].path.clone();
            if path.len() < doors.min_corridor_length {
                continue;
            }
            let rng = ctx.rng(Stream::Details)?;
            if !rng.chance(doors.door_ratio) {
                continue;
            }

            let preferred = match doors.preferred_position {
                DoorPosition::Center => path.len() / 2,
                DoorPosition::Start => 1,
                DoorPosition::End => path.len() - 2,
                DoorPosition::Chokepoint => {
                    chokepoint_index(&state.grid, &path).unwrap_or(path.len() / 2)
                }
            };
            let Some(index) = Self::pick_index(state, &path, preferred) else {
                continue;
            };
            let cell = path[index];

            let rng = ctx.rng(Stream::Details)?;
            let locked = doors.allow_locked_doors && rng.chance(doors.locked_door_ratio);
            let kind = if locked {
                ConnectionKind::LockedDoor
            } else {
                ConnectionKind::Door
            };
            let key_id = if locked {
                Some(format!("key-{:08x}", rng.next_u32()))
            } else {
                None
            };

            state.grid.set(cell.x, cell.y, CellType::Door);
            let conn = &mut state.connections[i];
            conn.kind = kind;
            conn.door_position = Some(cell);
            if let Some(key_id) = key_id {
                conn.metadata.insert("keyId".to_string(), key_id);
            }
            placed += 1;
        }
        ctx.note(format!("{placed} doors"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Connection, Room, RoomKind};
    use crate::config::Config;
    use crate::geometry::Rect;
    use crate::pipeline::{Pipeline, RunContext};
    use crate::rng::Streams;
    use crate::seed::Seed;
    use crate::trace::Trace;

    fn corridor_state() -> DungeonState {
        let mut state = DungeonState::new(20, 9);
        state.grid.fill_rect(2, 2, 3, 3, CellType::Floor);
        state.grid.fill_rect(14, 2, 3, 3, CellType::Floor);
        let path: Vec<Point> = (3..=15).map(|x| Point::new(x, 3)).collect();
        for p in &path {
            state.grid.set(p.x, p.y, CellType::Floor);
        }
        state
            .rooms
            .push(Room::from_rect(0, Rect::new(2, 2, 3, 3), RoomKind::Normal, 1));
        state
            .rooms
            .push(Room::from_rect(1, Rect::new(14, 2, 3, 3), RoomKind::Normal, 2));
        state.connections.push(Connection::open(0, 1, path));
        state
    }

    fn run_doors(state: &mut DungeonState, config: &Config) {
        let seed = Seed::from_numeric(5);
        let mut streams = Streams::derive(5);
        let mut trace = Trace::disabled();
        let mut run = RunContext {
            streams: &mut streams,
            config,
            seed: &seed,
            trace: &mut trace,
            cancel: None,
            deadline: None,
            budget_ms: 0,
        };
        Pipeline::new()
            .then(PlaceDoorsPass)
            .run(state, &mut run)
            .unwrap();
    }

    #[test]
    fn ratio_one_places_a_door_on_the_path() {
        let mut state = corridor_state();
        let mut config = Config::default();
        config.doors.door_ratio = 1.0;
        config.doors.allow_locked_doors = false;
        run_doors(&mut state, &config);

        let conn = &state.connections[0];
        assert_eq!(conn.kind, ConnectionKind::Door);
        let door = conn.door_position.expect("door position");
        assert!(conn.path.contains(&door));
        assert_eq!(state.grid.get(door.x, door.y), CellType::Door);
    }

    #[test]
    fn ratio_zero_places_nothing() {
        let mut state = corridor_state();
        let mut config = Config::default();
        config.doors.door_ratio = 0.0;
        run_doors(&mut state, &config);
        assert_eq!(state.connections[0].kind, ConnectionKind::Open);
        assert!(state.connections[0].door_position.is_none());
    }

    #[test]
    fn short_corridors_are_skipped() {
        let mut state = corridor_state();
        state.connections[0].path.truncate(3);
        let mut config = Config::default();
        config.doors.door_ratio = 1.0;
        run_doors(&mut state, &config);
        assert!(state.connections[0].door_position.is_none());
    }

    #[test]
    fn locked_doors_carry_a_key_id() {
        let mut state = corridor_state();
        let mut config = Config::default();
        config.doors.door_ratio = 1.0;
        config.doors.allow_locked_doors = true;
        config.doors.locked_door_ratio = 1.0;
        run_doors(&mut state, &config);

        let conn = &state.connections[0];
        assert_eq!(conn.kind, ConnectionKind::LockedDoor);
        let key = conn.metadata.get("keyId").expect("keyId metadata");
        assert!(key.starts_with("key-"));
    }

    #[test]
    fn doors_avoid_room_centers() {
        let mut state = corridor_state();
        // Make every interior cell a room center except one.
        let path = state.connections[0].path.clone();
        for (i, p) in path.iter().enumerate().skip(1).take(path.len() - 2) {
            if i == 4 {
                continue;
            }
            let mut r = Room::from_rect(10 + i as u32, Rect::new(p.x, p.y, 1, 1), RoomKind::Normal, 0);
            r.center_x = p.x;
            r.center_y = p.y;
            state.rooms.push(r);
        }
        let mut config = Config::default();
        config.doors.door_ratio = 1.0;
        run_doors(&mut state, &config);
        assert_eq!(state.connections[0].door_position, Some(path[4]));
    }

    #[test]
    fn chokepoint_finds_narrowest_cell() {
        // Corridor with an open plaza around one end: the narrow middle
        // wins.
        let mut grid = Grid::new(20, 11);
        let path: Vec<Point> = (2..=17).map(|x| Point::new(x, 5)).collect();
        for p in &path {
            grid.set(p.x, p.y, CellType::Floor);
        }
        grid.fill_rect(12, 2, 6, 8, CellType::Floor);
        let index = chokepoint_index(&grid, &path).unwrap();
        // Cells from x=11 onward border the plaza; the tie among the
        // narrow cells resolves to the first interior index.
        assert_eq!(index, 2);
    }
}
