//! Invariant validation over the working state and final artifact

use crate::artifact::{DungeonArtifact, DungeonState, SpawnKind};
use crate::bitgrid::BitGrid;
use crate::cell::CellType;
use crate::checksum;
use crate::config::{Config, CrossingPolicy};
use crate::error::{Error, Result, Violation, ViolationKind};
use crate::geometry::Point;
use crate::grid::Grid;
use crate::passes::connect::find_crossings;
use crate::pipeline::{Pass, PassContext};
use crate::spatial::flood::FifoQueue;

fn check_border(grid: &Grid, out: &mut Vec<Violation>) {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    for x in 0..w {
        for y in [0, h - 1] {
            if !grid.get(x, y).is_wall() {
                out.push(Violation::new(
                    ViolationKind::Border,
                    Some(Point::new(x, y)),
                    "border cell is not wall",
                ));
                return;
            }
        }
    }
    for y in 0..h {
        for x in [0, w - 1] {
            if !grid.get(x, y).is_wall() {
                out.push(Violation::new(
                    ViolationKind::Border,
                    Some(Point::new(x, y)),
                    "border cell is not wall",
                ));
                return;
            }
        }
    }
}

fn check_connectivity(grid: &Grid, out: &mut Vec<Violation>) {
    let (w, h) = (grid.width(), grid.height());
    let total = grid.count(CellType::is_walkable);
    if total == 0 {
        out.push(Violation::new(
            ViolationKind::Connectivity,
            None,
            "no walkable cells",
        ));
        return;
    }

    let start = grid
        .iter()
        .find(|&(_, _, c)| c.is_walkable())
        .map(|(x, y, _)| Point::new(x as i32, y as i32));
    let Some(start) = start else { return };

    let mut visited = BitGrid::new(w, h);
    let mut queue = FifoQueue::with_capacity(w * h);
    queue.push(start.x, start.y);
    visited.set(start.x, start.y, true);
    let mut reached = 0usize;
    while let Some((x, y)) = queue.pop() {
        reached += 1;
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if grid.in_bounds(nx, ny) && grid.get(nx, ny).is_walkable() && !visited.get(nx, ny) {
                visited.set(nx, ny, true);
                queue.push(nx, ny);
            }
        }
    }
    if reached != total {
        // Name one unreached cell for the report.
        let stranded = grid
            .iter()
            .find(|&(x, y, c)| c.is_walkable() && !visited.get(x as i32, y as i32))
            .map(|(x, y, _)| Point::new(x as i32, y as i32));
        out.push(Violation::new(
            ViolationKind::Connectivity,
            stranded,
            format!("{} of {} walkable cells unreachable", total - reached, total),
        ));
    }
}

/// Check every invariant on the working state. An empty list means the
/// dungeon is structurally sound.
#[must_use]
pub fn validate_state(state: &DungeonState, config: &Config) -> Vec<Violation> {
    let mut out = Vec::new();
    check_border(&state.grid, &mut out);
    check_connectivity(&state.grid, &mut out);

    for room in &state.rooms {
        if state.grid.get(room.center_x, room.center_y) != CellType::Floor {
            out.push(Violation::new(
                ViolationKind::RoomCenter,
                Some(room.center()),
                format!("room {} center is not floor", room.id),
            ));
        }
    }

    let entrance = state
        .spawns
        .iter()
        .find(|s| s.kind == SpawnKind::Entrance);
    match entrance {
        Some(spawn) if state.grid.get(spawn.position.x, spawn.position.y) == CellType::Floor => {}
        Some(spawn) => out.push(Violation::new(
            ViolationKind::MissingEntrance,
            Some(spawn.position),
            "entrance spawn is not on floor",
        )),
        None => out.push(Violation::new(
            ViolationKind::MissingEntrance,
            None,
            "no entrance spawn",
        )),
    }
    let exit = state.spawns.iter().find(|s| s.kind == SpawnKind::Exit);
    match exit {
        Some(spawn) if state.grid.get(spawn.position.x, spawn.position.y) == CellType::Floor => {}
        Some(spawn) => out.push(Violation::new(
            ViolationKind::MissingExit,
            Some(spawn.position),
            "exit spawn is not on floor",
        )),
        None => out.push(Violation::new(ViolationKind::MissingExit, None, "no exit spawn")),
    }

    for spawn in &state.spawns {
        if state.grid.get(spawn.position.x, spawn.position.y) != CellType::Floor {
            out.push(Violation::new(
                ViolationKind::Spawn,
                Some(spawn.position),
                format!("spawn in room {} is not on floor", spawn.room_id),
            ));
        }
    }

    if config.crossing_policy == CrossingPolicy::Reject {
        for crossing in find_crossings(&state.connections) {
            out.push(Violation::new(
                ViolationKind::Crossing,
                Some(crossing.at),
                format!(
                    "connections {} and {} share a cell without a shared room",
                    crossing.first, crossing.second
                ),
            ));
        }
    }
    out
}

/// Artifact-level validation: terrain-backed re-checks plus checksum
/// integrity.
#[must_use]
pub fn validate_artifact(artifact: &DungeonArtifact) -> Vec<Violation> {
    let mut out = Vec::new();

    let mut grid = Grid::new(artifact.width, artifact.height);
    for y in 0..artifact.height {
        for x in 0..artifact.width {
            let byte = artifact.terrain[y * artifact.width + x];
            grid.set_at(x, y, CellType::from_byte(byte).unwrap_or(CellType::Wall));
        }
    }
    check_border(&grid, &mut out);
    check_connectivity(&grid, &mut out);

    for room in &artifact.rooms {
        if artifact.cell(room.center_x, room.center_y) != CellType::Floor {
            out.push(Violation::new(
                ViolationKind::RoomCenter,
                Some(room.center()),
                format!("room {} center is not floor", room.id),
            ));
        }
    }
    for spawn in &artifact.spawns {
        if artifact.cell(spawn.position.x, spawn.position.y) != CellType::Floor {
            out.push(Violation::new(
                ViolationKind::Spawn,
                Some(spawn.position),
                "spawn is not on floor",
            ));
        }
    }
    if artifact.entrance_spawn().is_none() {
        out.push(Violation::new(
            ViolationKind::MissingEntrance,
            None,
            "no entrance spawn",
        ));
    }
    if artifact.exit_spawn().is_none() {
        out.push(Violation::new(ViolationKind::MissingExit, None, "no exit spawn"));
    }

    if !checksum::verify(artifact) {
        out.push(Violation::new(
            ViolationKind::Checksum,
            None,
            "stored checksum does not match the artifact",
        ));
    }
    out
}

/// Terminal validation pass: any violation fails the pipeline.
pub struct ValidateInvariantsPass;

impl Pass for ValidateInvariantsPass {
    fn id(&self) -> &'static str {
        "validate-invariants"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let violations = validate_state(state, ctx.config);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::GenerationFailed {
                pass: self.id().to_string(),
                message: format!("{} invariant violations", violations.len()),
                violations,
            })
        }
    }
}
