//! Connectivity graph, corridor carving and crossing detection

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::analysis::delaunay::triangulate;
use crate::analysis::mst::minimum_spanning_tree;
use crate::artifact::{Connection, ConnectionKind, DungeonState, RoomKind};
use crate::bitgrid::BitGrid;
use crate::cell::CellType;
use crate::config::{CorridorStyle, CrossingPolicy};
use crate::error::{Error, Result, Violation, ViolationKind};
use crate::geometry::Point;
use crate::grid::Grid;
use crate::pipeline::{Pass, PassContext};
use crate::rng::{Stream, StreamSet};
use crate::spatial::flood::{extract_regions, resolve_region_center};
use crate::spatial::pathfinding::{astar_corridor, bresenham_line, AStarParams};

/// Build the room graph: Delaunay over room centers thinned to its MST.
pub struct ConnectivityGraphPass;

impl Pass for ConnectivityGraphPass {
    fn id(&self) -> &'static str {
        "build-connectivity-graph"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Connections])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        state.rooms.sort_by_key(|r| r.id);
        if state.rooms.len() < 2 {
            return Ok(());
        }
        let centers: Vec<Point> = state.rooms.iter().map(|r| r.center()).collect();
        let rng = ctx.rng(Stream::Connections)?;
        let triangulation = triangulate(&centers, Some(rng));
        let tree = minimum_spanning_tree(&centers, &triangulation.edges);
        state.edges = tree
            .into_iter()
            .map(|(a, b)| (state.rooms[a].id, state.rooms[b].id))
            .collect();
        ctx.note(format!(
            "{} delaunay edges thinned to {} tree edges",
            triangulation.edge_count(),
            state.edges.len()
        ));
        Ok(())
    }
}

/// Axis-aligned L route between two points, corner deduplicated.
fn l_shape_route(a: Point, b: Point, horizontal_first: bool) -> Vec<Point> {
    let corner = if horizontal_first {
        Point::new(b.x, a.y)
    } else {
        Point::new(a.x, b.y)
    };
    let mut path = bresenham_line(a, corner);
    let second = bresenham_line(corner, b);
    path.extend(second.into_iter().skip(1));
    path
}

/// Carve a path as floor with the given band width: `floor(width / 2)`
/// cells on each side of the centerline, orthogonal to the direction of
/// travel. Width 1 carves exactly the centerline. The border ring is
/// never touched.
pub fn carve_path(grid: &mut Grid, path: &[Point], width: usize) {
    let half = (width / 2) as i32;
    let carve = |grid: &mut Grid, p: Point| {
        if p.x >= 1
            && p.y >= 1
            && (p.x as usize) < grid.width() - 1
            && (p.y as usize) < grid.height() - 1
        {
            grid.set(p.x, p.y, CellType::Floor);
        }
    };

    for (i, &p) in path.iter().enumerate() {
        carve(grid, p);
        if half == 0 {
            continue;
        }
        let (dx, dy) = if i + 1 < path.len() {
            (path[i + 1].x - p.x, path[i + 1].y - p.y)
        } else if i > 0 {
            (p.x - path[i - 1].x, p.y - path[i - 1].y)
        } else {
            (1, 0)
        };
        // Orthogonal band; diagonal steps widen on both axes.
        let (ox, oy) = (-dy, dx);
        for k in 1..=half {
            carve(grid, Point::new(p.x + ox * k, p.y + oy * k));
            carve(grid, Point::new(p.x - ox * k, p.y - oy * k));
        }
    }
}

/// Route and carve one corridor per connectivity edge.
///
/// The A* router blocks the rectangles of uninvolved non-cavern rooms
/// and the paths of unrelated earlier corridors, so corridors cannot
/// cross foreign rooms or each other; L-shape and Bresenham styles skip
/// the blocking and rely on the crossing scan instead.
pub struct CarveCorridorsPass {
    pub style: CorridorStyle,
    pub width: usize,
    pub floor_penalty: f32,
}

impl CarveCorridorsPass {
    fn block_for_edge(&self, state: &DungeonState, from: u32, to: u32, mask: &mut BitGrid) {
        mask.clear();
        for room in &state.rooms {
            if room.kind == RoomKind::Cavern || room.id == from || room.id == to {
                continue;
            }
            for y in room.y..room.rect().bottom() {
                for x in room.x..room.rect().right() {
                    mask.set(x, y, true);
                }
            }
        }
        for conn in &state.connections {
            if conn.from_room_id == from
                || conn.from_room_id == to
                || conn.to_room_id == from
                || conn.to_room_id == to
            {
                continue;
            }
            for p in &conn.path {
                mask.set(p.x, p.y, true);
            }
        }
    }

    fn carve_all(
        &self,
        state: &mut DungeonState,
        ctx: &mut PassContext<'_>,
        blocked: &mut BitGrid,
    ) -> Result<()> {
        let edges = state.edges.clone();
        let params = AStarParams {
            floor_penalty: self.floor_penalty,
            diagonal: false,
        };
        let mut fallbacks = 0usize;

        for (from_id, to_id) in edges {
            ctx.checkpoint()?;
            let (Some(from), Some(to)) = (state.room(from_id), state.room(to_id)) else {
                return Err(ctx.fail(format!("edge references unknown room {from_id}->{to_id}")));
            };
            let (a, b) = (from.center(), to.center());

            let path = match self.style {
                CorridorStyle::AStar => {
                    self.block_for_edge(state, from_id, to_id, blocked);
                    let routed = astar_corridor(&state.grid, a, b, &params, Some(&*blocked))
                        .or_else(|| astar_corridor(&state.grid, a, b, &params, None));
                    match routed {
                        Some(p) => p,
                        None => {
                            fallbacks += 1;
                            l_shape_route(a, b, true)
                        }
                    }
                }
                CorridorStyle::LShape => {
                    let horizontal_first = ctx.rng(Stream::Connections)?.chance(0.5);
                    l_shape_route(a, b, horizontal_first)
                }
                CorridorStyle::Bresenham => bresenham_line(a, b),
            };

            carve_path(&mut state.grid, &path, self.width);
            state
                .connections
                .push(Connection::open(from_id, to_id, path));
        }

        if fallbacks > 0 {
            ctx.note(format!("{fallbacks} corridors fell back to L-shape"));
        }
        Ok(())
    }
}

impl Pass for CarveCorridorsPass {
    fn id(&self) -> &'static str {
        "carve-corridors"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Connections])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let mut blocked = state.masks.acquire(state.width, state.height);
        let outcome = self.carve_all(state, ctx, &mut blocked);
        state.masks.release(blocked);
        outcome
    }
}

/// Bridge every disconnected floor region into the largest one.
///
/// Cellular maps need this after cavern rooms are carved: an inset
/// rectangular room can sit in a wall pocket with no natural opening.
pub struct ConnectRegionsPass {
    pub width: usize,
}

impl ConnectRegionsPass {
    fn nearest_room(state: &DungeonState, p: Point) -> u32 {
        state
            .rooms
            .iter()
            .min_by_key(|r| {
                let d = r.center().manhattan_to(p);
                (d, r.id)
            })
            .map(|r| r.id)
            .unwrap_or(0)
    }

    fn bridge_all(
        &self,
        state: &mut DungeonState,
        ctx: &mut PassContext<'_>,
        blocked: &mut BitGrid,
    ) -> Result<()> {
        let params = AStarParams {
            floor_penalty: 0.8,
            diagonal: false,
        };

        // Each sweep merges every secondary region into the main one;
        // re-extract and repeat in case a carve opened new topology.
        for _ in 0..8 {
            let mut regions = extract_regions(&state.grid);
            if regions.len() <= 1 {
                return Ok(());
            }
            regions.sort_by(|a, b| b.cells.len().cmp(&a.cells.len()));
            let main = regions.remove(0);

            for region in &regions {
                ctx.checkpoint()?;
                let start = resolve_region_center(&state.grid, region);

                blocked.clear();
                for conn in &state.connections {
                    for p in &conn.path {
                        blocked.set(p.x, p.y, true);
                    }
                }

                // Land on a main-region cell no corridor already owns,
                // so the bridge cannot share a cell with an unrelated
                // connection.
                let target = main
                    .cells
                    .iter()
                    .filter(|c| !blocked.get(c.x, c.y))
                    .min_by_key(|c| (c.manhattan_to(start), c.y, c.x))
                    .or_else(|| main.cells.iter().min_by_key(|c| (c.manhattan_to(start), c.y, c.x)))
                    .copied()
                    .unwrap_or(start);
                blocked.set(start.x, start.y, false);
                blocked.set(target.x, target.y, false);

                let path = astar_corridor(&state.grid, start, target, &params, Some(&*blocked))
                    .or_else(|| astar_corridor(&state.grid, start, target, &params, None))
                    .unwrap_or_else(|| bresenham_line(start, target));
                carve_path(&mut state.grid, &path, self.width);

                let from = Self::nearest_room(state, start);
                let to = Self::nearest_room(state, target);
                let mut conn = Connection::open(from, to, path);
                conn.kind = ConnectionKind::Bridge;
                state.connections.push(conn);
                state.edges.push((from, to));
            }
        }

        let remaining = extract_regions(&state.grid).len();
        if remaining > 1 {
            return Err(ctx.fail(format!("{remaining} floor regions remain disconnected")));
        }
        Ok(())
    }
}

impl Pass for ConnectRegionsPass {
    fn id(&self) -> &'static str {
        "connect-regions-with-corridors"
    }

    fn streams(&self) -> StreamSet {
        StreamSet::of(&[Stream::Connections])
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let mut blocked = state.masks.acquire(state.width, state.height);
        let outcome = self.bridge_all(state, ctx, &mut blocked);
        state.masks.release(blocked);
        outcome
    }
}

/// A detected corridor crossing: connection indices and the first
/// shared cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub first: usize,
    pub second: usize,
    pub at: Point,
}

/// Scan all connection pairs for shared path cells where the owning
/// connections do not share a room.
#[must_use]
pub fn find_crossings(connections: &[Connection]) -> Vec<Crossing> {
    let mut by_cell: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for (i, conn) in connections.iter().enumerate() {
        let mut seen_cells = BTreeSet::new();
        for p in &conn.path {
            if seen_cells.insert((p.x, p.y)) {
                by_cell.entry((p.x, p.y)).or_default().push(i);
            }
        }
    }

    let related = |a: &Connection, b: &Connection| {
        a.from_room_id == b.from_room_id
            || a.from_room_id == b.to_room_id
            || a.to_room_id == b.from_room_id
            || a.to_room_id == b.to_room_id
    };

    let mut seen_pairs = BTreeSet::new();
    let mut crossings = Vec::new();
    let mut cells: Vec<_> = by_cell.into_iter().collect();
    cells.sort_by_key(|&((x, y), _)| (y, x));
    for ((x, y), owners) in cells {
        for i in 0..owners.len() {
            for j in i + 1..owners.len() {
                let (a, b) = (owners[i], owners[j]);
                if related(&connections[a], &connections[b]) {
                    continue;
                }
                if seen_pairs.insert((a.min(b), a.max(b))) {
                    crossings.push(Crossing {
                        first: a.min(b),
                        second: a.max(b),
                        at: Point::new(x, y),
                    });
                }
            }
        }
    }
    crossings
}

/// Post-carve crossing detector. Policy `record` notes the crossings;
/// `reject` fails the run with the crossing list.
pub struct CrossingScanPass;

impl Pass for CrossingScanPass {
    fn id(&self) -> &'static str {
        "detect-crossings"
    }

    fn run(&self, state: &mut DungeonState, ctx: &mut PassContext<'_>) -> Result<()> {
        let crossings = find_crossings(&state.connections);
        if crossings.is_empty() {
            return Ok(());
        }
        match ctx.config.crossing_policy {
            CrossingPolicy::Record => {
                debug!("{} corridor crossings recorded", crossings.len());
                ctx.note(format!("{} crossings", crossings.len()));
                Ok(())
            }
            CrossingPolicy::Reject => {
                let violations = crossings
                    .iter()
                    .map(|c| {
                        Violation::new(
                            ViolationKind::Crossing,
                            Some(c.at),
                            format!("connections {} and {} share a cell", c.first, c.second),
                        )
                    })
                    .collect();
                Err(Error::GenerationFailed {
                    pass: self.id().to_string(),
                    message: format!("{} corridor crossings", crossings.len()),
                    violations,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Room;
    use crate::geometry::Rect;

    #[test]
    fn l_shape_has_no_duplicate_corner() {
        let path = l_shape_route(Point::new(2, 2), Point::new(8, 6), true);
        assert_eq!(path[0], Point::new(2, 2));
        assert_eq!(*path.last().unwrap(), Point::new(8, 6));
        for pair in path.windows(2) {
            assert_ne!(pair[0], pair[1]);
            assert!(pair[0].adjacent_to(pair[1]));
        }
    }

    #[test]
    fn carve_width_three_cuts_a_band() {
        let mut grid = Grid::new(12, 9);
        let path: Vec<Point> = (2..10).map(|x| Point::new(x, 4)).collect();
        carve_path(&mut grid, &path, 3);
        for x in 2..10 {
            assert_eq!(grid.get(x, 3), CellType::Floor);
            assert_eq!(grid.get(x, 4), CellType::Floor);
            assert_eq!(grid.get(x, 5), CellType::Floor);
            assert_eq!(grid.get(x, 2), CellType::Wall);
        }
    }

    #[test]
    fn carve_never_touches_border() {
        let mut grid = Grid::new(8, 8);
        let path: Vec<Point> = (0..8).map(|x| Point::new(x, 1)).collect();
        carve_path(&mut grid, &path, 5);
        assert!(grid.border_is_walled());
    }

    #[test]
    fn crossings_require_disjoint_rooms() {
        let cross = Point::new(5, 5);
        let mk = |from, to, path: Vec<Point>| Connection::open(from, to, path);
        // Two corridors meeting at (5,5); first pair shares room 1, the
        // second pair is disjoint.
        let shared = vec![
            mk(0, 1, vec![Point::new(3, 5), Point::new(4, 5), cross]),
            mk(1, 2, vec![cross, Point::new(6, 5), Point::new(7, 5)]),
        ];
        assert!(find_crossings(&shared).is_empty());

        let disjoint = vec![
            mk(0, 1, vec![Point::new(3, 5), Point::new(4, 5), cross]),
            mk(2, 3, vec![Point::new(5, 3), Point::new(5, 4), cross]),
        ];
        let found = find_crossings(&disjoint);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].at, cross);
    }

    #[test]
    fn nearest_room_prefers_low_id_on_ties() {
        let mut state = DungeonState::new(20, 20);
        state
            .rooms
            .push(Room::from_rect(0, Rect::new(2, 2, 3, 3), RoomKind::Normal, 1));
        state
            .rooms
            .push(Room::from_rect(1, Rect::new(8, 2, 3, 3), RoomKind::Normal, 2));
        // Equidistant from both centers.
        let mid = Point::new(6, 3);
        assert_eq!(ConnectRegionsPass::nearest_room(&state, mid), 0);
    }
}
