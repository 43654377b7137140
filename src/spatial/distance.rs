//! Dijkstra distance maps and derived fields

use crate::cell::CellType;
use crate::geometry::Point;
use crate::grid::Grid;
use crate::heap::FlatHeap;

const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Parameters for a distance sweep.
#[derive(Clone, Copy)]
pub struct DistanceParams {
    /// Which cells the sweep may stand on.
    pub walkable: fn(CellType) -> bool,
    /// Distances beyond this are left at infinity.
    pub max_distance: f32,
    /// 8-connected with `sqrt(2)` diagonals when set, else 4-connected.
    pub diagonal: bool,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            walkable: CellType::is_walkable,
            max_distance: f32::INFINITY,
            diagonal: true,
        }
    }
}

/// A per-cell distance field from one or more source cells. Unreachable
/// cells hold `f32::INFINITY`.
#[derive(Debug, Clone)]
pub struct DistanceMap {
    width: usize,
    height: usize,
    dist: Vec<f32>,
}

impl DistanceMap {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dist: vec![f32::INFINITY; width * height],
        }
    }

    #[must_use]
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return f32::INFINITY;
        }
        self.dist[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.dist[y as usize * self.width + x as usize] = value;
        }
    }

    #[must_use]
    pub fn is_reachable(&self, p: Point) -> bool {
        self.get(p.x, p.y).is_finite()
    }

    /// The reachable cell with the greatest distance; ties resolve to
    /// the smallest `(y, x)` via the row-major scan.
    #[must_use]
    pub fn find_furthest(&self) -> Option<(Point, f32)> {
        let mut best: Option<(Point, f32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let d = self.dist[y * self.width + x];
                if d.is_finite() && best.map_or(true, |(_, bd)| d > bd) {
                    best = Some((Point::new(x as i32, y as i32), d));
                }
            }
        }
        best
    }

    /// Reachable cells with distance in `[min, max]`, in row-major
    /// order.
    #[must_use]
    pub fn points_in_range(&self, min: f32, max: f32) -> Vec<Point> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let d = self.dist[y * self.width + x];
                if d.is_finite() && d >= min && d <= max {
                    out.push(Point::new(x as i32, y as i32));
                }
            }
        }
        out
    }

    fn best_neighbor(&self, p: Point, downhill: bool) -> Option<Point> {
        let here = self.get(p.x, p.y);
        if !here.is_finite() {
            return None;
        }
        let mut best = here;
        let mut best_point = None;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let d = self.get(p.x + dx, p.y + dy);
                if !d.is_finite() {
                    continue;
                }
                let better = if downhill { d < best } else { d > best };
                if better {
                    best = d;
                    best_point = Some(Point::new(p.x + dx, p.y + dy));
                }
            }
        }
        best_point
    }

    /// Neighbor with the lowest distance, for gradient descent toward
    /// the sources.
    #[must_use]
    pub fn downhill_from(&self, p: Point) -> Option<Point> {
        self.best_neighbor(p, true)
    }

    /// Neighbor with the highest distance, for fleeing the sources.
    #[must_use]
    pub fn uphill_from(&self, p: Point) -> Option<Point> {
        self.best_neighbor(p, false)
    }
}

/// Compute a Dijkstra map from `sources` over walkable cells.
///
/// Cardinal steps cost 1, diagonal steps `sqrt(2)`. Stale heap entries
/// (distance above the map's current value) are skipped on dequeue.
#[must_use]
pub fn dijkstra_map(grid: &Grid, sources: &[Point], params: &DistanceParams) -> DistanceMap {
    let mut map = DistanceMap::new(grid.width(), grid.height());
    let mut heap = FlatHeap::with_capacity(sources.len().max(16));

    for &p in sources {
        if grid.contains_point(p) && (params.walkable)(grid.get(p.x, p.y)) {
            map.set(p.x, p.y, 0.0);
            heap.push(p.x, p.y, 0.0);
        }
    }

    while let Some((x, y, d)) = heap.pop() {
        if d > map.get(x, y) {
            continue;
        }
        for dy in -1..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal && !params.diagonal {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if !grid.in_bounds(nx, ny) || !(params.walkable)(grid.get(nx, ny)) {
                    continue;
                }
                let step = if diagonal { SQRT2 } else { 1.0 };
                let nd = d + step;
                if nd <= params.max_distance && nd < map.get(nx, ny) {
                    map.set(nx, ny, nd);
                    heap.push(nx, ny, nd);
                }
            }
        }
    }
    map
}

/// Derive a flee map: finite distances scaled by a negative factor, then
/// re-smoothed so no cell exceeds its lowest neighbor by more than one.
///
/// The iteration bound `2 * max(width, height)` doubles as a safety cap
/// and the convergence horizon.
#[must_use]
pub fn flee_map(map: &DistanceMap, factor: f32) -> DistanceMap {
    let (w, h) = (map.width(), map.height());
    let mut flee = DistanceMap::new(w, h);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let d = map.get(x, y);
            if d.is_finite() {
                flee.set(x, y, d * factor);
            }
        }
    }

    let max_iterations = 2 * w.max(h);
    for _ in 0..max_iterations {
        let mut changed = false;
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let here = flee.get(x, y);
                if !here.is_finite() {
                    continue;
                }
                let mut lowest = here;
                for dy in -1..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let d = flee.get(x + dx, y + dy);
                        if d.is_finite() && d < lowest {
                            lowest = d;
                        }
                    }
                }
                if here > lowest + 1.0 {
                    flee.set(x, y, lowest + 1.0);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    flee
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(w: usize, h: usize) -> Grid {
        let mut grid = Grid::new(w, h);
        grid.fill_rect(1, 1, w - 2, h - 2, CellType::Floor);
        grid
    }

    #[test]
    fn distances_use_diagonal_cost() {
        let grid = open_grid(10, 10);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        assert_eq!(map.get(1, 1), 0.0);
        assert_eq!(map.get(4, 1), 3.0);
        assert!((map.get(4, 4) - 3.0 * SQRT2).abs() < 1e-5);
    }

    #[test]
    fn cardinal_only_when_diagonal_disabled() {
        let grid = open_grid(10, 10);
        let params = DistanceParams {
            diagonal: false,
            ..DistanceParams::default()
        };
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &params);
        assert_eq!(map.get(4, 4), 6.0);
    }

    #[test]
    fn walls_are_unreachable() {
        let grid = open_grid(8, 8);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        assert!(!map.get(0, 0).is_finite());
        assert!(map.get(6, 6).is_finite());
    }

    #[test]
    fn max_distance_caps_the_sweep() {
        let grid = open_grid(20, 6);
        let params = DistanceParams {
            max_distance: 4.0,
            ..DistanceParams::default()
        };
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &params);
        assert!(map.get(5, 1).is_finite());
        assert!(!map.get(10, 1).is_finite());
    }

    #[test]
    fn furthest_point_is_opposite_corner() {
        let grid = open_grid(12, 8);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        let (p, d) = map.find_furthest().unwrap();
        assert_eq!(p, Point::new(10, 6));
        assert!(d > 0.0);
    }

    #[test]
    fn range_query_row_major() {
        let grid = open_grid(8, 8);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        let pts = map.points_in_range(0.0, 1.0);
        assert_eq!(pts[0], Point::new(1, 1));
        assert!(pts.contains(&Point::new(2, 1)));
        assert!(!pts.contains(&Point::new(4, 1)));
    }

    #[test]
    fn gradients_follow_the_field() {
        let grid = open_grid(10, 10);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        let down = map.downhill_from(Point::new(5, 5)).unwrap();
        assert!(map.get(down.x, down.y) < map.get(5, 5));
        let up = map.uphill_from(Point::new(2, 2)).unwrap();
        assert!(map.get(up.x, up.y) > map.get(2, 2));
    }

    #[test]
    fn flee_map_smooths_to_unit_slope() {
        let grid = open_grid(16, 10);
        let map = dijkstra_map(&grid, &[Point::new(1, 1)], &DistanceParams::default());
        let flee = flee_map(&map, -1.2);
        for y in 1..9i32 {
            for x in 1..15i32 {
                let here = flee.get(x, y);
                if !here.is_finite() {
                    continue;
                }
                for dy in -1..=1 {
                    for dx in -1i32..=1 {
                        let d = flee.get(x + dx, y + dy);
                        if d.is_finite() {
                            assert!(here <= d + 1.0 + 1e-4);
                        }
                    }
                }
            }
        }
    }
}
