//! Flood fill and region extraction

use crate::bitgrid::BitGrid;
use crate::cell::CellType;
use crate::geometry::{Bounds, Point};
use crate::grid::Grid;

/// Fixed-capacity ring-buffer FIFO for BFS frontiers. Cheaper than a
/// heap where order is breadth-first anyway.
#[derive(Debug)]
pub struct FifoQueue {
    buf: Vec<(i32, i32)>,
    head: usize,
    tail: usize,
    len: usize,
}

impl FifoQueue {
    /// Capacity must cover the worst case frontier; one slot per grid
    /// cell is always enough because cells enqueue at most once.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![(0, 0); capacity.max(1)],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Push a cell; silently drops when full (callers size the queue to
    /// the cell count, so a drop indicates re-enqueueing a visited cell).
    pub fn push(&mut self, x: i32, y: i32) {
        if self.len == self.buf.len() {
            return;
        }
        self.buf[self.tail] = (x, y);
        self.tail = (self.tail + 1) % self.buf.len();
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<(i32, i32)> {
        if self.len == 0 {
            return None;
        }
        let item = self.buf[self.head];
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        Some(item)
    }
}

/// A maximal 4-connected set of floor cells.
#[derive(Debug, Clone)]
pub struct Region {
    /// Cells in BFS discovery order (seeded row-major, so stable).
    pub cells: Vec<Point>,
    pub bounds: Bounds,
}

impl Region {
    #[must_use]
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Enumerate all 4-connected floor regions in row-major seed order.
#[must_use]
pub fn extract_regions(grid: &Grid) -> Vec<Region> {
    let (w, h) = (grid.width(), grid.height());
    let mut visited = BitGrid::new(w, h);
    let mut queue = FifoQueue::with_capacity(w * h);
    let mut regions = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            if grid.at(sx, sy) != CellType::Floor || visited.get(sx as i32, sy as i32) {
                continue;
            }
            let mut cells = Vec::new();
            let mut bounds = Bounds::empty();
            queue.clear();
            queue.push(sx as i32, sy as i32);
            visited.set(sx as i32, sy as i32, true);

            while let Some((x, y)) = queue.pop() {
                let p = Point::new(x, y);
                cells.push(p);
                bounds.expand(p);
                for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                    if grid.get(nx, ny) == CellType::Floor && !visited.get(nx, ny) {
                        visited.set(nx, ny, true);
                        queue.push(nx, ny);
                    }
                }
            }
            regions.push(Region { cells, bounds });
        }
    }
    regions
}

/// Find the walkable cell of `region` nearest its geometric center by a
/// bounded BFS. For cavern regions the geometric center may sit inside a
/// wall; this resolves the canonical room center instead.
#[must_use]
pub fn resolve_region_center(grid: &Grid, region: &Region) -> Point {
    let center = region.bounds.center();
    let mut membership = BitGrid::new(grid.width(), grid.height());
    for p in &region.cells {
        membership.set(p.x, p.y, true);
    }
    if membership.get(center.x, center.y) {
        return center;
    }

    // BFS over the bounding box, walls included, until the search front
    // first touches a region cell: that cell is nearest by grid steps.
    let mut visited = BitGrid::new(grid.width(), grid.height());
    let mut queue = FifoQueue::with_capacity(grid.width() * grid.height());
    queue.push(center.x, center.y);
    visited.set(center.x, center.y, true);
    while let Some((x, y)) = queue.pop() {
        if membership.get(x, y) {
            return Point::new(x, y);
        }
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if region.bounds.contains(Point::new(nx, ny))
                && grid.in_bounds(nx, ny)
                && !visited.get(nx, ny)
            {
                visited.set(nx, ny, true);
                queue.push(nx, ny);
            }
        }
    }
    // Unreachable for non-empty regions; fall back to the first cell.
    region.cells.first().copied().unwrap_or(center)
}
