//! Byte grid: the mutable working surface for all generation passes

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::cell::CellType;
use crate::geometry::Point;

/// 2D grid of [`CellType`] cells, one byte per cell, row-major.
///
/// Reads outside the grid return [`CellType::Wall`] and writes outside
/// are no-ops, so neighbor counting at the borders needs no per-call
/// branching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellType>,
}

impl Grid {
    /// Create a grid filled with walls.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellType::Wall; width * height],
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
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Bounds-checked read; out-of-bounds reads as `Wall`.
    #[must_use]
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> CellType {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize]
        } else {
            CellType::Wall
        }
    }

    /// Bounds-checked write; out-of-bounds writes are dropped.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: CellType) {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    /// Unchecked read. The caller guarantees `x < width && y < height`.
    #[must_use]
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> CellType {
        self.cells[y * self.width + x]
    }

    /// Unchecked write. The caller guarantees `x < width && y < height`.
    #[inline]
    pub fn set_at(&mut self, x: usize, y: usize, cell: CellType) {
        self.cells[y * self.width + x] = cell;
    }

    pub fn fill(&mut self, cell: CellType) {
        self.cells.fill(cell);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: usize, h: usize, cell: CellType) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx as i32, y + dy as i32, cell);
            }
        }
    }

    #[must_use]
    pub fn count<F: Fn(CellType) -> bool>(&self, predicate: F) -> usize {
        self.cells.iter().filter(|&&c| predicate(c)).count()
    }

    #[must_use]
    pub fn count_cell(&self, cell: CellType) -> usize {
        self.count(|c| c == cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, CellType)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i % self.width, i / self.width, c))
    }

    /// Count the four orthogonal neighbors matching `cell`, counting
    /// out-of-bounds as `Wall`.
    #[must_use]
    pub fn count_neighbors4(&self, x: i32, y: i32, cell: CellType) -> usize {
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .filter(|&(nx, ny)| self.get(nx, ny) == cell)
            .count()
    }

    /// Count the eight surrounding neighbors matching `cell`, counting
    /// out-of-bounds as `Wall`, so border cells behave as if surrounded
    /// by walls.
    #[must_use]
    pub fn count_neighbors8(&self, x: i32, y: i32, cell: CellType) -> usize {
        let mut count = 0;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.get(x + dx, y + dy) == cell {
                    count += 1;
                }
            }
        }
        count
    }

    /// One cellular-automata sweep into `dst`.
    ///
    /// Only interior cells are evaluated; `dst`'s border ring is written
    /// as `Wall` unconditionally, so borders never flip. Rule, counting
    /// wall neighbors: a wall survives with `count >= survival_min`, a
    /// floor turns to wall with `count >= birth_min`.
    pub fn apply_ca_into(&self, survival_min: usize, birth_min: usize, dst: &mut Grid) {
        debug_assert_eq!(self.width, dst.width);
        debug_assert_eq!(self.height, dst.height);
        if self.width < 3 || self.height < 3 {
            dst.fill(CellType::Wall);
            return;
        }

        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                let mut walls = 0;
                for dy in 0..3 {
                    for dx in 0..3 {
                        if dx == 1 && dy == 1 {
                            continue;
                        }
                        if self.at(x + dx - 1, y + dy - 1) == CellType::Wall {
                            walls += 1;
                        }
                    }
                }
                let next = match self.at(x, y) {
                    CellType::Wall => {
                        if walls >= survival_min {
                            CellType::Wall
                        } else {
                            CellType::Floor
                        }
                    }
                    _ => {
                        if walls >= birth_min {
                            CellType::Wall
                        } else {
                            CellType::Floor
                        }
                    }
                };
                dst.set_at(x, y, next);
            }
        }

        for x in 0..self.width {
            dst.set_at(x, 0, CellType::Wall);
            dst.set_at(x, self.height - 1, CellType::Wall);
        }
        for y in 0..self.height {
            dst.set_at(0, y, CellType::Wall);
            dst.set_at(self.width - 1, y, CellType::Wall);
        }
    }

    /// Flat copy of the cell bytes, row-major.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|&c| c as u8).collect()
    }

    /// True when every cell on the outermost ring is a wall.
    #[must_use]
    pub fn border_is_walled(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return true;
        }
        let (w, h) = (self.width, self.height);
        (0..w).all(|x| self.at(x, 0).is_wall() && self.at(x, h - 1).is_wall())
            && (0..h).all(|y| self.at(0, y).is_wall() && self.at(w - 1, y).is_wall())
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.in_bounds(p.x, p.y)
    }
}

impl Index<(usize, usize)> for Grid {
    type Output = CellType;
    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.cells[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for Grid {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.cells[y * self.width + x]
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", self.at(x, y).glyph())?;
            }
            if y + 1 < self.height {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
