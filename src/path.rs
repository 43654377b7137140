//! Run-length encoding for corridor paths

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Point;

/// One of the eight grid directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dir {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Dir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::N => (0, -1),
            Dir::Ne => (1, -1),
            Dir::E => (1, 0),
            Dir::Se => (1, 1),
            Dir::S => (0, 1),
            Dir::Sw => (-1, 1),
            Dir::W => (-1, 0),
            Dir::Nw => (-1, -1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Dir> {
        match (dx, dy) {
            (0, -1) => Some(Dir::N),
            (1, -1) => Some(Dir::Ne),
            (1, 0) => Some(Dir::E),
            (1, 1) => Some(Dir::Se),
            (0, 1) => Some(Dir::S),
            (-1, 1) => Some(Dir::Sw),
            (-1, 0) => Some(Dir::W),
            (-1, -1) => Some(Dir::Nw),
            _ => None,
        }
    }
}

/// A run of identical steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMove {
    pub dir: Dir,
    pub count: u32,
}

/// RLE form of a corridor path. Round-trips bitwise through
/// [`decompress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedPath {
    pub start: Point,
    pub moves: Vec<PathMove>,
    pub original_length: usize,
}

/// Compress a path of grid-adjacent points.
///
/// Any step of more than one cell on either axis is a protocol
/// violation and rejected.
pub fn compress(path: &[Point]) -> Result<CompressedPath> {
    let Some(&start) = path.first() else {
        return Err(Error::failed("path-rle", "cannot compress an empty path"));
    };

    let mut moves: Vec<PathMove> = Vec::new();
    for window in path.windows(2) {
        let (dx, dy) = (window[1].x - window[0].x, window[1].y - window[0].y);
        let dir = Dir::from_delta(dx, dy).ok_or_else(|| {
            Error::failed(
                "path-rle",
                format!(
                    "non-adjacent step ({},{}) -> ({},{})",
                    window[0].x, window[0].y, window[1].x, window[1].y
                ),
            )
        })?;
        match moves.last_mut() {
            Some(run) if run.dir == dir => run.count += 1,
            _ => moves.push(PathMove { dir, count: 1 }),
        }
    }

    Ok(CompressedPath {
        start,
        moves,
        original_length: path.len(),
    })
}

/// Reconstruct the exact point list of a compressed path.
#[must_use]
pub fn decompress(compressed: &CompressedPath) -> Vec<Point> {
    let mut points = Vec::with_capacity(compressed.original_length);
    let mut current = compressed.start;
    points.push(current);
    for run in &compressed.moves {
        let (dx, dy) = run.dir.delta();
        for _ in 0..run.count {
            current = Point::new(current.x + dx, current.y + dy);
            points.push(current);
        }
    }
    points
}
