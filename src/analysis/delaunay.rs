//! Incremental Bowyer–Watson Delaunay triangulation
//!
//! Insertion finds the triangles whose circumcircle contains the new
//! point, takes the boundary of their union by counting edge
//! occurrences (edges seen exactly once are boundary), removes the bad
//! triangles and fans the point to the boundary. Duplicate input points
//! are dropped up front; a fully collinear input either receives a tiny
//! deterministic jitter from the caller's RNG stream or degrades to a
//! chain along the line.

use std::collections::{HashMap, HashSet};

use crate::geometry::Point;
use crate::rng::Rng;

/// Upper bound on input size; edge identity packs two indices as
/// `min * MAX_POINTS + max`.
pub const MAX_POINTS: u64 = 4096;

#[derive(Debug, Clone, Copy)]
struct Vertex {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    a: usize,
    b: usize,
    c: usize,
}

impl Triangle {
    fn touches(&self, vertex: usize) -> bool {
        self.a == vertex || self.b == vertex || self.c == vertex
    }

    fn edges(&self) -> [(usize, usize); 3] {
        [
            ordered(self.a, self.b),
            ordered(self.b, self.c),
            ordered(self.c, self.a),
        ]
    }
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[inline]
fn edge_key(a: usize, b: usize) -> u64 {
    let (lo, hi) = ordered(a, b);
    lo as u64 * MAX_POINTS + hi as u64
}

/// Signed circumcircle test: positive when `p` lies strictly inside the
/// circle through `a`, `b`, `c` (orientation-corrected).
fn in_circumcircle(a: Vertex, b: Vertex, c: Vertex, p: Vertex) -> bool {
    let ax = a.x - p.x;
    let ay = a.y - p.y;
    let bx = b.x - p.x;
    let by = b.y - p.y;
    let cx = c.x - p.x;
    let cy = c.y - p.y;

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);

    let orient = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
    if orient > 0.0 {
        det > 0.0
    } else {
        det < 0.0
    }
}

/// The triangulation result: undirected edges as index pairs into the
/// original point slice, `(min, max)`-ordered and sorted.
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub edges: Vec<(usize, usize)>,
}

impl Triangulation {
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn all_collinear(vertices: &[Vertex]) -> bool {
    if vertices.len() < 3 {
        return true;
    }
    let (v0, v1) = (vertices[0], vertices[1]);
    vertices[2..].iter().all(|v| {
        let cross = (v1.x - v0.x) * (v.y - v0.y) - (v.x - v0.x) * (v1.y - v0.y);
        cross.abs() < 1e-9
    })
}

/// Triangulate `points`. Exact duplicates are ignored. When the whole
/// input is collinear, `rng` (the connections stream) supplies a ±0.25
/// jitter to break the degeneracy; without an RNG the result is a chain
/// along the line.
#[must_use]
pub fn triangulate(points: &[Point], rng: Option<&mut Rng>) -> Triangulation {
    debug_assert!(points.len() as u64 <= MAX_POINTS);

    // Dedupe while remembering the original index of each kept point.
    let mut seen = HashSet::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut original: Vec<usize> = Vec::new();
    for (i, p) in points.iter().enumerate() {
        if seen.insert((p.x, p.y)) {
            vertices.push(Vertex {
                x: p.x as f64,
                y: p.y as f64,
            });
            original.push(i);
        }
    }

    match vertices.len() {
        0 | 1 => return Triangulation { edges: Vec::new() },
        2 => {
            return Triangulation {
                edges: vec![ordered(original[0], original[1])],
            }
        }
        _ => {}
    }

    if all_collinear(&vertices) {
        match rng {
            Some(rng) => {
                for v in vertices.iter_mut() {
                    v.x += (rng.next_f64() - 0.5) * 0.5;
                    v.y += (rng.next_f64() - 0.5) * 0.5;
                }
            }
            None => {
                // Chain along the line, sorted by coordinate.
                let mut order: Vec<usize> = (0..vertices.len()).collect();
                order.sort_by(|&i, &j| {
                    let (a, b) = (vertices[i], vertices[j]);
                    (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap_or(std::cmp::Ordering::Equal)
                });
                let edges = order
                    .windows(2)
                    .map(|w| ordered(original[w[0]], original[w[1]]))
                    .collect();
                return Triangulation { edges };
            }
        }
    }

    let n = vertices.len();
    let triangles = bowyer_watson(&mut vertices);

    // Extract the unique edge set over real vertices, mapped back to
    // original indices, in sorted order for downstream determinism.
    let mut keys: Vec<u64> = triangles
        .iter()
        .filter(|t| t.a < n && t.b < n && t.c < n)
        .flat_map(|t| t.edges().into_iter().map(|(a, b)| edge_key(a, b)))
        .collect();
    keys.sort_unstable();
    keys.dedup();

    let edges = keys
        .into_iter()
        .map(|k| {
            let a = (k / MAX_POINTS) as usize;
            let b = (k % MAX_POINTS) as usize;
            ordered(original[a], original[b])
        })
        .collect();
    Triangulation { edges }
}

fn bowyer_watson(vertices: &mut Vec<Vertex>) -> Vec<Triangle> {
    let n = vertices.len();

    // Super-triangle comfortably enclosing the bounding box.
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in vertices.iter() {
        min_x = min_x.min(v.x);
        max_x = max_x.max(v.x);
        min_y = min_y.min(v.y);
        max_y = max_y.max(v.y);
    }
    let delta = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;
    vertices.push(Vertex {
        x: mid_x - 20.0 * delta,
        y: mid_y - delta,
    });
    vertices.push(Vertex {
        x: mid_x,
        y: mid_y + 20.0 * delta,
    });
    vertices.push(Vertex {
        x: mid_x + 20.0 * delta,
        y: mid_y - delta,
    });

    let mut triangles = vec![Triangle {
        a: n,
        b: n + 1,
        c: n + 2,
    }];

    for i in 0..n {
        let p = vertices[i];

        let bad: Vec<usize> = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| in_circumcircle(vertices[t.a], vertices[t.b], vertices[t.c], p))
            .map(|(j, _)| j)
            .collect();

        // Boundary of the union of bad triangles: edges seen once.
        let mut counts: HashMap<u64, ((usize, usize), u32)> = HashMap::new();
        for &j in &bad {
            for (a, b) in triangles[j].edges() {
                counts
                    .entry(edge_key(a, b))
                    .and_modify(|e| e.1 += 1)
                    .or_insert(((a, b), 1));
            }
        }
        let mut boundary: Vec<(usize, usize)> = counts
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(edge, _)| edge)
            .collect();
        boundary.sort_unstable();

        for &j in bad.iter().rev() {
            triangles.swap_remove(j);
        }
        for (a, b) in boundary {
            triangles.push(Triangle { a, b, c: i });
        }
    }

    triangles.retain(|t| !t.touches(n) && !t.touches(n + 1) && !t.touches(n + 2));
    vertices.truncate(n);
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unionfind::UnionFind;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn assert_connected(n: usize, edges: &[(usize, usize)]) {
        let mut uf = UnionFind::new(n);
        for &(a, b) in edges {
            uf.union(a, b);
        }
        assert_eq!(uf.set_count(), 1, "graph not connected: {edges:?}");
    }

    #[test]
    fn triangle_input() {
        let t = triangulate(&[p(0, 0), p(10, 0), p(5, 8)], None);
        assert_eq!(t.edge_count(), 3);
    }

    #[test]
    fn square_input() {
        let t = triangulate(&[p(0, 0), p(10, 0), p(10, 10), p(0, 10)], None);
        // Four hull edges plus one diagonal.
        assert_eq!(t.edge_count(), 5);
        assert_connected(4, &t.edges);
    }

    #[test]
    fn edge_bound_holds() {
        // |edges| <= 3n - 6 for any non-collinear planar point set.
        let pts: Vec<Point> = (0..30)
            .map(|i| p((i * 17) % 53 + i, (i * 29) % 41))
            .collect();
        let t = triangulate(&pts, None);
        assert!(t.edge_count() <= 3 * pts.len() - 6);
        assert_connected(pts.len(), &t.edges);
    }

    #[test]
    fn duplicates_are_dropped() {
        let t = triangulate(&[p(0, 0), p(10, 0), p(10, 0), p(5, 8)], None);
        assert_eq!(t.edge_count(), 3);
        // No edge may reference the duplicate's index twice.
        for (a, b) in &t.edges {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn collinear_without_rng_chains() {
        let t = triangulate(&[p(0, 0), p(4, 0), p(2, 0), p(9, 0)], None);
        assert_eq!(t.edges, vec![(0, 2), (1, 2), (1, 3)]);
    }

    #[test]
    fn collinear_with_rng_connects() {
        let mut rng = Rng::new(11);
        let pts = vec![p(0, 0), p(5, 0), p(10, 0), p(15, 0)];
        let t = triangulate(&pts, Some(&mut rng));
        assert!(!t.edges.is_empty());
        assert_connected(pts.len(), &t.edges);
    }

    #[test]
    fn deterministic_for_same_input() {
        let pts: Vec<Point> = (0..20).map(|i| p((i * 13) % 37, (i * 7) % 23)).collect();
        let a = triangulate(&pts, None);
        let b = triangulate(&pts, None);
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn small_inputs() {
        assert!(triangulate(&[], None).edges.is_empty());
        assert!(triangulate(&[p(3, 3)], None).edges.is_empty());
        assert_eq!(triangulate(&[p(0, 0), p(5, 5)], None).edges, vec![(0, 1)]);
    }
}
