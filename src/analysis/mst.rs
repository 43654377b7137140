//! Kruskal minimum spanning tree over weighted point edges

use crate::geometry::Point;
use crate::unionfind::UnionFind;

/// Kruskal over `edges` (index pairs into `points`) with Euclidean
/// weights. Equal weights break ties by `(min, max)` index order so the
/// tree is deterministic. Terminates once the tree holds `n - 1` edges.
#[must_use]
pub fn minimum_spanning_tree(
    points: &[Point],
    edges: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut weighted: Vec<(f64, usize, usize)> = edges
        .iter()
        .map(|&(a, b)| {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            (points[lo].distance_to(points[hi]), lo, hi)
        })
        .collect();
    weighted.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then_with(|| (x.1, x.2).cmp(&(y.1, y.2)))
    });

    let mut uf = UnionFind::new(n);
    let mut tree = Vec::with_capacity(n - 1);
    for (_, a, b) in weighted {
        if uf.union(a, b) {
            tree.push((a, b));
            if tree.len() == n - 1 {
                break;
            }
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::delaunay::triangulate;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn tree_has_n_minus_one_edges() {
        let pts: Vec<Point> = (0..15).map(|i| p((i * 11) % 29, (i * 7) % 31)).collect();
        let tri = triangulate(&pts, None);
        let mst = minimum_spanning_tree(&pts, &tri.edges);
        assert_eq!(mst.len(), pts.len() - 1);
    }

    #[test]
    fn tree_is_acyclic_and_spanning() {
        let pts: Vec<Point> = (0..12).map(|i| p((i * 5) % 17, (i * 13) % 19)).collect();
        let tri = triangulate(&pts, None);
        let mst = minimum_spanning_tree(&pts, &tri.edges);
        let mut uf = UnionFind::new(pts.len());
        for &(a, b) in &mst {
            // Every accepted edge joins two components: no cycles.
            assert!(uf.union(a, b));
        }
        assert_eq!(uf.set_count(), 1);
    }

    #[test]
    fn picks_short_edges() {
        // A near cluster plus one distant point: the long edge is used
        // exactly once.
        let pts = vec![p(0, 0), p(1, 0), p(0, 1), p(50, 50)];
        let edges = vec![(0, 1), (0, 2), (1, 2), (0, 3), (1, 3), (2, 3)];
        let mst = minimum_spanning_tree(&pts, &edges);
        let long_edges = mst.iter().filter(|&&(_, b)| b == 3).count();
        assert_eq!(long_edges, 1);
        assert_eq!(mst.len(), 3);
    }

    #[test]
    fn deterministic_under_ties() {
        // A unit square has two equal diagonals and four equal sides;
        // the tie-break keeps the result stable.
        let pts = vec![p(0, 0), p(1, 0), p(1, 1), p(0, 1)];
        let edges = vec![(0, 1), (1, 2), (2, 3), (0, 3), (0, 2), (1, 3)];
        let a = minimum_spanning_tree(&pts, &edges);
        let b = minimum_spanning_tree(&pts, &edges);
        assert_eq!(a, b);
        assert_eq!(a, vec![(0, 1), (1, 2), (2, 3)]);
    }
}
