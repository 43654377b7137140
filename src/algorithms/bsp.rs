//! Binary space partitioning

use crate::geometry::Rect;
use crate::rng::Rng;

/// Split parameters. The split position is
/// `floor(dimension * ratio)` with
/// `ratio = clamp(split_ratio + (rng - 0.5) * 2 * split_variance, 0.3, 0.7)`.
#[derive(Debug, Clone)]
pub struct BspParams {
    /// Smallest half a split may produce.
    pub min_size: i32,
    pub max_depth: usize,
    pub split_ratio: f64,
    pub split_variance: f64,
    /// Aspect ratio above which the split direction is forced.
    pub aspect_ratio_threshold: f64,
}

impl BspParams {
    /// Derive from a configured `[ratio_min, ratio_max]` band.
    #[must_use]
    pub fn from_ratio_band(
        min_size: i32,
        max_depth: usize,
        ratio_min: f64,
        ratio_max: f64,
        aspect_ratio_threshold: f64,
    ) -> Self {
        Self {
            min_size,
            max_depth,
            split_ratio: (ratio_min + ratio_max) / 2.0,
            split_variance: (ratio_max - ratio_min) / 2.0,
            aspect_ratio_threshold,
        }
    }
}

/// A node of the partition tree. Room placement consumes only leaves.
#[derive(Debug)]
pub struct BspNode {
    pub rect: Rect,
    pub depth: usize,
    pub left: Option<Box<BspNode>>,
    pub right: Option<Box<BspNode>>,
}

impl BspNode {
    fn new(rect: Rect, depth: usize) -> Self {
        Self {
            rect,
            depth,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn split(&mut self, params: &BspParams, rng: &mut Rng) {
        if self.depth >= params.max_depth {
            return;
        }
        let (w, h) = (self.rect.width, self.rect.height);
        let min = params.min_size;
        if w < 2 * min && h < 2 * min {
            return;
        }

        // Direction by aspect ratio, random when roughly square.
        let aspect = w as f64 / h as f64;
        let vertical = if aspect > params.aspect_ratio_threshold {
            true
        } else if 1.0 / aspect > params.aspect_ratio_threshold {
            false
        } else {
            rng.chance(0.5)
        };

        let dimension = if vertical { w } else { h };
        let jitter = (rng.next_f64() - 0.5) * 2.0 * params.split_variance;
        let ratio = (params.split_ratio + jitter).clamp(0.3, 0.7);
        let split = (dimension as f64 * ratio).floor() as i32;
        if split < min || dimension - split < min {
            return;
        }

        let (a, b) = if vertical {
            (
                Rect::new(self.rect.x, self.rect.y, split, h),
                Rect::new(self.rect.x + split, self.rect.y, w - split, h),
            )
        } else {
            (
                Rect::new(self.rect.x, self.rect.y, w, split),
                Rect::new(self.rect.x, self.rect.y + split, w, h - split),
            )
        };

        let mut left = Box::new(BspNode::new(a, self.depth + 1));
        let mut right = Box::new(BspNode::new(b, self.depth + 1));
        left.split(params, rng);
        right.split(params, rng);
        self.left = Some(left);
        self.right = Some(right);
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a BspNode>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            if let Some(left) = &self.left {
                left.collect_leaves(out);
            }
            if let Some(right) = &self.right {
                right.collect_leaves(out);
            }
        }
    }
}

/// A built partition tree over an area.
#[derive(Debug)]
pub struct BspTree {
    pub root: BspNode,
}

impl BspTree {
    /// Recursively partition `area`. Recursion stops at `max_depth`,
    /// when both extents drop under `2 * min_size`, or when the chosen
    /// split dimension cannot hold two `min_size` halves.
    #[must_use]
    pub fn build(area: Rect, params: &BspParams, rng: &mut Rng) -> Self {
        let mut root = BspNode::new(area, 0);
        root.split(params, rng);
        Self { root }
    }

    /// Leaf rectangles in stable left-to-right tree order.
    #[must_use]
    pub fn leaves(&self) -> Vec<Rect> {
        let mut nodes = Vec::new();
        self.root.collect_leaves(&mut nodes);
        nodes.into_iter().map(|n| n.rect).collect()
    }
}

/// Choose a room rectangle within a leaf: inset by `padding`, size drawn
/// uniformly from `[min_room, max_room]` capped by the leaf, then a
/// uniform offset in the remaining space. Returns `None` when the leaf
/// cannot hold a minimal room.
pub fn place_room_in_leaf(
    leaf: Rect,
    min_room: i32,
    max_room: i32,
    padding: i32,
    rng: &mut Rng,
) -> Option<Rect> {
    let usable = leaf.inset(padding);
    if usable.width < min_room || usable.height < min_room {
        return None;
    }
    let max_w = usable.width.min(max_room);
    let max_h = usable.height.min(max_room);
    let w = rng.int_in(min_room, max_w + 1);
    let h = rng.int_in(min_room, max_h + 1);
    let x = usable.x + rng.int_in(0, usable.width - w + 1);
    let y = usable.y + rng.int_in(0, usable.height - h + 1);
    Some(Rect::new(x, y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BspParams {
        BspParams {
            min_size: 6,
            max_depth: 4,
            split_ratio: 0.5,
            split_variance: 0.15,
            aspect_ratio_threshold: 1.25,
        }
    }

    #[test]
    fn leaves_tile_the_area() {
        let area = Rect::new(1, 1, 78, 58);
        let tree = BspTree::build(area, &params(), &mut Rng::new(42));
        let leaves = tree.leaves();
        assert!(!leaves.is_empty());
        let total: i64 = leaves.iter().map(|l| l.area()).sum();
        assert_eq!(total, area.area());
        for (i, a) in leaves.iter().enumerate() {
            for b in &leaves[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn leaves_respect_min_size() {
        let tree = BspTree::build(Rect::new(0, 0, 80, 60), &params(), &mut Rng::new(7));
        for leaf in tree.leaves() {
            assert!(leaf.width >= 6, "leaf too narrow: {leaf:?}");
            assert!(leaf.height >= 6, "leaf too short: {leaf:?}");
        }
    }

    #[test]
    fn build_is_deterministic() {
        let area = Rect::new(1, 1, 60, 40);
        let a = BspTree::build(area, &params(), &mut Rng::new(99)).leaves();
        let b = BspTree::build(area, &params(), &mut Rng::new(99)).leaves();
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_area_stays_single_leaf() {
        let tree = BspTree::build(Rect::new(0, 0, 8, 8), &params(), &mut Rng::new(1));
        assert_eq!(tree.leaves().len(), 1);
    }

    #[test]
    fn rooms_fit_inside_leaves() {
        let mut rng = Rng::new(5);
        let leaf = Rect::new(10, 10, 14, 12);
        for _ in 0..50 {
            if let Some(room) = place_room_in_leaf(leaf, 4, 10, 1, &mut rng) {
                assert!(room.x >= 11 && room.right() <= leaf.right() - 1);
                assert!(room.y >= 11 && room.bottom() <= leaf.bottom() - 1);
                assert!(room.width >= 4 && room.height >= 4);
            }
        }
    }

    #[test]
    fn cramped_leaf_yields_no_room() {
        let mut rng = Rng::new(5);
        assert!(place_room_in_leaf(Rect::new(0, 0, 5, 5), 4, 10, 1, &mut rng).is_none());
    }
}
