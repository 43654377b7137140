//! Connectivity graph construction over room centers

pub mod delaunay;
pub mod mst;

pub use delaunay::{triangulate, Triangulation, MAX_POINTS};
pub use mst::minimum_spanning_tree;
