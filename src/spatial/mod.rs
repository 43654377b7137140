//! Spatial analysis: flood fill, distance maps, pathfinding

pub mod distance;
pub mod flood;
pub mod pathfinding;

pub use distance::{DistanceMap, DistanceParams};
pub use flood::{extract_regions, FifoQueue, Region};
pub use pathfinding::{astar_corridor, bresenham_line, AStarParams};
