//! Core spatial generation algorithms

pub mod bsp;
pub mod cellular;

pub use bsp::{BspNode, BspParams, BspTree};
pub use cellular::{CellularParams, RegionKeep};
