//! Strategic map: regions and the region graph

pub mod graph;
pub mod region;

pub use graph::{RegionGraph, RegionMap};
pub use region::{CastleTier, Region, Terrain};
