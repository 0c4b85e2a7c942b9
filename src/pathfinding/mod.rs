//! Pathfinding over the region graph

pub mod centrality;
pub mod dijkstra;

pub use centrality::corridor_centrality;
pub use dijkstra::{find_path, hop_distances, path_cost, trim_path_to_budget, PathResult};
