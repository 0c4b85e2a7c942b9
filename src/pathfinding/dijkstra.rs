//! Shortest paths over the region graph
//!
//! Entering costs are non-negative integers that vary by terrain, so a plain
//! BFS is not enough. Ties are broken by region id, which keeps results
//! stable across repeated calls with the same inputs.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::core::types::{PlayerId, RegionId};
use crate::map::RegionMap;

/// Outcome of a path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    pub reachable: bool,
    /// Origin first, destination last; empty when unreachable
    pub path: Vec<RegionId>,
    /// Sum of entering costs of every element but the first
    pub cost: u32,
}

impl PathResult {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            path: Vec::new(),
            cost: 0,
        }
    }
}

/// Dijkstra search from `origin` to `destination` for `player`
///
/// A region impassable to `player` is never relaxed. Disconnected or unknown
/// endpoints yield `reachable = false`, never an error.
pub fn find_path<M: RegionMap + ?Sized>(
    map: &M,
    origin: RegionId,
    destination: RegionId,
    player: PlayerId,
) -> PathResult {
    if map.region(origin).is_none() || map.region(destination).is_none() {
        return PathResult::unreachable();
    }

    if origin == destination {
        return PathResult {
            reachable: true,
            path: vec![origin],
            cost: 0,
        };
    }

    let mut best: AHashMap<RegionId, u32> = AHashMap::new();
    let mut came_from: AHashMap<RegionId, RegionId> = AHashMap::new();
    let mut open = BinaryHeap::new();

    best.insert(origin, 0);
    open.push(Reverse((0u32, origin)));

    while let Some(Reverse((cost, current))) = open.pop() {
        if current == destination {
            let mut path = vec![destination];
            let mut cursor = destination;
            while let Some(&prev) = came_from.get(&cursor) {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return PathResult {
                reachable: true,
                path,
                cost,
            };
        }

        // Stale heap entry
        if cost > best.get(&current).copied().unwrap_or(u32::MAX) {
            continue;
        }

        for neighbor in map.neighbors(current) {
            let Some(step) = map.entering_cost(neighbor, player) else {
                continue;
            };
            let tentative = cost.saturating_add(step);
            if tentative < best.get(&neighbor).copied().unwrap_or(u32::MAX) {
                best.insert(neighbor, tentative);
                came_from.insert(neighbor, current);
                open.push(Reverse((tentative, neighbor)));
            }
        }
    }

    PathResult::unreachable()
}

/// Cost of walking `path` as `player`
///
/// `None` if any element after the first is impassable or unknown.
/// Empty and single-element paths cost 0.
pub fn path_cost<M: RegionMap + ?Sized>(
    map: &M,
    path: &[RegionId],
    player: PlayerId,
) -> Option<u32> {
    path.iter()
        .skip(1)
        .try_fold(0u32, |total, &id| {
            map.entering_cost(id, player)
                .map(|c| total.saturating_add(c))
        })
}

/// Longest prefix of `path` whose cumulative entering cost fits in `movement_points`
///
/// The origin is always kept. Walking stops at the first impassable element.
pub fn trim_path_to_budget<M: RegionMap + ?Sized>(
    map: &M,
    path: &[RegionId],
    player: PlayerId,
    movement_points: u32,
) -> Vec<RegionId> {
    let Some(&origin) = path.first() else {
        return Vec::new();
    };

    let mut trimmed = vec![origin];
    let mut spent = 0u32;
    for &id in &path[1..] {
        let Some(cost) = map.entering_cost(id, player) else {
            break;
        };
        spent = spent.saturating_add(cost);
        if spent > movement_points {
            break;
        }
        trimmed.push(id);
    }
    trimmed
}

/// Hop distance from the nearest seed, by multi-source BFS
///
/// Only terrain-passable regions are entered; seeds sit at distance 0 even
/// when their own terrain is impassable.
pub fn hop_distances<M: RegionMap + ?Sized>(
    map: &M,
    seeds: impl IntoIterator<Item = RegionId>,
) -> AHashMap<RegionId, u32> {
    let mut distance: AHashMap<RegionId, u32> = AHashMap::new();
    let mut queue = VecDeque::new();

    for seed in seeds {
        if map.region(seed).is_some() && !distance.contains_key(&seed) {
            distance.insert(seed, 0);
            queue.push_back(seed);
        }
    }

    while let Some(current) = queue.pop_front() {
        let next = distance[&current] + 1;
        for neighbor in map.neighbors(current) {
            if distance.contains_key(&neighbor) || map.base_entering_cost(neighbor).is_none() {
                continue;
            }
            distance.insert(neighbor, next);
            queue.push_back(neighbor);
        }
    }

    distance
}
