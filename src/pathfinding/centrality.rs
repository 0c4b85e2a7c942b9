//! Strategic-corridor importance overlay
//!
//! Betweenness-style score restricted to a set of boundary regions: every
//! boundary region is a source, every other boundary region a target, and
//! only the non-boundary regions in between earn credit. Read-only; the turn
//! orchestrator never consults it.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::core::config::CentralityConfig;
use crate::core::types::{PlayerId, RegionId};
use crate::map::RegionMap;

/// Single-source shortest-path DAG
struct ShortestPathTree {
    /// Regions in the order they were settled (non-decreasing distance)
    settled: Vec<RegionId>,
    sigma: AHashMap<RegionId, f64>,
    preds: AHashMap<RegionId, Vec<RegionId>>,
}

fn step_cost<M: RegionMap + ?Sized>(map: &M, id: RegionId, player: Option<PlayerId>) -> Option<u32> {
    match player {
        Some(p) => map.entering_cost(id, p),
        None => map.base_entering_cost(id),
    }
}

fn shortest_path_tree<M: RegionMap + ?Sized>(
    map: &M,
    source: RegionId,
    player: Option<PlayerId>,
) -> ShortestPathTree {
    let mut dist: AHashMap<RegionId, u64> = AHashMap::new();
    let mut sigma: AHashMap<RegionId, f64> = AHashMap::new();
    let mut preds: AHashMap<RegionId, Vec<RegionId>> = AHashMap::new();
    let mut done: AHashSet<RegionId> = AHashSet::new();
    let mut settled = Vec::new();
    let mut open = BinaryHeap::new();

    dist.insert(source, 0);
    sigma.insert(source, 1.0);
    open.push(Reverse((0u64, source)));

    while let Some(Reverse((d, current))) = open.pop() {
        if !done.insert(current) {
            continue;
        }
        settled.push(current);
        let current_sigma = sigma[&current];

        for neighbor in map.neighbors(current) {
            if done.contains(&neighbor) {
                continue;
            }
            let Some(cost) = step_cost(map, neighbor, player) else {
                continue;
            };
            let tentative = d + u64::from(cost);
            match dist.get(&neighbor).copied() {
                Some(known) if tentative > known => {}
                Some(known) if tentative == known => {
                    *sigma.entry(neighbor).or_insert(0.0) += current_sigma;
                    preds.entry(neighbor).or_default().push(current);
                }
                _ => {
                    dist.insert(neighbor, tentative);
                    sigma.insert(neighbor, current_sigma);
                    preds.insert(neighbor, vec![current]);
                    open.push(Reverse((tentative, neighbor)));
                }
            }
        }
    }

    ShortestPathTree {
        settled,
        sigma,
        preds,
    }
}

/// Credit from one source, classic Brandes back-propagation
fn multiplicity_credit(
    tree: &ShortestPathTree,
    source: RegionId,
    boundary: &BTreeSet<RegionId>,
) -> AHashMap<RegionId, f64> {
    let mut delta: AHashMap<RegionId, f64> = AHashMap::new();
    let mut credit = AHashMap::new();

    for &w in tree.settled.iter().rev() {
        let endpoint = if w != source && boundary.contains(&w) { 1.0 } else { 0.0 };
        let coefficient = endpoint + delta.get(&w).copied().unwrap_or(0.0);
        let sigma_w = tree.sigma[&w];
        if let Some(preds) = tree.preds.get(&w) {
            for &v in preds {
                *delta.entry(v).or_insert(0.0) += tree.sigma[&v] / sigma_w * coefficient;
            }
        }
        if w != source && !boundary.contains(&w) {
            let d = delta.get(&w).copied().unwrap_or(0.0);
            if d > 0.0 {
                credit.insert(w, d);
            }
        }
    }

    credit
}

/// Credit from one source, one unit per target for every region on any shortest path
fn binary_credit(
    tree: &ShortestPathTree,
    source: RegionId,
    boundary: &BTreeSet<RegionId>,
) -> AHashMap<RegionId, f64> {
    let mut credit: AHashMap<RegionId, f64> = AHashMap::new();

    for &target in boundary {
        if target == source || !tree.sigma.contains_key(&target) {
            continue;
        }
        let mut seen: AHashSet<RegionId> = AHashSet::new();
        let mut stack = vec![target];
        while let Some(node) = stack.pop() {
            let Some(preds) = tree.preds.get(&node) else {
                continue;
            };
            for &p in preds {
                if seen.insert(p) {
                    stack.push(p);
                }
            }
        }
        for node in seen {
            if node != source && !boundary.contains(&node) {
                *credit.entry(node).or_insert(0.0) += 1.0;
            }
        }
    }

    credit
}

/// Corridor importance of non-boundary regions between `boundary` regions
///
/// `player` selects whose entering costs weigh the paths; `None` uses raw
/// terrain costs. Regions that earn no credit are omitted.
pub fn corridor_centrality<M: RegionMap + Sync + ?Sized>(
    map: &M,
    boundary: &BTreeSet<RegionId>,
    player: Option<PlayerId>,
    config: &CentralityConfig,
) -> BTreeMap<RegionId, f64> {
    let sources: Vec<RegionId> = boundary
        .iter()
        .copied()
        .filter(|id| map.region(*id).is_some())
        .collect();

    let merged = sources
        .par_iter()
        .map(|&source| {
            let tree = shortest_path_tree(map, source, player);
            if config.multiplicity_weighted {
                multiplicity_credit(&tree, source, boundary)
            } else {
                binary_credit(&tree, source, boundary)
            }
        })
        .reduce(AHashMap::new, |mut acc, part| {
            for (id, value) in part {
                *acc.entry(id).or_insert(0.0) += value;
            }
            acc
        });

    merged.into_iter().filter(|(_, v)| *v > 0.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Region, RegionGraph, Terrain};

    fn plains_graph(n: u32, edges: &[(u32, u32)]) -> RegionGraph {
        let mut graph = RegionGraph::new();
        for id in 1..=n {
            graph.add_region(Region::new(RegionId(id), Terrain::Plains));
        }
        graph.with_edges(edges).unwrap()
    }

    fn boundary(ids: &[u32]) -> BTreeSet<RegionId> {
        ids.iter().map(|&id| RegionId(id)).collect()
    }

    #[test]
    fn test_line_corridor() {
        // 1 - 2 - 3 - 4 - 5, boundary at both ends
        let g = plains_graph(5, &[(1, 2), (2, 3), (3, 4), (4, 5)]);
        let scores = corridor_centrality(&g, &boundary(&[1, 5]), None, &CentralityConfig::default());
        // Each ordered pair (1,5) and (5,1) credits 2, 3, 4 once
        assert_eq!(scores.get(&RegionId(2)), Some(&2.0));
        assert_eq!(scores.get(&RegionId(3)), Some(&2.0));
        assert_eq!(scores.get(&RegionId(4)), Some(&2.0));
        assert!(!scores.contains_key(&RegionId(1)));
    }

    #[test]
    fn test_parallel_paths_split_credit() {
        // Diamond 1 -> {2,3} -> 4
        let g = plains_graph(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let weighted = corridor_centrality(&g, &boundary(&[1, 4]), None, &CentralityConfig::default());
        assert!((weighted[&RegionId(2)] - 1.0).abs() < 1e-9);
        assert!((weighted[&RegionId(3)] - 1.0).abs() < 1e-9);

        let binary = corridor_centrality(
            &g,
            &boundary(&[1, 4]),
            None,
            &CentralityConfig {
                multiplicity_weighted: false,
            },
        );
        assert_eq!(binary[&RegionId(2)], 2.0);
        assert_eq!(binary[&RegionId(3)], 2.0);
    }

    #[test]
    fn test_boundary_intermediate_earns_nothing() {
        let g = plains_graph(3, &[(1, 2), (2, 3)]);
        let scores = corridor_centrality(&g, &boundary(&[1, 2, 3]), None, &CentralityConfig::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn test_costly_terrain_reroutes_credit() {
        // 1 - 2(marsh) - 4 and 1 - 3 - 5 - 4
        let mut g = plains_graph(5, &[(1, 2), (2, 4), (1, 3), (3, 5), (5, 4)]);
        g.add_region(Region::new(RegionId(2), Terrain::Marsh));
        let scores = corridor_centrality(&g, &boundary(&[1, 4]), None, &CentralityConfig::default());
        assert!(!scores.contains_key(&RegionId(2)));
        assert_eq!(scores.get(&RegionId(3)), Some(&2.0));
    }
}
