// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use crate::geo::haversine_distance;
use crate::street::{StreetGraph, StreetNodeIdx};

/// A* over the street graph, with the straight-line distance as heuristic
/// (admissible : the crow flies no farther than the road).
///
/// Scoring state lives in per-query hash maps, so the shared graph is never
/// mutated and concurrent searches are safe.
pub struct WalkingRouter<'graph> {
    graph: &'graph StreetGraph,
    max_iterations: usize,
    max_search_distance_meters: f64,
}

#[derive(Debug, Clone)]
pub struct WalkingPath {
    pub distance_meters: f64,
    pub nodes: Vec<StreetNodeIdx>,
}

// The open set orders f-scores as integer centimeters, smallest first.
// Ties break on the node index so that the search is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrontierEntry {
    f_score_cm: u64,
    node: StreetNodeIdx,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f_score_cm
            .cmp(&self.f_score_cm)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn to_centimeters(meters: f64) -> u64 {
    (meters * 100.0).round() as u64
}

impl<'graph> WalkingRouter<'graph> {
    pub fn new(
        graph: &'graph StreetGraph,
        max_iterations: usize,
        max_search_distance_meters: f64,
    ) -> Self {
        Self {
            graph,
            max_iterations,
            max_search_distance_meters,
        }
    }

    /// Walking distance in meters between two street nodes, or `None` when
    /// the search is abandoned (no path, iteration cap, distance cap, or
    /// deadline). Callers fall back to the straight-line distance times 1.3.
    pub fn walking_distance(
        &self,
        from: StreetNodeIdx,
        to: StreetNodeIdx,
        deadline: Option<Instant>,
    ) -> Option<f64> {
        self.shortest_path(from, to, deadline)
            .map(|path| path.distance_meters)
    }

    pub fn shortest_path(
        &self,
        from: StreetNodeIdx,
        to: StreetNodeIdx,
        deadline: Option<Instant>,
    ) -> Option<WalkingPath> {
        if from == to {
            return Some(WalkingPath {
                distance_meters: 0.0,
                nodes: vec![from],
            });
        }

        let goal = self.graph.node(to);

        let mut g_scores: HashMap<StreetNodeIdx, f64> = HashMap::new();
        let mut parents: HashMap<StreetNodeIdx, StreetNodeIdx> = HashMap::new();
        let mut closed: HashSet<StreetNodeIdx> = HashSet::new();
        let mut open: BinaryHeap<FrontierEntry> = BinaryHeap::new();

        g_scores.insert(from, 0.0);
        open.push(FrontierEntry {
            f_score_cm: to_centimeters(self.heuristic(from, goal.lat, goal.lon)),
            node: from,
        });

        let mut iterations = 0usize;
        while let Some(entry) = open.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                return None;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return None;
                }
            }

            let current = entry.node;
            if current == to {
                return Some(self.reconstruct_path(to, &parents, g_scores[&to]));
            }
            if !closed.insert(current) {
                continue;
            }

            let current_g_score = g_scores[&current];
            if current_g_score > self.max_search_distance_meters {
                continue;
            }

            for edge in self.graph.edges_from(current) {
                let neighbor = edge.to;
                if closed.contains(&neighbor) {
                    continue;
                }
                let tentative_g_score = current_g_score + edge.length_meters;
                let known_g_score = g_scores.get(&neighbor).copied().unwrap_or(f64::MAX);
                if tentative_g_score < known_g_score {
                    parents.insert(neighbor, current);
                    g_scores.insert(neighbor, tentative_g_score);
                    let f_score =
                        tentative_g_score + self.heuristic(neighbor, goal.lat, goal.lon);
                    open.push(FrontierEntry {
                        f_score_cm: to_centimeters(f_score),
                        node: neighbor,
                    });
                }
            }
        }

        None
    }

    fn heuristic(&self, node_idx: StreetNodeIdx, goal_lat: f64, goal_lon: f64) -> f64 {
        let node = self.graph.node(node_idx);
        haversine_distance(node.lat, node.lon, goal_lat, goal_lon)
    }

    fn reconstruct_path(
        &self,
        goal: StreetNodeIdx,
        parents: &HashMap<StreetNodeIdx, StreetNodeIdx>,
        distance_meters: f64,
    ) -> WalkingPath {
        let mut nodes = vec![goal];
        let mut current = goal;
        while let Some(parent) = parents.get(&current) {
            nodes.push(*parent);
            current = *parent;
        }
        nodes.reverse();
        WalkingPath {
            distance_meters,
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::street::{StreetGraphBuilder, WayRecord};

    fn grid_graph() -> StreetGraph {
        // a 3 x 3 street grid, roughly 110 m between neighbors
        let mut builder = StreetGraphBuilder::new();
        let node_id = |row: i64, col: i64| 10 * row + col;
        for row in 0..3 {
            builder.declare_way(WayRecord {
                way_id: 100 + row,
                node_ids: (0..3).map(|col| node_id(row, col)).collect(),
                highway: "residential".to_string(),
                oneway: false,
                foot: None,
                access: None,
            });
        }
        for col in 0..3 {
            builder.declare_way(WayRecord {
                way_id: 200 + col,
                node_ids: (0..3).map(|row| node_id(row, col)).collect(),
                highway: "residential".to_string(),
                oneway: false,
                foot: None,
                access: None,
            });
        }
        for row in 0..3 {
            for col in 0..3 {
                builder.add_node(
                    node_id(row, col),
                    37.5540 + 0.001 * row as f64,
                    126.9700 + 0.001 * col as f64,
                );
            }
        }
        builder.build()
    }

    #[test]
    fn shortest_path_on_a_grid() {
        let graph = grid_graph();
        let router = WalkingRouter::new(&graph, 15_000, 1_000.0);
        let from = graph.nearest_node(37.5540, 126.9700, 50.0).unwrap();
        let to = graph.nearest_node(37.5560, 126.9720, 50.0).unwrap();

        let path = router.shortest_path(from, to, None).unwrap();
        // two hops east + two hops north, whatever the order
        assert_eq!(path.nodes.len(), 5);

        // the heuristic is admissible : never shorter than the crow flies
        let straight = haversine_distance(37.5540, 126.9700, 37.5560, 126.9720);
        assert!(path.distance_meters >= straight);
    }

    #[test]
    fn distance_cap_abandons_the_search() {
        let graph = grid_graph();
        let router = WalkingRouter::new(&graph, 15_000, 50.0);
        let from = graph.nearest_node(37.5540, 126.9700, 50.0).unwrap();
        let to = graph.nearest_node(37.5560, 126.9720, 50.0).unwrap();
        assert!(router.walking_distance(from, to, None).is_none());
    }

    #[test]
    fn iteration_cap_abandons_the_search() {
        let graph = grid_graph();
        let router = WalkingRouter::new(&graph, 2, 1_000.0);
        let from = graph.nearest_node(37.5540, 126.9700, 50.0).unwrap();
        let to = graph.nearest_node(37.5560, 126.9720, 50.0).unwrap();
        assert!(router.walking_distance(from, to, None).is_none());
    }

    #[test]
    fn same_node_is_a_zero_length_path() {
        let graph = grid_graph();
        let router = WalkingRouter::new(&graph, 15_000, 1_000.0);
        let node = graph.nearest_node(37.5540, 126.9700, 50.0).unwrap();
        let path = router.shortest_path(node, node, None).unwrap();
        assert_eq!(path.distance_meters, 0.0);
        assert_eq!(path.nodes, vec![node]);
    }
}
