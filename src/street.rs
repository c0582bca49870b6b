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

pub mod walking_router;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use tracing::info;

use crate::geo::{haversine_distance, METERS_PER_DEGREE_LATITUDE};

/// Grid cell side, in degrees. Roughly 100 m at korean latitudes.
const GRID_SIZE_DEGREES: f64 = 0.001;

/// Handle on a node of the street graph.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct StreetNodeIdx {
    pub(crate) idx: usize,
}

#[derive(Debug, Clone)]
pub struct StreetNode {
    pub osm_id: i64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub to: StreetNodeIdx,
    pub length_meters: f64,
    pub highway: HighwayClass,
}

/// The highway classes a pedestrian may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighwayClass {
    Footway,
    Pedestrian,
    Path,
    Steps,
    Cycleway,
    Residential,
    LivingStreet,
    Tertiary,
    Secondary,
    Primary,
    Trunk,
    Unclassified,
    Service,
    Track,
}

impl HighwayClass {
    /// `None` for highway tags pedestrians cannot use (motorway, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let class = match tag {
            "footway" => HighwayClass::Footway,
            "pedestrian" => HighwayClass::Pedestrian,
            "path" => HighwayClass::Path,
            "steps" => HighwayClass::Steps,
            "cycleway" => HighwayClass::Cycleway,
            "residential" => HighwayClass::Residential,
            "living_street" => HighwayClass::LivingStreet,
            "tertiary" => HighwayClass::Tertiary,
            "secondary" => HighwayClass::Secondary,
            "primary" => HighwayClass::Primary,
            "trunk" => HighwayClass::Trunk,
            "unclassified" => HighwayClass::Unclassified,
            "service" => HighwayClass::Service,
            "track" => HighwayClass::Track,
            _ => return None,
        };
        Some(class)
    }

    /// Pedestrian speed on this class of road, in m/s.
    /// The engine converts distances to times with a uniform speed ;
    /// these per-class speeds are kept for street-level estimations.
    pub fn walk_speed_mps(&self) -> f64 {
        match self {
            HighwayClass::Footway | HighwayClass::Pedestrian | HighwayClass::Path => 1.3,
            HighwayClass::Steps => 0.6,
            HighwayClass::Primary | HighwayClass::Trunk => 1.0,
            HighwayClass::Tertiary | HighwayClass::Secondary => 1.1,
            _ => 1.2,
        }
    }
}

/// Walkable pedestrian graph derived from OpenStreetMap, with a grid-based
/// spatial index for nearest-node queries.
///
/// Ways are stored as two directed edges unless marked one-way.
/// Immutable once built ; concurrent queries share it freely.
pub struct StreetGraph {
    nodes: Vec<StreetNode>,
    adjacency: Vec<Vec<StreetEdge>>,
    grid: HashMap<(i32, i32), Vec<StreetNodeIdx>>,
    nb_of_edges: usize,
}

impl StreetGraph {
    pub fn nb_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nb_of_edges(&self) -> usize {
        self.nb_of_edges
    }

    pub fn node(&self, node_idx: StreetNodeIdx) -> &StreetNode {
        &self.nodes[node_idx.idx]
    }

    pub fn edges_from(&self, node_idx: StreetNodeIdx) -> &[StreetEdge] {
        &self.adjacency[node_idx.idx]
    }

    /// The node closest to `(lat, lon)` within `max_distance_meters`,
    /// found by scanning the grid cells covering that radius.
    pub fn nearest_node(
        &self,
        lat: f64,
        lon: f64,
        max_distance_meters: f64,
    ) -> Option<StreetNodeIdx> {
        let grid_radius =
            (max_distance_meters / METERS_PER_DEGREE_LATITUDE / GRID_SIZE_DEGREES).ceil() as i32
                + 1;
        let (center_x, center_y) = grid_key(lat, lon);

        let mut nearest = None;
        let mut min_distance = f64::MAX;
        for dx in -grid_radius..=grid_radius {
            for dy in -grid_radius..=grid_radius {
                let cell = match self.grid.get(&(center_x + dx, center_y + dy)) {
                    Some(cell) => cell,
                    None => continue,
                };
                for node_idx in cell {
                    let node = &self.nodes[node_idx.idx];
                    let distance = haversine_distance(lat, lon, node.lat, node.lon);
                    if distance < min_distance && distance <= max_distance_meters {
                        min_distance = distance;
                        nearest = Some(*node_idx);
                    }
                }
            }
        }
        nearest
    }
}

impl Display for StreetGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StreetGraph[nodes={}, edges={}]",
            self.nodes.len(),
            self.nb_of_edges
        )
    }
}

fn grid_key(lat: f64, lon: f64) -> (i32, i32) {
    (
        (lat / GRID_SIZE_DEGREES).floor() as i32,
        (lon / GRID_SIZE_DEGREES).floor() as i32,
    )
}

/// A way candidate handed over by the external OSM loader, tags included.
#[derive(Debug, Clone)]
pub struct WayRecord {
    pub way_id: i64,
    pub node_ids: Vec<i64>,
    pub highway: String,
    pub oneway: bool,
    pub foot: Option<String>,
    pub access: Option<String>,
}

/// Two-phase build contract for the external OSM loader :
/// declare every way first, then feed the coordinates of the node ids
/// listed by [`StreetGraphBuilder::required_node_ids`], then [`build`].
///
/// Nodes not referenced by any walkable way are discarded.
///
/// [`build`]: StreetGraphBuilder::build
pub struct StreetGraphBuilder {
    ways: Vec<(WayRecord, HighwayClass)>,
    required_nodes: std::collections::HashSet<i64>,
    coords: HashMap<i64, (f64, f64)>,
}

impl Default for StreetGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreetGraphBuilder {
    pub fn new() -> Self {
        Self {
            ways: Vec::new(),
            required_nodes: std::collections::HashSet::new(),
            coords: HashMap::new(),
        }
    }

    /// Keeps the way if a pedestrian may walk it, discards it otherwise.
    pub fn declare_way(&mut self, way: WayRecord) {
        let class = match walkable_class(&way) {
            Some(class) => class,
            None => return,
        };
        for node_id in &way.node_ids {
            self.required_nodes.insert(*node_id);
        }
        self.ways.push((way, class));
    }

    pub fn required_node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.required_nodes.iter().copied()
    }

    /// Ignores nodes no kept way references.
    pub fn add_node(&mut self, node_id: i64, lat: f64, lon: f64) {
        if self.required_nodes.contains(&node_id) {
            self.coords.insert(node_id, (lat, lon));
        }
    }

    pub fn build(self) -> StreetGraph {
        let mut graph = StreetGraph {
            nodes: Vec::new(),
            adjacency: Vec::new(),
            grid: HashMap::new(),
            nb_of_edges: 0,
        };
        let mut node_idx_by_id: HashMap<i64, StreetNodeIdx> = HashMap::new();

        for (way, class) in &self.ways {
            // a way with a node whose coordinates never arrived is dropped
            let all_known = way
                .node_ids
                .iter()
                .all(|node_id| self.coords.contains_key(node_id));
            if !all_known {
                continue;
            }

            let node_idxs: Vec<StreetNodeIdx> = way
                .node_ids
                .iter()
                .map(|node_id| {
                    *node_idx_by_id.entry(*node_id).or_insert_with(|| {
                        let (lat, lon) = self.coords[node_id];
                        let node_idx = StreetNodeIdx {
                            idx: graph.nodes.len(),
                        };
                        graph.nodes.push(StreetNode {
                            osm_id: *node_id,
                            lat,
                            lon,
                        });
                        graph.adjacency.push(Vec::new());
                        graph
                            .grid
                            .entry(grid_key(lat, lon))
                            .or_default()
                            .push(node_idx);
                        node_idx
                    })
                })
                .collect();

            for window in node_idxs.windows(2) {
                let (from, to) = (window[0], window[1]);
                let from_node = &graph.nodes[from.idx];
                let to_node = &graph.nodes[to.idx];
                let length_meters =
                    haversine_distance(from_node.lat, from_node.lon, to_node.lat, to_node.lon);
                graph.adjacency[from.idx].push(StreetEdge {
                    to,
                    length_meters,
                    highway: *class,
                });
                graph.nb_of_edges += 1;
                if !way.oneway {
                    graph.adjacency[to.idx].push(StreetEdge {
                        to: from,
                        length_meters,
                        highway: *class,
                    });
                    graph.nb_of_edges += 1;
                }
            }
        }

        info!("Street graph built : {}", graph);
        graph
    }
}

fn walkable_class(way: &WayRecord) -> Option<HighwayClass> {
    let class = HighwayClass::from_tag(&way.highway)?;
    if matches!(way.foot.as_deref(), Some("no") | Some("private")) {
        return None;
    }
    if matches!(way.access.as_deref(), Some("no") | Some("private"))
        && !matches!(way.foot.as_deref(), Some("yes") | Some("designated"))
    {
        return None;
    }
    Some(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(way_id: i64, node_ids: &[i64], highway: &str) -> WayRecord {
        WayRecord {
            way_id,
            node_ids: node_ids.to_vec(),
            highway: highway.to_string(),
            oneway: false,
            foot: None,
            access: None,
        }
    }

    #[test]
    fn walkability_filter() {
        assert!(walkable_class(&way(1, &[], "footway")).is_some());
        assert!(walkable_class(&way(1, &[], "motorway")).is_none());

        let mut no_foot = way(1, &[], "residential");
        no_foot.foot = Some("no".to_string());
        assert!(walkable_class(&no_foot).is_none());

        let mut private_access = way(1, &[], "service");
        private_access.access = Some("private".to_string());
        assert!(walkable_class(&private_access).is_none());

        // an explicit foot=yes overrides access=private
        private_access.foot = Some("yes".to_string());
        assert!(walkable_class(&private_access).is_some());
    }

    #[test]
    fn per_class_speeds() {
        assert_eq!(HighwayClass::Footway.walk_speed_mps(), 1.3);
        assert_eq!(HighwayClass::Steps.walk_speed_mps(), 0.6);
        assert_eq!(HighwayClass::Primary.walk_speed_mps(), 1.0);
        assert_eq!(HighwayClass::Secondary.walk_speed_mps(), 1.1);
        assert_eq!(HighwayClass::Residential.walk_speed_mps(), 1.2);
    }

    #[test]
    fn build_and_find_nearest() {
        let mut builder = StreetGraphBuilder::new();
        builder.declare_way(way(1, &[10, 11, 12], "footway"));
        builder.add_node(10, 37.5540, 126.9700);
        builder.add_node(11, 37.5550, 126.9710);
        builder.add_node(12, 37.5560, 126.9720);
        // an unreferenced node is discarded
        builder.add_node(99, 37.5800, 126.9900);
        let graph = builder.build();

        assert_eq!(graph.nb_of_nodes(), 3);
        // both directions
        assert_eq!(graph.nb_of_edges(), 4);

        let nearest = graph.nearest_node(37.5551, 126.9711, 300.0).unwrap();
        assert_eq!(graph.node(nearest).osm_id, 11);

        assert!(graph.nearest_node(38.0, 127.5, 300.0).is_none());
    }

    #[test]
    fn oneway_way_gets_a_single_edge() {
        let mut builder = StreetGraphBuilder::new();
        let mut oneway = way(1, &[10, 11], "residential");
        oneway.oneway = true;
        builder.declare_way(oneway);
        builder.add_node(10, 37.5540, 126.9700);
        builder.add_node(11, 37.5550, 126.9710);
        let graph = builder.build();
        assert_eq!(graph.nb_of_edges(), 1);
    }

    #[test]
    fn way_with_missing_node_is_dropped() {
        let mut builder = StreetGraphBuilder::new();
        builder.declare_way(way(1, &[10, 11], "footway"));
        builder.add_node(10, 37.5540, 126.9700);
        let graph = builder.build();
        assert_eq!(graph.nb_of_nodes(), 0);
        assert_eq!(graph.nb_of_edges(), 0);
    }
}
