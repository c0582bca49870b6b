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

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::geo::{haversine_distance, METERS_PER_DEGREE_LATITUDE};
use crate::street::walking_router::WalkingRouter;
use crate::street::{StreetGraph, StreetNodeIdx};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Stop, TransitData};

/// Cap on the ranked candidates returned by one resolver call.
/// Callers usually trim further (to the configured 5).
const MAX_STOPS: usize = 30;

/// How many haversine-closest candidates get a street-level A* each.
const OSM_CANDIDATE_LIMIT: usize = 30;

/// Snap radius when attaching a coordinate or a stop to the street graph.
const STREET_SNAP_RADIUS_METERS: f64 = 300.0;

/// Walks estimated without the street graph are scaled by this factor.
const DETOUR_FACTOR: f64 = 1.3;

/// Wall-clock budget of one per-candidate A* task.
const A_STAR_TASK_BUDGET: Duration = Duration::from_secs(2);

/// A walk between a coordinate and a stop, at either end of a journey.
/// Available around the clock : it constrains neither departure nor arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessEgress {
    pub stop: Stop,
    pub duration: PositiveDuration,
    pub distance_meters: f64,
}

impl AccessEgress {
    pub fn new(stop: Stop, duration: PositiveDuration, distance_meters: f64) -> Self {
        Self {
            stop,
            duration,
            distance_meters,
        }
    }

    pub fn from_distance(stop: Stop, distance_meters: f64, walk_speed_mps: f64) -> Self {
        let duration =
            PositiveDuration::from_seconds((distance_meters / walk_speed_mps).ceil() as u32);
        Self {
            stop,
            duration,
            distance_meters,
        }
    }

    /// Cost in the engine's centi-second cost space.
    pub fn cost(&self) -> u64 {
        self.duration.total_seconds() * 100
    }

    pub fn earliest_departure_time(&self, requested: SecondsSinceDayStart) -> SecondsSinceDayStart {
        requested
    }

    pub fn latest_arrival_time(&self, requested: SecondsSinceDayStart) -> SecondsSinceDayStart {
        requested
    }
}

struct StreetRouting<'a> {
    graph: &'a StreetGraph,
    /// nearest street node of every stop, precomputed at build time ;
    /// `None` when the stop is farther than the snap radius from any road
    stop_nearest_nodes: Vec<Option<StreetNodeIdx>>,
    a_star_max_iterations: usize,
    a_star_max_distance_meters: f64,
}

/// Turns a coordinate into a short ranked list of boarding (or alighting)
/// candidates with realistic walking times.
///
/// Without a street graph, walks are straight-line distances. With one,
/// the haversine-closest candidates each get a pedestrian A*, run in
/// parallel on the rayon pool.
pub struct AccessEgressResolver<'a> {
    data: &'a TransitData,
    street: Option<StreetRouting<'a>>,
    walk_speed_mps: f64,
}

impl<'a> AccessEgressResolver<'a> {
    /// Haversine-only resolver.
    pub fn new(data: &'a TransitData, config: &Config) -> Self {
        Self {
            data,
            street: None,
            walk_speed_mps: config.walk_speed_mps,
        }
    }

    /// OSM-backed resolver. Precomputes the nearest street node of every
    /// stop, in parallel.
    pub fn with_street_graph(
        data: &'a TransitData,
        graph: &'a StreetGraph,
        config: &Config,
    ) -> Self {
        info!("Mapping stops onto the street graph");
        let start_time = Instant::now();
        let stop_lats = &data.stop_lats;
        let stop_lons = &data.stop_lons;
        let stop_nearest_nodes: Vec<Option<StreetNodeIdx>> = (0..data.nb_of_stops())
            .into_par_iter()
            .map(|idx| graph.nearest_node(stop_lats[idx], stop_lons[idx], STREET_SNAP_RADIUS_METERS))
            .collect();
        let nb_of_mapped = stop_nearest_nodes
            .iter()
            .filter(|node| node.is_some())
            .count();
        info!(
            "Mapped {} stops out of {} onto the street graph in {} ms",
            nb_of_mapped,
            data.nb_of_stops(),
            start_time.elapsed().as_millis()
        );

        Self {
            data,
            street: Some(StreetRouting {
                graph,
                stop_nearest_nodes,
                a_star_max_iterations: config.a_star_max_iterations,
                a_star_max_distance_meters: config.a_star_max_distance_meters,
            }),
            walk_speed_mps: config.walk_speed_mps,
        }
    }

    pub fn is_using_osm(&self) -> bool {
        self.street.is_some()
    }

    /// Candidate stops within `max_distance_meters` of `(lat, lon)`,
    /// ranked by non-decreasing walking duration, at most [`MAX_STOPS`] of
    /// them.
    pub fn find_nearby_stops(
        &self,
        lat: f64,
        lon: f64,
        max_distance_meters: f64,
    ) -> Vec<AccessEgress> {
        let candidates = self.haversine_candidates(lat, lon, max_distance_meters);

        match &self.street {
            Some(street) => {
                self.street_ranked(street, lat, lon, max_distance_meters, candidates)
            }
            None => candidates
                .into_iter()
                .filter(|candidate| candidate.straight_distance <= max_distance_meters)
                .take(MAX_STOPS)
                .map(|candidate| {
                    AccessEgress::from_distance(
                        candidate.stop,
                        candidate.straight_distance,
                        self.walk_speed_mps,
                    )
                })
                .collect(),
        }
    }

    // Straight-line prefilter : latitude band first, then haversine with a
    // 1.5 headroom so that street detours may still fit the radius.
    // Sorted by straight distance.
    fn haversine_candidates(
        &self,
        lat: f64,
        lon: f64,
        max_distance_meters: f64,
    ) -> Vec<StopDistance> {
        let lat_diff = max_distance_meters / METERS_PER_DEGREE_LATITUDE;
        let mut candidates: Vec<StopDistance> = Vec::new();
        for stop in self.data.stops() {
            let stop_lat = self.data.stop_lat(&stop);
            if (stop_lat - lat).abs() > lat_diff {
                continue;
            }
            let straight_distance =
                haversine_distance(lat, lon, stop_lat, self.data.stop_lon(&stop));
            if straight_distance <= max_distance_meters * 1.5 {
                candidates.push(StopDistance {
                    stop,
                    walk_distance: straight_distance,
                    straight_distance,
                });
            }
        }
        candidates.sort_by(|a, b| {
            a.straight_distance
                .partial_cmp(&b.straight_distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.stop.cmp(&b.stop))
        });
        candidates
    }

    fn street_ranked(
        &self,
        street: &StreetRouting<'_>,
        lat: f64,
        lon: f64,
        max_distance_meters: f64,
        candidates: Vec<StopDistance>,
    ) -> Vec<AccessEgress> {
        let origin_node =
            match street
                .graph
                .nearest_node(lat, lon, STREET_SNAP_RADIUS_METERS)
            {
                Some(node) => node,
                None => {
                    // not connected to the street graph : straight distance
                    // with a detour factor is the best estimate left
                    return candidates
                        .into_iter()
                        .take(MAX_STOPS)
                        .filter_map(|candidate| {
                            let walk_distance = candidate.straight_distance * DETOUR_FACTOR;
                            if walk_distance <= max_distance_meters {
                                Some(AccessEgress::from_distance(
                                    candidate.stop,
                                    walk_distance,
                                    self.walk_speed_mps,
                                ))
                            } else {
                                None
                            }
                        })
                        .collect();
                }
            };

        let router = WalkingRouter::new(
            street.graph,
            street.a_star_max_iterations,
            street.a_star_max_distance_meters,
        );
        let origin = street.graph.node(origin_node);
        let origin_snap_distance = haversine_distance(lat, lon, origin.lat, origin.lon);

        let nb_of_tasks = candidates.len().min(OSM_CANDIDATE_LIMIT);
        let mut ranked: Vec<StopDistance> = candidates[..nb_of_tasks]
            .par_iter()
            .filter_map(|candidate| {
                let deadline = Instant::now() + A_STAR_TASK_BUDGET;
                let walk_distance = match street.stop_nearest_nodes[candidate.stop.idx()] {
                    None => candidate.straight_distance * DETOUR_FACTOR,
                    Some(stop_node) if stop_node == origin_node => candidate.straight_distance,
                    Some(stop_node) => {
                        match router.walking_distance(origin_node, stop_node, Some(deadline)) {
                            Some(street_distance) => {
                                let stop_node = street.graph.node(stop_node);
                                let stop_snap_distance = haversine_distance(
                                    stop_node.lat,
                                    stop_node.lon,
                                    self.data.stop_lat(&candidate.stop),
                                    self.data.stop_lon(&candidate.stop),
                                );
                                street_distance + origin_snap_distance + stop_snap_distance
                            }
                            None => candidate.straight_distance * DETOUR_FACTOR,
                        }
                    }
                };
                if walk_distance <= max_distance_meters {
                    Some(StopDistance {
                        stop: candidate.stop,
                        walk_distance,
                        straight_distance: candidate.straight_distance,
                    })
                } else {
                    None
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.walk_distance
                .partial_cmp(&b.walk_distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.stop.cmp(&b.stop))
        });

        ranked
            .into_iter()
            .take(MAX_STOPS)
            .map(|candidate| {
                AccessEgress::from_distance(candidate.stop, candidate.walk_distance, self.walk_speed_mps)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct StopDistance {
    stop: Stop,
    /// street-level walk when available, straight-line otherwise
    walk_distance: f64,
    straight_distance: f64,
}
