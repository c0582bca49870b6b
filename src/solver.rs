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

use std::fmt::{Display, Formatter};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::access_egress::{AccessEgress, AccessEgressResolver};
use crate::config::Config;
use crate::engine::raptor::{Raptor, Request, SearchStatus};
use crate::response::Journey;
use crate::street::StreetGraph;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::TransitData;

const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadRequest {
    BadDepartureTime(i64),
    UnknownStop(usize),
}

impl Display for BadRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BadRequest::BadDepartureTime(seconds) => {
                write!(f, "Departure time {} is out of range", seconds)
            }
            BadRequest::UnknownStop(idx) => write!(f, "No stop with index {}", idx),
        }
    }
}

impl std::error::Error for BadRequest {}

/// Why a response carries no journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// no stop within the access radius of the origin
    NoAccess,
    /// no stop within the egress radius of the destination
    NoEgress,
    /// the search completed without reaching any egress stop
    NoPath,
    /// the deadline was hit ; the journeys of the completed rounds (possibly
    /// none) were returned
    Timeout,
}

#[derive(Debug)]
pub struct RouteResponse {
    pub journeys: Vec<Journey>,
    pub diagnostic: Option<Diagnostic>,
}

/// The query surface of the planner : resolves access and egress candidates
/// around the requested coordinates, runs the round-based search, and ranks
/// the reconstructed journeys.
///
/// Owns the engine buffers, hence `&mut self` on queries ; spawn one solver
/// per thread to run queries concurrently against the same data.
pub struct Solver<'data> {
    data: &'data TransitData,
    resolver: AccessEgressResolver<'data>,
    engine: Raptor,
    config: Config,
}

impl<'data> Solver<'data> {
    /// A solver estimating walks with straight-line distances.
    pub fn new(data: &'data TransitData, config: Config) -> Self {
        let resolver = AccessEgressResolver::new(data, &config);
        Self {
            data,
            resolver,
            engine: Raptor::new(),
            config,
        }
    }

    /// A solver computing walks on the pedestrian street graph.
    pub fn with_street_graph(
        data: &'data TransitData,
        street_graph: &'data StreetGraph,
        config: Config,
    ) -> Self {
        let resolver = AccessEgressResolver::with_street_graph(data, street_graph, &config);
        Self {
            data,
            resolver,
            engine: Raptor::new(),
            config,
        }
    }

    pub fn is_using_osm(&self) -> bool {
        self.resolver.is_using_osm()
    }

    /// Coordinate-based search : walks from `(from_lat, from_lon)` to nearby
    /// stops, rides at most `1 + number_of_additional_transfers` vehicles,
    /// walks to `(to_lat, to_lon)`.
    pub fn route(
        &mut self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
        departure_time_sec: i64,
        max_results: usize,
    ) -> Result<RouteResponse, BadRequest> {
        self.route_with_deadline(
            from_lat,
            from_lon,
            to_lat,
            to_lon,
            departure_time_sec,
            max_results,
            None,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn route_with_deadline(
        &mut self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
        departure_time_sec: i64,
        max_results: usize,
        deadline: Option<Instant>,
    ) -> Result<RouteResponse, BadRequest> {
        let departure_time = SecondsSinceDayStart::from_seconds(departure_time_sec)
            .ok_or(BadRequest::BadDepartureTime(departure_time_sec))?;

        let mut accesses = self.resolver.find_nearby_stops(
            from_lat,
            from_lon,
            self.config.max_access_walk_meters,
        );
        if accesses.is_empty() {
            warn!(
                "No stop within {} m of the origin ({}, {})",
                self.config.max_access_walk_meters, from_lat, from_lon
            );
            return Ok(RouteResponse {
                journeys: Vec::new(),
                diagnostic: Some(Diagnostic::NoAccess),
            });
        }
        accesses.truncate(self.config.max_access_stops);

        let mut egresses =
            self.resolver
                .find_nearby_stops(to_lat, to_lon, self.config.max_egress_walk_meters);
        if egresses.is_empty() {
            warn!(
                "No stop within {} m of the destination ({}, {})",
                self.config.max_egress_walk_meters, to_lat, to_lon
            );
            return Ok(RouteResponse {
                journeys: Vec::new(),
                diagnostic: Some(Diagnostic::NoEgress),
            });
        }
        egresses.truncate(self.config.max_egress_stops);

        debug!(
            "Access stops : {}, egress stops : {}",
            accesses.len(),
            egresses.len()
        );

        Ok(self.solve(accesses, egresses, departure_time, max_results, deadline))
    }

    /// Stop-index-based search : board at `from_stop_idx`, alight at
    /// `to_stop_idx`, zero-length walks at both ends.
    pub fn route_by_stop(
        &mut self,
        from_stop_idx: usize,
        to_stop_idx: usize,
        departure_time_sec: i64,
    ) -> Result<RouteResponse, BadRequest> {
        let departure_time = SecondsSinceDayStart::from_seconds(departure_time_sec)
            .ok_or(BadRequest::BadDepartureTime(departure_time_sec))?;
        let from_stop = self
            .data
            .stop(from_stop_idx)
            .ok_or(BadRequest::UnknownStop(from_stop_idx))?;
        let to_stop = self
            .data
            .stop(to_stop_idx)
            .ok_or(BadRequest::UnknownStop(to_stop_idx))?;

        let accesses = vec![AccessEgress::new(from_stop, PositiveDuration::zero(), 0.0)];
        let egresses = vec![AccessEgress::new(to_stop, PositiveDuration::zero(), 0.0)];

        Ok(self.solve(accesses, egresses, departure_time, DEFAULT_MAX_RESULTS, None))
    }

    fn solve(
        &mut self,
        accesses: Vec<AccessEgress>,
        egresses: Vec<AccessEgress>,
        departure_time: SecondsSinceDayStart,
        max_results: usize,
        deadline: Option<Instant>,
    ) -> RouteResponse {
        let request = Request {
            departure_time,
            accesses,
            egresses,
            nb_of_rides_max: 1 + self.config.number_of_additional_transfers,
            deadline,
        };

        debug!("Start computing journeys");
        let request_timer = Instant::now();
        let status = self.engine.compute(self.data, &request);
        info!(
            "Journeys computed in {} ms with {} rounds",
            request_timer.elapsed().as_millis(),
            self.engine.nb_of_rounds()
        );

        let mut journeys = self.engine.journeys(self.data, &request);

        // drop journeys boarding outside [departure, departure + window)
        let window = PositiveDuration::from_seconds(self.config.search_window_seconds);
        let window_end = departure_time + window;
        journeys.retain(|journey| journey.first_vehicle_board_time(self.data) < window_end);

        let data = self.data;
        journeys.sort_by_key(|journey| {
            let first_board_stop =
                data.stop_at(&journey.first_vehicle.pattern, journey.first_vehicle.board_position);
            (
                journey.arrival_time(data),
                journey.nb_of_rides(),
                journey.first_vehicle_board_time(data),
                journey.first_vehicle.pattern.idx(),
                first_board_stop.idx(),
            )
        });
        journeys.dedup();
        journeys.truncate(max_results);

        info!("Nb of journeys found : {}", journeys.len());

        let diagnostic = if journeys.is_empty() {
            match status {
                SearchStatus::TimedOut => Some(Diagnostic::Timeout),
                SearchStatus::Complete => Some(Diagnostic::NoPath),
            }
        } else {
            None
        };

        RouteResponse {
            journeys,
            diagnostic,
        }
    }
}
