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

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::Config;
use crate::geo::{haversine_distance, METERS_PER_DEGREE_LATITUDE};
use crate::model::{BaseModel, FlowControl, StopTimeRecord};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::timetables::{Timetable, TripSchedule};
use crate::transit_data::{Pattern, Route, SlackIndex, SlackTable, Stop, TransitData, Transfer};

impl TransitData {
    /// Builds the compact transit model from the loader-supplied records.
    ///
    /// Malformed records (unknown stop ids, missing or decreasing times) are
    /// dropped with a warning ; the build itself never fails on per-record
    /// data.
    pub fn new(model: &BaseModel, config: &Config) -> Self {
        let mut data = Self {
            stop_names: Vec::with_capacity(model.stops.len()),
            stop_lats: Vec::with_capacity(model.stops.len()),
            stop_lons: Vec::with_capacity(model.stops.len()),
            patterns_at_stop: Vec::new(),
            transfers_from: Vec::new(),
            transfers_to: Vec::new(),
            routes: Vec::new(),
            slacks: SlackTable::default(),
            service_start_time: SecondsSinceDayStart::zero(),
            service_end_time: SecondsSinceDayStart::zero(),
        };

        let stop_id_to_stop = data.init_stops(model);

        info!("Inserting trips");
        data.init_routes(model, &stop_id_to_stop);
        info!("Number of patterns : {}", data.routes.len());

        data.init_patterns_at_stop();

        info!(
            "Generating transfers within {} m",
            config.max_transfer_distance_meters
        );
        data.init_transfers(config.max_transfer_distance_meters, config.walk_speed_mps);

        data.init_service_period();

        info!("Transit data built : {}", data);

        data
    }

    fn init_stops(&mut self, model: &BaseModel) -> HashMap<String, Stop> {
        let mut stop_id_to_stop = HashMap::with_capacity(model.stops.len());
        for record in &model.stops {
            if stop_id_to_stop.contains_key(&record.id) {
                warn!("Skipping duplicated stop id {}", record.id);
                continue;
            }
            let stop = Stop {
                idx: self.stop_names.len(),
            };
            stop_id_to_stop.insert(record.id.clone(), stop);
            self.stop_names.push(record.name.clone());
            self.stop_lats.push(record.lat);
            self.stop_lons.push(record.lon);
        }
        self.patterns_at_stop = vec![Vec::new(); self.stop_names.len()];
        self.transfers_from = vec![Vec::new(); self.stop_names.len()];
        self.transfers_to = vec![Vec::new(); self.stop_names.len()];
        stop_id_to_stop
    }

    // Groups trips by (route_id, stop sequence), one pattern per group.
    // A trip whose times would break the per-position sort invariant of the
    // pattern's timetable goes to a sibling pattern instead.
    fn init_routes(&mut self, model: &BaseModel, stop_id_to_stop: &HashMap<String, Stop>) {
        let route_records: HashMap<&str, usize> = model
            .routes
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.id.as_str(), idx))
            .collect();

        let mut stop_times_by_trip: HashMap<&str, Vec<&StopTimeRecord>> = HashMap::new();
        for stop_time in &model.stop_times {
            stop_times_by_trip
                .entry(stop_time.trip_id.as_str())
                .or_default()
                .push(stop_time);
        }
        for stop_times in stop_times_by_trip.values_mut() {
            stop_times.sort_by_key(|stop_time| stop_time.sequence);
        }

        // pattern key -> indices of the routes realizing it (the first one,
        // plus the siblings opened on insert rejections)
        let mut pattern_to_routes: HashMap<(String, Vec<Stop>), Vec<usize>> = HashMap::new();
        let mut nb_of_rejected_trips = 0usize;

        for trip in &model.trips {
            let stop_times = match stop_times_by_trip.get(trip.id.as_str()) {
                Some(stop_times) if stop_times.len() >= 2 => stop_times,
                _ => {
                    warn!("Skipping trip {} : less than two stop_times", trip.id);
                    nb_of_rejected_trips += 1;
                    continue;
                }
            };

            let route_record = match route_records.get(trip.route_id.as_str()) {
                Some(route_idx) => &model.routes[*route_idx],
                None => {
                    warn!(
                        "Skipping trip {} : unknown route id {}",
                        trip.id, trip.route_id
                    );
                    nb_of_rejected_trips += 1;
                    continue;
                }
            };

            let mut stop_sequence = Vec::with_capacity(stop_times.len());
            let mut arrivals = Vec::with_capacity(stop_times.len());
            let mut departures = Vec::with_capacity(stop_times.len());
            let mut valid = true;
            for stop_time in stop_times {
                let stop = match stop_id_to_stop.get(&stop_time.stop_id) {
                    Some(stop) => *stop,
                    None => {
                        warn!(
                            "Skipping trip {} : unknown stop id {}",
                            trip.id, stop_time.stop_id
                        );
                        valid = false;
                        break;
                    }
                };
                let (arrival, departure) = match (stop_time.arrival, stop_time.departure) {
                    (Some(arrival), Some(departure)) => (arrival, departure),
                    _ => {
                        warn!("Skipping trip {} : missing time", trip.id);
                        valid = false;
                        break;
                    }
                };
                stop_sequence.push(stop);
                arrivals.push(arrival);
                departures.push(departure);
            }
            if !valid {
                nb_of_rejected_trips += 1;
                continue;
            }

            let schedule = match TripSchedule::new(arrivals, departures, trip.id.clone()) {
                Ok(schedule) => schedule,
                Err(err) => {
                    warn!("Skipping trip {} : {}", trip.id, err);
                    nb_of_rejected_trips += 1;
                    continue;
                }
            };

            let pattern_key = (trip.route_id.clone(), stop_sequence.clone());
            let sibling_route_idxs = pattern_to_routes.entry(pattern_key).or_default();

            let mut to_insert = Some(schedule);
            for &route_idx in sibling_route_idxs.iter() {
                if let Some(candidate) = to_insert.take() {
                    if let Err(rejected) = self.routes[route_idx].timetable.try_insert(candidate) {
                        to_insert = Some(rejected);
                    }
                }
            }
            if let Some(schedule) = to_insert {
                // no sibling accepts this trip : open a new pattern
                let can_board: Vec<bool> = stop_times
                    .iter()
                    .map(|stop_time| stop_time.pickup == FlowControl::Regular)
                    .collect();
                let can_alight: Vec<bool> = stop_times
                    .iter()
                    .map(|stop_time| stop_time.drop_off == FlowControl::Regular)
                    .collect();
                let slack_index = SlackIndex::from_route_type(route_record.route_type);
                let display_name = if route_record.short_name.is_empty() {
                    &route_record.long_name
                } else {
                    &route_record.short_name
                };
                let mut timetable = Timetable::new();
                // insertion into an empty timetable always succeeds
                if timetable.try_insert(schedule).is_err() {
                    unreachable!("insertion into an empty timetable cannot fail");
                }
                let route = Route {
                    stop_sequence,
                    can_board: if can_board.iter().all(|allowed| *allowed) {
                        None
                    } else {
                        Some(can_board)
                    },
                    can_alight: if can_alight.iter().all(|allowed| *allowed) {
                        None
                    } else {
                        Some(can_alight)
                    },
                    slack_index,
                    debug_info: format!(
                        "{}_{}",
                        route_type_name(route_record.route_type),
                        display_name
                    ),
                    timetable,
                    id: route_record.id.clone(),
                    short_name: route_record.short_name.clone(),
                    long_name: route_record.long_name.clone(),
                    route_type: route_record.route_type,
                };
                let route_idx = self.routes.len();
                self.routes.push(route);
                sibling_route_idxs.push(route_idx);
            }
        }

        if nb_of_rejected_trips > 0 {
            warn!("Rejected {} trips while building", nb_of_rejected_trips);
        }
    }

    fn init_patterns_at_stop(&mut self) {
        for (route_idx, route) in self.routes.iter().enumerate() {
            let pattern = Pattern { idx: route_idx };
            for (position, stop) in route.stop_sequence.iter().enumerate() {
                let patterns = &mut self.patterns_at_stop[stop.idx];
                match patterns
                    .iter_mut()
                    .find(|(known_pattern, _)| *known_pattern == pattern)
                {
                    // a loop pattern may visit the same stop twice ;
                    // keep the earliest position
                    Some((_, known_position)) => {
                        if position < *known_position {
                            *known_position = position;
                        }
                    }
                    None => patterns.push((pattern, position)),
                }
            }
        }
        for patterns in &mut self.patterns_at_stop {
            patterns.sort_by_key(|(pattern, _)| *pattern);
        }
    }

    // Distance-based symmetric transfers, pruned by a latitude sort.
    fn init_transfers(&mut self, max_distance_meters: f64, walk_speed_mps: f64) {
        let nb_of_stops = self.nb_of_stops();
        let mut by_latitude: Vec<usize> = (0..nb_of_stops).collect();
        by_latitude.sort_by(|a, b| {
            self.stop_lats[*a]
                .partial_cmp(&self.stop_lats[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let lat_diff = max_distance_meters / METERS_PER_DEGREE_LATITUDE;
        let mut nb_of_transfers = 0usize;

        for i in 0..nb_of_stops {
            let from_idx = by_latitude[i];
            for &to_idx in &by_latitude[i + 1..] {
                if self.stop_lats[to_idx] - self.stop_lats[from_idx] > lat_diff {
                    break;
                }
                let distance = haversine_distance(
                    self.stop_lats[from_idx],
                    self.stop_lons[from_idx],
                    self.stop_lats[to_idx],
                    self.stop_lons[to_idx],
                );
                if distance <= max_distance_meters {
                    let duration =
                        PositiveDuration::from_seconds((distance / walk_speed_mps).ceil() as u32);
                    let towards_to = Transfer {
                        to_stop: Stop { idx: to_idx },
                        duration,
                        distance_meters: distance,
                    };
                    let towards_from = Transfer {
                        to_stop: Stop { idx: from_idx },
                        duration,
                        distance_meters: distance,
                    };
                    self.transfers_from[from_idx].push(towards_to.clone());
                    self.transfers_to[to_idx].push(towards_from.clone());
                    self.transfers_from[to_idx].push(towards_from);
                    self.transfers_to[from_idx].push(towards_to);
                    nb_of_transfers += 2;
                }
            }
        }

        for transfers in self
            .transfers_from
            .iter_mut()
            .chain(self.transfers_to.iter_mut())
        {
            transfers.sort_by_key(|transfer| transfer.to_stop);
        }

        info!("Number of transfers : {}", nb_of_transfers);
    }

    fn init_service_period(&mut self) {
        let start = self
            .routes
            .iter()
            .filter_map(|route| route.timetable.first_departure())
            .min();
        let end = self
            .routes
            .iter()
            .filter_map(|route| route.timetable.last_arrival())
            .max();
        if let (Some(start), Some(end)) = (start, end) {
            self.service_start_time = start;
            self.service_end_time = end;
        }
    }
}

fn route_type_name(route_type: u16) -> &'static str {
    match route_type {
        0 => "TRAM",
        1 => "SUBWAY",
        2 => "RAIL",
        3 => "BUS",
        4 => "FERRY",
        5 | 6 => "CABLECAR",
        7 => "FUNICULAR",
        100..=299 => "RAIL",
        400..=499 | 900..=999 => "SUBWAY",
        700..=799 => "BUS",
        1100..=1199 => "AIR",
        _ => "OTHER",
    }
}
