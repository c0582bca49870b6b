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

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::trace;

use crate::access_egress::AccessEgress;
use crate::response::{Journey, TransferLeg, VehicleLeg, WalkLeg};
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Pattern, Stop, TransitData};

/// One query for the engine.
pub struct Request {
    /// earliest departure time at the origin coordinate
    pub departure_time: SecondsSinceDayStart,
    pub accesses: Vec<AccessEgress>,
    pub egresses: Vec<AccessEgress>,
    /// upper bound on boardings, i.e. 1 + number of additional transfers
    pub nb_of_rides_max: usize,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Complete,
    /// the deadline was hit between two rounds ; the labels of the rounds
    /// already completed are valid, later rounds never ran
    TimedOut,
}

// Enough information to reconstruct the leg that set a label.
#[derive(Debug, Clone)]
enum Label {
    Access {
        duration: PositiveDuration,
        distance_meters: f64,
    },
    Board {
        pattern: Pattern,
        trip_idx: usize,
        board_position: usize,
        alight_position: usize,
    },
    Transfer {
        from_stop: Stop,
        duration: PositiveDuration,
        distance_meters: f64,
    },
}

/// Round-based earliest-arrival search over the transit data.
///
/// Round `k` holds the best arrival times using exactly `k` rides ; round 0
/// is "reached by walking from the origin only". Each round scans the
/// patterns touching the stops marked by the previous round, then applies
/// foot transfers from the stops a boarding improved. A transfer may only
/// originate from a stop improved by a boarding in the same round, so two
/// consecutive transfers can never happen.
///
/// The engine owns its buffers and reuses them across queries ; a query
/// starts by clearing them, so no per-query state survives a call.
pub struct Raptor {
    best_arrival: Vec<SecondsSinceDayStart>,

    // round_arrivals[round][stop]
    round_arrivals: Vec<Vec<SecondsSinceDayStart>>,
    labels: Vec<Vec<Option<Label>>>,

    // stops improved in the previous round, feeding the next pattern sweep
    marked_flags: Vec<bool>,
    marked_stops: Vec<Stop>,

    // stops improved by a boarding in the current round ; transfers
    // propagate from these stops only
    improved_flags: Vec<bool>,
    improved_stops: Vec<Stop>,

    // best known arrival at the destination coordinate, for target pruning
    best_egress_arrival: SecondsSinceDayStart,

    nb_of_rounds_performed: usize,
}

impl Default for Raptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Raptor {
    pub fn new() -> Self {
        Self {
            best_arrival: Vec::new(),
            round_arrivals: Vec::new(),
            labels: Vec::new(),
            marked_flags: Vec::new(),
            marked_stops: Vec::new(),
            improved_flags: Vec::new(),
            improved_stops: Vec::new(),
            best_egress_arrival: SecondsSinceDayStart::max(),
            nb_of_rounds_performed: 0,
        }
    }

    pub fn compute(&mut self, data: &TransitData, request: &Request) -> SearchStatus {
        self.clear(data.nb_of_stops(), request.nb_of_rides_max + 1);

        self.init_with_accesses(request);

        for round in 1..=request.nb_of_rides_max {
            if self.marked_stops.is_empty() {
                break;
            }
            if let Some(deadline) = request.deadline {
                if Instant::now() >= deadline {
                    return SearchStatus::TimedOut;
                }
            }

            let queue = self.build_queue(data);
            debug_assert!(self.improved_stops.is_empty());

            for (pattern, start_position) in queue {
                self.scan_pattern(data, round, &pattern, start_position);
            }

            self.perform_transfers(data, round);

            self.update_egress_bound(round, &request.egresses);

            self.nb_of_rounds_performed = round;
        }

        SearchStatus::Complete
    }

    pub fn nb_of_rounds(&self) -> usize {
        self.nb_of_rounds_performed
    }

    /// Best arrival at `stop` across all rounds, when reached.
    pub fn best_arrival_at(&self, stop: &Stop) -> Option<SecondsSinceDayStart> {
        let arrival = self.best_arrival[stop.idx()];
        if arrival == SecondsSinceDayStart::max() {
            None
        } else {
            Some(arrival)
        }
    }

    /// Arrival at `stop` using exactly `round` rides, when reached.
    pub fn round_arrival_at(&self, round: usize, stop: &Stop) -> Option<SecondsSinceDayStart> {
        let arrival = self.round_arrivals.get(round)?[stop.idx()];
        if arrival == SecondsSinceDayStart::max() {
            None
        } else {
            Some(arrival)
        }
    }

    fn clear(&mut self, nb_of_stops: usize, nb_of_rounds: usize) {
        self.best_arrival.clear();
        self.best_arrival
            .resize(nb_of_stops, SecondsSinceDayStart::max());

        self.round_arrivals.clear();
        self.round_arrivals
            .resize(nb_of_rounds, vec![SecondsSinceDayStart::max(); nb_of_stops]);
        self.labels.clear();
        self.labels.resize(nb_of_rounds, vec![None; nb_of_stops]);

        self.marked_flags.clear();
        self.marked_flags.resize(nb_of_stops, false);
        self.marked_stops.clear();
        self.improved_flags.clear();
        self.improved_flags.resize(nb_of_stops, false);
        self.improved_stops.clear();

        self.best_egress_arrival = SecondsSinceDayStart::max();
        self.nb_of_rounds_performed = 0;
    }

    fn init_with_accesses(&mut self, request: &Request) {
        for access in &request.accesses {
            let departure = access.earliest_departure_time(request.departure_time);
            let arrival = departure + access.duration;
            let stop_idx = access.stop.idx();
            if arrival < self.round_arrivals[0][stop_idx] {
                self.round_arrivals[0][stop_idx] = arrival;
                self.best_arrival[stop_idx] = arrival.min(self.best_arrival[stop_idx]);
                self.labels[0][stop_idx] = Some(Label::Access {
                    duration: access.duration,
                    distance_meters: access.distance_meters,
                });
                self.mark(access.stop);
            }
        }
    }

    // The patterns touching any marked stop, each with the earliest
    // in-pattern position among its marked stops. Ordered by pattern index
    // so that ties break deterministically.
    fn build_queue(&mut self, data: &TransitData) -> BTreeMap<Pattern, usize> {
        let mut queue = BTreeMap::new();
        let marked_stops = std::mem::take(&mut self.marked_stops);
        for stop in &marked_stops {
            self.marked_flags[stop.idx()] = false;
            for (pattern, position) in data.patterns_at_stop(stop) {
                // the same stop may occur on a pattern at a later position
                // than the position of another marked stop ; keep the minimum
                queue
                    .entry(*pattern)
                    .and_modify(|known: &mut usize| {
                        if *position < *known {
                            *known = *position;
                        }
                    })
                    .or_insert(*position);
            }
        }
        queue
    }

    // Phase A for one pattern : ride the earliest boardable trip from
    // `start_position` onwards, improving labels at alighting positions,
    // and hopping to an earlier trip whenever one becomes boardable.
    fn scan_pattern(
        &mut self,
        data: &TransitData,
        round: usize,
        pattern: &Pattern,
        start_position: usize,
    ) {
        let timetable = data.timetable(pattern);
        let slack_index = data.slack_index(pattern);
        let board_slack = data.slacks().board(slack_index);
        let alight_slack = data.slacks().alight(slack_index);
        let nb_of_positions = data.nb_of_positions(pattern);

        // the boarded trip, with the position we boarded it at
        let mut boarded: Option<(usize, usize)> = None;

        for position in start_position..nb_of_positions {
            let stop = data.stop_at(pattern, position);
            let stop_idx = stop.idx();

            if let Some((trip_idx, board_position)) = boarded {
                if data.can_alight_at(pattern, position) {
                    let arrival = timetable.arrival(trip_idx, position) + alight_slack;
                    if arrival < self.best_arrival[stop_idx]
                        && arrival < self.round_arrivals[round][stop_idx]
                        && arrival < self.best_egress_arrival
                    {
                        self.round_arrivals[round][stop_idx] = arrival;
                        self.best_arrival[stop_idx] = arrival;
                        self.labels[round][stop_idx] = Some(Label::Board {
                            pattern: *pattern,
                            trip_idx,
                            board_position,
                            alight_position: position,
                        });
                        if !self.improved_flags[stop_idx] {
                            self.improved_flags[stop_idx] = true;
                            self.improved_stops.push(stop);
                        }
                        self.mark(stop);
                    }
                }
            }

            if data.can_board_at(pattern, position) {
                let previous_round_arrival = self.round_arrivals[round - 1][stop_idx];
                if previous_round_arrival != SecondsSinceDayStart::max() {
                    let earliest_board_time = previous_round_arrival + board_slack;
                    let trip_idx_limit = boarded.map(|(trip_idx, _)| trip_idx);
                    if let Some(board) =
                        timetable.earliest_trip_to_board(earliest_board_time, position, trip_idx_limit)
                    {
                        let hop_on = match boarded {
                            None => true,
                            Some((current_trip_idx, _)) => board.trip_idx < current_trip_idx,
                        };
                        if hop_on {
                            boarded = Some((board.trip_idx, position));
                        }
                    }
                }
            }
        }
    }

    // Phase B : propagate foot transfers from the stops phase A improved,
    // using the arrival values they held when phase A ended — a transfer
    // landing on another improved stop must not feed that stop's own
    // transfers. Transfers do not count as rides and never chain.
    fn perform_transfers(&mut self, data: &TransitData, round: usize) {
        let stops = std::mem::take(&mut self.improved_stops);
        let mut improved_stops: Vec<(Stop, SecondsSinceDayStart)> = stops
            .iter()
            .map(|stop| (*stop, self.round_arrivals[round][stop.idx()]))
            .collect();
        improved_stops.sort_by_key(|(stop, _)| *stop);
        let transfer_slack = data.slacks().transfer();

        for (stop, arrival_by_board) in &improved_stops {
            self.improved_flags[stop.idx()] = false;
            for transfer in data.transfers_from(stop) {
                let arrival = *arrival_by_board + transfer.duration + transfer_slack;
                let to_idx = transfer.to_stop.idx();
                if arrival < self.best_arrival[to_idx]
                    && arrival < self.round_arrivals[round][to_idx]
                    && arrival < self.best_egress_arrival
                {
                    self.round_arrivals[round][to_idx] = arrival;
                    self.best_arrival[to_idx] = arrival;
                    self.labels[round][to_idx] = Some(Label::Transfer {
                        from_stop: *stop,
                        duration: transfer.duration,
                        distance_meters: transfer.distance_meters,
                    });
                    self.mark(transfer.to_stop);
                }
            }
        }

        self.improved_stops = stops;
        self.improved_stops.clear();
    }

    fn update_egress_bound(&mut self, round: usize, egresses: &[AccessEgress]) {
        for egress in egresses {
            let arrival = self.round_arrivals[round][egress.stop.idx()];
            if arrival != SecondsSinceDayStart::max() {
                let at_destination = arrival + egress.duration;
                if at_destination < self.best_egress_arrival {
                    self.best_egress_arrival = at_destination;
                }
            }
        }
    }

    fn mark(&mut self, stop: Stop) {
        if !self.marked_flags[stop.idx()] {
            self.marked_flags[stop.idx()] = true;
            self.marked_stops.push(stop);
        }
    }

    /// All journeys the final labels describe, one per (egress, round) pair
    /// whose label is a boarding. Unsorted, not deduplicated : the caller
    /// applies its window, ordering and cap.
    pub fn journeys(&self, data: &TransitData, request: &Request) -> Vec<Journey> {
        let mut journeys = Vec::new();
        for egress in &request.egresses {
            for round in 1..self.round_arrivals.len() {
                if let Some(journey) = self.extract_journey(data, request, round, egress) {
                    journeys.push(journey);
                }
            }
        }
        journeys
    }

    // Walks the back-pointer chain from (round, egress stop) down to an
    // access label of round 0. The chain consumes exactly `round` boardings.
    fn extract_journey(
        &self,
        data: &TransitData,
        request: &Request,
        round: usize,
        egress: &AccessEgress,
    ) -> Option<Journey> {
        let egress_stop_idx = egress.stop.idx();
        if self.round_arrivals[round][egress_stop_idx] == SecondsSinceDayStart::max() {
            return None;
        }
        // an egress walk attaches to an alighting, not to another walk
        if !matches!(self.labels[round][egress_stop_idx], Some(Label::Board { .. })) {
            return None;
        }

        // rides in reverse order, each with the transfer that precedes it
        let mut rides_rev: Vec<(Option<TransferLeg>, VehicleLeg)> = Vec::new();
        let mut current_round = round;
        let mut stop = egress.stop;
        let access_leg;

        loop {
            let ride = match &self.labels[current_round][stop.idx()] {
                Some(Label::Board {
                    pattern,
                    trip_idx,
                    board_position,
                    alight_position,
                }) => VehicleLeg {
                    pattern: *pattern,
                    trip_idx: *trip_idx,
                    board_position: *board_position,
                    alight_position: *alight_position,
                },
                _ => {
                    debug_assert!(false, "broken back-pointer chain");
                    return None;
                }
            };
            stop = data.stop_at(&ride.pattern, ride.board_position);
            current_round -= 1;

            match &self.labels[current_round][stop.idx()] {
                Some(Label::Access {
                    duration,
                    distance_meters,
                }) => {
                    debug_assert!(current_round == 0);
                    rides_rev.push((None, ride));
                    access_leg = WalkLeg {
                        duration: *duration,
                        distance_meters: *distance_meters,
                    };
                    break;
                }
                Some(Label::Transfer {
                    from_stop,
                    duration,
                    distance_meters,
                }) => {
                    let transfer_leg = TransferLeg {
                        from_stop: *from_stop,
                        to_stop: stop,
                        duration: *duration,
                        distance_meters: *distance_meters,
                    };
                    stop = *from_stop;
                    rides_rev.push((Some(transfer_leg), ride));
                }
                Some(Label::Board { .. }) => {
                    rides_rev.push((None, ride));
                }
                None => {
                    debug_assert!(false, "broken back-pointer chain");
                    return None;
                }
            }
        }

        debug_assert!(rides_rev.len() == round);
        rides_rev.reverse();
        let mut rides = rides_rev.into_iter();
        let (_, first_vehicle) = rides.next()?;

        let egress_leg = WalkLeg {
            duration: egress.duration,
            distance_meters: egress.distance_meters,
        };

        match Journey::new(
            request.departure_time,
            access_leg,
            first_vehicle,
            rides,
            egress_leg,
            data,
        ) {
            Ok(journey) => Some(journey),
            Err(err) => {
                trace!("Dropping a journey that failed validation : {:?}", err);
                debug_assert!(false, "the engine built an invalid journey");
                None
            }
        }
    }
}
