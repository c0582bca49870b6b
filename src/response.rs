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

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Pattern, Stop, TransitData};

/// One ride on a vehicle : board at `board_position`, alight at
/// `alight_position` of `pattern`, on the trip `trip_idx` of its timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleLeg {
    pub pattern: Pattern,
    pub trip_idx: usize,
    pub board_position: usize,
    pub alight_position: usize,
}

/// A walk at either end of the journey.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkLeg {
    pub duration: PositiveDuration,
    pub distance_meters: f64,
}

/// A foot transfer between two rides. `from_stop == to_stop` models a
/// same-platform connection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferLeg {
    pub from_stop: Stop,
    pub to_stop: Stop,
    pub duration: PositiveDuration,
    pub distance_meters: f64,
}

/// One reconstructed itinerary : an access walk, at least one ride,
/// optional (transfer, ride) connections, and an egress walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    /// requested departure time of the query
    pub departure_time: SecondsSinceDayStart,
    pub access: WalkLeg,
    pub first_vehicle: VehicleLeg,
    pub connections: Vec<(Option<TransferLeg>, VehicleLeg)>,
    pub egress: WalkLeg,
}

#[derive(Debug, Clone)]
pub enum BadJourney {
    AlightIsUpstreamBoard(VehicleLeg),
    NoBoardAllowed(VehicleLeg),
    NoAlightAllowed(VehicleLeg),
    BadTransferStartStop(TransferLeg),
    BadTransferEndStop(TransferLeg),
    BadTransferEndTime(TransferLeg),
    BoardBeforeAlight(VehicleLeg),
}

impl Journey {
    pub fn new(
        departure_time: SecondsSinceDayStart,
        access: WalkLeg,
        first_vehicle: VehicleLeg,
        connections: impl IntoIterator<Item = (Option<TransferLeg>, VehicleLeg)>,
        egress: WalkLeg,
        data: &TransitData,
    ) -> Result<Self, BadJourney> {
        let result = Self {
            departure_time,
            access,
            first_vehicle,
            connections: connections.into_iter().collect(),
            egress,
        };
        result.is_valid(data)?;
        Ok(result)
    }

    fn is_valid(&self, data: &TransitData) -> Result<(), BadJourney> {
        let mut prev_alight_stop = self.check_vehicle_leg(&self.first_vehicle, data)?;
        let mut prev_alight_time = self.alight_time_of(&self.first_vehicle, data);

        for (has_transfer, vehicle_leg) in &self.connections {
            let board_stop = data.stop_at(&vehicle_leg.pattern, vehicle_leg.board_position);
            let mut ready_time = prev_alight_time;
            if let Some(transfer) = has_transfer {
                if transfer.from_stop != prev_alight_stop {
                    return Err(BadJourney::BadTransferStartStop(transfer.clone()));
                }
                if transfer.to_stop != board_stop {
                    return Err(BadJourney::BadTransferEndStop(transfer.clone()));
                }
                ready_time = ready_time + transfer.duration;
            }

            let alight_stop = self.check_vehicle_leg(vehicle_leg, data)?;
            let board_time = self.board_time_of(vehicle_leg, data);
            if ready_time > board_time {
                return match has_transfer {
                    Some(transfer) => Err(BadJourney::BadTransferEndTime(transfer.clone())),
                    None => Err(BadJourney::BoardBeforeAlight(vehicle_leg.clone())),
                };
            }

            prev_alight_stop = alight_stop;
            prev_alight_time = self.alight_time_of(vehicle_leg, data);
        }

        Ok(())
    }

    // Returns the alighting stop.
    fn check_vehicle_leg(
        &self,
        vehicle_leg: &VehicleLeg,
        data: &TransitData,
    ) -> Result<Stop, BadJourney> {
        if vehicle_leg.alight_position <= vehicle_leg.board_position {
            return Err(BadJourney::AlightIsUpstreamBoard(vehicle_leg.clone()));
        }
        if !data.can_board_at(&vehicle_leg.pattern, vehicle_leg.board_position) {
            return Err(BadJourney::NoBoardAllowed(vehicle_leg.clone()));
        }
        if !data.can_alight_at(&vehicle_leg.pattern, vehicle_leg.alight_position) {
            return Err(BadJourney::NoAlightAllowed(vehicle_leg.clone()));
        }
        Ok(data.stop_at(&vehicle_leg.pattern, vehicle_leg.alight_position))
    }

    fn board_time_of(&self, vehicle_leg: &VehicleLeg, data: &TransitData) -> SecondsSinceDayStart {
        data.timetable(&vehicle_leg.pattern)
            .departure(vehicle_leg.trip_idx, vehicle_leg.board_position)
    }

    // Arrival at the alighting stop, alighting slack included : this is the
    // time from which the traveler can walk away, and what the engine labels
    // hold.
    fn alight_time_of(&self, vehicle_leg: &VehicleLeg, data: &TransitData) -> SecondsSinceDayStart {
        let slack_index = data.slack_index(&vehicle_leg.pattern);
        data.timetable(&vehicle_leg.pattern)
            .arrival(vehicle_leg.trip_idx, vehicle_leg.alight_position)
            + data.slacks().alight(slack_index)
    }

    fn last_vehicle(&self) -> &VehicleLeg {
        self.connections
            .last()
            .map(|(_, vehicle_leg)| vehicle_leg)
            .unwrap_or(&self.first_vehicle)
    }

    pub fn first_vehicle_board_time(&self, data: &TransitData) -> SecondsSinceDayStart {
        self.board_time_of(&self.first_vehicle, data)
    }

    pub fn arrival_time(&self, data: &TransitData) -> SecondsSinceDayStart {
        self.alight_time_of(self.last_vehicle(), data) + self.egress.duration
    }

    pub fn total_duration(&self, data: &TransitData) -> PositiveDuration {
        self.arrival_time(data)
            .duration_since(&self.departure_time)
            .unwrap_or_else(PositiveDuration::zero)
    }

    pub fn nb_of_transfers(&self) -> usize {
        self.connections.len()
    }

    pub fn nb_of_rides(&self) -> usize {
        1 + self.connections.len()
    }

    pub fn departure_datetime(&self, service_day: NaiveDate) -> NaiveDateTime {
        self.departure_time.to_datetime(service_day)
    }

    pub fn arrival_datetime(&self, data: &TransitData, service_day: NaiveDate) -> NaiveDateTime {
        self.arrival_time(data).to_datetime(service_day)
    }

    /// Flattens the journey into the wire shape, for an external serializer.
    pub fn to_itinerary(&self, data: &TransitData) -> Itinerary {
        let mut legs = Vec::with_capacity(2 * self.connections.len() + 3);
        if self.access.distance_meters > 0.0 || self.access.duration > PositiveDuration::zero() {
            legs.push(Leg::walk(&self.access));
        }
        legs.push(self.transit_leg(&self.first_vehicle, data));
        for (has_transfer, vehicle_leg) in &self.connections {
            if let Some(transfer) = has_transfer {
                legs.push(Leg::Walk {
                    meters: transfer.distance_meters,
                    seconds: transfer.duration.total_seconds(),
                });
            }
            legs.push(self.transit_leg(vehicle_leg, data));
        }
        if self.egress.distance_meters > 0.0 || self.egress.duration > PositiveDuration::zero() {
            legs.push(Leg::walk(&self.egress));
        }

        Itinerary {
            legs,
            departure_sec: self.departure_time.total_seconds(),
            arrival_sec: self.arrival_time(data).total_seconds(),
            duration_sec: self.total_duration(data).total_seconds(),
            transfer_count: self.nb_of_transfers(),
        }
    }

    fn transit_leg(&self, vehicle_leg: &VehicleLeg, data: &TransitData) -> Leg {
        let route = data.route(&vehicle_leg.pattern);
        let board_stop = data.stop_at(&vehicle_leg.pattern, vehicle_leg.board_position);
        let alight_stop = data.stop_at(&vehicle_leg.pattern, vehicle_leg.alight_position);
        Leg::Transit {
            route_short: route.display_name().to_string(),
            route_type: route.route_type(),
            board_stop: board_stop.idx(),
            alight_stop: alight_stop.idx(),
            board_sec: self.board_time_of(vehicle_leg, data).total_seconds(),
            alight_sec: self.alight_time_of(vehicle_leg, data).total_seconds(),
        }
    }
}

/// Wire shape of one leg.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Leg {
    Walk {
        meters: f64,
        seconds: u64,
    },
    Transit {
        route_short: String,
        route_type: u16,
        board_stop: usize,
        alight_stop: usize,
        board_sec: u32,
        alight_sec: u32,
    },
}

impl Leg {
    fn walk(walk_leg: &WalkLeg) -> Self {
        Leg::Walk {
            meters: walk_leg.distance_meters,
            seconds: walk_leg.duration.total_seconds(),
        }
    }
}

/// Wire shape of one itinerary : ordered legs plus totals.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    pub departure_sec: u32,
    pub arrival_sec: u32,
    pub duration_sec: u64,
    pub transfer_count: usize,
}
