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

use gil::model::{
    parse_gtfs_time, BaseModel, FlowControl, RouteRecord, StopRecord, StopTimeRecord, TripRecord,
};

/// Builds a small [`BaseModel`] the way the external gtfs loader would.
pub struct ModelBuilder {
    model: BaseModel,
}

#[allow(dead_code)]
impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            model: BaseModel {
                stops: Vec::new(),
                routes: Vec::new(),
                trips: Vec::new(),
                stop_times: Vec::new(),
            },
        }
    }

    pub fn stop(mut self, id: &str, lat: f64, lon: f64) -> Self {
        self.model.stops.push(StopRecord {
            id: id.to_string(),
            name: id.to_string(),
            lat,
            lon,
        });
        self
    }

    pub fn route(mut self, id: &str, route_type: u16) -> Self {
        self.model.routes.push(RouteRecord {
            id: id.to_string(),
            short_name: id.to_string(),
            long_name: format!("route {}", id),
            route_type,
        });
        self
    }

    /// A trip stopping at `(stop_id, arrival, departure)`, regular pickup
    /// and drop-off everywhere.
    pub fn trip(self, route_id: &str, trip_id: &str, stop_times: &[(&str, &str, &str)]) -> Self {
        let with_flows: Vec<(&str, &str, &str, u8, u8)> = stop_times
            .iter()
            .map(|(stop_id, arrival, departure)| (*stop_id, *arrival, *departure, 0, 0))
            .collect();
        self.trip_with_flows(route_id, trip_id, &with_flows)
    }

    /// A trip with explicit gtfs pickup_type / drop_off_type codes.
    pub fn trip_with_flows(
        mut self,
        route_id: &str,
        trip_id: &str,
        stop_times: &[(&str, &str, &str, u8, u8)],
    ) -> Self {
        self.model.trips.push(TripRecord {
            id: trip_id.to_string(),
            route_id: route_id.to_string(),
            service_id: "always".to_string(),
        });
        for (sequence, (stop_id, arrival, departure, pickup, drop_off)) in
            stop_times.iter().enumerate()
        {
            self.model.stop_times.push(StopTimeRecord {
                trip_id: trip_id.to_string(),
                stop_id: stop_id.to_string(),
                sequence: sequence as u32,
                arrival: parse_gtfs_time(arrival),
                departure: parse_gtfs_time(departure),
                pickup: FlowControl::from_gtfs(*pickup),
                drop_off: FlowControl::from_gtfs(*drop_off),
            });
        }
        self
    }

    pub fn build(self) -> BaseModel {
        self.model
    }
}

/// Seconds since midnight of a `HH:MM:SS` literal.
#[allow(dead_code)]
pub fn seconds(text: &str) -> i64 {
    i64::from(
        parse_gtfs_time(text)
            .unwrap_or_else(|| panic!("bad test time {}", text))
            .total_seconds(),
    )
}
