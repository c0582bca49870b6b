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

//! Exchange types produced by the external GTFS loader.
//!
//! The loader parses the csv feed (stops.txt, routes.txt, trips.txt,
//! stop_times.txt) and hands over a [`BaseModel`]. The transit data builder
//! consumes it ; no csv parsing happens in this crate.

use crate::time::SecondsSinceDayStart;

#[derive(Debug, Clone)]
pub struct BaseModel {
    pub stops: Vec<StopRecord>,
    pub routes: Vec<RouteRecord>,
    pub trips: Vec<TripRecord>,
    /// All stop_times, in feed order. The builder groups them by trip and
    /// sorts by `sequence`.
    pub stop_times: Vec<StopTimeRecord>,
}

#[derive(Debug, Clone)]
pub struct StopRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub route_type: u16,
}

#[derive(Debug, Clone)]
pub struct TripRecord {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
}

#[derive(Debug, Clone)]
pub struct StopTimeRecord {
    pub trip_id: String,
    pub stop_id: String,
    pub sequence: u32,
    /// `None` when the feed leaves the field empty or malformed.
    pub arrival: Option<SecondsSinceDayStart>,
    pub departure: Option<SecondsSinceDayStart>,
    pub pickup: FlowControl,
    pub drop_off: FlowControl,
}

/// GTFS pickup_type / drop_off_type, restricted to the two values the
/// engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    Regular,
    NotAvailable,
}

impl FlowControl {
    /// `0` (or absent) means regularly scheduled, `1` means none.
    /// Other codes (phone-agency, coordinate-with-driver) are treated
    /// as regular.
    pub fn from_gtfs(code: u8) -> Self {
        match code {
            1 => FlowControl::NotAvailable,
            _ => FlowControl::Regular,
        }
    }
}

/// Parses a GTFS `HH:MM:SS` time field into seconds since midnight of
/// the service day. Hours may exceed 23 for overnight runs.
/// Returns `None` on malformed input.
pub fn parse_gtfs_time(text: &str) -> Option<SecondsSinceDayStart> {
    let mut fields = text.trim().split(':');
    let hours: i64 = fields.next()?.parse().ok()?;
    let minutes: i64 = fields.next()?.parse().ok()?;
    let seconds: i64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }
    SecondsSinceDayStart::from_seconds(hours * 3600 + minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_regular_time() {
        assert_eq!(
            parse_gtfs_time("09:05:30"),
            SecondsSinceDayStart::from_seconds(9 * 3600 + 5 * 60 + 30)
        );
    }

    #[test]
    fn parse_overnight_time() {
        // hours beyond 23 are valid in gtfs
        assert_eq!(
            parse_gtfs_time("26:10:00"),
            SecondsSinceDayStart::from_seconds(26 * 3600 + 10 * 60)
        );
    }

    #[test]
    fn parse_malformed_time() {
        assert_eq!(parse_gtfs_time(""), None);
        assert_eq!(parse_gtfs_time("09:05"), None);
        assert_eq!(parse_gtfs_time("09:65:00"), None);
        assert_eq!(parse_gtfs_time("-1:00:00"), None);
        assert_eq!(parse_gtfs_time("ab:cd:ef"), None);
    }
}
