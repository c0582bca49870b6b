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

pub mod init;

use std::fmt::{Display, Formatter};

use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::timetables::Timetable;

/// A location where a vehicle can be boarded into or debarked from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Stop {
    pub(crate) idx: usize,
}

/// A maximal group of trips visiting exactly the same ordered sequence of
/// stops on the same route. One pattern carries one timetable.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Pattern {
    pub(crate) idx: usize,
}

impl Stop {
    pub fn idx(&self) -> usize {
        self.idx
    }
}

impl Pattern {
    pub fn idx(&self) -> usize {
        self.idx
    }
}

/// A directed walk edge between two distinct stops.
/// Symmetric by construction : if (a, b, d) is stored then so is (b, a, d).
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub to_stop: Stop,
    pub duration: PositiveDuration,
    pub distance_meters: f64,
}

/// Row of the slack table a pattern selects, by mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlackIndex {
    Subway,
    Bus,
    Rail,
    Other,
}

impl SlackIndex {
    /// Maps a GTFS route_type (standard or extended) to its slack row.
    pub fn from_route_type(route_type: u16) -> Self {
        match route_type {
            0 | 1 | 2 | 5 | 6 => SlackIndex::Subway,
            3 => SlackIndex::Bus,
            4 | 7 => SlackIndex::Rail,
            100..=299 => SlackIndex::Rail,
            400..=499 | 900..=999 => SlackIndex::Subway,
            700..=799 => SlackIndex::Bus,
            1100..=1199 => SlackIndex::Other,
            _ => SlackIndex::Bus,
        }
    }

    fn row(&self) -> usize {
        match self {
            SlackIndex::Subway => 0,
            SlackIndex::Bus => 1,
            SlackIndex::Rail => 2,
            SlackIndex::Other => 3,
        }
    }
}

/// Per-mode padding applied around boardings, alightings and foot transfers,
/// modeling dwell and in-station walking overhead.
#[derive(Debug, Clone)]
pub struct SlackTable {
    board: [PositiveDuration; 4],
    alight: [PositiveDuration; 4],
    transfer: PositiveDuration,
}

impl Default for SlackTable {
    fn default() -> Self {
        Self {
            board: [
                PositiveDuration::from_seconds(60),  // subway
                PositiveDuration::from_seconds(30),  // bus
                PositiveDuration::from_seconds(120), // rail
                PositiveDuration::from_seconds(180), // other
            ],
            alight: [
                PositiveDuration::from_seconds(30),
                PositiveDuration::from_seconds(10),
                PositiveDuration::from_seconds(60),
                PositiveDuration::from_seconds(120),
            ],
            transfer: PositiveDuration::from_seconds(60),
        }
    }
}

impl SlackTable {
    pub fn board(&self, slack_index: SlackIndex) -> PositiveDuration {
        self.board[slack_index.row()]
    }

    pub fn alight(&self, slack_index: SlackIndex) -> PositiveDuration {
        self.alight[slack_index.row()]
    }

    pub fn transfer(&self) -> PositiveDuration {
        self.transfer
    }
}

/// One pattern together with its timetable and display metadata.
pub struct Route {
    pub(crate) stop_sequence: Vec<Stop>,
    /// per-position overrides ; `None` means the defaults apply
    /// (board allowed at all but the last position, alight at all but the first)
    pub(crate) can_board: Option<Vec<bool>>,
    pub(crate) can_alight: Option<Vec<bool>>,
    pub(crate) slack_index: SlackIndex,
    pub(crate) debug_info: String,
    pub(crate) timetable: Timetable,
    pub(crate) id: String,
    pub(crate) short_name: String,
    pub(crate) long_name: String,
    pub(crate) route_type: u16,
}

impl Route {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn route_type(&self) -> u16 {
        self.route_type
    }

    pub fn debug_info(&self) -> &str {
        &self.debug_info
    }

    /// Display name : the short name when present, the long name otherwise.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }
}

/// The compact, array-oriented transit model : stops, patterns with their
/// timetables, per-stop pattern index and per-stop transfer lists.
///
/// Built once at startup from the loader-supplied [`crate::model::BaseModel`],
/// then shared read-only across concurrent queries.
pub struct TransitData {
    pub(crate) stop_names: Vec<String>,
    pub(crate) stop_lats: Vec<f64>,
    pub(crate) stop_lons: Vec<f64>,

    /// for each stop, the patterns containing it, along with the earliest
    /// in-pattern position where the stop occurs ; deduplicated, sorted by
    /// pattern index
    pub(crate) patterns_at_stop: Vec<Vec<(Pattern, usize)>>,

    pub(crate) transfers_from: Vec<Vec<Transfer>>,
    pub(crate) transfers_to: Vec<Vec<Transfer>>,

    pub(crate) routes: Vec<Route>,

    pub(crate) slacks: SlackTable,

    pub(crate) service_start_time: SecondsSinceDayStart,
    pub(crate) service_end_time: SecondsSinceDayStart,
}

impl TransitData {
    pub fn nb_of_stops(&self) -> usize {
        self.stop_names.len()
    }

    pub fn nb_of_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.routes
            .iter()
            .map(|route| route.timetable.nb_of_trips())
            .sum()
    }

    pub fn stop(&self, idx: usize) -> Option<Stop> {
        if idx < self.nb_of_stops() {
            Some(Stop { idx })
        } else {
            None
        }
    }

    pub fn stops(&self) -> impl Iterator<Item = Stop> {
        (0..self.nb_of_stops()).map(|idx| Stop { idx })
    }

    pub fn stop_name(&self, stop: &Stop) -> &str {
        &self.stop_names[stop.idx]
    }

    pub fn stop_lat(&self, stop: &Stop) -> f64 {
        self.stop_lats[stop.idx]
    }

    pub fn stop_lon(&self, stop: &Stop) -> f64 {
        self.stop_lons[stop.idx]
    }

    pub fn patterns_at_stop(&self, stop: &Stop) -> &[(Pattern, usize)] {
        &self.patterns_at_stop[stop.idx]
    }

    pub fn transfers_from(&self, stop: &Stop) -> &[Transfer] {
        &self.transfers_from[stop.idx]
    }

    pub fn transfers_to(&self, stop: &Stop) -> &[Transfer] {
        &self.transfers_to[stop.idx]
    }

    pub fn route(&self, pattern: &Pattern) -> &Route {
        &self.routes[pattern.idx]
    }

    pub fn patterns(&self) -> impl Iterator<Item = Pattern> {
        (0..self.nb_of_routes()).map(|idx| Pattern { idx })
    }

    pub fn nb_of_positions(&self, pattern: &Pattern) -> usize {
        self.routes[pattern.idx].stop_sequence.len()
    }

    pub fn stop_at(&self, pattern: &Pattern, position: usize) -> Stop {
        self.routes[pattern.idx].stop_sequence[position]
    }

    pub fn can_board_at(&self, pattern: &Pattern, position: usize) -> bool {
        let route = &self.routes[pattern.idx];
        if position + 1 >= route.stop_sequence.len() {
            return false;
        }
        route
            .can_board
            .as_ref()
            .map_or(true, |can_board| can_board[position])
    }

    pub fn can_alight_at(&self, pattern: &Pattern, position: usize) -> bool {
        let route = &self.routes[pattern.idx];
        if position == 0 {
            return false;
        }
        route
            .can_alight
            .as_ref()
            .map_or(true, |can_alight| can_alight[position])
    }

    pub fn slack_index(&self, pattern: &Pattern) -> SlackIndex {
        self.routes[pattern.idx].slack_index
    }

    pub fn timetable(&self, pattern: &Pattern) -> &Timetable {
        &self.routes[pattern.idx].timetable
    }

    pub fn slacks(&self) -> &SlackTable {
        &self.slacks
    }

    pub fn service_start_time(&self) -> SecondsSinceDayStart {
        self.service_start_time
    }

    pub fn service_end_time(&self) -> SecondsSinceDayStart {
        self.service_end_time
    }
}

impl Display for TransitData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TransitData[stops={}, routes={}, trips={}, service={}~{}]",
            self.nb_of_stops(),
            self.nb_of_routes(),
            self.nb_of_trips(),
            self.service_start_time,
            self.service_end_time,
        )
    }
}
