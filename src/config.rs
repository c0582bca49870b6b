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

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// maximum walk from the origin coordinate to a boarding stop
    #[serde(default = "default_max_access_walk_meters")]
    pub max_access_walk_meters: f64,

    /// maximum walk from an alighting stop to the destination coordinate
    #[serde(default = "default_max_egress_walk_meters")]
    pub max_egress_walk_meters: f64,

    /// radius used when generating stop-to-stop foot transfers
    #[serde(default = "default_max_transfer_distance_meters")]
    pub max_transfer_distance_meters: f64,

    /// uniform pedestrian speed used for distance to time conversion
    #[serde(default = "default_walk_speed_mps")]
    pub walk_speed_mps: f64,

    /// journeys whose first boarding departs after this window are dropped
    #[serde(default = "default_search_window_seconds")]
    pub search_window_seconds: u32,

    /// number of ranked access candidates handed to the engine
    #[serde(default = "default_max_access_stops")]
    pub max_access_stops: usize,

    /// number of ranked egress candidates handed to the engine
    #[serde(default = "default_max_egress_stops")]
    pub max_egress_stops: usize,

    /// upper bound on rides is 1 + this
    #[serde(default = "default_number_of_additional_transfers")]
    pub number_of_additional_transfers: usize,

    /// pedestrian A* gives up after popping this many nodes
    #[serde(default = "default_a_star_max_iterations")]
    pub a_star_max_iterations: usize,

    /// pedestrian A* gives up beyond this walked distance
    #[serde(default = "default_a_star_max_distance_meters")]
    pub a_star_max_distance_meters: f64,
}

pub fn default_max_access_walk_meters() -> f64 {
    400.0
}

pub fn default_max_egress_walk_meters() -> f64 {
    400.0
}

pub fn default_max_transfer_distance_meters() -> f64 {
    500.0
}

pub fn default_walk_speed_mps() -> f64 {
    1.2
}

pub fn default_search_window_seconds() -> u32 {
    900
}

pub fn default_max_access_stops() -> usize {
    5
}

pub fn default_max_egress_stops() -> usize {
    5
}

pub fn default_number_of_additional_transfers() -> usize {
    3
}

pub fn default_a_star_max_iterations() -> usize {
    15_000
}

pub fn default_a_star_max_distance_meters() -> f64 {
    500.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_access_walk_meters: default_max_access_walk_meters(),
            max_egress_walk_meters: default_max_egress_walk_meters(),
            max_transfer_distance_meters: default_max_transfer_distance_meters(),
            walk_speed_mps: default_walk_speed_mps(),
            search_window_seconds: default_search_window_seconds(),
            max_access_stops: default_max_access_stops(),
            max_egress_stops: default_max_egress_stops(),
            number_of_additional_transfers: default_number_of_additional_transfers(),
            a_star_max_iterations: default_a_star_max_iterations(),
            a_star_max_distance_meters: default_a_star_max_distance_meters(),
        }
    }
}

impl Config {
    /// Reads every key from its SCREAMING_SNAKE_CASE environment variable,
    /// falling back to the defaults above.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            max_access_walk_meters: env_override(
                "MAX_ACCESS_WALK_METERS",
                defaults.max_access_walk_meters,
            ),
            max_egress_walk_meters: env_override(
                "MAX_EGRESS_WALK_METERS",
                defaults.max_egress_walk_meters,
            ),
            max_transfer_distance_meters: env_override(
                "MAX_TRANSFER_DISTANCE_METERS",
                defaults.max_transfer_distance_meters,
            ),
            walk_speed_mps: env_override("WALK_SPEED_MPS", defaults.walk_speed_mps),
            search_window_seconds: env_override(
                "SEARCH_WINDOW_SECONDS",
                defaults.search_window_seconds,
            ),
            max_access_stops: env_override("MAX_ACCESS_STOPS", defaults.max_access_stops),
            max_egress_stops: env_override("MAX_EGRESS_STOPS", defaults.max_egress_stops),
            number_of_additional_transfers: env_override(
                "NUMBER_OF_ADDITIONAL_TRANSFERS",
                defaults.number_of_additional_transfers,
            ),
            a_star_max_iterations: env_override(
                "A_STAR_MAX_ITERATIONS",
                defaults.a_star_max_iterations,
            ),
            a_star_max_distance_meters: env_override(
                "A_STAR_MAX_DISTANCE_METERS",
                defaults.a_star_max_distance_meters,
            ),
        }
    }
}

// Reads one routing key from the environment. A missing variable silently
// keeps the default ; a broken one is logged, so a typo in a deployment
// does not quietly change a radius or a cap.
fn env_override<T>(key: &str, default_value: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    let raw = match std::env::var(key) {
        Ok(raw) => raw,
        Err(std::env::VarError::NotPresent) => return default_value,
        Err(std::env::VarError::NotUnicode(_)) => {
            warn!("Ignoring {} : the value is not valid unicode", key);
            return default_value;
        }
    };
    match raw.parse() {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "Ignoring {}={} ({}), keeping the default {:?}",
                key, raw, err, default_value
            );
            default_value
        }
    }
}
