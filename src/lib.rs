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

//! Nationwide public transit trip planner for Korea.
//!
//! Given an origin coordinate, a destination coordinate and an earliest
//! departure time, the engine answers with ranked itineraries made of walk
//! legs, boardings, in-vehicle segments and transfers.
//!
//! The transit model is built from loader-supplied GTFS records
//! ([`model::BaseModel`]), the pedestrian graph from loader-supplied
//! OpenStreetMap records ([`street::StreetGraphBuilder`]). Both are
//! immutable once built and shared across concurrent queries.

pub mod access_egress;
pub mod config;
mod engine;
pub mod geo;
pub mod logger;
pub mod model;
pub mod response;
pub mod solver;
pub mod street;
pub mod time;
pub mod timetables;
pub mod transit_data;

pub use chrono;
pub use tracing;

pub use access_egress::{AccessEgress, AccessEgressResolver};
pub use config::Config;
pub use engine::raptor::{Raptor, Request as RaptorRequest, SearchStatus};
pub use response::{Itinerary, Journey, Leg};
pub use solver::{BadRequest, Diagnostic, RouteResponse, Solver};
pub use street::{StreetGraph, StreetGraphBuilder};
pub use time::{PositiveDuration, SecondsSinceDayStart};
pub use timetables::BoardResult;
pub use transit_data::{Pattern, SlackIndex, Stop, TransitData, Transfer};
