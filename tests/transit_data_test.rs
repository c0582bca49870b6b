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

mod utils;

use anyhow::Error;
use gil::{Config, TransitData};
use utils::ModelBuilder;

fn init() -> gil::tracing::dispatcher::DefaultGuard {
    gil::logger::init_test_logger()
}

#[test]
fn transfers_are_symmetric_and_bounded() -> Result<(), Error> {
    let _guard = init();
    // B is ~220 m north of A, C is far away
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5020, 127.0000)
        .stop("C", 37.6000, 127.0000)
        .route("1", 3)
        .trip(
            "1",
            "t1",
            &[
                ("A", "09:00:00", "09:00:00"),
                ("B", "09:10:00", "09:10:00"),
                ("C", "09:20:00", "09:20:00"),
            ],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    let stop_a = data.stop(0).unwrap();
    let stop_b = data.stop(1).unwrap();
    let stop_c = data.stop(2).unwrap();

    let from_a = data.transfers_from(&stop_a);
    assert_eq!(from_a.len(), 1);
    assert_eq!(from_a[0].to_stop, stop_b);
    assert!(from_a[0].distance_meters <= 500.0);
    // duration is ceil(distance / 1.2 m/s)
    assert_eq!(
        from_a[0].duration.total_seconds(),
        (from_a[0].distance_meters / 1.2).ceil() as u64
    );

    // symmetric : (a, b, d) implies (b, a, d)
    let from_b = data.transfers_from(&stop_b);
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_b[0].to_stop, stop_a);
    assert_eq!(from_b[0].distance_meters, from_a[0].distance_meters);

    // reverse lists mirror the forward ones
    assert_eq!(data.transfers_to(&stop_b)[0].to_stop, stop_a);
    assert_eq!(data.transfers_to(&stop_a)[0].to_stop, stop_b);

    // C is beyond the 500 m radius
    assert!(data.transfers_from(&stop_c).is_empty());

    Ok(())
}

#[test]
fn overtaking_trip_opens_a_sibling_pattern() -> Result<(), Error> {
    let _guard = init();
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5150, 127.0000)
        .route("1", 3)
        .trip(
            "1",
            "slow",
            &[("A", "09:00:00", "09:00:00"), ("B", "09:30:00", "09:30:00")],
        )
        // departs later but arrives earlier : fifo violated, cannot share
        // the timetable of "slow"
        .trip(
            "1",
            "express",
            &[("A", "09:10:00", "09:10:00"), ("B", "09:20:00", "09:20:00")],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    assert_eq!(data.nb_of_routes(), 2);
    assert_eq!(data.nb_of_trips(), 2);
    for pattern in data.patterns() {
        assert_eq!(data.timetable(&pattern).nb_of_trips(), 1);
    }

    // the stop-to-pattern index lists both siblings
    let stop_a = data.stop(0).unwrap();
    assert_eq!(data.patterns_at_stop(&stop_a).len(), 2);

    Ok(())
}

#[test]
fn fifo_trips_share_one_timetable() -> Result<(), Error> {
    let _guard = init();
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5150, 127.0000)
        .route("1", 3)
        .trip(
            "1",
            "t2",
            &[("A", "09:10:00", "09:10:00"), ("B", "09:40:00", "09:40:00")],
        )
        .trip(
            "1",
            "t1",
            &[("A", "09:00:00", "09:00:00"), ("B", "09:30:00", "09:30:00")],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    assert_eq!(data.nb_of_routes(), 1);
    let pattern = data.patterns().next().unwrap();
    let timetable = data.timetable(&pattern);
    assert_eq!(timetable.nb_of_trips(), 2);
    // sorted by first departure, whatever the feed order
    assert_eq!(timetable.trip(0).display_id(), "t1");
    assert_eq!(timetable.trip(1).display_id(), "t2");

    Ok(())
}

#[test]
fn malformed_records_are_dropped_not_fatal() -> Result<(), Error> {
    let _guard = init();
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5150, 127.0000)
        .route("1", 3)
        // references a stop the feed never declared
        .trip(
            "1",
            "ghost-stop",
            &[("A", "09:00:00", "09:00:00"), ("X", "09:30:00", "09:30:00")],
        )
        // goes back in time
        .trip(
            "1",
            "time-travel",
            &[("A", "09:00:00", "09:00:00"), ("B", "08:30:00", "08:30:00")],
        )
        // a single stop_time
        .trip("1", "too-short", &[("A", "09:00:00", "09:00:00")])
        // the only well-formed one
        .trip(
            "1",
            "good",
            &[("A", "09:00:00", "09:00:00"), ("B", "09:30:00", "09:30:00")],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    assert_eq!(data.nb_of_routes(), 1);
    assert_eq!(data.nb_of_trips(), 1);
    let pattern = data.patterns().next().unwrap();
    assert_eq!(data.timetable(&pattern).trip(0).display_id(), "good");

    Ok(())
}

#[test]
fn loop_pattern_keeps_the_earliest_position() -> Result<(), Error> {
    let _guard = init();
    // A → B → A : a loop visiting A twice
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5150, 127.0000)
        .route("1", 3)
        .trip(
            "1",
            "loop",
            &[
                ("A", "09:00:00", "09:00:00"),
                ("B", "09:10:00", "09:10:00"),
                ("A", "09:20:00", "09:20:00"),
            ],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    let stop_a = data.stop(0).unwrap();
    let patterns = data.patterns_at_stop(&stop_a);
    assert_eq!(patterns.len(), 1);
    let (_, position) = patterns[0];
    assert_eq!(position, 0);

    Ok(())
}

#[test]
fn service_period_spans_the_timetables() -> Result<(), Error> {
    let _guard = init();
    let model = ModelBuilder::new()
        .stop("A", 37.5000, 127.0000)
        .stop("B", 37.5150, 127.0000)
        .route("1", 3)
        .trip(
            "1",
            "early",
            &[("A", "05:30:00", "05:30:00"), ("B", "05:50:00", "05:50:00")],
        )
        // an overnight run, as korean feeds have
        .trip(
            "1",
            "late",
            &[("A", "25:00:00", "25:00:00"), ("B", "25:40:00", "25:40:00")],
        )
        .build();
    let data = TransitData::new(&model, &Config::default());

    assert_eq!(format!("{}", data.service_start_time()), "05:30:00");
    assert_eq!(format!("{}", data.service_end_time()), "25:40:00");

    Ok(())
}
