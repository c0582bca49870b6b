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

use std::cmp::Ordering;

use crate::time::SecondsSinceDayStart;

/// The ordered trips of one pattern.
///
/// Trips are ordered by increasing times, meaning that if `trip_1` is before
/// `trip_2` in `trips`, then for every `position` we have
///    `trips[trip_1].departure(position) <= trips[trip_2].departure(position)`
/// and the same for arrivals. This is what makes the binary trip search
/// sound : at every position the departure column is sorted.
///
/// A trip that cannot be inserted without breaking this invariant is
/// rejected by [`Timetable::try_insert`] ; the builder then opens a sibling
/// timetable for it.
#[derive(Debug, Clone)]
pub struct Timetable {
    trips: Vec<TripSchedule>,
}

/// One concrete vehicle run along a pattern.
#[derive(Debug, Clone)]
pub struct TripSchedule {
    /// arrival time at each in-pattern position
    arrivals: Vec<SecondsSinceDayStart>,
    /// departure time at each in-pattern position
    departures: Vec<SecondsSinceDayStart>,
    /// feed trip_id, for display and debug
    display_id: String,
}

/// Result of a forward trip search : the trip to board at `position`,
/// leaving at `departure_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardResult {
    pub trip_idx: usize,
    pub position: usize,
    pub departure_time: SecondsSinceDayStart,
}

#[derive(Debug)]
pub struct PositionPair {
    pub upstream: usize,
    pub downstream: usize,
}

#[derive(Debug)]
pub enum TripTimesError {
    ArrivalAfterDeparture(usize),        // arrival[position] > departure[position]
    DecreasingTimes(PositionPair),       // departure[upstream] > arrival[downstream]
    NotEnoughPositions(usize),           // a trip must visit at least two stops
}

impl std::fmt::Display for TripTimesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripTimesError::ArrivalAfterDeparture(position) => {
                write!(f, "arrival is after departure at position {}", position)
            }
            TripTimesError::DecreasingTimes(pair) => write!(
                f,
                "departure at position {} is after arrival at position {}",
                pair.upstream, pair.downstream
            ),
            TripTimesError::NotEnoughPositions(nb) => {
                write!(f, "a trip must visit at least two stops, got {}", nb)
            }
        }
    }
}

impl TripSchedule {
    pub fn new(
        arrivals: Vec<SecondsSinceDayStart>,
        departures: Vec<SecondsSinceDayStart>,
        display_id: String,
    ) -> Result<Self, TripTimesError> {
        inspect(&arrivals, &departures)?;
        Ok(Self {
            arrivals,
            departures,
            display_id,
        })
    }

    pub fn arrival(&self, position: usize) -> SecondsSinceDayStart {
        self.arrivals[position]
    }

    pub fn departure(&self, position: usize) -> SecondsSinceDayStart {
        self.departures[position]
    }

    pub fn nb_of_positions(&self) -> usize {
        self.departures.len()
    }

    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    fn sort_key(&self) -> SecondsSinceDayStart {
        self.departures[0]
    }
}

impl Timetable {
    pub fn new() -> Self {
        Self { trips: Vec::new() }
    }

    pub fn nb_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn trip(&self, trip_idx: usize) -> &TripSchedule {
        &self.trips[trip_idx]
    }

    pub fn arrival(&self, trip_idx: usize, position: usize) -> SecondsSinceDayStart {
        self.trips[trip_idx].arrival(position)
    }

    pub fn departure(&self, trip_idx: usize, position: usize) -> SecondsSinceDayStart {
        self.trips[trip_idx].departure(position)
    }

    /// Insert `candidate` while keeping the per-position sort invariant.
    /// Gives the candidate back when it is not comparable with the trips
    /// already stored.
    pub fn try_insert(&mut self, candidate: TripSchedule) -> Result<(), TripSchedule> {
        debug_assert!(self
            .trips
            .first()
            .map_or(true, |trip| trip.nb_of_positions() == candidate.nb_of_positions()));
        match self.find_insert_idx(&candidate) {
            Some(insert_idx) => {
                self.trips.insert(insert_idx, candidate);
                Ok(())
            }
            None => Err(candidate),
        }
    }

    // Looks for an index where the candidate can be inserted such that,
    // compared with both neighbors, all its positions are on the same side.
    // Trips sharing the candidate's first departure are all tried.
    fn find_insert_idx(&self, candidate: &TripSchedule) -> Option<usize> {
        let nb_of_trips = self.trips.len();
        if nb_of_trips == 0 {
            return Some(0);
        }

        let key = candidate.sort_key();
        let first_equal_idx = self.trips.partition_point(|trip| trip.sort_key() < key);
        let after_equal_idx = self.trips.partition_point(|trip| trip.sort_key() <= key);

        for insert_idx in first_equal_idx..=after_equal_idx {
            let fits_before_next = insert_idx == nb_of_trips
                || matches!(
                    self.cmp_with_trip(candidate, insert_idx),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                );
            let fits_after_prev = insert_idx == 0
                || matches!(
                    self.cmp_with_trip(candidate, insert_idx - 1),
                    Some(Ordering::Greater) | Some(Ordering::Equal)
                );
            if fits_before_next && fits_after_prev {
                return Some(insert_idx);
            }
        }
        None
    }

    // Compares the candidate with one stored trip, position by position,
    // over departures and arrivals alike.
    // Some(Less) when the candidate is at or before the trip everywhere,
    // Some(Greater) when it is at or after it everywhere, Some(Equal) when
    // every entry matches. None when the two trips cross somewhere : they
    // cannot share a timetable.
    fn cmp_with_trip(&self, candidate: &TripSchedule, trip_idx: usize) -> Option<Ordering> {
        let trip = &self.trips[trip_idx];
        debug_assert!(candidate.nb_of_positions() == trip.nb_of_positions());
        let mut ordering = Ordering::Equal;
        let entry_pairs = candidate
            .departures
            .iter()
            .zip(trip.departures.iter())
            .chain(candidate.arrivals.iter().zip(trip.arrivals.iter()));
        for (ours, theirs) in entry_pairs {
            match (ordering, ours.cmp(theirs)) {
                (_, Ordering::Equal) => {}
                (Ordering::Equal, first_direction) => ordering = first_direction,
                (direction, entry_direction) if direction == entry_direction => {}
                _ => return None,
            }
        }
        Some(ordering)
    }

    /// Smallest trip index whose departure at `position` is at or after
    /// `earliest_board_time`, restricted to indices `<= trip_idx_limit`
    /// when a limit is given.
    pub fn earliest_trip_to_board(
        &self,
        earliest_board_time: SecondsSinceDayStart,
        position: usize,
        trip_idx_limit: Option<usize>,
    ) -> Option<BoardResult> {
        let end = match trip_idx_limit {
            Some(limit) => (limit + 1).min(self.trips.len()),
            None => self.trips.len(),
        };
        // departures at `position` are sorted, see the invariant above
        let trip_idx = self.trips[..end]
            .partition_point(|trip| trip.departure(position) < earliest_board_time);
        if trip_idx == end {
            return None;
        }
        Some(BoardResult {
            trip_idx,
            position,
            departure_time: self.trips[trip_idx].departure(position),
        })
    }

    /// Largest trip index whose arrival at `position` is at or before
    /// `latest_alight_time`. Used by reverse searches.
    pub fn latest_trip_to_alight(
        &self,
        latest_alight_time: SecondsSinceDayStart,
        position: usize,
    ) -> Option<(usize, SecondsSinceDayStart)> {
        let nb_after = self
            .trips
            .partition_point(|trip| trip.arrival(position) <= latest_alight_time);
        if nb_after == 0 {
            return None;
        }
        let trip_idx = nb_after - 1;
        Some((trip_idx, self.trips[trip_idx].arrival(position)))
    }

    pub fn first_departure(&self) -> Option<SecondsSinceDayStart> {
        self.trips.first().map(|trip| trip.sort_key())
    }

    pub fn last_arrival(&self) -> Option<SecondsSinceDayStart> {
        self.trips
            .iter()
            .map(|trip| trip.arrival(trip.nb_of_positions() - 1))
            .max()
    }
}

fn inspect(
    arrivals: &[SecondsSinceDayStart],
    departures: &[SecondsSinceDayStart],
) -> Result<(), TripTimesError> {
    debug_assert!(arrivals.len() == departures.len());
    if arrivals.len() < 2 {
        return Err(TripTimesError::NotEnoughPositions(arrivals.len()));
    }
    for (position, (arrival, departure)) in arrivals.iter().zip(departures.iter()).enumerate() {
        if arrival > departure {
            return Err(TripTimesError::ArrivalAfterDeparture(position));
        }
    }
    for position in 0..departures.len() - 1 {
        if departures[position] > arrivals[position + 1] {
            return Err(TripTimesError::DecreasingTimes(PositionPair {
                upstream: position,
                downstream: position + 1,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(hours: u32, minutes: u32, seconds: u32) -> SecondsSinceDayStart {
        SecondsSinceDayStart::from_hms(hours, minutes, seconds)
    }

    fn trip(times: &[(u32, u32)], id: &str) -> TripSchedule {
        let arrivals = times.iter().map(|&(h, m)| time(h, m, 0)).collect();
        let departures = times.iter().map(|&(h, m)| time(h, m, 0)).collect();
        match TripSchedule::new(arrivals, departures, id.to_string()) {
            Ok(schedule) => schedule,
            Err(_) => panic!("invalid test trip {}", id),
        }
    }

    fn three_trip_timetable() -> Timetable {
        let mut timetable = Timetable::new();
        assert!(timetable.try_insert(trip(&[(9, 0), (9, 30)], "t1")).is_ok());
        assert!(timetable.try_insert(trip(&[(9, 10), (9, 40)], "t2")).is_ok());
        assert!(timetable.try_insert(trip(&[(9, 20), (9, 50)], "t3")).is_ok());
        timetable
    }

    #[test]
    fn forward_search_boundaries() {
        let timetable = three_trip_timetable();

        // between two departures : next trip
        let board = timetable
            .earliest_trip_to_board(time(9, 5, 0), 0, None)
            .unwrap();
        assert_eq!(board.trip_idx, 1);
        assert_eq!(board.departure_time, time(9, 10, 0));

        // exactly on a departure : that trip
        let board = timetable
            .earliest_trip_to_board(time(9, 0, 0), 0, None)
            .unwrap();
        assert_eq!(board.trip_idx, 0);

        // after the last departure : none
        assert!(timetable
            .earliest_trip_to_board(time(9, 21, 0), 0, None)
            .is_none());
    }

    #[test]
    fn forward_search_respects_trip_limit() {
        let timetable = three_trip_timetable();

        // limit is inclusive
        let board = timetable
            .earliest_trip_to_board(time(9, 5, 0), 0, Some(1))
            .unwrap();
        assert_eq!(board.trip_idx, 1);

        assert!(timetable
            .earliest_trip_to_board(time(9, 15, 0), 0, Some(1))
            .is_none());
    }

    #[test]
    fn forward_search_is_monotone_in_board_time() {
        let timetable = three_trip_timetable();
        let mut previous_idx = 0;
        for minute in 0..=20 {
            let board = timetable
                .earliest_trip_to_board(time(9, minute, 0), 0, None)
                .unwrap();
            assert!(board.trip_idx >= previous_idx);
            previous_idx = board.trip_idx;
        }
    }

    #[test]
    fn reverse_search_boundaries() {
        let timetable = three_trip_timetable();

        let (trip_idx, arrival) = timetable.latest_trip_to_alight(time(9, 45, 0), 1).unwrap();
        assert_eq!(trip_idx, 1);
        assert_eq!(arrival, time(9, 40, 0));

        let (trip_idx, _) = timetable.latest_trip_to_alight(time(9, 30, 0), 1).unwrap();
        assert_eq!(trip_idx, 0);

        assert!(timetable.latest_trip_to_alight(time(9, 29, 0), 1).is_none());
    }

    #[test]
    fn overtaking_trip_is_rejected() {
        let mut timetable = Timetable::new();
        assert!(timetable.try_insert(trip(&[(9, 0), (9, 30)], "t1")).is_ok());
        // departs later but arrives earlier : not comparable with t1
        let overtaking = trip(&[(9, 10), (9, 20)], "t2");
        assert!(timetable.try_insert(overtaking).is_err());
        assert_eq!(timetable.nb_of_trips(), 1);
    }

    #[test]
    fn trips_sharing_a_first_departure_can_coexist() {
        let mut timetable = Timetable::new();
        assert!(timetable.try_insert(trip(&[(9, 0), (9, 30)], "t1")).is_ok());
        assert!(timetable.try_insert(trip(&[(9, 0), (9, 40)], "t2")).is_ok());
        assert_eq!(timetable.nb_of_trips(), 2);
        // the slower trip must be stored second
        assert_eq!(timetable.arrival(1, 1), time(9, 40, 0));
    }

    #[test]
    fn bad_trip_times() {
        // departure before arrival at the same position
        let arrivals = vec![time(9, 10, 0), time(9, 30, 0)];
        let departures = vec![time(9, 0, 0), time(9, 30, 0)];
        assert!(TripSchedule::new(arrivals, departures, "bad".to_string()).is_err());

        // going back in time between positions
        let arrivals = vec![time(9, 0, 0), time(8, 30, 0)];
        let departures = vec![time(9, 0, 0), time(8, 30, 0)];
        assert!(TripSchedule::new(arrivals, departures, "bad".to_string()).is_err());

        // single position
        let arrivals = vec![time(9, 0, 0)];
        let departures = vec![time(9, 0, 0)];
        assert!(TripSchedule::new(arrivals, departures, "bad".to_string()).is_err());
    }
}
