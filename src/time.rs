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

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Duration since 00:00:00 on the service day.
/// This corresponds to the "Time" notion found in gtfs stop_times.txt.
/// Values may exceed 24:00:00 for overnight runs, up to 48:00:00
/// (two-day-overnight schedules).
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDayStart {
    seconds: u32,
}

const MAX_SECONDS_SINCE_DAY_START: u32 = 48 * 60 * 60; // 48h

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    /// The greatest representable value. Used by the engine as the
    /// "not reached yet" marker : every valid time compares strictly below it.
    pub fn max() -> Self {
        Self { seconds: u32::MAX }
    }

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        if !(0..=i64::from(MAX_SECONDS_SINCE_DAY_START)).contains(&seconds) {
            None
        } else {
            Some(Self {
                seconds: seconds as u32,
            })
        }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn duration_since(&self, earlier: &SecondsSinceDayStart) -> Option<PositiveDuration> {
        self.seconds
            .checked_sub(earlier.seconds)
            .map(|seconds| PositiveDuration { seconds })
    }

    /// Renders this time as a calendar datetime, given the service day.
    /// Overnight values roll over to the next day(s).
    pub fn to_datetime(&self, service_day: NaiveDate) -> NaiveDateTime {
        service_day.and_time(NaiveTime::MIN) + chrono::Duration::seconds(i64::from(self.seconds))
    }
}

impl Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        self.seconds as u64
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

#[derive(Debug)]
pub struct DurationParseError(String);

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unable to parse '{}' as a HH:MM:SS duration", self.0)
    }
}

impl std::error::Error for DurationParseError {}

impl FromStr for PositiveDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(':');
        let hours = fields.next().and_then(|f| f.parse::<u32>().ok());
        let minutes = fields.next().and_then(|f| f.parse::<u32>().ok());
        let seconds = fields.next().and_then(|f| f.parse::<u32>().ok());
        if fields.next().is_some() {
            return Err(DurationParseError(s.to_string()));
        }
        match (hours, minutes, seconds) {
            (Some(h), Some(m), Some(s)) if m < 60 && s < 60 => {
                Ok(PositiveDuration::from_hms(h, m, s))
            }
            _ => Err(DurationParseError(s.to_string())),
        }
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = PositiveDuration;

    fn add(self, other: Self) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds + other.seconds,
        }
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceDayStart {
    type Output = SecondsSinceDayStart;

    fn add(self, duration: PositiveDuration) -> Self::Output {
        SecondsSinceDayStart {
            seconds: self.seconds.saturating_add(duration.seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration() {
        assert_eq!(
            PositiveDuration::from_str("00:01:00").unwrap(),
            PositiveDuration::from_seconds(60)
        );
        assert_eq!(
            PositiveDuration::from_str("25:00:30").unwrap(),
            PositiveDuration::from_seconds(25 * 3600 + 30)
        );
        assert!(PositiveDuration::from_str("1:2").is_err());
        assert!(PositiveDuration::from_str("xx:00:00").is_err());
    }

    #[test]
    fn overnight_times_are_accepted() {
        let time = SecondsSinceDayStart::from_seconds(26 * 3600).unwrap();
        assert_eq!(format!("{}", time), "26:00:00");
        assert!(SecondsSinceDayStart::from_seconds(172_801).is_none());
        assert!(SecondsSinceDayStart::from_seconds(-1).is_none());
    }

    #[test]
    fn datetime_rollover() {
        let time = SecondsSinceDayStart::from_hms(25, 30, 0);
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let datetime = time.to_datetime(day);
        assert_eq!(datetime.to_string(), "2024-03-02 01:30:00");
    }
}
