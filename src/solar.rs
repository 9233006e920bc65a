//! Approximate sunrise/sunset and night shading intervals.
//!
//! Uses a coarse declination model, accurate to roughly five minutes at
//! mid latitudes. Beyond the polar circles the hour-angle `acos` leaves its
//! domain around the solstices; those days have no sunrise or sunset and
//! contribute no night intervals.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::time_range::TimeRange;

// ---

/// Observer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Fixed site of the greenhouse (approximate, south-east England).
pub const SITE: GeoLocation = GeoLocation {
    latitude: 51.5,
    longitude: -0.1,
};

/// Sunrise and sunset for one calendar day. `None` when the sun does not
/// cross the horizon under the model (polar day or night).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

pub fn solar_times(date: NaiveDate, geo: GeoLocation) -> SolarTimes {
    // ---
    let day_of_year = f64::from(date.ordinal());
    let declination = -23.45 * ((2.0 * PI / 365.0) * (day_of_year + 10.0)).cos();

    let cos_hour_angle = -geo.latitude.to_radians().tan() * declination.to_radians().tan();
    // NaN outside [-1, 1]
    let hour_angle = cos_hour_angle.acos().to_degrees();

    let solar_noon = 12.0 - geo.longitude / 15.0;
    let midnight = utc_midnight(date);

    SolarTimes {
        sunrise: offset_hours(midnight, solar_noon - hour_angle / 15.0),
        sunset: offset_hours(midnight, solar_noon + hour_angle / 15.0),
    }
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight plus a fractional hour offset, truncated to whole minutes.
/// Offsets outside `0..24` roll over into neighbouring days.
fn offset_hours(midnight: DateTime<Utc>, hours: f64) -> Option<DateTime<Utc>> {
    let minutes = (hours * 60.0).trunc();
    if !minutes.is_finite() {
        return None;
    }
    midnight.checked_add_signed(Duration::minutes(minutes as i64))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightKind {
    /// Sunset to the following midnight.
    Evening,
    /// Midnight to the following sunrise.
    Morning,
}

/// A night span clipped to the chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightInterval {
    /// Day iteration index the interval was produced on.
    pub index: usize,
    pub kind: NightKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NightInterval {
    /// Annotation key, stable across redraws of the same window.
    pub fn id(&self) -> String {
        match self.kind {
            NightKind::Evening => format!("night_eve_{}", self.index),
            NightKind::Morning => format!("night_morn_{}", self.index),
        }
    }
}

/// Lazy iterator over the night intervals overlapping a window.
///
/// Walks UTC days from the day before the window start through the day
/// after the window end. Each day yields at most an evening interval and a
/// morning interval, in that order.
#[derive(Debug, Clone)]
pub struct NightIntervals {
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    geo: GeoLocation,
    day: NaiveDate,
    days_left: i64,
    index: usize,
    pending: Option<NightInterval>,
}

pub fn night_intervals(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    geo: GeoLocation,
) -> NightIntervals {
    // ---
    let first = window_start.date_naive();
    let first = first.checked_sub_days(Days::new(1)).unwrap_or(first);
    let last = window_end.date_naive();
    let last = last.checked_add_days(Days::new(1)).unwrap_or(last);

    NightIntervals {
        window_start,
        window_end,
        geo,
        day: first,
        days_left: ((last - first).num_days() + 1).max(0),
        index: 0,
        pending: None,
    }
}

/// Night intervals for a chart's labels at the given display range.
///
/// Nothing is computed for coarse ranges or for fewer than two labels.
pub fn night_intervals_for(
    labels: &[DateTime<Utc>],
    range: TimeRange,
    geo: GeoLocation,
) -> impl Iterator<Item = NightInterval> {
    // ---
    let window = match labels {
        [first, .., last] if range.is_short_range() => Some((*first, *last)),
        _ => None,
    };
    window
        .map(|(start, end)| night_intervals(start, end, geo))
        .into_iter()
        .flatten()
}

impl NightIntervals {
    fn day_intervals(&self, day: NaiveDate) -> (Option<NightInterval>, Option<NightInterval>) {
        // ---
        let (start, end) = (self.window_start, self.window_end);
        let midnight = utc_midnight(day) + Duration::days(1);

        let evening = solar_times(day, self.geo)
            .sunset
            .filter(|sunset| *sunset < end && midnight > start)
            .map(|sunset| NightInterval {
                index: self.index,
                kind: NightKind::Evening,
                start: sunset.max(start),
                end: midnight.min(end),
            });

        let morning = solar_times(midnight.date_naive(), self.geo)
            .sunrise
            .filter(|sunrise| midnight < end && *sunrise > start)
            .map(|sunrise| NightInterval {
                index: self.index,
                kind: NightKind::Morning,
                start: midnight.max(start),
                end: sunrise.min(end),
            });

        (evening, morning)
    }
}

impl Iterator for NightIntervals {
    type Item = NightInterval;

    fn next(&mut self) -> Option<NightInterval> {
        // ---
        loop {
            if let Some(interval) = self.pending.take() {
                return Some(interval);
            }
            if self.days_left <= 0 {
                return None;
            }

            let (evening, morning) = self.day_intervals(self.day);
            self.days_left -= 1;
            self.index += 1;
            self.day = self.day.succ_opt().unwrap_or(self.day);
            self.pending = morning;

            if evening.is_some() {
                return evening;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    const SVALBARD: GeoLocation = GeoLocation {
        latitude: 78.2,
        longitude: 15.6,
    };

    #[test]
    fn test_midsummer_london() {
        // ---
        let times = solar_times(date(2024, 6, 21), SITE);
        let sunrise = times.sunrise.unwrap();
        let sunset = times.sunset.unwrap();

        assert!(sunrise < at(2024, 6, 21, 5, 0), "sunrise {sunrise}");
        assert!(sunset > at(2024, 6, 21, 19, 0), "sunset {sunset}");
        assert_eq!(sunrise.second(), 0);
    }

    #[test]
    fn test_midwinter_london() {
        // ---
        let times = solar_times(date(2024, 12, 21), SITE);
        assert!(times.sunrise.unwrap() > at(2024, 12, 21, 7, 0));
        assert!(times.sunset.unwrap() < at(2024, 12, 21, 17, 0));
    }

    #[test]
    fn test_offset_rolls_into_next_day() {
        // ---
        // Solar noon at 23:20 UTC, so sunset lands on the following date.
        let pacific = GeoLocation {
            latitude: 0.0,
            longitude: -170.0,
        };
        let times = solar_times(date(2024, 3, 20), pacific);
        assert_eq!(times.sunrise.unwrap().date_naive(), date(2024, 3, 20));
        assert_eq!(times.sunset.unwrap().date_naive(), date(2024, 3, 21));
    }

    #[test]
    fn test_polar_day_has_no_times() {
        // ---
        let times = solar_times(date(2024, 6, 21), SVALBARD);
        assert_eq!(times.sunrise, None);
        assert_eq!(times.sunset, None);
    }

    #[test]
    fn test_polar_summer_window_is_consistent() {
        // ---
        let labels = [at(2024, 6, 18, 0, 0), at(2024, 6, 25, 0, 0)];
        let first: Vec<_> = night_intervals_for(&labels, TimeRange::Week, SVALBARD).collect();
        let second: Vec<_> = night_intervals_for(&labels, TimeRange::Week, SVALBARD).collect();

        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_day_window() {
        // ---
        let start = at(2024, 6, 21, 0, 0);
        let end = at(2024, 6, 22, 0, 0);
        let intervals: Vec<_> = night_intervals(start, end, SITE).collect();

        let ids: Vec<String> = intervals.iter().map(NightInterval::id).collect();
        assert_eq!(ids, vec!["night_morn_0", "night_eve_1"]);

        let morning = intervals[0];
        assert_eq!(morning.start, start);
        assert!(morning.end < at(2024, 6, 21, 5, 0));

        let evening = intervals[1];
        assert!(evening.start > at(2024, 6, 21, 19, 0));
        assert_eq!(evening.end, end);
    }

    #[test]
    fn test_intervals_are_clipped_to_window() {
        // ---
        let start = at(2024, 3, 4, 13, 30);
        let end = at(2024, 3, 10, 9, 15);
        let intervals: Vec<_> = night_intervals(start, end, SITE).collect();

        // Every night in the week is covered by an evening and a morning part.
        assert_eq!(intervals.len(), 12);
        for interval in &intervals {
            assert!(interval.start >= start && interval.end <= end, "{interval:?}");
            assert!(interval.start < interval.end, "{interval:?}");
        }
    }

    #[test]
    fn test_coarse_ranges_have_no_shading() {
        // ---
        let labels = [at(2024, 1, 1, 0, 0), at(2024, 1, 31, 0, 0)];
        assert_eq!(night_intervals_for(&labels, TimeRange::Month, SITE).count(), 0);
        assert_eq!(night_intervals_for(&labels, TimeRange::Year, SITE).count(), 0);
        assert!(night_intervals_for(&labels, TimeRange::Day, SITE).count() > 0);
    }

    #[test]
    fn test_too_few_labels() {
        // ---
        let one = [at(2024, 1, 1, 12, 0)];
        assert_eq!(night_intervals_for(&[], TimeRange::Day, SITE).count(), 0);
        assert_eq!(night_intervals_for(&one, TimeRange::Day, SITE).count(), 0);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        // ---
        let start = at(2024, 10, 1, 6, 0);
        let end = at(2024, 10, 8, 6, 0);
        let iter = night_intervals(start, end, SITE);
        let restarted: Vec<_> = iter.clone().collect();
        let first: Vec<_> = iter.collect();
        let again: Vec<_> = night_intervals(start, end, SITE).collect();

        assert_eq!(first, again);
        assert_eq!(first, restarted);
    }
}
