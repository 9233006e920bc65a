//! Chart annotation boxes: the ideal band and night shading.
//!
//! Regions are expressed in axis units (reading values on y, instants on x),
//! never pixels.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    classify::IdealRange,
    solar::{night_intervals_for, GeoLocation, NightInterval},
    time_range::TimeRange,
};

// ---

/// Key of the ideal-band annotation.
pub const IDEAL_BAND_ID: &str = "idealBand";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Horizontal band spanning the full x axis.
    IdealBand { y_min: f64, y_max: f64 },
    /// Vertical band spanning the full y axis.
    Night {
        x_min: DateTime<Utc>,
        x_max: DateTime<Utc>,
    },
}

impl From<NightInterval> for Annotation {
    fn from(interval: NightInterval) -> Self {
        Annotation::Night {
            x_min: interval.start,
            x_max: interval.end,
        }
    }
}

pub type Annotations = BTreeMap<String, Annotation>;

/// Build the annotation set for one chart.
pub fn build_annotations(
    labels: &[DateTime<Utc>],
    ideal: Option<IdealRange>,
    range: TimeRange,
    geo: GeoLocation,
) -> Annotations {
    // ---
    let mut annotations = Annotations::new();

    if let Some(ideal) = ideal {
        annotations.insert(
            IDEAL_BAND_ID.to_string(),
            Annotation::IdealBand {
                y_min: ideal.min,
                y_max: ideal.max,
            },
        );
    }

    annotations.extend(night_intervals_for(labels, range, geo).map(|n| (n.id(), n.into())));
    annotations
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::solar::SITE;
    use chrono::{Duration, TimeZone};

    fn hourly_labels(hours: i64) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
        (0..=hours).map(|h| start + Duration::hours(h)).collect()
    }

    #[test]
    fn test_ideal_band_and_night() {
        // ---
        let labels = hourly_labels(24);
        let annotations = build_annotations(
            &labels,
            Some(IdealRange::new(7.0, 36.0)),
            TimeRange::Day,
            SITE,
        );

        assert_eq!(
            annotations.get(IDEAL_BAND_ID),
            Some(&Annotation::IdealBand {
                y_min: 7.0,
                y_max: 36.0
            })
        );
        assert!(annotations.contains_key("night_morn_0"));
        assert!(annotations.contains_key("night_eve_1"));
        assert_eq!(annotations.len(), 3);
    }

    #[test]
    fn test_channel_without_band() {
        // ---
        let labels = hourly_labels(24);
        let annotations = build_annotations(&labels, None, TimeRange::Week, SITE);
        assert!(!annotations.contains_key(IDEAL_BAND_ID));
        assert!(annotations
            .values()
            .all(|a| matches!(a, Annotation::Night { .. })));
    }

    #[test]
    fn test_coarse_range_only_band() {
        // ---
        let labels = hourly_labels(24 * 30);
        let annotations = build_annotations(
            &labels,
            Some(IdealRange::new(0.0, 50.0)),
            TimeRange::Month,
            SITE,
        );
        assert_eq!(annotations.len(), 1);
    }
}
