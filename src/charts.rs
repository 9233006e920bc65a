//! Chart models and the registry that owns them between refreshes.
//!
//! Every redraw destroys the previous chart for a channel before the new
//! one is registered, so a channel never has two live handles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    annotations::{build_annotations, Annotations},
    classify::IdealRange,
    models::{Channel, Sample},
    solar::GeoLocation,
    time_range::TimeRange,
};

// ---

/// Everything a renderer needs to draw one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub channel: Channel,
    pub label: &'static str,
    pub labels: Vec<DateTime<Utc>>,
    /// One point per label, `NaN` where the sample had no value.
    pub series: Vec<f64>,
    pub annotations: Annotations,
    pub tick_format: &'static str,
}

impl ChartSpec {
    pub fn build(
        channel: Channel,
        samples: &[Sample],
        range: TimeRange,
        geo: GeoLocation,
    ) -> Self {
        // ---
        let labels: Vec<DateTime<Utc>> = samples.iter().map(|s| s.timestamp).collect();
        let series = samples
            .iter()
            .map(|s| s.values.get(channel).unwrap_or(f64::NAN))
            .collect();
        let annotations =
            build_annotations(&labels, IdealRange::for_channel(channel), range, geo);

        Self {
            channel,
            label: channel.label(),
            labels,
            series,
            annotations,
            tick_format: range.tick_format(),
        }
    }

    /// Finite points only.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        self.series.iter().copied().filter(|v| v.is_finite())
    }
}

/// A live chart. `id` changes every time the chart is recreated.
#[derive(Debug, Clone, Serialize)]
pub struct ChartHandle {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub spec: ChartSpec,
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: BTreeMap<Channel, ChartHandle>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chart for its channel, destroying any previous one.
    /// Returns the new handle's id.
    pub fn create_or_replace(&mut self, spec: ChartSpec) -> Uuid {
        // ---
        let channel = spec.channel;
        if let Some(old) = self.destroy(channel) {
            debug!(chart = channel.chart_id(), old_id = %old.id, "Replacing chart");
        }

        let handle = ChartHandle {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            spec,
        };
        let id = handle.id;
        debug!(chart = channel.chart_id(), %id, points = handle.spec.series.len(), "Created chart");
        self.charts.insert(channel, handle);
        id
    }

    pub fn destroy(&mut self, channel: Channel) -> Option<ChartHandle> {
        self.charts.remove(&channel)
    }

    pub fn get(&self, channel: Channel) -> Option<&ChartHandle> {
        self.charts.get(&channel)
    }

    /// Live charts in channel order.
    pub fn iter(&self) -> impl Iterator<Item = &ChartHandle> {
        self.charts.values()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::ChannelValues;
    use crate::solar::SITE;
    use chrono::{Duration, TimeZone};

    fn samples() -> Vec<Sample> {
        // ---
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
        (0..4)
            .map(|i| Sample {
                timestamp: start + Duration::hours(i),
                values: ChannelValues {
                    temperature: (i != 2).then_some(20.0 + i as f64),
                    ..Default::default()
                },
            })
            .collect()
    }

    #[test]
    fn test_series_uses_nan_for_gaps() {
        // ---
        let spec = ChartSpec::build(Channel::Temperature, &samples(), TimeRange::Day, SITE);
        assert_eq!(spec.labels.len(), 4);
        assert_eq!(spec.series[0], 20.0);
        assert!(spec.series[2].is_nan());
        assert_eq!(spec.points().count(), 3);
        assert_eq!(spec.tick_format, "%H:%M");
    }

    #[test]
    fn test_replace_destroys_previous() {
        // ---
        let mut registry = ChartRegistry::new();
        let spec = ChartSpec::build(Channel::Soil, &samples(), TimeRange::Day, SITE);

        let first = registry.create_or_replace(spec.clone());
        let second = registry.create_or_replace(spec);

        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(Channel::Soil).unwrap().id, second);
    }

    #[test]
    fn test_destroy_and_clear() {
        // ---
        let mut registry = ChartRegistry::new();
        for channel in Channel::ALL {
            registry.create_or_replace(ChartSpec::build(channel, &samples(), TimeRange::Week, SITE));
        }
        assert_eq!(registry.len(), 5);

        assert!(registry.destroy(Channel::Pressure).is_some());
        assert!(registry.destroy(Channel::Pressure).is_none());
        assert_eq!(registry.len(), 4);

        registry.clear();
        assert!(registry.is_empty());
    }
}
