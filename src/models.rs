//! Data models for the greenhouse sensor channel.
//!
//! The upstream feed addresses channels by position (`field1`..`field5`) and
//! sends every value as a string. This module is the only place that knows
//! about that layout: everything past [`RawFeed::to_sample`] works with the
//! [`Channel`] enum and `Option<f64>` values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// The five fixed sensor channels of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Temperature,
    Humidity,
    Pressure,
    Light,
    Soil,
}

impl Channel {
    /// All channels in display order.
    pub const ALL: [Channel; 5] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Pressure,
        Channel::Light,
        Channel::Soil,
    ];

    /// Series label shown above the chart.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature (°C)",
            Channel::Humidity => "Humidity (%)",
            Channel::Pressure => "Pressure (hPa)",
            Channel::Light => "Light (lux)",
            Channel::Soil => "Soil Moisture (%)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Humidity | Channel::Soil => "%",
            Channel::Pressure => "hPa",
            Channel::Light => "lux",
        }
    }

    /// Identifier of the chart that plots this channel.
    pub fn chart_id(&self) -> &'static str {
        match self {
            Channel::Temperature => "tempChart",
            Channel::Humidity => "humidityChart",
            Channel::Pressure => "pressureChart",
            Channel::Light => "luxChart",
            Channel::Soil => "soilChart",
        }
    }

    /// Format a current value for a stat card. Light is shown as a whole
    /// number, everything else with one decimal.
    pub fn format_value(&self, value: Option<f64>) -> String {
        match (self, value) {
            (_, None) => "--".to_string(),
            (Channel::Light, Some(v)) => format!("{v:.0}"),
            (_, Some(v)) => format!("{v:.1}"),
        }
    }
}

/// One value slot per channel. `None` means the feed had no usable value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelValues {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub light: Option<f64>,
    pub soil: Option<f64>,
}

impl ChannelValues {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Pressure => self.pressure,
            Channel::Light => self.light,
            Channel::Soil => self.soil,
        }
    }
}

/// Raw feed entry as returned by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeed {
    // ---
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
    #[serde(default)]
    pub field3: Option<String>,
    #[serde(default)]
    pub field4: Option<String>,
    #[serde(default)]
    pub field5: Option<String>,
}

/// A decoded sample: one timestamp, one optional value per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub values: ChannelValues,
}

impl RawFeed {
    // ---
    pub fn to_sample(&self) -> Sample {
        // ---
        Sample {
            timestamp: self.created_at,
            values: ChannelValues {
                temperature: parse_field(self.field1.as_deref()),
                humidity: parse_field(self.field2.as_deref()),
                pressure: parse_field(self.field3.as_deref()),
                light: parse_field(self.field4.as_deref()),
                soil: parse_field(self.field5.as_deref()),
            },
        }
    }
}

/// Read the longest leading number of a field, ignoring leading
/// whitespace and any trailing text (`"12.5abc"` reads as 12.5). Missing,
/// empty and non-numeric strings, and non-finite results, become `None`.
fn parse_field(raw: Option<&str>) -> Option<f64> {
    // ---
    let s = raw?.trim_start();
    let numeric = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());
    let candidate = &s[..numeric];

    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn raw(fields: [Option<&str>; 5]) -> RawFeed {
        // ---
        RawFeed {
            created_at: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
            field1: fields[0].map(String::from),
            field2: fields[1].map(String::from),
            field3: fields[2].map(String::from),
            field4: fields[3].map(String::from),
            field5: fields[4].map(String::from),
        }
    }

    #[test]
    fn test_fields_map_to_channels() {
        // ---
        let sample = raw([
            Some("21.4"),
            Some("48.0"),
            Some("1013.2"),
            Some("12000"),
            Some("35.5"),
        ])
        .to_sample();

        assert_eq!(sample.values.get(Channel::Temperature), Some(21.4));
        assert_eq!(sample.values.get(Channel::Humidity), Some(48.0));
        assert_eq!(sample.values.get(Channel::Pressure), Some(1013.2));
        assert_eq!(sample.values.get(Channel::Light), Some(12000.0));
        assert_eq!(sample.values.get(Channel::Soil), Some(35.5));
    }

    #[test]
    fn test_absent_and_invalid_fields() {
        // ---
        let sample = raw([None, Some(""), Some("  "), Some("abc"), Some("NaN")]).to_sample();

        for channel in Channel::ALL {
            assert_eq!(sample.values.get(channel), None, "{channel:?}");
        }
    }

    #[test]
    fn test_leading_number_is_kept() {
        // ---
        let sample = raw([
            Some("12.5abc"),
            Some(" 48 %"),
            Some("1e"),
            Some("-3.25-"),
            Some(".5"),
        ])
        .to_sample();

        assert_eq!(sample.values.temperature, Some(12.5));
        assert_eq!(sample.values.humidity, Some(48.0));
        assert_eq!(sample.values.pressure, Some(1.0));
        assert_eq!(sample.values.light, Some(-3.25));
        assert_eq!(sample.values.soil, Some(0.5));

        let sample = raw([Some("-"), Some("e5"), Some("1e999"), Some("Infinity"), Some("°C")]).to_sample();
        for channel in Channel::ALL {
            assert_eq!(sample.values.get(channel), None, "{channel:?}");
        }
    }

    #[test]
    fn test_decode_from_json() {
        // ---
        let json = r#"{
            "created_at": "2024-06-21T10:00:00Z",
            "entry_id": 42,
            "field1": "18.25",
            "field2": null,
            "field4": "900"
        }"#;
        let feed: RawFeed = serde_json::from_str(json).unwrap();
        let sample = feed.to_sample();

        assert_eq!(
            sample.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 0).unwrap()
        );
        assert_eq!(sample.values.temperature, Some(18.25));
        assert_eq!(sample.values.humidity, None);
        assert_eq!(sample.values.pressure, None);
        assert_eq!(sample.values.light, Some(900.0));
    }

    #[test]
    fn test_format_value() {
        // ---
        assert_eq!(Channel::Temperature.format_value(Some(21.44)), "21.4");
        assert_eq!(Channel::Light.format_value(Some(12345.6)), "12346");
        assert_eq!(Channel::Soil.format_value(None), "--");
    }
}
