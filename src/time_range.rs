//! Display granularities selectable on the dashboard.

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::Serialize;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "1y")]
    Year,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
    ];

    /// Value of the `days` query parameter for this range.
    pub fn days(&self) -> u32 {
        match self {
            TimeRange::Day => 1,
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Year => 365,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Year => "1y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Day => "24 Hours",
            TimeRange::Week => "7 Days",
            TimeRange::Month => "30 Days",
            TimeRange::Year => "1 Year",
        }
    }

    /// Night shading is only drawn for the two finest granularities.
    pub fn is_short_range(&self) -> bool {
        matches!(self, TimeRange::Day | TimeRange::Week)
    }

    /// `chrono` format string for x-axis ticks.
    pub fn tick_format(&self) -> &'static str {
        match self {
            TimeRange::Day => "%H:%M",
            TimeRange::Week => "%b %d %H:%M",
            TimeRange::Month => "%b %d",
            TimeRange::Year => "%b %Y",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown time range '{}' (expected 24h, 7d, 30d or 1y)", s))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_keys() {
        // ---
        for range in TimeRange::ALL {
            assert_eq!(range.key().parse::<TimeRange>().unwrap(), range);
        }
        assert_eq!(" 7D ".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert!("2w".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_short_ranges() {
        // ---
        assert!(TimeRange::Day.is_short_range());
        assert!(TimeRange::Week.is_short_range());
        assert!(!TimeRange::Month.is_short_range());
        assert!(!TimeRange::Year.is_short_range());
    }

    #[test]
    fn test_days_parameter() {
        // ---
        let days: Vec<u32> = TimeRange::ALL.iter().map(TimeRange::days).collect();
        assert_eq!(days, vec![1, 7, 30, 365]);
    }
}
