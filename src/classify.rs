//! Ideal-range classification and temperature risk flags.
//!
//! A reading is `InRange` inside its channel's ideal band, `Warning` inside
//! the band widened by 10% of its span on each side, and `Danger` beyond
//! that. Channels without a band, and missing readings, are `Unknown`.

use serde::Serialize;

use crate::models::Channel;

// ---

/// Temperature below which frost damage is likely (°C).
pub const FROST_THRESHOLD_C: f64 = 3.0;

/// Temperature above which heat stress is likely (°C).
pub const HEAT_THRESHOLD_C: f64 = 37.0;

/// Fraction of the band span that counts as the warning margin.
const EDGE_MARGIN: f64 = 0.1;

/// Healthy `[min, max]` band for a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Ideal band for a channel, `None` if the channel has none.
    pub fn for_channel(channel: Channel) -> Option<IdealRange> {
        match channel {
            Channel::Temperature => Some(IdealRange::new(7.0, 36.0)),
            Channel::Humidity => Some(IdealRange::new(0.0, 50.0)),
            Channel::Pressure => None,
            Channel::Light => Some(IdealRange::new(7000.0, 30000.0)),
            Channel::Soil => Some(IdealRange::new(20.0, 60.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    InRange,
    Warning,
    Danger,
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::InRange => "in-range",
            Classification::Warning => "warning",
            Classification::Danger => "danger",
            Classification::Unknown => "unknown",
        }
    }
}

/// Classify a reading against an optional ideal range.
///
/// Degenerate ranges (`max <= min`) are not rejected; the margin simply
/// becomes zero or negative and the comparisons below decide.
pub fn classify(value: Option<f64>, range: Option<IdealRange>) -> Classification {
    // ---
    let (Some(v), Some(range)) = (value, range) else {
        return Classification::Unknown;
    };
    if v.is_nan() {
        return Classification::Unknown;
    }

    let margin = (range.max - range.min) * EDGE_MARGIN;

    if v >= range.min && v <= range.max {
        Classification::InRange
    } else if v >= range.min - margin && v <= range.max + margin {
        Classification::Warning
    } else {
        Classification::Danger
    }
}

/// Frost and heat risk flags for the temperature channel.
///
/// Each flag carries the reading rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TemperatureAlerts {
    pub frost: Option<f64>,
    pub heat: Option<f64>,
}

impl TemperatureAlerts {
    /// Evaluate both flags independently. Missing or NaN readings clear both.
    pub fn evaluate(temperature: Option<f64>) -> Self {
        // ---
        let Some(t) = temperature.filter(|t| !t.is_nan()) else {
            return Self::default();
        };

        Self {
            frost: (t < FROST_THRESHOLD_C).then(|| round1(t)),
            heat: (t > HEAT_THRESHOLD_C).then(|| round1(t)),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.frost.is_none() && self.heat.is_none()
    }

    /// Banner lines for every raised flag.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(t) = self.frost {
            out.push(format!(
                "Frost Warning: Temperature is {t:.1}°C — risk of frost damage!"
            ));
        }
        if let Some(t) = self.heat {
            out.push(format!(
                "Heat Warning: Temperature is {t:.1}°C — risk of heat stress!"
            ));
        }
        out
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
