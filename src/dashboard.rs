//! Per-cycle dashboard state and its text rendering.
//!
//! A refresh either replaces the whole snapshot (cards, alerts, charts) in
//! one call to [`Dashboard::apply_samples`] or leaves it untouched and only
//! flips the status line, so a reader never sees a half-updated view.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    annotations::Annotation,
    charts::{ChartHandle, ChartRegistry, ChartSpec},
    classify::{classify, Classification, IdealRange, TemperatureAlerts},
    models::{Channel, Sample},
    solar::GeoLocation,
    time_range::TimeRange,
};

// ---

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

/// Current value of one channel, as shown on its stat card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub channel: Channel,
    pub value: Option<f64>,
    pub display: String,
    pub state: Classification,
}

impl StatCard {
    pub fn new(channel: Channel, value: Option<f64>) -> Self {
        Self {
            channel,
            value,
            display: channel.format_value(value),
            state: classify(value, IdealRange::for_channel(channel)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub range: TimeRange,
    pub latest: DateTime<Utc>,
    pub cards: Vec<StatCard>,
    pub alerts: TemperatureAlerts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Updated(DateTime<Utc>),
    Error,
}

/// JSON document written per refresh in `json` output mode.
#[derive(Debug, Serialize)]
struct DashboardView<'a> {
    range: TimeRange,
    site: GeoLocation,
    status: String,
    snapshot: Option<&'a Snapshot>,
    charts: Vec<&'a ChartHandle>,
}

#[derive(Debug)]
pub struct Dashboard {
    range: TimeRange,
    geo: GeoLocation,
    charts: ChartRegistry,
    snapshot: Option<Snapshot>,
    status: Status,
}

impl Dashboard {
    pub fn new(range: TimeRange, geo: GeoLocation) -> Self {
        Self {
            range,
            geo,
            charts: ChartRegistry::new(),
            snapshot: None,
            status: Status::Idle,
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn set_range(&mut self, range: TimeRange) {
        if range != self.range {
            info!("Time range changed: {} -> {}", self.range, range);
            self.range = range;
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn begin_refresh(&mut self) {
        self.status = Status::Loading;
    }

    /// Replace cards, alerts and charts from a freshly fetched window.
    ///
    /// `samples` must be sorted oldest first; an empty window is treated as
    /// a failed refresh.
    pub fn apply_samples(&mut self, samples: &[Sample]) {
        // ---
        let Some(latest) = samples.last() else {
            self.apply_error("No data available");
            return;
        };

        let cards = Channel::ALL
            .iter()
            .map(|&c| StatCard::new(c, latest.values.get(c)))
            .collect();
        let alerts = TemperatureAlerts::evaluate(latest.values.temperature);
        for msg in alerts.messages() {
            warn!("{}", msg);
        }

        for channel in Channel::ALL {
            let spec = ChartSpec::build(channel, samples, self.range, self.geo);
            self.charts.create_or_replace(spec);
        }

        self.snapshot = Some(Snapshot {
            range: self.range,
            latest: latest.timestamp,
            cards,
            alerts,
        });
        self.status = Status::Updated(latest.timestamp);
    }

    /// Mark the refresh as failed. The previous snapshot stays visible.
    pub fn apply_error(&mut self, reason: &str) {
        warn!("Refresh failed: {}", reason);
        self.status = Status::Error;
    }

    pub fn status_line(&self, now: DateTime<Utc>) -> String {
        match &self.status {
            Status::Idle => String::new(),
            Status::Loading => "Loading...".to_string(),
            Status::Updated(at) => format!("Last update: {}", time_ago(*at, now)),
            Status::Error => "Error loading data".to_string(),
        }
    }

    /// Render the whole dashboard as plain text.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        // ---
        let mut out = String::new();
        let _ = writeln!(
            out,
            "== Greenhouse Sensors ({}) ==  {}",
            self.range.label(),
            self.status_line(now)
        );

        let Some(snapshot) = &self.snapshot else {
            return out;
        };

        for card in &snapshot.cards {
            let _ = writeln!(
                out,
                "  {:<14} {:>8} {:<4} {}",
                card.channel.label().split(" (").next().unwrap_or_default(),
                card.display,
                card.channel.unit(),
                card.state.as_str()
            );
        }
        for msg in snapshot.alerts.messages() {
            let _ = writeln!(out, "  ! {msg}");
        }

        for handle in self.charts.iter() {
            render_chart(&mut out, &handle.spec);
        }
        out
    }

    /// Serialize the current view. Missing points in chart series come
    /// out as `null`.
    pub fn to_json(&self, now: DateTime<Utc>) -> serde_json::Result<String> {
        // ---
        let view = DashboardView {
            range: self.range,
            site: self.geo,
            status: self.status_line(now),
            snapshot: self.snapshot.as_ref(),
            charts: self.charts.iter().collect(),
        };
        serde_json::to_string_pretty(&view)
    }
}

/// Human-readable age of the latest sample.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // ---
    let minutes = (now - at).num_minutes();
    let plural = |n: i64| if n > 1 { "s" } else { "" };

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if minutes < 1440 {
        let hours = minutes / 60;
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        let days = minutes / 1440;
        format!("{} day{} ago", days, plural(days))
    }
}

fn render_chart(out: &mut String, spec: &ChartSpec) {
    // ---
    let (Some(first), Some(last)) = (spec.labels.first(), spec.labels.last()) else {
        return;
    };

    let (lo, hi) = spec
        .points()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let nights: Vec<(DateTime<Utc>, DateTime<Utc>)> = spec
        .annotations
        .values()
        .filter_map(|a| match a {
            Annotation::Night { x_min, x_max } => Some((*x_min, *x_max)),
            Annotation::IdealBand { .. } => None,
        })
        .collect();
    let band = spec.annotations.values().find_map(|a| match a {
        Annotation::IdealBand { y_min, y_max } => Some((*y_min, *y_max)),
        Annotation::Night { .. } => None,
    });

    let _ = write!(
        out,
        "\n  {}  [{} .. {}]",
        spec.label,
        first.format(spec.tick_format),
        last.format(spec.tick_format)
    );
    if lo.is_finite() {
        let _ = write!(out, "  min {lo:.1}  max {hi:.1}");
    }
    if let Some((y_min, y_max)) = band {
        let _ = write!(out, "  ideal {y_min}..{y_max}");
    }
    out.push('\n');

    let buckets = bucket_means(spec);
    let line: String = buckets
        .iter()
        .map(|b| b.map_or(' ', |v| spark_char(v, lo, hi)))
        .collect();
    let _ = writeln!(out, "  {line}");

    if !nights.is_empty() {
        let span = (*last - *first).num_seconds().max(1);
        let shade: String = (0..buckets.len())
            .map(|i| {
                let offset = span * (2 * i as i64 + 1) / (2 * buckets.len() as i64);
                let t = *first + chrono::Duration::seconds(offset);
                if nights.iter().any(|(s, e)| *s <= t && t <= *e) {
                    '░'
                } else {
                    ' '
                }
            })
            .collect();
        let _ = writeln!(out, "  {shade}");
    }
}

/// Sparkline glyph for `v` scaled into `[lo, hi]`. Spans too wide to
/// represent fall back to the lowest glyph.
fn spark_char(v: f64, lo: f64, hi: f64) -> char {
    // ---
    let top = SPARK_LEVELS.len() - 1;
    let level = ((v - lo) / (hi - lo) * top as f64).round();
    if !level.is_finite() || level < 0.0 {
        return SPARK_LEVELS[0];
    }
    SPARK_LEVELS[(level as usize).min(top)]
}

/// Average finite points into at most `SPARK_WIDTH` columns.
fn bucket_means(spec: &ChartSpec) -> Vec<Option<f64>> {
    // ---
    let n = spec.series.len();
    let width = n.min(SPARK_WIDTH);
    (0..width)
        .map(|i| {
            let from = i * n / width;
            let to = ((i + 1) * n / width).max(from + 1);
            let points: Vec<f64> = spec.series[from..to]
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            if points.is_empty() {
                return None;
            }
            // Scale before summing so values near f64::MAX stay finite.
            let len = points.len() as f64;
            let mean = points.iter().map(|v| v / len).sum::<f64>();
            mean.is_finite().then_some(mean)
        })
        .collect()
}
