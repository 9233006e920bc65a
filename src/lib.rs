//! Live greenhouse sensor dashboard.
//!
//! Polls a ThingSpeak-style feed for five fixed channels, classifies the
//! latest readings against ideal ranges, and builds chart models with ideal
//! bands and night shading.
//!
//! The crate follows the Explicit Module Boundary Pattern (EMBP): modules
//! reach each other through `crate::` paths and the public surface is
//! re-exported here.

pub mod annotations;
pub mod app;
pub mod charts;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod models;
pub mod solar;
pub mod time_range;

pub use classify::{classify, Classification, IdealRange, TemperatureAlerts};
pub use config::Config;
pub use dashboard::Dashboard;
pub use fetch::{FeedClient, FeedError};
pub use models::{Channel, ChannelValues, RawFeed, Sample};
pub use solar::{night_intervals, night_intervals_for, solar_times, GeoLocation, NightInterval};
pub use time_range::TimeRange;
