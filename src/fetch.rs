//! HTTP client for the upstream feed API.

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::{Config, FeedQuery},
    models::{RawFeed, Sample},
    time_range::TimeRange,
};

// ---

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed API returned {0}")]
    Status(StatusCode),

    #[error("No data available")]
    Empty,
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
    channel_id: String,
    read_api_key: Option<String>,
    query: FeedQuery,
}

impl FeedClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            channel_id: config.channel_id.clone(),
            read_api_key: config.read_api_key.clone(),
            query: config.feed_query,
        }
    }

    /// Feed URL for the given display range.
    pub fn feed_url(&self, range: TimeRange) -> String {
        // ---
        let filter = match self.query {
            FeedQuery::DaysBack => format!("days={}", range.days()),
            FeedQuery::ResultCount(n) => format!("results={n}"),
        };
        let mut url = format!(
            "{}/channels/{}/feeds.json?{}",
            self.base_url, self.channel_id, filter
        );
        if let Some(key) = &self.read_api_key {
            url.push_str("&api_key=");
            url.push_str(key);
        }
        url
    }

    /// Fetch and decode the feed, oldest sample first.
    ///
    /// Entries that fail to decode are skipped. An empty result is an error.
    pub async fn fetch(&self, range: TimeRange) -> FeedResult<Vec<Sample>> {
        // ---
        let url = self.feed_url(range);
        debug!("Fetching feed from: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }
        let body: serde_json::Value = response.json().await?;

        let samples = decode_feeds(&body);
        if samples.is_empty() {
            return Err(FeedError::Empty);
        }

        info!("Fetched {} samples for range {}", samples.len(), range);
        Ok(samples)
    }
}

/// Decode the `feeds` array of a response body.
pub fn decode_feeds(body: &serde_json::Value) -> Vec<Sample> {
    // ---
    let Some(feeds) = body.get("feeds").and_then(|f| f.as_array()) else {
        debug!("Response missing 'feeds' field or not an array");
        return Vec::new();
    };

    let mut samples: Vec<Sample> = feeds
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<RawFeed>(item.clone()) {
            Ok(feed) => Some(feed.to_sample()),
            Err(e) => {
                debug!("Failed to parse feed {}: {} - Raw item: {}", i, e, item);
                None
            }
        })
        .collect();

    samples.sort_by_key(|s| s.timestamp);
    samples
}
