//! Client configuration.

use std::time::Duration;

use crate::reconcile::DEFAULT_INDICATOR_DURATION;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "GOOSE_API_URL";

/// Base URL used when [`API_URL_ENV`] is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Default number of rounds per listing page.
const DEFAULT_PAGE_SIZE: u32 = 5;

/// Default interval between round detail polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default interval between countdown ticks.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-request timeout of the HTTP transport.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the bounded round event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful watcher shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration shared by the API client, pager and round watcher.
///
/// # Example
///
/// ```
/// use goose_tap_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://goose.example/api")
///     .with_page_size(10)
///     .with_poll_interval(Duration::from_secs(2));
/// assert_eq!(config.page_size, 10);
/// assert_eq!(config.tick_interval, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL without a trailing slash.
    pub base_url: String,
    /// Rounds requested per listing page. Defaults to **5**; clamped to at least 1.
    pub page_size: u32,
    /// Interval between round detail polls while a round can still change.
    /// Defaults to **5 seconds**.
    pub poll_interval: Duration,
    /// Interval between countdown ticks. Defaults to **1 second**.
    pub tick_interval: Duration,
    /// How long the "points gained" indicator stays visible. Defaults to **300 ms**.
    pub tap_indicator_duration: Duration,
    /// Per-request timeout for the HTTP transport. Defaults to **10 seconds**.
    pub request_timeout: Duration,
    /// Capacity of the bounded round event channel.
    ///
    /// When the consumer falls behind, tick and update events are dropped
    /// (with a warning). The final `Stopped` event is always delivered.
    /// Defaults to **256**; clamped to at least 1.
    pub event_channel_capacity: usize,
    /// Time the watcher task gets to stop gracefully before it is aborted.
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL with default values.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            tap_indicator_duration: DEFAULT_INDICATOR_DURATION,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Build a configuration from `GOOSE_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(url)
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the countdown tick interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn with_tap_indicator_duration(mut self, duration: Duration) -> Self {
        self.tap_indicator_duration = duration;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://api.test/");
        assert_eq!(config.base_url, "http://api.test");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.tap_indicator_duration, Duration::from_millis(300));
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = ClientConfig::default()
            .with_page_size(0)
            .with_event_channel_capacity(0)
            .with_poll_interval(Duration::ZERO)
            .with_tick_interval(Duration::ZERO);
        assert_eq!(config.page_size, 1);
        assert_eq!(config.event_channel_capacity, 1);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.tick_interval, Duration::from_millis(1));
    }
}
