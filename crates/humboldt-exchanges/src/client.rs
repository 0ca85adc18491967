//! Bounded-time HTTP client for exchange ticker feeds.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Request timeout (covers connect, send, and body).
    pub timeout: Duration,
    /// Connection timeout (separate from the request timeout).
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("humboldt/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur while fetching a ticker.
///
/// Everything except [`Decode`](Self::Decode) and
/// [`UnsupportedPair`](Self::UnsupportedPair) is transient: the caller
/// skips the tick and the next scheduled poll retries naturally.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request exceeded the configured timeout.
    #[error("ticker request timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The feed answered with a non-success status.
    #[error("feed returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The ticker body did not match the expected shape.
    #[error("malformed ticker body: {0}")]
    Decode(String),

    /// The adapter does not serve the requested pair.
    #[error("pair '{0}' is not served by this feed")]
    UnsupportedPair(String),
}

impl FetchError {
    /// Returns true if the error is expected to heal on a later poll.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_) | Self::Status { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// HTTP client shared by all exchange adapters.
///
/// Bounded in time and deliberately without retry logic: the ingestion
/// schedule is the retry policy.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Creates a feed client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(&FeedConfig::default())
    }

    /// Fetches a URL and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on timeout, transport failure, non-success
    /// status, or an unparseable body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_config_default() {
        let config = FeedConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.user_agent.starts_with("humboldt/"));
    }

    #[tokio::test]
    async fn test_client_creation() {
        assert!(FeedClient::with_defaults().is_ok());
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Status { status: 502 }.is_transient());
        assert!(!FetchError::Decode("bad".into()).is_transient());
        assert!(!FetchError::UnsupportedPair("xyz".into()).is_transient());
    }
}
