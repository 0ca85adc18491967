//! The quote store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, QuoteDocument, TimeWindow};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The operation exceeded its time bound.
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The collection name is not identifier-safe.
    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    /// The backend rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored document did not decode into the expected quote shape.
    #[error("document decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Validates that a collection name is safe to splice into a query.
///
/// # Errors
///
/// Returns an error unless the name is non-empty lowercase
/// `[a-z0-9_]`.
pub fn validate_collection(name: &str) -> StoreResult<&str> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

/// Asynchronous document store for quote records.
///
/// One logical collection per (exchange, series): raw quotes plus the
/// hourly and daily rollup series. All methods are non-blocking and
/// individually bounded by their callers.
#[async_trait]
pub trait QuoteStore<Q: QuoteDocument>: Send + Sync {
    /// Appends a single raw quote.
    async fn insert_one(&self, collection: &str, quote: &Q) -> StoreResult<()>;

    /// Appends a batch of rows as one bulk write.
    async fn insert_many(&self, collection: &str, quotes: &[Q]) -> StoreResult<()>;

    /// Returns quotes with `recorded_at` inside the window, oldest
    /// first, optionally filtered to one pair.
    async fn find_range(
        &self,
        collection: &str,
        window: TimeWindow,
        pair: Option<&Pair>,
    ) -> StoreResult<Vec<Q>>;

    /// Returns the newest quote, optionally filtered to one pair.
    async fn find_latest(&self, collection: &str, pair: Option<&Pair>) -> StoreResult<Option<Q>>;

    /// Returns the oldest `recorded_at` in the collection, if any.
    async fn earliest_recorded_at(&self, collection: &str) -> StoreResult<Option<DateTime<Utc>>>;

    /// Ensures a secondary index on the given field exists. Idempotent.
    async fn ensure_index(&self, collection: &str, field: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_collection() {
        assert!(validate_collection("quote_bs_hour").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("quote-bs").is_err());
        assert!(validate_collection("Quote_bs").is_err());
        assert!(validate_collection("quotes; drop table x").is_err());
    }
}
