//! In-memory quote store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, QuoteDocument, TickerQuote, TimeWindow};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::{QuoteStore, StoreResult, validate_collection};

/// In-memory [`QuoteStore`] implementation.
///
/// Backs tests and single-process runs. Collections are plain vectors
/// ordered by insertion; reads sort by `recorded_at` the way the
/// indexed backends return rows.
#[derive(Debug, Default)]
pub struct MemoryStore<Q> {
    collections: RwLock<HashMap<String, Vec<Q>>>,
    indexes: RwLock<HashSet<(String, String)>>,
}

impl<Q> MemoryStore<Q> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashSet::new()),
        }
    }

    /// Returns the number of rows in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Returns true if `ensure_index` was called for (collection, field).
    pub async fn has_index(&self, collection: &str, field: &str) -> bool {
        self.indexes
            .read()
            .await
            .contains(&(collection.to_string(), field.to_string()))
    }
}

#[async_trait]
impl<Q: QuoteDocument> QuoteStore<Q> for MemoryStore<Q> {
    async fn insert_one(&self, collection: &str, quote: &Q) -> StoreResult<()> {
        validate_collection(collection)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(quote.clone());
        Ok(())
    }

    async fn insert_many(&self, collection: &str, quotes: &[Q]) -> StoreResult<()> {
        validate_collection(collection)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(quotes);
        Ok(())
    }

    async fn find_range(
        &self,
        collection: &str,
        window: TimeWindow,
        pair: Option<&Pair>,
    ) -> StoreResult<Vec<Q>> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        let mut rows: Vec<Q> = collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|q| window.contains(q.recorded_at()))
                    .filter(|q| pair.is_none_or(|p| q.pair() == p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(TickerQuote::recorded_at);
        Ok(rows)
    }

    async fn find_latest(&self, collection: &str, pair: Option<&Pair>) -> StoreResult<Option<Q>> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|rows| {
            rows.iter()
                .filter(|q| pair.is_none_or(|p| q.pair() == p))
                .max_by_key(|q| q.recorded_at())
                .cloned()
        }))
    }

    async fn earliest_recorded_at(&self, collection: &str) -> StoreResult<Option<DateTime<Utc>>> {
        validate_collection(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|rows| rows.iter().map(TickerQuote::recorded_at).min()))
    }

    async fn ensure_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        validate_collection(collection)?;
        self.indexes
            .write()
            .await
            .insert((collection.to_string(), field.to_string()));
        Ok(())
    }
}
