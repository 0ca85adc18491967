//! PostgreSQL JSONB quote store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, QuoteDocument, TickerQuote, TimeWindow};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{QueryBuilder, Row};
use std::time::Duration;

use crate::{QuoteStore, StoreError, StoreResult, validate_collection};

/// PostgreSQL implementation of [`QuoteStore`].
///
/// Each collection is a table holding the full quote as a JSONB
/// document, with `pair` and `recorded_at` extracted into columns so
/// the range queries and the secondary index stay cheap.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(backend)?;
        Ok(Self { pool })
    }

    /// Creates the table behind a collection if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn ensure_collection(&self, collection: &str) -> StoreResult<()> {
        let collection = validate_collection(collection)?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {collection} (
                id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                pair TEXT NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL,
                doc JSONB NOT NULL
            )"
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// Maps a sqlx error onto the store error type.
fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl<Q: QuoteDocument> QuoteStore<Q> for PgStore {
    async fn insert_one(&self, collection: &str, quote: &Q) -> StoreResult<()> {
        let collection = validate_collection(collection)?;
        let doc = serde_json::to_value(quote)?;
        let sql = format!("INSERT INTO {collection} (pair, recorded_at, doc) VALUES ($1, $2, $3)");
        sqlx::query(&sql)
            .bind(quote.pair().as_str())
            .bind(quote.recorded_at())
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn insert_many(&self, collection: &str, quotes: &[Q]) -> StoreResult<()> {
        let collection = validate_collection(collection)?;
        if quotes.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(quotes.len());
        for quote in quotes {
            rows.push((
                quote.pair().as_str().to_string(),
                quote.recorded_at(),
                serde_json::to_value(quote)?,
            ));
        }
        let mut builder =
            QueryBuilder::new(format!("INSERT INTO {collection} (pair, recorded_at, doc) "));
        builder.push_values(rows, |mut b, (pair, recorded_at, doc)| {
            b.push_bind(pair).push_bind(recorded_at).push_bind(doc);
        });
        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_range(
        &self,
        collection: &str,
        window: TimeWindow,
        pair: Option<&Pair>,
    ) -> StoreResult<Vec<Q>> {
        let collection = validate_collection(collection)?;
        let sql = if pair.is_some() {
            format!(
                "SELECT doc FROM {collection} \
                 WHERE recorded_at >= $1 AND recorded_at < $2 AND pair = $3 \
                 ORDER BY recorded_at ASC"
            )
        } else {
            format!(
                "SELECT doc FROM {collection} \
                 WHERE recorded_at >= $1 AND recorded_at < $2 \
                 ORDER BY recorded_at ASC"
            )
        };
        let mut query = sqlx::query(&sql).bind(window.begin()).bind(window.end());
        if let Some(pair) = pair {
            query = query.bind(pair.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter()
            .map(|row| {
                let doc: serde_json::Value = row.try_get("doc").map_err(backend)?;
                serde_json::from_value(doc).map_err(StoreError::from)
            })
            .collect()
    }

    async fn find_latest(&self, collection: &str, pair: Option<&Pair>) -> StoreResult<Option<Q>> {
        let collection = validate_collection(collection)?;
        let sql = if pair.is_some() {
            format!(
                "SELECT doc FROM {collection} WHERE pair = $1 \
                 ORDER BY recorded_at DESC LIMIT 1"
            )
        } else {
            format!("SELECT doc FROM {collection} ORDER BY recorded_at DESC LIMIT 1")
        };
        let mut query = sqlx::query(&sql);
        if let Some(pair) = pair {
            query = query.bind(pair.as_str());
        }
        let row = query.fetch_optional(&self.pool).await.map_err(backend)?;
        row.map(|row| {
            let doc: serde_json::Value = row.try_get("doc").map_err(backend)?;
            serde_json::from_value(doc).map_err(StoreError::from)
        })
        .transpose()
    }

    async fn earliest_recorded_at(&self, collection: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let collection = validate_collection(collection)?;
        let sql = format!("SELECT MIN(recorded_at) FROM {collection}");
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }

    async fn ensure_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        self.ensure_collection(collection).await?;
        let collection = validate_collection(collection)?;
        let field = validate_collection(field)?;
        let ddl =
            format!("CREATE INDEX IF NOT EXISTS idx_{collection}_{field} ON {collection} ({field})");
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
