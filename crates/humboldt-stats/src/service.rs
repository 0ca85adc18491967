//! Report assembly over the stored series.

use chrono::{DateTime, Utc};
use humboldt_store::{QuoteStore, SeriesCollections, StoreResult};
use humboldt_types::{Pair, QuoteDocument, TimeWindow};
use serde::Serialize;

use crate::{Horizon, HorizonStats, analyze};

/// One pair's statistics across all horizons.
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    /// The pair the report covers.
    pub pair: Pair,
    /// When the report was computed.
    pub generated_at: DateTime<Utc>,
    /// One-year statistics.
    pub year1: HorizonStats,
    /// Two-year statistics.
    pub year2: HorizonStats,
    /// Five-year statistics.
    pub year5: HorizonStats,
}

impl std::fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.pair)?;
        for (label, stats) in [
            (Horizon::Year1, &self.year1),
            (Horizon::Year2, &self.year2),
            (Horizon::Year5, &self.year5),
        ] {
            write!(f, "  {label}: ")?;
            match stats.range {
                Some(range) => writeln!(
                    f,
                    "performance {:+.2}%, avg volume {:.2}, range [{:.2}, {:.2}], volatility {:.4} ({} samples)",
                    stats.performance.unwrap_or(0.0),
                    stats.avg_volume.unwrap_or(0.0),
                    range.low,
                    range.high,
                    stats.volatility.unwrap_or(0.0),
                    stats.samples,
                )?,
                None => writeln!(f, "no samples")?,
            }
        }
        Ok(())
    }
}

/// Builds a pair's multi-horizon report from its daily rollup series.
///
/// All horizons are evaluated over the same base sequence, loaded once
/// for the widest horizon.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub async fn report<Q, S>(
    store: &S,
    collections: &SeriesCollections,
    pair: &Pair,
    now: DateTime<Utc>,
) -> StoreResult<StatisticsReport>
where
    Q: QuoteDocument,
    S: QuoteStore<Q>,
{
    let cutoff = Horizon::Year5.cutoff(now);
    let quotes: Vec<Q> = match TimeWindow::new(cutoff, now) {
        Ok(window) => {
            store
                .find_range(&collections.daily, window, Some(pair))
                .await?
        }
        Err(_) => Vec::new(),
    };
    Ok(StatisticsReport {
        pair: pair.clone(),
        generated_at: now,
        year1: analyze(&quotes, Horizon::Year1, now),
        year2: analyze(&quotes, Horizon::Year2, now),
        year5: analyze(&quotes, Horizon::Year5, now),
    })
}

/// Looks up the most recent raw quote for a pair.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub async fn current_quote<Q, S>(
    store: &S,
    collections: &SeriesCollections,
    pair: &Pair,
) -> StoreResult<Option<Q>>
where
    Q: QuoteDocument,
    S: QuoteStore<Q>,
{
    store.find_latest(&collections.raw, Some(pair)).await
}
