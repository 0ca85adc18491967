//! History-range queries over the raw and rollup series.
//!
//! Short lookbacks read raw quotes; anything longer reads the rollup
//! collections, which replace raw samples for long-range queries.

use chrono::{DateTime, Months, TimeDelta, Utc};
use humboldt_types::{Pair, QuoteDocument, TimeWindow, start_of_day};
use std::str::FromStr;

use crate::{QuoteStore, StoreResult};

/// The raw/hourly/daily collection names of one exchange's series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCollections {
    /// Collection holding raw quotes.
    pub raw: String,
    /// Collection holding hourly rollups.
    pub hourly: String,
    /// Collection holding daily rollups.
    pub daily: String,
}

impl SeriesCollections {
    /// Creates a series descriptor from the three collection names.
    pub fn new(
        raw: impl Into<String>,
        hourly: impl Into<String>,
        daily: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            hourly: hourly.into(),
            daily: daily.into(),
        }
    }

    /// Returns the collection backing the given source.
    #[must_use]
    pub fn for_source(&self, source: SeriesSource) -> &str {
        match source {
            SeriesSource::Raw => &self.raw,
            SeriesSource::Hourly => &self.hourly,
            SeriesSource::Daily => &self.daily,
        }
    }
}

/// Which series a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// Raw quotes.
    Raw,
    /// Hourly rollups.
    Hourly,
    /// Daily rollups.
    Daily,
}

/// Supported history lookback ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    /// Since midnight (raw quotes).
    Today,
    /// Last 7 days (hourly rollups).
    Week,
    /// Last 30 days (hourly rollups).
    Month,
    /// Last 90 days (daily rollups).
    Quarter,
    /// Last 6 calendar months (daily rollups).
    HalfYear,
    /// Last 12 calendar months (daily rollups).
    Year,
}

impl HistoryRange {
    /// Returns the series this range reads from.
    #[must_use]
    pub const fn source(&self) -> SeriesSource {
        match self {
            Self::Today => SeriesSource::Raw,
            Self::Week | Self::Month => SeriesSource::Hourly,
            Self::Quarter | Self::HalfYear | Self::Year => SeriesSource::Daily,
        }
    }

    /// Returns the inclusive lower bound of the range.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Today => start_of_day(now),
            Self::Week => now - TimeDelta::days(7),
            Self::Month => now - TimeDelta::days(30),
            Self::Quarter => now - TimeDelta::days(90),
            Self::HalfYear => now - Months::new(6),
            Self::Year => now - Months::new(12),
        }
    }

    /// Returns the range as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "7days",
            Self::Month => "30days",
            Self::Quarter => "90days",
            Self::HalfYear => "6months",
            Self::Year => "1year",
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = HistoryRangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "7days" | "week" => Ok(Self::Week),
            "30days" | "month" => Ok(Self::Month),
            "90days" | "quarter" => Ok(Self::Quarter),
            "6months" | "halfyear" => Ok(Self::HalfYear),
            "1year" | "year" => Ok(Self::Year),
            _ => Err(HistoryRangeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid history range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid history range '{0}', expected one of: today, 7days, 30days, 90days, 6months, 1year"
)]
pub struct HistoryRangeParseError(String);

/// Loads a pair's quotes for a history range, reading the series the
/// range calls for.
///
/// # Errors
///
/// Returns an error if the underlying store query fails.
pub async fn history_quotes<Q, S>(
    store: &S,
    collections: &SeriesCollections,
    range: HistoryRange,
    pair: &Pair,
    now: DateTime<Utc>,
) -> StoreResult<Vec<Q>>
where
    Q: QuoteDocument,
    S: QuoteStore<Q>,
{
    let cutoff = range.cutoff(now);
    let window = match TimeWindow::new(cutoff, now) {
        Ok(window) => window,
        // A cutoff at or after now means an empty range, not a failure.
        Err(_) => return Ok(Vec::new()),
    };
    store
        .find_range(collections.for_source(range.source()), window, Some(pair))
        .await
}
