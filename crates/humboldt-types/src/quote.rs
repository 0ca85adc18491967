//! Quote capability traits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Pair;

/// Capabilities a quote record exposes to the rollup and statistics
/// engines.
///
/// Each exchange has its own flat numeric quote struct; implementing this
/// trait is what lets one generic engine aggregate all of them. The same
/// struct is stored both as a raw quote and as a rollup row (with every
/// numeric field averaged and [`sample_count`](Self::sample_count) set to
/// the bucket size).
pub trait TickerQuote: Clone + Send + Sync + 'static {
    /// The traded pair this quote belongs to.
    fn pair(&self) -> &Pair;

    /// The ingestion timestamp (UTC). Raw quotes get it at fetch time;
    /// rollup rows carry their window begin.
    fn recorded_at(&self) -> DateTime<Utc>;

    /// The representative price, used by the statistics engine.
    fn price(&self) -> f64;

    /// The traded volume, used by the statistics engine. Feeds without a
    /// volume figure report 0.
    fn volume(&self) -> f64;

    /// Number of raw samples behind this record: 1 for a raw quote, the
    /// bucket size for a rollup row.
    fn sample_count(&self) -> u32;

    /// A zero-valued record to seed a mean fold with.
    fn mean_seed(pair: Pair, recorded_at: DateTime<Utc>) -> Self;

    /// One mean-fold step: adds `sample.field / divisor` to every numeric
    /// field of `self`. After folding all `divisor` samples of a bucket
    /// into a [`mean_seed`](Self::mean_seed), each field holds the
    /// bucket's arithmetic mean.
    fn add_scaled(&mut self, sample: &Self, divisor: u32);

    /// Sets the sample count on a folded record.
    fn set_sample_count(&mut self, samples: u32);
}

/// A quote record that can live in a document store.
pub trait QuoteDocument: TickerQuote + Serialize + DeserializeOwned {}

impl<T> QuoteDocument for T where T: TickerQuote + Serialize + DeserializeOwned {}
