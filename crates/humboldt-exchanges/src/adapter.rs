//! The exchange adapter contract.

use async_trait::async_trait;
use humboldt_types::{Pair, QuoteDocument};

use crate::{Exchange, FetchError};

/// Fetches and normalizes one exchange's ticker.
///
/// An adapter owns its exchange's URL scheme, pair-name mapping, and
/// quote shape. It carries no retry policy: a failed fetch surfaces as a
/// [`FetchError`] and the next scheduled poll is the retry.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync + 'static {
    /// The flat numeric quote record this exchange produces.
    type Quote: QuoteDocument;

    /// The exchange this adapter serves.
    fn exchange(&self) -> Exchange;

    /// The pairs this adapter is configured to poll.
    fn pairs(&self) -> &[Pair];

    /// Fetches the current ticker for a pair, normalized with the pair
    /// and ingestion timestamp attached.
    async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError>;
}
