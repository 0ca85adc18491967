//! Exchange feed client and ticker adapters for the humboldt quote
//! collector.
//!
//! Each supported exchange gets one adapter that fetches its public
//! ticker endpoint and normalizes the JSON body into that exchange's
//! flat numeric quote struct. All adapters share [`FeedClient`], a
//! bounded-time HTTP client without retry logic: a failed fetch is
//! logged by the caller and retried by the next scheduled poll.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod bitfinex;
mod bitstamp;
mod client;
mod coinbase;
mod exchange;
mod itbit;
mod numeric;

pub use adapter::ExchangeAdapter;
pub use bitfinex::{BitfinexAdapter, BitfinexQuote};
pub use bitstamp::{BitstampAdapter, BitstampQuote};
pub use client::{FeedClient, FeedConfig, FetchError};
pub use coinbase::{CoinbaseAdapter, CoinbaseQuote};
pub use exchange::{Exchange, ExchangeParseError};
pub use itbit::{ItbitAdapter, ItbitQuote};
