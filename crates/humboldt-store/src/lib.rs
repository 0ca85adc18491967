//! Quote document store for the humboldt quote collector.
//!
//! The [`QuoteStore`] trait is the only storage seam the engines see.
//! Writers never read-modify-write: raw quotes are append-only single
//! inserts, rollup rows are write-once bulk inserts under the cluster
//! lock, so no transactions are assumed across calls.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod history;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod store;

pub use history::{HistoryRange, HistoryRangeParseError, SeriesCollections, SeriesSource, history_quotes};
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use store::{QuoteStore, StoreError, StoreResult, validate_collection};
