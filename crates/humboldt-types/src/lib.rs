//! Core types for the humboldt quote collector.
//!
//! This crate provides the fundamental data structures used throughout
//! humboldt:
//!
//! - [`Pair`] - A traded instrument symbol (e.g. `btceur`)
//! - [`Granularity`] - Rollup bucket granularity (hour or day)
//! - [`TimeWindow`] - Immutable half-open time interval
//! - [`DayWindows`] - Lazy, finite generator of one-day windows
//! - [`TickerQuote`] - Capability trait a quote record exposes to the
//!   rollup and statistics engines

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod granularity;
mod pair;
mod quote;
mod window;

pub use granularity::{Granularity, GranularityParseError};
pub use pair::{Pair, PairParseError};
pub use quote::{QuoteDocument, TickerQuote};
pub use window::{DayWindows, HourSlices, TimeWindow, WindowError, start_of_day};
