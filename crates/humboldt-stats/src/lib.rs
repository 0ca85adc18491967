//! Multi-horizon quote statistics for the humboldt quote collector.
//!
//! [`analyze`] is pure and does no I/O; [`report`] wires it to the
//! store, evaluating every horizon over the same base sequence into one
//! shared result record.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod analyze;
mod service;

pub use analyze::{Horizon, HorizonStats, PriceRange, analyze};
pub use service::{StatisticsReport, current_quote, report};
