//! Hourly/daily rollup engine for the humboldt quote collector.
//!
//! The engine scans raw quotes window-by-window and writes per-pair mean
//! aggregates, exactly once across a cluster: concurrent runs for the
//! same (exchange, granularity) key are prevented by the run lock, not
//! by the data model, so the lock discipline is load-bearing.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compute;
mod engine;
mod mean;

pub use compute::{ComputeError, ComputePool, DEFAULT_COMPUTE_PERMITS};
pub use engine::{RollupConfig, RollupEngine, RollupError, RollupOutcome};
pub use mean::{MIN_BUCKET_SAMPLES, aggregate_window, fold_mean};
