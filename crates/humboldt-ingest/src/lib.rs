//! Single-flight ingestion coordinator for the humboldt quote collector.
//!
//! Each scheduled tick produces at most one outstanding fetch+store per
//! (exchange, pair). The replace-and-cancel discipline is the system's
//! primary backpressure: slow upstreams never build a backlog of stale
//! requests, and a cancelled fetch is never persisted.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coordinator;
mod scheduler;

pub use coordinator::IngestCoordinator;
pub use scheduler::PollScheduler;

use std::time::Duration;

/// Default bound on a single raw-quote insert.
pub const DEFAULT_INSERT_TIMEOUT: Duration = Duration::from_secs(5);
