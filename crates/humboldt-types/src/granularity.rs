//! Rollup bucket granularity definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Granularity of a rollup bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One-hour buckets.
    Hour,
    /// One-day buckets.
    Day,
}

impl Granularity {
    /// Returns the bucket duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Hour => 3600,
            Self::Day => 86400,
        }
    }

    /// Returns the granularity as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Returns both granularities.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Hour, Self::Day]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" | "hourly" | "h1" | "1h" => Ok(Self::Hour),
            "day" | "daily" | "d1" | "1d" => Ok(Self::Day),
            _ => Err(GranularityParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid granularity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid granularity '{0}', expected 'hour' or 'day'")]
pub struct GranularityParseError(String);
