//! Pure windowed analytics over an ordered quote sequence.

use chrono::{DateTime, Months, Utc};
use humboldt_types::TickerQuote;
use serde::Serialize;

/// Statistics lookback horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// One year.
    Year1,
    /// Two years.
    Year2,
    /// Five years.
    Year5,
}

impl Horizon {
    /// Returns the lookback length in calendar months.
    #[must_use]
    pub const fn months(&self) -> u32 {
        match self {
            Self::Year1 => 12,
            Self::Year2 => 24,
            Self::Year5 => 60,
        }
    }

    /// Returns the horizon as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Year1 => "1y",
            Self::Year2 => "2y",
            Self::Year5 => "5y",
        }
    }

    /// Returns all horizons, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Year1, Self::Year2, Self::Year5]
    }

    /// Returns the inclusive lower bound of the horizon.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Months::new(self.months())
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The min/max price band of a filtered window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    /// Lowest price in the window.
    pub low: f64,
    /// Highest price in the window.
    pub high: f64,
}

/// Per-horizon statistics.
///
/// All fields are `None` when the filtered window is empty; an empty
/// window is a result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct HorizonStats {
    /// Percentage change between the chronological endpoints.
    pub performance: Option<f64>,
    /// Arithmetic mean of volume.
    pub avg_volume: Option<f64>,
    /// Min/max price band.
    pub range: Option<PriceRange>,
    /// Population standard deviation of price (divisor N).
    pub volatility: Option<f64>,
    /// Number of quotes in the filtered window.
    pub samples: usize,
}

/// Computes one horizon's statistics over an ordered quote sequence.
///
/// Quotes older than `now - horizon` are ignored. `performance` is the
/// plain percentage change between the earliest and latest filtered
/// quotes (ties resolved by position); `volatility` is the price-level
/// population standard deviation. Both are deliberate reproductions of
/// the established result semantics rather than returns-based metrics.
#[must_use]
pub fn analyze<Q: TickerQuote>(quotes: &[Q], horizon: Horizon, now: DateTime<Utc>) -> HorizonStats {
    let cutoff = horizon.cutoff(now);
    let filtered: Vec<&Q> = quotes
        .iter()
        .filter(|q| q.recorded_at() >= cutoff)
        .collect();
    if filtered.is_empty() {
        return HorizonStats::default();
    }

    // min_by_key keeps the first of equal timestamps, max_by_key the
    // last, matching the sequence order the caller provides.
    let first = filtered
        .iter()
        .min_by_key(|q| q.recorded_at())
        .map(|q| q.price())
        .unwrap_or_default();
    let last = filtered
        .iter()
        .max_by_key(|q| q.recorded_at())
        .map(|q| q.price())
        .unwrap_or_default();

    let n = filtered.len() as f64;
    let performance = (first != 0.0).then(|| (last - first) / first * 100.0);
    let avg_volume = filtered.iter().map(|q| q.volume()).sum::<f64>() / n;
    let low = filtered.iter().map(|q| q.price()).fold(f64::INFINITY, f64::min);
    let high = filtered
        .iter()
        .map(|q| q.price())
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_price = filtered.iter().map(|q| q.price()).sum::<f64>() / n;
    let variance = filtered
        .iter()
        .map(|q| {
            let deviation = q.price() - mean_price;
            deviation * deviation
        })
        .sum::<f64>()
        / n;

    HorizonStats {
        performance,
        avg_volume: Some(avg_volume),
        range: Some(PriceRange { low, high }),
        volatility: Some(variance.sqrt()),
        samples: filtered.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeDelta;
    use humboldt_exchanges::BitfinexQuote;
    use humboldt_types::Pair;

    fn quote(price: f64, age: TimeDelta, now: DateTime<Utc>) -> BitfinexQuote {
        let mut q = BitfinexQuote::mean_seed(Pair::new("btcusd").unwrap(), now - age);
        q.last_price = price;
        q.volume = price;
        q.samples = 1;
        q
    }

    fn months(n: u32, now: DateTime<Utc>) -> TimeDelta {
        now - (now - Months::new(n))
    }

    /// Prices 10..90 with ages 4y, 15mo, 11mo, 5mo, 2mo, and four at
    /// ten days; volume equals price throughout.
    fn scenario(now: DateTime<Utc>) -> Vec<BitfinexQuote> {
        vec![
            quote(10.0, months(48, now), now),
            quote(20.0, months(15, now), now),
            quote(30.0, months(11, now), now),
            quote(40.0, months(5, now), now),
            quote(50.0, months(2, now), now),
            quote(60.0, TimeDelta::days(10), now),
            quote(70.0, TimeDelta::days(10), now),
            quote(80.0, TimeDelta::days(10), now),
            quote(90.0, TimeDelta::days(10), now),
        ]
    }

    #[test]
    fn test_one_year_horizon() {
        let now = Utc::now();
        let stats = analyze(&scenario(now), Horizon::Year1, now);

        assert_eq!(stats.samples, 7);
        assert_relative_eq!(stats.performance.unwrap(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_volume.unwrap(), 60.0, epsilon = 1e-9);
        let range = stats.range.unwrap();
        assert_relative_eq!(range.low, 30.0, epsilon = 1e-9);
        assert_relative_eq!(range.high, 90.0, epsilon = 1e-9);
        assert_relative_eq!(stats.volatility.unwrap(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_year_horizon() {
        let now = Utc::now();
        let stats = analyze(&scenario(now), Horizon::Year2, now);

        assert_eq!(stats.samples, 8);
        assert_relative_eq!(stats.performance.unwrap(), 350.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_volume.unwrap(), 55.0, epsilon = 1e-9);
        let range = stats.range.unwrap();
        assert_relative_eq!(range.low, 20.0, epsilon = 1e-9);
        assert_relative_eq!(range.high, 90.0, epsilon = 1e-9);
        assert_relative_eq!(
            stats.volatility.unwrap(),
            22.9128784747792,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_five_year_horizon() {
        let now = Utc::now();
        let stats = analyze(&scenario(now), Horizon::Year5, now);

        assert_eq!(stats.samples, 9);
        assert_relative_eq!(stats.performance.unwrap(), 800.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_volume.unwrap(), 50.0, epsilon = 1e-9);
        let range = stats.range.unwrap();
        assert_relative_eq!(range.low, 10.0, epsilon = 1e-9);
        assert_relative_eq!(range.high, 90.0, epsilon = 1e-9);
        assert_relative_eq!(
            stats.volatility.unwrap(),
            25.81988897471611,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_empty_window_yields_none() {
        let now = Utc::now();
        let old = vec![quote(10.0, months(72, now), now)];
        let stats = analyze(&old, Horizon::Year1, now);

        assert_eq!(stats, HorizonStats::default());
        assert_eq!(stats.samples, 0);
        assert!(stats.performance.is_none());
        assert!(stats.volatility.is_none());
    }

    #[test]
    fn test_zero_first_price_has_no_performance() {
        let now = Utc::now();
        let quotes = vec![
            quote(0.0, TimeDelta::days(20), now),
            quote(50.0, TimeDelta::days(10), now),
        ];
        let stats = analyze(&quotes, Horizon::Year1, now);

        assert!(stats.performance.is_none());
        assert!(stats.volatility.is_some());
    }

    #[test]
    fn test_equal_timestamps_keep_sequence_order() {
        let now = Utc::now();
        let age = TimeDelta::days(3);
        let quotes = vec![quote(10.0, age, now), quote(40.0, age, now)];
        let stats = analyze(&quotes, Horizon::Year1, now);

        // First position wins "first", last position wins "last".
        assert_relative_eq!(stats.performance.unwrap(), 300.0, epsilon = 1e-9);
    }
}
