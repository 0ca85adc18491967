//! Per-pair grouping and zero-seeded fold means.

use humboldt_types::{Granularity, Pair, TickerQuote, TimeWindow};
use std::collections::HashMap;

/// Minimum samples a bucket needs before a rollup row is emitted.
///
/// Sparser buckets are skipped entirely: no row, no placeholder.
pub const MIN_BUCKET_SAMPLES: usize = 3;

/// Folds a bucket of samples into its per-field arithmetic mean.
///
/// Starts from a zero-valued seed and adds `sample.field / N` per step;
/// after all N steps every field holds `(Σ field) / N`. Equivalent to
/// sum-then-divide, but expressed as an associative streaming step so a
/// bucket never needs a second buffer.
#[must_use]
pub fn fold_mean<Q: TickerQuote>(
    pair: &Pair,
    window: TimeWindow,
    samples: &[&Q],
) -> Q {
    let divisor = samples.len() as u32;
    let mut mean = samples.iter().fold(
        Q::mean_seed(pair.clone(), window.begin()),
        |mut acc, sample| {
            acc.add_scaled(sample, divisor);
            acc
        },
    );
    mean.set_sample_count(divisor);
    mean
}

/// Computes the rollup rows for one day window.
///
/// Daily granularity folds each pair's whole day; hourly granularity
/// folds each of the day's 24 one-hour slices per pair. Buckets below
/// [`MIN_BUCKET_SAMPLES`] emit nothing. Rows come back ordered by
/// (pair, window begin) so bulk writes are deterministic.
#[must_use]
pub fn aggregate_window<Q: TickerQuote>(
    granularity: Granularity,
    window: TimeWindow,
    quotes: Vec<Q>,
) -> Vec<Q> {
    let mut rows = Vec::new();
    for (pair, group) in group_by_pair(quotes) {
        match granularity {
            Granularity::Day => {
                let bucket: Vec<&Q> = group
                    .iter()
                    .filter(|q| window.contains(q.recorded_at()))
                    .collect();
                if bucket.len() >= MIN_BUCKET_SAMPLES {
                    rows.push(fold_mean(&pair, window, &bucket));
                }
            }
            Granularity::Hour => {
                for slice in window.hours() {
                    let bucket: Vec<&Q> = group
                        .iter()
                        .filter(|q| slice.contains(q.recorded_at()))
                        .collect();
                    if bucket.len() >= MIN_BUCKET_SAMPLES {
                        rows.push(fold_mean(&pair, slice, &bucket));
                    }
                }
            }
        }
    }
    rows.sort_by(|a, b| {
        a.pair()
            .as_str()
            .cmp(b.pair().as_str())
            .then(a.recorded_at().cmp(&b.recorded_at()))
    });
    rows
}

/// Groups quotes by pair, preserving arrival order within a group.
fn group_by_pair<Q: TickerQuote>(quotes: Vec<Q>) -> HashMap<Pair, Vec<Q>> {
    let mut groups: HashMap<Pair, Vec<Q>> = HashMap::new();
    for quote in quotes {
        groups.entry(quote.pair().clone()).or_default().push(quote);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use humboldt_exchanges::CoinbaseQuote;

    fn window() -> TimeWindow {
        TimeWindow::day_of(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn quote(pair: &str, hour: u32, minute: u32, rate: f64) -> CoinbaseQuote {
        CoinbaseQuote {
            pair: Pair::new(pair).unwrap(),
            recorded_at: Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap(),
            rate,
            samples: 1,
        }
    }

    #[test]
    fn test_fold_mean_matches_sum_then_divide() {
        let rates = [3.25, 9.5, 12.0, 41.75, 0.5, 7.125, 88.0];
        let quotes: Vec<CoinbaseQuote> = rates
            .iter()
            .enumerate()
            .map(|(i, &r)| quote("btceur", 0, i as u32, r))
            .collect();
        let bucket: Vec<&CoinbaseQuote> = quotes.iter().collect();

        let folded = fold_mean(&Pair::new("btceur").unwrap(), window(), &bucket);
        let expected: f64 = rates.iter().sum::<f64>() / rates.len() as f64;

        assert!((folded.rate - expected).abs() < 1e-9);
        assert_eq!(folded.samples, rates.len() as u32);
        assert_eq!(folded.recorded_at, window().begin());
    }

    #[test]
    fn test_daily_skips_sparse_buckets() {
        // Two samples for btceur: below threshold, no row.
        let quotes = vec![quote("btceur", 1, 0, 10.0), quote("btceur", 2, 0, 20.0)];
        let rows = aggregate_window(Granularity::Day, window(), quotes);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_daily_one_row_per_qualifying_pair() {
        let quotes = vec![
            quote("btceur", 1, 0, 10.0),
            quote("btceur", 2, 0, 20.0),
            quote("btceur", 3, 0, 30.0),
            quote("btcusd", 1, 0, 100.0),
            quote("btcusd", 2, 0, 200.0),
        ];
        let rows = aggregate_window(Granularity::Day, window(), quotes);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pair.as_str(), "btceur");
        assert!((rows[0].rate - 20.0).abs() < 1e-9);
        assert_eq!(rows[0].samples, 3);
    }

    #[test]
    fn test_hourly_folds_each_qualifying_slice() {
        // Hour 1 has three samples, hour 2 only two.
        let quotes = vec![
            quote("btceur", 1, 0, 10.0),
            quote("btceur", 1, 20, 20.0),
            quote("btceur", 1, 40, 30.0),
            quote("btceur", 2, 0, 40.0),
            quote("btceur", 2, 30, 50.0),
        ];
        let rows = aggregate_window(Granularity::Hour, window(), quotes);

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].recorded_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()
        );
        assert!((rows[0].rate - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_ordered_by_pair_then_time() {
        let mut quotes = Vec::new();
        for hour in [3, 1] {
            for minute in [0, 15, 30] {
                quotes.push(quote("btcusd", hour, minute, 1.0));
                quotes.push(quote("btceur", hour, minute, 2.0));
            }
        }
        let rows = aggregate_window(Granularity::Hour, window(), quotes);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].pair.as_str(), "btceur");
        assert!(rows[0].recorded_at < rows[1].recorded_at);
        assert_eq!(rows[2].pair.as_str(), "btcusd");
    }
}
