//! Coinbase exchange-rates adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, TickerQuote};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Exchange, ExchangeAdapter, FeedClient, FetchError};

/// Default Coinbase API base URL.
const BASE_URL: &str = "https://api.coinbase.com/v2";

/// Base currency whose rates the adapter polls.
const BASE_CURRENCY: &str = "BTC";

/// Wire shape of the Coinbase `/exchange-rates` response.
#[derive(Debug, Deserialize)]
struct RatesEnvelope {
    data: RatesData,
}

#[derive(Debug, Deserialize)]
struct RatesData {
    currency: String,
    rates: HashMap<String, String>,
}

/// A normalized Coinbase quote.
///
/// The exchange-rates feed quotes one rate per currency and carries no
/// bid/ask or volume; the flat record is the rate for the pair's quote
/// currency, and volume reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseQuote {
    /// Traded pair (e.g. `btceur` for the EUR rate of BTC).
    pub pair: Pair,
    /// Ingestion timestamp (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Units of the quote currency per one BTC.
    pub rate: f64,
    /// Raw samples behind this record (1 for a raw quote).
    #[serde(default)]
    pub samples: u32,
}

impl TickerQuote for CoinbaseQuote {
    fn pair(&self) -> &Pair {
        &self.pair
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn price(&self) -> f64 {
        self.rate
    }

    fn volume(&self) -> f64 {
        0.0
    }

    fn sample_count(&self) -> u32 {
        self.samples
    }

    fn mean_seed(pair: Pair, recorded_at: DateTime<Utc>) -> Self {
        Self {
            pair,
            recorded_at,
            rate: 0.0,
            samples: 0,
        }
    }

    fn add_scaled(&mut self, sample: &Self, divisor: u32) {
        self.rate += sample.rate / f64::from(divisor);
    }

    fn set_sample_count(&mut self, samples: u32) {
        self.samples = samples;
    }
}

/// Coinbase exchange-rates adapter.
///
/// Pairs must be spelled `btc<quote-currency>` (e.g. `btcusd`, `btceur`);
/// the adapter extracts the matching rate from the BTC rates table.
#[derive(Debug, Clone)]
pub struct CoinbaseAdapter {
    client: FeedClient,
    base_url: String,
    pairs: Vec<Pair>,
}

impl CoinbaseAdapter {
    /// Creates an adapter polling the given pairs.
    #[must_use]
    pub fn new(client: FeedClient, pairs: Vec<Pair>) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            pairs,
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Maps a pair to the rate-table currency code (`btceur` → `EUR`).
    fn rate_currency(pair: &Pair) -> Result<String, FetchError> {
        pair.as_str()
            .strip_prefix("btc")
            .filter(|quote| !quote.is_empty())
            .map(str::to_uppercase)
            .ok_or_else(|| FetchError::UnsupportedPair(pair.to_string()))
    }

    /// Extracts the pair's rate from a rates envelope.
    fn normalize(
        envelope: &RatesEnvelope,
        pair: Pair,
        recorded_at: DateTime<Utc>,
    ) -> Result<CoinbaseQuote, FetchError> {
        if envelope.data.currency != BASE_CURRENCY {
            return Err(FetchError::Decode(format!(
                "expected {BASE_CURRENCY} rates, got {}",
                envelope.data.currency
            )));
        }
        let currency = Self::rate_currency(&pair)?;
        let rate = envelope
            .data
            .rates
            .get(&currency)
            .ok_or_else(|| FetchError::Decode(format!("no {currency} rate in response")))?
            .parse::<f64>()
            .map_err(|_| FetchError::Decode(format!("invalid {currency} rate")))?;
        Ok(CoinbaseQuote {
            pair,
            recorded_at,
            rate,
            samples: 1,
        })
    }
}

#[async_trait]
impl ExchangeAdapter for CoinbaseAdapter {
    type Quote = CoinbaseQuote;

    fn exchange(&self) -> Exchange {
        Exchange::Coinbase
    }

    fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError> {
        let url = format!("{}/exchange-rates?currency={}", self.base_url, BASE_CURRENCY);
        let envelope = self.client.get_json::<RatesEnvelope>(&url).await?;
        Self::normalize(&envelope, pair.clone(), Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": {
            "currency": "BTC",
            "rates": {
                "USD": "68123.45",
                "EUR": "62650.10",
                "GBP": "53411.92"
            }
        }
    }"#;

    #[test]
    fn test_rate_currency_mapping() {
        assert_eq!(
            CoinbaseAdapter::rate_currency(&Pair::new("btceur").unwrap()).unwrap(),
            "EUR"
        );
        assert!(CoinbaseAdapter::rate_currency(&Pair::new("etheur").unwrap()).is_err());
        assert!(CoinbaseAdapter::rate_currency(&Pair::new("btc").unwrap()).is_err());
    }

    #[test]
    fn test_normalize_extracts_rate() {
        let envelope: RatesEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let quote =
            CoinbaseAdapter::normalize(&envelope, Pair::new("btceur").unwrap(), Utc::now())
                .unwrap();
        assert!((quote.rate - 62650.10).abs() < 1e-9);
        assert!((quote.price() - 62650.10).abs() < 1e-9);
        assert_eq!(quote.volume(), 0.0);
    }

    #[test]
    fn test_normalize_missing_rate() {
        let envelope: RatesEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let err = CoinbaseAdapter::normalize(&envelope, Pair::new("btcjpy").unwrap(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
