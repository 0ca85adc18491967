//! Bitstamp ticker adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, TickerQuote};
use serde::{Deserialize, Serialize};

use crate::numeric::string_as_f64;
use crate::{Exchange, ExchangeAdapter, FeedClient, FetchError};

/// Default Bitstamp API base URL.
const BASE_URL: &str = "https://www.bitstamp.net/api";

/// Wire shape of the Bitstamp `/v2/ticker/{pair}/` response.
#[derive(Debug, Deserialize)]
struct BitstampTicker {
    #[serde(deserialize_with = "string_as_f64")]
    last: f64,
    #[serde(deserialize_with = "string_as_f64")]
    high: f64,
    #[serde(deserialize_with = "string_as_f64")]
    low: f64,
    #[serde(deserialize_with = "string_as_f64")]
    vwap: f64,
    #[serde(deserialize_with = "string_as_f64")]
    volume: f64,
    #[serde(deserialize_with = "string_as_f64")]
    bid: f64,
    #[serde(deserialize_with = "string_as_f64")]
    ask: f64,
    #[serde(deserialize_with = "string_as_f64")]
    open: f64,
    timestamp: Option<String>,
}

/// A normalized Bitstamp quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitstampQuote {
    /// Traded pair.
    pub pair: Pair,
    /// Ingestion timestamp (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Exchange-reported time, when the feed carried one.
    pub exchange_time: Option<DateTime<Utc>>,
    /// Last trade price.
    pub last: f64,
    /// 24h high.
    pub high: f64,
    /// 24h low.
    pub low: f64,
    /// 24h volume-weighted average price.
    pub vwap: f64,
    /// 24h volume.
    pub volume: f64,
    /// Highest bid.
    pub bid: f64,
    /// Lowest ask.
    pub ask: f64,
    /// First price of the day.
    pub open: f64,
    /// Raw samples behind this record (1 for a raw quote).
    #[serde(default)]
    pub samples: u32,
}

impl TickerQuote for BitstampQuote {
    fn pair(&self) -> &Pair {
        &self.pair
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn price(&self) -> f64 {
        self.last
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn sample_count(&self) -> u32 {
        self.samples
    }

    fn mean_seed(pair: Pair, recorded_at: DateTime<Utc>) -> Self {
        Self {
            pair,
            recorded_at,
            exchange_time: None,
            last: 0.0,
            high: 0.0,
            low: 0.0,
            vwap: 0.0,
            volume: 0.0,
            bid: 0.0,
            ask: 0.0,
            open: 0.0,
            samples: 0,
        }
    }

    fn add_scaled(&mut self, sample: &Self, divisor: u32) {
        let n = f64::from(divisor);
        self.last += sample.last / n;
        self.high += sample.high / n;
        self.low += sample.low / n;
        self.vwap += sample.vwap / n;
        self.volume += sample.volume / n;
        self.bid += sample.bid / n;
        self.ask += sample.ask / n;
        self.open += sample.open / n;
    }

    fn set_sample_count(&mut self, samples: u32) {
        self.samples = samples;
    }
}

/// Bitstamp ticker adapter.
#[derive(Debug, Clone)]
pub struct BitstampAdapter {
    client: FeedClient,
    base_url: String,
    pairs: Vec<Pair>,
}

impl BitstampAdapter {
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

    /// Normalizes a wire ticker into a quote record.
    fn normalize(ticker: BitstampTicker, pair: Pair, recorded_at: DateTime<Utc>) -> BitstampQuote {
        let exchange_time = ticker
            .timestamp
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        BitstampQuote {
            pair,
            recorded_at,
            exchange_time,
            last: ticker.last,
            high: ticker.high,
            low: ticker.low,
            vwap: ticker.vwap,
            volume: ticker.volume,
            bid: ticker.bid,
            ask: ticker.ask,
            open: ticker.open,
            samples: 1,
        }
    }
}

#[async_trait]
impl ExchangeAdapter for BitstampAdapter {
    type Quote = BitstampQuote;

    fn exchange(&self) -> Exchange {
        Exchange::Bitstamp
    }

    fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError> {
        let url = format!("{}/v2/ticker/{}/", self.base_url, pair);
        let ticker = self.client.get_json::<BitstampTicker>(&url).await?;
        Ok(Self::normalize(ticker, pair.clone(), Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "last": "68123.45",
        "high": "69000.00",
        "low": "66950.12",
        "vwap": "67980.33",
        "volume": "1543.21827406",
        "bid": "68120.00",
        "ask": "68125.99",
        "open": "67500.00",
        "timestamp": "1717600000"
    }"#;

    #[test]
    fn test_normalize_sample_ticker() {
        let ticker: BitstampTicker = serde_json::from_str(SAMPLE).unwrap();
        let pair = Pair::new("btceur").unwrap();
        let quote = BitstampAdapter::normalize(ticker, pair.clone(), Utc::now());

        assert_eq!(quote.pair, pair);
        assert!((quote.last - 68123.45).abs() < 1e-9);
        assert!((quote.volume - 1543.21827406).abs() < 1e-9);
        assert_eq!(quote.samples, 1);
        assert_eq!(
            quote.exchange_time,
            DateTime::from_timestamp(1_717_600_000, 0)
        );
    }

    #[test]
    fn test_quote_roundtrips_through_json() {
        let ticker: BitstampTicker = serde_json::from_str(SAMPLE).unwrap();
        let quote = BitstampAdapter::normalize(ticker, Pair::new("btceur").unwrap(), Utc::now());
        let restored: BitstampQuote =
            serde_json::from_str(&serde_json::to_string(&quote).unwrap()).unwrap();
        assert_eq!(restored, quote);
    }
}
