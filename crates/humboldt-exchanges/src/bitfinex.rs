//! Bitfinex ticker adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, TickerQuote};
use serde::{Deserialize, Serialize};

use crate::numeric::string_as_f64;
use crate::{Exchange, ExchangeAdapter, FeedClient, FetchError};

/// Default Bitfinex API base URL.
const BASE_URL: &str = "https://api.bitfinex.com";

/// Wire shape of the Bitfinex `/v1/pubticker/{pair}` response.
#[derive(Debug, Deserialize)]
struct BitfinexTicker {
    #[serde(deserialize_with = "string_as_f64")]
    mid: f64,
    #[serde(deserialize_with = "string_as_f64")]
    bid: f64,
    #[serde(deserialize_with = "string_as_f64")]
    ask: f64,
    #[serde(deserialize_with = "string_as_f64")]
    last_price: f64,
    #[serde(deserialize_with = "string_as_f64")]
    low: f64,
    #[serde(deserialize_with = "string_as_f64")]
    high: f64,
    #[serde(deserialize_with = "string_as_f64")]
    volume: f64,
    timestamp: Option<String>,
}

/// A normalized Bitfinex quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitfinexQuote {
    /// Traded pair.
    pub pair: Pair,
    /// Ingestion timestamp (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Exchange-reported time, when the feed carried one.
    pub exchange_time: Option<DateTime<Utc>>,
    /// Midpoint of bid and ask.
    pub mid: f64,
    /// Highest bid.
    pub bid: f64,
    /// Lowest ask.
    pub ask: f64,
    /// Last trade price.
    pub last_price: f64,
    /// 24h low.
    pub low: f64,
    /// 24h high.
    pub high: f64,
    /// 24h volume.
    pub volume: f64,
    /// Raw samples behind this record (1 for a raw quote).
    #[serde(default)]
    pub samples: u32,
}

impl TickerQuote for BitfinexQuote {
    fn pair(&self) -> &Pair {
        &self.pair
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn price(&self) -> f64 {
        self.last_price
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
            mid: 0.0,
            bid: 0.0,
            ask: 0.0,
            last_price: 0.0,
            low: 0.0,
            high: 0.0,
            volume: 0.0,
            samples: 0,
        }
    }

    fn add_scaled(&mut self, sample: &Self, divisor: u32) {
        let n = f64::from(divisor);
        self.mid += sample.mid / n;
        self.bid += sample.bid / n;
        self.ask += sample.ask / n;
        self.last_price += sample.last_price / n;
        self.low += sample.low / n;
        self.high += sample.high / n;
        self.volume += sample.volume / n;
    }

    fn set_sample_count(&mut self, samples: u32) {
        self.samples = samples;
    }
}

/// Bitfinex ticker adapter.
#[derive(Debug, Clone)]
pub struct BitfinexAdapter {
    client: FeedClient,
    base_url: String,
    pairs: Vec<Pair>,
}

impl BitfinexAdapter {
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
    fn normalize(ticker: BitfinexTicker, pair: Pair, recorded_at: DateTime<Utc>) -> BitfinexQuote {
        // Bitfinex reports fractional epoch seconds ("1717600000.1234").
        let exchange_time = ticker
            .timestamp
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0) as i64));
        BitfinexQuote {
            pair,
            recorded_at,
            exchange_time,
            mid: ticker.mid,
            bid: ticker.bid,
            ask: ticker.ask,
            last_price: ticker.last_price,
            low: ticker.low,
            high: ticker.high,
            volume: ticker.volume,
            samples: 1,
        }
    }
}

#[async_trait]
impl ExchangeAdapter for BitfinexAdapter {
    type Quote = BitfinexQuote;

    fn exchange(&self) -> Exchange {
        Exchange::Bitfinex
    }

    fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError> {
        let url = format!("{}/v1/pubticker/{}", self.base_url, pair);
        let ticker = self.client.get_json::<BitfinexTicker>(&url).await?;
        Ok(Self::normalize(ticker, pair.clone(), Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "mid": "68124.725",
        "bid": "68124.0",
        "ask": "68125.45",
        "last_price": "68123.0",
        "low": "66950.0",
        "high": "69001.5",
        "volume": "8123.55518954",
        "timestamp": "1717600000.5128"
    }"#;

    #[test]
    fn test_normalize_sample_ticker() {
        let ticker: BitfinexTicker = serde_json::from_str(SAMPLE).unwrap();
        let pair = Pair::new("btcusd").unwrap();
        let quote = BitfinexAdapter::normalize(ticker, pair.clone(), Utc::now());

        assert_eq!(quote.pair, pair);
        assert!((quote.mid - 68124.725).abs() < 1e-9);
        assert!((quote.last_price - 68123.0).abs() < 1e-9);
        assert_eq!(
            quote.exchange_time,
            DateTime::from_timestamp_millis(1_717_600_000_512)
        );
    }

    #[test]
    fn test_price_is_last_trade() {
        let ticker: BitfinexTicker = serde_json::from_str(SAMPLE).unwrap();
        let quote = BitfinexAdapter::normalize(ticker, Pair::new("btcusd").unwrap(), Utc::now());
        assert!((quote.price() - 68123.0).abs() < 1e-9);
        assert!((quote.volume() - 8123.55518954).abs() < 1e-9);
    }
}
