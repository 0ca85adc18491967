//! Itbit ticker adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use humboldt_types::{Pair, TickerQuote};
use serde::{Deserialize, Serialize};

use crate::numeric::string_as_f64;
use crate::{Exchange, ExchangeAdapter, FeedClient, FetchError};

/// Default Itbit API base URL.
const BASE_URL: &str = "https://api.itbit.com";

/// Wire shape of the Itbit `/v1/markets/{symbol}/ticker` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItbitTicker {
    #[serde(deserialize_with = "string_as_f64")]
    bid: f64,
    #[serde(deserialize_with = "string_as_f64")]
    bid_amt: f64,
    #[serde(deserialize_with = "string_as_f64")]
    ask: f64,
    #[serde(deserialize_with = "string_as_f64")]
    ask_amt: f64,
    #[serde(deserialize_with = "string_as_f64")]
    last_price: f64,
    #[serde(deserialize_with = "string_as_f64")]
    st_amt: f64,
    #[serde(deserialize_with = "string_as_f64")]
    volume24h: f64,
    #[serde(deserialize_with = "string_as_f64")]
    volume_today: f64,
    #[serde(deserialize_with = "string_as_f64")]
    high24h: f64,
    #[serde(deserialize_with = "string_as_f64")]
    low24h: f64,
    #[serde(deserialize_with = "string_as_f64")]
    open_today: f64,
    #[serde(deserialize_with = "string_as_f64")]
    high_today: f64,
    #[serde(deserialize_with = "string_as_f64")]
    low_today: f64,
    #[serde(deserialize_with = "string_as_f64")]
    vwap_today: f64,
    #[serde(deserialize_with = "string_as_f64")]
    vwap24h: f64,
    #[serde(rename = "serverTimeUTC")]
    server_time_utc: Option<String>,
}

/// A normalized Itbit quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItbitQuote {
    /// Traded pair (public spelling, e.g. `btcusd`).
    pub pair: Pair,
    /// Ingestion timestamp (UTC).
    pub recorded_at: DateTime<Utc>,
    /// Exchange-reported server time.
    pub exchange_time: Option<DateTime<Utc>>,
    /// Highest bid.
    pub bid: f64,
    /// Amount at the highest bid.
    pub bid_amt: f64,
    /// Lowest ask.
    pub ask: f64,
    /// Amount at the lowest ask.
    pub ask_amt: f64,
    /// Last trade price.
    pub last_price: f64,
    /// Amount of the last trade.
    pub st_amt: f64,
    /// 24h volume.
    pub volume_24h: f64,
    /// Volume since midnight.
    pub volume_today: f64,
    /// 24h high.
    pub high_24h: f64,
    /// 24h low.
    pub low_24h: f64,
    /// First price of the day.
    pub open_today: f64,
    /// High since midnight.
    pub high_today: f64,
    /// Low since midnight.
    pub low_today: f64,
    /// Volume-weighted average price since midnight.
    pub vwap_today: f64,
    /// 24h volume-weighted average price.
    pub vwap_24h: f64,
    /// Raw samples behind this record (1 for a raw quote).
    #[serde(default)]
    pub samples: u32,
}

impl TickerQuote for ItbitQuote {
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
        self.volume_24h
    }

    fn sample_count(&self) -> u32 {
        self.samples
    }

    fn mean_seed(pair: Pair, recorded_at: DateTime<Utc>) -> Self {
        Self {
            pair,
            recorded_at,
            exchange_time: None,
            bid: 0.0,
            bid_amt: 0.0,
            ask: 0.0,
            ask_amt: 0.0,
            last_price: 0.0,
            st_amt: 0.0,
            volume_24h: 0.0,
            volume_today: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            open_today: 0.0,
            high_today: 0.0,
            low_today: 0.0,
            vwap_today: 0.0,
            vwap_24h: 0.0,
            samples: 0,
        }
    }

    fn add_scaled(&mut self, sample: &Self, divisor: u32) {
        let n = f64::from(divisor);
        self.bid += sample.bid / n;
        self.bid_amt += sample.bid_amt / n;
        self.ask += sample.ask / n;
        self.ask_amt += sample.ask_amt / n;
        self.last_price += sample.last_price / n;
        self.st_amt += sample.st_amt / n;
        self.volume_24h += sample.volume_24h / n;
        self.volume_today += sample.volume_today / n;
        self.high_24h += sample.high_24h / n;
        self.low_24h += sample.low_24h / n;
        self.open_today += sample.open_today / n;
        self.high_today += sample.high_today / n;
        self.low_today += sample.low_today / n;
        self.vwap_today += sample.vwap_today / n;
        self.vwap_24h += sample.vwap_24h / n;
    }

    fn set_sample_count(&mut self, samples: u32) {
        self.samples = samples;
    }
}

/// Itbit ticker adapter.
///
/// Itbit spells bitcoin pairs with `XBT` (`btcusd` → `XBTUSD`); the
/// mapping stays inside this adapter and stored quotes keep the public
/// spelling.
#[derive(Debug, Clone)]
pub struct ItbitAdapter {
    client: FeedClient,
    base_url: String,
    pairs: Vec<Pair>,
}

impl ItbitAdapter {
    /// Creates an adapter polling the given pairs (public spelling).
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

    /// Maps a public pair symbol to Itbit's native spelling.
    fn native_symbol(pair: &Pair) -> String {
        pair.as_str().replacen("btc", "xbt", 1).to_uppercase()
    }

    /// Normalizes a wire ticker into a quote record.
    fn normalize(ticker: ItbitTicker, pair: Pair, recorded_at: DateTime<Utc>) -> ItbitQuote {
        let exchange_time = ticker
            .server_time_utc
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        ItbitQuote {
            pair,
            recorded_at,
            exchange_time,
            bid: ticker.bid,
            bid_amt: ticker.bid_amt,
            ask: ticker.ask,
            ask_amt: ticker.ask_amt,
            last_price: ticker.last_price,
            st_amt: ticker.st_amt,
            volume_24h: ticker.volume24h,
            volume_today: ticker.volume_today,
            high_24h: ticker.high24h,
            low_24h: ticker.low24h,
            open_today: ticker.open_today,
            high_today: ticker.high_today,
            low_today: ticker.low_today,
            vwap_today: ticker.vwap_today,
            vwap_24h: ticker.vwap24h,
            samples: 1,
        }
    }
}

#[async_trait]
impl ExchangeAdapter for ItbitAdapter {
    type Quote = ItbitQuote;

    fn exchange(&self) -> Exchange {
        Exchange::Itbit
    }

    fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError> {
        let url = format!(
            "{}/v1/markets/{}/ticker",
            self.base_url,
            Self::native_symbol(pair)
        );
        let ticker = self.client.get_json::<ItbitTicker>(&url).await?;
        Ok(Self::normalize(ticker, pair.clone(), Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pair": "XBTUSD",
        "bid": "68120.50",
        "bidAmt": "0.25",
        "ask": "68127.00",
        "askAmt": "0.40",
        "lastPrice": "68123.75",
        "stAmt": "0.05",
        "volume24h": "412.09876543",
        "volumeToday": "118.20010000",
        "high24h": "69002.00",
        "low24h": "66948.25",
        "openToday": "67510.00",
        "highToday": "68900.00",
        "lowToday": "67011.50",
        "vwapToday": "67995.12",
        "vwap24h": "67981.77",
        "serverTimeUTC": "2024-06-05T14:26:40.000Z"
    }"#;

    #[test]
    fn test_native_symbol_mapping() {
        assert_eq!(
            ItbitAdapter::native_symbol(&Pair::new("btcusd").unwrap()),
            "XBTUSD"
        );
        assert_eq!(
            ItbitAdapter::native_symbol(&Pair::new("btceur").unwrap()),
            "XBTEUR"
        );
    }

    #[test]
    fn test_normalize_sample_ticker() {
        let ticker: ItbitTicker = serde_json::from_str(SAMPLE).unwrap();
        let pair = Pair::new("btcusd").unwrap();
        let quote = ItbitAdapter::normalize(ticker, pair.clone(), Utc::now());

        assert_eq!(quote.pair, pair);
        assert!((quote.last_price - 68123.75).abs() < 1e-9);
        assert!((quote.vwap_24h - 67981.77).abs() < 1e-9);
        assert!((quote.volume() - 412.09876543).abs() < 1e-9);
        assert!(quote.exchange_time.is_some());
    }
}
