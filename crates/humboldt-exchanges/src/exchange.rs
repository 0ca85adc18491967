//! Supported exchange identifiers and their collection names.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A supported exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Bitstamp (`www.bitstamp.net`).
    Bitstamp,
    /// Bitfinex (`api.bitfinex.com`).
    Bitfinex,
    /// Itbit (`api.itbit.com`).
    Itbit,
    /// Coinbase exchange rates (`api.coinbase.com`).
    Coinbase,
}

impl Exchange {
    /// Returns the exchange as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bitstamp => "bitstamp",
            Self::Bitfinex => "bitfinex",
            Self::Itbit => "itbit",
            Self::Coinbase => "coinbase",
        }
    }

    /// Returns the collection holding raw quotes for this exchange.
    #[must_use]
    pub const fn raw_collection(&self) -> &'static str {
        match self {
            Self::Bitstamp => "quote_bs",
            Self::Bitfinex => "quote_bf",
            Self::Itbit => "quote_ib",
            Self::Coinbase => "quote_cb",
        }
    }

    /// Returns the collection holding hourly rollups for this exchange.
    #[must_use]
    pub const fn hourly_collection(&self) -> &'static str {
        match self {
            Self::Bitstamp => "quote_bs_hour",
            Self::Bitfinex => "quote_bf_hour",
            Self::Itbit => "quote_ib_hour",
            Self::Coinbase => "quote_cb_hour",
        }
    }

    /// Returns the collection holding daily rollups for this exchange.
    #[must_use]
    pub const fn daily_collection(&self) -> &'static str {
        match self {
            Self::Bitstamp => "quote_bs_day",
            Self::Bitfinex => "quote_bf_day",
            Self::Itbit => "quote_ib_day",
            Self::Coinbase => "quote_cb_day",
        }
    }

    /// Returns all supported exchanges.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Bitstamp, Self::Bitfinex, Self::Itbit, Self::Coinbase]
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ExchangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitstamp" | "bs" => Ok(Self::Bitstamp),
            "bitfinex" | "bf" => Ok(Self::Bitfinex),
            "itbit" | "ib" => Ok(Self::Itbit),
            "coinbase" | "cb" => Ok(Self::Coinbase),
            _ => Err(ExchangeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown exchange name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange '{0}', expected one of: bitstamp, bitfinex, itbit, coinbase")]
pub struct ExchangeParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(Exchange::Bitstamp.raw_collection(), "quote_bs");
        assert_eq!(Exchange::Bitfinex.hourly_collection(), "quote_bf_hour");
        assert_eq!(Exchange::Coinbase.daily_collection(), "quote_cb_day");
    }

    #[test]
    fn test_exchange_parse() {
        assert_eq!("bitstamp".parse::<Exchange>().unwrap(), Exchange::Bitstamp);
        assert_eq!("IB".parse::<Exchange>().unwrap(), Exchange::Itbit);
        assert!("kraken".parse::<Exchange>().is_err());
    }
}
