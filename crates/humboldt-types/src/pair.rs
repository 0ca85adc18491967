//! Traded pair symbols.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A traded instrument symbol (e.g. `btceur`, `ethusd`).
///
/// Pair symbols are stored lowercase. Exchange adapters that use a
/// different native spelling (e.g. Itbit's `XBTUSD`) map to and from it
/// at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pair(String);

impl Pair {
    /// Creates a pair symbol, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or contains characters
    /// other than ASCII letters and digits.
    pub fn new(symbol: &str) -> Result<Self, PairParseError> {
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PairParseError(symbol.to_string()));
        }
        Ok(Self(symbol.to_lowercase()))
    }

    /// Returns the pair symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Pair {
    type Err = PairParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Error returned when parsing an invalid pair symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pair symbol '{0}', expected ASCII letters and digits")]
pub struct PairParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_normalizes_case() {
        let pair = Pair::new("BtcEur").unwrap();
        assert_eq!(pair.as_str(), "btceur");
    }

    #[test]
    fn test_pair_rejects_invalid() {
        assert!(Pair::new("").is_err());
        assert!(Pair::new("btc-eur").is_err());
        assert!(Pair::new("btc eur").is_err());
    }

    #[test]
    fn test_pair_parse() {
        assert_eq!("xbtusd".parse::<Pair>().unwrap().as_str(), "xbtusd");
        assert!("btc/usd".parse::<Pair>().is_err());
    }
}
