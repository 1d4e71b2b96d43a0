use serde::{Deserialize, Serialize};

/// A tradable coin and the exchange symbol its candles are fetched under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Short code stored in the ledger, e.g. `BTC`
    pub code: String,
    /// Exchange pair, e.g. `BTCUSDT`
    pub symbol: String,
}

impl Coin {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
        }
    }
}

/// Ordered set of supported coins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinUniverse {
    coins: Vec<Coin>,
}

impl CoinUniverse {
    pub fn new(coins: Vec<Coin>) -> Self {
        Self { coins }
    }

    /// Look a coin up by its code, case-insensitively.
    pub fn by_code(&self, code: &str) -> Option<&Coin> {
        self.coins
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Look a coin up by its exchange symbol.
    pub fn by_symbol(&self, symbol: &str) -> Option<&Coin> {
        self.coins
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn codes(&self) -> Vec<String> {
        self.coins.iter().map(|c| c.code.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

impl Default for CoinUniverse {
    fn default() -> Self {
        Self::new(vec![Coin::new("BTC", "BTCUSDT"), Coin::new("ETH", "ETHUSDT")])
    }
}
