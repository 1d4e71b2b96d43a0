use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval a model is trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [
        Timeframe::FiveMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
    ];

    /// Interval string understood by the exchange and stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::FiveMinutes => 5,
            Timeframe::OneHour => 60,
            Timeframe::FourHours => 240,
        }
    }

    /// Length of one candle.
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported timeframe '{0}' (expected 5m, 1h or 4h)")]
pub struct UnknownTimeframe(pub String);

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5m" => Ok(Timeframe::FiveMinutes),
            "1h" => Ok(Timeframe::OneHour),
            "4h" => Ok(Timeframe::FourHours),
            other => Err(UnknownTimeframe(other.to_string())),
        }
    }
}
