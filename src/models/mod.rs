//! Shared data models spanning the engine layers.

pub mod candle;
pub mod coin;
pub mod prediction;
pub mod timeframe;

pub use candle::Candle;
pub use coin::{Coin, CoinUniverse};
pub use prediction::{NewPrediction, PredictionRecord, Trend};
pub use timeframe::{Timeframe, UnknownTimeframe};
