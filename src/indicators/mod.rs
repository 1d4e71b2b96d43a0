//! Technical indicators computed as full per-candle series.

pub mod momentum;
pub mod trend;
pub mod volatility;
