//! Binance spot market data over the public REST API

pub mod client;
pub mod provider;

pub use client::{parse_klines, BinanceRestClient, MAX_KLINES_LIMIT};
pub use provider::BinanceMarketDataProvider;
