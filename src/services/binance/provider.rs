//! Binance market data provider implementation

use super::client::BinanceRestClient;
use crate::models::{Candle, Timeframe};
use crate::services::market_data::{MarketDataError, MarketDataProvider};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::warn;

pub struct BinanceMarketDataProvider {
    client: BinanceRestClient,
    max_retries: usize,
}

impl BinanceMarketDataProvider {
    pub fn new(client: BinanceRestClient) -> Self {
        Self {
            client,
            max_retries: 3,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn client(&self) -> &BinanceRestClient {
        &self.client
    }
}

#[async_trait]
impl MarketDataProvider for BinanceMarketDataProvider {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.max_retries);

        (|| async { self.client.klines(symbol, interval, limit).await })
            .retry(backoff)
            .when(MarketDataError::is_transient)
            .notify(|e: &MarketDataError, delay: Duration| {
                warn!(
                    symbol = %symbol,
                    interval = %interval,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "BinanceMarketDataProvider: klines request failed, retrying"
                );
            })
            .await
    }
}
