//! PostgreSQL prediction ledger

use super::{PredictionQuery, PredictionStore, StoreError};
use crate::models::{NewPrediction, PredictionRecord, Trend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

const CREATE_PREDICTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS predictions (
    id BIGSERIAL PRIMARY KEY,
    coin TEXT NOT NULL,
    timeframe TEXT NOT NULL,
    current_price DOUBLE PRECISION NOT NULL,
    predicted_price DOUBLE PRECISION NOT NULL,
    trend TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

pub struct PostgresPredictionStore {
    client: Client,
}

impl PostgresPredictionStore {
    /// Connect and make sure the predictions table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(StoreError::Connect)?;

        // Spawn connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgresPredictionStore: connection error");
            }
        });

        let store = Self { client };
        store.init_schema().await?;
        info!("PostgresPredictionStore: connected, predictions table ready");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.client.execute(CREATE_PREDICTIONS_TABLE, &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl PredictionStore for PostgresPredictionStore {
    async fn insert(&self, prediction: &NewPrediction) -> Result<PredictionRecord, StoreError> {
        let row = self
            .client
            .query_one(
                "INSERT INTO predictions (coin, timeframe, current_price, predicted_price, trend)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, coin, timeframe, current_price, predicted_price, trend, created_at",
                &[
                    &prediction.coin,
                    &prediction.timeframe,
                    &prediction.current_price,
                    &prediction.predicted_price,
                    &prediction.trend.as_str(),
                ],
            )
            .await?;
        record_from_row(&row)
    }

    async fn recent(&self, query: &PredictionQuery) -> Result<Vec<PredictionRecord>, StoreError> {
        let limit = query.limit as i64;
        let params: [&(dyn ToSql + Sync); 3] = [&query.coin, &query.timeframe, &limit];
        let rows = self
            .client
            .query(
                "SELECT id, coin, timeframe, current_price, predicted_price, trend, created_at
                 FROM predictions
                 WHERE ($1::TEXT IS NULL OR coin = $1)
                   AND ($2::TEXT IS NULL OR timeframe = $2)
                 ORDER BY id DESC
                 LIMIT $3",
                &params,
            )
            .await?;

        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &Row) -> Result<PredictionRecord, StoreError> {
    let trend: String = row.try_get(5)?;
    let created_at: DateTime<Utc> = row.try_get(6)?;
    Ok(PredictionRecord {
        id: row.try_get(0)?,
        coin: row.try_get(1)?,
        timeframe: row.try_get(2)?,
        current_price: row.try_get(3)?,
        predicted_price: row.try_get(4)?,
        trend: Trend::parse(&trend)
            .ok_or_else(|| StoreError::InvalidRow(format!("unknown trend '{trend}'")))?,
        created_at,
    })
}
