//! Feature engineering for the sequence models.

pub mod engineer;
pub mod schema;

pub use engineer::{FeatureEngineer, FeatureRow, FeatureTable, MACD_WARMUP, ROLLING_WARMUP};
pub use schema::{schema_mismatch, schema_tag, SchemaMismatch, CLOSE_COLUMN, FEATURE_COLUMNS, FEATURE_COUNT};
