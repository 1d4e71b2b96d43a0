//! Feature column order shared with trained models.

/// Ordered list of feature names.
/// This order MUST match the order the consuming model was trained with.
/// Any change here is a breaking change for every model artifact.
pub const FEATURE_COLUMNS: [&str; 15] = [
    "close",
    "open",
    "high",
    "low",
    "volume",
    "price_change",
    "volatility",
    "ma_5",
    "ma_10",
    "ma_20",
    "macd",
    "rsi",
    "bb_position",
    "volume_change",
    "price_position",
];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Index of the close column, the one models forecast.
pub const CLOSE_COLUMN: usize = 0;

/// Compact tag for the live column order, logged when a model is installed.
pub fn schema_tag() -> String {
    FEATURE_COLUMNS.join(",")
}

/// Check a model's declared column order against the live one.
///
/// Returns the first position that differs, if any.
pub fn schema_mismatch<S: AsRef<str>>(columns: &[S]) -> Option<SchemaMismatch> {
    if columns.len() != FEATURE_COUNT {
        return Some(SchemaMismatch {
            position: columns.len().min(FEATURE_COUNT),
            expected: FEATURE_COLUMNS
                .get(columns.len())
                .map(|s| s.to_string())
                .unwrap_or_default(),
            found: format!("{} columns", columns.len()),
        });
    }

    columns
        .iter()
        .zip(FEATURE_COLUMNS.iter())
        .position(|(found, expected)| found.as_ref() != *expected)
        .map(|position| SchemaMismatch {
            position,
            expected: FEATURE_COLUMNS[position].to_string(),
            found: columns[position].as_ref().to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feature column {position}: expected '{expected}', found '{found}'")]
pub struct SchemaMismatch {
    pub position: usize,
    pub expected: String,
    pub found: String,
}
