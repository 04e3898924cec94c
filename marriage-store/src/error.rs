use thiserror::Error;

/// Persistence-layer error taxonomy. Keeps "not found" distinguishable from genuine I/O failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row not found")]
    NotFound,
    #[error("row corrupt: {0}")]
    Corrupt(String),
}
