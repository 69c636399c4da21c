//! Indexer error type. `main` converts it into `anyhow::Error` at the edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Transport failure talking to the Soroban RPC.
    #[error("RPC transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unreadable `getEvents` payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Hard JSON-RPC error or an empty `getEvents` result.
    #[error("Event parse error: {0}")]
    EventParse(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
