//! Errors for flight tracker
use thiserror::Error;

/// Failure reaching or decoding the remote feed
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Feed responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Feed payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A record violates one or more storage field-length limits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Can't add {id} due to invalid fields: {}", .fields.join(", "))]
pub struct ValidationError {
    pub id: String,
    pub fields: Vec<&'static str>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate flight info id: {0}")]
    Duplicate(String),

    #[error("Record rejected by store constraints")]
    Constraint(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum FlightTrackerError {
    #[error("Feed error")]
    FetchError(#[from] FetchError),

    #[error("Validation error")]
    ValidationError(#[from] ValidationError),

    #[error("Store error")]
    StoreError(#[from] StoreError),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("Updater task failed")]
    JoinError(#[from] tokio::task::JoinError),
}
