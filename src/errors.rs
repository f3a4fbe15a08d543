//! # Error Types Module
//!
//! Typed errors for the persistence layer, configuration loading and chart
//! rendering. Handlers convert these into a localized plain-text reply; they
//! never escape to the chat as a panic.

use thiserror::Error;

/// Errors raised by a [`crate::store::FitnessStore`] implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver-level failure (connection, constraint violation, decoding)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A single round-trip exceeded the configured bound
    #[error("Database call timed out after {secs}s")]
    Timeout { secs: u64 },
    /// A set referenced a user or exercise that does not exist
    #[error("Unknown {entity} with id {id}")]
    ForeignKey { entity: &'static str, id: i64 },
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Errors raised while rendering a progress chart
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Not enough data: {points} point(s), need at least 2")]
    NotEnoughData { points: usize },
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
