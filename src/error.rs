// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Error types shared across the queen, its collaborators and transports.

use thiserror::Error;

/// Failures while decoding a provider envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("envelope must be a two element array, got {0} elements")]
    Arity(usize),
    #[error("envelope type code is not an integer")]
    TypeCode,
}

/// Failures raised by workforce collaborators.
#[derive(Debug, Error)]
pub enum WorkforceError {
    #[error("workforce creation failed: {0}")]
    Create(String),
}

/// Errors returned by [`crate::Queen`] operations.
#[derive(Debug, Error)]
pub enum QueenError {
    #[error("queen is no longer running")]
    Stopped,
    #[error(transparent)]
    Workforce(#[from] WorkforceError),
}

/// Errors produced while loading [`crate::QueenConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by the bundled transports.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport endpoint closed")]
    Closed,
}
