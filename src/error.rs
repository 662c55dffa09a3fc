// src/error.rs
// Standardized error types for Herald

use thiserror::Error;

use crate::recipient::RecipientId;

/// Main error type for the Herald library
#[derive(Error, Debug)]
pub enum HeraldError {
    #[error("recipient not connected: {0}")]
    NotConnected(RecipientId),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid producer descriptor: {0}")]
    Descriptor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using HeraldError
pub type Result<T> = std::result::Result<T, HeraldError>;
