//! Error type definitions for the resource loader
//!
//! This module defines the error hierarchy used behind the listener
//! protocol. Each layer has its own enum and everything converts into
//! [`AppError`] for the binary.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache backend errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Compose errors
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent cache specific errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The stored schema is newer than the one this build understands
    #[error("Incompatible schema version: found {found}, expected {expected}")]
    IncompatibleVersion { found: i64, expected: i64 },

    /// The configured database URL does not name an SQLite database
    #[error("Unsupported database URL: {url}")]
    UnsupportedUrl { url: String },

    /// Failed to prepare the directory that holds the database file
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        source: std::io::Error,
    },
}

/// Transport specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL that could not be parsed or resolved against the base URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Errors raised while composing a filtered SVG
#[derive(Error, Debug)]
pub enum ComposeError {
    /// The source is not a base-64 data URI
    #[error("Not a base64 data URI: {prefix}")]
    NotDataUri { prefix: String },

    /// The base-64 payload could not be decoded
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not an image with a readable header
    #[error("Image probe failed: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the image header failed
    #[error("Image read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl TransportError {
    /// Create an invalid URL error
    pub fn invalid_url<S: Into<String>>(url: S, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }
}
