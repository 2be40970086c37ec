//! Error handling module for unmark

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Application-level error type
#[derive(Error, Debug)]
pub enum UnmarkError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input rejected at intake
    #[error("Rejected input {path}: {message}")]
    Rejected { path: String, message: String },

    /// Archive could not be produced
    #[error("Failed to build archive: {message}")]
    Archive { message: String },

    /// Output could not be written
    #[error("Failed to write output {path}: {message}")]
    Output { path: String, message: String },

    /// Logging could not be initialised
    #[error("Failed to initialise logging: {message}")]
    Logging { message: String },

    /// Domain error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for unmark operations
pub type UnmarkResult<T> = std::result::Result<T, UnmarkError>;
