// Domain errors - Error taxonomy for jobs, frames and sessions

use serde::Serialize;
use thiserror::Error;

use crate::domain::model::JobStatus;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Input rejected before a job was created
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Source unreadable, undecodable, or seek failed
    #[error("Decode failed: {0}")]
    Decode(String),
    /// Watermark transform failed on a frame or image
    #[error("Transform failed: {0}")]
    Transform(String),
    /// Encoder session failed
    #[error("Encode failed: {0}")]
    Encode(String),
    /// Required capability is absent in this runtime
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),
    /// Job status rule violated
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    /// Worker task ended without reporting a result
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classification, recorded on failed jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Decode,
    Transform,
    Encode,
    UnsupportedCapability,
    Internal,
}

impl DomainError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::Decode(_) => ErrorKind::Decode,
            DomainError::Transform(_) => ErrorKind::Transform,
            DomainError::Encode(_) => ErrorKind::Encode,
            DomainError::UnsupportedCapability(_) => ErrorKind::UnsupportedCapability,
            DomainError::InvalidTransition { .. } | DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Error record attached to a failed job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DomainError> for JobError {
    fn from(err: &DomainError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
