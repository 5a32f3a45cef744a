//! Error types for the standings automation engine.
//!

use crate::config::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A single field-level violation attached to a validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandingsError {
    /// Rejected input. Never retried and never produces a queued job.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        violations: Vec<FieldViolation>,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Operation {operation} exceeded its time budget of {timeout:?}")]
    ConcurrencyTimeout {
        operation: String,
        timeout: Duration,
    },

    /// Repository or storage failure inside a running job; retryable
    #[error("Transient computation error during {operation}: {reason}")]
    TransientComputation { operation: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable error classification returned by administrative calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ConcurrencyTimeout,
    TransientComputation,
    Configuration,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::ConcurrencyTimeout => write!(f, "concurrency_timeout"),
            Self::TransientComputation => write!(f, "transient_computation"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl StandingsError {
    pub fn validation(message: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: message.into(),
            violations,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn transient(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransientComputation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::ConcurrencyTimeout {
            operation: operation.into(),
            timeout,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConcurrencyTimeout { .. } => ErrorKind::ConcurrencyTimeout,
            Self::TransientComputation { .. } => ErrorKind::TransientComputation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a job failing with this error should be retried with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientComputation { .. } | Self::ConcurrencyTimeout { .. }
        )
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for StandingsError {
    fn from(error: std::io::Error) -> Self {
        StandingsError::transient("storage_io", error.to_string())
    }
}

impl From<serde_json::Error> for StandingsError {
    fn from(error: serde_json::Error) -> Self {
        StandingsError::Internal(format!("JSON serialization error: {error}"))
    }
}

impl From<ConfigurationError> for StandingsError {
    fn from(error: ConfigurationError) -> Self {
        StandingsError::Configuration(error.to_string())
    }
}

pub type StandingsResult<T> = std::result::Result<T, StandingsError>;
