//! # Administrative Response Types
//!
//! Uniform envelope returned by every administrative call: either data or an
//! error with its kind, a readable message and field-level violations.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FieldViolation, StandingsError, StandingsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
}

impl From<&StandingsError> for ApiError {
    fn from(error: &StandingsError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            violations: error.violations().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &StandingsError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError::from(error)),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl<T> From<StandingsResult<T>> for ApiResponse<T> {
    fn from(result: StandingsResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failure(&error),
        }
    }
}
