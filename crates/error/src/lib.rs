//! # dmesh-error
//!
//! Error codes shared by the dmesh crates.
//!
//! Component errors (credentials, catalog, query) stay as typed enums in
//! `dmesh-core`; they implement [`Coded`] so adapters can map them to:
//! - Numeric error codes (DMESH-XXXX)
//! - A category for exit-code selection
//! - An operator hint ("run `aws sso login`")

mod code;

pub use code::{ErrorCategory, ErrorCode};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Implemented by every component error that crosses a crate boundary.
pub trait Coded {
    fn code(&self) -> ErrorCode;

    /// Operator-facing suggestion, if the error has an obvious remedy.
    fn hint(&self) -> Option<String> {
        None
    }
}

/// Serialisable error envelope for machine-readable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshError {
    /// Numeric error code (e.g., "DMESH-2002")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl MeshError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Capture code, message and hint from a component error.
    pub fn from_coded<E>(err: &E) -> Self
    where
        E: Coded + fmt::Display + ?Sized,
    {
        Self {
            code: err.code(),
            message: err.to_string(),
            hint: err.hint(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize MeshError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for MeshError {}
