//! # Response Envelope
//!
//! The uniform wrapper every operation result crosses the boundary in.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Success                          Failure                               │
//! │  ───────                          ───────                               │
//! │  {                                {                                     │
//! │    "success": true,                 "success": false,                   │
//! │    "data": { ... }                  "error": {                          │
//! │  }                                    "kind": "CAPACITY_EXCEEDED",      │
//! │                                       "message": "course c-1 is ..."    │
//! │                                     }                                   │
//! │  }                                }                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clients branch on `error.kind` (stable SCREAMING_SNAKE_CASE), never on
//! the message text.

use campus_core::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Machine-readable error payload inside a failed envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Uniform result wrapper for every operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    /// Wraps a successful result.
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wraps a failure, capturing its stable kind and display message.
    pub fn err(error: &ServiceError) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(ErrorBody {
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for Envelope<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(error) => Envelope::err(&error),
        }
    }
}
