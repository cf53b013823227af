//! Error taxonomy shared by every service and transport.
//!
//! Every failure that crosses a transport boundary is an [`AppError`] of
//! exactly one [`ErrorKind`]. Transports translate the kind, never the
//! concrete error type:
//!
//! | kind           | HTTP | RPC                 |
//! |----------------|------|---------------------|
//! | `Validation`   | 400  | `InvalidArgument`   |
//! | `NotFound`     | 404  | `NotFound`          |
//! | `Conflict`     | 409  | `AlreadyExists`     |
//! | `Unauthorized` | 401  | `Unauthenticated`   |
//! | `Forbidden`    | 403  | `PermissionDenied`  |
//! | `Internal`     | 500  | `Internal`          |

use std::any::Any;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::trace::TraceId;

/// Boxed error used as the diagnostic cause of an [`AppError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Message returned to callers for failures that were never classified.
pub const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred";

/// The closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "CONFLICT")]
    Conflict,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,
}

impl ErrorKind {
    /// Wire code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
        }
    }

    /// HTTP status code for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified application error.
///
/// The `source` is kept for diagnostics only; it is logged but never
/// serialized to callers.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    details: Option<Value>,
    #[source]
    source: Option<BoxError>,
}

impl AppError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a `NotFound` error formatted as `<resource> with id '<id>' not found`.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("{resource} with id '{id}' not found"),
        )
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Re-contextualizes an error as `"<context>: <message>"`.
    ///
    /// If `err` is (or wraps) an `AppError`, its kind and details are kept.
    /// Anything else becomes `Internal` with `context` as the message.
    pub fn wrap(err: impl Into<BoxError>, context: &str) -> Self {
        let err = err.into();
        let classified = find_app_error(err.as_ref())
            .map(|app| (app.kind, app.message.clone(), app.details.clone()));

        match classified {
            Some((kind, message, details)) => Self {
                kind,
                message: format!("{context}: {message}"),
                details,
                source: Some(err),
            },
            None => Self::internal(context).with_source(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Returns true if this error is of kind `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Renders the full cause chain for logging.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = self.source();
        while let Some(cause) = current {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            current = cause.source();
        }
        rendered
    }
}

/// Finds the outermost `AppError` in an error's source chain.
pub fn find_app_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AppError> {
    std::iter::successors(Some(err), |&e| e.source()).find_map(|e| e.downcast_ref::<AppError>())
}

/// Classifies any error, looking through wrappers. Unclassified errors are `Internal`.
pub fn kind_of(err: &(dyn StdError + 'static)) -> ErrorKind {
    find_app_error(err)
        .map(AppError::kind)
        .unwrap_or(ErrorKind::Internal)
}

/// Returns true if `err` (or anything it wraps) is an `AppError` of kind `kind`.
pub fn is_kind(err: &(dyn StdError + 'static), kind: ErrorKind) -> bool {
    find_app_error(err).is_some_and(|app| app.is(kind))
}

/// Body of the JSON error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// JSON error envelope: `{"error": {...}, "trace_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub trace_id: String,
}

impl ErrorResponse {
    /// Builds the envelope for a classified error.
    ///
    /// Internal errors never expose their details.
    pub fn from_error(err: &AppError, trace_id: &TraceId) -> Self {
        let details = match err.kind {
            ErrorKind::Internal => None,
            _ => err.details.clone(),
        };
        Self {
            error: ErrorBody {
                code: err.kind,
                message: err.message.clone(),
                details,
            },
            trace_id: trace_id.to_string(),
        }
    }

    /// Builds the envelope for an unclassified failure.
    pub fn internal(trace_id: &TraceId) -> Self {
        Self {
            error: ErrorBody {
                code: ErrorKind::Internal,
                message: GENERIC_INTERNAL_MESSAGE.to_string(),
                details: None,
            },
            trace_id: trace_id.to_string(),
        }
    }

    /// HTTP status for this envelope.
    pub fn http_status(&self) -> u16 {
        self.error.code.http_status()
    }
}

/// Extracts the message of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
