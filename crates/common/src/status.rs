//! RPC status codes and their mapping to the error taxonomy.

use serde_json::{Value, json};
use thiserror::Error;

use crate::error::{AppError, ErrorKind};

/// Canonical RPC status codes. Numeric values follow the gRPC definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcCode::Ok => "OK",
            RpcCode::Cancelled => "CANCELLED",
            RpcCode::Unknown => "UNKNOWN",
            RpcCode::InvalidArgument => "INVALID_ARGUMENT",
            RpcCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::AlreadyExists => "ALREADY_EXISTS",
            RpcCode::PermissionDenied => "PERMISSION_DENIED",
            RpcCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            RpcCode::FailedPrecondition => "FAILED_PRECONDITION",
            RpcCode::Aborted => "ABORTED",
            RpcCode::OutOfRange => "OUT_OF_RANGE",
            RpcCode::Unimplemented => "UNIMPLEMENTED",
            RpcCode::Internal => "INTERNAL",
            RpcCode::Unavailable => "UNAVAILABLE",
            RpcCode::DataLoss => "DATA_LOSS",
            RpcCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl std::fmt::Display for RpcCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    /// RPC code for this kind.
    pub fn rpc_code(&self) -> RpcCode {
        match self {
            ErrorKind::Validation => RpcCode::InvalidArgument,
            ErrorKind::NotFound => RpcCode::NotFound,
            ErrorKind::Conflict => RpcCode::AlreadyExists,
            ErrorKind::Unauthorized => RpcCode::Unauthenticated,
            ErrorKind::Forbidden => RpcCode::PermissionDenied,
            ErrorKind::Internal => RpcCode::Internal,
        }
    }

    /// Inverse of [`ErrorKind::rpc_code`]. Codes outside the table yield `None`.
    pub fn from_rpc_code(code: RpcCode) -> Option<Self> {
        match code {
            RpcCode::InvalidArgument => Some(ErrorKind::Validation),
            RpcCode::NotFound => Some(ErrorKind::NotFound),
            RpcCode::AlreadyExists => Some(ErrorKind::Conflict),
            RpcCode::Unauthenticated => Some(ErrorKind::Unauthorized),
            RpcCode::PermissionDenied => Some(ErrorKind::Forbidden),
            RpcCode::Internal => Some(ErrorKind::Internal),
            _ => None,
        }
    }
}

/// Status returned by an RPC call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rpc status {code}: {message}")]
pub struct RpcStatus {
    code: RpcCode,
    message: String,
    details: Option<Value>,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details, carried alongside the status.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(RpcCode::DeadlineExceeded, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }

    pub fn code(&self) -> RpcCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

impl From<&AppError> for RpcStatus {
    /// Details of `Internal` errors stay on the server.
    fn from(err: &AppError) -> Self {
        let status = RpcStatus::new(err.kind().rpc_code(), err.message());
        match err.details() {
            Some(details) if !err.is(ErrorKind::Internal) => status.with_details(details.clone()),
            _ => status,
        }
    }
}

impl From<AppError> for RpcStatus {
    fn from(err: AppError) -> Self {
        RpcStatus::from(&err)
    }
}

impl From<RpcStatus> for AppError {
    /// Classifies a status received from a remote service.
    ///
    /// Codes outside the taxonomy table become `Internal`; the remote code and
    /// text are kept only in the details and cause.
    fn from(status: RpcStatus) -> Self {
        match ErrorKind::from_rpc_code(status.code) {
            Some(kind) => {
                let mut err = AppError::new(kind, status.message.clone());
                if let Some(details) = status.details.clone() {
                    err = err.with_details(details);
                }
                err.with_source(status)
            }
            None => AppError::internal("remote call failed")
                .with_details(json!({
                    "rpc_code": status.code.as_str(),
                    "rpc_message": status.message.clone(),
                }))
                .with_source(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ErrorKind; 6] = [
        ErrorKind::Validation,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::Internal,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
    ];

    #[test]
    fn rpc_table() {
        assert_eq!(ErrorKind::Validation.rpc_code(), RpcCode::InvalidArgument);
        assert_eq!(ErrorKind::NotFound.rpc_code(), RpcCode::NotFound);
        assert_eq!(ErrorKind::Conflict.rpc_code(), RpcCode::AlreadyExists);
        assert_eq!(ErrorKind::Unauthorized.rpc_code(), RpcCode::Unauthenticated);
        assert_eq!(ErrorKind::Forbidden.rpc_code(), RpcCode::PermissionDenied);
        assert_eq!(ErrorKind::Internal.rpc_code(), RpcCode::Internal);
    }

    #[test]
    fn rpc_mapping_is_invertible() {
        for kind in KINDS {
            let err = AppError::new(kind, "message");
            let status = RpcStatus::from(&err);
            let back = AppError::from(status);
            assert_eq!(back.kind(), kind);
            assert_eq!(back.message(), "message");
        }
    }

    #[test]
    fn details_cross_the_boundary_except_for_internal() {
        let err = AppError::validation("user not found").with_details(json!({ "user_id": 999 }));
        let back = AppError::from(RpcStatus::from(&err));
        assert_eq!(back.details().unwrap()["user_id"], 999);

        let err = AppError::internal("boom").with_details(json!({ "table": "orders" }));
        assert!(RpcStatus::from(&err).details().is_none());
    }

    #[test]
    fn unmapped_codes_become_internal_with_detail() {
        let status = RpcStatus::unavailable("connection refused to 10.0.0.3:50051");
        let err = AppError::from(status);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "remote call failed");
        let details = err.details().unwrap();
        assert_eq!(details["rpc_code"], "UNAVAILABLE");
        assert_eq!(details["rpc_message"], "connection refused to 10.0.0.3:50051");
    }
}
