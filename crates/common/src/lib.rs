//! Shared building blocks for the order platform.
//!
//! - [`UserId`] / [`OrderId`] record identifiers
//! - [`TraceId`] and [`RequestContext`] for correlation and deadlines
//! - [`AppError`] / [`ErrorKind`], the error taxonomy every transport maps from
//! - [`RpcCode`] / [`RpcStatus`], the RPC side of that mapping

pub mod context;
pub mod error;
pub mod status;
pub mod trace;
pub mod types;

pub use context::{DeadlineExceeded, RequestContext};
pub use error::{
    AppError, BoxError, ErrorBody, ErrorKind, ErrorResponse, GENERIC_INTERNAL_MESSAGE, is_kind,
    kind_of, panic_message,
};
pub use status::{RpcCode, RpcStatus};
pub use trace::{TRACE_ID_HEADER, TRACE_ID_METADATA_KEY, TraceId};
pub use types::{OrderId, UserId};

/// Result type used across the service layer.
pub type Result<T> = std::result::Result<T, AppError>;
