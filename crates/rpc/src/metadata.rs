use std::collections::HashMap;
use std::time::Duration;

use common::{TRACE_ID_METADATA_KEY, TraceId};

/// Request metadata (the RPC equivalent of HTTP headers).
///
/// Keys are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(HashMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.get(TRACE_ID_METADATA_KEY)
    }
}

/// A unary request: message plus metadata and the caller's remaining budget.
#[derive(Debug, Clone)]
pub struct RpcRequest<T> {
    pub metadata: Metadata,
    /// Time the caller is still willing to wait, if it has a deadline.
    pub timeout: Option<Duration>,
    pub message: T,
}

impl<T> RpcRequest<T> {
    pub fn new(message: T) -> Self {
        Self {
            metadata: Metadata::new(),
            timeout: None,
            message,
        }
    }

    pub fn with_trace_id(mut self, trace_id: &TraceId) -> Self {
        self.metadata.insert(TRACE_ID_METADATA_KEY, trace_id.as_str());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn into_inner(self) -> T {
        self.message
    }
}
