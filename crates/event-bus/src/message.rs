use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{TRACE_ID_METADATA_KEY, TraceId};
use uuid::Uuid;

/// A message as carried by the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub exchange: String,
    pub routing_key: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub published_at: DateTime<Utc>,
    /// How many times this message has been handed to a handler.
    pub delivery_count: u32,
}

impl Message {
    /// Builds a message stamped with the trace id header.
    pub fn new(
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
        body: Vec<u8>,
        trace_id: &TraceId,
    ) -> Self {
        let mut headers = HashMap::new();
        headers.insert(TRACE_ID_METADATA_KEY.to_string(), trace_id.to_string());
        Self {
            id: Uuid::new_v4(),
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            headers,
            body,
            published_at: Utc::now(),
            delivery_count: 0,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Trace id from the headers; a fresh one if the publisher sent none.
    pub fn trace_id(&self) -> TraceId {
        TraceId::from_optional(self.header(TRACE_ID_METADATA_KEY))
    }

    /// True if this is not the first delivery.
    pub fn redelivered(&self) -> bool {
        self.delivery_count > 1
    }
}
