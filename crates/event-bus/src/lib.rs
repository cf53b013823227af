//! Event bus collaborator.
//!
//! Publishers hand messages to an exchange under a routing key; consumers bind
//! named queues to topic patterns. Delivery is at-least-once: a handler error
//! requeues the message after a delay, and repeated failures end up in a
//! dead-letter list.

pub mod bus;
pub mod error;
pub mod memory;
pub mod message;
pub mod topic;

pub use bus::{EventBus, MessageHandler};
pub use error::{BusError, Result};
pub use memory::{BusConfig, InMemoryEventBus};
pub use message::Message;
pub use topic::topic_matches;
