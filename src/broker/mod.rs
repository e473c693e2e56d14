//! Broker-facing vocabulary: the per-device topic names, inbound messages,
//! and the lifecycle events the connection pump delivers to the agent.

pub mod event;
pub mod message;
pub mod topic;

pub use event::BrokerEvent;
pub use message::InboundMessage;
pub use topic::{TopicRole, TopicSet};

#[cfg(test)]
mod tests;
