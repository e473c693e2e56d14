//! The `transport` module owns the broker connection: it builds the MQTT
//! options from configuration and runs the pump that turns connection
//! events into `BrokerEvent`s on the agent's bounded queue.

pub mod mqtt;

pub use mqtt::{connect, mqtt_options, run_pump, translate};
