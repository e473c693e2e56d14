//! # fwagent
//!
//! `fwagent` is a firmware-update agent for connected devices. It listens on
//! a per-device set of MQTT topics for update commands, decides whether an
//! announced version should be installed, records that decision durably and
//! reboots. On the next start the recorded intent is consumed and the image
//! is downloaded and installed.
//!
//! ## Core Modules
//!
//! - `broker`: topic names, inbound messages and connection events.
//! - `command`: parsing of inbound messages into commands.
//! - `update`: the version gate, the image flasher and the boot-time updater.
//! - `persistence`: the durable update-intent record.
//! - `agent`: the event dispatcher and the reboot controller.
//! - `client` / `transport`: the MQTT connection.
//! - `config`, `device`, `utils`: configuration, identity, errors and logging.

pub mod agent;
pub mod broker;
pub mod client;
pub mod command;
pub mod config;
pub mod device;
pub mod persistence;
pub mod transport;
pub mod update;
pub mod utils;
