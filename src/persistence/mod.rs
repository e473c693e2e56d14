//! The `persistence` module holds the durable record of a pending update.
//!
//! The record lives in a `sled` tree (the storage namespace) as three
//! independent keys, so a crash between writes can leave it half written;
//! readers treat such a record as absent.

pub mod intent_store;

pub use intent_store::{IntentRecord, IntentStore};

#[cfg(test)]
mod tests;
