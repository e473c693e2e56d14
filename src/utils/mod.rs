//! The `utils` module provides shared building blocks used across the
//! `fwagent` crate: the error taxonomy and logging initialisation.

pub mod error;
pub mod logging;
