//! The update agent: broker event dispatch and the reboot that follows an
//! accepted update.

pub mod dispatcher;
pub mod reboot;

pub use dispatcher::{Dispatch, UPDATE_REBOOT_REASON, UpdateAgent};
pub use reboot::{ProcessRestart, RebootController, Restart};
