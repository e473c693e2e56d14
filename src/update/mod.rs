//! Update decision and installation: the version gate consulted when an
//! intent arrives, and the boot-time updater that acts on it after reboot.

pub mod boot;
pub mod flasher;
pub mod gate;

pub use boot::{BootOutcome, BootUpdater, firmware_url};
pub use flasher::{FirmwareFlasher, FlashOutcome, HttpFlasher};
pub use gate::{GateDecision, RejectReason, VersionGate};
