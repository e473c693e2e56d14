//! Boot-time updater
//!
//! Runs once at startup, after storage is opened and before the broker
//! connection exists. If a pending intent was left behind by the previous
//! run it is consumed (flag cleared first) and handed to the flasher. A
//! failed attempt zeroes the stored size and startup continues on the
//! current image; nothing is retried across boots.

use std::time::Duration;

use crate::config::UpdateSettings;
use crate::persistence::IntentStore;
use crate::update::flasher::{FirmwareFlasher, FlashOutcome};
use crate::utils::error::StoreError;

/// `https://<host>/download/<product>-<version>.bin`
pub fn firmware_url(firmware_host: &str, product: &str, candidate_version: &str) -> String {
    format!("https://{firmware_host}/download/{product}-{candidate_version}.bin")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    UpToDate,
    Updated { version: String },
    NotNeeded { version: String },
    Failed { version: String, reason: String },
    /// A half-written intent was found and dropped.
    Discarded { reason: String },
}

#[derive(Debug, Clone)]
pub struct BootUpdater<F> {
    flasher: F,
    firmware_host: String,
    product: String,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl<F: FirmwareFlasher> BootUpdater<F> {
    pub fn new(settings: &UpdateSettings, flasher: F) -> Self {
        Self {
            flasher,
            firmware_host: settings.firmware_host.clone(),
            product: settings.product.clone(),
            max_attempts: settings.max_attempts.max(1),
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    pub fn url_for(&self, candidate_version: &str) -> String {
        firmware_url(&self.firmware_host, &self.product, candidate_version)
    }

    pub async fn run(&self, store: &IntentStore) -> Result<BootOutcome, StoreError> {
        let intent = match store.read_and_clear() {
            Ok(Some(intent)) => intent,
            Ok(None) => {
                tracing::info!("firmware is latest version");
                return Ok(BootOutcome::UpToDate);
            }
            Err(StoreError::CorruptIntent(reason)) => {
                tracing::warn!(%reason, "discarding incomplete update intent");
                return Ok(BootOutcome::Discarded { reason });
            }
            Err(e) => return Err(e),
        };

        let version = intent.candidate_version;
        let url = self.url_for(&version);
        tracing::info!(size = intent.expected_size, %url, "applying pending update");

        let mut last_failure = String::new();
        for attempt in 1..=self.max_attempts {
            match self.flasher.flash(&url, intent.expected_size).await {
                FlashOutcome::Updated => {
                    tracing::info!(%version, "firmware updated");
                    return Ok(BootOutcome::Updated { version });
                }
                FlashOutcome::NotNeeded => {
                    tracing::info!(%version, "server reports no update needed");
                    return Ok(BootOutcome::NotNeeded { version });
                }
                FlashOutcome::Failed(reason) => {
                    tracing::warn!(attempt, max = self.max_attempts, %reason, "firmware download failed");
                    last_failure = reason;
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }
        }

        store.reset_size()?;
        tracing::error!(%version, "firmware couldn't update, continuing on current image");
        Ok(BootOutcome::Failed {
            version,
            reason: last_failure,
        })
    }
}
