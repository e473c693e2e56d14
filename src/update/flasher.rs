//! Download-and-install of a firmware image.
//!
//! The agent only needs the outcome; `FirmwareFlasher` is the seam and
//! `HttpFlasher` the HTTPS implementation. The image is streamed to a staging
//! file beside the target and renamed over it once its size checks out, so
//! a failed download never leaves a partial image in place.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::utils::error::FlashError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOutcome {
    Updated,
    /// The server reported there is nothing newer to install.
    NotNeeded,
    Failed(String),
}

pub trait FirmwareFlasher {
    fn flash(&self, url: &str, expected_size: u32) -> impl Future<Output = FlashOutcome> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFlasher {
    client: reqwest::Client,
    image_path: PathBuf,
}

impl HttpFlasher {
    /// `timeout` bounds the whole transfer, body included.
    pub fn new(image_path: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FlashError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            image_path: image_path.into(),
        })
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    async fn download(&self, url: &str, expected_size: u32) -> Result<FlashOutcome, FlashError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FlashOutcome::NotNeeded);
        }
        if !status.is_success() {
            return Err(FlashError::Status(status.as_u16()));
        }

        let expected = u64::from(expected_size);
        if let Some(len) = response.content_length() {
            if len != expected {
                return Err(FlashError::SizeMismatch {
                    expected,
                    actual: len,
                });
            }
        }

        let staging = self.image_path.with_extension("part");
        if let Some(parent) = staging.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&staging).await?;
        let written = write_body(&mut response, &mut file, expected).await;
        drop(file);

        match written {
            Ok(n) if n == expected => {
                fs::rename(&staging, &self.image_path).await?;
                Ok(FlashOutcome::Updated)
            }
            Ok(n) => {
                let _ = fs::remove_file(&staging).await;
                Err(FlashError::SizeMismatch {
                    expected,
                    actual: n,
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                Err(e)
            }
        }
    }
}

async fn write_body(
    response: &mut reqwest::Response,
    file: &mut fs::File,
    expected: u64,
) -> Result<u64, FlashError> {
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len() as u64;
        if written > expected {
            return Err(FlashError::SizeMismatch {
                expected,
                actual: written,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

impl FirmwareFlasher for HttpFlasher {
    fn flash(&self, url: &str, expected_size: u32) -> impl Future<Output = FlashOutcome> + Send {
        async move {
            match self.download(url, expected_size).await {
                Ok(outcome) => outcome,
                Err(e) => FlashOutcome::Failed(e.to_string()),
            }
        }
    }
}
