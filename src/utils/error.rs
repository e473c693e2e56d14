//! Error types for the update agent.
//!
//! Each concern has its own enum; `AgentError` aggregates them for the
//! places that cross concerns (agent loop, boot sequence, binary).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic `{topic}` is {len} bytes, limit is {max}")]
    TooLong { topic: String, len: usize, max: usize },
    #[error("device identity `{0}` is empty or contains `+`, `#` or `/`")]
    InvalidIdentity(String),
}

/// Reasons an inbound broker message is not a command.
///
/// None of these are fatal; the parser turns every one of them into a no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("topic is not one of the device command topics")]
    UnknownTopic,
    #[error("payload is empty")]
    EmptyPayload,
    #[error("unexpected command byte {0:#04x}")]
    UnexpectedCommand(u8),
    #[error("update payload has no `,` delimiter")]
    MissingDelimiter,
    #[error("candidate version is {len} bytes, limit is {max}")]
    VersionTooLong { len: usize, max: usize },
    #[error("candidate version is not valid UTF-8")]
    VersionNotUtf8,
    #[error("size field is truncated: {found} of {expected} bytes")]
    TruncatedSize { found: usize, expected: usize },
    #[error("size field is not {0} ASCII digits")]
    InvalidSize(usize),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),
    #[error("candidate version is {len} bytes, limit is {max}")]
    VersionTooLong { len: usize, max: usize },
    /// The pending flag was set but the rest of the record is unusable.
    /// The flag has already been cleared when this is returned.
    #[error("pending update intent is corrupt: {0}")]
    CorruptIntent(String),
}

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("image is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Flash(#[from] FlashError),
    #[error("device identity could not be resolved: {0}")]
    Identity(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
