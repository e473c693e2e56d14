//! Command parser
//!
//! Two commands exist:
//! - on the *setid* topic, a payload starting with `l` is a version query;
//! - on the *update* topic, `v<version>,<size>` announces an update, where
//!   `<version>` is everything before the first comma (leading `v` included)
//!   and `<size>` is the fixed-width decimal field right after it. Bytes
//!   beyond the size field are ignored.
//!
//! Anything else is a no-op. All reads are bounded by the payload slice.

use crate::broker::{InboundMessage, TopicRole, TopicSet};
use crate::persistence::intent_store::VERSION_FIELD_WIDTH;
use crate::utils::error::ParseError;

/// Width of the image-size field, in ASCII digits.
pub const SIZE_FIELD_WIDTH: usize = 7;

/// Longest candidate version that fits the persisted record.
pub const VERSION_MAX_LEN: usize = VERSION_FIELD_WIDTH;

const QUERY_BYTE: u8 = b'l';
const UPDATE_BYTE: u8 = b'v';
const DELIMITER: u8 = b',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIntent {
    pub candidate_version: String,
    pub expected_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query,
    Update(UpdateIntent),
    NoOp,
}

/// Parses a message, reporting why it is not a command.
pub fn try_parse(topics: &TopicSet, msg: &InboundMessage) -> Result<Command, ParseError> {
    let role = topics.role_of(&msg.topic).ok_or(ParseError::UnknownTopic)?;
    let first = *msg.payload.first().ok_or(ParseError::EmptyPayload)?;

    match (role, first) {
        (TopicRole::SetId, QUERY_BYTE) => Ok(Command::Query),
        (TopicRole::Update, UPDATE_BYTE) => parse_update(&msg.payload).map(Command::Update),
        (TopicRole::SetId | TopicRole::Update, other) => Err(ParseError::UnexpectedCommand(other)),
        (TopicRole::Version, _) => Err(ParseError::UnknownTopic),
    }
}

/// Parses a message, mapping every malformed input to `Command::NoOp`.
pub fn parse(topics: &TopicSet, msg: &InboundMessage) -> Command {
    match try_parse(topics, msg) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::debug!(topic = %msg.topic, error = %e, "ignoring message");
            Command::NoOp
        }
    }
}

fn parse_update(payload: &[u8]) -> Result<UpdateIntent, ParseError> {
    let comma = payload
        .iter()
        .position(|b| *b == DELIMITER)
        .ok_or(ParseError::MissingDelimiter)?;

    let (version, rest) = payload.split_at(comma);
    if version.len() > VERSION_MAX_LEN {
        return Err(ParseError::VersionTooLong {
            len: version.len(),
            max: VERSION_MAX_LEN,
        });
    }
    let candidate_version = std::str::from_utf8(version)
        .map_err(|_| ParseError::VersionNotUtf8)?
        .to_string();

    // skip the comma itself
    let rest = &rest[1..];
    let field = rest.get(..SIZE_FIELD_WIDTH).ok_or(ParseError::TruncatedSize {
        found: rest.len(),
        expected: SIZE_FIELD_WIDTH,
    })?;

    // Copy exactly the field width into a zeroed buffer before conversion.
    let mut digits = [0u8; SIZE_FIELD_WIDTH];
    digits.copy_from_slice(field);

    let expected_size = digits.iter().try_fold(0u32, |acc, b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + u32::from(b - b'0'))
        } else {
            Err(ParseError::InvalidSize(SIZE_FIELD_WIDTH))
        }
    })?;

    Ok(UpdateIntent {
        candidate_version,
        expected_size,
    })
}
