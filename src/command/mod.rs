//! Parsing of inbound broker messages into device commands.

pub mod parser;

pub use parser::{Command, SIZE_FIELD_WIDTH, UpdateIntent, VERSION_MAX_LEN, parse, try_parse};
