/// A message delivered by the broker on one of our subscriptions.
///
/// The payload is kept as raw bytes: broker payloads carry no terminator and
/// no guaranteed encoding, so every read is bounded by `payload.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
