use super::message::InboundMessage;

/// Broker lifecycle events, as seen by the agent.
///
/// Only `Connected`, `Disconnected` and `Data` drive state; the rest are
/// logged and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    BeforeConnect,
    Connected,
    Disconnected,
    Subscribed { pkid: u16 },
    Unsubscribed { pkid: u16 },
    Published { pkid: u16 },
    Data(InboundMessage),
}
