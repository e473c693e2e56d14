use crate::utils::error::TopicError;

/// Prefix shared by every device topic.
pub const TOPIC_STEM: &str = "device/";

/// Upper bound on a generated topic name, in bytes.
pub const MAX_TOPIC_LEN: usize = 64;

/// The three roles a device topic can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicRole {
    /// Outbound: the running version is published here.
    Version,
    /// Inbound: an `l` payload asks for the running version.
    SetId,
    /// Inbound: `v<version>,<size>` announces an update.
    Update,
}

impl TopicRole {
    pub const ALL: [TopicRole; 3] = [TopicRole::Version, TopicRole::SetId, TopicRole::Update];

    pub fn suffix(self) -> &'static str {
        match self {
            TopicRole::Version => "version/",
            TopicRole::SetId => "setid/",
            TopicRole::Update => "update/",
        }
    }
}

/// Builds `device/<suffix><identity>`, rejecting names over `MAX_TOPIC_LEN`.
///
/// The identity must be a single topic level: wildcards and separators
/// would subscribe to the wrong topics or be refused by the broker.
pub fn device_topic(identity: &str, suffix: &str) -> Result<String, TopicError> {
    if identity.is_empty() || identity.contains(['+', '#', '/', '\0']) {
        return Err(TopicError::InvalidIdentity(identity.to_string()));
    }
    let topic = format!("{TOPIC_STEM}{suffix}{identity}");
    if topic.len() > MAX_TOPIC_LEN {
        return Err(TopicError::TooLong {
            len: topic.len(),
            topic,
            max: MAX_TOPIC_LEN,
        });
    }
    Ok(topic)
}

/// The per-device topic names, derived once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    pub version: String,
    pub setid: String,
    pub update: String,
}

impl TopicSet {
    pub fn new(identity: &str) -> Result<Self, TopicError> {
        let topics = Self {
            version: device_topic(identity, TopicRole::Version.suffix())?,
            setid: device_topic(identity, TopicRole::SetId.suffix())?,
            update: device_topic(identity, TopicRole::Update.suffix())?,
        };
        for role in TopicRole::ALL {
            tracing::debug!(?role, topic = topics.get(role), "device topic configured");
        }
        Ok(topics)
    }

    pub fn get(&self, role: TopicRole) -> &str {
        match role {
            TopicRole::Version => &self.version,
            TopicRole::SetId => &self.setid,
            TopicRole::Update => &self.update,
        }
    }

    /// Exact match of an incoming topic against the device topics.
    pub fn role_of(&self, topic: &str) -> Option<TopicRole> {
        TopicRole::ALL.into_iter().find(|role| self.get(*role) == topic)
    }
}
