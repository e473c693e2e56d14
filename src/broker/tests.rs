use super::topic::{MAX_TOPIC_LEN, device_topic};
use super::{TopicRole, TopicSet};
use crate::utils::error::TopicError;

const MAC: &str = "24:6F:28:AA:BB:CC";

#[test]
fn test_device_topic_layout() {
    assert_eq!(
        device_topic(MAC, "version/").unwrap(),
        "device/version/24:6F:28:AA:BB:CC"
    );
}

#[test]
fn test_topic_set_new() {
    let topics = TopicSet::new(MAC).unwrap();
    assert_eq!(topics.version, "device/version/24:6F:28:AA:BB:CC");
    assert_eq!(topics.setid, "device/setid/24:6F:28:AA:BB:CC");
    assert_eq!(topics.update, "device/update/24:6F:28:AA:BB:CC");
}

#[test]
fn test_role_of_matches_whole_topic_only() {
    let topics = TopicSet::new(MAC).unwrap();
    assert_eq!(topics.role_of(&topics.update), Some(TopicRole::Update));
    assert_eq!(topics.role_of(&topics.setid), Some(TopicRole::SetId));
    assert_eq!(topics.role_of("device/update/"), None);
    assert_eq!(topics.role_of("device/update/24:6F:28:AA:BB:CC/extra"), None);
    assert_eq!(topics.role_of(""), None);
}

#[test]
fn test_overlong_identity_is_rejected() {
    let identity = "x".repeat(MAX_TOPIC_LEN);
    match TopicSet::new(&identity) {
        Err(TopicError::TooLong { len, max, .. }) => {
            assert!(len > max);
            assert_eq!(max, MAX_TOPIC_LEN);
        }
        other => panic!("expected TooLong, got {other:?}"),
    }
}

#[test]
fn test_topic_at_limit_is_accepted() {
    // "device/version/" is 15 bytes
    let identity = "a".repeat(MAX_TOPIC_LEN - 15);
    let topic = device_topic(&identity, "version/").unwrap();
    assert_eq!(topic.len(), MAX_TOPIC_LEN);
}

#[test]
fn test_identity_with_wildcards_or_levels_is_rejected() {
    for identity in ["", "board/7", "board+", "#", "a/+/#"] {
        assert_eq!(
            TopicSet::new(identity),
            Err(TopicError::InvalidIdentity(identity.to_string()))
        );
    }
}
