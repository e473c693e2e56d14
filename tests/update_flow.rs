//! Drives a full update cycle through the public API: an update command
//! arrives, the intent is recorded, and the next boot installs it.

use std::future::Future;
use std::sync::{Arc, Mutex};

use fwagent::agent::{Dispatch, UpdateAgent};
use fwagent::broker::{BrokerEvent, InboundMessage, TopicSet};
use fwagent::client::BrokerClient;
use fwagent::config::Settings;
use fwagent::persistence::IntentStore;
use fwagent::update::{BootOutcome, BootUpdater, FirmwareFlasher, FlashOutcome, VersionGate};
use fwagent::utils::error::ClientError;
use tempfile::tempdir;

const MAC: &str = "24:6F:28:AA:BB:CC";

#[derive(Clone, Default)]
struct RecordingClient {
    subscribed: Arc<Mutex<Vec<String>>>,
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl BrokerClient for RecordingClient {
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), ClientError>> + Send {
        self.subscribed.lock().unwrap().push(topic.to_string());
        async { Ok::<(), ClientError>(()) }
    }

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        async { Ok::<(), ClientError>(()) }
    }
}

#[derive(Clone, Default)]
struct FakeFlasher {
    calls: Arc<Mutex<Vec<(String, u32)>>>,
}

impl FirmwareFlasher for FakeFlasher {
    fn flash(&self, url: &str, expected_size: u32) -> impl Future<Output = FlashOutcome> + Send {
        self.calls.lock().unwrap().push((url.to_string(), expected_size));
        async { FlashOutcome::Updated }
    }
}

#[tokio::test]
async fn update_command_survives_reboot_and_is_installed() {
    let dir = tempdir().unwrap();
    let store = IntentStore::open(dir.path().to_str().unwrap(), "device").unwrap();
    let topics = TopicSet::new(MAC).unwrap();
    let client = RecordingClient::default();

    let mut agent = UpdateAgent::init(
        client.clone(),
        topics.clone(),
        store.clone(),
        VersionGate::default(),
        "v0.0.1",
    );

    agent.handle_event(BrokerEvent::Connected).await.unwrap();
    assert!(
        client
            .subscribed
            .lock()
            .unwrap()
            .contains(&"device/update/24:6F:28:AA:BB:CC".to_string())
    );

    let outcome = agent
        .handle_event(BrokerEvent::Data(InboundMessage::new(
            "device/update/24:6F:28:AA:BB:CC",
            "v0.0.2,0001234x",
        )))
        .await
        .unwrap();
    assert!(matches!(outcome, Dispatch::Reboot(_)));
    agent.shutdown().unwrap();

    let record = store.snapshot().unwrap();
    assert!(record.pending);
    assert_eq!(record.candidate_version.as_deref(), Some("v0.0.2"));
    assert_eq!(record.expected_size, Some(1234));

    // next boot
    let flasher = FakeFlasher::default();
    let updater = BootUpdater::new(&Settings::default().update, flasher.clone());
    let boot = updater.run(&store).await.unwrap();

    assert_eq!(
        boot,
        BootOutcome::Updated {
            version: "v0.0.2".to_string()
        }
    );
    assert_eq!(
        *flasher.calls.lock().unwrap(),
        vec![(
            "https://fw.device.id/download/envboard-v0.0.2.bin".to_string(),
            1234
        )]
    );
    assert!(!store.is_pending().unwrap());
}

#[tokio::test]
async fn version_query_is_answered_on_the_version_topic() {
    let dir = tempdir().unwrap();
    let store = IntentStore::open(dir.path().to_str().unwrap(), "device").unwrap();
    let client = RecordingClient::default();
    let mut agent = UpdateAgent::init(
        client.clone(),
        TopicSet::new(MAC).unwrap(),
        store.clone(),
        VersionGate::default(),
        "v0.0.1",
    );

    let outcome = agent
        .handle_event(BrokerEvent::Data(InboundMessage::new(
            "device/setid/24:6F:28:AA:BB:CC",
            "l",
        )))
        .await
        .unwrap();

    assert_eq!(outcome, Dispatch::Continue);
    assert_eq!(
        *client.published.lock().unwrap(),
        vec![(
            "device/version/24:6F:28:AA:BB:CC".to_string(),
            b"v0.0.1".to_vec()
        )]
    );
    assert!(!store.is_pending().unwrap());
}
