use serde::Deserialize;

/// Top-level configuration settings for the agent.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub device: DeviceSettings,
    pub mqtt: MqttSettings,
    pub storage: StorageSettings,
    pub update: UpdateSettings,
    pub reboot: RebootSettings,
    pub log: LogSettings,
}

/// How the device identifies itself on the broker.
///
/// When `identity` is absent it is derived from a network interface address,
/// preferring `interface` if one is named.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceSettings {
    pub identity: Option<String>,
    pub interface: Option<String>,
}

/// Broker connection parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// CA bundle in PEM form. Its presence switches the connection to TLS.
    pub ca_cert_path: Option<String>,
    pub keep_alive_secs: u64,
    /// Capacity of the bounded queue between the connection pump and the agent.
    pub event_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub path: String,
    pub namespace: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Accept any candidate that differs from the running version.
    #[default]
    AnyDifferent,
    /// Accept only an upgrade of exactly one step at the most significant
    /// component that changes.
    SingleStepUpgrade,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateSettings {
    pub firmware_host: String,
    pub product: String,
    /// Where the downloaded image is installed.
    pub image_path: String,
    pub download_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub version_policy: VersionPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RebootSettings {
    pub grace_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub device: Option<DeviceSettings>,
    pub mqtt: Option<PartialMqttSettings>,
    pub storage: Option<PartialStorageSettings>,
    pub update: Option<PartialUpdateSettings>,
    pub reboot: Option<PartialRebootSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialMqttSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_cert_path: Option<String>,
    pub keep_alive_secs: Option<u64>,
    pub event_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialStorageSettings {
    pub path: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialUpdateSettings {
    pub firmware_host: Option<String>,
    pub product: Option<String>,
    pub image_path: Option<String>,
    pub download_timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub version_policy: Option<VersionPolicy>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialRebootSettings {
    pub grace_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            mqtt: MqttSettings {
                host: "hostnamemqtt.com".to_string(),
                port: 8883,
                username: None,
                password: None,
                ca_cert_path: None,
                keep_alive_secs: 60,
                event_capacity: 32,
            },
            storage: StorageSettings {
                path: "fwagent_db".to_string(),
                namespace: "device".to_string(),
            },
            update: UpdateSettings {
                firmware_host: "fw.device.id".to_string(),
                product: "envboard".to_string(),
                image_path: "firmware/current.bin".to_string(),
                download_timeout_secs: 300,
                max_attempts: 1,
                retry_backoff_ms: 2000,
                version_policy: VersionPolicy::AnyDifferent,
            },
            reboot: RebootSettings { grace_ms: 1000 },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Overlay the values that were provided onto `default`.
    pub fn merge_onto(self, default: Settings) -> Settings {
        let device = self.device.unwrap_or(default.device);
        let mqtt = self.mqtt.unwrap_or_default();
        let storage = self.storage.unwrap_or_default();
        let update = self.update.unwrap_or_default();
        let reboot = self.reboot.unwrap_or_default();
        let log = self.log.unwrap_or_default();

        Settings {
            device,
            mqtt: MqttSettings {
                host: mqtt.host.unwrap_or(default.mqtt.host),
                port: mqtt.port.unwrap_or(default.mqtt.port),
                username: mqtt.username.or(default.mqtt.username),
                password: mqtt.password.or(default.mqtt.password),
                ca_cert_path: mqtt.ca_cert_path.or(default.mqtt.ca_cert_path),
                keep_alive_secs: mqtt.keep_alive_secs.unwrap_or(default.mqtt.keep_alive_secs),
                event_capacity: mqtt
                    .event_capacity
                    .filter(|c| *c > 0)
                    .unwrap_or(default.mqtt.event_capacity),
            },
            storage: StorageSettings {
                path: storage.path.unwrap_or(default.storage.path),
                namespace: storage.namespace.unwrap_or(default.storage.namespace),
            },
            update: UpdateSettings {
                firmware_host: update.firmware_host.unwrap_or(default.update.firmware_host),
                product: update.product.unwrap_or(default.update.product),
                image_path: update.image_path.unwrap_or(default.update.image_path),
                download_timeout_secs: update
                    .download_timeout_secs
                    .unwrap_or(default.update.download_timeout_secs),
                max_attempts: update
                    .max_attempts
                    .filter(|n| *n > 0)
                    .unwrap_or(default.update.max_attempts),
                retry_backoff_ms: update
                    .retry_backoff_ms
                    .unwrap_or(default.update.retry_backoff_ms),
                version_policy: update
                    .version_policy
                    .unwrap_or(default.update.version_policy),
            },
            reboot: RebootSettings {
                grace_ms: reboot.grace_ms.unwrap_or(default.reboot.grace_ms),
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
            },
        }
    }
}
