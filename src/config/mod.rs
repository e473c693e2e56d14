//! Layered configuration: optional file, then `FWAGENT__*` environment
//! variables, merged over compiled-in defaults.

mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    DeviceSettings, LogSettings, MqttSettings, RebootSettings, Settings, StorageSettings,
    UpdateSettings, VersionPolicy,
};

/// Loads the configuration from `config/default` (if present) and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    build(File::with_name("config/default").required(false))
}

/// Loads the configuration from an explicit file plus the environment.
/// The file must exist.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    build(File::from(path).required(true))
}

fn build(file: File<config::FileSourceFile, config::FileFormat>) -> Result<Settings, ConfigError> {
    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix("FWAGENT")
            .prefix_separator("__")
            .separator("__"),
    );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_onto(Settings::default()))
}
