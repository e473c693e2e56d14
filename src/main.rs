//! CLI for fwagent
//!
//! Subcommands:
//! - `run` (default): apply any pending update, then serve broker commands
//! - `intent`: print the stored update intent
//! - `version`: print the running firmware version

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use fwagent::agent::{ProcessRestart, RebootController, UpdateAgent};
use fwagent::broker::TopicSet;
use fwagent::config::{Settings, load_config, load_config_from};
use fwagent::device::{RUNNING_VERSION, client_id, resolve_identity};
use fwagent::persistence::IntentStore;
use fwagent::transport;
use fwagent::update::{BootUpdater, HttpFlasher, VersionGate};
use fwagent::utils::error::AgentError;
use fwagent::utils::logging;

#[derive(Parser)]
#[command(name = "fwagent", about = "Firmware update agent")]
struct Cli {
    /// Configuration file (defaults to config/default.* when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a pending update, then run the agent
    Run,
    /// Print the stored update intent as JSON
    Intent,
    /// Print the running firmware version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.log.level);

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_agent(settings).await,
        Command::Intent => print_intent(&settings),
        Command::Version => {
            println!("{RUNNING_VERSION}");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Agent failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_agent(settings: Settings) -> Result<(), AgentError> {
    info!(version = RUNNING_VERSION, "initialization starting");

    let identity = resolve_identity(&settings.device)?;
    let topics = TopicSet::new(&identity)?;
    let store = IntentStore::open(&settings.storage.path, &settings.storage.namespace)?;

    let flasher = HttpFlasher::new(
        &settings.update.image_path,
        Duration::from_secs(settings.update.download_timeout_secs),
    )?;
    let outcome = BootUpdater::new(&settings.update, flasher).run(&store).await?;
    info!(?outcome, "boot-time update check finished");

    let (client, mut events, pump) = transport::connect(&settings.mqtt, &client_id(&identity))?;
    let agent = UpdateAgent::init(
        client.clone(),
        topics,
        store,
        VersionGate::new(settings.update.version_policy),
        RUNNING_VERSION,
    );
    let reboot = RebootController::new(
        ProcessRestart,
        Duration::from_millis(settings.reboot.grace_ms),
    );

    let result = agent.run(&mut events, &reboot, shutdown_signal()).await;

    if let Err(e) = client.disconnect().await {
        warn!("mqtt disconnect failed: {e}");
    }
    pump.abort();
    result
}

fn print_intent(settings: &Settings) -> Result<(), AgentError> {
    let store = IntentStore::open(&settings.storage.path, &settings.storage.namespace)?;
    let record = store.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
