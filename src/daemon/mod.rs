use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::Result;
use tracing::info;

use crate::{
    poller::{
        controller::PollerController, file_presence::FilePresenceSource, presence::PresenceSource,
        Poller, PollerConfig,
    },
    tracking::store::{ActivityStore, JsonActivityStore},
    utils::clock::{Clock, DefaultClock},
};

pub mod shutdown;

pub const PRESENCE_FILE: &str = "presence.json";

pub struct DaemonConfig {
    /// Directory holding the store.
    pub dir: PathBuf,
    /// Presence file written by the platform adapter.
    pub presence: PathBuf,
    pub poller: PollerConfig,
}

/// Represents the starting point for the daemon. Runs until the process receives a shutdown
/// signal.
pub async fn start_daemon(config: DaemonConfig) -> Result<()> {
    run_daemon(config, shutdown::wait_for_shutdown()).await
}

async fn run_daemon(config: DaemonConfig, shutdown: impl Future<Output = ()>) -> Result<()> {
    let store = Arc::new(JsonActivityStore::open(&config.dir).await?);
    let presence = FilePresenceSource::new(config.presence);
    let poller = create_poller(store.clone(), presence, config.poller, DefaultClock);

    let mut controller = PollerController::new();
    controller.start(poller)?;
    info!("Daemon started in {:?}", config.dir);

    shutdown.await;

    // The store is released only after the poller is done with it.
    controller.stop().await?;
    drop(store);
    info!("Daemon stopped");
    Ok(())
}

fn create_poller<S: ActivityStore>(
    store: S,
    presence: impl PresenceSource + 'static,
    config: PollerConfig,
    clock: impl Clock,
) -> Poller<S> {
    Poller::new(store, Box::new(presence), config, Box::new(clock))
}
