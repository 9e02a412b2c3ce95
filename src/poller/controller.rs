use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::tracking::store::ActivityStore;

use super::Poller;

/// Owns the background poller task. [PollerController::stop] only returns after the loop has
/// exited and dropped its store handle.
#[derive(Default)]
pub struct PollerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl PollerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<S>(&mut self, poller: Poller<S>) -> Result<()>
    where
        S: ActivityStore + Send + Sync + 'static,
    {
        if self.handle.is_some() {
            bail!("poller already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("Poller started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|v| !v.is_finished())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("poller task failed to join")?;
            info!("Poller stopped");
        }
        Ok(())
    }
}
