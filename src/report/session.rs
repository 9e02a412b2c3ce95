use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    channel::{ControlError, MessageChannel, MessageHandle},
    pages::{Navigation, PageCursor, Pages},
};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Inactivity after which the session is torn down. Every input restarts it.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }
}

/// What happens to the displayed message once a session is over.
#[async_trait]
pub trait Teardown: Send + Sync {
    async fn teardown(&self, message: &dyn MessageHandle) -> Result<()>;
}

/// Clears navigation controls and leaves the message in place. Lacking the permission to clear
/// controls is fine, they just stay.
pub struct KeepMessage;

#[async_trait]
impl Teardown for KeepMessage {
    async fn teardown(&self, message: &dyn MessageHandle) -> Result<()> {
        match message.clear_navigation_controls().await {
            Ok(()) => Ok(()),
            Err(ControlError::PermissionDenied) => {
                debug!("Not allowed to clear navigation controls");
                Ok(())
            }
            Err(ControlError::Other(e)) => Err(e),
        }
    }
}

/// Removes the message altogether.
pub struct DeleteMessage;

#[async_trait]
impl Teardown for DeleteMessage {
    async fn teardown(&self, message: &dyn MessageHandle) -> Result<()> {
        message.delete().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active { page: usize },
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimedOut,
    Stopped,
    Cancelled,
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: EndReason,
    pub last_page: usize,
}

/// Display loop over pre-rendered pages. Each session lives in its own task, its timer doesn't
/// affect anything else.
pub struct PaginatedSession<M> {
    message: M,
    pages: Pages,
    cursor: PageCursor,
    state: SessionState,
    timeout: Duration,
    teardown: Box<dyn Teardown>,
}

impl<M: MessageHandle + 'static> PaginatedSession<M> {
    /// Opens a session that keeps its message after teardown.
    pub async fn open<C>(channel: &C, pages: Pages, config: SessionConfig) -> Result<SessionHandle>
    where
        C: MessageChannel<Message = M>,
    {
        Self::open_with(channel, pages, config, Box::new(KeepMessage)).await
    }

    /// Posts the first page, attaches navigation controls and starts listening for input.
    pub async fn open_with<C>(
        channel: &C,
        pages: Pages,
        config: SessionConfig,
        teardown: Box<dyn Teardown>,
    ) -> Result<SessionHandle>
    where
        C: MessageChannel<Message = M>,
    {
        let message = channel.send_message(&pages.render(0)).await?;
        message.attach_navigation_controls().await?;

        let session = Self {
            message,
            cursor: PageCursor::new(pages.len()),
            pages,
            state: SessionState::Active { page: 0 },
            timeout: config.timeout,
            teardown,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(session.run(cancel.clone()));
        Ok(SessionHandle { cancel, task })
    }

    async fn run(mut self, cancel: CancellationToken) -> SessionOutcome {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break EndReason::Cancelled,
                _ = &mut deadline => break EndReason::TimedOut,
                input = self.message.next_navigation() => match input {
                    None => break EndReason::InputClosed,
                    Some(Navigation::Stop) => break EndReason::Stopped,
                    Some(navigation) => {
                        deadline.as_mut().reset(Instant::now() + self.timeout);
                        self.navigate(navigation).await;
                    }
                }
            }
        };

        info!("Session in {:?} ended {reason:?}", self.state);
        self.state = SessionState::Teardown;
        if let Err(e) = self.teardown.teardown(&self.message).await {
            warn!("Failed to tear down session {e:?}");
        }

        SessionOutcome {
            reason,
            last_page: self.cursor.index(),
        }
    }

    async fn navigate(&mut self, navigation: Navigation) {
        let Some(page) = self.cursor.navigate(navigation) else {
            debug!("Ignoring {navigation:?} on page {}", self.cursor.index() + 1);
            return;
        };
        self.state = SessionState::Active { page };
        if let Err(e) = self.message.edit(&self.pages.render(page)).await {
            warn!("Failed to show page {} {e:?}", page + 1);
        }
    }
}

/// Handle to a running [PaginatedSession].
pub struct SessionHandle {
    cancel: CancellationToken,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the session ends by itself.
    pub async fn finished(self) -> Result<SessionOutcome> {
        self.task.await.context("session task failed to join")
    }

    /// Ends the session right away, waiting for its teardown.
    pub async fn stop(self) -> Result<SessionOutcome> {
        self.cancel.cancel();
        self.finished().await
    }
}
