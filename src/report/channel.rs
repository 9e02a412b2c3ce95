use async_trait::async_trait;
use thiserror::Error;

use super::pages::Navigation;

#[derive(Error, Debug)]
pub enum ControlError {
    /// The platform refused to touch the controls, for example because of missing moderation
    /// rights.
    #[error("not allowed to change navigation controls")]
    PermissionDenied,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Place a session can post its pages to.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    type Message: MessageHandle + 'static;

    async fn send_message(&self, content: &str) -> anyhow::Result<Self::Message>;
}

/// Posted message together with the navigation input scoped to it.
#[async_trait]
pub trait MessageHandle: Send + Sync {
    async fn edit(&self, content: &str) -> anyhow::Result<()>;

    async fn attach_navigation_controls(&self) -> anyhow::Result<()>;

    async fn clear_navigation_controls(&self) -> Result<(), ControlError>;

    async fn delete(&self) -> anyhow::Result<()>;

    /// Waits for the next navigation input. `None` means no more input will arrive.
    /// Must be cancel safe.
    async fn next_navigation(&mut self) -> Option<Navigation>;
}
