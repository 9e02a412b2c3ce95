use thiserror::Error;

use super::SubjectId;

/// Errors surfaced by the store and the registry.
///
/// The first group of variants are expected domain outcomes that the command layer turns into a
/// reply. Everything below [TrackingError::Storage] is unexpected and should be reported as an
/// internal failure.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("subject {0} is already tracked")]
    AlreadyTracked(SubjectId),

    #[error("subject {0} is not tracked")]
    NotTracked(SubjectId),

    #[error("subject {0} has no records yet")]
    SubjectHasNoRecords(SubjectId),

    /// Tracking can only be enabled where presence can later be resolved.
    #[error("tracking can only be enabled within a group")]
    NoGroupContext,

    #[error("can't find a subject matching '{0}'")]
    InvalidReference(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackingError {
    /// Whether the error is an expected outcome of a user action rather than a failure.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            TrackingError::AlreadyTracked(_)
                | TrackingError::NotTracked(_)
                | TrackingError::SubjectHasNoRecords(_)
                | TrackingError::NoGroupContext
                | TrackingError::InvalidReference(_)
        )
    }
}
