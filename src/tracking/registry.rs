use tracing::info;

use super::{
    error::TrackingError, store::ActivityStore, AggregateRecord, GroupId, SubjectId,
    TrackedSubject,
};

/// Bridges user facing operations and [ActivityStore]. The registry doesn't cache membership,
/// every call goes to the store.
pub struct TrackingRegistry<S: ActivityStore> {
    store: S,
}

impl<S: ActivityStore> TrackingRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn enable(&self, subject: SubjectId, group: GroupId) -> Result<(), TrackingError> {
        self.store.register_subject(subject, group).await?;
        info!("Enabled tracking of {subject} in {group}");
        Ok(())
    }

    /// Stops tracking a subject. With `purge` all of the subject's records are removed as well.
    pub async fn disable(&self, subject: SubjectId, purge: bool) -> Result<(), TrackingError> {
        if purge {
            self.store.delete_subject(subject).await?;
        } else {
            self.store.unregister_soft(subject).await?;
        }
        info!("Disabled tracking of {subject}, purged: {purge}");
        Ok(())
    }

    pub async fn list_tracked(&self) -> Result<Vec<TrackedSubject>, TrackingError> {
        self.store.list_tracked().await
    }

    pub async fn is_tracked(&self, subject: SubjectId) -> Result<bool, TrackingError> {
        self.store.is_tracked(subject).await
    }

    pub async fn records(&self, subject: SubjectId) -> Result<Vec<AggregateRecord>, TrackingError> {
        self.store.list_records(subject).await
    }

    /// Returns records ordered from the longest to the shortest.
    pub async fn report(&self, subject: SubjectId) -> Result<Vec<AggregateRecord>, TrackingError> {
        let mut records = self.records(subject).await?;
        if records.is_empty() {
            return Err(TrackingError::SubjectHasNoRecords(subject));
        }
        records.sort_by(|a, b| b.total_units.cmp(&a.total_units));
        Ok(records)
    }
}
